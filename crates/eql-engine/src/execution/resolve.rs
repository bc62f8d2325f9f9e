//! The resolver: one walk over the parsed query that produces runtime
//! state. It registers traversal specs, compiles where clauses, builds the
//! projection plan (explicit `show` clause or summary attributes) and
//! resolves `with` flags against the finished column list.

use crate::collections::IndexMap;
use crate::error::Location;
use crate::execution::condition;
use crate::execution::condition::AttrUsage;
use crate::execution::condition::CondExpr;
use crate::execution::condition::CondScope;
use crate::execution::traversal::TraversalCursor;
use crate::execution::Column;
use crate::execution::ColumnSource;
use crate::execution::ExecutionContext;
use crate::execution::ShowFunc;
use crate::graph::Graph;
use crate::graph::NodeInfo;
use crate::graph::TraversalSpec;
use crate::result::PostProcess;
use crate::Error;
use crate::RuntimeErrorKind;
use eql_parser::Ast;
use eql_parser::NodeKind;

/// Where the driver takes its root keys from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeySpec {
    /// `get`: every key of the start kind.
    AllOfKind,
    /// `lookup`: an explicit key list.
    Explicit(Vec<String>),
}

pub(crate) struct ResolvedQuery<'a> {
    pub ctx: ExecutionContext<'a>,
    pub kind_loc: Location,
    pub keys: KeySpec,
    pub root_cond: Option<CondExpr>,
    pub cursors: Vec<TraversalCursor>,
    pub columns: Vec<Column>,
    pub post: PostProcess,
}

pub(crate) fn resolve<'a>(
    name: &str,
    part: &str,
    ast: &Ast,
    graph: &'a dyn Graph,
    info: &'a dyn NodeInfo,
) -> Result<ResolvedQuery<'a>, Error> {
    let children = ast.children();
    let kind_node = &children[0];
    let start_kind = kind_node.value().to_string();
    let kind_loc = Location::from(kind_node.token());

    let keys = match ast.kind() {
        NodeKind::Lookup => KeySpec::Explicit(
            children[1..]
                .iter()
                .take_while(|c| c.kind() == NodeKind::Value)
                .map(|c| c.value().to_string())
                .collect(),
        ),
        _ => KeySpec::AllOfKind,
    };
    let clause_start = match &keys {
        KeySpec::Explicit(keys) => 1 + keys.len(),
        KeySpec::AllOfKind => 1,
    };

    let mut group_scope = None;
    let mut primary_kind = start_kind.clone();
    let mut primary_loc = kind_loc;
    let mut root_where = None;
    let mut traverse_asts = Vec::new();
    let mut show_ast = None;
    let mut with_ast = None;

    for clause in &children[clause_start..] {
        match clause.kind() {
            NodeKind::From => {
                let group = &clause.children()[0];
                group_scope = Some(group.children()[0].value().to_string());
            }
            NodeKind::Primary => {
                let kind = &clause.children()[0];
                primary_kind = kind.value().to_string();
                primary_loc = Location::from(kind.token());
            }
            NodeKind::Where => root_where = Some(clause),
            NodeKind::Traverse => traverse_asts.push(clause),
            NodeKind::Show => show_ast = Some(clause),
            NodeKind::With => with_ast = Some(clause),
            _ => {}
        }
    }

    // Register every traversal spec first so that level-addressed
    // constructs (objget, column refs) can validate their range.
    let mut specs = vec![start_kind.clone()];
    let mut usage = AttrUsage::default();
    usage.push_level();

    let mut raw_traversals = Vec::new();
    for traverse in traverse_asts {
        raw_traversals.push(register_traversal(traverse, name, &mut specs, &mut usage)?);
    }

    // Kind occupancy per level: level 0 is the start kind, deeper levels
    // are known when the spec names its end kind / edge kind.
    let level_kinds: Vec<String> = (0..specs.len())
        .map(|level| {
            if level == 0 {
                start_kind.clone()
            } else {
                spec_component(&specs[level], 3)
            }
        })
        .collect();
    let level_edge_kinds: Vec<String> = (0..specs.len())
        .map(|level| {
            if level == 0 {
                String::new()
            } else {
                spec_component(&specs[level], 1)
            }
        })
        .collect();

    let mut node_kind_pos: IndexMap<String, Vec<usize>> = IndexMap::default();
    for (level, kind) in level_kinds.iter().enumerate() {
        if !kind.is_empty() {
            node_kind_pos.entry(kind.clone()).or_default().push(level);
        }
    }
    let mut edge_kind_pos: IndexMap<String, Vec<usize>> = IndexMap::default();
    for (level, kind) in level_edge_kinds.iter().enumerate() {
        if !kind.is_empty() {
            edge_kind_pos.entry(kind.clone()).or_default().push(level);
        }
    }

    if primary_kind != start_kind && !node_kind_pos.contains_key(&primary_kind) {
        return Err(Error::runtime(
            name,
            RuntimeErrorKind::UnknownNodeKind,
            primary_kind,
            primary_loc,
        ));
    }

    // Compile the root where clause and the traversal cursor tree.
    let root_cond = match root_where {
        Some(where_ast) => {
            let mut scope = CondScope {
                name,
                info,
                level: 0,
                has_edge: false,
                level_count: specs.len(),
                usage: Some(&mut usage),
            };
            Some(condition::compile(&where_ast.children()[0], &mut scope)?)
        }
        None => None,
    };

    let mut cursors = Vec::new();
    for raw in raw_traversals {
        cursors.push(build_cursor(raw, name, info, specs.len(), &mut usage)?);
    }

    // Projection plan.
    let refs = ColumnRefs {
        name,
        spec_count: specs.len(),
        node_kind_pos: &node_kind_pos,
        edge_kind_pos: &edge_kind_pos,
    };
    let mut columns = Vec::new();
    match show_ast {
        None => {
            for (level, kind) in level_kinds.iter().enumerate() {
                if kind.is_empty() {
                    continue;
                }
                for attr in info.summary_attributes(kind) {
                    usage.record_node(level, &attr);
                    columns.push(Column {
                        label: info.attribute_display_string(kind, &attr),
                        format: "auto".to_string(),
                        level,
                        source: ColumnSource::Node,
                        attr,
                        func: None,
                    });
                }
            }
        }
        Some(show) => {
            for term in show.children() {
                columns.push(show_term_column(
                    term,
                    name,
                    info,
                    &refs,
                    &level_kinds,
                    &level_edge_kinds,
                    specs.len(),
                    &mut usage,
                )?);
            }
        }
    }

    // The with clause resolves last, against the finished column plan.
    let mut post = PostProcess::default();
    let mut allow_nil = false;
    if let Some(with) = with_ast {
        for term in with.children() {
            match term.kind() {
                NodeKind::Ordering => {
                    for arg in term.children() {
                        let col = find_column(arg, &columns, &refs)?;
                        post.order.push((arg.kind() == NodeKind::Ascending, col));
                    }
                }
                NodeKind::Filtering => {
                    for arg in term.children() {
                        let col = find_column(arg, &columns, &refs)?;
                        match arg.kind() {
                            NodeKind::Unique => post.unique.push((col, false)),
                            NodeKind::UniqueCount => post.unique.push((col, true)),
                            NodeKind::IsNotNull => post.null_filters.push((col, true)),
                            NodeKind::IsNull => post.null_filters.push((col, false)),
                            _ => {}
                        }
                    }
                }
                NodeKind::NullTraversal => {
                    allow_nil = term.children()[0].value() == "true";
                }
                _ => {}
            }
        }
    }

    let levels = specs.len();
    let ctx = ExecutionContext {
        name: name.to_string(),
        part: part.to_string(),
        graph,
        info,
        start_kind,
        primary_kind,
        group_scope,
        specs,
        attrs_nodes: usage.nodes,
        attrs_edges: usage.edges,
        row_nodes: vec![None; levels],
        row_edges: vec![None; levels],
        allow_nil,
    };

    Ok(ResolvedQuery {
        ctx,
        kind_loc,
        keys,
        root_cond,
        cursors,
        columns,
        post,
    })
}

/// A traversal block with its assigned level, pending condition compilation.
struct RawTraversal<'t> {
    ast: &'t Ast,
    level: usize,
    children: Vec<RawTraversal<'t>>,
}

fn register_traversal<'t>(
    ast: &'t Ast,
    name: &str,
    specs: &mut Vec<String>,
    usage: &mut AttrUsage,
) -> Result<RawTraversal<'t>, Error> {
    let spec_node = &ast.children()[0];
    let spec = spec_node.value();
    if TraversalSpec::parse(spec).is_none() {
        return Err(Error::runtime(
            name,
            RuntimeErrorKind::InvalidTraversalSpec,
            spec,
            Location::from(spec_node.token()),
        ));
    }

    let level = specs.len();
    specs.push(spec.to_string());
    usage.push_level();

    let mut children = Vec::new();
    for child in &ast.children()[1..] {
        if child.kind() == NodeKind::Traverse {
            children.push(register_traversal(child, name, specs, usage)?);
        }
    }

    Ok(RawTraversal {
        ast,
        level,
        children,
    })
}

fn build_cursor(
    raw: RawTraversal<'_>,
    name: &str,
    info: &dyn NodeInfo,
    level_count: usize,
    usage: &mut AttrUsage,
) -> Result<TraversalCursor, Error> {
    let cond = match raw.ast.child_of_kind(NodeKind::Where) {
        Some(where_ast) => {
            let mut scope = CondScope {
                name,
                info,
                level: raw.level,
                has_edge: true,
                level_count,
                usage: Some(&mut *usage),
            };
            Some(condition::compile(&where_ast.children()[0], &mut scope)?)
        }
        None => None,
    };

    let spec = raw.ast.children()[0].value().to_string();
    let mut children = Vec::new();
    for child in raw.children {
        children.push(build_cursor(child, name, info, level_count, usage)?);
    }

    Ok(TraversalCursor::new(raw.level, spec, cond, children))
}

fn spec_component(spec: &str, index: usize) -> String {
    spec.split(':').nth(index).unwrap_or("").to_string()
}

/// Context for resolving `<attr>` / `<kind>:<attr>` / `<level>:n|e:<attr>`
/// column references.
struct ColumnRefs<'a> {
    name: &'a str,
    spec_count: usize,
    node_kind_pos: &'a IndexMap<String, Vec<usize>>,
    edge_kind_pos: &'a IndexMap<String, Vec<usize>>,
}

impl ColumnRefs<'_> {
    fn resolve(
        &self,
        lexeme: &str,
        loc: Location,
    ) -> Result<(usize, ColumnSource, String), Error> {
        let parts: Vec<&str> = lexeme.split(':').collect();

        if parts.len() >= 3 && matches!(parts[1], "n" | "e") {
            if let Ok(level) = parts[0].parse::<usize>() {
                if level < 1 || level > self.spec_count {
                    return Err(Error::runtime(
                        self.name,
                        RuntimeErrorKind::InvalidColumnData,
                        lexeme,
                        loc,
                    ));
                }
                let source = if parts[1] == "n" {
                    ColumnSource::Node
                } else {
                    ColumnSource::Edge
                };
                return Ok((level - 1, source, parts[2..].join(":")));
            }
        }

        if parts.len() >= 2 {
            let kind = parts[..parts.len() - 1].join(":");
            let attr = parts[parts.len() - 1].to_string();
            if let Some(levels) = self.node_kind_pos.get(&kind) {
                return Ok((levels[0], ColumnSource::Node, attr));
            }
            if let Some(levels) = self.edge_kind_pos.get(&kind) {
                return Ok((levels[0], ColumnSource::Edge, attr));
            }
            return Err(Error::runtime(
                self.name,
                RuntimeErrorKind::UnknownNodeKind,
                kind,
                loc,
            ));
        }

        Ok((0, ColumnSource::Node, lexeme.to_string()))
    }
}

#[allow(clippy::too_many_arguments)]
fn show_term_column(
    term: &Ast,
    name: &str,
    info: &dyn NodeInfo,
    refs: &ColumnRefs<'_>,
    level_kinds: &[String],
    level_edge_kinds: &[String],
    spec_count: usize,
    usage: &mut AttrUsage,
) -> Result<Column, Error> {
    let expr = &term.children()[0];
    let loc = Location::from(expr.token());

    let mut column = match expr.kind() {
        NodeKind::Func => show_function_column(expr, name, info, spec_count, usage)?,
        _ => {
            let (level, source, attr) = refs.resolve(expr.value(), loc)?;
            let head = attr.split('.').next().unwrap_or(&attr).to_string();
            let display_kind = match source {
                ColumnSource::Node => &level_kinds[level],
                _ => &level_edge_kinds[level],
            };
            let label = info.attribute_display_string(display_kind, &attr);
            match source {
                ColumnSource::Node => usage.record_node(level, &head),
                _ => usage.record_edge(level, &head),
            }
            Column {
                label,
                format: "auto".to_string(),
                level,
                source,
                attr,
                func: None,
            }
        }
    };

    if let Some(alias) = term.child_of_kind(NodeKind::As) {
        column.label = alias.children()[0].value().to_string();
    }
    if let Some(format) = term.child_of_kind(NodeKind::Format) {
        column.format = format.children()[0].value().to_string();
    }

    Ok(column)
}

fn show_function_column(
    expr: &Ast,
    name: &str,
    info: &dyn NodeInfo,
    spec_count: usize,
    usage: &mut AttrUsage,
) -> Result<Column, Error> {
    let func_name = expr.value();
    let loc = Location::from(expr.token());
    let args = expr.children();

    match func_name {
        "count" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(Error::runtime(
                    name,
                    RuntimeErrorKind::InvalidConstruct,
                    "Count function requires 2 or 3 parameters: traversal step, \
                     traversal spec, condition clause",
                    loc,
                ));
            }
            let level: usize = args[0].value().parse().unwrap_or(0);
            if level < 1 || level > spec_count {
                return Err(Error::runtime(
                    name,
                    RuntimeErrorKind::InvalidColumnData,
                    format!("Invalid traversal step ({})", args[0].value()),
                    Location::from(args[0].token()),
                ));
            }
            let spec = args[1].value().to_string();
            if TraversalSpec::parse(&spec).is_none() {
                return Err(Error::runtime(
                    name,
                    RuntimeErrorKind::InvalidTraversalSpec,
                    spec,
                    Location::from(args[1].token()),
                ));
            }
            let (cond, cond_text) = match args.get(2) {
                Some(arg) => {
                    let text = arg.value().to_string();
                    let cond = condition::compile_condition_clause(&text, name, info)?;
                    (Some(cond), Some(text))
                }
                None => (None, None),
            };
            Ok(Column {
                label: "Count".to_string(),
                format: "auto".to_string(),
                level: level - 1,
                source: ColumnSource::Func,
                attr: "count".to_string(),
                func: Some(ShowFunc::Count {
                    spec,
                    cond,
                    cond_text,
                }),
            })
        }
        "objget" => {
            let mut scope = CondScope {
                name,
                info,
                level: 0,
                has_edge: false,
                level_count: spec_count,
                usage: Some(usage),
            };
            let (level, attr, path) = condition::objget_args(expr, &mut scope)?;
            let display = scope.info.attribute_display_string("", &attr);
            Ok(Column {
                label: format!("{display}.{}", path.join(".")),
                format: "auto".to_string(),
                level,
                source: ColumnSource::Func,
                attr: "objget".to_string(),
                func: Some(ShowFunc::ObjGet { attr, path }),
            })
        }
        _ => Err(Error::runtime(
            name,
            RuntimeErrorKind::InvalidConstruct,
            format!("Unknown function: {func_name}"),
            loc,
        )),
    }
}

/// Resolve a `with` flag's column reference against the column plan: first
/// by the data spec the reference denotes, then by label (which covers
/// aliases).
fn find_column(arg: &Ast, columns: &[Column], refs: &ColumnRefs<'_>) -> Result<usize, Error> {
    let ref_node = &arg.children()[0];
    let lexeme = ref_node.value();
    let loc = Location::from(ref_node.token());

    if let Ok((level, source, attr)) = refs.resolve(lexeme, loc) {
        if let Some(index) = columns
            .iter()
            .position(|c| c.level == level && c.source == source && c.attr == attr)
        {
            return Ok(index);
        }
    }
    if let Some(index) = columns.iter().position(|c| c.label == lexeme) {
        return Ok(index);
    }

    Err(Error::runtime(
        refs.name,
        RuntimeErrorKind::InvalidConstruct,
        format!("Unknown column: {lexeme}"),
        loc,
    ))
}
