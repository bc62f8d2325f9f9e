//! The get/lookup driver: produce root keys, pump the traversal cursors and
//! emit rows.

use crate::collections::HashSet;
use crate::execution::condition::descend;
use crate::execution::condition::eval;
use crate::execution::functions;
use crate::execution::resolve::KeySpec;
use crate::execution::resolve::ResolvedQuery;
use crate::execution::traversal;
use crate::execution::Column;
use crate::execution::ColumnSource;
use crate::execution::ExecutionContext;
use crate::execution::ShowFunc;
use crate::graph::Graph;
use crate::graph::NodeData;
use crate::graph::GROUP_KIND;
use crate::result::SearchHeader;
use crate::Error;
use crate::RuntimeErrorKind;
use crate::SearchResult;
use crate::Value;
use tracing::debug;
use tracing::trace;

pub(crate) fn run(mut q: ResolvedQuery<'_>, query_text: &str) -> Result<SearchResult, Error> {
    debug!(
        name = %q.ctx.name,
        partition = %q.ctx.part,
        kind = %q.ctx.start_kind,
        "running query"
    );

    let keys = root_keys(&q)?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut sources: Vec<Vec<String>> = Vec::new();

    'keys: for key in keys {
        let Some(root) = q.ctx.graph.fetch_node_part(
            &q.ctx.part,
            &key,
            &q.ctx.start_kind,
            &q.ctx.attrs_nodes[0],
        )?
        else {
            continue;
        };

        q.ctx.row_nodes[0] = Some(root.clone());
        q.ctx.row_edges[0] = None;

        if let Some(cond) = &q.root_cond {
            let env = q.ctx.env();
            if !eval(cond, &env, Some(&root), None)?.to_bool() {
                continue;
            }
        }

        for cursor in &mut q.cursors {
            match cursor.set_source(&mut q.ctx, Some(&root)) {
                Ok(()) => {}
                Err(Error::EmptyTraversal) => continue 'keys,
                Err(err) => return Err(err),
            }
        }

        loop {
            emit_row(&q.ctx, &q.columns, &mut rows, &mut sources)?;
            match traversal::advance_siblings(&mut q.cursors, &mut q.ctx) {
                Ok(true) => {}
                Ok(false) => break,
                // A deeper level ran dry while advancing: this root is done.
                Err(Error::EmptyTraversal) => continue 'keys,
                Err(err) => return Err(err),
            }
        }
    }

    trace!(rows = rows.len(), "rows assembled");
    q.post.apply(&mut rows, &mut sources);

    let header = SearchHeader {
        partition: q.ctx.part.clone(),
        primary_kind: q.ctx.primary_kind.clone(),
        labels: q.columns.iter().map(|c| c.label.clone()).collect(),
        formats: q.columns.iter().map(|c| c.format.clone()).collect(),
        data: q.columns.iter().map(Column::data_string).collect(),
    };
    Ok(SearchResult::new(
        q.ctx.name.clone(),
        query_text.to_string(),
        header,
        rows,
        sources,
    ))
}

/// Produce the root key list: all keys of the start kind for `get`, the
/// explicit list for `lookup`, both scoped to group membership when a
/// `from group` clause is present.
fn root_keys(q: &ResolvedQuery<'_>) -> Result<Vec<String>, Error> {
    let ctx = &q.ctx;

    let Some(iterator) = ctx.graph.node_key_iterator(&ctx.part, &ctx.start_kind)? else {
        return Err(Error::runtime(
            &ctx.name,
            RuntimeErrorKind::UnknownNodeKind,
            ctx.start_kind.clone(),
            q.kind_loc,
        ));
    };

    match (&q.keys, &ctx.group_scope) {
        (KeySpec::AllOfKind, None) => Ok(iterator.collect()),
        (KeySpec::AllOfKind, Some(group)) => {
            group_members(ctx.graph, &ctx.part, group, &ctx.start_kind)
        }
        (KeySpec::Explicit(keys), None) => Ok(keys.clone()),
        (KeySpec::Explicit(keys), Some(group)) => {
            let members: HashSet<String> =
                group_members(ctx.graph, &ctx.part, group, &ctx.start_kind)?
                    .into_iter()
                    .collect();
            Ok(keys
                .iter()
                .filter(|key| members.contains(*key))
                .cloned()
                .collect())
        }
    }
}

/// Keys of all nodes of `kind` the group node points at.
fn group_members(
    graph: &dyn Graph,
    part: &str,
    group: &str,
    kind: &str,
) -> Result<Vec<String>, Error> {
    let spec = format!(":::{kind}");
    let (nodes, _) = graph.traverse_multi(part, group, GROUP_KIND, &spec, false)?;
    Ok(nodes.into_iter().map(|n| n.key().to_string()).collect())
}

/// Assemble one output row from the current row slots.
fn emit_row(
    ctx: &ExecutionContext<'_>,
    columns: &[Column],
    rows: &mut Vec<Vec<Value>>,
    sources: &mut Vec<Vec<String>>,
) -> Result<(), Error> {
    let mut row = Vec::with_capacity(columns.len());
    let mut row_sources = Vec::with_capacity(columns.len());

    for column in columns {
        let (value, source) = match column.source {
            ColumnSource::Node => match &ctx.row_nodes[column.level] {
                Some(node) => (
                    lookup_attr(node, &column.attr),
                    format!("n:{}:{}", node.kind(), node.key()),
                ),
                None => (Value::Null, String::new()),
            },
            ColumnSource::Edge => match &ctx.row_edges[column.level] {
                Some(edge) => (
                    edge.attr(&column.attr).unwrap_or(Value::Null),
                    format!("e:{}:{}", edge.kind(), edge.key()),
                ),
                None => (Value::Null, String::new()),
            },
            ColumnSource::Func => function_cell(ctx, column)?,
        };
        row.push(value);
        row_sources.push(source);
    }

    rows.push(row);
    sources.push(row_sources);
    Ok(())
}

fn function_cell(
    ctx: &ExecutionContext<'_>,
    column: &Column,
) -> Result<(Value, String), Error> {
    let func = column
        .func
        .as_ref()
        .expect("function columns carry their function");
    let Some(node) = &ctx.row_nodes[column.level] else {
        return Ok((Value::Null, String::new()));
    };

    match func {
        ShowFunc::Count {
            spec,
            cond,
            cond_text,
        } => {
            let env = ctx.env();
            let count = functions::count_traversal(&env, node, spec, cond.as_ref())?;
            let where_part = cond_text
                .as_ref()
                .map(|text| format!(" where {text}"))
                .unwrap_or_default();
            let source = format!(
                "q:lookup {} \"{}\" traverse {}{} end show 2:n:key, 2:n:kind, 2:n:name",
                node.kind(),
                node.key(),
                spec,
                where_part,
            );
            Ok((Value::Int(count), source))
        }
        ShowFunc::ObjGet { attr, path } => {
            let value = node.attr(attr).unwrap_or(Value::Null);
            let source = format!("n:{}:{}", node.kind(), node.key());
            Ok((descend(value, path), source))
        }
    }
}

/// Attribute lookup for row assembly: exact attribute name first, then a
/// dotted path into a map attribute.
fn lookup_attr(node: &NodeData, attr: &str) -> Value {
    if let Some(value) = node.attr(attr) {
        return value;
    }
    let mut parts = attr.split('.');
    let Some(head) = parts.next() else {
        return Value::Null;
    };
    let path: Vec<String> = parts.map(str::to_string).collect();
    if path.is_empty() {
        return Value::Null;
    }
    match node.attr(head) {
        Some(value) => descend(value, &path),
        None => Value::Null,
    }
}
