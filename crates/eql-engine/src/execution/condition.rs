//! Compiled where-clause conditions and their evaluation.
//!
//! The resolver compiles each where clause AST into a [`CondExpr`] tree
//! once per query; evaluation then runs per `(node, edge)` pair without
//! touching the AST again. Operand classification (edge attribute, node
//! attribute, literal) happens at compile time, as does regex caching for
//! literal `like` patterns.

use crate::error::Location;
use crate::execution::functions;
use crate::graph::EdgeData;
use crate::graph::Graph;
use crate::graph::NodeData;
use crate::graph::NodeInfo;
use crate::graph::TraversalSpec;
use crate::Error;
use crate::RuntimeErrorKind;
use crate::Value;
use eql_parser::Ast;
use eql_parser::NodeKind;
use eql_parser::TokenKind;
use std::cell::OnceCell;
use std::cmp::Ordering;

#[derive(Debug)]
pub(crate) enum CondExpr {
    Literal(Value),
    /// A node attribute, optionally with a nested path below the attribute.
    NodeAttr {
        name: String,
        path: Vec<String>,
    },
    EdgeAttr {
        name: String,
    },
    Not(Box<CondExpr>),
    And(Box<CondExpr>, Box<CondExpr>),
    Or(Box<CondExpr>, Box<CondExpr>),
    Compare {
        op: CompareOp,
        left: Box<CondExpr>,
        right: Box<CondExpr>,
    },
    Arith {
        op: ArithOp,
        left: Box<CondExpr>,
        right: Box<CondExpr>,
        loc: Location,
    },
    /// Unary `-` / `+`.
    Unary {
        negate: bool,
        operand: Box<CondExpr>,
        loc: Location,
    },
    StringOp {
        op: StringOp,
        left: Box<CondExpr>,
        right: Box<CondExpr>,
    },
    /// `in` / `notin`.
    ListOp {
        negate: bool,
        left: Box<CondExpr>,
        right: Box<CondExpr>,
        loc: Location,
    },
    Like {
        left: Box<CondExpr>,
        right: Box<CondExpr>,
        /// Present when the pattern is a literal: compiled lazily on first
        /// match and reused for the lifetime of the runtime.
        cached: Option<OnceCell<regex::Regex>>,
        loc: Location,
    },
    List(Vec<CondExpr>),
    Call(FuncExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    DivInt,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringOp {
    Contains,
    ContainsNot,
    BeginsWith,
    EndsWith,
}

/// A where-context builtin call.
#[derive(Debug)]
pub(crate) enum FuncExpr {
    /// `@count(<spec>[, <condition>])`: traverse from the current node and
    /// count the reached pairs.
    Count {
        spec: String,
        cond: Option<Box<CondExpr>>,
    },
    /// `@objget(<level>, <attr>, <path>)`: nested lookup on another level's
    /// node.
    ObjGet {
        level: usize,
        attr: String,
        path: Vec<String>,
    },
    /// `@parseDate(<expr>[, <layout>])`: date string to Unix seconds.
    ParseDate {
        value: Box<CondExpr>,
        layout: Option<Box<CondExpr>>,
        loc: Location,
    },
}

/// Attribute usage collected during resolve, one slot per traversal level.
/// The traversal runtime fetches exactly these slices from the store.
#[derive(Debug, Default)]
pub(crate) struct AttrUsage {
    pub nodes: Vec<Vec<String>>,
    pub edges: Vec<Vec<String>>,
}

impl AttrUsage {
    pub fn push_level(&mut self) {
        self.nodes.push(Vec::new());
        self.edges.push(Vec::new());
    }

    pub fn record_node(&mut self, level: usize, attr: &str) {
        let slot = &mut self.nodes[level];
        if !slot.iter().any(|a| a == attr) {
            slot.push(attr.to_string());
        }
    }

    pub fn record_edge(&mut self, level: usize, attr: &str) {
        let slot = &mut self.edges[level];
        if !slot.iter().any(|a| a == attr) {
            slot.push(attr.to_string());
        }
    }
}

/// Compile-time context for one where clause.
pub(crate) struct CondScope<'a> {
    pub name: &'a str,
    pub info: &'a dyn NodeInfo,
    /// Traversal level this condition filters.
    pub level: usize,
    /// Whether the filtered level carries edge data.
    pub has_edge: bool,
    /// Total number of registered levels, for `objget` validation.
    pub level_count: usize,
    /// Attribute sink; `None` for conditions evaluated against fully
    /// fetched data (the `count` condition clause).
    pub usage: Option<&'a mut AttrUsage>,
}

impl CondScope<'_> {
    fn err(&self, kind: RuntimeErrorKind, detail: impl Into<String>, loc: Location) -> Error {
        Error::runtime(self.name, kind, detail, loc)
    }

    fn record_node(&mut self, attr: &str) {
        let level = self.level;
        if let Some(usage) = self.usage.as_deref_mut() {
            usage.record_node(level, attr);
        }
    }

    fn record_edge(&mut self, attr: &str) {
        let level = self.level;
        if let Some(usage) = self.usage.as_deref_mut() {
            usage.record_edge(level, attr);
        }
    }
}

pub(crate) fn compile(ast: &Ast, scope: &mut CondScope<'_>) -> Result<CondExpr, Error> {
    let loc = Location::from(ast.token());
    match ast.kind() {
        NodeKind::Value => compile_operand(ast, scope),
        NodeKind::List => {
            let items = ast
                .children()
                .iter()
                .map(|child| compile(child, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CondExpr::List(items))
        }
        NodeKind::Func => compile_function(ast, scope),

        NodeKind::Not => Ok(CondExpr::Not(Box::new(compile(
            &ast.children()[0],
            scope,
        )?))),
        NodeKind::And => {
            let (l, r) = compile_pair(ast, scope)?;
            Ok(CondExpr::And(l, r))
        }
        NodeKind::Or => {
            let (l, r) = compile_pair(ast, scope)?;
            Ok(CondExpr::Or(l, r))
        }

        NodeKind::Eq => compile_compare(ast, scope, CompareOp::Eq),
        NodeKind::Neq => compile_compare(ast, scope, CompareOp::Neq),
        NodeKind::Gt => compile_compare(ast, scope, CompareOp::Gt),
        NodeKind::Gte => compile_compare(ast, scope, CompareOp::Gte),
        NodeKind::Lt => compile_compare(ast, scope, CompareOp::Lt),
        NodeKind::Lte => compile_compare(ast, scope, CompareOp::Lte),

        NodeKind::Add | NodeKind::Sub if ast.children().len() == 1 => {
            let operand = Box::new(compile(&ast.children()[0], scope)?);
            Ok(CondExpr::Unary {
                negate: ast.kind() == NodeKind::Sub,
                operand,
                loc,
            })
        }
        NodeKind::Add => compile_arith(ast, scope, ArithOp::Add),
        NodeKind::Sub => compile_arith(ast, scope, ArithOp::Sub),
        NodeKind::Mul => compile_arith(ast, scope, ArithOp::Mul),
        NodeKind::Div => compile_arith(ast, scope, ArithOp::Div),
        NodeKind::DivInt => compile_arith(ast, scope, ArithOp::DivInt),
        NodeKind::Mod => compile_arith(ast, scope, ArithOp::Mod),

        NodeKind::Contains => compile_string_op(ast, scope, StringOp::Contains),
        NodeKind::ContainsNot => compile_string_op(ast, scope, StringOp::ContainsNot),
        NodeKind::BeginsWith => compile_string_op(ast, scope, StringOp::BeginsWith),
        NodeKind::EndsWith => compile_string_op(ast, scope, StringOp::EndsWith),

        NodeKind::In | NodeKind::NotIn => {
            let (left, right) = compile_pair(ast, scope)?;
            Ok(CondExpr::ListOp {
                negate: ast.kind() == NodeKind::NotIn,
                left,
                right,
                loc,
            })
        }

        NodeKind::Like => {
            let (left, right) = compile_pair(ast, scope)?;
            let cached = matches!(&*right, CondExpr::Literal(_)).then(OnceCell::new);
            Ok(CondExpr::Like {
                left,
                right,
                cached,
                loc,
            })
        }

        kind => Err(scope.err(
            RuntimeErrorKind::InvalidConstruct,
            format!("Unexpected condition term: {}", kind.name()),
            loc,
        )),
    }
}

fn compile_pair(
    ast: &Ast,
    scope: &mut CondScope<'_>,
) -> Result<(Box<CondExpr>, Box<CondExpr>), Error> {
    let left = Box::new(compile(&ast.children()[0], scope)?);
    let right = Box::new(compile(&ast.children()[1], scope)?);
    Ok((left, right))
}

fn compile_compare(ast: &Ast, scope: &mut CondScope<'_>, op: CompareOp) -> Result<CondExpr, Error> {
    let (left, right) = compile_pair(ast, scope)?;
    Ok(CondExpr::Compare { op, left, right })
}

fn compile_arith(ast: &Ast, scope: &mut CondScope<'_>, op: ArithOp) -> Result<CondExpr, Error> {
    let loc = Location::from(ast.token());
    let (left, right) = compile_pair(ast, scope)?;
    Ok(CondExpr::Arith {
        op,
        left,
        right,
        loc,
    })
}

fn compile_string_op(
    ast: &Ast,
    scope: &mut CondScope<'_>,
    op: StringOp,
) -> Result<CondExpr, Error> {
    let (left, right) = compile_pair(ast, scope)?;
    Ok(CondExpr::StringOp { op, left, right })
}

/// Classify a value operand: explicit `attr:` / `eattr:` / `val:` prefixes,
/// then numbers, then schema-validated bare identifiers (dotted identifiers
/// become nested attributes when the head names an attribute), and finally
/// string literals.
fn compile_operand(ast: &Ast, scope: &mut CondScope<'_>) -> Result<CondExpr, Error> {
    let token = ast.token();
    let loc = Location::from(token);

    match token.kind() {
        TokenKind::QuotedValue => {
            return Ok(CondExpr::Literal(Value::Str(token.value().to_string())))
        }
        TokenKind::True => return Ok(CondExpr::Literal(Value::Bool(true))),
        TokenKind::False => return Ok(CondExpr::Literal(Value::Bool(false))),
        TokenKind::Null => return Ok(CondExpr::Literal(Value::Null)),
        _ => {}
    }

    let lexeme = token.value();

    if let Some(rest) = lexeme.strip_prefix("attr:") {
        return Ok(node_attr(rest, scope));
    }
    if let Some(rest) = lexeme.strip_prefix("eattr:") {
        if !scope.has_edge {
            return Err(scope.err(
                RuntimeErrorKind::InvalidWhereClause,
                "No edge data available at this level",
                loc,
            ));
        }
        scope.record_edge(rest);
        return Ok(CondExpr::EdgeAttr {
            name: rest.to_string(),
        });
    }
    if let Some(rest) = lexeme.strip_prefix("val:") {
        return Ok(CondExpr::Literal(Value::Str(rest.to_string())));
    }

    if let Ok(i) = lexeme.parse::<i64>() {
        return Ok(CondExpr::Literal(Value::Int(i)));
    }
    if let Ok(f) = lexeme.parse::<f64>() {
        return Ok(CondExpr::Literal(Value::Float(f)));
    }

    let head = lexeme.split('.').next().unwrap_or(lexeme);
    if scope.info.is_valid_attr(head) {
        return Ok(node_attr(lexeme, scope));
    }

    Ok(CondExpr::Literal(Value::Str(lexeme.to_string())))
}

fn node_attr(spec: &str, scope: &mut CondScope<'_>) -> CondExpr {
    let mut parts = spec.split('.');
    let name = parts.next().unwrap_or(spec).to_string();
    let path: Vec<String> = parts.map(str::to_string).collect();
    scope.record_node(&name);
    CondExpr::NodeAttr { name, path }
}

fn compile_function(ast: &Ast, scope: &mut CondScope<'_>) -> Result<CondExpr, Error> {
    let name = ast.value();
    let loc = Location::from(ast.token());
    let args = ast.children();

    let func = match name {
        "count" => {
            if args.is_empty() || args.len() > 2 {
                return Err(scope.err(
                    RuntimeErrorKind::InvalidConstruct,
                    "Count function requires 1 or 2 parameters: traversal spec, condition clause",
                    loc,
                ));
            }
            let spec = args[0].value().to_string();
            if TraversalSpec::parse(&spec).is_none() {
                return Err(scope.err(
                    RuntimeErrorKind::InvalidTraversalSpec,
                    spec,
                    Location::from(args[0].token()),
                ));
            }
            let cond = match args.get(1) {
                Some(arg) => Some(Box::new(compile_condition_clause(
                    arg.value(),
                    scope.name,
                    scope.info,
                )?)),
                None => None,
            };
            FuncExpr::Count { spec, cond }
        }
        "objget" => {
            let (level, attr, path) = objget_args(ast, scope)?;
            FuncExpr::ObjGet { level, attr, path }
        }
        "parseDate" => {
            if args.is_empty() || args.len() > 2 {
                return Err(scope.err(
                    RuntimeErrorKind::InvalidConstruct,
                    "parseDate function requires 1 or 2 parameters: date string, optional layout",
                    loc,
                ));
            }
            let value = Box::new(compile(&args[0], scope)?);
            let layout = match args.get(1) {
                Some(arg) => Some(Box::new(compile(arg, scope)?)),
                None => None,
            };
            FuncExpr::ParseDate { value, layout, loc }
        }
        _ => {
            return Err(scope.err(
                RuntimeErrorKind::InvalidConstruct,
                format!("Unknown function: {name}"),
                loc,
            ))
        }
    };

    Ok(CondExpr::Call(func))
}

/// Shared argument handling for `objget`, which addresses a node at an
/// explicit (1-based) traversal level.
pub(crate) fn objget_args(
    ast: &Ast,
    scope: &mut CondScope<'_>,
) -> Result<(usize, String, Vec<String>), Error> {
    let loc = Location::from(ast.token());
    let args = ast.children();
    if args.len() != 3 {
        return Err(scope.err(
            RuntimeErrorKind::InvalidConstruct,
            "Objget function requires 3 parameters: traversal step, attribute name, path to value",
            loc,
        ));
    }

    let level: usize = args[0].value().parse().unwrap_or(0);
    if level < 1 || level > scope.level_count {
        return Err(scope.err(
            RuntimeErrorKind::InvalidColumnData,
            format!("Invalid traversal step ({})", args[0].value()),
            Location::from(args[0].token()),
        ));
    }
    let attr = args[1].value().to_string();
    let path: Vec<String> = args[2].value().split('.').map(str::to_string).collect();

    if let Some(usage) = scope.usage.as_deref_mut() {
        usage.record_node(level - 1, &attr);
    }

    Ok((level - 1, attr, path))
}

/// Parse and compile a `count` condition clause, given as a string operand.
/// The text is the where clause of a synthetic query.
pub(crate) fn compile_condition_clause(
    text: &str,
    name: &str,
    info: &dyn NodeInfo,
) -> Result<CondExpr, Error> {
    let query = format!("get c where {text}");
    let ast = eql_parser::parse_query(name, &query)?;
    let where_ast = ast
        .child_of_kind(eql_parser::NodeKind::Where)
        .expect("the synthetic query has a where clause");

    let mut scope = CondScope {
        name,
        info,
        level: 0,
        has_edge: true,
        level_count: 0,
        usage: None,
    };
    compile(&where_ast.children()[0], &mut scope)
}

/// Everything evaluation needs besides the current `(node, edge)` pair.
pub(crate) struct EvalEnv<'a> {
    pub name: &'a str,
    pub part: &'a str,
    pub graph: &'a dyn Graph,
    pub row_nodes: &'a [Option<NodeData>],
}

impl EvalEnv<'_> {
    fn err(&self, kind: RuntimeErrorKind, detail: impl Into<String>, loc: Location) -> Error {
        Error::runtime(self.name, kind, detail, loc)
    }
}

/// Evaluate a compiled condition against one `(node, edge)` pair.
///
/// Strictly left-to-right; `and` and `or` short-circuit. Any error aborts
/// the row and surfaces to the driver.
pub(crate) fn eval(
    expr: &CondExpr,
    env: &EvalEnv<'_>,
    node: Option<&NodeData>,
    edge: Option<&EdgeData>,
) -> Result<Value, Error> {
    match expr {
        CondExpr::Literal(value) => Ok(value.clone()),

        CondExpr::NodeAttr { name, path } => {
            let value = node.and_then(|n| n.attr(name)).unwrap_or(Value::Null);
            Ok(descend(value, path))
        }

        CondExpr::EdgeAttr { name } => {
            Ok(edge.and_then(|e| e.attr(name)).unwrap_or(Value::Null))
        }

        CondExpr::Not(operand) => {
            Ok(Value::Bool(!eval(operand, env, node, edge)?.to_bool()))
        }

        CondExpr::And(left, right) => {
            if !eval(left, env, node, edge)?.to_bool() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, env, node, edge)?.to_bool()))
        }

        CondExpr::Or(left, right) => {
            if eval(left, env, node, edge)?.to_bool() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, env, node, edge)?.to_bool()))
        }

        CondExpr::Compare { op, left, right } => {
            let l = eval(left, env, node, edge)?;
            let r = eval(right, env, node, edge)?;
            let result = match op {
                CompareOp::Eq => l.equals(&r),
                CompareOp::Neq => !l.equals(&r),
                CompareOp::Gt => order(&l, &r) == Ordering::Greater,
                CompareOp::Gte => order(&l, &r) != Ordering::Less,
                CompareOp::Lt => order(&l, &r) == Ordering::Less,
                CompareOp::Lte => order(&l, &r) != Ordering::Greater,
            };
            Ok(Value::Bool(result))
        }

        CondExpr::Arith {
            op,
            left,
            right,
            loc,
        } => {
            let l = number_operand(&eval(left, env, node, edge)?, env, *loc)?;
            let r = number_operand(&eval(right, env, node, edge)?, env, *loc)?;
            let result = match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => l / r,
                ArithOp::DivInt => (l / r).trunc(),
                ArithOp::Mod => l % r,
            };
            Ok(Value::Float(result))
        }

        CondExpr::Unary {
            negate,
            operand,
            loc,
        } => {
            let v = number_operand(&eval(operand, env, node, edge)?, env, *loc)?;
            Ok(Value::Float(if *negate { -v } else { v }))
        }

        CondExpr::StringOp { op, left, right } => {
            let l = eval(left, env, node, edge)?.to_string();
            let r = eval(right, env, node, edge)?.to_string();
            let result = match op {
                StringOp::Contains => l.contains(&r),
                StringOp::ContainsNot => !l.contains(&r),
                StringOp::BeginsWith => l.starts_with(&r),
                StringOp::EndsWith => l.ends_with(&r),
            };
            Ok(Value::Bool(result))
        }

        CondExpr::ListOp {
            negate,
            left,
            right,
            loc,
        } => {
            let l = eval(left, env, node, edge)?;
            let r = eval(right, env, node, edge)?;
            let Value::List(items) = &r else {
                return Err(env.err(RuntimeErrorKind::NotAList, r.to_string(), *loc));
            };
            let contained = items.iter().any(|item| l.equals(item));
            Ok(Value::Bool(contained != *negate))
        }

        CondExpr::Like {
            left,
            right,
            cached,
            loc,
        } => {
            let l = eval(left, env, node, edge)?.to_string();
            let pattern = eval(right, env, node, edge)?.to_string();
            let matched = match cached {
                Some(cell) => {
                    let regex = match cell.get() {
                        Some(regex) => regex,
                        None => {
                            let compiled = compile_regex(&pattern, env, *loc)?;
                            cell.set(compiled).ok();
                            cell.get().expect("cell was just populated")
                        }
                    };
                    regex.is_match(&l)
                }
                None => compile_regex(&pattern, env, *loc)?.is_match(&l),
            };
            Ok(Value::Bool(matched))
        }

        CondExpr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, env, node, edge))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }

        CondExpr::Call(func) => eval_function(func, env, node, edge),
    }
}

fn eval_function(
    func: &FuncExpr,
    env: &EvalEnv<'_>,
    node: Option<&NodeData>,
    edge: Option<&EdgeData>,
) -> Result<Value, Error> {
    match func {
        FuncExpr::Count { spec, cond, .. } => {
            let Some(node) = node else {
                return Ok(Value::Int(0));
            };
            let count = functions::count_traversal(env, node, spec, cond.as_deref())?;
            Ok(Value::Int(count))
        }

        FuncExpr::ObjGet { level, attr, path } => {
            let value = env
                .row_nodes
                .get(*level)
                .and_then(|slot| slot.as_ref())
                .and_then(|n| n.attr(attr))
                .unwrap_or(Value::Null);
            Ok(descend(value, path))
        }

        FuncExpr::ParseDate { value, layout, loc } => {
            let input = eval(value, env, node, edge)?.to_string();
            let layout = match layout {
                Some(layout) => Some(eval(layout, env, node, edge)?.to_string()),
                None => None,
            };
            match functions::parse_date(&input, layout.as_deref()) {
                Ok(seconds) => Ok(Value::Int(seconds)),
                Err(reason) => Err(env.err(
                    RuntimeErrorKind::InvalidConstruct,
                    format!("Cannot parse date '{input}': {reason}"),
                    *loc,
                )),
            }
        }
    }
}

/// Nested lookup on map values; `path` steps that are missing or applied to
/// a non-map yield the value found so far or `Null` respectively.
pub(crate) fn descend(value: Value, path: &[String]) -> Value {
    let mut current = value;
    for step in path {
        match current {
            Value::Map(mut entries) => {
                current = entries.swap_remove(step).unwrap_or(Value::Null);
            }
            other => return other,
        }
    }
    current
}

/// Ordering for relational comparison: numeric when both sides coerce,
/// lexicographic on the canonical string forms otherwise.
fn order(l: &Value, r: &Value) -> Ordering {
    match (l.to_number(), r.to_number()) {
        (Some(a), Some(b)) => ordered_float::OrderedFloat(a).cmp(&ordered_float::OrderedFloat(b)),
        _ => l.to_string().cmp(&r.to_string()),
    }
}

fn number_operand(value: &Value, env: &EvalEnv<'_>, loc: Location) -> Result<f64, Error> {
    value
        .to_number()
        .ok_or_else(|| env.err(RuntimeErrorKind::NotANumber, value.to_string(), loc))
}

fn compile_regex(pattern: &str, env: &EvalEnv<'_>, loc: Location) -> Result<regex::Regex, Error> {
    regex::Regex::new(pattern).map_err(|err| {
        env.err(
            RuntimeErrorKind::NotARegex,
            format!("{pattern:?} - {err}"),
            loc,
        )
    })
}
