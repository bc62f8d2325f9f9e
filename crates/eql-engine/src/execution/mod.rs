//! Query execution: resolve the AST into runtime state, then drive the
//! traversal cursors and assemble rows.

pub(crate) mod condition;
mod driver;
mod functions;
mod resolve;
mod traversal;

use crate::execution::condition::CondExpr;
use crate::execution::condition::EvalEnv;
use crate::graph::EdgeData;
use crate::graph::Graph;
use crate::graph::NodeData;
use crate::graph::NodeInfo;
use crate::Error;
use crate::SearchResult;
use eql_parser::Ast;

/// Per-query runtime state, created by the resolver, mutated only by the
/// driver thread during iteration and discarded afterwards.
pub(crate) struct ExecutionContext<'a> {
    pub name: String,
    pub part: String,
    pub graph: &'a dyn Graph,
    pub info: &'a dyn NodeInfo,
    /// Kind the key iteration starts at (level 0).
    pub start_kind: String,
    /// Kind reported as primary in the result header.
    pub primary_kind: String,
    pub group_scope: Option<String>,
    /// All traversal specs; index 0 is the root kind.
    pub specs: Vec<String>,
    /// Attribute slices to fetch per level.
    pub attrs_nodes: Vec<Vec<String>>,
    pub attrs_edges: Vec<Vec<String>>,
    /// Current node/edge per level during row assembly.
    pub row_nodes: Vec<Option<NodeData>>,
    pub row_edges: Vec<Option<EdgeData>>,
    pub allow_nil: bool,
}

impl ExecutionContext<'_> {
    pub(crate) fn env(&self) -> EvalEnv<'_> {
        EvalEnv {
            name: &self.name,
            part: &self.part,
            graph: self.graph,
            row_nodes: &self.row_nodes,
        }
    }
}

/// Where a column's cell values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnSource {
    Node,
    Edge,
    Func,
}

/// A show-context builtin, evaluated once per emitted row.
#[derive(Debug)]
pub(crate) enum ShowFunc {
    Count {
        spec: String,
        cond: Option<CondExpr>,
        /// Original condition text, reproduced in the cell's row source.
        cond_text: Option<String>,
    },
    ObjGet {
        attr: String,
        path: Vec<String>,
    },
}

/// One entry of the projection plan.
#[derive(Debug)]
pub(crate) struct Column {
    pub label: String,
    pub format: String,
    pub level: usize,
    pub source: ColumnSource,
    pub attr: String,
    pub func: Option<ShowFunc>,
}

impl Column {
    /// The column data spec, e.g. `1:n:key` or `1:func:count`.
    pub fn data_string(&self) -> String {
        let source = match self.source {
            ColumnSource::Node => "n",
            ColumnSource::Edge => "e",
            ColumnSource::Func => "func",
        };
        format!("{}:{}:{}", self.level + 1, source, self.attr)
    }
}

/// Resolve and run one parsed query.
pub(crate) fn execute(
    name: &str,
    part: &str,
    query_text: &str,
    ast: &Ast,
    graph: &dyn Graph,
    info: &dyn NodeInfo,
) -> Result<SearchResult, Error> {
    let resolved = resolve::resolve(name, part, ast, graph, info)?;
    driver::run(resolved, query_text)
}
