#![doc = include_str!("../README.md")]

mod collections;
mod error;
mod execution;
pub mod graph;
mod result;
mod value;

pub use crate::error::Error;
pub use crate::error::RuntimeErrorKind;
pub use crate::graph::DefaultNodeInfo;
pub use crate::graph::Graph;
pub use crate::graph::NodeInfo;
pub use crate::result::SearchHeader;
pub use crate::result::SearchResult;
pub use crate::value::Value;
pub use eql_parser::Ast;
pub use eql_parser::PlainAst;
pub use eql_parser::SyntaxError;

use eql_parser::NodeKind;
use tracing::debug;

/// Parse a query without running it.
pub fn parse_query(name: &str, query: &str) -> Result<Ast, Error> {
    Ok(eql_parser::parse_query(name, query)?)
}

/// Run one query against a graph, deriving display information from the
/// store itself.
///
/// ```rust
/// use eql_engine::graph::{MemoryGraph, NodeData};
///
/// let mut graph = MemoryGraph::new();
/// graph.store_node("main", NodeData::new("123", "Author").with_attr("name", "Mike"));
///
/// let result = eql_engine::run_query("test", "main", "get Author", &graph).unwrap();
/// assert_eq!(result.row_count(), 1);
/// assert_eq!(result.to_string(), "Labels:Author Key, Name\nFormat:auto, auto\nData:1:n:key, 1:n:name\n123, Mike\n");
/// ```
pub fn run_query(
    name: &str,
    partition: &str,
    query: &str,
    graph: &dyn Graph,
) -> Result<SearchResult, Error> {
    let info = DefaultNodeInfo::new(graph);
    run_query_with_node_info(name, partition, query, graph, &info)
}

/// Run one query with an explicit display/schema oracle.
pub fn run_query_with_node_info(
    name: &str,
    partition: &str,
    query: &str,
    graph: &dyn Graph,
    info: &dyn NodeInfo,
) -> Result<SearchResult, Error> {
    debug!(name, partition, query, "parsing query");
    let ast = eql_parser::parse_query(name, query)?;
    match ast.kind() {
        NodeKind::Get | NodeKind::Lookup => {
            execution::execute(name, partition, query, &ast, graph, info)
        }
        _ => unreachable!("the parser only accepts get and lookup queries"),
    }
}
