//! Group scoping via `from group`.

use crate::fixtures::song_graph_with_group;
use crate::fixtures::PART;
use eql_engine::run_query;
use pretty_assertions::assert_eq;

fn names(result: &eql_engine::SearchResult) -> Vec<String> {
    (0..result.row_count())
        .map(|i| result.row(i)[0].to_string())
        .collect()
}

#[test]
fn get_from_group_scopes_the_key_iteration() {
    let graph = song_graph_with_group();
    let result = run_query("test", PART, "get Author from group best show name", &graph)
        .unwrap();
    assert_eq!(names(&result), ["Mike", "John"]);
}

#[test]
fn lookup_from_group_filters_the_key_list() {
    let graph = song_graph_with_group();
    let result = run_query(
        "test",
        PART,
        "lookup Author '123', '456' from group best show name",
        &graph,
    )
    .unwrap();
    assert_eq!(names(&result), ["Mike"]);
}

#[test]
fn missing_groups_yield_no_rows() {
    let graph = song_graph_with_group();
    let result = run_query(
        "test",
        PART,
        "get Author from group nosuchgroup show name",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 0);
}

#[test]
fn group_scope_composes_with_traversals() {
    let graph = song_graph_with_group();
    let result = run_query(
        "test",
        PART,
        "get Author from group best traverse :::Song end show Author:name \
         with filtering(uniquecount Author:name)",
        &graph,
    )
    .unwrap();
    assert_eq!(names(&result), ["Mike (4)", "John (4)"]);
}
