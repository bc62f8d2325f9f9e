//! `with` clause behavior: ordering, filtering, nulltraversal.

use crate::fixtures::song_graph;
use crate::fixtures::PART;
use eql_engine::run_query;
use pretty_assertions::assert_eq;

fn column(result: &eql_engine::SearchResult, col: usize) -> Vec<String> {
    (0..result.row_count())
        .map(|i| result.row(i)[col].to_string())
        .collect()
}

#[test]
fn uniquecount_rewrites_cells_in_traversal_order() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Author:name \
         with filtering(uniquecount Author:name)",
        &graph,
    )
    .unwrap();

    assert_eq!(column(&result, 0), ["Mike (4)", "Hans (1)", "John (4)"]);
}

#[test]
fn unique_drops_repeated_values() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Author:name \
         with filtering(unique Author:name)",
        &graph,
    )
    .unwrap();

    assert_eq!(column(&result, 0), ["Mike", "Hans", "John"]);
}

#[test]
fn ordering_sorts_stably_and_repeatably() {
    let graph = song_graph();
    let query = "get Author traverse :::Song end show Song:name \
                 with ordering(ascending Song:name)";
    let result = run_query("test", PART, query, &graph).unwrap();

    let mut expected = column(&result, 0);
    expected.sort();
    assert_eq!(column(&result, 0), expected);

    // Repeating the query (and a no-op with clause variant) returns the
    // same rows.
    let again = run_query("test", PART, query, &graph).unwrap();
    assert_eq!(result.rows(), again.rows());
}

#[test]
fn later_sort_keys_are_outermost() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Author:name, Song:name \
         with ordering(ascending Song:name, descending Author:name)",
        &graph,
    )
    .unwrap();

    // The author sort was applied last, so it dominates; song names order
    // rows within one author.
    assert_eq!(
        column(&result, 0),
        ["Mike", "Mike", "Mike", "Mike", "John", "John", "John", "John", "Hans"]
    );
    assert_eq!(
        column(&result, 1)[..4],
        ["Aria2".to_string(), "Aria3".to_string(), "Aria4".to_string(), "MySong1".to_string()]
    );
}

#[test]
fn numeric_ordering_beats_lexicographic() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Song:name, Song:ranking \
         with ordering(descending Song:ranking)",
        &graph,
    )
    .unwrap();

    let rankings: Vec<String> = column(&result, 1);
    assert_eq!(rankings[0], "8");
    assert_eq!(rankings[1], "6");
    assert_eq!(rankings.last().unwrap(), "1");
}

#[test]
fn ordering_resolves_aliases() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author show name, @count(1, :::Song) as mycount \
         with ordering(ascending mycount)",
        &graph,
    )
    .unwrap();

    assert_eq!(column(&result, 0), ["Hans", "Mike", "John"]);
    assert_eq!(column(&result, 1), ["1", "4", "4"]);
}

#[test]
fn isnotnull_drops_nil_padded_rows() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where name = '123' end \
         show Author:name, Song:name \
         with nulltraversal(true), filtering(isnotnull Song:name)",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 0);
}

#[test]
fn isnull_keeps_only_nil_padded_rows() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where name = '123' end \
         show Author:name, Song:name \
         with nulltraversal(true), filtering(isnull Song:name)",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 3);
}
