//! End-to-end query scenarios against the fixture graphs.

use crate::fixtures::simple_list;
use crate::fixtures::song_graph;
use crate::fixtures::PART;
use eql_engine::run_query;
use eql_engine::Value;
use expect_test::expect;
use pretty_assertions::assert_eq;

fn cell(result: &eql_engine::SearchResult, row: usize, col: usize) -> String {
    result.row(row)[col].to_string()
}

#[test]
fn where_clause_filters_numeric_ranges() {
    let graph = simple_list();
    let result = run_query(
        "test",
        PART,
        "get mynode where ranking >= 2.1 and ranking < 3",
        &graph,
    )
    .unwrap();

    assert_eq!(
        result.to_string(),
        "Labels:mynode Key, Name, Ranking\n\
         Format:auto, auto, auto\n\
         Data:1:n:key, 1:n:name, 1:n:ranking\n\
         123, Node1, 2.1\n"
    );
}

#[test]
fn header_is_deterministic_across_runs() {
    let graph = song_graph();
    let query = "get Author traverse :::Song end show Author:name, Song:name, Song:ranking";
    let first = run_query("test", PART, query, &graph).unwrap().to_string();
    let second = run_query("test", PART, query, &graph).unwrap().to_string();
    assert_eq!(first, second);
}

#[test]
fn traversal_emits_one_row_per_pair() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Author:name, Song:name",
        &graph,
    )
    .unwrap();

    assert_eq!(result.row_count(), 9);
    let authors: Vec<String> = (0..9).map(|i| cell(&result, i, 0)).collect();
    assert_eq!(
        authors,
        ["Mike", "Mike", "Mike", "Mike", "Hans", "John", "John", "John", "John"]
    );
    assert_eq!(cell(&result, 0, 1), "MySong1");
    assert_eq!(cell(&result, 4, 1), "LoveSong5");
}

#[test]
fn row_sources_record_cell_origins() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song end show Author:name, Song:name",
        &graph,
    )
    .unwrap();

    assert_eq!(
        result.row_source(0),
        &["n:Author:123".to_string(), "n:Song:MySong1".to_string()]
    );
}

#[test]
fn traversal_where_restricts_pairs() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where ranking > 4 end show Author:name, Song:name",
        &graph,
    )
    .unwrap();

    // Hans has no song above 4, so his root is skipped entirely.
    let pairs: Vec<(String, String)> = (0..result.row_count())
        .map(|i| (cell(&result, i, 0), cell(&result, i, 1)))
        .collect();
    assert_eq!(
        pairs,
        [
            ("Mike".to_string(), "MySong1".to_string()),
            ("Mike".to_string(), "Aria4".to_string()),
            ("John".to_string(), "DeadSong1".to_string()),
        ]
    );
}

#[test]
fn empty_traversal_skips_the_root_without_nulltraversal() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where name = '123' end",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 0);
}

#[test]
fn nulltraversal_pads_child_columns_with_nil() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where name = '123' end with nulltraversal(true)",
        &graph,
    )
    .unwrap();

    // Default columns: Author key/name, then Song key/name/ranking.
    assert_eq!(
        result.header().labels,
        ["Author Key", "Name", "Song Key", "Name", "Ranking"]
    );
    assert_eq!(result.row_count(), 3);
    for i in 0..3 {
        assert!(!result.row(i)[0].is_null());
        assert!(result.row(i)[2].is_null());
        assert!(result.row(i)[3].is_null());
        assert!(result.row(i)[4].is_null());
        assert_eq!(result.row_source(i)[2], "");
    }
    assert!(result.to_string().contains("<not set>, <not set>, <not set>"));
}

#[test]
fn lookup_retrieves_explicit_keys() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "lookup Author '123', '456' show name",
        &graph,
    )
    .unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(cell(&result, 0, 0), "Mike");
    assert_eq!(cell(&result, 1, 0), "Hans");
}

#[test]
fn lookup_skips_missing_keys() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "lookup Author '123', 'nosuchkey' show name",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 1);
}

#[test]
fn nested_traversals_walk_back_to_the_author() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song traverse :::Author end end \
         show 1:n:name, 2:n:name, 3:n:name",
        &graph,
    )
    .unwrap();

    assert_eq!(result.row_count(), 9);
    for i in 0..9 {
        assert_eq!(cell(&result, i, 0), cell(&result, i, 2));
    }
}

#[test]
fn sibling_traversals_produce_the_cartesian_product() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where ranking > 4 end \
         traverse :::Song where ranking <= 4 end \
         show 1:n:name, 2:n:name, 3:n:name",
        &graph,
    )
    .unwrap();

    // Mike: 2 high x 2 low; Hans: no high song, root skipped; John: 1 x 3.
    let rows: Vec<(String, String, String)> = (0..result.row_count())
        .map(|i| (cell(&result, i, 0), cell(&result, i, 1), cell(&result, i, 2)))
        .collect();
    assert_eq!(rows.len(), 7);
    let expected: Vec<(String, String, String)> = [
        ("Mike", "MySong1", "Aria2"),
        ("Mike", "MySong1", "Aria3"),
        ("Mike", "Aria4", "Aria2"),
        ("Mike", "Aria4", "Aria3"),
    ]
    .iter()
    .map(|(a, s1, s2)| (a.to_string(), s1.to_string(), s2.to_string()))
    .collect();
    assert_eq!(rows[..4], expected[..]);
    assert_eq!(rows[4].0, "John");
}

#[test]
fn edge_columns_and_edge_conditions() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where eattr:end2role = 'song' end \
         show Author:name, Wrote:end1role",
        &graph,
    )
    .unwrap();

    assert_eq!(result.row_count(), 9);
    assert_eq!(cell(&result, 0, 1), "author");
    assert!(result.row_source(0)[1].starts_with("e:Wrote:"));
}

#[test]
fn primary_clause_changes_the_reported_kind() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author primary Song traverse :::Song end show Song:name",
        &graph,
    )
    .unwrap();
    assert_eq!(result.header().primary_kind, "Song");
}

#[test]
fn csv_rendering_uses_labels_as_the_first_record() {
    let graph = simple_list();
    let result = run_query(
        "test",
        PART,
        "get mynode where ranking >= 2.1 and ranking < 3",
        &graph,
    )
    .unwrap();
    assert_eq!(result.csv().unwrap(), "mynode Key,Name,Ranking\n123,Node1,2.1\n");
}

#[test]
fn csv_quotes_fields_that_need_it() {
    let mut graph = simple_list();
    graph.store_node(
        PART,
        eql_engine::graph::NodeData::new("999", "mynode")
            .with_attr("name", "Quo,ted")
            .with_attr("ranking", 9.0),
    );
    let result = run_query(
        "test",
        PART,
        "get mynode where ranking = 9 show name",
        &graph,
    )
    .unwrap();
    assert_eq!(result.csv().unwrap(), "Name\n\"Quo,ted\"\n");
}

#[test]
fn values_survive_as_typed_cells() {
    let graph = simple_list();
    let result = run_query("test", PART, "get mynode where key = 123 show ranking", &graph)
        .unwrap();
    assert_eq!(result.row(0)[0], Value::Float(2.1));
}

#[test]
fn result_rendering_snapshot() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author traverse :::Song where ranking > 4 end \
         show Author:name, Song:name, Song:ranking",
        &graph,
    )
    .unwrap();
    let expected = expect![[r#"
        Labels:Name, Name, Ranking
        Format:auto, auto, auto
        Data:1:n:name, 2:n:name, 2:n:ranking
        Mike, MySong1, 5
        Mike, Aria4, 8
        John, DeadSong1, 6
    "#]];
    expected.assert_eq(&result.to_string());
}

#[test]
fn short_circuit_skips_the_divergent_right_operand() {
    let graph = simple_list();

    // `name + 1` errors when evaluated; a false left operand must skip it.
    let result = run_query(
        "test",
        PART,
        "get mynode where name = 'NoSuchName' and name + 1 > 0",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 0);

    let err = run_query(
        "test",
        PART,
        "get mynode where name = 'Node1' and name + 1 > 0",
        &graph,
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("EQL error in test: Value of operand is not a number (Node1)"));

    // Same for `or` with a true left operand.
    let result = run_query(
        "test",
        PART,
        "get mynode where name = 'Node1' or name + 1 > 0",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 1);
}
