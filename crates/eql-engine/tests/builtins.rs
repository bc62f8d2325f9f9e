//! The builtin functions: `count`, `objget`, `parseDate`.

use crate::fixtures::date_graph;
use crate::fixtures::song_graph;
use crate::fixtures::PART;
use eql_engine::graph::MemoryGraph;
use eql_engine::graph::NodeData;
use eql_engine::run_query;
use eql_engine::Value;
use pretty_assertions::assert_eq;

#[test]
fn show_count_projects_a_count_column() {
    let graph = song_graph();
    let result = run_query(
        "test",
        PART,
        "get Author show name, @count(1, :::Song) AS mycount format xxx",
        &graph,
    )
    .unwrap();

    assert_eq!(result.header().labels, ["Name", "mycount"]);
    assert_eq!(result.header().formats, ["auto", "xxx"]);
    assert_eq!(result.header().data, ["1:n:name", "1:func:count"]);

    let mut rows: Vec<(String, String)> = (0..result.row_count())
        .map(|i| {
            (
                result.row(i)[0].to_string(),
                result.row(i)[1].to_string(),
            )
        })
        .collect();
    rows.sort();
    assert_eq!(
        rows,
        [
            ("Hans".to_string(), "1".to_string()),
            ("John".to_string(), "4".to_string()),
            ("Mike".to_string(), "4".to_string()),
        ]
    );
}

#[test]
fn where_count_and_show_count_agree() {
    let graph = song_graph();
    let cond = "(name beginswith 'M') or name beginswith 'L'";
    let query = format!(
        "get Author where @count(:::Song, \"{cond}\") = 1 \
         show key, name, @count(1, :::Song, \"{cond}\")"
    );
    let result = run_query("test", PART, &query, &graph).unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(result.row(0), &[
        Value::from("123"),
        Value::from("Mike"),
        Value::Int(1),
    ]);
    assert_eq!(result.row(1), &[
        Value::from("456"),
        Value::from("Hans"),
        Value::Int(1),
    ]);
}

#[test]
fn count_cells_carry_a_query_row_source() {
    let graph = song_graph();
    let cond = "(name beginswith 'M') or name beginswith 'L'";
    let query = format!(
        "get Author where @count(:::Song, \"{cond}\") = 1 \
         show key, name, @count(1, :::Song, \"{cond}\")"
    );
    let result = run_query("test", PART, &query, &graph).unwrap();

    assert_eq!(
        result.row_source(0)[2],
        "q:lookup Author \"123\" traverse :::Song \
         where (name beginswith 'M') or name beginswith 'L' \
         end show 2:n:key, 2:n:kind, 2:n:name"
    );
}

/// For any count, filtering by `@count(spec) = n` in where selects exactly
/// the rows whose `@count(...)` show column equals `n`.
#[test]
fn count_is_consistent_between_where_and_show() {
    let graph = song_graph();
    for n in [0, 1, 4] {
        let query = format!(
            "get Author where @count(:::Song) = {n} show name, @count(1, :::Song)"
        );
        let result = run_query("test", PART, &query, &graph).unwrap();
        for i in 0..result.row_count() {
            assert_eq!(result.row(i)[1], Value::Int(n));
        }
        let expected = match n {
            1 => 1,
            4 => 2,
            _ => 0,
        };
        assert_eq!(result.row_count(), expected, "n = {n}");
    }
}

#[test]
fn parse_date_defaults_to_rfc3339() {
    let graph = date_graph();
    let result = run_query(
        "test",
        PART,
        "get datetest where @parseDate(RFC3339_value) = unix",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 2);
}

#[test]
fn parse_date_accepts_a_reference_layout() {
    let graph = date_graph();
    let result = run_query(
        "test",
        PART,
        "get datetest where @parseDate(naive_value, '2006-01-02') > \
         @parseDate('2012-10-11', '2006-01-02')",
        &graph,
    )
    .unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(result.row(0)[0], Value::from("001"));
}

fn config_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    let settings = Value::map_from([(
        "a".to_string(),
        Value::map_from([("b".to_string(), Value::Int(42))]),
    )]);
    graph.store_node(
        PART,
        NodeData::new("c1", "config").with_attr("settings", settings),
    );
    graph
}

#[test]
fn objget_descends_into_map_attributes() {
    let graph = config_graph();
    let result = run_query(
        "test",
        PART,
        "get config show @objget(1, settings, a.b)",
        &graph,
    )
    .unwrap();

    assert_eq!(result.header().labels, ["Settings.a.b"]);
    assert_eq!(result.header().data, ["1:func:objget"]);
    assert_eq!(result.row(0)[0], Value::Int(42));
}

#[test]
fn objget_filters_in_where_clauses() {
    let graph = config_graph();
    let result = run_query(
        "test",
        PART,
        "get config where @objget(1, settings, a.b) = 42",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 1);

    let result = run_query(
        "test",
        PART,
        "get config where @objget(1, settings, a.missing) = 42",
        &graph,
    )
    .unwrap();
    assert_eq!(result.row_count(), 0);
}
