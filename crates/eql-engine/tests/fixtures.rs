//! Shared fixture graphs for the integration tests.

use eql_engine::graph::EdgeData;
use eql_engine::graph::EndPoint;
use eql_engine::graph::MemoryGraph;
use eql_engine::graph::NodeData;

pub const PART: &str = "main";

/// Three authors with nine songs between them.
///
/// Iteration order is Mike, Hans, John; exactly one of Mike's songs and
/// Hans' only song start with `M` or `L`, none of John's do.
pub fn song_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();

    for (key, name) in [("123", "Mike"), ("456", "Hans"), ("000", "John")] {
        graph.store_node(PART, NodeData::new(key, "Author").with_attr("name", name));
    }

    let songs: &[(&str, &str, f64)] = &[
        ("123", "MySong1", 5.0),
        ("123", "Aria2", 2.0),
        ("123", "Aria3", 4.0),
        ("123", "Aria4", 8.0),
        ("456", "LoveSong5", 1.0),
        ("000", "DeadSong1", 6.0),
        ("000", "FightSong2", 3.0),
        ("000", "Solo3", 1.0),
        ("000", "Solo4", 2.0),
    ];
    for (author, name, ranking) in songs {
        graph.store_node(
            PART,
            NodeData::new(*name, "Song")
                .with_attr("name", *name)
                .with_attr("ranking", *ranking),
        );
        graph.store_edge(
            PART,
            EdgeData::new(
                format!("w-{name}"),
                "Wrote",
                EndPoint::new(*author, "Author", "author"),
                EndPoint::new(*name, "Song", "song"),
            ),
        );
    }

    graph
}

/// The song graph plus a group node `best` containing Mike and John.
pub fn song_graph_with_group() -> MemoryGraph {
    let mut graph = song_graph();
    graph.store_node(PART, NodeData::new("best", "group"));
    for (key, member) in [("m-123", "123"), ("m-000", "000")] {
        graph.store_edge(
            PART,
            EdgeData::new(
                key,
                "Contains",
                EndPoint::new("best", "group", "group"),
                EndPoint::new(member, "Author", "member"),
            ),
        );
    }
    graph
}

/// A flat list of nodes with numeric rankings.
pub fn simple_list() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    let nodes: &[(&str, &str, f64)] = &[
        ("123", "Node1", 2.1),
        ("456", "Node2", 3.0),
        ("789", "Node3", 1.5),
    ];
    for (key, name, ranking) in nodes {
        graph.store_node(
            PART,
            NodeData::new(*key, "mynode")
                .with_attr("name", *name)
                .with_attr("ranking", *ranking),
        );
    }
    graph
}

/// Date nodes carrying the same instant in three encodings.
pub fn date_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    for (key, rfc3339, naive) in [
        ("001", "2012-10-12T14:00:00Z", "2012-10-12"),
        ("002", "2012-10-10T10:00:00Z", "2012-10-10"),
    ] {
        let unix = chrono::DateTime::parse_from_rfc3339(rfc3339)
            .expect("fixture dates are valid")
            .timestamp();
        graph.store_node(
            PART,
            NodeData::new(key, "datetest")
                .with_attr("RFC3339_value", rfc3339)
                .with_attr("naive_value", naive)
                .with_attr("unix", unix),
        );
    }
    graph
}
