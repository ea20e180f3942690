use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::graph::{EdgeId, TransitGraph, TransitTime, VertexId};

/// Shortest path between two vertices: edge ids in traversal order plus the
/// summed weight.
pub struct SearchPath {
    pub edges: Vec<EdgeId>,
    pub total_time: TransitTime,
}

/// Frontier entry ordered so the binary heap pops the smallest tentative
/// time first.
struct QueueEntry {
    time: TransitTime,
    vertex: VertexId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the minimum.
        other.time.total_cmp(&self.time)
    }
}

/// Dijkstra over the non-negative edge weights of `graph`. State is local to
/// the call, so independent queries never interfere.
pub fn find_path(graph: &TransitGraph, from: VertexId, to: VertexId) -> Option<SearchPath> {
    if from == to {
        return Some(SearchPath {
            edges: Vec::new(),
            total_time: 0.0,
        });
    }

    let mut dist = vec![TransitTime::INFINITY; graph.num_vertices()];
    let mut prev: Vec<Option<EdgeId>> = vec![None; graph.num_vertices()];
    let mut frontier = BinaryHeap::new();

    dist[from as usize] = 0.0;
    frontier.push(QueueEntry {
        time: 0.0,
        vertex: from,
    });

    while let Some(QueueEntry { time, vertex }) = frontier.pop() {
        if vertex == to {
            break;
        }
        if time > dist[vertex as usize] {
            continue; // Stale entry.
        }
        for &edge_id in graph.outgoing(vertex) {
            let edge = graph.edge(edge_id);
            let relaxed = time + edge.weight;
            if relaxed < dist[edge.to as usize] {
                dist[edge.to as usize] = relaxed;
                prev[edge.to as usize] = Some(edge_id);
                frontier.push(QueueEntry {
                    time: relaxed,
                    vertex: edge.to,
                });
            }
        }
    }

    if dist[to as usize].is_infinite() {
        return None;
    }

    let mut edges = Vec::new();
    let mut vertex = to;
    while vertex != from {
        let edge_id = prev[vertex as usize]?;
        edges.push(edge_id);
        vertex = graph.edge(edge_id).from;
    }
    edges.reverse();

    Some(SearchPath {
        edges,
        total_time: dist[to as usize],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Catalogue, RouteKind, RouteSettings};
    use crate::geo::Coordinates;
    use crate::graph::{wait_vertex, TransitGraph};

    fn small_network() -> (Catalogue, TransitGraph) {
        let mut c = Catalogue::new(RouteSettings {
            bus_velocity: 1.0,
            bus_wait_time: 2.0,
        });
        for name in ["a", "b", "d", "lonely"] {
            c.add_stop(name, Coordinates::new(0.0, 0.0)).unwrap();
        }
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_distance("b", "d", 100.0).unwrap();
        c.add_route("1", &["a", "b"], RouteKind::Shuttle).unwrap();
        c.add_route("2", &["b", "d"], RouteKind::Shuttle).unwrap();
        let graph = TransitGraph::build(&c);
        (c, graph)
    }

    #[test]
    fn finds_path_with_transfer() {
        let (c, graph) = small_network();
        let a = wait_vertex(c.stop("a").unwrap());
        let d = wait_vertex(c.stop("d").unwrap());
        let path = find_path(&graph, a, d).unwrap();
        // Wait, ride, wait, ride: 2 + 6 + 2 + 6.
        assert_eq!(path.edges.len(), 4);
        assert!((path.total_time - 16.0).abs() < 1e-9);
    }

    #[test]
    fn unreachable_vertex_yields_none() {
        let (c, graph) = small_network();
        let a = wait_vertex(c.stop("a").unwrap());
        let lonely = wait_vertex(c.stop("lonely").unwrap());
        assert!(find_path(&graph, a, lonely).is_none());
    }

    #[test]
    fn trivial_query_is_an_empty_path() {
        let (c, graph) = small_network();
        let a = wait_vertex(c.stop("a").unwrap());
        let path = find_path(&graph, a, a).unwrap();
        assert!(path.edges.is_empty());
        assert_eq!(path.total_time, 0.0);
    }

    #[test]
    fn path_edges_connect_endpoints() {
        let (c, graph) = small_network();
        let a = wait_vertex(c.stop("a").unwrap());
        let d = wait_vertex(c.stop("d").unwrap());
        let path = find_path(&graph, a, d).unwrap();
        let mut at = a;
        for edge_id in &path.edges {
            let edge = graph.edge(*edge_id);
            assert_eq!(edge.from, at);
            at = edge.to;
        }
        assert_eq!(at, d);
    }
}
