use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, RouteIndex, StopIndex};

pub type VertexId = u32;
pub type EdgeId = u32;

/// Edge weights and journey durations, in minutes.
pub type TransitTime = f64;

/// Converts meters over km/h into minutes: (m / 1000) / v * 60.
const TO_MINUTES: f64 = 0.06;

/// Vertex a rider occupies while waiting to board at a stop.
pub fn wait_vertex(stop: StopIndex) -> VertexId {
    2 * stop
}

/// Vertex a rider occupies once boarding is complete (or right after
/// stepping off a vehicle) at a stop.
pub fn ready_vertex(stop: StopIndex) -> VertexId {
    2 * stop + 1
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgePayload {
    /// Boarding delay at a stop; the weight is the shared wait time.
    Wait { stop: StopIndex },
    /// A ride covering `span` consecutive hops of one route.
    Ride {
        route: RouteIndex,
        from: StopIndex,
        to: StopIndex,
        span: u32,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: TransitTime,
    pub payload: EdgePayload,
}

/// Directed, non-negative-weight graph over two vertices per stop. Immutable
/// once built.
pub struct TransitGraph {
    vertex_count: usize,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeId>>,
}

impl TransitGraph {
    /// Builds the routing graph for a load-complete catalogue: one wait edge
    /// per stop, plus one ride edge per reachable stop pair of every route,
    /// deduplicated across routes so only the cheapest candidate survives.
    pub fn build(catalogue: &Catalogue) -> Self {
        let settings = catalogue.settings();
        let mut graph = TransitGraph::with_vertices(2 * catalogue.num_stops());

        for stop in 0..catalogue.num_stops() as StopIndex {
            graph.add_edge(Edge {
                from: wait_vertex(stop),
                to: ready_vertex(stop),
                weight: settings.bus_wait_time,
                payload: EdgePayload::Wait { stop },
            });
        }

        // Candidates keyed by (from, to) vertex pair; a later candidate
        // replaces an earlier one only when strictly cheaper, so ties keep
        // the first insertion. BTreeMap keeps edge ids deterministic.
        let mut candidates: BTreeMap<(VertexId, VertexId), Edge> = BTreeMap::new();
        for (route_idx, route) in catalogue.routes().iter().enumerate() {
            for walk in route.kind.walks(&route.stops) {
                collect_ride_candidates(
                    catalogue,
                    route_idx as RouteIndex,
                    &walk,
                    settings.bus_velocity,
                    &mut candidates,
                );
            }
        }
        for (_, edge) in candidates {
            graph.add_edge(edge);
        }

        graph
    }

    fn with_vertices(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); vertex_count],
        }
    }

    /// Restores a graph from persisted edges, rebuilding adjacency.
    pub fn from_edges(vertex_count: usize, edges: Vec<Edge>) -> Self {
        let mut graph = TransitGraph::with_vertices(vertex_count);
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.adjacency[edge.from as usize].push(id);
        self.edges.push(edge);
        id
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_count
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn outgoing(&self, vertex: VertexId) -> &[EdgeId] {
        &self.adjacency[vertex as usize]
    }
}

/// Walks one traversal order of a route, accumulating road distance from
/// every start stop to every later stop and recording the resulting ride
/// edges as candidates.
fn collect_ride_candidates(
    catalogue: &Catalogue,
    route: RouteIndex,
    walk: &[StopIndex],
    velocity_kmh: f64,
    candidates: &mut BTreeMap<(VertexId, VertexId), Edge>,
) {
    for (i, &start) in walk.iter().enumerate() {
        let mut previous = start;
        let mut distance = 0.0;
        let mut span = 0u32;

        for &next in &walk[i + 1..] {
            // A stop equal to the start (the circular terminal) yields no
            // edge onto itself.
            if next == start {
                previous = next;
                continue;
            }
            span += 1;
            distance += catalogue.road_distance(previous, next);
            previous = next;

            let weight = distance / velocity_kmh * TO_MINUTES;
            let candidate = Edge {
                from: ready_vertex(start),
                to: wait_vertex(next),
                weight,
                payload: EdgePayload::Ride {
                    route,
                    from: start,
                    to: next,
                    span,
                },
            };
            match candidates.entry((candidate.from, candidate.to)) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if weight < slot.get().weight {
                        slot.insert(candidate);
                    }
                }
            }
        }
    }
}
