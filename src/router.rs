use std::sync::OnceLock;

use log::info;

use crate::catalogue::Catalogue;
use crate::dijkstra::{self, SearchPath};
use crate::graph::{wait_vertex, EdgePayload, TransitGraph};
use crate::journey::{Journey, Segment};

/// Everything derived from the catalogue for answering route queries. Built
/// once, on the first query.
struct RouterCore {
    graph: TransitGraph,
}

impl RouterCore {
    fn build(catalogue: &Catalogue) -> Self {
        let graph = TransitGraph::build(catalogue);
        info!(
            "routing graph built: {} vertices, {} edges",
            graph.num_vertices(),
            graph.num_edges()
        );
        Self { graph }
    }
}

/// The query facade: owns the loaded catalogue and lazily builds the routing
/// graph behind it. Unbuilt until the first `route` call, built (and shared
/// by every later query) afterwards.
pub struct TransitRouter {
    catalogue: Catalogue,
    core: OnceLock<RouterCore>,
}

impl TransitRouter {
    pub fn new(catalogue: Catalogue) -> Self {
        Self {
            catalogue,
            core: OnceLock::new(),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Whether the graph has been built yet (it is built at most once).
    pub fn is_built(&self) -> bool {
        self.core.get().is_some()
    }

    /// Fastest journey between two named stops. `None` when either name is
    /// unknown or no connecting sequence of routes exists.
    pub fn route(&self, from: &str, to: &str) -> Option<Journey<'_>> {
        let from = self.catalogue.stop(from)?;
        let to = self.catalogue.stop(to)?;
        let core = self.core();
        let path = dijkstra::find_path(&core.graph, wait_vertex(from), wait_vertex(to))?;
        Some(self.journey_from(core, path))
    }

    fn core(&self) -> &RouterCore {
        self.core.get_or_init(|| RouterCore::build(&self.catalogue))
    }

    fn journey_from(&self, core: &RouterCore, path: SearchPath) -> Journey<'_> {
        let segments = path
            .edges
            .iter()
            .map(|&edge_id| {
                let edge = core.graph.edge(edge_id);
                match edge.payload {
                    EdgePayload::Wait { stop } => Segment::Wait {
                        stop,
                        time: edge.weight,
                    },
                    EdgePayload::Ride { route, span, .. } => Segment::Ride {
                        route,
                        span,
                        time: edge.weight,
                    },
                }
            })
            .collect();
        Journey {
            segments,
            total_time: path.total_time,
            catalogue: &self.catalogue,
        }
    }

    /// Restores a router whose graph was captured in a snapshot, skipping the
    /// lazy build.
    pub(crate) fn from_parts(catalogue: Catalogue, graph: Option<TransitGraph>) -> Self {
        let core = OnceLock::new();
        if let Some(graph) = graph {
            let _ = core.set(RouterCore { graph });
        }
        Self { catalogue, core }
    }

    pub(crate) fn built_graph(&self) -> Option<&TransitGraph> {
        self.core.get().map(|core| &core.graph)
    }
}
