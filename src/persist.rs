use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, Route, RouteSettings, StopIndex};
use crate::geo::Coordinates;
use crate::graph::{Edge, TransitGraph};
use crate::router::TransitRouter;

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encode: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("snapshot decode: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

#[derive(Debug, Serialize, Deserialize)]
struct StopRecord {
    id: StopIndex,
    name: String,
    coordinates: Coordinates,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphRecord {
    vertex_count: usize,
    edges: Vec<Edge>,
}

/// Complete exported form of a loaded dataset: every stop with its stable
/// id, the distance table, every route with its cached statistics, the
/// settings, and the routing graph when one was already built. Restoring
/// recomputes nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    settings: RouteSettings,
    stops: Vec<StopRecord>,
    distances: Vec<(StopIndex, StopIndex, f64)>,
    routes: Vec<Route>,
    graph: Option<GraphRecord>,
}

impl Snapshot {
    pub fn capture(router: &TransitRouter) -> Self {
        let catalogue = router.catalogue();
        let stops = catalogue
            .stops()
            .iter()
            .enumerate()
            .map(|(id, stop)| StopRecord {
                id: id as StopIndex,
                name: stop.name.clone(),
                coordinates: stop.coordinates,
            })
            .collect();
        let mut distances: Vec<_> = catalogue.distance_entries().collect();
        distances.sort_by_key(|&(from, to, _)| (from, to));
        Self {
            settings: catalogue.settings(),
            stops,
            distances,
            routes: catalogue.routes().to_vec(),
            graph: router.built_graph().map(|graph| GraphRecord {
                vertex_count: graph.num_vertices(),
                edges: graph.edges().to_vec(),
            }),
        }
    }

    /// Reconstructs the router. Stop records are inserted in id order, so
    /// every persisted index resolves to the stop it was captured from.
    pub fn restore(self) -> TransitRouter {
        let mut catalogue = Catalogue::new(self.settings);
        let mut stops = self.stops;
        stops.sort_by_key(|record| record.id);
        for record in stops {
            // Names were unique at capture time.
            let _ = catalogue.add_stop(&record.name, record.coordinates);
        }
        for (from, to, meters) in self.distances {
            catalogue.set_distance(from, to, meters);
        }
        for route in self.routes {
            catalogue.insert_route(route);
        }
        let graph = self
            .graph
            .map(|record| TransitGraph::from_edges(record.vertex_count, record.edges));
        TransitRouter::from_parts(catalogue, graph)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = fs::read(path)?;
        let (snapshot, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(snapshot)
    }
}
