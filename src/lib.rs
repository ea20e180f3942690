pub mod geo;

pub mod catalogue;

pub use catalogue::{Catalogue, RouteKind, RouteSettings};

pub mod graph;

pub use graph::TransitGraph;

pub mod dijkstra;

pub use dijkstra::find_path;

pub mod journey;

pub use journey::{Journey, Segment};

pub mod router;

pub use router::TransitRouter;

pub mod requests;
pub mod persist;
