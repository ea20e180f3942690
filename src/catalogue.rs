use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinates};

pub type StopIndex = u32;
pub type RouteIndex = u32;

/// Below this geo length a route is considered degenerate and its curvature
/// is reported as zero.
const GEO_EPSILON: f64 = 1e-6;

/// Vehicle speed and dispatch-wait parameters shared by every route in the
/// loaded dataset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    /// Vehicle speed in km/h.
    pub bus_velocity: f64,
    /// Time spent waiting to board at any stop, in minutes.
    pub bus_wait_time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// Traversed once, exactly as given.
    OneWay,
    /// Traversed forward then backward; the terminal stop is not repeated.
    Shuttle,
    /// First and last stop of the given sequence coincide; traversed once.
    Circular,
}

impl RouteKind {
    /// Stop visits made by one full service of a route with `sequence_len`
    /// stops in its declared sequence.
    pub fn stops_on_route(self, sequence_len: usize) -> usize {
        match self {
            RouteKind::Shuttle => (2 * sequence_len).saturating_sub(1),
            RouteKind::OneWay | RouteKind::Circular => sequence_len,
        }
    }

    /// Length of a full service relative to the declared sequence length.
    pub fn length_multiplier(self) -> f64 {
        match self {
            RouteKind::Shuttle => 2.0,
            RouteKind::OneWay | RouteKind::Circular => 1.0,
        }
    }

    /// Stop orders a vehicle actually drives: the declared sequence, plus the
    /// reversed sequence for a shuttle's return leg.
    pub fn walks(self, path: &[StopIndex]) -> Vec<Vec<StopIndex>> {
        match self {
            RouteKind::Shuttle => {
                vec![path.to_vec(), path.iter().rev().copied().collect()]
            }
            RouteKind::OneWay | RouteKind::Circular => vec![path.to_vec()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub coordinates: Coordinates,
}

impl PartialEq for Stop {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    /// Stop sequence exactly as declared; for a circular route the terminal
    /// stop appears at both ends.
    pub stops: Vec<StopIndex>,
    pub kind: RouteKind,
    pub geo_length: f64,
    pub true_length: f64,
    pub curvature: f64,
    pub stops_on_route: usize,
    pub unique_stops: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("stop {0:?} is already in the catalogue")]
    DuplicateStop(String),
    #[error("route {0:?} is already in the catalogue")]
    DuplicateRoute(String),
    #[error("route {route:?} references unknown stop {stop:?}")]
    UnknownStop { route: String, stop: String },
    #[error("distance entry references unknown stop {0:?}")]
    UnknownDistanceStop(String),
}

/// Owns every stop and route of a loaded dataset, the asymmetric road
/// distance table, and the reverse index of routes serving each stop.
///
/// Built once during the load phase, read-only afterwards. Stops and routes
/// are stored in append-only vectors and addressed by `StopIndex` /
/// `RouteIndex`, so references stay valid for the catalogue's lifetime.
pub struct Catalogue {
    settings: RouteSettings,
    stops: Vec<Stop>,
    stop_index: HashMap<String, StopIndex>,
    routes: Vec<Route>,
    route_index: HashMap<String, RouteIndex>,
    distances: HashMap<(StopIndex, StopIndex), f64>,
    stop_buses: Vec<BTreeSet<String>>,
}

impl Catalogue {
    /// Routing settings are required up front: a catalogue that could be
    /// queried before its settings exist is not representable.
    pub fn new(settings: RouteSettings) -> Self {
        Self {
            settings,
            stops: Vec::new(),
            stop_index: HashMap::new(),
            routes: Vec::new(),
            route_index: HashMap::new(),
            distances: HashMap::new(),
            stop_buses: Vec::new(),
        }
    }

    pub fn settings(&self) -> RouteSettings {
        self.settings
    }

    pub fn add_stop(&mut self, name: &str, coordinates: Coordinates) -> Result<StopIndex, LoadError> {
        if self.stop_index.contains_key(name) {
            return Err(LoadError::DuplicateStop(name.to_string()));
        }
        let idx = self.stops.len() as StopIndex;
        self.stop_index.insert(name.to_string(), idx);
        self.stops.push(Stop {
            name: name.to_string(),
            coordinates,
        });
        self.stop_buses.push(BTreeSet::new());
        Ok(idx)
    }

    /// Records the road distance from one stop to another, in meters. Order
    /// sensitive: the reverse direction is a separate entry.
    pub fn add_distance(&mut self, from: &str, to: &str, meters: f64) -> Result<(), LoadError> {
        let from = self.resolve_distance_stop(from)?;
        let to = self.resolve_distance_stop(to)?;
        self.distances.insert((from, to), meters);
        Ok(())
    }

    /// Inserts a route and computes its derived statistics from the distance
    /// table as it exists right now; add all distances first.
    pub fn add_route(
        &mut self,
        name: &str,
        stop_names: &[&str],
        kind: RouteKind,
    ) -> Result<RouteIndex, LoadError> {
        if self.route_index.contains_key(name) {
            return Err(LoadError::DuplicateRoute(name.to_string()));
        }

        let mut stops = Vec::with_capacity(stop_names.len());
        for stop_name in stop_names {
            let idx = self
                .stop_index
                .get(*stop_name)
                .copied()
                .ok_or_else(|| LoadError::UnknownStop {
                    route: name.to_string(),
                    stop: stop_name.to_string(),
                })?;
            stops.push(idx);
        }

        let mut geo_length = 0.0;
        let mut true_length = 0.0;
        for pair in stops.windows(2) {
            geo_length += geo::great_circle_distance(
                self.stops[pair[0] as usize].coordinates,
                self.stops[pair[1] as usize].coordinates,
            );
            true_length += self.road_distance(pair[0], pair[1]);
        }
        geo_length *= kind.length_multiplier();
        true_length *= kind.length_multiplier();
        let curvature = if geo_length < GEO_EPSILON {
            0.0
        } else {
            true_length / geo_length
        };

        let unique_stops = stops.iter().collect::<HashSet<_>>().len();
        let route = Route {
            name: name.to_string(),
            kind,
            geo_length,
            true_length,
            curvature,
            stops_on_route: kind.stops_on_route(stops.len()),
            unique_stops,
            stops,
        };

        Ok(self.insert_route(route))
    }

    pub fn stop(&self, name: &str) -> Option<StopIndex> {
        self.stop_index.get(name).copied()
    }

    pub fn route(&self, name: &str) -> Option<RouteIndex> {
        self.route_index.get(name).copied()
    }

    pub fn get_stop(&self, stop: StopIndex) -> &Stop {
        &self.stops[stop as usize]
    }

    pub fn get_route(&self, route: RouteIndex) -> &Route {
        &self.routes[route as usize]
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Names of the routes serving a stop, sorted. Empty for a stop no route
    /// visits, which is distinct from the stop being unknown.
    pub fn buses_through_stop(&self, stop: StopIndex) -> &BTreeSet<String> {
        &self.stop_buses[stop as usize]
    }

    /// Road distance for a stop pair, falling back to the forward entry when
    /// the reverse was never provided.
    pub fn distance(&self, from: StopIndex, to: StopIndex) -> Option<f64> {
        self.distances
            .get(&(from, to))
            .or_else(|| self.distances.get(&(to, from)))
            .copied()
    }

    /// Road distance for a pair of adjacent stops on some route. A pair with
    /// no entry in either direction falls back to the great-circle distance.
    pub fn road_distance(&self, from: StopIndex, to: StopIndex) -> f64 {
        match self.distance(from, to) {
            Some(meters) => meters,
            None => {
                log::debug!(
                    "no road distance between {:?} and {:?}, using geo distance",
                    self.stops[from as usize].name,
                    self.stops[to as usize].name,
                );
                geo::great_circle_distance(
                    self.stops[from as usize].coordinates,
                    self.stops[to as usize].coordinates,
                )
            }
        }
    }

    pub(crate) fn distance_entries(&self) -> impl Iterator<Item = (StopIndex, StopIndex, f64)> + '_ {
        self.distances.iter().map(|(&(from, to), &m)| (from, to, m))
    }

    /// Re-inserts a route whose statistics were computed by a previous load;
    /// nothing is recomputed.
    pub(crate) fn insert_route(&mut self, route: Route) -> RouteIndex {
        let idx = self.routes.len() as RouteIndex;
        self.route_index.insert(route.name.clone(), idx);
        for &stop in &route.stops {
            self.stop_buses[stop as usize].insert(route.name.clone());
        }
        self.routes.push(route);
        idx
    }

    pub(crate) fn set_distance(&mut self, from: StopIndex, to: StopIndex, meters: f64) {
        self.distances.insert((from, to), meters);
    }

    fn resolve_distance_stop(&self, name: &str) -> Result<StopIndex, LoadError> {
        self.stop_index
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownDistanceStop(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Catalogue {
        Catalogue::new(RouteSettings {
            bus_velocity: 40.0,
            bus_wait_time: 6.0,
        })
    }

    fn co_located(catalogue: &mut Catalogue, names: &[&str]) {
        for name in names {
            catalogue.add_stop(name, Coordinates::new(0.0, 0.0)).unwrap();
        }
    }

    #[test]
    fn distance_falls_back_to_forward_entry() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b"]);
        c.add_distance("a", "b", 100.0).unwrap();
        let a = c.stop("a").unwrap();
        let b = c.stop("b").unwrap();
        assert_eq!(c.distance(a, b), Some(100.0));
        assert_eq!(c.distance(b, a), Some(100.0));
    }

    #[test]
    fn reverse_entry_overrides_fallback() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b"]);
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_distance("b", "a", 150.0).unwrap();
        let a = c.stop("a").unwrap();
        let b = c.stop("b").unwrap();
        assert_eq!(c.distance(a, b), Some(100.0));
        assert_eq!(c.distance(b, a), Some(150.0));
    }

    #[test]
    fn shuttle_stop_counts() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b", "d"]);
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_distance("b", "d", 200.0).unwrap();
        let idx = c.add_route("7", &["a", "b", "d"], RouteKind::Shuttle).unwrap();
        let route = c.get_route(idx);
        assert_eq!(route.stops_on_route, 5);
        assert_eq!(route.unique_stops, 3);
    }

    #[test]
    fn circular_terminal_not_double_counted() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b", "d"]);
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_distance("b", "d", 200.0).unwrap();
        c.add_distance("d", "a", 300.0).unwrap();
        let idx = c
            .add_route("9", &["a", "b", "d", "a"], RouteKind::Circular)
            .unwrap();
        let route = c.get_route(idx);
        assert_eq!(route.stops_on_route, 4);
        assert_eq!(route.unique_stops, 3);
        assert_eq!(route.true_length, 600.0);
    }

    #[test]
    fn shuttle_lengths_are_doubled() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b"]);
        c.add_distance("a", "b", 100.0).unwrap();
        let idx = c.add_route("7", &["a", "b"], RouteKind::Shuttle).unwrap();
        let route = c.get_route(idx);
        assert_eq!(route.true_length, 200.0);
        // Co-located stops: geo length ~ 0, curvature reported as 0.
        assert!(route.geo_length < 1e-6);
        assert_eq!(route.curvature, 0.0);
    }

    #[test]
    fn curvature_against_geo_length() {
        let mut c = catalogue();
        c.add_stop("a", Coordinates::new(55.611087, 37.20829)).unwrap();
        c.add_stop("b", Coordinates::new(55.595884, 37.209755)).unwrap();
        c.add_distance("a", "b", 2000.0).unwrap();
        let idx = c.add_route("7", &["a", "b"], RouteKind::OneWay).unwrap();
        let route = c.get_route(idx);
        assert!(route.geo_length > 0.0);
        assert!((route.curvature - route.true_length / route.geo_length).abs() < 1e-12);
    }

    #[test]
    fn buses_through_stop_is_empty_not_missing() {
        let mut c = catalogue();
        co_located(&mut c, &["x", "a", "b"]);
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_route("7", &["a", "b"], RouteKind::Shuttle).unwrap();
        let x = c.stop("x").unwrap();
        assert!(c.buses_through_stop(x).is_empty());
        assert_eq!(c.stop("unknown"), None);
        let a = c.stop("a").unwrap();
        assert_eq!(
            c.buses_through_stop(a).iter().collect::<Vec<_>>(),
            vec!["7"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut c = catalogue();
        co_located(&mut c, &["a", "b"]);
        assert!(matches!(
            c.add_stop("a", Coordinates::new(1.0, 1.0)),
            Err(LoadError::DuplicateStop(_))
        ));
        c.add_distance("a", "b", 100.0).unwrap();
        c.add_route("7", &["a", "b"], RouteKind::OneWay).unwrap();
        assert!(matches!(
            c.add_route("7", &["b", "a"], RouteKind::OneWay),
            Err(LoadError::DuplicateRoute(_))
        ));
    }

    #[test]
    fn route_with_unknown_stop_is_rejected() {
        let mut c = catalogue();
        co_located(&mut c, &["a"]);
        let err = c.add_route("7", &["a", "ghost"], RouteKind::OneWay);
        assert!(matches!(err, Err(LoadError::UnknownStop { .. })));
        assert_eq!(c.num_routes(), 0);
    }
}
