use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, LoadError, RouteKind, RouteSettings};
use crate::journey::Segment;
use crate::router::TransitRouter;

/// An error processing a request batch. Any of these aborts the whole batch;
/// per-request "not found" conditions are answered inline instead.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("malformed request document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Debug, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

/// The load-phase document: stops, distances and routes to build the
/// catalogue from, plus the shared routing settings.
#[derive(Debug, Deserialize)]
pub struct BaseInput {
    pub serialization_settings: SerializationSettings,
    pub routing_settings: RouteSettings,
    pub base_requests: Vec<BaseRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop(StopRequest),
    Bus(BusRequest),
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub road_distances: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct BusRequest {
    pub name: String,
    pub stops: Vec<String>,
    pub is_roundtrip: bool,
}

impl BusRequest {
    /// A roundtrip whose travel returns to its first stop is circular; a
    /// roundtrip that does not close on itself is driven once as given.
    /// Everything else is a there-and-back shuttle.
    fn kind(&self) -> RouteKind {
        if self.is_roundtrip {
            if self.stops.len() > 1 && self.stops.first() == self.stops.last() {
                RouteKind::Circular
            } else {
                RouteKind::OneWay
            }
        } else {
            RouteKind::Shuttle
        }
    }
}

/// The query-phase document.
#[derive(Debug, Deserialize)]
pub struct StatInput {
    pub serialization_settings: SerializationSettings,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StatRequest {
    pub id: i64,
    #[serde(flatten)]
    pub kind: StatKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StatKind {
    Stop { name: String },
    Bus { name: String },
    Route { from: String, to: String },
}

#[derive(Debug, Serialize)]
pub struct StatResponse {
    pub request_id: i64,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    NotFound {
        error_message: String,
    },
    Stop {
        buses: Vec<String>,
    },
    Bus {
        curvature: f64,
        route_length: f64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Route {
        total_time: f64,
        items: Vec<RouteItem>,
    },
}

impl ResponseBody {
    fn not_found() -> Self {
        ResponseBody::NotFound {
            error_message: "not found".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RouteItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

/// Builds a catalogue from a load-phase document. All stops are inserted
/// first, then every road distance, then the routes, so forward references
/// inside one batch resolve and route statistics see the complete table.
pub fn build_catalogue(input: &BaseInput) -> Result<Catalogue, RequestError> {
    let mut catalogue = Catalogue::new(input.routing_settings);

    for request in &input.base_requests {
        if let BaseRequest::Stop(stop) = request {
            catalogue.add_stop(
                &stop.name,
                crate::geo::Coordinates::new(stop.latitude, stop.longitude),
            )?;
        }
    }
    for request in &input.base_requests {
        if let BaseRequest::Stop(stop) = request {
            for (neighbor, &meters) in &stop.road_distances {
                catalogue.add_distance(&stop.name, neighbor, meters)?;
            }
        }
    }
    for request in &input.base_requests {
        if let BaseRequest::Bus(bus) = request {
            let stops: Vec<&str> = bus.stops.iter().map(String::as_str).collect();
            catalogue.add_route(&bus.name, &stops, bus.kind())?;
        }
    }

    Ok(catalogue)
}

/// Answers a batch of stat requests, one response per request in order.
/// Unknown names and missing paths become "not found" responses and never
/// abort the batch.
pub fn process_stat_requests(router: &TransitRouter, requests: &[StatRequest]) -> Vec<StatResponse> {
    requests
        .iter()
        .map(|request| StatResponse {
            request_id: request.id,
            body: answer(router, &request.kind),
        })
        .collect()
}

fn answer(router: &TransitRouter, kind: &StatKind) -> ResponseBody {
    let catalogue = router.catalogue();
    match kind {
        StatKind::Stop { name } => match catalogue.stop(name) {
            Some(stop) => ResponseBody::Stop {
                buses: catalogue.buses_through_stop(stop).iter().cloned().collect(),
            },
            None => ResponseBody::not_found(),
        },
        StatKind::Bus { name } => match catalogue.route(name) {
            Some(route) => {
                let route = catalogue.get_route(route);
                ResponseBody::Bus {
                    curvature: route.curvature,
                    route_length: route.true_length,
                    stop_count: route.stops_on_route,
                    unique_stop_count: route.unique_stops,
                }
            }
            None => ResponseBody::not_found(),
        },
        StatKind::Route { from, to } => match router.route(from, to) {
            Some(journey) => ResponseBody::Route {
                total_time: journey.total_time,
                items: journey
                    .segments
                    .iter()
                    .map(|segment| match *segment {
                        Segment::Wait { stop, time } => RouteItem::Wait {
                            stop_name: catalogue.get_stop(stop).name.clone(),
                            time,
                        },
                        Segment::Ride { route, span, time } => RouteItem::Bus {
                            bus: catalogue.get_route(route).name.clone(),
                            span_count: span,
                            time,
                        },
                    })
                    .collect(),
            },
            None => ResponseBody::not_found(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_input() -> BaseInput {
        serde_json::from_value(json!({
            "serialization_settings": { "file": "base.bin" },
            "routing_settings": { "bus_wait_time": 1, "bus_velocity": 1 },
            "base_requests": [
                { "type": "Bus", "name": "R", "stops": ["A", "B", "C", "A"],
                  "is_roundtrip": true },
                { "type": "Stop", "name": "A", "latitude": 0.0, "longitude": 0.0,
                  "road_distances": { "B": 100 } },
                { "type": "Stop", "name": "B", "latitude": 0.0, "longitude": 0.0,
                  "road_distances": { "C": 200 } },
                { "type": "Stop", "name": "C", "latitude": 0.0, "longitude": 0.0 },
                { "type": "Stop", "name": "X", "latitude": 0.0, "longitude": 0.0 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn builds_catalogue_with_forward_references() {
        // The bus request precedes its stops in the batch; passes resolve it.
        let catalogue = build_catalogue(&base_input()).unwrap();
        assert_eq!(catalogue.num_stops(), 4);
        assert_eq!(catalogue.num_routes(), 1);
        let route = catalogue.get_route(0);
        assert_eq!(route.kind, RouteKind::Circular);
        assert_eq!(route.true_length, 300.0);
    }

    #[test]
    fn roundtrip_flag_resolves_route_kind() {
        let open_roundtrip: BusRequest = serde_json::from_value(json!({
            "name": "r", "stops": ["A", "B"], "is_roundtrip": true
        }))
        .unwrap();
        assert_eq!(open_roundtrip.kind(), RouteKind::OneWay);

        let closed: BusRequest = serde_json::from_value(json!({
            "name": "r", "stops": ["A", "B", "A"], "is_roundtrip": true
        }))
        .unwrap();
        assert_eq!(closed.kind(), RouteKind::Circular);

        let shuttle: BusRequest = serde_json::from_value(json!({
            "name": "r", "stops": ["A", "B"], "is_roundtrip": false
        }))
        .unwrap();
        assert_eq!(shuttle.kind(), RouteKind::Shuttle);
    }

    #[test]
    fn unknown_request_type_is_malformed() {
        let result: Result<BaseRequest, _> = serde_json::from_value(json!({
            "type": "Tram", "name": "t"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn stat_batch_answers_in_request_order() {
        let router = TransitRouter::new(build_catalogue(&base_input()).unwrap());
        let requests: Vec<StatRequest> = serde_json::from_value(json!([
            { "id": 1, "type": "Stop", "name": "B" },
            { "id": 2, "type": "Stop", "name": "X" },
            { "id": 3, "type": "Stop", "name": "ghost" },
            { "id": 4, "type": "Bus", "name": "R" },
            { "id": 5, "type": "Bus", "name": "ghost" },
            { "id": 6, "type": "Route", "from": "A", "to": "C" },
            { "id": 7, "type": "Route", "from": "A", "to": "X" }
        ]))
        .unwrap();

        let responses = process_stat_requests(&router, &requests);
        let rendered = serde_json::to_value(&responses).unwrap();
        assert_eq!(
            rendered,
            json!([
                { "request_id": 1, "buses": ["R"] },
                { "request_id": 2, "buses": [] },
                { "request_id": 3, "error_message": "not found" },
                { "request_id": 4, "curvature": 0.0, "route_length": 300.0,
                  "stop_count": 4, "unique_stop_count": 3 },
                { "request_id": 5, "error_message": "not found" },
                { "request_id": 6, "total_time": 19.0, "items": [
                    { "type": "Wait", "stop_name": "A", "time": 1.0 },
                    { "type": "Bus", "bus": "R", "span_count": 2, "time": 18.0 }
                ] },
                { "request_id": 7, "error_message": "not found" }
            ])
        );
    }
}
