use std::fmt::Display;

use crate::catalogue::{Catalogue, RouteIndex, StopIndex};
use crate::graph::TransitTime;

/// One step of an answered route query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Wait at a stop for the next vehicle.
    Wait { stop: StopIndex, time: TransitTime },
    /// Ride one route over `span` consecutive hops.
    Ride {
        route: RouteIndex,
        span: u32,
        time: TransitTime,
    },
}

/// The fastest wait/ride sequence between two stops. Carries the catalogue
/// it was answered from so names resolve in `Display`.
pub struct Journey<'a> {
    pub segments: Vec<Segment>,
    pub total_time: TransitTime,
    pub catalogue: &'a Catalogue,
}

impl Display for Journey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-----------------------------------------------")?;
        for segment in &self.segments {
            match *segment {
                Segment::Wait { stop, time } => {
                    writeln!(
                        f,
                        "Wait at {} for {:.2} min.",
                        self.catalogue.get_stop(stop).name,
                        time
                    )?;
                }
                Segment::Ride { route, span, time } => {
                    writeln!(
                        f,
                        "Ride {} for {} stops ({:.2} min).",
                        self.catalogue.get_route(route).name,
                        span,
                        time
                    )?;
                }
            }
        }
        writeln!(f, "Total journey time: {:.2} min.", self.total_time)?;
        write!(f, "-----------------------------------------------")
    }
}
