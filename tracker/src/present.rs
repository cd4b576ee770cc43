//! The presenter seam.
//!
//! The tracking core never draws anything itself; it talks to whatever
//! renders the map through the [`Present`] trait.  The presenter keeps its
//! own id-to-visual-handle mapping; the contract here is only about what it
//! is told and when.
//!

use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{info, trace};

use buswatch_common::Coordinate;

use crate::session::VehicleEta;

/// Contract between the tracking core and a rendering layer.
///
/// Calls arrive in this order within one reconciliation pass: marker moves
/// (`user_moved` / `vehicle_moved`), then one `link` per known vehicle, then
/// one `metrics` with the full derived list.  A `link` for an id replaces any
/// earlier line for that id; there is never more than one line per vehicle.
///
pub trait Present {
    /// The user marker moved (or appeared).
    fn user_moved(&mut self, pos: &Coordinate);
    /// A vehicle marker moved (or appeared).
    fn vehicle_moved(&mut self, id: &str, pos: &Coordinate);
    /// Replace the connecting line for `id` with one from `from` to `to`.
    fn link(&mut self, id: &str, from: &Coordinate, to: &Coordinate);
    /// Full derived list for this pass, in registry order.
    fn metrics(&mut self, list: &[VehicleEta]);
    /// One-time user-visible notice (e.g. location unavailable).
    fn notice(&mut self, msg: &str);
}

/// Discards everything.  Headless sessions and tests.
///
#[derive(Debug, Default)]
pub struct NullPresent;

impl Present for NullPresent {
    fn user_moved(&mut self, _pos: &Coordinate) {}
    fn vehicle_moved(&mut self, _id: &str, _pos: &Coordinate) {}
    fn link(&mut self, _id: &str, _from: &Coordinate, _to: &Coordinate) {}
    fn metrics(&mut self, _list: &[VehicleEta]) {}
    fn notice(&mut self, _msg: &str) {}
}

/// Renders the derived list as a text table, markers and lines as log events.
///
#[derive(Debug, Default)]
pub struct TablePresent {
    last: Option<String>,
}

impl TablePresent {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table rendered by the latest `metrics` call, if any.
    ///
    pub fn last_table(&self) -> Option<&str> {
        self.last.as_deref()
    }

    fn render(list: &[VehicleEta]) -> String {
        let header = vec!["Vehicle", "Distance (km)", "ETA (min)"];

        let mut builder = Builder::default();
        builder.push_record(header);

        list.iter().for_each(|m| {
            let row = vec![
                m.id.clone(),
                format!("{:.2}", m.distance_km),
                format!("{:.1}", m.eta_min),
            ];
            builder.push_record(row);
        });

        builder.build().with(Style::modern()).to_string()
    }
}

impl Present for TablePresent {
    fn user_moved(&mut self, pos: &Coordinate) {
        trace!("user at {:.4}, {:.4}", pos.lat, pos.lon);
    }

    fn vehicle_moved(&mut self, id: &str, pos: &Coordinate) {
        trace!("vehicle {id} at {:.4}, {:.4}", pos.lat, pos.lon);
    }

    fn link(&mut self, id: &str, from: &Coordinate, to: &Coordinate) {
        trace!(
            "line {id}: {:.4},{:.4} -> {:.4},{:.4}",
            from.lat,
            from.lon,
            to.lat,
            to.lon
        );
    }

    fn metrics(&mut self, list: &[VehicleEta]) {
        let table = Self::render(list);
        info!("\n{table}");
        self.last = Some(table);
    }

    fn notice(&mut self, msg: &str) {
        info!("notice: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_formatting() {
        let list = vec![
            VehicleEta {
                id: "bus-1".into(),
                distance_km: 111.194,
                eta_min: 222.388,
            },
            VehicleEta {
                id: "bus-2".into(),
                distance_km: 0.,
                eta_min: 0.,
            },
        ];

        let mut p = TablePresent::new();
        p.metrics(&list);

        let table = p.last_table().unwrap();
        assert!(table.contains("bus-1"));
        assert!(table.contains("111.19"));
        assert!(table.contains("222.4"));
        assert!(table.contains("0.00"));
        assert!(table.contains("0.0"));
    }
}
