//! The vehicle registry.
//!
//! Holds the authoritative last known position of every vehicle ever seen in
//! the feed, keyed by the feed's own vehicle id.  The registry only grows or
//! updates in place: an id missing from a later snapshot keeps its last known
//! position.  A `BTreeMap` keeps iteration (and therefore every recompute
//! pass) deterministic for a given content.
//!

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use buswatch_common::Coordinate;

/// Last known state of one vehicle.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleRecord {
    /// Last position reported by the feed
    pub position: Coordinate,
    /// Monotonic version, 1 on first sight, +1 for every snapshot containing the id
    pub last_seen: u64,
    /// Wall-clock time of the last touch
    pub seen_at: DateTime<Utc>,
}

/// Id-keyed arena of vehicle records, owned by the tracking session.
///
#[derive(Clone, Debug, Default)]
pub struct Registry {
    vehicles: BTreeMap<String, VehicleRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every entry of a feed snapshot.
    ///
    /// Unknown ids are inserted with version 1, known ids get their position
    /// replaced and their version bumped.  Ids absent from `entries` are left
    /// untouched.  Returns the touched ids in input order.
    ///
    #[tracing::instrument(skip(self, entries))]
    pub fn apply_snapshot<'a, I>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, Coordinate)>,
    {
        let now = Utc::now();
        let mut touched = vec![];

        for (id, position) in entries {
            self.vehicles
                .entry(id.to_owned())
                .and_modify(|rec| {
                    rec.position = position;
                    rec.last_seen += 1;
                    rec.seen_at = now;
                })
                .or_insert(VehicleRecord {
                    position,
                    last_seen: 1,
                    seen_at: now,
                });
            touched.push(id.to_owned());
        }
        trace!("registry: {} touched, {} total", touched.len(), self.vehicles.len());
        touched
    }

    /// Pure lookup, no side effects.
    ///
    pub fn get(&self, id: &str) -> Option<&VehicleRecord> {
        self.vehicles.get(id)
    }

    /// Snapshot of the current ids, in key order.
    ///
    pub fn ids(&self) -> Vec<String> {
        self.vehicles.keys().cloned().collect()
    }

    /// Iterate over (id, record) in key order.
    ///
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VehicleRecord)> {
        self.vehicles.iter()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
