//! The tracking session, where the two update streams meet.
//!
//! One session owns the user position and the vehicle registry for one map
//! view.  Every user-position tick forces a full recompute; every non-empty
//! feed snapshot updates the registry and recomputes if a user position
//! exists yet.  Derived metrics are never cached across passes: the list a
//! pass returns is a pure function of (user position, registry contents,
//! configured speed) at that moment.
//!

use serde::Serialize;
use tracing::{debug, trace};

use buswatch_common::{eta_minutes, Coordinate, TrackerConfig};

use crate::present::Present;
use crate::registry::Registry;
use crate::TrackerError;

/// One derived record per known vehicle, recomputed whole on every pass.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleEta {
    /// Feed-assigned vehicle id
    pub id: String,
    /// Great-circle distance from the user, km
    pub distance_km: f64,
    /// Linear ETA estimate, minutes
    pub eta_min: f64,
}

/// Owned state for one map view: user position + vehicle registry + presenter.
///
#[derive(Debug)]
pub struct TrackingSession<P: Present> {
    user: Option<Coordinate>,
    registry: Registry,
    speed_km_h: f64,
    presenter: P,
}

impl<P: Present> TrackingSession<P> {
    /// Build a session from a validated configuration.
    ///
    /// Fails fast on a non-positive assumed speed so the ETA math can never
    /// divide by zero later on.
    ///
    pub fn new(cfg: &TrackerConfig, presenter: P) -> Result<Self, TrackerError> {
        if cfg.speed_km_h <= 0. {
            return Err(TrackerError::BadSpeed(cfg.speed_km_h));
        }
        Ok(TrackingSession {
            user: None,
            registry: Registry::new(),
            speed_km_h: cfg.speed_km_h,
            presenter,
        })
    }

    /// Last known user position, if any tick arrived yet.
    ///
    pub fn user_position(&self) -> Option<Coordinate> {
        self.user
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// A user-position tick.  Replaces the position wholesale and recomputes
    /// unconditionally, freshness over efficiency.
    ///
    #[tracing::instrument(skip(self))]
    pub fn on_user_position(&mut self, pos: Coordinate) -> Vec<VehicleEta> {
        trace!("session::on_user_position");

        self.user = Some(pos);
        self.presenter.user_moved(&pos);
        self.recompute()
    }

    /// A full feed snapshot.  Empty input is a no-op.  Otherwise the registry
    /// is updated (and markers moved) even without a user position; metrics
    /// and lines need one, so the derived list stays empty until the first
    /// tick arrives.
    ///
    #[tracing::instrument(skip(self, entries))]
    pub fn on_vehicle_snapshot(&mut self, entries: &[(String, Coordinate)]) -> Vec<VehicleEta> {
        trace!("session::on_vehicle_snapshot");

        if entries.is_empty() {
            debug!("empty snapshot, ignored");
            return vec![];
        }

        let touched = self
            .registry
            .apply_snapshot(entries.iter().map(|(id, pos)| (id.as_str(), *pos)));

        for id in &touched {
            // Just upserted, the lookup can not miss
            //
            if let Some(rec) = self.registry.get(id) {
                self.presenter.vehicle_moved(id, &rec.position);
            }
        }

        match self.user {
            Some(_) => self.recompute(),
            None => {
                debug!("no user position yet, {} vehicles parked", touched.len());
                vec![]
            }
        }
    }

    /// A transient failure on the location stream.  Reported once, never
    /// fatal; tracking resumes on the next tick.
    ///
    #[tracing::instrument(skip(self))]
    pub fn on_location_error(&mut self, msg: &str) {
        debug!("location error: {msg}");
        self.presenter.notice(msg);
    }

    /// One full reconciliation pass over the registry.
    ///
    /// For every vehicle, in registry order: distance, ETA, and a replacement
    /// connecting line.  The presenter then gets the whole derived list.
    ///
    fn recompute(&mut self) -> Vec<VehicleEta> {
        let user = match self.user {
            Some(pos) => pos,
            None => return vec![],
        };

        let mut list = Vec::with_capacity(self.registry.len());
        for (id, rec) in self.registry.iter() {
            let distance_km = user.haversine_distance(&rec.position);
            let eta_min = eta_minutes(distance_km, self.speed_km_h);

            self.presenter.link(id, &user, &rec.position);
            list.push(VehicleEta {
                id: id.clone(),
                distance_km,
                eta_min,
            });
        }

        self.presenter.metrics(&list);
        trace!("recomputed {} metrics", list.len());
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::NullPresent;

    fn session() -> TrackingSession<NullPresent> {
        TrackingSession::new(&TrackerConfig::default(), NullPresent).unwrap()
    }

    fn snap(entries: &[(&str, f64, f64)]) -> Vec<(String, Coordinate)> {
        entries
            .iter()
            .map(|(id, lat, lon)| (id.to_string(), Coordinate::new(*lat, *lon)))
            .collect()
    }

    #[rstest::rstest]
    #[case(0.)]
    #[case(-10.)]
    fn test_bad_speed_rejected(#[case] speed: f64) {
        let cfg = TrackerConfig {
            speed_km_h: speed,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            TrackingSession::new(&cfg, NullPresent),
            Err(TrackerError::BadSpeed(_))
        ));
    }

    #[test]
    fn test_same_point_zero_metrics() {
        let mut s = session();
        s.on_vehicle_snapshot(&snap(&[("bus-1", 19.8762, 75.3433)]));
        let list = s.on_user_position(Coordinate::new(19.8762, 75.3433));

        assert_eq!(1, list.len());
        assert!(list[0].distance_km.abs() < 1e-9);
        assert!(list[0].eta_min.abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_longitude() {
        let mut s = session();
        s.on_user_position(Coordinate::new(0., 0.));
        let list = s.on_vehicle_snapshot(&snap(&[("bus-1", 0., 1.)]));

        assert_eq!(1, list.len());
        assert!((list[0].distance_km - 111.19).abs() < 0.5);
        assert!((list[0].eta_min - 222.4).abs() < 1.0);
    }

    #[test]
    fn test_snapshot_without_user_yields_nothing() {
        let mut s = session();
        let list = s.on_vehicle_snapshot(&snap(&[("A", 1., 1.), ("B", 2., 2.)]));

        assert!(list.is_empty());
        assert_eq!(2, s.registry().len());
    }

    #[test]
    fn test_empty_snapshot_noop() {
        let mut s = session();
        s.on_user_position(Coordinate::new(0., 0.));
        s.on_vehicle_snapshot(&snap(&[("A", 1., 1.)]));

        let list = s.on_vehicle_snapshot(&[]);
        assert!(list.is_empty());
        assert_eq!(1, s.registry().len());
    }

    #[test]
    fn test_two_user_ticks_same_registry() {
        let mut s = session();
        s.on_vehicle_snapshot(&snap(&[("A", 10., 10.)]));

        let first = s.on_user_position(Coordinate::new(0., 0.));
        let second = s.on_user_position(Coordinate::new(5., 5.));

        assert_eq!(1, first.len());
        assert_eq!(1, second.len());
        assert!(second[0].distance_km < first[0].distance_km);
        // Vehicle itself did not move
        //
        assert_eq!(
            Coordinate::new(10., 10.),
            s.registry().get("A").unwrap().position
        );
    }

    #[test]
    fn test_metrics_in_registry_order() {
        let mut s = session();
        s.on_user_position(Coordinate::new(0., 0.));
        let list = s.on_vehicle_snapshot(&snap(&[("C", 0., 3.), ("A", 0., 1.), ("B", 0., 2.)]));

        let ids: Vec<_> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(vec!["A", "B", "C"], ids);
    }

    #[test]
    fn test_repeat_snapshot_identical_metrics() {
        let mut s = session();
        s.on_user_position(Coordinate::new(0., 0.));

        let snap1 = snap(&[("A", 0., 1.), ("B", 1., 0.)]);
        let first = s.on_vehicle_snapshot(&snap1);
        let second = s.on_vehicle_snapshot(&snap1);
        assert_eq!(first, second);
    }
}
