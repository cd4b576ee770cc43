//! Module to deal with the two live feeds a session consumes.
//!
//! Both the user-location stream and the vehicle feed are long-lived
//! subscriptions: a watcher pushes [`TrackerEvent`]s into a channel until its
//! upstream ends or its [`CancelToken`] fires.  The session end drains the
//! merged channel single-threaded, one event run to completion at a time.
//!

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tracing::{debug, trace};

use buswatch_common::Coordinate;

use crate::present::Present;
use crate::session::TrackingSession;

pub use replay::*;

mod replay;

/// Everything that can arrive on the merged event channel.
///
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    /// A fresh user position tick
    UserPosition(Coordinate),
    /// A transient failure reading the location, not fatal
    LocationError(String),
    /// A complete vehicle feed snapshot, id to position
    VehicleSnapshot(Vec<(String, Coordinate)>),
}

/// Cloneable cancellation flag shared between a subscriber and its watchers.
///
/// Explicit unsubscription: flip it with `cancel()`, watchers and the run
/// loop check it between events.
///
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A source of user-position ticks.
///
/// `watch` runs until the upstream ends or `cancel` fires, pushing
/// `UserPosition` events into `out`.  Transient read failures go down the same
/// channel as `LocationError` and never terminate the watch.
///
pub trait LocationWatchable: Debug {
    /// Return the source's name
    fn name(&self) -> String;
    /// Push position ticks until cancelled or exhausted
    fn watch(&self, out: Sender<TrackerEvent>, cancel: CancelToken) -> Result<()>;
}

/// A source of full vehicle-feed snapshots, same contract as
/// [`LocationWatchable`] but pushing `VehicleSnapshot` events.
///
pub trait FeedWatchable: Debug {
    /// Return the source's name
    fn name(&self) -> String;
    /// Push snapshots until cancelled or exhausted
    fn watch(&self, out: Sender<TrackerEvent>, cancel: CancelToken) -> Result<()>;
}

/// How long the loop waits on the channel before re-checking its token
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drain the merged channel into the session, one event at a time.
///
/// Returns when every sender is gone or the token is cancelled.  The wait on
/// the channel is bounded by `POLL_INTERVAL`, so cancellation is observed
/// within one interval even when no event arrives and senders stay alive.
/// Handlers run to completion before the next event is looked at; there is no
/// parallelism on this side of the channel.
///
#[tracing::instrument(skip(session, rx))]
pub fn run_loop<P: Present>(
    session: &mut TrackingSession<P>,
    rx: Receiver<TrackerEvent>,
    cancel: CancelToken,
) -> usize {
    trace!("run_loop: start");

    let mut handled = 0;
    loop {
        if cancel.is_cancelled() {
            debug!("run_loop: cancelled after {handled} events");
            break;
        }
        let event = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        match event {
            TrackerEvent::UserPosition(pos) => {
                session.on_user_position(pos);
            }
            TrackerEvent::LocationError(msg) => {
                session.on_location_error(&msg);
            }
            TrackerEvent::VehicleSnapshot(entries) => {
                session.on_vehicle_snapshot(&entries);
            }
        }
        handled += 1;
    }

    trace!("run_loop: done, {handled} events");
    handled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
