//! Scripted source, plays back a recorded event sequence.
//!
//! Reference implementation of the watch contract and the workhorse of the
//! integration tests: both traits are implemented on the same struct, so one
//! script can exercise the merged channel exactly the way two live feeds
//! would.
//!

use std::sync::mpsc::Sender;

use eyre::Result;
use tracing::trace;

use super::{CancelToken, FeedWatchable, LocationWatchable, TrackerEvent};

/// Plays a fixed list of events into the channel, in order.
///
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    /// Name for logs
    pub name: String,
    /// Events to emit, in order
    pub script: Vec<TrackerEvent>,
}

impl ReplaySource {
    pub fn new(name: &str, script: Vec<TrackerEvent>) -> Self {
        ReplaySource {
            name: name.to_owned(),
            script,
        }
    }

    fn play(&self, out: Sender<TrackerEvent>, cancel: CancelToken) -> Result<()> {
        for event in &self.script {
            if cancel.is_cancelled() {
                trace!("replay {}: cancelled", self.name);
                break;
            }
            out.send(event.clone())?;
        }
        Ok(())
    }
}

impl LocationWatchable for ReplaySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch(&self, out: Sender<TrackerEvent>, cancel: CancelToken) -> Result<()> {
        trace!("replay {}: location watch", self.name);
        self.play(out, cancel)
    }
}

impl FeedWatchable for ReplaySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch(&self, out: Sender<TrackerEvent>, cancel: CancelToken) -> Result<()> {
        trace!("replay {}: feed watch", self.name);
        self.play(out, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buswatch_common::Coordinate;
    use std::sync::mpsc::channel;

    #[test]
    fn test_replay_emits_in_order() -> Result<()> {
        let script = vec![
            TrackerEvent::UserPosition(Coordinate::new(1., 1.)),
            TrackerEvent::LocationError("no signal".into()),
            TrackerEvent::UserPosition(Coordinate::new(2., 2.)),
        ];
        let src = ReplaySource::new("test", script.clone());

        let (tx, rx) = channel();
        LocationWatchable::watch(&src, tx, CancelToken::new())?;

        let got: Vec<_> = rx.iter().collect();
        assert_eq!(script, got);
        Ok(())
    }

    #[test]
    fn test_replay_stops_on_cancel() -> Result<()> {
        let script = vec![
            TrackerEvent::UserPosition(Coordinate::new(1., 1.)),
            TrackerEvent::UserPosition(Coordinate::new(2., 2.)),
        ];
        let src = ReplaySource::new("test", script);

        let cancel = CancelToken::new();
        cancel.cancel();

        let (tx, rx) = channel();
        FeedWatchable::watch(&src, tx, cancel)?;
        assert!(rx.iter().next().is_none());
        Ok(())
    }
}
