use thiserror::Error;

/// Custom error type for the tracker, allow us to differentiate between errors.
///
/// An empty feed snapshot and a missing user position are deliberately not in
/// here: both are specified no-ops, handled as silent guards in the session.
/// A transient location failure travels the event channel as
/// [`TrackerEvent::LocationError`](crate::TrackerEvent) and ends up as a
/// presenter notice, never as a hard error.
///
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Assumed speed must be positive, got {0} km/h")]
    BadSpeed(f64),
}
