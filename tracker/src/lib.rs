//! Buswatch tracking core.
//!
//! Reconciles two live streams, a user-location feed and a vehicle-position
//! feed, into one consistent derived view: per-vehicle distance, ETA and a
//! connecting-line request, recomputed whole on every update.  Rendering and
//! transport stay outside; this crate owns the state and the math.
//!
//! The moving parts:
//!
//! - [`Registry`]: last known position per vehicle id, upsert-only.
//! - [`TrackingSession`]: user position + registry + presenter for one map view.
//! - [`Present`]: the seam towards whatever draws markers, lines and lists.
//! - [`sources`]: subscription traits, cancellation and the event loop.
//!

pub use error::*;
pub use present::*;
pub use registry::*;
pub use session::*;
pub use sources::*;

mod error;
mod present;
mod registry;
mod session;
pub mod sources;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
