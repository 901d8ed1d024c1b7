//! Simulated sensor producer and its lifecycle.
//!
//! - [`source`]     : where readings come from (uniform random by default)
//! - [`simulator`]  : the cancellable periodic task pushing into the state
//! - [`controller`] : start/pause/toggle/stop with at most one producer alive
//! - [`feed`]       : [`SensorFeed`], the context object tying it together

pub mod controller;
pub mod feed;
pub mod simulator;
pub mod source;

pub use controller::RunController;
pub use feed::SensorFeed;
pub use simulator::{SharedSource, SimulatorHandle};
pub use source::{RandomSource, ReadingSource};
