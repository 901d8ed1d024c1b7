pub mod aggregate;
pub mod error;
pub mod observable;
pub mod observer;
pub mod state;
pub mod window;

pub use aggregate::Aggregates;
pub use error::{FeedError, Result};
pub use observable::{ObservableState, SubscriptionId};
pub use observer::FeedObserver;
pub use state::{FeedSnapshot, Reading, RunState};
pub use window::BoundedWindow;
