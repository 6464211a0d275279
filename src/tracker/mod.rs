pub mod controller;
pub mod state;

pub use controller::{ActivityTracker, ErrorSink};
pub use state::{ClosedSpan, SessionState};
