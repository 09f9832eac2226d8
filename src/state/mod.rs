mod store;

pub use store::{Readiness, SessionState, SharedState, StateSnapshot};
