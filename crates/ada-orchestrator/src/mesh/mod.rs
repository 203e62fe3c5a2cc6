//! Simulated node-to-node exchanges.
//!
//! [`RequestTracker`] is the outstanding-request ledger: every request
//! resolves exactly once, by completion or by timeout. [`MeshLink`] simulates
//! an unreliable delivery with bounded retries and linear backoff.

mod link;
mod tracker;

pub use link::{Delivery, MeshLink};
pub use tracker::{Completion, PendingRequest, RequestTracker, TimeoutEvent, TimeoutHandler};
