//! Delivery of records to the central collector.
//!
//! - `client`: the bounded, linearly backing-off attempt loop
//! - `transport`: the HTTP and sleep seams the loop runs on
//! - `types`: per-attempt errors and the overall delivery outcome

pub mod client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::{RetryPolicy, SyncClient};
pub use transport::{HttpTransport, Sleeper, TokioSleeper, Transport};
pub use types::SyncResult;
