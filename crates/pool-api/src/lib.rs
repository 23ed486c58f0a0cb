//! Typed facades over the pool backend gRPC services.
//!
//! The wire types are hand-carried prost messages matching the pool API
//! proto definitions; the tick pipeline only ever sees the [`traits`] seam
//! and the domain types, so tests can substitute scripted backends.

pub mod client;
pub mod error;
pub mod proto;
pub mod traits;
pub mod types;

pub use client::PoolApiClient;
pub use error::{ApiError, ApiResult};
pub use traits::{MinersApi, PayoutsApi, PoolApi, StatsApi};
pub use types::{PayoutEntry, PoolInfo, PoolStats, SoloPayoutEntry, WorkerEntry};
