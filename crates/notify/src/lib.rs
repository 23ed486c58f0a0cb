//! The periodic notification pipeline: the worker-change detector and the
//! payout detector, their scheduler and the outbound gateway.

pub mod batch;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod payouts;
pub mod service;
pub mod traits;
pub mod types;
pub mod workers;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{NotifyError, NotifyResult};
pub use gateway::{GatewayError, Notifier, TelegramGateway};
pub use payouts::PayoutsCheck;
pub use service::NotifyService;
pub use types::{TickOutcome, UserInfo, WalletInfo};
pub use workers::WorkersCheck;
