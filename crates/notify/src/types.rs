//! Keys and outcomes shared by both ticks.

/// How a tick ended. Everything short of `Completed` leaves the mirror and
/// watermark untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// A fan-out group failed; the next tick retries from a fresh snapshot.
    Abandoned,
    Cancelled,
    /// First payout tick ever: the watermark was seeded without notifying.
    Bootstrapped,
}

/// Notification target, used as the aggregation key per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserInfo {
    pub user_id: i64,
    pub chat_id: i64,
    pub lang: String,
}

/// Subscribed wallet with its backend descriptor, used as the aggregation
/// key per wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletInfo {
    pub wallet_id: i64,
    pub wallet: String,
    pub coin: String,
    pub coin_name: String,
    pub ticker: String,
    pub atomic_unit: u16,
}
