use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Catalog row describing one pool backend.
#[derive(Debug, Clone, FromRow)]
pub struct Blockchain {
    pub coin: String,
    pub name: String,
    pub ticker: String,
    #[sqlx(try_from = "i32")]
    pub atomic_unit: u16,
    pub example_wallet: String,
    pub pool_api_url: String,
    pub pool_api_tls_ca: String,
    pub pool_api_server_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub lang: String,
    pub payouts_notify: bool,
    pub blocks_notify: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserWallet {
    pub id: i64,
    pub user_id: i64,
    pub blockchain_coin: String,
    pub wallet: String,
    pub added_at: DateTime<Utc>,
}

/// One row of the worker-tick snapshot: a subscribed wallet joined to its
/// mirrored workers. Worker columns are null for wallets with an empty
/// mirror, so fresh wallets still get polled.
#[derive(Debug, Clone, FromRow)]
pub struct NotifySubscriberRow {
    pub user_id: i64,
    pub chat_id: i64,
    pub lang: String,
    pub coin: String,
    pub wallet_id: i64,
    pub wallet: String,
    pub worker: Option<String>,
    pub region: Option<String>,
    pub solo: Option<bool>,
    pub connected_at: Option<DateTime<Utc>>,
}

/// One row of the payout-tick snapshot.
#[derive(Debug, Clone, FromRow)]
pub struct PayoutSubscriberRow {
    pub user_id: i64,
    pub chat_id: i64,
    pub lang: String,
    pub payouts_notify: bool,
    pub blocks_notify: bool,
    pub coin: String,
    pub wallet_id: i64,
    pub wallet: String,
}

/// Mirror insert produced by the worker-tick diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkerRow {
    pub wallet_id: i64,
    pub worker: String,
    pub region: String,
    pub solo: bool,
    pub connected_at: DateTime<Utc>,
}

/// Mirror delete produced by the worker-tick diff, staged before the final
/// set-difference delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedWorkerRow {
    pub wallet_id: i64,
    pub worker: String,
}
