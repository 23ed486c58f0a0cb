//! Scripted stand-ins for the store, the backend registry and the gateway.

use std::{
    collections::{HashMap, HashSet},
    sync::{atomic::AtomicUsize, Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use poolbot_common::lang::Languages;
use poolbot_pool_api::{
    ApiError, ApiResult, MinersApi, PayoutEntry, PayoutsApi, SoloPayoutEntry, WorkerEntry,
};
use poolbot_registry::BlockchainInfo;
use poolbot_store::{
    DbError, DbResult, NewWorkerRow, NotifySubscriberRow, PayoutSubscriberRow, RemovedWorkerRow,
};

use crate::{
    gateway::{GatewayError, Notifier},
    traits::{BackendDirectory, PayoutLedger, WorkerMirror},
    types::WalletInfo,
};

pub(crate) fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub(crate) fn test_languages() -> Arc<Languages> {
    let mut en = HashMap::new();
    for (key, template) in [
        ("WalletInfo", "Wallet {Wallet} on {PoolBlockchainName}"),
        (
            "WorkerActive",
            "Worker {Worker} is online (region {Region}, solo {Solo}, connected {ConnectedAt})",
        ),
        ("WorkerInactive", "Worker {Worker} went offline"),
        ("NewPayoutReceived", "New payout received"),
        ("PayoutInfo", "{Amount} {Ticker}, tx {TxHash} at {PaidAt}"),
        ("NewBlockFound", "New block found"),
        (
            "SoloPayoutInfo",
            "{Reward} {Ticker}, block {BlockHash}, tx {TxHash} at {PaidAt}",
        ),
        ("Yes", "yes"),
        ("No", "no"),
    ] {
        en.insert(key.to_owned(), template.to_owned());
    }

    let mut bundles = HashMap::new();
    bundles.insert("en".to_owned(), en);
    Arc::new(Languages::from_bundles(bundles).expect("test bundles"))
}

pub(crate) fn test_wallet(wallet_id: i64, wallet: &str, coin: &str) -> WalletInfo {
    WalletInfo {
        wallet_id,
        wallet: wallet.to_owned(),
        coin: coin.to_owned(),
        coin_name: coin.to_uppercase(),
        ticker: coin.to_uppercase(),
        atomic_unit: 100,
    }
}

pub(crate) fn worker_entry(name: &str) -> WorkerEntry {
    WorkerEntry {
        worker: name.to_owned(),
        region: "eu".to_owned(),
        solo: false,
        hashrate: Vec::new(),
        connected_at: test_time(),
    }
}

pub(crate) fn payout_entry(amount: u64, tx_hash: &str, paid_at: DateTime<Utc>) -> PayoutEntry {
    PayoutEntry {
        amount,
        tx_hash: tx_hash.to_owned(),
        paid_at,
    }
}

pub(crate) fn solo_payout_entry(
    reward: u64,
    block_hash: &str,
    tx_hash: &str,
    paid_at: DateTime<Utc>,
) -> SoloPayoutEntry {
    SoloPayoutEntry {
        reward,
        block_hash: block_hash.to_owned(),
        tx_hash: tx_hash.to_owned(),
        paid_at,
    }
}

pub(crate) fn subscriber_row(
    user_id: i64,
    chat_id: i64,
    coin: &str,
    wallet_id: i64,
    wallet: &str,
    worker: Option<&str>,
) -> NotifySubscriberRow {
    NotifySubscriberRow {
        user_id,
        chat_id,
        lang: "en".to_owned(),
        coin: coin.to_owned(),
        wallet_id,
        wallet: wallet.to_owned(),
        worker: worker.map(str::to_owned),
        region: worker.map(|_| "eu".to_owned()),
        solo: worker.map(|_| false),
        connected_at: worker.map(|_| test_time()),
    }
}

pub(crate) fn payout_row(
    user_id: i64,
    chat_id: i64,
    coin: &str,
    wallet_id: i64,
    wallet: &str,
    payouts_notify: bool,
    blocks_notify: bool,
) -> PayoutSubscriberRow {
    PayoutSubscriberRow {
        user_id,
        chat_id,
        lang: "en".to_owned(),
        payouts_notify,
        blocks_notify,
        coin: coin.to_owned(),
        wallet_id,
        wallet: wallet.to_owned(),
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail_chat: Option<i64>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), GatewayError> {
        if self.fail_chat == Some(chat_id) {
            return Err(GatewayError::Api("chat blocked".to_owned()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct StubMiners {
    pub workers: HashMap<String, Vec<WorkerEntry>>,
    /// Requests containing any of these addresses fail wholesale.
    pub fail_addresses: HashSet<String>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl MinersApi for StubMiners {
    async fn get_workers(
        &self,
        addresses: Vec<String>,
    ) -> ApiResult<HashMap<String, Vec<WorkerEntry>>> {
        self.calls.lock().unwrap().push(addresses.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if addresses.iter().any(|a| self.fail_addresses.contains(a)) {
            return Err(ApiError::Status(tonic::Status::unavailable(
                "stub backend down",
            )));
        }
        Ok(addresses
            .iter()
            .filter_map(|a| self.workers.get(a).map(|w| (a.clone(), w.clone())))
            .collect())
    }

    async fn get_balances(&self, _addresses: Vec<String>) -> ApiResult<HashMap<String, u64>> {
        Ok(HashMap::new())
    }
}

#[derive(Default)]
pub(crate) struct StubPayouts {
    pub payouts: HashMap<String, Vec<PayoutEntry>>,
    pub solo: HashMap<String, Vec<SoloPayoutEntry>>,
    pub fail_addresses: HashSet<String>,
    pub payout_calls: Mutex<Vec<Vec<String>>>,
    pub solo_calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl PayoutsApi for StubPayouts {
    async fn get_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<PayoutEntry>>> {
        self.payout_calls.lock().unwrap().push(addresses.clone());
        if addresses.iter().any(|a| self.fail_addresses.contains(a)) {
            return Err(ApiError::Status(tonic::Status::unavailable(
                "stub backend down",
            )));
        }
        Ok(addresses
            .iter()
            .filter_map(|a| {
                self.payouts.get(a).map(|entries| {
                    (
                        a.clone(),
                        entries
                            .iter()
                            .filter(|p| p.paid_at > paid_from)
                            .cloned()
                            .collect::<Vec<_>>(),
                    )
                })
            })
            .collect())
    }

    async fn get_solo_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<SoloPayoutEntry>>> {
        self.solo_calls.lock().unwrap().push(addresses.clone());
        if addresses.iter().any(|a| self.fail_addresses.contains(a)) {
            return Err(ApiError::Status(tonic::Status::unavailable(
                "stub backend down",
            )));
        }
        Ok(addresses
            .iter()
            .filter_map(|a| {
                self.solo.get(a).map(|entries| {
                    (
                        a.clone(),
                        entries
                            .iter()
                            .filter(|p| p.paid_at > paid_from)
                            .cloned()
                            .collect::<Vec<_>>(),
                    )
                })
            })
            .collect())
    }
}

pub(crate) struct StubBackend {
    pub info: BlockchainInfo,
    pub miners: Arc<StubMiners>,
    pub payouts: Arc<StubPayouts>,
}

#[derive(Default)]
pub(crate) struct StubDirectory {
    pub backends: HashMap<String, StubBackend>,
}

impl StubDirectory {
    pub fn with_backend(
        mut self,
        coin: &str,
        miners: Arc<StubMiners>,
        payouts: Arc<StubPayouts>,
    ) -> Self {
        self.backends.insert(
            coin.to_owned(),
            StubBackend {
                info: BlockchainInfo {
                    coin: coin.to_owned(),
                    name: coin.to_uppercase(),
                    ticker: coin.to_uppercase(),
                    atomic_unit: 100,
                    example_wallet: format!("{coin}-example"),
                },
                miners,
                payouts,
            },
        );
        self
    }
}

impl BackendDirectory for StubDirectory {
    fn blockchain(&self, coin: &str) -> Option<BlockchainInfo> {
        self.backends.get(coin).map(|b| b.info.clone())
    }

    fn miners_api(&self, coin: &str) -> Option<Arc<dyn MinersApi>> {
        self.backends
            .get(coin)
            .map(|b| b.miners.clone() as Arc<dyn MinersApi>)
    }

    fn payouts_api(&self, coin: &str) -> Option<Arc<dyn PayoutsApi>> {
        self.backends
            .get(coin)
            .map(|b| b.payouts.clone() as Arc<dyn PayoutsApi>)
    }
}

#[derive(Default)]
pub(crate) struct MemoryMirror {
    pub rows: Vec<NotifySubscriberRow>,
    pub payout_rows: Vec<PayoutSubscriberRow>,
    pub fail_commit: bool,
    pub commits: Mutex<Vec<(Vec<NewWorkerRow>, Vec<RemovedWorkerRow>, usize)>>,
    pub watermark: Mutex<Option<DateTime<Utc>>>,
    pub recorded: AtomicUsize,
}

#[async_trait]
impl WorkerMirror for MemoryMirror {
    async fn list_notify_subscribers(&self) -> DbResult<Vec<NotifySubscriberRow>> {
        Ok(self.rows.clone())
    }

    async fn commit_worker_changes(
        &self,
        added: Vec<NewWorkerRow>,
        removed: Vec<RemovedWorkerRow>,
        group_limit: usize,
    ) -> DbResult<()> {
        if self.fail_commit {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        self.commits.lock().unwrap().push((added, removed, group_limit));
        Ok(())
    }
}

#[async_trait]
impl PayoutLedger for MemoryMirror {
    async fn list_payout_subscribers(&self) -> DbResult<Vec<PayoutSubscriberRow>> {
        Ok(self.payout_rows.clone())
    }

    async fn last_payout_executed_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        Ok(*self.watermark.lock().unwrap())
    }

    async fn record_payout_executed_at(&self) -> DbResult<()> {
        *self.watermark.lock().unwrap() = Some(Utc::now());
        self.recorded
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
