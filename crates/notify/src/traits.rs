//! Seams the ticks depend on, implemented by the production store and
//! registry and by scripted stand-ins in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poolbot_pool_api::{MinersApi, PayoutsApi, PoolApiClient};
use poolbot_registry::{BlockchainInfo, Registry};
use poolbot_store::{
    DbResult, NewWorkerRow, NotifySubscriberRow, PayoutSubscriberRow, RemovedWorkerRow, Store,
};

/// Worker-tick view of the mirror store.
#[async_trait]
pub trait WorkerMirror: Send + Sync + 'static {
    async fn list_notify_subscribers(&self) -> DbResult<Vec<NotifySubscriberRow>>;

    async fn commit_worker_changes(
        &self,
        added: Vec<NewWorkerRow>,
        removed: Vec<RemovedWorkerRow>,
        group_limit: usize,
    ) -> DbResult<()>;
}

/// Payout-tick view of the mirror store.
#[async_trait]
pub trait PayoutLedger: Send + Sync + 'static {
    async fn list_payout_subscribers(&self) -> DbResult<Vec<PayoutSubscriberRow>>;

    async fn last_payout_executed_at(&self) -> DbResult<Option<DateTime<Utc>>>;

    async fn record_payout_executed_at(&self) -> DbResult<()>;
}

/// Read-only view of the backend registry. Coins absent here are skipped by
/// the ticks, never errored.
pub trait BackendDirectory: Send + Sync + 'static {
    fn blockchain(&self, coin: &str) -> Option<BlockchainInfo>;

    fn miners_api(&self, coin: &str) -> Option<Arc<dyn MinersApi>>;

    fn payouts_api(&self, coin: &str) -> Option<Arc<dyn PayoutsApi>>;
}

#[async_trait]
impl WorkerMirror for Store {
    async fn list_notify_subscribers(&self) -> DbResult<Vec<NotifySubscriberRow>> {
        Store::list_notify_subscribers(self).await
    }

    async fn commit_worker_changes(
        &self,
        added: Vec<NewWorkerRow>,
        removed: Vec<RemovedWorkerRow>,
        group_limit: usize,
    ) -> DbResult<()> {
        Store::commit_worker_changes(self, added, removed, group_limit).await
    }
}

#[async_trait]
impl PayoutLedger for Store {
    async fn list_payout_subscribers(&self) -> DbResult<Vec<PayoutSubscriberRow>> {
        Store::list_payout_subscribers(self).await
    }

    async fn last_payout_executed_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        Store::last_payout_executed_at(self).await
    }

    async fn record_payout_executed_at(&self) -> DbResult<()> {
        Store::record_payout_executed_at(self).await
    }
}

impl BackendDirectory for Registry {
    fn blockchain(&self, coin: &str) -> Option<BlockchainInfo> {
        self.info(coin).ok().cloned()
    }

    fn miners_api(&self, coin: &str) -> Option<Arc<dyn MinersApi>> {
        self.channel(coin)
            .ok()
            .map(|channel| Arc::new(PoolApiClient::new(channel)) as Arc<dyn MinersApi>)
    }

    fn payouts_api(&self, coin: &str) -> Option<Arc<dyn PayoutsApi>> {
        self.channel(coin)
            .ok()
            .map(|channel| Arc::new(PoolApiClient::new(channel)) as Arc<dyn PayoutsApi>)
    }
}
