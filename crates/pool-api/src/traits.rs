//! Service seams the tick pipeline depends on. The production impl is
//! [`PoolApiClient`]; tests provide scripted stand-ins.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    client::PoolApiClient,
    error::ApiResult,
    proto::{pool, pool_miners, pool_payouts},
    types::{datetime_to_ts, PayoutEntry, PoolInfo, PoolStats, SoloPayoutEntry, WorkerEntry},
};

#[async_trait]
pub trait PoolApi: Send + Sync + 'static {
    async fn validate_address(&self, address: String) -> ApiResult<bool>;

    async fn get_pool_info(&self) -> ApiResult<PoolInfo>;
}

#[async_trait]
pub trait StatsApi: Send + Sync + 'static {
    async fn get_pool_stats(&self) -> ApiResult<PoolStats>;
}

#[async_trait]
pub trait MinersApi: Send + Sync + 'static {
    /// Live workers per requested address. Addresses with no active workers
    /// may be absent from the result.
    async fn get_workers(
        &self,
        addresses: Vec<String>,
    ) -> ApiResult<HashMap<String, Vec<WorkerEntry>>>;

    async fn get_balances(&self, addresses: Vec<String>) -> ApiResult<HashMap<String, u64>>;
}

#[async_trait]
pub trait PayoutsApi: Send + Sync + 'static {
    /// Payouts strictly after `paid_from` per requested address.
    async fn get_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<PayoutEntry>>>;

    async fn get_solo_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<SoloPayoutEntry>>>;
}

#[async_trait]
impl PoolApi for PoolApiClient {
    async fn validate_address(&self, address: String) -> ApiResult<bool> {
        let resp = self
            .pool()
            .validate_address(pool::ValidateAddressRequest { address })
            .await?;
        Ok(resp.into_inner().valid)
    }

    async fn get_pool_info(&self) -> ApiResult<PoolInfo> {
        let resp = self.pool().get_pool_info(pool::Empty {}).await?;
        Ok(resp.into_inner().into())
    }
}

#[async_trait]
impl StatsApi for PoolApiClient {
    async fn get_pool_stats(&self) -> ApiResult<PoolStats> {
        let resp = self.stats().get_pool_stats(pool::Empty {}).await?;
        Ok(resp.into_inner().into())
    }
}

#[async_trait]
impl MinersApi for PoolApiClient {
    async fn get_workers(
        &self,
        addresses: Vec<String>,
    ) -> ApiResult<HashMap<String, Vec<WorkerEntry>>> {
        let resp = self
            .miners()
            .get_workers(pool_miners::MinerAddressesRequest { addresses })
            .await?;
        Ok(resp
            .into_inner()
            .workers
            .into_iter()
            .map(|(wallet, entry)| {
                (
                    wallet,
                    entry.workers.into_iter().map(WorkerEntry::from).collect(),
                )
            })
            .collect())
    }

    async fn get_balances(&self, addresses: Vec<String>) -> ApiResult<HashMap<String, u64>> {
        let resp = self
            .miners()
            .get_balances(pool_miners::MinerAddressesRequest { addresses })
            .await?;
        Ok(resp
            .into_inner()
            .balances
            .into_iter()
            .map(|(wallet, b)| (wallet, b.balance))
            .collect())
    }
}

#[async_trait]
impl PayoutsApi for PoolApiClient {
    async fn get_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<PayoutEntry>>> {
        let request = pool_payouts::MinersPayoutsRequest {
            addresses,
            filters: Some(pool_payouts::MinersPayoutsFilters {
                paid_from: Some(datetime_to_ts(paid_from)),
            }),
        };
        let resp = self.payouts().get_payouts(request).await?;
        Ok(resp
            .into_inner()
            .payouts
            .into_iter()
            .map(|(wallet, entry)| {
                (
                    wallet,
                    entry.payouts.into_iter().map(PayoutEntry::from).collect(),
                )
            })
            .collect())
    }

    async fn get_solo_payouts(
        &self,
        addresses: Vec<String>,
        paid_from: DateTime<Utc>,
    ) -> ApiResult<HashMap<String, Vec<SoloPayoutEntry>>> {
        let request = pool_payouts::MinersPayoutsRequest {
            addresses,
            filters: Some(pool_payouts::MinersPayoutsFilters {
                paid_from: Some(datetime_to_ts(paid_from)),
            }),
        };
        let resp = self.payouts().get_solo_payouts(request).await?;
        Ok(resp
            .into_inner()
            .payouts
            .into_iter()
            .map(|(wallet, entry)| {
                (
                    wallet,
                    entry
                        .payouts
                        .into_iter()
                        .map(SoloPayoutEntry::from)
                        .collect(),
                )
            })
            .collect())
    }
}
