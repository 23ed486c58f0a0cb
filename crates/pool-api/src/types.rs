//! Domain-side views of the wire messages.

use chrono::{DateTime, TimeZone, Utc};
use prost_types::Timestamp;

use crate::proto::{pool, pool_miners, pool_payouts, pool_stats};

/// A live miner client reported by a pool backend.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerEntry {
    pub worker: String,
    pub region: String,
    pub solo: bool,
    /// Big-endian arbitrary-width integer.
    pub hashrate: Vec<u8>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutEntry {
    pub amount: u64,
    pub tx_hash: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoloPayoutEntry {
    pub reward: u64,
    pub block_hash: String,
    pub tx_hash: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolInfo {
    pub host: String,
    pub algos: Vec<String>,
    pub payout_mode: String,
    pub solo: bool,
    pub fee: f64,
    pub solo_fee: Option<f64>,
    pub min_payout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    pub miners_count: u32,
    pub hashrate: Vec<u8>,
    pub avg_hashrate: Vec<u8>,
    pub solo_miners_count: Option<u32>,
    pub solo_hashrate: Option<Vec<u8>>,
}

pub(crate) fn ts_to_datetime(ts: Option<Timestamp>) -> DateTime<Utc> {
    ts.and_then(|t| Utc.timestamp_opt(t.seconds, t.nanos.max(0) as u32).single())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub(crate) fn datetime_to_ts(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

impl From<pool_miners::MinerWorker> for WorkerEntry {
    fn from(w: pool_miners::MinerWorker) -> Self {
        Self {
            worker: w.worker,
            region: w.region,
            solo: w.solo,
            hashrate: w.hashrate,
            connected_at: ts_to_datetime(w.connected_at),
        }
    }
}

impl From<pool_payouts::MinerPayout> for PayoutEntry {
    fn from(p: pool_payouts::MinerPayout) -> Self {
        Self {
            amount: p.amount,
            tx_hash: p.tx_hash,
            paid_at: ts_to_datetime(p.paid_at),
        }
    }
}

impl From<pool_payouts::MinerSoloPayout> for SoloPayoutEntry {
    fn from(p: pool_payouts::MinerSoloPayout) -> Self {
        Self {
            reward: p.reward,
            block_hash: p.block_hash,
            tx_hash: p.tx_hash,
            paid_at: ts_to_datetime(p.paid_at),
        }
    }
}

impl From<pool::PoolInfoResponse> for PoolInfo {
    fn from(info: pool::PoolInfoResponse) -> Self {
        let fee = info.fee.unwrap_or_default();
        Self {
            host: info.host,
            algos: info.algos,
            payout_mode: info.payout_mode,
            solo: info.solo,
            fee: fee.fee,
            solo_fee: fee.solo_fee,
            min_payout: info.payouts_info.and_then(|p| p.min_payout),
        }
    }
}

impl From<pool_stats::PoolStatsResponse> for PoolStats {
    fn from(stats: pool_stats::PoolStatsResponse) -> Self {
        Self {
            miners_count: stats.miners_count,
            hashrate: stats.hashrate,
            avg_hashrate: stats.avg_hashrate,
            solo_miners_count: stats.solo_miners_count,
            solo_hashrate: stats.solo_hashrate,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
        assert_eq!(ts_to_datetime(Some(datetime_to_ts(dt))), dt);
    }

    #[test]
    fn test_missing_timestamp_maps_to_epoch() {
        assert_eq!(ts_to_datetime(None), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_worker_entry_from_proto() {
        let w = pool_miners::MinerWorker {
            worker: "rig0".to_owned(),
            region: "eu".to_owned(),
            solo: true,
            hashrate: vec![0x01, 0x00],
            connected_at: Some(Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
        };
        let entry = WorkerEntry::from(w);
        assert_eq!(entry.worker, "rig0");
        assert!(entry.solo);
        assert_eq!(entry.connected_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_pool_info_from_proto_defaults() {
        let info = pool::PoolInfoResponse {
            host: "pool.example.com".to_owned(),
            algos: vec!["randomx".to_owned()],
            payout_mode: "pplns".to_owned(),
            solo: false,
            fee: None,
            payouts_info: None,
        };
        let info = PoolInfo::from(info);
        assert_eq!(info.fee, 0.0);
        assert_eq!(info.solo_fee, None);
        assert_eq!(info.min_payout, None);
    }
}
