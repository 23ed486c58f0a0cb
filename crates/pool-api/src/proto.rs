//! Wire messages for the pool backend services, kept in the shape
//! `tonic-build` would emit for the upstream proto package.

pub mod pool {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Empty {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ValidateAddressRequest {
        #[prost(string, tag = "1")]
        pub address: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ValidateAddressResponse {
        #[prost(bool, tag = "1")]
        pub valid: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PoolFee {
        #[prost(double, tag = "1")]
        pub fee: f64,
        #[prost(double, optional, tag = "2")]
        pub solo_fee: Option<f64>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PayoutsInfo {
        #[prost(uint64, optional, tag = "1")]
        pub min_payout: Option<u64>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PoolInfoResponse {
        #[prost(string, tag = "1")]
        pub host: String,
        #[prost(string, repeated, tag = "2")]
        pub algos: Vec<String>,
        #[prost(string, tag = "3")]
        pub payout_mode: String,
        #[prost(bool, tag = "4")]
        pub solo: bool,
        #[prost(message, optional, tag = "5")]
        pub fee: Option<PoolFee>,
        #[prost(message, optional, tag = "6")]
        pub payouts_info: Option<PayoutsInfo>,
    }
}

pub mod pool_stats {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PoolStatsResponse {
        #[prost(uint32, tag = "1")]
        pub miners_count: u32,
        /// Big-endian arbitrary-width integer.
        #[prost(bytes = "vec", tag = "2")]
        pub hashrate: Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub avg_hashrate: Vec<u8>,
        #[prost(uint32, optional, tag = "4")]
        pub solo_miners_count: Option<u32>,
        #[prost(bytes = "vec", optional, tag = "5")]
        pub solo_hashrate: Option<Vec<u8>>,
    }
}

pub mod pool_miners {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerAddressesRequest {
        #[prost(string, repeated, tag = "1")]
        pub addresses: Vec<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerWorker {
        #[prost(string, tag = "1")]
        pub worker: String,
        #[prost(string, tag = "2")]
        pub region: String,
        #[prost(bool, tag = "3")]
        pub solo: bool,
        #[prost(bytes = "vec", tag = "4")]
        pub hashrate: Vec<u8>,
        #[prost(message, optional, tag = "5")]
        pub connected_at: Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerWorkers {
        #[prost(message, repeated, tag = "1")]
        pub workers: Vec<MinerWorker>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerWorkersResponse {
        #[prost(map = "string, message", tag = "1")]
        pub workers: ::std::collections::HashMap<String, MinerWorkers>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerBalance {
        #[prost(uint64, tag = "1")]
        pub balance: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerBalancesResponse {
        #[prost(map = "string, message", tag = "1")]
        pub balances: ::std::collections::HashMap<String, MinerBalance>,
    }
}

pub mod pool_payouts {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinersPayoutsFilters {
        #[prost(message, optional, tag = "1")]
        pub paid_from: Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinersPayoutsRequest {
        #[prost(string, repeated, tag = "1")]
        pub addresses: Vec<String>,
        #[prost(message, optional, tag = "2")]
        pub filters: Option<MinersPayoutsFilters>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerPayout {
        #[prost(uint64, tag = "1")]
        pub amount: u64,
        #[prost(string, tag = "2")]
        pub tx_hash: String,
        #[prost(message, optional, tag = "3")]
        pub paid_at: Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerPayouts {
        #[prost(message, repeated, tag = "1")]
        pub payouts: Vec<MinerPayout>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerPayoutsResponse {
        #[prost(map = "string, message", tag = "1")]
        pub payouts: ::std::collections::HashMap<String, MinerPayouts>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerSoloPayout {
        #[prost(uint64, tag = "1")]
        pub reward: u64,
        #[prost(string, tag = "2")]
        pub block_hash: String,
        #[prost(string, tag = "3")]
        pub tx_hash: String,
        #[prost(message, optional, tag = "4")]
        pub paid_at: Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerSoloPayouts {
        #[prost(message, repeated, tag = "1")]
        pub payouts: Vec<MinerSoloPayout>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MinerSoloPayoutsResponse {
        #[prost(map = "string, message", tag = "1")]
        pub payouts: ::std::collections::HashMap<String, MinerSoloPayouts>,
    }
}
