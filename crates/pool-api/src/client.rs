//! Unary gRPC clients over an established [`Channel`], one per backend
//! service, in the shape `tonic-build` would emit.

use http::uri::PathAndQuery;
use tonic::{codec::ProstCodec, transport::Channel, Request, Response, Status};

use crate::proto::{pool, pool_miners, pool_payouts, pool_stats};

async fn ready(inner: &mut tonic::client::Grpc<Channel>) -> Result<(), Status> {
    inner
        .ready()
        .await
        .map_err(|e| Status::unknown(format!("service was not ready: {e}")))
}

#[derive(Debug, Clone)]
pub struct PoolServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl PoolServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn validate_address(
        &mut self,
        request: pool::ValidateAddressRequest,
    ) -> Result<Response<pool::ValidateAddressResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<pool::ValidateAddressRequest, pool::ValidateAddressResponse> =
            ProstCodec::default();
        let path = PathAndQuery::from_static("/pool.PoolService/ValidateAddress");
        self.inner.unary(Request::new(request), path, codec).await
    }

    pub async fn get_pool_info(
        &mut self,
        request: pool::Empty,
    ) -> Result<Response<pool::PoolInfoResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<pool::Empty, pool::PoolInfoResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool.PoolService/GetPoolInfo");
        self.inner.unary(Request::new(request), path, codec).await
    }
}

#[derive(Debug, Clone)]
pub struct PoolStatsServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl PoolStatsServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get_pool_stats(
        &mut self,
        request: pool::Empty,
    ) -> Result<Response<pool_stats::PoolStatsResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<pool::Empty, pool_stats::PoolStatsResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool_stats.PoolStatsService/GetPoolStats");
        self.inner.unary(Request::new(request), path, codec).await
    }
}

#[derive(Debug, Clone)]
pub struct PoolMinersServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl PoolMinersServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get_workers(
        &mut self,
        request: pool_miners::MinerAddressesRequest,
    ) -> Result<Response<pool_miners::MinerWorkersResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<
            pool_miners::MinerAddressesRequest,
            pool_miners::MinerWorkersResponse,
        > = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool_miners.PoolMinersService/GetWorkers");
        self.inner.unary(Request::new(request), path, codec).await
    }

    pub async fn get_balances(
        &mut self,
        request: pool_miners::MinerAddressesRequest,
    ) -> Result<Response<pool_miners::MinerBalancesResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<
            pool_miners::MinerAddressesRequest,
            pool_miners::MinerBalancesResponse,
        > = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool_miners.PoolMinersService/GetBalances");
        self.inner.unary(Request::new(request), path, codec).await
    }
}

#[derive(Debug, Clone)]
pub struct PoolPayoutsServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl PoolPayoutsServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get_payouts(
        &mut self,
        request: pool_payouts::MinersPayoutsRequest,
    ) -> Result<Response<pool_payouts::MinerPayoutsResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<
            pool_payouts::MinersPayoutsRequest,
            pool_payouts::MinerPayoutsResponse,
        > = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool_payouts.PoolPayoutsService/GetPayouts");
        self.inner.unary(Request::new(request), path, codec).await
    }

    pub async fn get_solo_payouts(
        &mut self,
        request: pool_payouts::MinersPayoutsRequest,
    ) -> Result<Response<pool_payouts::MinerSoloPayoutsResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec: ProstCodec<
            pool_payouts::MinersPayoutsRequest,
            pool_payouts::MinerSoloPayoutsResponse,
        > = ProstCodec::default();
        let path = PathAndQuery::from_static("/pool_payouts.PoolPayoutsService/GetSoloPayouts");
        self.inner.unary(Request::new(request), path, codec).await
    }
}

/// One facade per backend channel, implementing every service trait. Typed
/// clients are cheap channel clones created per call.
#[derive(Debug, Clone)]
pub struct PoolApiClient {
    channel: Channel,
}

impl PoolApiClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub(crate) fn pool(&self) -> PoolServiceClient {
        PoolServiceClient::new(self.channel.clone())
    }

    pub(crate) fn stats(&self) -> PoolStatsServiceClient {
        PoolStatsServiceClient::new(self.channel.clone())
    }

    pub(crate) fn miners(&self) -> PoolMinersServiceClient {
        PoolMinersServiceClient::new(self.channel.clone())
    }

    pub(crate) fn payouts(&self) -> PoolPayoutsServiceClient {
        PoolPayoutsServiceClient::new(self.channel.clone())
    }
}
