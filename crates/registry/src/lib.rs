//! Registry of pool backends: one descriptor and one long-lived secure
//! channel per coin, loaded from the persisted catalog at startup and
//! read-only afterwards.

use std::{collections::HashMap, path::Path};

use poolbot_store::{DbError, Store};
use thiserror::Error;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::*;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to load blockchain catalog: {0}")]
    Catalog(#[from] DbError),

    #[error("failed to read CA certificate for {coin}: {source}")]
    ReadCert {
        coin: String,
        source: std::io::Error,
    },

    #[error("invalid pool API url for {coin}: {source}")]
    InvalidUrl {
        coin: String,
        source: tonic::transport::Error,
    },

    #[error("failed to connect pool API channel for {coin}: {source}")]
    Connect {
        coin: String,
        source: tonic::transport::Error,
    },

    #[error("unknown coin {0}")]
    UnknownCoin(String),
}

/// Immutable descriptor of a pool backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainInfo {
    pub coin: String,
    pub name: String,
    pub ticker: String,
    pub atomic_unit: u16,
    pub example_wallet: String,
}

struct Blockchain {
    info: BlockchainInfo,
    channel: Channel,
}

pub struct Registry {
    blockchains: HashMap<String, Blockchain>,
}

impl Registry {
    /// Loads the catalog and eagerly connects every backend channel. Any
    /// failure drops the channels built so far and aborts startup; there is
    /// no per-tick reconnect logic, established channels reconnect on their
    /// own.
    pub async fn connect(store: &Store, certs_dir: &Path) -> Result<Self, RegistryError> {
        let catalog = store.list_blockchains().await?;

        let mut blockchains = HashMap::with_capacity(catalog.len());
        for entry in catalog {
            let channel = match build_channel(&entry, certs_dir).await {
                Ok(channel) => channel,
                Err(err) => {
                    // All-or-nothing startup.
                    blockchains.clear();
                    return Err(err);
                }
            };

            debug!(coin = %entry.coin, url = %entry.pool_api_url, "connected pool backend");
            blockchains.insert(
                entry.coin.clone(),
                Blockchain {
                    info: BlockchainInfo {
                        coin: entry.coin,
                        name: entry.name,
                        ticker: entry.ticker,
                        atomic_unit: entry.atomic_unit,
                        example_wallet: entry.example_wallet,
                    },
                    channel,
                },
            );
        }

        info!(backends = blockchains.len(), "pool backend registry ready");
        Ok(Self { blockchains })
    }

    pub fn info(&self, coin: &str) -> Result<&BlockchainInfo, RegistryError> {
        self.blockchains
            .get(coin)
            .map(|b| &b.info)
            .ok_or_else(|| RegistryError::UnknownCoin(coin.to_owned()))
    }

    pub fn channel(&self, coin: &str) -> Result<Channel, RegistryError> {
        self.blockchains
            .get(coin)
            .map(|b| b.channel.clone())
            .ok_or_else(|| RegistryError::UnknownCoin(coin.to_owned()))
    }

    pub fn infos(&self) -> impl Iterator<Item = &BlockchainInfo> {
        self.blockchains.values().map(|b| &b.info)
    }

    /// Drops every channel and empties the registry.
    pub fn close(&mut self) {
        self.blockchains.clear();
    }
}

async fn build_channel(
    entry: &poolbot_store::Blockchain,
    certs_dir: &Path,
) -> Result<Channel, RegistryError> {
    let ca_path = certs_dir.join(&entry.pool_api_tls_ca);
    let ca_pem = std::fs::read(&ca_path).map_err(|e| RegistryError::ReadCert {
        coin: entry.coin.clone(),
        source: e,
    })?;

    let tls = ClientTlsConfig::new()
        .ca_certificate(Certificate::from_pem(ca_pem))
        .domain_name(&entry.pool_api_server_name);

    let endpoint = Endpoint::from_shared(entry.pool_api_url.clone())
        .map_err(|e| RegistryError::InvalidUrl {
            coin: entry.coin.clone(),
            source: e,
        })?
        .tls_config(tls)
        .map_err(|e| RegistryError::Connect {
            coin: entry.coin.clone(),
            source: e,
        })?;

    endpoint.connect().await.map_err(|e| RegistryError::Connect {
        coin: entry.coin.clone(),
        source: e,
    })
}
