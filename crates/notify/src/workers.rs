//! Worker-change detection: one scheduled pass that snapshots the mirror,
//! polls every backend in bounded batches, diffs, commits the mirror forward
//! and notifies affected users.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use poolbot_common::lang::Languages;
use poolbot_config::NotifyConfig;
use poolbot_pool_api::{ApiResult, MinersApi, WorkerEntry};
use poolbot_store::{NewWorkerRow, NotifySubscriberRow, RemovedWorkerRow};
use poolbot_tasks::ShutdownGuard;
use tokio::sync::mpsc;
use tracing::*;

use crate::{
    batch::{batch_addresses, partition_users},
    gateway::Notifier,
    messages,
    traits::{BackendDirectory, WorkerMirror},
    types::{TickOutcome, UserInfo, WalletInfo},
    NotifyResult,
};

/// Last-seen mirror entry. The map key is the worker name, which is the
/// whole identity: a worker re-appearing under the same name is the same
/// worker regardless of region or solo flag.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MirrorWorker {
    pub region: String,
    pub solo: bool,
    pub connected_at: DateTime<Utc>,
}

/// Snapshot state of one subscribed wallet.
pub(crate) struct WalletWorkers {
    pub user: UserInfo,
    pub wallet: WalletInfo,
    pub mirror: HashMap<String, MirrorWorker>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct ChangedWorkers {
    pub added: Vec<WorkerEntry>,
    pub removed: Vec<String>,
}

type Snapshot = HashMap<String, HashMap<String, WalletWorkers>>;
type ChangedMap = HashMap<UserInfo, HashMap<WalletInfo, ChangedWorkers>>;

struct WorkersGroup {
    api: Arc<dyn MinersApi>,
    coin: String,
    group_num: usize,
    addresses: Vec<String>,
}

struct GroupReply {
    coin: String,
    group_num: usize,
    addresses: Vec<String>,
    result: ApiResult<HashMap<String, Vec<WorkerEntry>>>,
}

/// Builds `coin -> wallet -> mirror` from the snapshot rows, dropping
/// wallets whose coin is missing from the registry.
pub(crate) fn build_snapshot<D: BackendDirectory>(
    rows: Vec<NotifySubscriberRow>,
    directory: &D,
) -> Snapshot {
    let mut snapshot: Snapshot = HashMap::new();
    let mut blockchains = HashMap::new();

    for row in rows {
        let info = blockchains.entry(row.coin.clone()).or_insert_with(|| {
            let info = directory.blockchain(&row.coin);
            if info.is_none() {
                debug!(coin = %row.coin, "coin missing from backend registry, skipping its wallets");
            }
            info
        });
        let Some(info) = info.as_ref() else {
            continue;
        };

        let state = snapshot
            .entry(row.coin.clone())
            .or_default()
            .entry(row.wallet.clone())
            .or_insert_with(|| WalletWorkers {
                user: UserInfo {
                    user_id: row.user_id,
                    chat_id: row.chat_id,
                    lang: row.lang.clone(),
                },
                wallet: WalletInfo {
                    wallet_id: row.wallet_id,
                    wallet: row.wallet.clone(),
                    coin: row.coin.clone(),
                    coin_name: info.name.clone(),
                    ticker: info.ticker.clone(),
                    atomic_unit: info.atomic_unit,
                },
                mirror: HashMap::new(),
            });

        if let (Some(worker), Some(region), Some(solo), Some(connected_at)) =
            (row.worker, row.region, row.solo, row.connected_at)
        {
            state.mirror.insert(
                worker,
                MirrorWorker {
                    region,
                    solo,
                    connected_at,
                },
            );
        }
    }

    snapshot
}

/// Set difference against the mirror, by worker name.
pub(crate) fn diff_workers(
    mirror: &HashMap<String, MirrorWorker>,
    observed: &[WorkerEntry],
) -> ChangedWorkers {
    let observed_names: HashSet<&str> = observed.iter().map(|w| w.worker.as_str()).collect();

    let mut added = Vec::new();
    let mut seen = HashSet::new();
    for worker in observed {
        if !mirror.contains_key(&worker.worker) && seen.insert(worker.worker.clone()) {
            added.push(worker.clone());
        }
    }

    let removed = mirror
        .keys()
        .filter(|name| !observed_names.contains(name.as_str()))
        .cloned()
        .collect();

    ChangedWorkers { added, removed }
}

async fn fetch_workers_group(
    group: WorkersGroup,
    reply_tx: mpsc::Sender<GroupReply>,
    shutdown: ShutdownGuard,
) {
    // Cancelled before dispatch: exit without publishing.
    if shutdown.should_shutdown() {
        return;
    }

    let WorkersGroup {
        api,
        coin,
        group_num,
        addresses,
    } = group;
    let result = api.get_workers(addresses.clone()).await;
    let _ = reply_tx
        .send(GroupReply {
            coin,
            group_num,
            addresses,
            result,
        })
        .await;
}

fn flatten_changes(changed: &ChangedMap) -> (Vec<NewWorkerRow>, Vec<RemovedWorkerRow>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    for wallets in changed.values() {
        for (wallet, diff) in wallets {
            for worker in &diff.added {
                added.push(NewWorkerRow {
                    wallet_id: wallet.wallet_id,
                    worker: worker.worker.clone(),
                    region: worker.region.clone(),
                    solo: worker.solo,
                    connected_at: worker.connected_at,
                });
            }
            for worker in &diff.removed {
                removed.push(RemovedWorkerRow {
                    wallet_id: wallet.wallet_id,
                    worker: worker.clone(),
                });
            }
        }
    }
    (added, removed)
}

pub struct WorkersCheck<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    languages: Arc<Languages>,
    config: NotifyConfig,
}

impl<S, D, N> WorkersCheck<S, D, N>
where
    S: WorkerMirror,
    D: BackendDirectory,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<N>,
        languages: Arc<Languages>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            languages,
            config,
        }
    }

    /// One pass of the detector. Commit strictly precedes notification; any
    /// failure before the commit leaves the mirror untouched so the next
    /// pass produces the same diff again.
    pub async fn run(&self, shutdown: &ShutdownGuard) -> NotifyResult<TickOutcome> {
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }

        // Snapshot.
        let rows = self.store.list_notify_subscribers().await?;
        let snapshot = build_snapshot(rows, self.directory.as_ref());
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }

        // Batching.
        let mut groups = Vec::new();
        for (coin, wallets) in &snapshot {
            let Some(api) = self.directory.miners_api(coin) else {
                continue;
            };
            let batches = batch_addresses(
                wallets.keys().cloned(),
                self.config.max_wallets_in_workers_request,
            );
            for (group_num, addresses) in batches.into_iter().enumerate() {
                groups.push(WorkersGroup {
                    api: api.clone(),
                    coin: coin.clone(),
                    group_num,
                    addresses,
                });
            }
        }
        let requests_count = groups.len();
        if requests_count == 0 {
            trace!("no subscribed wallets, nothing to poll");
            return Ok(TickOutcome::Completed);
        }

        // Fan-out. The channel holds every reply, so producers never block.
        let (reply_tx, mut reply_rx) = mpsc::channel(requests_count);
        for group in groups {
            tokio::spawn(fetch_workers_group(group, reply_tx.clone(), shutdown.clone()));
        }
        drop(reply_tx);

        // Diff: consume exactly `requests_count` replies.
        let mut shutdown_wait = shutdown.clone();
        let mut changed: ChangedMap = HashMap::new();
        for _ in 0..requests_count {
            let reply = tokio::select! {
                reply = reply_rx.recv() => reply,
                _ = shutdown_wait.wait_for_shutdown() => {
                    info!("worker tick cancelled during fan-out");
                    return Ok(TickOutcome::Cancelled);
                }
            };
            let Some(reply) = reply else {
                // Producers exited without publishing, which only happens on
                // cancellation before dispatch.
                return Ok(TickOutcome::Cancelled);
            };

            let workers = match reply.result {
                Ok(workers) => workers,
                Err(err) => {
                    error!(
                        coin = %reply.coin,
                        group_num = reply.group_num,
                        %err,
                        "pool workers request failed, abandoning tick"
                    );
                    return Ok(TickOutcome::Abandoned);
                }
            };

            let Some(coin_wallets) = snapshot.get(&reply.coin) else {
                continue;
            };
            // A wallet absent from the reply has no live workers: its whole
            // mirrored set counts as removed.
            for address in &reply.addresses {
                let Some(state) = coin_wallets.get(address) else {
                    continue;
                };
                let observed = workers.get(address).map(Vec::as_slice).unwrap_or_default();
                let diff = diff_workers(&state.mirror, observed);
                if diff.added.is_empty() && diff.removed.is_empty() {
                    continue;
                }
                changed
                    .entry(state.user.clone())
                    .or_default()
                    .insert(state.wallet.clone(), diff);
            }
        }

        if changed.is_empty() {
            trace!("worker mirror unchanged");
            return Ok(TickOutcome::Completed);
        }
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }

        // Stage and commit. A failure here skips notification entirely.
        let (added, removed) = flatten_changes(&changed);
        info!(
            added = added.len(),
            removed = removed.len(),
            users = changed.len(),
            "committing worker mirror changes"
        );
        self.store
            .commit_worker_changes(added, removed, self.config.max_users_db_changes_limit)
            .await?;

        // Notify. The mirror is already committed; send failures are logged
        // and never roll it back.
        self.notify_changes(changed, shutdown).await;

        Ok(TickOutcome::Completed)
    }

    async fn notify_changes(&self, changed: ChangedMap, shutdown: &ShutdownGuard) {
        let users: Vec<_> = changed.into_iter().collect();
        let groups = partition_users(users, self.config.parallel_notifications_count);

        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let notifier = self.notifier.clone();
            let languages = self.languages.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(notify_group(
                group, notifier, languages, shutdown,
            )));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn notify_group<N: Notifier>(
    group: Vec<(UserInfo, HashMap<WalletInfo, ChangedWorkers>)>,
    notifier: Arc<N>,
    languages: Arc<Languages>,
    shutdown: ShutdownGuard,
) {
    for (user, wallets) in group {
        if shutdown.should_shutdown() {
            return;
        }
        let localizer = languages.localizer(&user.lang);
        for (wallet, diff) in wallets {
            for worker in &diff.added {
                let text = messages::worker_active(&localizer, &wallet, worker);
                if let Err(err) = notifier.send(user.chat_id, &text).await {
                    warn!(
                        user_id = user.user_id,
                        wallet_id = wallet.wallet_id,
                        %err,
                        "failed to send worker-active notification"
                    );
                }
            }
            for worker in &diff.removed {
                let text = messages::worker_inactive(&localizer, &wallet, worker);
                if let Err(err) = notifier.send(user.chat_id, &text).await {
                    warn!(
                        user_id = user.user_id,
                        wallet_id = wallet.wallet_id,
                        %err,
                        "failed to send worker-inactive notification"
                    );
                }
            }
        }
    }
}
