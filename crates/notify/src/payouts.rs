//! Payout and solo-payout detection: one scheduled pass that reads the
//! watermark, polls every backend for payouts since it, notifies and only
//! then advances the watermark (at-least-once delivery).

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use poolbot_common::lang::Languages;
use poolbot_config::NotifyConfig;
use poolbot_pool_api::{ApiResult, PayoutEntry, PayoutsApi, SoloPayoutEntry};
use poolbot_store::PayoutSubscriberRow;
use poolbot_tasks::ShutdownGuard;
use tokio::sync::mpsc;
use tracing::*;

use crate::{
    batch::{batch_addresses, partition_users},
    gateway::Notifier,
    messages,
    traits::{BackendDirectory, PayoutLedger},
    types::{TickOutcome, UserInfo, WalletInfo},
    NotifyResult,
};

/// Snapshot state of one subscribed wallet.
pub(crate) struct PayoutWallet {
    pub user: UserInfo,
    pub wallet: WalletInfo,
    pub wants_payouts: bool,
    pub wants_blocks: bool,
}

type PayoutSnapshot = HashMap<String, HashMap<String, PayoutWallet>>;
type PayoutsMap = HashMap<UserInfo, HashMap<WalletInfo, Vec<PayoutEntry>>>;
type SoloPayoutsMap = HashMap<UserInfo, HashMap<WalletInfo, Vec<SoloPayoutEntry>>>;

struct PayoutsGroup {
    api: Arc<dyn PayoutsApi>,
    coin: String,
    group_num: usize,
    addresses: Vec<String>,
}

struct GroupReply<T> {
    coin: String,
    group_num: usize,
    result: ApiResult<HashMap<String, Vec<T>>>,
}

pub(crate) fn build_payout_snapshot<D: BackendDirectory>(
    rows: Vec<PayoutSubscriberRow>,
    directory: &D,
) -> PayoutSnapshot {
    let mut snapshot: PayoutSnapshot = HashMap::new();
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

        snapshot
            .entry(row.coin.clone())
            .or_default()
            .insert(
                row.wallet.clone(),
                PayoutWallet {
                    user: UserInfo {
                        user_id: row.user_id,
                        chat_id: row.chat_id,
                        lang: row.lang.clone(),
                    },
                    wallet: WalletInfo {
                        wallet_id: row.wallet_id,
                        wallet: row.wallet,
                        coin: row.coin,
                        coin_name: info.name.clone(),
                        ticker: info.ticker.clone(),
                        atomic_unit: info.atomic_unit,
                    },
                    wants_payouts: row.payouts_notify,
                    wants_blocks: row.blocks_notify,
                },
            );
    }

    snapshot
}

async fn fetch_payouts_group(
    group: PayoutsGroup,
    paid_from: DateTime<Utc>,
    reply_tx: mpsc::Sender<GroupReply<PayoutEntry>>,
    shutdown: ShutdownGuard,
) {
    if shutdown.should_shutdown() {
        return;
    }

    let PayoutsGroup {
        api,
        coin,
        group_num,
        addresses,
    } = group;
    let result = api.get_payouts(addresses, paid_from).await;
    let _ = reply_tx
        .send(GroupReply {
            coin,
            group_num,
            result,
        })
        .await;
}

async fn fetch_solo_payouts_group(
    group: PayoutsGroup,
    paid_from: DateTime<Utc>,
    reply_tx: mpsc::Sender<GroupReply<SoloPayoutEntry>>,
    shutdown: ShutdownGuard,
) {
    if shutdown.should_shutdown() {
        return;
    }

    let PayoutsGroup {
        api,
        coin,
        group_num,
        addresses,
    } = group;
    let result = api.get_solo_payouts(addresses, paid_from).await;
    let _ = reply_tx
        .send(GroupReply {
            coin,
            group_num,
            result,
        })
        .await;
}

pub struct PayoutsCheck<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    languages: Arc<Languages>,
    config: NotifyConfig,
}

impl<S, D, N> PayoutsCheck<S, D, N>
where
    S: PayoutLedger,
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

    /// One pass of the detector. The watermark only advances after the
    /// notify phase returns, so a crash in between re-notifies on the next
    /// pass rather than losing payouts.
    pub async fn run(&self, shutdown: &ShutdownGuard) -> NotifyResult<TickOutcome> {
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }

        // Watermark.
        let Some(watermark) = self.store.last_payout_executed_at().await? else {
            // First tick ever: seed the watermark so only events after
            // install get reported.
            self.store.record_payout_executed_at().await?;
            info!("seeded payout watermark");
            return Ok(TickOutcome::Bootstrapped);
        };

        // Snapshot.
        let rows = self.store.list_payout_subscribers().await?;
        let snapshot = build_payout_snapshot(rows, self.directory.as_ref());
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }

        // Batching: one group stream per detector kind.
        let mut payout_groups = Vec::new();
        let mut solo_groups = Vec::new();
        for (coin, wallets) in &snapshot {
            let Some(api) = self.directory.payouts_api(coin) else {
                continue;
            };

            let payout_addresses = wallets
                .iter()
                .filter(|(_, w)| w.wants_payouts)
                .map(|(address, _)| address.clone());
            let batches =
                batch_addresses(payout_addresses, self.config.max_wallets_in_payouts_request);
            for (group_num, addresses) in batches.into_iter().enumerate() {
                payout_groups.push(PayoutsGroup {
                    api: api.clone(),
                    coin: coin.clone(),
                    group_num,
                    addresses,
                });
            }

            let solo_addresses = wallets
                .iter()
                .filter(|(_, w)| w.wants_blocks)
                .map(|(address, _)| address.clone());
            let batches =
                batch_addresses(solo_addresses, self.config.max_wallets_in_workers_request);
            for (group_num, addresses) in batches.into_iter().enumerate() {
                solo_groups.push(PayoutsGroup {
                    api: api.clone(),
                    coin: coin.clone(),
                    group_num,
                    addresses,
                });
            }
        }
        let requests_count = payout_groups.len();
        let solo_requests_count = solo_groups.len();

        // Fan-out. Channels hold every reply, so producers never block.
        let (payout_tx, mut payout_rx) = mpsc::channel(requests_count.max(1));
        for group in payout_groups {
            tokio::spawn(fetch_payouts_group(
                group,
                watermark,
                payout_tx.clone(),
                shutdown.clone(),
            ));
        }
        drop(payout_tx);

        let (solo_tx, mut solo_rx) = mpsc::channel(solo_requests_count.max(1));
        for group in solo_groups {
            tokio::spawn(fetch_solo_payouts_group(
                group,
                watermark,
                solo_tx.clone(),
                shutdown.clone(),
            ));
        }
        drop(solo_tx);

        // Aggregate exactly `requests_count + solo_requests_count` replies.
        let mut shutdown_wait = shutdown.clone();
        let mut payouts_map: PayoutsMap = HashMap::new();
        for _ in 0..requests_count {
            let reply = tokio::select! {
                reply = payout_rx.recv() => reply,
                _ = shutdown_wait.wait_for_shutdown() => {
                    info!("payout tick cancelled during fan-out");
                    return Ok(TickOutcome::Cancelled);
                }
            };
            let Some(reply) = reply else {
                return Ok(TickOutcome::Cancelled);
            };

            let payouts = match reply.result {
                Ok(payouts) => payouts,
                Err(err) => {
                    error!(
                        coin = %reply.coin,
                        group_num = reply.group_num,
                        %err,
                        "pool payouts request failed, abandoning tick"
                    );
                    return Ok(TickOutcome::Abandoned);
                }
            };

            let Some(coin_wallets) = snapshot.get(&reply.coin) else {
                continue;
            };
            for (address, entries) in payouts {
                if entries.is_empty() {
                    continue;
                }
                let Some(state) = coin_wallets.get(&address) else {
                    continue;
                };
                payouts_map
                    .entry(state.user.clone())
                    .or_default()
                    .entry(state.wallet.clone())
                    .or_default()
                    .extend(entries);
            }
        }

        let mut solo_payouts_map: SoloPayoutsMap = HashMap::new();
        for _ in 0..solo_requests_count {
            let reply = tokio::select! {
                reply = solo_rx.recv() => reply,
                _ = shutdown_wait.wait_for_shutdown() => {
                    info!("payout tick cancelled during fan-out");
                    return Ok(TickOutcome::Cancelled);
                }
            };
            let Some(reply) = reply else {
                return Ok(TickOutcome::Cancelled);
            };

            let payouts = match reply.result {
                Ok(payouts) => payouts,
                Err(err) => {
                    error!(
                        coin = %reply.coin,
                        group_num = reply.group_num,
                        %err,
                        "pool solo payouts request failed, abandoning tick"
                    );
                    return Ok(TickOutcome::Abandoned);
                }
            };

            let Some(coin_wallets) = snapshot.get(&reply.coin) else {
                continue;
            };
            for (address, entries) in payouts {
                if entries.is_empty() {
                    continue;
                }
                let Some(state) = coin_wallets.get(&address) else {
                    continue;
                };
                solo_payouts_map
                    .entry(state.user.clone())
                    .or_default()
                    .entry(state.wallet.clone())
                    .or_default()
                    .extend(entries);
            }
        }

        // Notify.
        self.notify_payouts(payouts_map, shutdown).await;
        self.notify_solo_payouts(solo_payouts_map, shutdown).await;

        // Advance the watermark, unless the notify phase was cut short by
        // shutdown; then the next tick repeats the window.
        if shutdown.should_shutdown() {
            return Ok(TickOutcome::Cancelled);
        }
        self.store.record_payout_executed_at().await?;

        Ok(TickOutcome::Completed)
    }

    async fn notify_payouts(&self, payouts: PayoutsMap, shutdown: &ShutdownGuard) {
        let users: Vec<_> = payouts.into_iter().collect();
        let groups = partition_users(users, self.config.parallel_notifications_count);

        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let notifier = self.notifier.clone();
            let languages = self.languages.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(notify_payout_group(
                group, notifier, languages, shutdown,
            )));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn notify_solo_payouts(&self, payouts: SoloPayoutsMap, shutdown: &ShutdownGuard) {
        let users: Vec<_> = payouts.into_iter().collect();
        let groups = partition_users(users, self.config.parallel_notifications_count);

        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let notifier = self.notifier.clone();
            let languages = self.languages.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(notify_solo_payout_group(
                group, notifier, languages, shutdown,
            )));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn notify_payout_group<N: Notifier>(
    group: Vec<(UserInfo, HashMap<WalletInfo, Vec<PayoutEntry>>)>,
    notifier: Arc<N>,
    languages: Arc<Languages>,
    shutdown: ShutdownGuard,
) {
    for (user, wallets) in group {
        if shutdown.should_shutdown() {
            return;
        }
        let localizer = languages.localizer(&user.lang);
        for (wallet, entries) in wallets {
            for entry in &entries {
                let text = messages::payout(&localizer, &wallet, entry);
                if let Err(err) = notifier.send(user.chat_id, &text).await {
                    warn!(
                        user_id = user.user_id,
                        wallet_id = wallet.wallet_id,
                        %err,
                        "failed to send payout notification"
                    );
                }
            }
        }
    }
}

async fn notify_solo_payout_group<N: Notifier>(
    group: Vec<(UserInfo, HashMap<WalletInfo, Vec<SoloPayoutEntry>>)>,
    notifier: Arc<N>,
    languages: Arc<Languages>,
    shutdown: ShutdownGuard,
) {
    for (user, wallets) in group {
        if shutdown.should_shutdown() {
            return;
        }
        let localizer = languages.localizer(&user.lang);
        for (wallet, entries) in wallets {
            for entry in &entries {
                let text = messages::solo_payout(&localizer, &wallet, entry);
                if let Err(err) = notifier.send(user.chat_id, &text).await {
                    warn!(
                        user_id = user.user_id,
                        wallet_id = wallet.wallet_id,
                        %err,
                        "failed to send solo payout notification"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashSet, sync::atomic::Ordering};

    use chrono::Duration;
    use poolbot_tasks::shutdown_channel;

    use super::*;
    use crate::test_utils::*;

    fn check(
        ledger: Arc<MemoryMirror>,
        directory: Arc<StubDirectory>,
        notifier: Arc<RecordingNotifier>,
    ) -> PayoutsCheck<MemoryMirror, StubDirectory, RecordingNotifier> {
        PayoutsCheck::new(
            ledger,
            directory,
            notifier,
            test_languages(),
            NotifyConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_first_tick_seeds_watermark_without_notifying() {
        let ledger = Arc::new(MemoryMirror::default());
        let directory = Arc::new(StubDirectory::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (_signal, shutdown) = shutdown_channel();

        let outcome = check(ledger.clone(), directory, notifier.clone())
            .run(&shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::Bootstrapped);
        assert_eq!(ledger.recorded.load(Ordering::SeqCst), 1);
        assert!(ledger.watermark.lock().unwrap().is_some());
        assert!(notifier.sent.lock().unwrap().is_empty(), "bootstrap sends nothing");
    }

    #[tokio::test]
    async fn test_payout_window_notifies_and_advances_watermark() {
        let watermark = test_time();
        let payouts = Arc::new(StubPayouts {
            payouts: HashMap::from([(
                "addr1".to_owned(),
                vec![
                    payout_entry(100, "tx0", watermark - Duration::minutes(5)),
                    payout_entry(250, "tx1", watermark + Duration::minutes(1)),
                    payout_entry(300, "tx2", watermark + Duration::minutes(2)),
                ],
            )]),
            ..Default::default()
        });
        let directory = Arc::new(
            StubDirectory::default().with_backend("btc", Arc::new(StubMiners::default()), payouts),
        );
        let ledger = Arc::new(MemoryMirror {
            payout_rows: vec![payout_row(1, 10, "btc", 100, "addr1", true, false)],
            watermark: std::sync::Mutex::new(Some(watermark)),
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let (_signal, shutdown) = shutdown_channel();

        let outcome = check(ledger.clone(), directory, notifier.clone())
            .run(&shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::Completed);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2, "only payouts after the watermark are reported");
        assert!(sent.iter().any(|(_, text)| text.contains("tx1")));
        assert!(sent.iter().any(|(_, text)| text.contains("tx2")));
        assert_eq!(ledger.recorded.load(Ordering::SeqCst), 1);
        assert!(
            ledger.watermark.lock().unwrap().unwrap() > watermark,
            "watermark must advance after notification"
        );
    }

    #[tokio::test]
    async fn test_group_error_leaves_watermark_untouched() {
        let watermark = test_time();
        let payouts = Arc::new(StubPayouts {
            fail_addresses: HashSet::from(["addr1".to_owned()]),
            ..Default::default()
        });
        let directory = Arc::new(
            StubDirectory::default().with_backend("btc", Arc::new(StubMiners::default()), payouts),
        );
        let ledger = Arc::new(MemoryMirror {
            payout_rows: vec![payout_row(1, 10, "btc", 100, "addr1", true, false)],
            watermark: std::sync::Mutex::new(Some(watermark)),
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let (_signal, shutdown) = shutdown_channel();

        let outcome = check(ledger.clone(), directory, notifier.clone())
            .run(&shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::Abandoned);
        assert_eq!(ledger.recorded.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.watermark.lock().unwrap().unwrap(), watermark);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_solo_payouts_go_to_block_subscribers_only() {
        let watermark = test_time();
        let payouts = Arc::new(StubPayouts {
            solo: HashMap::from([(
                "addr1".to_owned(),
                vec![solo_payout_entry(
                    5_000,
                    "block9",
                    "tx9",
                    watermark + Duration::minutes(3),
                )],
            )]),
            ..Default::default()
        });
        let directory = Arc::new(
            StubDirectory::default()
                .with_backend("btc", Arc::new(StubMiners::default()), payouts.clone()),
        );
        // Subscribed to blocks only: no payout queries should carry addr1.
        let ledger = Arc::new(MemoryMirror {
            payout_rows: vec![payout_row(1, 10, "btc", 100, "addr1", false, true)],
            watermark: std::sync::Mutex::new(Some(watermark)),
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let (_signal, shutdown) = shutdown_channel();

        let outcome = check(ledger, directory, notifier.clone())
            .run(&shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::Completed);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("block9"));

        let payout_calls = payouts.payout_calls.lock().unwrap();
        assert!(
            payout_calls.iter().all(|call| call.is_empty() || !call.contains(&"addr1".to_owned())),
            "wallet without payouts_notify must not be queried for payouts"
        );
    }

    #[tokio::test]
    async fn test_no_subscribers_still_advances_watermark() {
        let watermark = test_time();
        let ledger = Arc::new(MemoryMirror {
            watermark: std::sync::Mutex::new(Some(watermark)),
            ..Default::default()
        });
        let directory = Arc::new(StubDirectory::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (_signal, shutdown) = shutdown_channel();

        let outcome = check(ledger.clone(), directory, notifier)
            .run(&shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, TickOutcome::Completed);
        assert_eq!(ledger.recorded.load(Ordering::SeqCst), 1);
    }
}
