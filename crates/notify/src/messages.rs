//! Rendering of outbound notification texts from localization bundles.

use poolbot_common::{format, lang::Localizer};
use poolbot_pool_api::{PayoutEntry, SoloPayoutEntry, WorkerEntry};

use crate::types::WalletInfo;

fn wallet_header(localizer: &Localizer<'_>, wallet: &WalletInfo) -> String {
    localizer.render(
        "WalletInfo",
        &[
            ("Wallet", wallet.wallet.as_str()),
            ("PoolBlockchainName", wallet.coin_name.as_str()),
        ],
    )
}

pub(crate) fn worker_active(
    localizer: &Localizer<'_>,
    wallet: &WalletInfo,
    worker: &WorkerEntry,
) -> String {
    let solo = format::bool_text(worker.solo, localizer);
    let connected_at = worker.connected_at.to_rfc3339();
    let body = localizer.render(
        "WorkerActive",
        &[
            ("Worker", worker.worker.as_str()),
            ("Region", worker.region.as_str()),
            ("Solo", solo.as_str()),
            ("ConnectedAt", connected_at.as_str()),
        ],
    );

    [wallet_header(localizer, wallet), body].join("\n\n")
}

pub(crate) fn worker_inactive(
    localizer: &Localizer<'_>,
    wallet: &WalletInfo,
    worker: &str,
) -> String {
    let body = localizer.render("WorkerInactive", &[("Worker", worker)]);

    [wallet_header(localizer, wallet), body].join("\n\n")
}

pub(crate) fn payout(
    localizer: &Localizer<'_>,
    wallet: &WalletInfo,
    payout: &PayoutEntry,
) -> String {
    let amount = format::amount(payout.amount, wallet.atomic_unit);
    let paid_at = payout.paid_at.to_rfc3339();
    let body = localizer.render(
        "PayoutInfo",
        &[
            ("Amount", amount.as_str()),
            ("Ticker", wallet.ticker.as_str()),
            ("TxHash", payout.tx_hash.as_str()),
            ("PaidAt", paid_at.as_str()),
        ],
    );

    [
        localizer.render("NewPayoutReceived", &[]),
        wallet_header(localizer, wallet),
        body,
    ]
    .join("\n\n")
}

pub(crate) fn solo_payout(
    localizer: &Localizer<'_>,
    wallet: &WalletInfo,
    payout: &SoloPayoutEntry,
) -> String {
    let reward = format::amount(payout.reward, wallet.atomic_unit);
    let paid_at = payout.paid_at.to_rfc3339();
    let body = localizer.render(
        "SoloPayoutInfo",
        &[
            ("Reward", reward.as_str()),
            ("Ticker", wallet.ticker.as_str()),
            ("BlockHash", payout.block_hash.as_str()),
            ("TxHash", payout.tx_hash.as_str()),
            ("PaidAt", paid_at.as_str()),
        ],
    );

    [
        localizer.render("NewBlockFound", &[]),
        wallet_header(localizer, wallet),
        body,
    ]
    .join("\n\n")
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::test_utils::{test_languages, test_wallet};

    #[test]
    fn test_payout_message_scales_amount() {
        let languages = test_languages();
        let localizer = languages.localizer("en");
        let wallet = test_wallet(7, "addr1", "btc");
        let entry = PayoutEntry {
            amount: 150,
            tx_hash: "abc123".to_owned(),
            paid_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        };

        let text = payout(&localizer, &wallet, &entry);
        assert!(text.contains("1.50"), "amount must be atomic-unit scaled: {text}");
        assert!(text.contains("BTC"));
        assert!(text.contains("abc123"));
        assert!(text.contains("addr1"));
    }

    #[test]
    fn test_worker_messages_carry_worker_name() {
        let languages = test_languages();
        let localizer = languages.localizer("en");
        let wallet = test_wallet(7, "addr1", "btc");
        let entry = WorkerEntry {
            worker: "rig0".to_owned(),
            region: "eu".to_owned(),
            solo: false,
            hashrate: Vec::new(),
            connected_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        };

        let active = worker_active(&localizer, &wallet, &entry);
        assert!(active.contains("rig0"));
        assert!(active.contains("eu"));

        let inactive = worker_inactive(&localizer, &wallet, "rig0");
        assert!(inactive.contains("rig0"));
    }
}
