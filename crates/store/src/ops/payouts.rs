use chrono::{DateTime, Utc};

use crate::{types::PayoutSubscriberRow, DbResult, Store};

impl Store {
    /// Snapshot input for the payout tick: one row per subscribed wallet with
    /// the owner's notify flags.
    pub async fn list_payout_subscribers(&self) -> DbResult<Vec<PayoutSubscriberRow>> {
        let rows = sqlx::query_as::<_, PayoutSubscriberRow>(
            "SELECT user_wallets.user_id,
                users.chat_id,
                users.lang,
                users.payouts_notify,
                users.blocks_notify,
                user_wallets.blockchain_coin AS coin,
                user_wallets.id AS wallet_id,
                user_wallets.wallet
            FROM user_wallets
            INNER JOIN users ON users.id = user_wallets.user_id
            WHERE users.blocks_notify OR users.payouts_notify",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Timestamp of the most recent successful payout tick, if any.
    pub async fn last_payout_executed_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT executed_at FROM payouts_notifications ORDER BY executed_at DESC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|(executed_at,)| executed_at))
    }

    pub async fn record_payout_executed_at(&self) -> DbResult<()> {
        sqlx::query("INSERT INTO payouts_notifications (executed_at) VALUES (NOW())")
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
