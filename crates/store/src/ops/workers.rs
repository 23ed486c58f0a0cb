use chrono::{DateTime, Utc};
use tracing::*;

use crate::{
    types::{NewWorkerRow, NotifySubscriberRow, RemovedWorkerRow},
    DbResult, Store,
};

/// Session-temp relation staging mirror deletes so the final subtract is a
/// single set-difference statement instead of a row-by-row delete.
const REMOVED_WORKERS_TEMP_TABLE: &str = "wallet_workers_to_be_removed";

impl Store {
    /// Snapshot input for the worker tick: every wallet of a
    /// notification-subscribed user, left-joined to its mirrored workers.
    /// Wallets with an empty mirror appear once with null worker columns.
    pub async fn list_notify_subscribers(&self) -> DbResult<Vec<NotifySubscriberRow>> {
        let rows = sqlx::query_as::<_, NotifySubscriberRow>(
            "SELECT user_wallets.user_id,
                users.chat_id,
                users.lang,
                user_wallets.blockchain_coin AS coin,
                user_wallets.id AS wallet_id,
                user_wallets.wallet,
                wallet_workers.worker,
                wallet_workers.region,
                wallet_workers.solo,
                wallet_workers.connected_at
            FROM user_wallets
            INNER JOIN users ON users.id = user_wallets.user_id
            LEFT JOIN wallet_workers ON wallet_workers.wallet_id = user_wallets.id
            WHERE users.blocks_notify OR users.payouts_notify",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Applies one worker-tick change set in a single transaction.
    ///
    /// Adds are bulk-inserted into `wallet_workers` and removals staged into
    /// a session-temp table, both in statements of at most `group_limit`
    /// rows; a single `DELETE ... USING` then subtracts the staged set. Any
    /// statement error rolls the whole transaction back.
    pub async fn commit_worker_changes(
        &self,
        added: Vec<NewWorkerRow>,
        removed: Vec<RemovedWorkerRow>,
        group_limit: usize,
    ) -> DbResult<()> {
        if added.is_empty() && removed.is_empty() {
            return Ok(());
        }
        let group_limit = group_limit.max(1);

        let mut tx = self.pool().begin().await?;

        sqlx::query(&format!(
            "CREATE TEMP TABLE {REMOVED_WORKERS_TEMP_TABLE} (
                wallet_id BIGINT NOT NULL,
                worker TEXT NOT NULL,
                PRIMARY KEY (wallet_id, worker)
            ) ON COMMIT DROP"
        ))
        .execute(&mut *tx)
        .await?;

        for group in added.chunks(group_limit) {
            let mut wallet_ids = Vec::with_capacity(group.len());
            let mut workers = Vec::with_capacity(group.len());
            let mut regions = Vec::with_capacity(group.len());
            let mut solos = Vec::with_capacity(group.len());
            let mut connected: Vec<DateTime<Utc>> = Vec::with_capacity(group.len());
            for row in group {
                wallet_ids.push(row.wallet_id);
                workers.push(row.worker.clone());
                regions.push(row.region.clone());
                solos.push(row.solo);
                connected.push(row.connected_at);
            }

            sqlx::query(
                "INSERT INTO wallet_workers (wallet_id, worker, region, solo, connected_at)
                SELECT * FROM UNNEST(
                    $1::BIGINT[],
                    $2::TEXT[],
                    $3::TEXT[],
                    $4::BOOLEAN[],
                    $5::TIMESTAMPTZ[]
                )
                ON CONFLICT (wallet_id, worker) DO NOTHING",
            )
            .bind(&wallet_ids)
            .bind(&workers)
            .bind(&regions)
            .bind(&solos)
            .bind(&connected)
            .execute(&mut *tx)
            .await?;
        }

        for group in removed.chunks(group_limit) {
            let mut wallet_ids = Vec::with_capacity(group.len());
            let mut workers = Vec::with_capacity(group.len());
            for row in group {
                wallet_ids.push(row.wallet_id);
                workers.push(row.worker.clone());
            }

            sqlx::query(&format!(
                "INSERT INTO {REMOVED_WORKERS_TEMP_TABLE} (wallet_id, worker)
                SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[])
                ON CONFLICT (wallet_id, worker) DO NOTHING"
            ))
            .bind(&wallet_ids)
            .bind(&workers)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(&format!(
            "DELETE FROM wallet_workers
            USING {REMOVED_WORKERS_TEMP_TABLE} staged
            WHERE wallet_workers.wallet_id = staged.wallet_id
                AND wallet_workers.worker = staged.worker"
        ))
        .execute(&mut *tx)
        .await?;

        // ON COMMIT DROP already covers the commit path; dropping here keeps
        // the session clean for the pooled connection either way.
        sqlx::query(&format!("DROP TABLE {REMOVED_WORKERS_TEMP_TABLE}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            added = added.len(),
            removed = removed.len(),
            "committed worker mirror changes"
        );

        Ok(())
    }
}
