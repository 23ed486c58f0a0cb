use crate::{errors::DbError, types::UserWallet, DbResult, Store};

impl Store {
    /// Subscribes a wallet. A duplicate `(user, coin, wallet)` surfaces as
    /// [`DbError::WalletExists`]; the per-user limit is checked by the caller
    /// through [`Store::count_wallets`].
    pub async fn add_wallet(&self, user_id: i64, coin: &str, wallet: &str) -> DbResult<UserWallet> {
        let row = sqlx::query_as::<_, UserWallet>(
            "INSERT INTO user_wallets (user_id, blockchain_coin, wallet, added_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, user_id, blockchain_coin, wallet, added_at",
        )
        .bind(user_id)
        .bind(coin)
        .bind(wallet)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return DbError::WalletExists;
                }
            }
            DbError::Sqlx(e)
        })?;

        Ok(row)
    }

    pub async fn remove_wallet(&self, user_id: i64, coin: &str, wallet: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_wallets
            WHERE user_id = $1 AND blockchain_coin = $2 AND wallet = $3",
        )
        .bind(user_id)
        .bind(coin)
        .bind(wallet)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_wallets(&self, user_id: i64, coin: &str) -> DbResult<Vec<UserWallet>> {
        let rows = sqlx::query_as::<_, UserWallet>(
            "SELECT id, user_id, blockchain_coin, wallet, added_at
            FROM user_wallets
            WHERE user_id = $1 AND blockchain_coin = $2
            ORDER BY added_at",
        )
        .bind(user_id)
        .bind(coin)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    pub async fn count_wallets(&self, user_id: i64, coin: &str) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_wallets WHERE user_id = $1 AND blockchain_coin = $2",
        )
        .bind(user_id)
        .bind(coin)
        .fetch_one(self.pool())
        .await?;

        Ok(count.0)
    }
}
