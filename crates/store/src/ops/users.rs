use crate::{types::User, DbResult, Store};

impl Store {
    pub async fn find_user(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, chat_id, lang, payouts_notify, blocks_notify FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    /// Creates the user on first interaction with both notify flags enabled,
    /// or refreshes the chat id of an existing one. `lang` only applies on
    /// create; afterwards it belongs to the user.
    pub async fn upsert_user(&self, id: i64, chat_id: i64, lang: &str) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, chat_id, lang, payouts_notify, blocks_notify)
            VALUES ($1, $2, $3, TRUE, TRUE)
            ON CONFLICT (id) DO UPDATE SET chat_id = EXCLUDED.chat_id
            RETURNING id, chat_id, lang, payouts_notify, blocks_notify",
        )
        .bind(id)
        .bind(chat_id)
        .bind(lang)
        .fetch_one(self.pool())
        .await?;

        Ok(user)
    }

    pub async fn set_payouts_notify(&self, id: i64, enabled: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET payouts_notify = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    pub async fn set_blocks_notify(&self, id: i64, enabled: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET blocks_notify = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    pub async fn set_lang(&self, id: i64, lang: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET lang = $2 WHERE id = $1")
            .bind(id)
            .bind(lang)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
