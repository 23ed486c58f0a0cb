use crate::{types::Blockchain, DbResult, Store};

impl Store {
    /// One-shot catalog read at startup.
    pub async fn list_blockchains(&self) -> DbResult<Vec<Blockchain>> {
        let rows = sqlx::query_as::<_, Blockchain>(
            "SELECT coin,
                name,
                ticker,
                atomic_unit,
                example_wallet,
                pool_api_url,
                pool_api_tls_ca,
                pool_api_server_name
            FROM blockchains
            ORDER BY coin",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
