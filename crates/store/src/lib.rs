//! Mirror store: users, subscribed wallets and the last-observed worker set,
//! persisted in Postgres and written forward transactionally by the ticks.

pub mod errors;
mod ops;
mod types;

pub use errors::DbError;
pub use types::{
    Blockchain, NewWorkerRow, NotifySubscriberRow, PayoutSubscriberRow, RemovedWorkerRow, User,
    UserWallet,
};

pub type DbResult<T> = Result<T, DbError>;

/// Handle over the connection pool. Cheap to clone; all operations are
/// parameterized statements bounded by the caller's future.
#[derive(Debug, Clone)]
pub struct Store {
    pool: sqlx::PgPool,
}

impl Store {
    pub async fn connect(dsn: &str) -> DbResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new().connect(dsn).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}
