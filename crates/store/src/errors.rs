use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("wallet is already tracked for this user and coin")]
    WalletExists,

    #[error("migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
}
