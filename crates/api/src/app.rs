//! The narrow request/response contract with the external application.

use async_trait::async_trait;
use tessera_types::error::AppError;
use tessera_types::tx::{AppAck, TxResult};

/// Connection to the application process that executes transactions.
///
/// The application is reached only through this contract; the core never
/// sees its state directly.
#[async_trait]
pub trait AppConnection: Send + Sync {
    /// Pre-commit validity check on a submitted transaction.
    ///
    /// Idempotent per call; may be invoked concurrently for distinct
    /// transactions.
    async fn check_admission(&self, tx: &[u8]) -> Result<TxResult, AppError>;

    /// Asks the application to revert its state by exactly one height.
    ///
    /// Only safe when the application's height exceeds the consensus layer's
    /// committed height by exactly one.
    async fn rollback_one_height(&self) -> Result<AppAck, AppError>;

    /// Read-only genesis document lookup.
    async fn query_genesis(&self) -> Result<Vec<u8>, AppError>;

    /// Read-only query by path; the result is consumed opaquely.
    async fn query(&self, path: &str) -> Result<Vec<u8>, AppError>;
}
