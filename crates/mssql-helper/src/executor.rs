//! Command execution capability.

use mssql_helper_types::SqlValue;

use crate::command::SqlCommand;
use crate::error::Result;

/// Capability to execute a prepared command against a live connection.
///
/// Implemented by connection (or transaction) handles outside this crate.
/// Uses `#[async_trait]` so that `dyn CommandExecutor` is usable.
///
/// Both methods take the command mutably. Implementations write returned
/// `Output`, `InputOutput` and `ReturnValue` parameter values back into
/// [`SqlCommand::parameters`] once the command completes.
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `command` and return the number of rows affected.
    async fn execute_non_query(&self, command: &mut SqlCommand) -> Result<u64>;

    /// Execute `command` and return the first column of the first row, or
    /// [`SqlValue::Null`] if there is no row.
    async fn execute_scalar(&self, command: &mut SqlCommand) -> Result<SqlValue>;
}
