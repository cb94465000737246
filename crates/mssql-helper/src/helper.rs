//! High-level facade over the cache, assignment and renderer.

use std::sync::Arc;

use mssql_helper_types::{SqlValue, ToSql};

use crate::assign::assign_parameter_values;
use crate::command::SqlCommand;
use crate::config::HelperConfig;
use crate::debug_sql::DebugSqlRenderer;
use crate::discovery::ParameterDiscovery;
use crate::error::{Error, Result};
use crate::executor::CommandExecutor;
use crate::param::ParameterSet;
use crate::param_cache::ParameterCache;

/// Runs stored procedures with positional values, discovering and caching
/// their parameter metadata on first use.
///
/// # Example
///
/// ```rust,ignore
/// let helper = SqlHelper::new();
/// let rows = helper
///     .execute_procedure_non_query(Some(&conn), "dbo.AddCustomer", &[&"Ada", &1815i32])
///     .await?;
/// ```
///
/// Cloning a helper shares its cache.
#[derive(Debug, Clone)]
pub struct SqlHelper {
    cache: Arc<ParameterCache>,
    renderer: DebugSqlRenderer,
    config: HelperConfig,
}

impl SqlHelper {
    /// Create a helper with default configuration and a fresh cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HelperConfig::default())
    }

    /// Create a helper with the given configuration and a fresh cache.
    #[must_use]
    pub fn with_config(config: HelperConfig) -> Self {
        let cache = Arc::new(ParameterCache::with_config(config.cache.clone()));
        Self::with_cache(cache, config)
    }

    /// Create a helper that uses an existing, possibly shared, cache.
    ///
    /// `config.cache` is ignored; the cache keeps its own configuration.
    #[must_use]
    pub fn with_cache(cache: Arc<ParameterCache>, config: HelperConfig) -> Self {
        Self {
            cache,
            renderer: DebugSqlRenderer::new(),
            config,
        }
    }

    /// Replace the renderer used by [`debug_sql`](Self::debug_sql) and
    /// statement logging.
    #[must_use]
    pub fn with_renderer(mut self, renderer: DebugSqlRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// The parameter cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ParameterCache> {
        &self.cache
    }

    /// The debug-SQL renderer.
    #[must_use]
    pub fn renderer(&self) -> &DebugSqlRenderer {
        &self.renderer
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Return a copy of a procedure's parameters, discovering them through
    /// `connection` on the first call.
    ///
    /// # Errors
    ///
    /// See [`ParameterCache::get_sp_parameter_set`].
    pub async fn procedure_parameters<C>(
        &self,
        connection: Option<&C>,
        procedure_name: &str,
        include_return_value: bool,
    ) -> Result<ParameterSet>
    where
        C: ParameterDiscovery + ?Sized,
    {
        self.cache
            .get_sp_parameter_set(connection, procedure_name, include_return_value)
            .await
    }

    /// Build a stored procedure command with `values` assigned in order.
    ///
    /// With no values the procedure is called without parameters and
    /// nothing is discovered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a missing connection, a blank
    /// name, or a value count that differs from the procedure's parameter
    /// count. Discovery errors pass through unchanged.
    pub async fn prepare_procedure<C>(
        &self,
        connection: Option<&C>,
        procedure_name: &str,
        values: &[&dyn ToSql],
    ) -> Result<SqlCommand>
    where
        C: ParameterDiscovery + ?Sized,
    {
        let mut command = SqlCommand::stored_procedure(procedure_name);
        if let Some(timeout) = self.config.command_timeout {
            command = command.with_timeout(timeout);
        }
        if values.is_empty() {
            if procedure_name.trim().is_empty() {
                return Err(Error::invalid_argument("procedure name must not be empty"));
            }
            if connection.is_none() {
                return Err(Error::invalid_argument("connection must not be None"));
            }
            return Ok(command);
        }

        let mut parameters = self
            .procedure_parameters(connection, procedure_name, false)
            .await?;
        assign_parameter_values(&mut parameters, values)?;
        Ok(command.with_parameters(parameters))
    }

    /// Run a stored procedure with positional values and return the number
    /// of rows affected.
    ///
    /// # Errors
    ///
    /// As [`prepare_procedure`](Self::prepare_procedure), plus any execution
    /// error.
    pub async fn execute_procedure_non_query<C>(
        &self,
        connection: Option<&C>,
        procedure_name: &str,
        values: &[&dyn ToSql],
    ) -> Result<u64>
    where
        C: ParameterDiscovery + CommandExecutor + ?Sized,
    {
        let mut command = self
            .prepare_procedure(connection, procedure_name, values)
            .await?;
        let connection =
            connection.ok_or_else(|| Error::invalid_argument("connection must not be None"))?;
        self.execute_non_query(connection, &mut command).await
    }

    /// Run a stored procedure with positional values and return the first
    /// column of the first row.
    ///
    /// # Errors
    ///
    /// As [`execute_procedure_non_query`](Self::execute_procedure_non_query).
    pub async fn execute_procedure_scalar<C>(
        &self,
        connection: Option<&C>,
        procedure_name: &str,
        values: &[&dyn ToSql],
    ) -> Result<SqlValue>
    where
        C: ParameterDiscovery + CommandExecutor + ?Sized,
    {
        let mut command = self
            .prepare_procedure(connection, procedure_name, values)
            .await?;
        let connection =
            connection.ok_or_else(|| Error::invalid_argument("connection must not be None"))?;
        self.execute_scalar(connection, &mut command).await
    }

    /// Execute a prepared command, logging it first if statement logging is
    /// enabled. Output values are left in `command.parameters`.
    ///
    /// # Errors
    ///
    /// Returns the executor's error unchanged.
    pub async fn execute_non_query<E>(&self, executor: &E, command: &mut SqlCommand) -> Result<u64>
    where
        E: CommandExecutor + ?Sized,
    {
        self.log_statement(command);
        executor.execute_non_query(command).await
    }

    /// Execute a prepared command for a single value, logging it first if
    /// statement logging is enabled.
    ///
    /// # Errors
    ///
    /// Returns the executor's error unchanged.
    pub async fn execute_scalar<E>(
        &self,
        executor: &E,
        command: &mut SqlCommand,
    ) -> Result<SqlValue>
    where
        E: CommandExecutor + ?Sized,
    {
        self.log_statement(command);
        executor.execute_scalar(command).await
    }

    /// Render `command` as literal SQL.
    ///
    /// # Errors
    ///
    /// See [`DebugSqlRenderer::render_command`].
    pub fn debug_sql(&self, command: &SqlCommand) -> Result<String> {
        self.renderer.render_command(command)
    }

    fn log_statement(&self, command: &SqlCommand) {
        if !self.config.log_statements {
            return;
        }
        match self.debug_sql(command) {
            Ok(sql) => tracing::debug!(sql = %sql, "executing command"),
            Err(e) => tracing::debug!(
                command = command.text().unwrap_or_default(),
                error = %e,
                "executing command (not renderable)"
            ),
        }
    }
}

impl Default for SqlHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use mssql_helper_types::SqlDbType;

    use super::*;
    use crate::param::{ParameterDescriptor, ParameterDirection};

    #[derive(Default)]
    struct EchoConnection {
        discoveries: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ParameterDiscovery for EchoConnection {
        fn connection_identity(&self) -> &str {
            "Server=echo"
        }

        async fn derive_parameters(&self, _procedure_name: &str) -> Result<ParameterSet> {
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            ParameterSet::from_vec(vec![
                ParameterDescriptor::return_value("@RETURN_VALUE"),
                ParameterDescriptor::with_type("@id", SqlDbType::Int)?,
                ParameterDescriptor::with_type("@total", SqlDbType::Decimal)?
                    .with_direction(ParameterDirection::InputOutput),
            ])
        }
    }

    #[async_trait::async_trait]
    impl CommandExecutor for EchoConnection {
        async fn execute_non_query(&self, command: &mut SqlCommand) -> Result<u64> {
            Ok(command.parameters.len() as u64)
        }

        async fn execute_scalar(&self, command: &mut SqlCommand) -> Result<SqlValue> {
            Ok(command
                .parameters
                .iter()
                .next()
                .map(|p| p.value().clone())
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_execute_procedure_assigns_in_order() {
        let helper = SqlHelper::new();
        let conn = EchoConnection::default();

        let affected = helper
            .execute_procedure_non_query(Some(&conn), "dbo.Total", &[&7i32, &SqlValue::Null])
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let first = helper
            .execute_procedure_scalar(Some(&conn), "dbo.Total", &[&9i32, &SqlValue::Null])
            .await
            .unwrap();
        assert_eq!(first, SqlValue::Int(9));
        assert_eq!(conn.discoveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_without_values_skips_discovery() {
        let helper = SqlHelper::with_config(
            HelperConfig::new().command_timeout(Duration::from_secs(3)),
        );
        let conn = EchoConnection::default();

        let command = helper
            .prepare_procedure(Some(&conn), "dbo.Ping", &[])
            .await
            .unwrap();
        assert!(command.parameters.is_empty());
        assert_eq!(command.timeout, Some(Duration::from_secs(3)));
        assert_eq!(conn.discoveries.load(Ordering::SeqCst), 0);
        assert_eq!(helper.debug_sql(&command).unwrap(), "EXEC dbo.Ping ");
    }

    #[tokio::test]
    async fn test_missing_connection() {
        let helper = SqlHelper::new();
        let err = helper
            .execute_procedure_non_query(None::<&EchoConnection>, "dbo.Total", &[&1i32])
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = helper
            .prepare_procedure(None::<&EchoConnection>, "dbo.Ping", &[])
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_value_count_mismatch() {
        let helper = SqlHelper::new();
        let conn = EchoConnection::default();
        let err = helper
            .execute_procedure_non_query(Some(&conn), "dbo.Total", &[&1i32])
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_clones_share_cache() {
        let helper = SqlHelper::new();
        let other = helper.clone();
        assert!(Arc::ptr_eq(helper.cache(), other.cache()));
    }
}
