//! Scripted in-memory connection.
//!
//! [`MockConnection`] answers discovery from catalog rows registered per
//! procedure and answers execution from a scripted [`MockResponse`]. It
//! counts discoveries and records every executed command so tests can
//! assert on what reached the "server".

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mssql_helper::{
    CommandExecutor, Error, ParameterDiscovery, ParameterSet, ProcedureParameterRow, Result,
    SqlCommand, SqlValue, descriptors_from_rows,
};
use parking_lot::Mutex;

/// Server error number for an unknown stored procedure.
pub const UNKNOWN_PROCEDURE: i32 = 2812;

/// Scripted outcome of executing a command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Rows affected; scalar execution yields NULL.
    RowsAffected(u64),
    /// A single value; non-query execution reports 0 rows.
    Scalar(SqlValue),
    /// A server error.
    Error {
        /// Error number.
        number: i32,
        /// Error message.
        message: String,
    },
}

impl MockResponse {
    /// Create a rows affected response.
    pub fn affected(count: u64) -> Self {
        Self::RowsAffected(count)
    }

    /// Create a scalar response.
    pub fn scalar(value: impl Into<SqlValue>) -> Self {
        Self::Scalar(value.into())
    }

    /// Create an error response.
    pub fn error(number: i32, message: impl Into<String>) -> Self {
        Self::Error {
            number,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct MockProcedure {
    rows: Vec<ProcedureParameterRow>,
    discovery_delay: Option<Duration>,
    outputs: Vec<(String, SqlValue)>,
}

/// Builder for [`MockConnection`].
#[derive(Debug)]
pub struct MockConnectionBuilder {
    identity: String,
    procedures: HashMap<String, MockProcedure>,
    responses: HashMap<String, MockResponse>,
    default_response: MockResponse,
    discovery_delay: Option<Duration>,
    failures: HashMap<String, (i32, String)>,
}

impl MockConnectionBuilder {
    /// Create a builder for a connection with the given identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            procedures: HashMap::new(),
            responses: HashMap::new(),
            default_response: MockResponse::affected(0),
            discovery_delay: None,
            failures: HashMap::new(),
        }
    }

    /// Register a procedure described by catalog rows, in declaration order.
    pub fn with_procedure(
        mut self,
        name: impl Into<String>,
        rows: Vec<ProcedureParameterRow>,
    ) -> Self {
        self.procedures.insert(
            name.into(),
            MockProcedure {
                rows,
                discovery_delay: None,
                outputs: Vec::new(),
            },
        );
        self
    }

    /// Delay discovery of one procedure. Overrides the connection-wide delay.
    pub fn with_procedure_delay(mut self, name: &str, delay: Duration) -> Self {
        if let Some(procedure) = self.procedures.get_mut(name) {
            procedure.discovery_delay = Some(delay);
        }
        self
    }

    /// Value written back into an output parameter when `procedure` runs.
    pub fn with_output(
        mut self,
        procedure: &str,
        parameter: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Self {
        if let Some(p) = self.procedures.get_mut(procedure) {
            p.outputs.push((parameter.into(), value.into()));
        }
        self
    }

    /// Response returned when a command with this text is executed.
    pub fn with_response(
        mut self,
        command_text: impl Into<String>,
        response: MockResponse,
    ) -> Self {
        self.responses.insert(command_text.into(), response);
        self
    }

    /// Response for command texts without a scripted response.
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Delay every discovery.
    pub fn with_discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = Some(delay);
        self
    }

    /// Make discovery of `procedure` fail with a server error.
    pub fn with_discovery_failure(
        mut self,
        procedure: impl Into<String>,
        number: i32,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .insert(procedure.into(), (number, message.into()));
        self
    }

    /// Build the connection.
    pub fn build(self) -> MockConnection {
        MockConnection {
            identity: self.identity,
            procedures: self.procedures,
            responses: self.responses,
            default_response: self.default_response,
            discovery_delay: self.discovery_delay,
            failures: Mutex::new(self.failures),
            discoveries: AtomicUsize::new(0),
            discoveries_by_procedure: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
        }
    }
}

/// A scripted connection implementing [`ParameterDiscovery`] and
/// [`CommandExecutor`].
#[derive(Debug)]
pub struct MockConnection {
    identity: String,
    procedures: HashMap<String, MockProcedure>,
    responses: HashMap<String, MockResponse>,
    default_response: MockResponse,
    discovery_delay: Option<Duration>,
    failures: Mutex<HashMap<String, (i32, String)>>,
    discoveries: AtomicUsize,
    discoveries_by_procedure: Mutex<HashMap<String, usize>>,
    executed: Mutex<Vec<SqlCommand>>,
}

impl MockConnection {
    /// Create a new builder.
    pub fn builder(identity: impl Into<String>) -> MockConnectionBuilder {
        MockConnectionBuilder::new(identity)
    }

    /// Total number of discoveries run, including failed ones.
    pub fn discovery_count(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }

    /// Number of discoveries run for one procedure.
    pub fn discovery_count_for(&self, procedure: &str) -> usize {
        self.discoveries_by_procedure
            .lock()
            .get(procedure)
            .copied()
            .unwrap_or(0)
    }

    /// Make subsequent discoveries of `procedure` fail.
    pub fn fail_discovery(
        &self,
        procedure: impl Into<String>,
        number: i32,
        message: impl Into<String>,
    ) {
        self.failures
            .lock()
            .insert(procedure.into(), (number, message.into()));
    }

    /// Let discoveries of `procedure` succeed again.
    pub fn clear_failure(&self, procedure: &str) {
        self.failures.lock().remove(procedure);
    }

    /// Copies of every executed command, in execution order.
    pub fn executed(&self) -> Vec<SqlCommand> {
        self.executed.lock().clone()
    }

    fn server_error(number: i32, message: String, procedure: &str) -> Error {
        Error::Server {
            number,
            class: 16,
            state: 1,
            message,
            procedure: Some(procedure.to_string()),
            line: 1,
        }
    }

    fn record(&self, command: &mut SqlCommand) -> Result<MockResponse> {
        let text = command
            .text()
            .ok_or_else(|| Error::invalid_argument("command text must not be None"))?
            .to_string();

        if let Some(procedure) = self.procedures.get(&text) {
            for (name, value) in &procedure.outputs {
                if let Some(p) = command.parameters.get_mut(name) {
                    if p.direction().is_output() {
                        p.set_value(value.clone());
                    }
                }
            }
        }
        self.executed.lock().push(command.clone());
        tracing::trace!(command = %text, "mock connection executed command");

        Ok(self
            .responses
            .get(&text)
            .unwrap_or(&self.default_response)
            .clone())
    }
}

#[async_trait::async_trait]
impl ParameterDiscovery for MockConnection {
    fn connection_identity(&self) -> &str {
        &self.identity
    }

    async fn derive_parameters(&self, procedure_name: &str) -> Result<ParameterSet> {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        *self
            .discoveries_by_procedure
            .lock()
            .entry(procedure_name.to_string())
            .or_insert(0) += 1;

        let procedure = self.procedures.get(procedure_name);
        if let Some(delay) = procedure
            .and_then(|p| p.discovery_delay)
            .or(self.discovery_delay)
        {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().get(procedure_name).cloned();
        if let Some((number, message)) = failure {
            return Err(Self::server_error(number, message, procedure_name));
        }

        match procedure {
            Some(p) => descriptors_from_rows(&p.rows),
            None => Err(Self::server_error(
                UNKNOWN_PROCEDURE,
                format!("Could not find stored procedure '{procedure_name}'."),
                procedure_name,
            )),
        }
    }
}

#[async_trait::async_trait]
impl CommandExecutor for MockConnection {
    async fn execute_non_query(&self, command: &mut SqlCommand) -> Result<u64> {
        match self.record(command)? {
            MockResponse::RowsAffected(n) => Ok(n),
            MockResponse::Scalar(_) => Ok(0),
            MockResponse::Error { number, message } => {
                Err(Self::server_error(number, message, command.text().unwrap_or_default()))
            }
        }
    }

    async fn execute_scalar(&self, command: &mut SqlCommand) -> Result<SqlValue> {
        match self.record(command)? {
            MockResponse::RowsAffected(_) => Ok(SqlValue::Null),
            MockResponse::Scalar(value) => Ok(value),
            MockResponse::Error { number, message } => {
                Err(Self::server_error(number, message, command.text().unwrap_or_default()))
            }
        }
    }
}
