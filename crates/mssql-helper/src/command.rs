//! Prepared commands.

use std::time::Duration;

use crate::param::ParameterSet;

/// How the command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandKind {
    /// Inline SQL text.
    #[default]
    Query,
    /// Name of a stored procedure.
    StoredProcedure,
    /// Name of a table whose rows are all returned.
    ///
    /// Not supported by the debug-SQL renderer.
    TableDirect,
}

impl CommandKind {
    /// Guess the kind from the command text.
    ///
    /// Text with no whitespace is taken to be a procedure name, anything else
    /// a query. A procedure name containing a space (`[dbo].[My Proc]`) is
    /// misclassified; use an explicit kind when that matters.
    #[must_use]
    pub fn detect(command_text: &str) -> Self {
        if command_text.chars().any(char::is_whitespace) {
            Self::Query
        } else {
            Self::StoredProcedure
        }
    }
}

/// A command ready to be handed to an execution capability.
#[derive(Debug, Clone, Default)]
pub struct SqlCommand {
    /// Query text or procedure name. `None` until set.
    pub command_text: Option<String>,
    /// How `command_text` is interpreted.
    pub command_kind: CommandKind,
    /// Parameters in binding order.
    pub parameters: ParameterSet,
    /// Per-command timeout; `None` defers to the executor.
    pub timeout: Option<Duration>,
}

impl SqlCommand {
    /// Create an inline query command.
    #[must_use]
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            command_text: Some(sql.into()),
            command_kind: CommandKind::Query,
            ..Self::default()
        }
    }

    /// Create a stored procedure command.
    #[must_use]
    pub fn stored_procedure(name: impl Into<String>) -> Self {
        Self {
            command_text: Some(name.into()),
            command_kind: CommandKind::StoredProcedure,
            ..Self::default()
        }
    }

    /// Set the parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The command text, if set.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.command_text.as_deref()
    }
}
