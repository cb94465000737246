//! Debug SQL rendering.
//!
//! Turns a parameterized command into a literal statement that can be pasted
//! into a query window, for logs and diagnostics:
//!
//! ```text
//! StoredProcedure:  EXEC dbo.AddOrder @customer_id = 7, @note = N'rush'
//!
//! Query:            declare @id Int = 7
//!                   declare @name NVarChar(50) = N'O''Brien'
//!                   select * from customers where id = @id or name = @name
//! ```
//!
//! The output is a best-effort approximation for humans. Binary values are
//! not rendered, date/time offsets are dropped, and nothing guarantees the
//! statement re-executes identically.
//!
//! ## Customizing
//!
//! How a value is written and how a declaration is written are two separate
//! strategies, [`ValueFormatter`] and [`DeclarationFormatter`]. Either can be
//! replaced on its own, with a type or a closure:
//!
//! ```rust,ignore
//! let renderer = DebugSqlRenderer::new()
//!     .with_value_formatter(MaskingValueFormatter::new(["password"]))
//!     .with_declaration_formatter(|p: &ParameterDescriptor| {
//!         Ok::<_, Error>(format!("declare {} sql_variant", p.sql_name()))
//!     });
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime};
use mssql_helper_types::{SqlDbType, SqlValue, TypeError};

use crate::command::{CommandKind, SqlCommand};
use crate::error::{Error, Result};
use crate::param::ParameterDescriptor;

/// Written in place of binary values.
pub const BINARY_NOT_SUPPORTED: &str = "-- The image and binary data types are not supported --";

/// Written for NULL values.
pub const NULL_LITERAL: &str = "null";

/// `convert` style 121 layout: `yyyy-mm-dd hh:mi:ss:mmm`.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";

/// Strategy for writing a parameter's value as a SQL literal.
pub trait ValueFormatter: Send + Sync {
    /// Write `parameter`'s current value as a literal.
    fn format_value(&self, parameter: &ParameterDescriptor) -> Result<String>;
}

/// Strategy for writing a parameter's `declare` statement, without the
/// `= value` part.
pub trait DeclarationFormatter: Send + Sync {
    /// Write `declare @name type` for `parameter`.
    fn format_declaration(&self, parameter: &ParameterDescriptor) -> Result<String>;
}

impl<F> ValueFormatter for F
where
    F: Fn(&ParameterDescriptor) -> Result<String> + Send + Sync,
{
    fn format_value(&self, parameter: &ParameterDescriptor) -> Result<String> {
        self(parameter)
    }
}

impl<F> DeclarationFormatter for F
where
    F: Fn(&ParameterDescriptor) -> Result<String> + Send + Sync,
{
    fn format_declaration(&self, parameter: &ParameterDescriptor) -> Result<String> {
        self(parameter)
    }
}

/// Double every single quote in `s`.
#[must_use]
pub fn escape_quotes(s: &str) -> String {
    s.replace('\'', "''")
}

/// Wrap `s` in single quotes, escaping embedded quotes, with an `N` prefix
/// when `unicode` is set.
#[must_use]
pub fn quote_literal(s: &str, unicode: bool) -> String {
    let prefix = if unicode { "N" } else { "" };
    format!("{prefix}'{}'", escape_quotes(s))
}

/// The built-in, type-driven value formatter.
///
/// | Type | Literal |
/// |------|---------|
/// | any, value NULL | `null` |
/// | `Binary`, `VarBinary`, `Image` | [`BINARY_NOT_SUPPORTED`] |
/// | `Date`, `DateTime`, `DateTime2`, `DateTimeOffset`, `SmallDateTime` | `convert(datetime,'2015-12-31 23:59:22:345', 121)` |
/// | `Bit` | `1` or `0` |
/// | `Decimal` | invariant numeric text |
/// | `NChar`, `NVarChar`, `NText` | `N'...'` |
/// | `Char`, `VarChar`, `Text`, `Xml`, `Time` | `'...'` |
/// | anything else | the value's text, quotes doubled, unquoted |
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueFormatter;

impl ValueFormatter for DefaultValueFormatter {
    fn format_value(&self, parameter: &ParameterDescriptor) -> Result<String> {
        let value = parameter.value();
        if value.is_null() {
            return Ok(NULL_LITERAL.to_string());
        }

        let db_type = parameter.db_type();
        let literal = if db_type.is_binary() {
            BINARY_NOT_SUPPORTED.to_string()
        } else if db_type.is_datetime() {
            format!(
                "convert(datetime,'{}', 121)",
                datetime_value(value)?.format(DATETIME_FORMAT)
            )
        } else if db_type == SqlDbType::Bit {
            let bit = if value.to_bit()? { "1" } else { "0" };
            bit.to_string()
        } else if db_type == SqlDbType::Decimal {
            value.to_string()
        } else if db_type.is_character() {
            quote_literal(&value.to_string(), db_type.is_unicode())
        } else {
            escape_quotes(&value.to_string())
        };
        Ok(literal)
    }
}

fn datetime_value(value: &SqlValue) -> Result<NaiveDateTime> {
    match value {
        SqlValue::DateTime(dt) => Ok(*dt),
        SqlValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        // Only the local date/time portion survives; the offset is dropped.
        SqlValue::DateTimeOffset(dto) => Ok(dto.naive_local()),
        other => Err(TypeError::TypeMismatch {
            expected: "DATETIME",
            actual: other.type_name().to_string(),
        }
        .into()),
    }
}

/// The built-in declaration formatter.
///
/// Writes `declare @name Type`, then `(size)` or `(size,precision)` when a
/// size is set. `Text` and `NText` are always declared `nvarchar(max)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeclarationFormatter;

impl DeclarationFormatter for DefaultDeclarationFormatter {
    fn format_declaration(&self, parameter: &ParameterDescriptor) -> Result<String> {
        let name = parameter.sql_name();
        let db_type = parameter.db_type();
        if db_type.is_large_text() {
            return Ok(format!("declare {name} nvarchar(max)"));
        }

        let declaration = match (parameter.size(), parameter.precision()) {
            (0, _) => format!("declare {name} {db_type}"),
            (size, 0) => format!("declare {name} {db_type}({size})"),
            (size, precision) => format!("declare {name} {db_type}({size},{precision})"),
        };
        Ok(declaration)
    }
}

/// Value formatter that hides the values of selected parameters.
///
/// Names match without `@` and ignoring ASCII case. Every other parameter
/// is written by the wrapped formatter.
#[derive(Debug, Clone)]
pub struct MaskingValueFormatter<F = DefaultValueFormatter> {
    inner: F,
    masked: HashSet<String>,
    placeholder: String,
}

impl MaskingValueFormatter<DefaultValueFormatter> {
    /// Mask `names` and write everything else with the default formatter.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::wrapping(DefaultValueFormatter, names)
    }
}

impl<F: ValueFormatter> MaskingValueFormatter<F> {
    /// Default placeholder written for masked values.
    pub const DEFAULT_PLACEHOLDER: &'static str = "'***'";

    /// Mask `names` and write everything else with `inner`.
    pub fn wrapping<I, S>(inner: F, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let masked = names
            .into_iter()
            .map(|n| {
                let n = n.as_ref();
                n.strip_prefix('@').unwrap_or(n).to_ascii_lowercase()
            })
            .collect();
        Self {
            inner,
            masked,
            placeholder: Self::DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Set the text written for masked values.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    fn is_masked(&self, parameter: &ParameterDescriptor) -> bool {
        self.masked.contains(&parameter.bare_name().to_ascii_lowercase())
    }
}

impl<F: ValueFormatter> ValueFormatter for MaskingValueFormatter<F> {
    fn format_value(&self, parameter: &ParameterDescriptor) -> Result<String> {
        if self.is_masked(parameter) {
            Ok(self.placeholder.clone())
        } else {
            self.inner.format_value(parameter)
        }
    }
}

/// Renders parameterized commands as literal, pasteable SQL.
///
/// Cheap to clone; formatters are shared.
#[derive(Clone)]
pub struct DebugSqlRenderer {
    value_formatter: Arc<dyn ValueFormatter>,
    declaration_formatter: Arc<dyn DeclarationFormatter>,
}

impl DebugSqlRenderer {
    /// Create a renderer with the built-in formatters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value_formatter: Arc::new(DefaultValueFormatter),
            declaration_formatter: Arc::new(DefaultDeclarationFormatter),
        }
    }

    /// Replace the value formatter, keeping the declaration formatter.
    #[must_use]
    pub fn with_value_formatter(mut self, formatter: impl ValueFormatter + 'static) -> Self {
        self.value_formatter = Arc::new(formatter);
        self
    }

    /// Replace the declaration formatter, keeping the value formatter.
    #[must_use]
    pub fn with_declaration_formatter(
        mut self,
        formatter: impl DeclarationFormatter + 'static,
    ) -> Self {
        self.declaration_formatter = Arc::new(formatter);
        self
    }

    /// Write one parameter's value with the configured value formatter.
    pub fn format_value(&self, parameter: &ParameterDescriptor) -> Result<String> {
        self.value_formatter.format_value(parameter)
    }

    /// Write one parameter's declaration with the configured declaration
    /// formatter.
    pub fn format_declaration(&self, parameter: &ParameterDescriptor) -> Result<String> {
        self.declaration_formatter.format_declaration(parameter)
    }

    /// Render `command_text` with `parameters` as a literal statement.
    ///
    /// `None` entries in `parameters` are skipped. Parameters are written in
    /// the order given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for [`CommandKind::TableDirect`], and
    /// propagates formatter errors.
    pub fn render<'a, I, P>(
        &self,
        command_text: &str,
        command_kind: CommandKind,
        parameters: I,
    ) -> Result<String>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<&'a ParameterDescriptor>>,
    {
        let parameters = parameters
            .into_iter()
            .filter_map(Into::<Option<&'a ParameterDescriptor>>::into);
        match command_kind {
            CommandKind::StoredProcedure => self.render_procedure(command_text, parameters),
            CommandKind::Query => self.render_query(command_text, parameters),
            other => Err(Error::unsupported(format!(
                "cannot render command kind {other:?}"
            ))),
        }
    }

    /// Render with the command kind guessed by [`CommandKind::detect`].
    ///
    /// # Errors
    ///
    /// As [`render`](Self::render).
    pub fn render_detected<'a, I, P>(&self, command_text: &str, parameters: I) -> Result<String>
    where
        I: IntoIterator<Item = P>,
        P: Into<Option<&'a ParameterDescriptor>>,
    {
        self.render(command_text, CommandKind::detect(command_text), parameters)
    }

    /// Render a prepared command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the command has no text;
    /// otherwise as [`render`](Self::render).
    pub fn render_command(&self, command: &SqlCommand) -> Result<String> {
        let text = command
            .text()
            .ok_or_else(|| Error::invalid_argument("command text must not be None"))?;
        self.render(text, command.command_kind, &command.parameters)
    }

    fn render_procedure<'a>(
        &self,
        procedure: &str,
        parameters: impl Iterator<Item = &'a ParameterDescriptor>,
    ) -> Result<String> {
        let assignments = parameters
            .map(|p| Ok(format!("{} = {}", p.sql_name(), self.format_value(p)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("EXEC {procedure} {}", assignments.join(", ")))
    }

    fn render_query<'a>(
        &self,
        query: &str,
        parameters: impl Iterator<Item = &'a ParameterDescriptor>,
    ) -> Result<String> {
        let mut sql = String::new();
        for p in parameters {
            let declaration = self.format_declaration(p)?;
            let value = self.format_value(p)?;
            sql.push_str(&format!("{declaration} = {value}\n"));
        }
        sql.push_str(query);
        Ok(sql)
    }
}

impl Default for DebugSqlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DebugSqlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSqlRenderer").finish_non_exhaustive()
    }
}
