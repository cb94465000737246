//! # mssql-helper
//!
//! Stored procedure helpers for SQL Server: a parameter metadata cache,
//! positional and named value assignment, and a debug-SQL renderer.
//!
//! The crate does not open connections. A driver-backed connection plugs in
//! through two capability traits:
//!
//! - [`ParameterDiscovery`] describes a procedure's parameters
//! - [`CommandExecutor`] runs a prepared [`SqlCommand`]
//!
//! ## Flow
//!
//! ```text
//! SqlHelper::execute_procedure_non_query(conn, "dbo.AddOrder", &[&7, &"rush"])
//!   -> ParameterCache      hit: deep copy | miss: conn.derive_parameters()
//!   -> assign_parameter_values   values paired with parameters by position
//!   -> DebugSqlRenderer    optional, when statement logging is on
//!   -> conn.execute_non_query(&mut command)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mssql_helper::{HelperConfig, SqlHelper};
//!
//! let helper = SqlHelper::with_config(HelperConfig::new().log_statements(true));
//!
//! let params = helper
//!     .procedure_parameters(Some(&conn), "dbo.AddOrder", false)
//!     .await?;
//! for p in &params {
//!     println!("{} {}", p.name(), p.db_type());
//! }
//!
//! let affected = helper
//!     .execute_procedure_non_query(Some(&conn), "dbo.AddOrder", &[&7i32, &"rush"])
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assign;
pub mod command;
pub mod config;
pub mod debug_sql;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod helper;
pub mod param;
pub mod param_cache;
pub mod to_params;

// Re-export commonly used types
pub use assign::{assign_named_values, assign_parameter_values};
pub use command::{CommandKind, SqlCommand};
pub use config::HelperConfig;
pub use debug_sql::{
    DebugSqlRenderer, DeclarationFormatter, DefaultDeclarationFormatter, DefaultValueFormatter,
    MaskingValueFormatter, ValueFormatter,
};
pub use discovery::{ParameterDiscovery, ProcedureParameterRow, descriptors_from_rows};
pub use error::{Error, Result};
pub use executor::CommandExecutor;
pub use helper::SqlHelper;
pub use mssql_helper_types::{SqlDbType, SqlValue, ToSql, TypeError};
pub use param::{ParameterDescriptor, ParameterDirection, ParameterSet};
pub use param_cache::{ParameterCache, ParameterCacheConfig};
pub use to_params::{NamedParam, ToParams};
