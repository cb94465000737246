//! # mssql-helper-testing
//!
//! Test infrastructure for `mssql-helper`.
//!
//! Provides [`MockConnection`], a scripted in-memory connection that
//! implements both capability traits, so the cache, assignment and renderer
//! can be exercised without a server.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mssql_helper::{ProcedureParameterRow, SqlHelper};
//! use mssql_helper_testing::{MockConnection, MockResponse};
//!
//! #[tokio::test]
//! async fn test_add_order() {
//!     let conn = MockConnection::builder("Server=mock;Database=shop")
//!         .with_procedure(
//!             "dbo.AddOrder",
//!             vec![ProcedureParameterRow::new("@customer_id", "int", 4, 10, false)],
//!         )
//!         .with_response("dbo.AddOrder", MockResponse::affected(1))
//!         .build();
//!
//!     let helper = SqlHelper::new();
//!     let affected = helper
//!         .execute_procedure_non_query(Some(&conn), "dbo.AddOrder", &[&7i32])
//!         .await
//!         .unwrap();
//!     assert_eq!(affected, 1);
//!     assert_eq!(conn.discovery_count(), 1);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock_connection;

pub use mock_connection::{MockConnection, MockConnectionBuilder, MockResponse};
