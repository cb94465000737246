//! # mssql-helper-types
//!
//! SQL Server logical type tags, values and Rust conversions.
//!
//! This crate provides the value layer shared by the parameter cache and the
//! debug-SQL renderer: a tagged [`SqlValue`] union, the [`SqlDbType`] tag a
//! parameter is declared with, and the [`ToSql`] trait that turns Rust values
//! into both.
//!
//! ## Features
//!
//! - `chrono` (default): Enable date/time type support via chrono
//! - `uuid` (default): Enable UUID type support
//! - `decimal` (default): Enable decimal type support via rust_decimal
//!
//! ## Type Mappings
//!
//! | Rust Type | `SqlValue` | `SqlDbType` |
//! |-----------|------------|-------------|
//! | `bool` | `Bool` | `Bit` |
//! | `u8` | `TinyInt` | `TinyInt` |
//! | `i16` | `SmallInt` | `SmallInt` |
//! | `i32` | `Int` | `Int` |
//! | `i64` | `BigInt` | `BigInt` |
//! | `f32` | `Float` | `Real` |
//! | `f64` | `Double` | `Float` |
//! | `String` | `String` | `NVarChar` |
//! | `Vec<u8>` | `Binary` | `VarBinary` |
//! | `rust_decimal::Decimal` | `Decimal` | `Decimal` |
//! | `chrono::NaiveDate` | `Date` | `Date` |
//! | `chrono::NaiveTime` | `Time` | `Time` |
//! | `chrono::NaiveDateTime` | `DateTime` | `DateTime` |
//! | `uuid::Uuid` | `Uuid` | `UniqueIdentifier` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod db_type;
pub mod error;
pub mod to_sql;
pub mod value;

pub use db_type::SqlDbType;
pub use error::TypeError;
pub use to_sql::ToSql;
pub use value::SqlValue;
