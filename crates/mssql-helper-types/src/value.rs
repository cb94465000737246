//! SQL value representation.

use std::fmt;

use bytes::Bytes;

use crate::db_type::SqlDbType;
use crate::error::TypeError;

/// A SQL value that can represent any SQL Server data type.
///
/// This enum provides a type-safe way to handle SQL values that may be
/// of various types, including NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value (BIT).
    Bool(bool),
    /// 8-bit unsigned integer (TINYINT).
    TinyInt(u8),
    /// 16-bit signed integer (SMALLINT).
    SmallInt(i16),
    /// 32-bit signed integer (INT).
    Int(i32),
    /// 64-bit signed integer (BIGINT).
    BigInt(i64),
    /// 32-bit floating point (REAL).
    Float(f32),
    /// 64-bit floating point (FLOAT).
    Double(f64),
    /// String value (CHAR, VARCHAR, NCHAR, NVARCHAR, TEXT, NTEXT).
    String(String),
    /// Binary value (BINARY, VARBINARY, IMAGE).
    Binary(Bytes),
    /// Decimal value (DECIMAL, NUMERIC, MONEY, SMALLMONEY).
    #[cfg(feature = "decimal")]
    Decimal(rust_decimal::Decimal),
    /// UUID value (UNIQUEIDENTIFIER).
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    /// Date value (DATE).
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    /// Time value (TIME).
    #[cfg(feature = "chrono")]
    Time(chrono::NaiveTime),
    /// DateTime value (DATETIME, DATETIME2, SMALLDATETIME).
    #[cfg(feature = "chrono")]
    DateTime(chrono::NaiveDateTime),
    /// DateTimeOffset value (DATETIMEOFFSET).
    #[cfg(feature = "chrono")]
    DateTimeOffset(chrono::DateTime<chrono::FixedOffset>),
    /// XML value (XML type).
    Xml(String),
}

impl SqlValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as an i64, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => Some(*v),
            Self::Int(v) => Some(*v as i64),
            Self::SmallInt(v) => Some(*v as i64),
            Self::TinyInt(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            Self::Xml(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Interpret the value as a BIT.
    ///
    /// Accepts booleans, the integers `0` and `1`, and the strings
    /// `true`/`false`/`1`/`0` in any case.
    pub fn to_bit(&self) -> Result<bool, TypeError> {
        let mismatch = || TypeError::TypeMismatch {
            expected: "BIT",
            actual: self.type_name().to_string(),
        };
        match self {
            Self::Bool(v) => Ok(*v),
            Self::Null => Err(TypeError::UnexpectedNull),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(mismatch()),
            },
            other => match other.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch()),
            },
        }
    }

    /// Produce a copy that shares no storage with `self`.
    ///
    /// `Clone` on [`Bytes`] only bumps a reference count; this copies the
    /// buffer so the result is independent of the original allocation.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Binary(v) => Self::Binary(Bytes::copy_from_slice(v)),
            Self::String(v) => Self::String(v.clone()),
            Self::Xml(v) => Self::Xml(v.clone()),
            other => other.clone(),
        }
    }

    /// The logical type a parameter takes when built from this value alone.
    ///
    /// NULL has no type of its own and defaults to `NVarChar`.
    #[must_use]
    pub fn natural_type(&self) -> SqlDbType {
        match self {
            Self::Null => SqlDbType::NVarChar,
            Self::Bool(_) => SqlDbType::Bit,
            Self::TinyInt(_) => SqlDbType::TinyInt,
            Self::SmallInt(_) => SqlDbType::SmallInt,
            Self::Int(_) => SqlDbType::Int,
            Self::BigInt(_) => SqlDbType::BigInt,
            Self::Float(_) => SqlDbType::Real,
            Self::Double(_) => SqlDbType::Float,
            Self::String(_) => SqlDbType::NVarChar,
            Self::Binary(_) => SqlDbType::VarBinary,
            #[cfg(feature = "decimal")]
            Self::Decimal(_) => SqlDbType::Decimal,
            #[cfg(feature = "uuid")]
            Self::Uuid(_) => SqlDbType::UniqueIdentifier,
            #[cfg(feature = "chrono")]
            Self::Date(_) => SqlDbType::Date,
            #[cfg(feature = "chrono")]
            Self::Time(_) => SqlDbType::Time,
            #[cfg(feature = "chrono")]
            Self::DateTime(_) => SqlDbType::DateTime,
            #[cfg(feature = "chrono")]
            Self::DateTimeOffset(_) => SqlDbType::DateTimeOffset,
            Self::Xml(_) => SqlDbType::Xml,
        }
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BIT",
            Self::TinyInt(_) => "TINYINT",
            Self::SmallInt(_) => "SMALLINT",
            Self::Int(_) => "INT",
            Self::BigInt(_) => "BIGINT",
            Self::Float(_) => "REAL",
            Self::Double(_) => "FLOAT",
            Self::String(_) => "NVARCHAR",
            Self::Binary(_) => "VARBINARY",
            #[cfg(feature = "decimal")]
            Self::Decimal(_) => "DECIMAL",
            #[cfg(feature = "uuid")]
            Self::Uuid(_) => "UNIQUEIDENTIFIER",
            #[cfg(feature = "chrono")]
            Self::Date(_) => "DATE",
            #[cfg(feature = "chrono")]
            Self::Time(_) => "TIME",
            #[cfg(feature = "chrono")]
            Self::DateTime(_) => "DATETIME2",
            #[cfg(feature = "chrono")]
            Self::DateTimeOffset(_) => "DATETIMEOFFSET",
            Self::Xml(_) => "XML",
        }
    }
}

impl Default for SqlValue {
    fn default() -> Self {
        Self::Null
    }
}

/// Invariant text form of the value.
///
/// NULL displays as the empty string; binary displays as `0x`-prefixed hex.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) | Self::Xml(v) => f.write_str(v),
            Self::Binary(v) => {
                f.write_str("0x")?;
                for byte in v.iter() {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            #[cfg(feature = "decimal")]
            Self::Decimal(v) => write!(f, "{v}"),
            #[cfg(feature = "uuid")]
            Self::Uuid(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            #[cfg(feature = "chrono")]
            Self::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            #[cfg(feature = "chrono")]
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            #[cfg(feature = "chrono")]
            Self::DateTimeOffset(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f %:z")),
        }
    }
}

macro_rules! impl_from {
    ($($(#[$meta:meta])* $ty:ty => $variant:ident;)*) => {
        $(
            $(#[$meta])*
            impl From<$ty> for SqlValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool;
    u8 => TinyInt;
    i16 => SmallInt;
    i32 => Int;
    i64 => BigInt;
    f32 => Float;
    f64 => Double;
    String => String;
    #[cfg(feature = "uuid")]
    uuid::Uuid => Uuid;
    #[cfg(feature = "decimal")]
    rust_decimal::Decimal => Decimal;
    #[cfg(feature = "chrono")]
    chrono::NaiveDate => Date;
    #[cfg(feature = "chrono")]
    chrono::NaiveTime => Time;
    #[cfg(feature = "chrono")]
    chrono::NaiveDateTime => DateTime;
    #[cfg(feature = "chrono")]
    chrono::DateTime<chrono::FixedOffset> => DateTimeOffset;
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

/// `None` maps to NULL.
impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
