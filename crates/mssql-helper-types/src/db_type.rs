//! Logical SQL Server type tags.
//!
//! [`SqlDbType`] names the type a parameter is declared with, independently
//! of the value currently bound to it. The set mirrors the provider-level
//! type enumeration rather than the TDS wire type bytes: `INT` and a
//! nullable `INTN` column are both [`SqlDbType::Int`] here.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::value::SqlValue;

/// Logical SQL Server data type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SqlDbType {
    /// 64-bit signed integer.
    BigInt,
    /// Fixed-length binary.
    Binary,
    /// Boolean bit.
    Bit,
    /// Fixed-length non-Unicode character.
    Char,
    /// Legacy 8-byte datetime.
    DateTime,
    /// Exact numeric (`DECIMAL`/`NUMERIC`).
    Decimal,
    /// 64-bit floating point.
    Float,
    /// Legacy large binary.
    Image,
    /// 32-bit signed integer.
    Int,
    /// 8-byte money.
    Money,
    /// Fixed-length Unicode character.
    NChar,
    /// Legacy large Unicode text.
    NText,
    /// Variable-length Unicode character.
    NVarChar,
    /// 32-bit floating point.
    Real,
    /// GUID.
    UniqueIdentifier,
    /// 4-byte datetime with minute precision.
    SmallDateTime,
    /// 16-bit signed integer.
    SmallInt,
    /// 4-byte money.
    SmallMoney,
    /// Legacy large non-Unicode text.
    Text,
    /// Row version.
    Timestamp,
    /// 8-bit unsigned integer.
    TinyInt,
    /// Variable-length binary.
    VarBinary,
    /// Variable-length non-Unicode character.
    VarChar,
    /// `sql_variant`.
    Variant,
    /// XML document or fragment.
    Xml,
    /// CLR user-defined type.
    Udt,
    /// Table-valued parameter.
    Structured,
    /// Date without time.
    Date,
    /// Time of day.
    Time,
    /// Date and time with variable fractional precision.
    DateTime2,
    /// Date and time with an offset from UTC.
    DateTimeOffset,
}

impl SqlDbType {
    /// The tag name, as used in rendered declarations.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BigInt => "BigInt",
            Self::Binary => "Binary",
            Self::Bit => "Bit",
            Self::Char => "Char",
            Self::DateTime => "DateTime",
            Self::Decimal => "Decimal",
            Self::Float => "Float",
            Self::Image => "Image",
            Self::Int => "Int",
            Self::Money => "Money",
            Self::NChar => "NChar",
            Self::NText => "NText",
            Self::NVarChar => "NVarChar",
            Self::Real => "Real",
            Self::UniqueIdentifier => "UniqueIdentifier",
            Self::SmallDateTime => "SmallDateTime",
            Self::SmallInt => "SmallInt",
            Self::SmallMoney => "SmallMoney",
            Self::Text => "Text",
            Self::Timestamp => "Timestamp",
            Self::TinyInt => "TinyInt",
            Self::VarBinary => "VarBinary",
            Self::VarChar => "VarChar",
            Self::Variant => "Variant",
            Self::Xml => "Xml",
            Self::Udt => "Udt",
            Self::Structured => "Structured",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime2 => "DateTime2",
            Self::DateTimeOffset => "DateTimeOffset",
        }
    }

    /// Parse a server-side type name such as `nvarchar` or `datetime2`.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Aliases the server reports (`numeric`, `sql_variant`, `rowversion`)
    /// map onto the tag the provider uses for them.
    pub fn from_type_name(name: &str) -> Result<Self, TypeError> {
        let normalized = name.trim().to_ascii_lowercase();
        let ty = match normalized.as_str() {
            "bigint" => Self::BigInt,
            "binary" => Self::Binary,
            "bit" => Self::Bit,
            "char" => Self::Char,
            "datetime" => Self::DateTime,
            "decimal" | "numeric" => Self::Decimal,
            "float" => Self::Float,
            "image" => Self::Image,
            "int" => Self::Int,
            "money" => Self::Money,
            "nchar" => Self::NChar,
            "ntext" => Self::NText,
            "nvarchar" | "sysname" => Self::NVarChar,
            "real" => Self::Real,
            "uniqueidentifier" => Self::UniqueIdentifier,
            "smalldatetime" => Self::SmallDateTime,
            "smallint" => Self::SmallInt,
            "smallmoney" => Self::SmallMoney,
            "text" => Self::Text,
            "timestamp" | "rowversion" => Self::Timestamp,
            "tinyint" => Self::TinyInt,
            "varbinary" => Self::VarBinary,
            "varchar" => Self::VarChar,
            "sql_variant" | "variant" => Self::Variant,
            "xml" => Self::Xml,
            "udt" => Self::Udt,
            "structured" | "table type" => Self::Structured,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime2" => Self::DateTime2,
            "datetimeoffset" => Self::DateTimeOffset,
            _ => return Err(TypeError::UnknownType(name.to_string())),
        };
        Ok(ty)
    }

    /// Check if this is a Unicode character type.
    #[must_use]
    pub const fn is_unicode(&self) -> bool {
        matches!(self, Self::NChar | Self::NVarChar | Self::NText)
    }

    /// Check if values of this type are written as quoted string literals.
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::VarChar
                | Self::Text
                | Self::NChar
                | Self::NVarChar
                | Self::NText
                | Self::Xml
                | Self::Time
        )
    }

    /// Check if this is a legacy large text type (`TEXT`/`NTEXT`).
    #[must_use]
    pub const fn is_large_text(&self) -> bool {
        matches!(self, Self::Text | Self::NText)
    }

    /// Check if this type carries a calendar date.
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(
            self,
            Self::Date
                | Self::DateTime
                | Self::DateTime2
                | Self::DateTimeOffset
                | Self::SmallDateTime
        )
    }

    /// Check if this is a binary type.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary | Self::Image)
    }

    /// Check if this is an exact or approximate numeric type.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::TinyInt
                | Self::SmallInt
                | Self::Int
                | Self::BigInt
                | Self::Real
                | Self::Float
                | Self::Decimal
                | Self::Money
                | Self::SmallMoney
        )
    }

    /// Check if `value` can be bound to a parameter declared with this type.
    ///
    /// NULL is accepted by every type. Strings are accepted only by the
    /// character types, `Time`, `Bit` (as `true`/`false`/`1`/`0`) and
    /// `Variant`.
    #[must_use]
    pub fn accepts(&self, value: &SqlValue) -> bool {
        if value.is_null() {
            return true;
        }
        let source = value.natural_type();
        match self {
            Self::Variant => true,
            Self::Bit => value.to_bit().is_ok(),
            Self::TinyInt => fits(value, 0, i64::from(u8::MAX)),
            Self::SmallInt => fits(value, i64::from(i16::MIN), i64::from(i16::MAX)),
            Self::Int => fits(value, i64::from(i32::MIN), i64::from(i32::MAX)),
            Self::BigInt => value.as_i64().is_some(),
            Self::Real | Self::Float | Self::Decimal | Self::Money | Self::SmallMoney => {
                source.is_numeric()
            }
            Self::Char
            | Self::VarChar
            | Self::Text
            | Self::NChar
            | Self::NVarChar
            | Self::NText
            | Self::Xml => matches!(value, SqlValue::String(_) | SqlValue::Xml(_)),
            Self::Time => source == Self::Time || matches!(value, SqlValue::String(_)),
            Self::Date
            | Self::DateTime
            | Self::DateTime2
            | Self::DateTimeOffset
            | Self::SmallDateTime => {
                matches!(source, Self::Date | Self::DateTime | Self::DateTimeOffset)
            }
            Self::Binary | Self::VarBinary | Self::Image | Self::Timestamp | Self::Udt => {
                value.as_bytes().is_some()
            }
            Self::UniqueIdentifier => source == Self::UniqueIdentifier,
            Self::Structured => false,
        }
    }

    /// Check that `value` can be bound to this type.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::TypeMismatch`] if [`accepts`](Self::accepts)
    /// rejects the value.
    pub fn check(&self, value: &SqlValue) -> Result<(), TypeError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(TypeError::TypeMismatch {
                expected: self.name(),
                actual: value.type_name().to_string(),
            })
        }
    }
}

fn fits(value: &SqlValue, min: i64, max: i64) -> bool {
    value.as_i64().is_some_and(|v| (min..=max).contains(&v))
}

impl fmt::Display for SqlDbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDbType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_type_name(s)
    }
}
