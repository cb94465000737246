//! Trait for converting Rust types to SQL values.

use crate::db_type::SqlDbType;
use crate::error::TypeError;
use crate::value::SqlValue;

/// Trait for types that can be converted to SQL values.
///
/// This trait is implemented for common Rust types to enable
/// type-safe parameter binding and positional value assignment.
/// Implementors must be `Sync`.
pub trait ToSql: Sync {
    /// Convert this value to a SQL value.
    fn to_sql(&self) -> Result<SqlValue, TypeError>;

    /// Get the logical SQL type this value is declared as.
    fn sql_type(&self) -> SqlDbType;
}

macro_rules! impl_to_sql {
    ($($ty:ty => $variant:ident, $db_type:ident;)*) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> Result<SqlValue, TypeError> {
                    Ok(SqlValue::$variant(*self))
                }

                fn sql_type(&self) -> SqlDbType {
                    SqlDbType::$db_type
                }
            }
        )*
    };
}

impl_to_sql! {
    bool => Bool, Bit;
    u8 => TinyInt, TinyInt;
    i16 => SmallInt, SmallInt;
    i32 => Int, Int;
    i64 => BigInt, BigInt;
    f32 => Float, Real;
    f64 => Double, Float;
}

impl ToSql for str {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::String(self.to_owned()))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::NVarChar
    }
}

impl ToSql for String {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::String(self.clone()))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::NVarChar
    }
}

impl ToSql for [u8] {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Binary(bytes::Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::VarBinary
    }
}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Binary(bytes::Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::VarBinary
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(self.deep_clone())
    }

    fn sql_type(&self) -> SqlDbType {
        self.natural_type()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        match self {
            Some(v) => v.to_sql(),
            None => Ok(SqlValue::Null),
        }
    }

    fn sql_type(&self) -> SqlDbType {
        match self {
            Some(v) => v.sql_type(),
            None => SqlValue::Null.natural_type(),
        }
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        (*self).to_sql()
    }

    fn sql_type(&self) -> SqlDbType {
        (*self).sql_type()
    }
}

#[cfg(feature = "uuid")]
impl ToSql for uuid::Uuid {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Uuid(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::UniqueIdentifier
    }
}

#[cfg(feature = "decimal")]
impl ToSql for rust_decimal::Decimal {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Decimal(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::Decimal
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDate {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Date(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::Date
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveTime {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Time(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::Time
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDateTime {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::DateTime(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::DateTime
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::DateTime<chrono::FixedOffset> {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::DateTimeOffset(*self))
    }

    fn sql_type(&self) -> SqlDbType {
        SqlDbType::DateTimeOffset
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_value_slices_are_send() {
        fn assert_send<T: Send + ?Sized>() {}
        assert_send::<[&dyn ToSql]>();
    }

    #[test]
    fn test_to_sql_i32() {
        let value: i32 = 42;
        assert_eq!(value.to_sql().unwrap(), SqlValue::Int(42));
        assert_eq!(value.sql_type(), SqlDbType::Int);
    }

    #[test]
    fn test_to_sql_string() {
        let value = "hello".to_string();
        assert_eq!(
            value.to_sql().unwrap(),
            SqlValue::String("hello".to_string())
        );
        assert_eq!(value.sql_type(), SqlDbType::NVarChar);
    }

    #[test]
    fn test_to_sql_option() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.to_sql().unwrap(), SqlValue::Int(42));

        let none: Option<i32> = None;
        assert_eq!(none.to_sql().unwrap(), SqlValue::Null);
    }

    #[cfg(feature = "decimal")]
    #[test]
    fn test_to_sql_decimal() {
        let value = rust_decimal::Decimal::new(123456, 3);
        assert_eq!(value.to_sql().unwrap(), SqlValue::Decimal(value));
        assert_eq!(value.sql_type(), SqlDbType::Decimal);
    }
}
