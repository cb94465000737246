//! Named parameter values.
//!
//! [`NamedParam`] pairs a bare parameter name with a value; [`ToParams`]
//! lets a struct describe itself as a list of them so its fields can be
//! assigned by name into a discovered [`ParameterSet`].
//!
//! ```rust,ignore
//! struct NewOrder {
//!     customer_id: i32,
//!     note: Option<String>,
//! }
//!
//! impl ToParams for NewOrder {
//!     fn to_params(&self) -> Result<Vec<NamedParam>, TypeError> {
//!         Ok(vec![
//!             NamedParam::from_value("customer_id", &self.customer_id)?,
//!             NamedParam::from_value("note", &self.note)?,
//!         ])
//!     }
//! }
//!
//! let mut params = cache.try_get(conn_str, "dbo.AddOrder").unwrap_or_default();
//! order.assign_to(&mut params)?;
//! ```

use mssql_helper_types::{SqlValue, ToSql, TypeError};

use crate::assign::assign_named_values;
use crate::error::Result;
use crate::param::ParameterSet;

/// A value addressed to a parameter by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    /// Parameter name (without @ prefix).
    pub name: String,
    /// Parameter value.
    pub value: SqlValue,
}

impl NamedParam {
    /// Create a new named parameter.
    pub fn new<S: Into<String>>(name: S, value: SqlValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Create a named parameter from a value implementing ToSql.
    pub fn from_value<S: Into<String>, T: ToSql + ?Sized>(
        name: S,
        value: &T,
    ) -> std::result::Result<Self, TypeError> {
        Ok(Self {
            name: name.into(),
            value: value.to_sql()?,
        })
    }
}

/// Trait for types that can be converted to named parameter values.
pub trait ToParams {
    /// Convert this struct to a vector of named parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any field value cannot be converted to a SQL value.
    fn to_params(&self) -> std::result::Result<Vec<NamedParam>, TypeError>;

    /// Assign this struct's values into `set` by parameter name.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion fails or `set` holds a parameter
    /// without a usable name.
    fn assign_to(&self, set: &mut ParameterSet) -> Result<()> {
        let named = self.to_params()?;
        assign_named_values(set, &named)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mssql_helper_types::SqlDbType;

    use super::*;
    use crate::param::ParameterDescriptor;

    struct NewCustomer {
        name: String,
        credit_limit: Option<i64>,
    }

    impl ToParams for NewCustomer {
        fn to_params(&self) -> std::result::Result<Vec<NamedParam>, TypeError> {
            Ok(vec![
                NamedParam::from_value("name", &self.name)?,
                NamedParam::from_value("credit_limit", &self.credit_limit)?,
            ])
        }
    }

    #[test]
    fn test_named_param_creation() {
        let param = NamedParam::from_value("test", &42i32).unwrap();
        assert_eq!(param.name, "test");
        assert!(matches!(param.value, SqlValue::Int(42)));
    }

    #[test]
    fn test_assign_to_by_name() {
        let mut set = ParameterSet::from_vec(vec![
            ParameterDescriptor::with_type("@credit_limit", SqlDbType::BigInt).unwrap(),
            ParameterDescriptor::with_type("@name", SqlDbType::NVarChar)
                .unwrap()
                .with_size(50),
        ])
        .unwrap();

        let customer = NewCustomer {
            name: "Alice".to_string(),
            credit_limit: None,
        };
        customer.assign_to(&mut set).unwrap();

        assert_eq!(set.get("name").unwrap().value(), &SqlValue::from("Alice"));
        assert!(set.get("credit_limit").unwrap().is_null());
    }
}
