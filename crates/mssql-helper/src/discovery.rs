//! Stored procedure parameter discovery.
//!
//! Discovery asks the server to describe a procedure's parameters. The
//! helper does not talk to the server itself: a driver-backed connection
//! implements [`ParameterDiscovery`], typically by running
//! [`DESCRIBE_PROCEDURE_SQL`] and passing the rows to
//! [`descriptors_from_rows`].
//!
//! ## Shape of a discovered set
//!
//! ```text
//! @RETURN_VALUE  Int       ReturnValue   (always first)
//! @first_param   ...       Input | InputOutput
//! ...                                     (declaration order)
//! ```
//!
//! Every discovered value is NULL. Whether the leading return value is kept
//! is decided by the cache, not by the discovery capability.

use mssql_helper_types::SqlDbType;

use crate::error::Result;
use crate::param::{ParameterDescriptor, ParameterDirection, ParameterSet};

/// Name given to the synthetic return-value parameter.
pub const RETURN_VALUE_NAME: &str = "@RETURN_VALUE";

/// Catalog query describing the parameters of the procedure named by `@P1`.
///
/// Columns: `name`, `type_name`, `max_length`, `precision`, `is_output`,
/// ordered by declaration. A procedure without parameters yields no rows;
/// an unknown procedure also yields no rows, so implementations should check
/// `OBJECT_ID(@P1)` first and fail if it is NULL.
pub const DESCRIBE_PROCEDURE_SQL: &str = "\
SELECT p.name, TYPE_NAME(p.system_type_id) AS type_name, p.max_length, p.precision, p.is_output \
FROM sys.parameters AS p \
WHERE p.object_id = OBJECT_ID(@P1) \
ORDER BY p.parameter_id";

/// Capability to describe a stored procedure against a live connection.
///
/// Implemented by connection (or transaction) handles. The cache calls
/// [`derive_parameters`](Self::derive_parameters) only on a miss and
/// propagates its error unchanged.
#[async_trait::async_trait]
pub trait ParameterDiscovery: Send + Sync {
    /// Identity of the target database and credentials, usually the
    /// connection string. Cache entries are keyed by it.
    fn connection_identity(&self) -> &str;

    /// Describe `procedure_name`'s parameters in call order, with a leading
    /// [`ParameterDirection::ReturnValue`] parameter.
    async fn derive_parameters(&self, procedure_name: &str) -> Result<ParameterSet>;
}

/// One row of [`DESCRIBE_PROCEDURE_SQL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameterRow {
    /// Parameter name including `@`.
    pub name: String,
    /// Server type name, e.g. `nvarchar`.
    pub type_name: String,
    /// Storage length in bytes; `-1` for `(max)` types.
    pub max_length: i16,
    /// Numeric precision; 0 for non-numeric types.
    pub precision: u8,
    /// Declared `OUTPUT`.
    pub is_output: bool,
}

impl ProcedureParameterRow {
    /// Create a row.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        max_length: i16,
        precision: u8,
        is_output: bool,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            max_length,
            precision,
            is_output,
        }
    }

    fn to_descriptor(&self) -> Result<ParameterDescriptor> {
        let db_type = SqlDbType::from_type_name(&self.type_name)?;
        let direction = if self.is_output {
            // The catalog cannot tell OUTPUT from INPUT OUTPUT.
            ParameterDirection::InputOutput
        } else {
            ParameterDirection::Input
        };
        let size = match (self.max_length, db_type) {
            (len, _) if len <= 0 => 0,
            (len, SqlDbType::NChar | SqlDbType::NVarChar) => (len / 2) as u32,
            (
                len,
                SqlDbType::Char | SqlDbType::VarChar | SqlDbType::Binary | SqlDbType::VarBinary,
            ) => len as u32,
            _ => 0,
        };
        let precision = if db_type == SqlDbType::Decimal {
            self.precision
        } else {
            0
        };

        Ok(ParameterDescriptor::with_type(&self.name, db_type)?
            .with_direction(direction)
            .with_size(size)
            .with_precision(precision))
    }
}

/// Map catalog rows to a discovered parameter set.
///
/// The result starts with the return-value parameter, followed by one
/// parameter per row in row order, all with NULL values.
///
/// # Errors
///
/// Fails with a type error if a row names a type with no logical tag, or
/// an argument error on a blank or duplicate name.
pub fn descriptors_from_rows(rows: &[ProcedureParameterRow]) -> Result<ParameterSet> {
    let mut set = ParameterSet::with_capacity(rows.len() + 1);
    set.push(ParameterDescriptor::return_value(RETURN_VALUE_NAME))?;
    for row in rows {
        set.push(row.to_descriptor()?)?;
    }
    Ok(set)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rows() -> Vec<ProcedureParameterRow> {
        vec![
            ProcedureParameterRow::new("@customer_id", "int", 4, 10, false),
            ProcedureParameterRow::new("@name", "nvarchar", 100, 0, false),
            ProcedureParameterRow::new("@notes", "nvarchar", -1, 0, false),
            ProcedureParameterRow::new("@code", "varchar", 8, 0, false),
            ProcedureParameterRow::new("@amount", "numeric", 9, 18, false),
            ProcedureParameterRow::new("@new_id", "bigint", 8, 19, true),
        ]
    }

    #[test]
    fn test_descriptors_from_rows() {
        let set = descriptors_from_rows(&rows()).unwrap();
        let names: Vec<&str> = set.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "@RETURN_VALUE",
                "@customer_id",
                "@name",
                "@notes",
                "@code",
                "@amount",
                "@new_id"
            ]
        );

        let ret = &set.as_slice()[0];
        assert_eq!(ret.direction(), ParameterDirection::ReturnValue);
        assert_eq!(ret.db_type(), SqlDbType::Int);

        assert_eq!(set.get("customer_id").unwrap().size(), 0);
        assert_eq!(set.get("name").unwrap().size(), 50);
        assert_eq!(set.get("notes").unwrap().size(), 0);
        assert_eq!(set.get("code").unwrap().size(), 8);
        assert_eq!(set.get("amount").unwrap().db_type(), SqlDbType::Decimal);
        assert_eq!(set.get("amount").unwrap().precision(), 18);
        assert_eq!(
            set.get("new_id").unwrap().direction(),
            ParameterDirection::InputOutput
        );
        assert!(set.iter().all(|p| p.is_null()));
    }

    #[test]
    fn test_no_rows_yields_return_value_only() {
        let set = descriptors_from_rows(&[]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].name(), RETURN_VALUE_NAME);
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = descriptors_from_rows(&[ProcedureParameterRow::new(
            "@shape", "geometry", -1, 0, false,
        )])
        .unwrap_err();
        assert!(matches!(err, crate::Error::Type(_)));
    }
}
