//! Value assignment into parameter sets.
//!
//! Positional assignment is the contract every execute path relies on:
//! the i-th value goes to the i-th parameter, and the counts must match
//! exactly. Named assignment is the looser variant used when values come
//! from a record whose fields are named after the parameters.

use mssql_helper_types::{SqlValue, ToSql};

use crate::error::{Error, Result};
use crate::param::ParameterSet;
use crate::to_params::NamedParam;

/// Assign `values` to the parameters of `set` by position.
///
/// All values are converted and checked against the declared parameter
/// types before any parameter is touched, so on error `set` is left
/// unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the number of values differs from
/// the number of parameters, a conversion error from [`ToSql`], or
/// [`TypeError::TypeMismatch`](mssql_helper_types::TypeError::TypeMismatch)
/// if a value does not fit its parameter's type.
pub fn assign_parameter_values(set: &mut ParameterSet, values: &[&dyn ToSql]) -> Result<()> {
    if set.len() != values.len() {
        return Err(Error::invalid_argument(format!(
            "parameter count ({}) does not match parameter value count ({})",
            set.len(),
            values.len()
        )));
    }

    let converted = values
        .iter()
        .map(|v| v.to_sql())
        .collect::<std::result::Result<Vec<SqlValue>, _>>()?;
    for (param, value) in set.iter().zip(&converted) {
        param.db_type().check(value)?;
    }

    for (param, value) in set.iter_mut().zip(converted) {
        param.set_value(value);
    }
    Ok(())
}

/// Assign values to the parameters of `set` by name.
///
/// Names are matched without the `@` prefix and ignoring ASCII case.
/// Parameters with no matching entry keep their current value; entries that
/// match no parameter are ignored. When a name appears more than once, the
/// last entry wins.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if an entry has a blank name, or
/// [`TypeError::TypeMismatch`](mssql_helper_types::TypeError::TypeMismatch)
/// if a matched value does not fit its parameter's type. Entries are
/// checked before any parameter is touched.
pub fn assign_named_values(set: &mut ParameterSet, values: &[NamedParam]) -> Result<()> {
    if let Some(blank) = values
        .iter()
        .find(|n| n.name.strip_prefix('@').unwrap_or(&n.name).trim().is_empty())
    {
        return Err(Error::invalid_argument(format!(
            "named value {:?} has no parameter name",
            blank.name
        )));
    }

    for named in values {
        if let Some(param) = set.get(&named.name) {
            param.db_type().check(&named.value)?;
        }
    }

    for named in values {
        if let Some(param) = set.get_mut(&named.name) {
            param.set_value(named.value.deep_clone());
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mssql_helper_types::{SqlDbType, TypeError};

    use super::*;
    use crate::param::ParameterDescriptor;

    fn order_params() -> ParameterSet {
        ParameterSet::from_vec(vec![
            ParameterDescriptor::with_type("@customer_id", SqlDbType::Int).unwrap(),
            ParameterDescriptor::with_type("@note", SqlDbType::NVarChar).unwrap(),
            ParameterDescriptor::with_type("@total", SqlDbType::Decimal).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_positional_assignment_preserves_order() {
        let mut set = order_params();
        let total = rust_decimal::Decimal::new(1999, 2);
        assign_parameter_values(&mut set, &[&7i32, &"rush", &total]).unwrap();

        let values: Vec<&SqlValue> = set.iter().map(|p| p.value()).collect();
        assert_eq!(
            values,
            vec![
                &SqlValue::Int(7),
                &SqlValue::from("rush"),
                &SqlValue::Decimal(total)
            ]
        );
    }

    #[test]
    fn test_count_mismatch_is_rejected_without_mutation() {
        let mut set = order_params();
        let err = assign_parameter_values(&mut set, &[&7i32, &"rush"]).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(set.iter().all(|p| p.is_null()));

        let err = assign_parameter_values(&mut set, &[&1i32, &2i32, &3i32, &4i32]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_empty_set_accepts_empty_values() {
        let mut set = ParameterSet::new();
        assign_parameter_values(&mut set, &[]).unwrap();
    }

    #[test]
    fn test_null_values_assign_null() {
        let mut set = order_params();
        let none: Option<i32> = None;
        assign_parameter_values(&mut set, &[&none, &SqlValue::Null, &none]).unwrap();
        assert!(set.iter().all(|p| p.is_null()));
    }

    #[test]
    fn test_named_assignment() {
        let mut set = order_params();
        set.get_mut("note").unwrap().set_value("keep me");

        assign_named_values(
            &mut set,
            &[
                NamedParam::new("CUSTOMER_ID", SqlValue::Int(1)),
                NamedParam::new("@total", SqlValue::Int(5)),
                NamedParam::new("unknown", SqlValue::Int(9)),
                NamedParam::new("customer_id", SqlValue::Int(2)),
            ],
        )
        .unwrap();

        assert_eq!(set.get("customer_id").unwrap().value(), &SqlValue::Int(2));
        assert_eq!(set.get("note").unwrap().value(), &SqlValue::from("keep me"));
        assert_eq!(set.get("total").unwrap().value(), &SqlValue::Int(5));
    }

    #[test]
    fn test_named_assignment_rejects_blank_name() {
        let mut set = order_params();
        let err = assign_named_values(
            &mut set,
            &[
                NamedParam::new("customer_id", SqlValue::Int(1)),
                NamedParam::new("@", SqlValue::Int(2)),
            ],
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(set.get("customer_id").unwrap().is_null());
    }

    #[test]
    fn test_string_into_numeric_parameter_is_rejected() {
        let mut set = order_params();
        let err =
            assign_parameter_values(&mut set, &[&"1; drop table x", &"rush", &1i32]).unwrap_err();
        assert!(matches!(err, Error::Type(TypeError::TypeMismatch { expected: "Int", .. })));
        assert!(set.iter().all(|p| p.is_null()));
    }

    #[test]
    fn test_string_into_datetime_parameter_is_rejected() {
        let mut set = ParameterSet::from_vec(vec![
            ParameterDescriptor::with_type("@flag", SqlDbType::Bit).unwrap(),
            ParameterDescriptor::with_type("@since", SqlDbType::DateTime).unwrap(),
        ])
        .unwrap();

        let err = assign_parameter_values(&mut set, &[&"true", &"yesterday"]).unwrap_err();
        assert!(matches!(err, Error::Type(TypeError::TypeMismatch { .. })));
        assert!(set.iter().all(|p| p.is_null()));

        let none: Option<i32> = None;
        assign_parameter_values(&mut set, &[&"true", &none]).unwrap();
        assert_eq!(set.get("flag").unwrap().value(), &SqlValue::from("true"));
    }

    #[test]
    fn test_named_assignment_checks_types_before_mutation() {
        let mut set = order_params();
        let err = assign_named_values(
            &mut set,
            &[
                NamedParam::new("note", SqlValue::from("ok")),
                NamedParam::new("@total", SqlValue::from("0 or 1=1")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Type(TypeError::TypeMismatch { .. })));
        assert!(set.iter().all(|p| p.is_null()));

        // Unmatched names are never checked.
        assign_named_values(&mut set, &[NamedParam::new("other", SqlValue::from("x"))]).unwrap();
    }
}
