//! Command parameter descriptors.
//!
//! A [`ParameterDescriptor`] describes one bindable parameter: its name,
//! direction, logical type, size/precision and current value. A
//! [`ParameterSet`] is an ordered collection of descriptors with unique
//! names; order is significant because values are assigned by position.
//!
//! Cloning a descriptor or a set always yields storage that is fully
//! independent of the source, including binary values. The parameter cache
//! relies on this to hand out copies that callers may freely mutate.

use mssql_helper_types::{SqlDbType, SqlValue, ToSql};

use crate::error::{Error, Result};

/// Direction of a parameter relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterDirection {
    /// Value flows to the server only.
    #[default]
    Input,
    /// Value flows back from the server only.
    Output,
    /// Value flows both ways.
    InputOutput,
    /// The procedure's integer return code.
    ReturnValue,
}

impl ParameterDirection {
    /// Check if the server writes this parameter.
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output | Self::InputOutput | Self::ReturnValue)
    }
}

/// One bindable command parameter.
#[derive(Debug, PartialEq)]
pub struct ParameterDescriptor {
    name: String,
    direction: ParameterDirection,
    db_type: SqlDbType,
    size: u32,
    precision: u8,
    value: SqlValue,
}

impl ParameterDescriptor {
    /// Create a parameter whose type is inferred from its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is blank.
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Result<Self> {
        let value = value.into();
        let db_type = value.natural_type();
        Ok(Self::with_type(name, db_type)?.with_value(value))
    }

    /// Create a parameter of an explicit type with a NULL value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is blank.
    pub fn with_type(name: impl Into<String>, db_type: SqlDbType) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            direction: ParameterDirection::Input,
            db_type,
            size: 0,
            precision: 0,
            value: SqlValue::Null,
        })
    }

    /// Create an `Int` return-value parameter.
    ///
    /// `name` is used as given; a blank name falls back to `@RETURN_VALUE`.
    #[must_use]
    pub fn return_value(name: &str) -> Self {
        let name = if validate_name(name).is_ok() {
            name
        } else {
            "@RETURN_VALUE"
        };
        Self {
            name: name.to_string(),
            direction: ParameterDirection::ReturnValue,
            db_type: SqlDbType::Int,
            size: 0,
            precision: 0,
            value: SqlValue::Null,
        }
    }

    /// Create a parameter from a value implementing [`ToSql`].
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is blank or the value cannot be converted.
    pub fn from_value<T: ToSql + ?Sized>(name: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self::with_type(name, value.sql_type())?.with_value(value.to_sql()?))
    }

    /// Set the value.
    ///
    /// The value is not checked against the declared type; use
    /// [`SqlDbType::check`] or the assignment functions for that.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the direction.
    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the size (0 means unspecified).
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the precision (0 means unspecified).
    #[must_use]
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// The name exactly as supplied.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without a leading `@`.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('@').unwrap_or(&self.name)
    }

    /// The name with exactly one leading `@`.
    #[must_use]
    pub fn sql_name(&self) -> String {
        format!("@{}", self.bare_name())
    }

    /// The direction.
    #[must_use]
    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    /// The logical type.
    #[must_use]
    pub fn db_type(&self) -> SqlDbType {
        self.db_type
    }

    /// The size (0 means unspecified).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The precision (0 means unspecified).
    #[must_use]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    /// Replace the current value without checking it against the type.
    pub fn set_value(&mut self, value: impl Into<SqlValue>) {
        self.value = value.into();
    }

    /// Check if the current value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// Field-by-field copy; the value is deep-copied so binary buffers are never
/// shared between the original and the clone.
impl Clone for ParameterDescriptor {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            direction: self.direction,
            db_type: self.db_type,
            size: self.size,
            precision: self.precision,
            value: self.value.deep_clone(),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.strip_prefix('@').unwrap_or(name).trim().is_empty() {
        return Err(Error::invalid_argument("parameter name must not be empty"));
    }
    Ok(())
}

/// An ordered set of parameters with unique names.
///
/// Names are compared without their `@` prefix and ignoring ASCII case,
/// matching how the server resolves parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<ParameterDescriptor>,
}

impl ParameterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Create a set from descriptors in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] on a duplicate name.
    pub fn from_vec(params: Vec<ParameterDescriptor>) -> Result<Self> {
        let mut set = Self::with_capacity(params.len());
        for param in params {
            set.push(param)?;
        }
        Ok(set)
    }

    /// Create an empty set with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            params: Vec::with_capacity(capacity),
        }
    }

    /// Append a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a parameter with the same name
    /// is already present.
    pub fn push(&mut self, param: ParameterDescriptor) -> Result<()> {
        if self.get(param.bare_name()).is_some() {
            return Err(Error::invalid_argument(format!(
                "duplicate parameter name: {}",
                param.sql_name()
            )));
        }
        self.params.push(param);
        Ok(())
    }

    /// Look up a parameter by name, with or without `@`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        let bare = name.strip_prefix('@').unwrap_or(name);
        self.params
            .iter()
            .find(|p| p.bare_name().eq_ignore_ascii_case(bare))
    }

    /// Look up a parameter by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParameterDescriptor> {
        let bare = name.strip_prefix('@').unwrap_or(name);
        self.params
            .iter_mut()
            .find(|p| p.bare_name().eq_ignore_ascii_case(bare))
    }

    /// Remove the leading parameter if it is a return value.
    ///
    /// Returns the removed parameter.
    pub fn remove_return_value(&mut self) -> Option<ParameterDescriptor> {
        match self.params.first() {
            Some(first) if first.direction() == ParameterDirection::ReturnValue => {
                Some(self.params.remove(0))
            }
            _ => None,
        }
    }

    /// Get the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the parameters in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterDescriptor> {
        self.params.iter()
    }

    /// Iterate mutably over the parameters in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ParameterDescriptor> {
        self.params.iter_mut()
    }

    /// View the parameters as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ParameterDescriptor] {
        &self.params
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a ParameterDescriptor;
    type IntoIter = std::slice::Iter<'a, ParameterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

impl IntoIterator for ParameterSet {
    type Item = ParameterDescriptor;
    type IntoIter = std::vec::IntoIter<ParameterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_infers_type() {
        let p = ParameterDescriptor::new("value1", 0i32).unwrap();
        assert_eq!(p.db_type(), SqlDbType::Int);
        assert_eq!(p.direction(), ParameterDirection::Input);
        assert_eq!(p.value(), &SqlValue::Int(0));

        let p = ParameterDescriptor::new("@value2", "hello").unwrap();
        assert_eq!(p.db_type(), SqlDbType::NVarChar);
        assert_eq!(p.bare_name(), "value2");
        assert_eq!(p.sql_name(), "@value2");
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(ParameterDescriptor::new("", 1i32).unwrap_err().is_invalid_argument());
        assert!(ParameterDescriptor::new("@", 1i32).unwrap_err().is_invalid_argument());
        assert!(
            ParameterDescriptor::with_type("  ", SqlDbType::Int)
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = ParameterDescriptor::new("data", vec![1u8, 2, 3]).unwrap();
        let mut copy = original.clone();
        assert_eq!(original, copy);
        assert_ne!(
            original.value().as_bytes().unwrap().as_ptr(),
            copy.value().as_bytes().unwrap().as_ptr()
        );

        copy.set_value(vec![9u8]);
        assert_eq!(original.value().as_bytes().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_set_rejects_duplicate_names() {
        let mut set = ParameterSet::new();
        set.push(ParameterDescriptor::new("@Id", 1i32).unwrap()).unwrap();
        let err = set
            .push(ParameterDescriptor::new("id", 2i32).unwrap())
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_return_value_only_when_leading() {
        let mut set = ParameterSet::from_vec(vec![
            ParameterDescriptor::with_type("@RETURN_VALUE", SqlDbType::Int)
                .unwrap()
                .with_direction(ParameterDirection::ReturnValue),
            ParameterDescriptor::with_type("@id", SqlDbType::Int).unwrap(),
        ])
        .unwrap();

        let removed = set.remove_return_value().unwrap();
        assert_eq!(removed.name(), "@RETURN_VALUE");
        assert_eq!(set.len(), 1);
        assert!(set.remove_return_value().is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut set = ParameterSet::from_vec(vec![
            ParameterDescriptor::new("@Name", "a").unwrap(),
        ])
        .unwrap();
        assert!(set.get("name").is_some());
        assert!(set.get("@NAME").is_some());
        set.get_mut("name").unwrap().set_value("b");
        assert_eq!(set.get("name").unwrap().value(), &SqlValue::from("b"));
    }
}
