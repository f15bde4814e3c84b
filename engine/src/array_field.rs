//! Set-semantics mutators for multi-valued fields stored as JSON arrays.

use crate::{
    error::{Error, Result},
    record::json_type_name,
    Record,
};
use serde_json::Value;

impl Record {
    /// Elements of an array field. Absent reads as empty.
    pub fn array_field(&self, key: &str) -> Result<Vec<Value>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(Error::NotAnArray {
                field: key.to_string(),
                found: json_type_name(other).to_string(),
            }),
        }
    }

    /// Append `element` unless an equal value is already present.
    pub fn add_to_array_field(&mut self, key: &str, element: impl Into<Value>) -> Result<()> {
        let element = element.into();
        let mut items = self.array_field(key)?;
        if !items.contains(&element) {
            items.push(element);
        }
        self.put(key, Value::Array(items));
        Ok(())
    }

    /// Remove the first element equal to `value`. No-op when the field is
    /// absent; removing the last element removes the field.
    pub fn remove_from_array_field(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if !self.contains(key) {
            return Ok(());
        }

        let value = value.into();
        let mut items = self.array_field(key)?;
        if let Some(position) = items.iter().position(|item| *item == value) {
            items.remove(position);
        }
        self.put(key, Value::Array(items));
        Ok(())
    }
}
