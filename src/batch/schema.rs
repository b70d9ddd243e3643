//! Stream schema types
//!
//! A schema is the contract between a producer and every consumer of its
//! stream: an ordered list of named, typed fields. Schemas are validated
//! once at stream creation; a malformed schema never reaches the registry.

use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

/// Cell type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer
    Int64,
    /// 64-bit float
    Float64,
    /// UTF-8 string
    Utf8,
    /// Boolean
    Bool,
}

impl DataType {
    /// Wire tag for the binary batch codec
    pub(crate) fn tag(self) -> u8 {
        match self {
            DataType::Int64 => 0x01,
            DataType::Float64 => 0x02,
            DataType::Utf8 => 0x03,
            DataType::Bool => 0x04,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(DataType::Int64),
            0x02 => Some(DataType::Float64),
            0x03 => Some(DataType::Utf8),
            0x04 => Some(DataType::Bool),
            _ => None,
        }
    }
}

/// A single named, typed column declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name, unique within the schema
    pub name: String,
    /// Cell type
    pub data_type: DataType,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered field list describing every batch in a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Declared fields, in column order
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a schema from a field list
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Number of columns
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Validate the schema
    ///
    /// A valid schema has at least one field, no empty names, and no
    /// duplicate names.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(FlightError::InvalidSchema("schema has no fields".into()));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(FlightError::InvalidSchema("field with empty name".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(FlightError::InvalidSchema(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }

        Ok(())
    }

    /// Serialize to the JSON form used by the schema wire frame
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| FlightError::InvalidSchema(e.to_string()))
    }

    /// Parse the JSON form received in a schema wire frame
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| FlightError::InvalidSchema(e.to_string()))
    }
}
