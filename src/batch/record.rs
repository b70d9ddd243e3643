//! Record batch construction and validation

use crate::error::{FlightError, Result};

use super::schema::{DataType, Schema};

/// Column data, one variant per [`DataType`]
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// 64-bit signed integers
    Int64(Vec<i64>),
    /// 64-bit floats
    Float64(Vec<f64>),
    /// UTF-8 strings
    Utf8(Vec<String>),
    /// Booleans
    Bool(Vec<bool>),
}

impl Column {
    /// Number of cells in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Utf8(v) => v.len(),
            Column::Bool(v) => v.len(),
        }
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The column's cell type
    pub fn data_type(&self) -> DataType {
        match self {
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::Utf8(_) => DataType::Utf8,
            Column::Bool(_) => DataType::Bool,
        }
    }
}

/// A schema-conforming chunk of columnar data
///
/// Construction goes through [`RecordBatch::try_new`], which checks the
/// columns against the schema, so a batch in flight is always well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    schema: Schema,
    columns: Vec<Column>,
    num_rows: usize,
}

impl RecordBatch {
    /// Build a batch, validating the columns against the schema
    ///
    /// Fails with `InvalidSchema` if the column count, any column type, or
    /// any column length disagrees with the declaration.
    pub fn try_new(schema: Schema, columns: Vec<Column>) -> Result<Self> {
        if columns.len() != schema.num_fields() {
            return Err(FlightError::InvalidSchema(format!(
                "schema declares {} columns, batch has {}",
                schema.num_fields(),
                columns.len()
            )));
        }

        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        for (field, column) in schema.fields.iter().zip(&columns) {
            if column.data_type() != field.data_type {
                return Err(FlightError::InvalidSchema(format!(
                    "column {} declared {:?}, got {:?}",
                    field.name,
                    field.data_type,
                    column.data_type()
                )));
            }
            if column.len() != num_rows {
                return Err(FlightError::InvalidSchema(format!(
                    "column {} has {} rows, expected {}",
                    field.name,
                    column.len(),
                    num_rows
                )));
            }
        }

        Ok(Self {
            schema,
            columns,
            num_rows,
        })
    }

    /// The batch's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Column data, in schema order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column by index
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Number of rows in the batch
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns in the batch
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::schema::Field;

    fn test_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("term", DataType::Utf8),
        ])
    }

    #[test]
    fn test_valid_batch() {
        let batch = RecordBatch::try_new(
            test_schema(),
            vec![
                Column::Int64(vec![1, 2, 3]),
                Column::Utf8(vec!["a".into(), "b".into(), "c".into()]),
            ],
        )
        .unwrap();

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_column_count_mismatch() {
        let result = RecordBatch::try_new(test_schema(), vec![Column::Int64(vec![1])]);
        assert!(matches!(result, Err(FlightError::InvalidSchema(_))));
    }

    #[test]
    fn test_column_type_mismatch() {
        let result = RecordBatch::try_new(
            test_schema(),
            vec![Column::Bool(vec![true]), Column::Utf8(vec!["a".into()])],
        );
        assert!(matches!(result, Err(FlightError::InvalidSchema(_))));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = RecordBatch::try_new(
            test_schema(),
            vec![
                Column::Int64(vec![1, 2]),
                Column::Utf8(vec!["only-one".into()]),
            ],
        );
        assert!(matches!(result, Err(FlightError::InvalidSchema(_))));
    }
}
