//! Row-oriented query results

use crate::error::{Error, Result};
use crate::frame;
use crate::types::{JsonValue, Row, Value};
use arrow::record_batch::RecordBatch;

/// Rows of values under named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Build a result set from column names and rows
    ///
    /// Every row must hold exactly one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::invalid_input(format!(
                "row {i} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Convert an Arrow frame into rows
    pub fn from_frame(frame: &RecordBatch) -> Result<Self> {
        Ok(Self {
            columns: frame::column_names(frame),
            rows: frame::frame_rows(frame)?,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, or `None` if there is no such column
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.rows.iter().map(|row| row.get(idx)).collect()
    }

    /// One JSON object per row, keyed by column name
    pub fn to_json_records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let obj = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                JsonValue::Object(obj)
            })
            .collect()
    }
}

/// What [`DbHandler::execute`](crate::DbHandler::execute) produced
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Rows from a read statement
    Rows(ResultSet),
    /// Rows changed by a write statement
    Affected(usize),
}

impl QueryOutcome {
    /// The result set, if this was a read
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            QueryOutcome::Affected(_) => None,
        }
    }

    /// The changed-row count, if this was a write
    pub fn affected(&self) -> Option<usize> {
        match self {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Affected(n) => Some(*n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int32Array, StringArray};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn fixture() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::from("b")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2)],
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(err.to_string().contains("row 1 has 1 values, expected 2"));
    }

    #[test]
    fn test_counts() {
        let rs = fixture();
        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs.column_count(), 2);
        assert!(!rs.is_empty());
        assert!(ResultSet::default().is_empty());
    }

    #[test]
    fn test_column() {
        let rs = fixture();
        assert_eq!(
            rs.column("name").unwrap(),
            vec![&Value::from("a"), &Value::from("b")]
        );
        assert!(rs.column("missing").is_none());
    }

    #[test]
    fn test_to_json_records() {
        assert_eq!(
            fixture().to_json_records(),
            vec![json!({"id": 1, "name": "a"}), json!({"id": 2, "name": "b"})]
        );
    }

    #[test]
    fn test_from_frame() {
        let frame = RecordBatch::try_from_iter([
            ("id", Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef),
            ("name", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
        ])
        .unwrap();

        assert_eq!(ResultSet::from_frame(&frame).unwrap(), fixture());
    }

    #[test]
    fn test_outcome_accessors() {
        assert_eq!(QueryOutcome::Affected(3).affected(), Some(3));
        assert!(QueryOutcome::Affected(3).into_rows().is_none());
        assert_eq!(
            QueryOutcome::Rows(fixture()).into_rows().unwrap().row_count(),
            2
        );
    }
}
