//! Arrow frame conversions
//!
//! A frame is an Arrow `RecordBatch`. This module turns frame cells into
//! [`Value`]s, maps Arrow types onto SQL column types and merges the batches
//! DuckDB streams back into a single frame.

use crate::error::{Error, Result};
use crate::types::{Row, Value};
use arrow::array::{Array, AsArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Decimal128Type, Decimal256Type, Float16Type, Float32Type,
    Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, SchemaRef, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

/// Merge batches into one frame, keeping the schema when there are none
pub fn concat_frames(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    match batches {
        [] => Ok(RecordBatch::new_empty(schema.clone())),
        [single] => Ok(single.clone()),
        _ => Ok(concat_batches(schema, batches)?),
    }
}

/// Column names of a frame, in order
pub fn column_names(frame: &RecordBatch) -> Vec<String> {
    frame
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Convert every row of a frame into [`Value`] cells
pub fn frame_rows(frame: &RecordBatch) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(frame.num_rows());
    for i in 0..frame.num_rows() {
        let row = frame
            .columns()
            .iter()
            .map(|column| array_value(column.as_ref(), i))
            .collect::<Result<Row>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read one cell of an Arrow array
///
/// Types without a dedicated [`Value`] variant fall back to Arrow's display
/// formatting.
pub fn array_value(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Boolean(array.as_boolean().value(row)),
        DataType::Int8 => Value::Integer(array.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => Value::Integer(array.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => Value::Integer(array.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => Value::Integer(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(array.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => Value::Integer(array.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => Value::Integer(array.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or_else(|_| Value::Text(v.to_string()), Value::Integer)
        }
        DataType::Float16 => {
            Value::Real(array.as_primitive::<Float16Type>().value(row).to_f64())
        }
        DataType::Float32 => Value::Real(array.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => Value::Real(array.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => Value::Text(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(array.as_string::<i64>().value(row).to_string()),
        DataType::Binary => Value::Blob(array.as_binary::<i32>().value(row).to_vec()),
        DataType::LargeBinary => Value::Blob(array.as_binary::<i64>().value(row).to_vec()),
        DataType::Date32 => array
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map_or(Value::Null, Value::Date),
        DataType::Date64 => array
            .as_primitive::<Date64Type>()
            .value_as_date(row)
            .map_or(Value::Null, Value::Date),
        DataType::Timestamp(unit, None) => {
            let ts = match unit {
                TimeUnit::Second => array
                    .as_primitive::<TimestampSecondType>()
                    .value_as_datetime(row),
                TimeUnit::Millisecond => array
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => array
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => array
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            ts.map_or(Value::Null, Value::Timestamp)
        }
        DataType::Decimal128(_, scale) => {
            decimal_value(array.as_primitive::<Decimal128Type>().value(row), *scale)
        }
        DataType::Decimal256(_, scale) => {
            match array.as_primitive::<Decimal256Type>().value(row).to_i128() {
                Some(raw) => decimal_value(raw, *scale),
                None => Value::Text(array_value_to_string(array, row)?),
            }
        }
        _ => Value::Text(array_value_to_string(array, row)?),
    };

    Ok(value)
}

/// Unscaled decimal to a cell: whole numbers that fit stay integers
#[allow(clippy::cast_precision_loss)]
fn decimal_value(raw: i128, scale: i8) -> Value {
    if scale == 0 {
        if let Ok(i) = i64::try_from(raw) {
            return Value::Integer(i);
        }
    }
    Value::Real(raw as f64 / 10_f64.powi(i32::from(scale)))
}

/// Widest DECIMAL DuckDB can store
const MAX_DECIMAL_PRECISION: u8 = 38;

/// SQL column type for an Arrow data type
pub fn sql_type(data_type: &DataType) -> Result<String> {
    let sql = match data_type {
        DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale)
            if *precision <= MAX_DECIMAL_PRECISION
                && *scale >= 0
                && scale.unsigned_abs() <= *precision =>
        {
            return Ok(format!("DECIMAL({precision},{scale})"));
        }
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 => "TINYINT",
        DataType::Int16 => "SMALLINT",
        DataType::Int32 => "INTEGER",
        DataType::Int64 => "BIGINT",
        DataType::UInt8 => "UTINYINT",
        DataType::UInt16 => "USMALLINT",
        DataType::UInt32 => "UINTEGER",
        DataType::UInt64 => "UBIGINT",
        DataType::Float16 | DataType::Float32 => "FLOAT",
        DataType::Float64 => "DOUBLE",
        // An all-null column carries no type information
        DataType::Null | DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR",
        DataType::Binary | DataType::LargeBinary => "BLOB",
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Timestamp(_, None) => "TIMESTAMP",
        other => return Err(Error::unsupported_type(other)),
    };
    Ok(sql.to_string())
}
