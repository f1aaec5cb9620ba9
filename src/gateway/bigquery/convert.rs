//! Result-set and frame conversions
//!
//! Turns BigQuery query responses into polars DataFrames column-by-column,
//! and frames into JSON row objects plus an inferred table schema for
//! inserts. Conversions stay columnar where possible.

use gcp_bigquery_client::model::field_type::FieldType;
use gcp_bigquery_client::model::query_response::{QueryResponse, ResultSet};
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema;
use polars::prelude::*;
use serde_json::{Map, Value};

use super::BigQueryDelegateError;
use crate::gateway::error::{GatewayError, Result};

/// Per-column accumulator typed from the response schema
enum ColumnBuffer {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
}

fn buffer_for(field_type: &FieldType) -> ColumnBuffer {
    match field_type {
        FieldType::Integer | FieldType::Int64 => ColumnBuffer::Int(Vec::new()),
        FieldType::Float | FieldType::Float64 => ColumnBuffer::Float(Vec::new()),
        FieldType::Boolean | FieldType::Bool => ColumnBuffer::Bool(Vec::new()),
        // timestamps, dates, numerics etc. stay as their string form
        _ => ColumnBuffer::Str(Vec::new()),
    }
}

/// Convert a query response into a frame, typed from the response schema
pub(super) fn result_set_to_frame(response: QueryResponse) -> Result<DataFrame> {
    let fields: Vec<TableFieldSchema> = response
        .schema
        .as_ref()
        .and_then(|schema| schema.fields.clone())
        .unwrap_or_default();

    if fields.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut buffers: Vec<(String, ColumnBuffer)> = fields
        .iter()
        .map(|field| (field.name.clone(), buffer_for(&field.r#type)))
        .collect();

    let mut result_set = ResultSet::new_from_query_response(response);
    while result_set.next_row() {
        for (name, buffer) in buffers.iter_mut() {
            match buffer {
                ColumnBuffer::Int(values) => {
                    values.push(result_set.get_i64_by_name(name).map_err(GatewayError::delegated)?)
                }
                ColumnBuffer::Float(values) => {
                    values.push(result_set.get_f64_by_name(name).map_err(GatewayError::delegated)?)
                }
                ColumnBuffer::Bool(values) => {
                    values.push(result_set.get_bool_by_name(name).map_err(GatewayError::delegated)?)
                }
                ColumnBuffer::Str(values) => values.push(
                    result_set
                        .get_string_by_name(name)
                        .map_err(GatewayError::delegated)?,
                ),
            }
        }
    }

    let columns: Vec<Column> = buffers
        .into_iter()
        .map(|(name, buffer)| {
            let series = match buffer {
                ColumnBuffer::Int(values) => Series::new(name.as_str().into(), values),
                ColumnBuffer::Float(values) => Series::new(name.as_str().into(), values),
                ColumnBuffer::Bool(values) => Series::new(name.as_str().into(), values),
                ColumnBuffer::Str(values) => Series::new(name.as_str().into(), values),
            };
            series.into_column()
        })
        .collect();

    DataFrame::new(columns).map_err(GatewayError::delegated)
}

/// Reorder result columns; a name missing from the result is a failure
pub(super) fn apply_col_order(frame: DataFrame, order: &[String]) -> Result<DataFrame> {
    for name in order {
        if !frame.get_column_names_str().iter().any(|c| *c == name.as_str()) {
            return Err(BigQueryDelegateError::InvalidColumnOrder(name.clone()).into());
        }
    }
    frame
        .select(order.iter().map(|s| s.as_str()))
        .map_err(GatewayError::delegated)
}

/// Move the index column to the front of the frame
///
/// polars has no row index, so "use this column as the index" becomes
/// "put this column first".
pub(super) fn move_index_col_first(frame: DataFrame, index_col: &str) -> Result<DataFrame> {
    let names: Vec<String> = frame
        .get_column_names_str()
        .iter()
        .map(|s| s.to_string())
        .collect();

    if !names.iter().any(|n| n.as_str() == index_col) {
        return Err(BigQueryDelegateError::InvalidIndexColumn(index_col.to_string()).into());
    }

    let mut order = vec![index_col.to_string()];
    order.extend(names.into_iter().filter(|n| n.as_str() != index_col));
    frame
        .select(order.iter().map(|s| s.as_str()))
        .map_err(GatewayError::delegated)
}

/// Encode each frame row as a JSON object for the insert-all endpoint
pub(super) fn frame_to_rows(frame: &DataFrame) -> Result<Vec<Value>> {
    let columns = frame.get_columns();
    let mut rows = Vec::with_capacity(frame.height());

    for row_index in 0..frame.height() {
        let mut object = Map::new();
        for column in columns {
            let series = column.as_materialized_series();
            let value = series.get(row_index).map_err(GatewayError::delegated)?;
            object.insert(series.name().to_string(), any_value_to_json(value));
        }
        rows.push(Value::Object(object));
    }

    Ok(rows)
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Bool(v),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        AnyValue::String(v) => Value::String(v.to_string()),
        AnyValue::StringOwned(v) => Value::String(v.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(value: f64) -> Value {
    // NaN / infinity have no JSON representation
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Infer a BigQuery table schema from the frame's dtypes
pub(super) fn frame_schema(frame: &DataFrame) -> TableSchema {
    let fields = frame
        .get_columns()
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            match column.dtype() {
                DataType::Boolean => TableFieldSchema::bool(name),
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64 => TableFieldSchema::integer(name),
                DataType::Float32 | DataType::Float64 => TableFieldSchema::float(name),
                DataType::Datetime(_, _) => TableFieldSchema::timestamp(name),
                DataType::Date => TableFieldSchema::date(name),
                _ => TableFieldSchema::string(name),
            }
        })
        .collect();

    TableSchema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn sample_frame() -> DataFrame {
        df! {
            "name" => ["a", "b"],
            "count" => [1i64, 2],
            "score" => [0.5f64, 1.5]
        }
        .unwrap()
    }

    #[test]
    fn test_apply_col_order_reorders() {
        let frame = apply_col_order(
            sample_frame(),
            &["score".to_string(), "name".to_string(), "count".to_string()],
        )
        .unwrap();

        let names: Vec<&str> = frame.get_column_names_str();
        assert_eq!(names, vec!["score", "name", "count"]);
    }

    #[test]
    fn test_apply_col_order_rejects_unknown_column() {
        let err = apply_col_order(sample_frame(), &["missing".to_string()]).err();
        assert!(err.is_some());
    }

    #[test]
    fn test_move_index_col_first() {
        let frame = move_index_col_first(sample_frame(), "count").unwrap();
        let names: Vec<&str> = frame.get_column_names_str();
        assert_eq!(names, vec!["count", "name", "score"]);
    }

    #[test]
    fn test_move_index_col_rejects_unknown_column() {
        assert!(move_index_col_first(sample_frame(), "missing").is_err());
    }

    #[test]
    fn test_frame_to_rows_encodes_values() {
        let rows = frame_to_rows(&sample_frame()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], Value::String("a".into()));
        assert_eq!(rows[0]["count"], Value::from(1i64));
        assert_eq!(rows[1]["score"], Value::from(1.5f64));
    }

    #[test]
    fn test_frame_to_rows_nan_becomes_null() {
        let frame = df! { "x" => [f64::NAN] }.unwrap();
        let rows = frame_to_rows(&frame).unwrap();
        assert_eq!(rows[0]["x"], Value::Null);
    }

    #[test]
    fn test_frame_schema_infers_field_types() {
        let schema = frame_schema(&sample_frame());
        let fields = schema.fields.unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "name");
        assert!(matches!(fields[0].r#type, FieldType::String));
        assert!(matches!(fields[1].r#type, FieldType::Integer));
        assert!(matches!(fields[2].r#type, FieldType::Float));
    }
}
