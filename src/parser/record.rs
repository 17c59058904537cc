use csv::ByteRecord;

use crate::error::RowError;
use crate::schema::{ColumnType, TableSchema};

/// A parsed row ready for insertion, values in column order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub values: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

/// Parse a CSV record into a row for the given table schema
pub fn parse_record(record: &ByteRecord, schema: &TableSchema) -> Result<ParsedRow, RowError> {
    if record.len() != schema.columns.len() {
        return Err(RowError::FieldCount {
            expected: schema.columns.len(),
            found: record.len(),
        });
    }

    let mut values = Vec::with_capacity(schema.columns.len());

    for (col, raw) in schema.columns.iter().zip(record.iter()) {
        let field = std::str::from_utf8(raw).map_err(|_| RowError::InvalidUtf8)?;
        values.push(extract_value(field, col.name, col.col_type, col.nullable)?);
    }

    Ok(ParsedRow { values })
}

fn extract_value(
    field: &str,
    column: &'static str,
    col_type: ColumnType,
    nullable: bool,
) -> Result<SqlValue, RowError> {
    // Blank fields are NULL in the dump
    if field.trim().is_empty() {
        return if nullable {
            Ok(SqlValue::Null)
        } else {
            Err(RowError::MissingValue { column })
        };
    }

    match col_type {
        ColumnType::Integer => field
            .trim()
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| RowError::NotInteger {
                column,
                value: field.to_string(),
            }),
        ColumnType::Text => Ok(SqlValue::Text(field.to_string())),
        ColumnType::Varchar(max) => {
            let len = field.chars().count();
            if len > max {
                Err(RowError::TooLong { column, len, max })
            } else {
                Ok(SqlValue::Text(field.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{KEYWORD, TITLE};

    fn record(fields: &[&str]) -> ByteRecord {
        ByteRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_keyword_row() {
        let row = parse_record(&record(&["7", "character-name-in-title", "C6235"]), &KEYWORD).unwrap();
        assert_eq!(
            row.values,
            vec![
                SqlValue::Integer(7),
                SqlValue::Text("character-name-in-title".to_string()),
                SqlValue::Text("C6235".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_optional_field_is_null() {
        let row = parse_record(&record(&["1", "murder", ""]), &KEYWORD).unwrap();
        assert_eq!(row.values[2], SqlValue::Null);
    }

    #[test]
    fn test_blank_required_field_is_error() {
        let err = parse_record(&record(&["1", " ", "M636"]), &KEYWORD).unwrap_err();
        assert_eq!(err, RowError::MissingValue { column: "keyword" });
    }

    #[test]
    fn test_non_integer_id_is_error() {
        let err = parse_record(&record(&["x1", "murder", "M636"]), &KEYWORD).unwrap_err();
        assert!(matches!(err, RowError::NotInteger { column: "id", .. }));
    }

    #[test]
    fn test_field_count_mismatch() {
        let err = parse_record(&record(&["1", "murder", "M636", "extra"]), &KEYWORD).unwrap_err();
        assert_eq!(err, RowError::FieldCount { expected: 3, found: 4 });
    }

    #[test]
    fn test_varchar_limit_counts_characters() {
        // five characters, more than five bytes
        let ok = parse_record(&record(&["1", "café", "ÉÉÉÉÉ"]), &KEYWORD);
        assert!(ok.is_ok());

        let err = parse_record(&record(&["1", "café", "ABCDEF"]), &KEYWORD).unwrap_err();
        assert_eq!(
            err,
            RowError::TooLong {
                column: "phonetic_code",
                len: 6,
                max: 5
            }
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut rec = ByteRecord::new();
        rec.push_field(b"1");
        rec.push_field(&[0xff, 0xfe]);
        rec.push_field(b"");
        assert_eq!(parse_record(&rec, &KEYWORD).unwrap_err(), RowError::InvalidUtf8);
    }

    #[test]
    fn test_text_keeps_delimiters_and_quotes() {
        let fields = [
            "42", "Say \"Hi\", Bob", "", "1", "2001", "", "", "", "", "", "", "",
        ];
        let row = parse_record(&record(&fields), &TITLE).unwrap();
        assert_eq!(row.values[1], SqlValue::Text("Say \"Hi\", Bob".to_string()));
        assert_eq!(row.values[4], SqlValue::Integer(2001));
    }
}
