use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::records::StudentRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    NotACollection { found: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotACollection { found } => {
                write!(f, "expected a list or map of students, found {found}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes the value stored at the students path.
///
/// The store hands back either an array (sequential keys, with `null` for
/// deleted slots) or an object keyed by record id. Both decode to records in
/// store order. Missing text fields decode as empty; a record that still does
/// not match the expected shape is skipped with a warning.
pub fn decode_students(value: &Value) -> Result<Vec<StudentRecord>, DecodeError> {
    let records: Vec<StudentRecord> = match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .filter_map(|(index, item)| decode_record(&index.to_string(), item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, item)| !item.is_null())
            .filter_map(|(key, item)| decode_record(key, item))
            .collect(),
        other => {
            return Err(DecodeError::NotACollection {
                found: kind_of(other),
            });
        }
    };

    for record in &records {
        if !record.grades.has_standard_periods() {
            tracing::warn!(
                id = %record.id,
                periods = record.grades.len(),
                "student grades do not cover the standard periods"
            );
        }
    }
    Ok(records)
}

fn decode_record(key: &str, item: &Value) -> Option<StudentRecord> {
    match StudentRecord::deserialize(item) {
        Ok(mut record) => {
            if record.id.is_empty() {
                record.id = key.to_string();
            }
            Some(record)
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "skipping malformed student");
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ezra() -> Value {
        json!({
            "id": "1",
            "name": "Ezra",
            "batch": 3,
            "stack": "MERN",
            "grades": {
                "w0102": 10, "w0304": 20, "week0506": 0,
                "week0708": -5, "week0910": 15, "week1112": 5
            },
            "certificates": { "english": "B2" }
        })
    }

    #[test]
    fn decodes_sparse_arrays() {
        let value = json!([null, ezra(), null]);
        let records = decode_students(&value).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Ezra");
        assert_eq!(record.batch, 3);
        assert_eq!(record.phone, "");
        assert_eq!(record.profiles.github, "");
        assert_eq!(record.certificates.english(), Some("B2"));
        assert_eq!(record.certificates.scrum(), None);
        assert!(record.grades.has_standard_periods());
    }

    #[test]
    fn decodes_keyed_objects_in_key_order() {
        let mut krys = ezra();
        krys["id"] = json!("2");
        krys["name"] = json!("Krys");
        krys["certificates"] = json!({ "cyberSecurity": "CEH" });
        let value = json!({ "-Nb": krys, "-Na": ezra() });
        let records = decode_students(&value).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Ezra", "Krys"]);
        assert_eq!(records[1].certificates.cyber_security(), Some("CEH"));
    }

    #[test]
    fn missing_grades_still_decode() {
        let mut record = ezra();
        record.as_object_mut().unwrap().remove("grades");
        let records = decode_students(&json!([record])).unwrap();
        assert!(records[0].grades.is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let mut bad = ezra();
        bad["id"] = json!("2");
        bad["batch"] = json!("three");
        let records = decode_students(&json!([ezra(), bad])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ezra");
    }

    #[test]
    fn missing_text_fields_decode_empty() {
        let value = json!([
            { "id": "1", "name": "Ezra", "batch": 3, "stack": "MERN" },
            { "id": "2", "name": "Krys", "batch": 4 }
        ]);
        let records = decode_students(&value).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Krys");
        assert_eq!(records[1].stack, "");
    }

    #[test]
    fn missing_id_falls_back_to_the_key() {
        let mut record = ezra();
        record.as_object_mut().unwrap().remove("id");
        let records = decode_students(&json!({ "-Nc": record })).unwrap();
        assert_eq!(records[0].id, "-Nc");
    }

    #[test]
    fn scalars_are_not_collections() {
        assert_eq!(
            decode_students(&json!("students")).unwrap_err(),
            DecodeError::NotACollection { found: "a string" }
        );
    }
}
