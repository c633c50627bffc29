use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;

/// One city entry returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CityRecord {
    pub city: String,
    pub description: String,
    pub history: String,
    pub famous_for: String,
}

impl CityRecord {
    /// Case-insensitive substring match over name, description and famous-for.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.city, &self.description, &self.famous_for]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response is not valid JSON: {source}{hint}")]
    Json {
        #[source]
        source: serde_json::Error,
        hint: &'static str,
    },

    #[error("expected a JSON array of cities, got {0}")]
    NotAnArray(&'static str),

    #[error("city record does not match the expected shape: {0}")]
    Record(#[source] serde_json::Error),

    #[error("record {index} has an empty city name")]
    EmptyCity { index: usize },

    #[error("city `{city}` appears more than once")]
    DuplicateCity { city: String },
}

/// Parse a model reply into city records, checking every record against the
/// `CityRecord` shape.
///
/// There is no attempt to recover JSON embedded in prose or code fences.
pub fn parse_city_records(text: &str) -> Result<Vec<CityRecord>, SchemaError> {
    let records: Vec<CityRecord> = serde_json::from_str(text).map_err(|err| match err.classify() {
        Category::Data => match serde_json::from_str::<Value>(text) {
            Ok(value) if !value.is_array() => SchemaError::NotAnArray(json_kind(&value)),
            _ => SchemaError::Record(err),
        },
        _ => SchemaError::Json {
            source: err,
            hint: if looks_fenced(text) {
                " (reply is wrapped in a markdown code fence)"
            } else {
                ""
            },
        },
    })?;

    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        if record.city.trim().is_empty() {
            return Err(SchemaError::EmptyCity { index });
        }
        if !seen.insert(record.city.as_str()) {
            return Err(SchemaError::DuplicateCity {
                city: record.city.clone(),
            });
        }
    }

    Ok(records)
}

fn looks_fenced(text: &str) -> bool {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n.*```\s*$")
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn json_kind(value: &Value) -> &'static str {
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
    use super::*;
    use crate::cli::explore::seed::SEED_CITIES_JSON;

    #[test]
    fn seed_reply_parses_into_ten_cities() {
        let records = parse_city_records(SEED_CITIES_JSON).unwrap();

        assert_eq!(records.len(), 10);
        assert_eq!(records[0].city, "Mumbai");
        assert_eq!(records[9].city, "Akola");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let records = parse_city_records(
            r#"[{"city":"A","description":"d","history":"h","famous_for":"f","population":5}]"#,
        )
        .unwrap();

        assert_eq!(
            records,
            vec![CityRecord {
                city: "A".into(),
                description: "d".into(),
                history: "h".into(),
                famous_for: "f".into(),
            }]
        );
    }

    #[test]
    fn fenced_reply_is_rejected_with_hint() {
        let fenced = format!("```json\n{}\n```", SEED_CITIES_JSON);
        let err = parse_city_records(&fenced).unwrap_err();

        assert!(matches!(err, SchemaError::Json { .. }));
        assert!(err.to_string().contains("code fence"));
    }

    #[test]
    fn prose_reply_is_rejected_without_hint() {
        let err = parse_city_records("Here are some cities!").unwrap_err();
        assert!(matches!(err, SchemaError::Json { hint: "", .. }));
    }

    #[test]
    fn object_instead_of_array_is_rejected() {
        let err = parse_city_records(r#"{"cities": []}"#).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnArray("an object")));
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let err = parse_city_records(
            r#"[{"city":"A","description":"d","history":"h","famous_for":"f"},
                {"city":"B","description":"d","famous_for":"f"}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::Record(_)));
        assert!(err.to_string().contains("missing field `history`"), "{}", err);
    }

    #[test]
    fn non_string_field_is_rejected() {
        let err = parse_city_records(
            r#"[{"city":"A","description":"d","history":"h","famous_for":["x","y"]}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::Record(_)));
        assert!(err.to_string().contains("expected a string"), "{}", err);
    }

    #[test]
    fn null_field_is_rejected() {
        let err = parse_city_records(
            r#"[{"city":"A","description":null,"history":"h","famous_for":"f"}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::Record(_)));
    }

    #[test]
    fn array_of_non_objects_is_rejected() {
        let err = parse_city_records(r#"["Mumbai", "Pune"]"#).unwrap_err();
        assert!(matches!(err, SchemaError::Record(_)));
    }

    #[test]
    fn truncated_reply_is_a_json_error() {
        let err = parse_city_records(&SEED_CITIES_JSON[..200]).unwrap_err();
        assert!(matches!(err, SchemaError::Json { hint: "", .. }));
    }

    #[test]
    fn blank_and_duplicate_cities_are_rejected() {
        let blank = parse_city_records(
            r#"[{"city":"  ","description":"d","history":"h","famous_for":"f"}]"#,
        );
        assert!(matches!(blank, Err(SchemaError::EmptyCity { index: 0 })));

        let duplicate = parse_city_records(
            r#"[{"city":"A","description":"d","history":"h","famous_for":"f"},
                {"city":"A","description":"e","history":"i","famous_for":"g"}]"#,
        );
        assert!(matches!(duplicate, Err(SchemaError::DuplicateCity { .. })));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_city_records("[]").unwrap().is_empty());
    }

    #[test]
    fn matching_is_case_insensitive_and_skips_history() {
        let record = CityRecord {
            city: "Nagpur".into(),
            description: "The Orange City".into(),
            history: "Founded by Bakht Buland Shah".into(),
            famous_for: "Oranges".into(),
        };

        assert!(record.matches("orange"));
        assert!(record.matches("nag"));
        assert!(!record.matches("bakht"));
    }
}
