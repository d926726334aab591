//! Decoding catalog rows into typed records
//!
//! Drivers hand back rows whose column names depend on the catalog view that
//! produced them. Each dialect declares a raw struct with `serde` renames for
//! those columns and decodes rows with [`from_row`]. The [`lenient`] helpers
//! absorb the representation differences between drivers (numbers sent as
//! text, flags sent as `"YES"`, NULL where an empty string was expected).

use crate::{Result, Row, SqlmuxError};
use serde::de::DeserializeOwned;

/// Decode one row into `T` by column name.
pub fn from_row<T: DeserializeOwned>(row: &Row) -> Result<T> {
    let object = serde_json::Value::Object(row.to_json_object());
    serde_json::from_value(object).map_err(|e| SqlmuxError::Decode(e.to_string()))
}

/// Decode every row into `T`, failing on the first malformed row.
pub fn from_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>> {
    rows.iter().map(from_row).collect()
}

pub mod lenient {
    //! `deserialize_with` helpers for loosely typed catalog columns

    use serde::{Deserialize, Deserializer};
    use serde_json::Value as Json;

    fn scalar_text(value: Json) -> Option<String> {
        match value {
            Json::Null => None,
            Json::String(s) => Some(s),
            Json::Bool(b) => Some(b.to_string()),
            Json::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Any scalar as text; NULL becomes the empty string.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Json::deserialize(deserializer)?).unwrap_or_default())
    }

    /// Any scalar as text; NULL stays `None`.
    pub fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Json::deserialize(deserializer)?))
    }

    /// Unsigned integer sent as a number or as numeric text.
    pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(match Json::deserialize(deserializer)? {
            Json::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Json::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        })
    }

    /// Signed integer sent as a number or as numeric text.
    pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(match Json::deserialize(deserializer)? {
            Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Json::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }

    /// Boolean sent as a bool, a number, or text such as `YES`/`t`/`1`.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Json::deserialize(deserializer)? {
            Json::Bool(b) => b,
            Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Json::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "t" | "true" | "y" | "yes"
            ),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(rename = "Name", deserialize_with = "lenient::text")]
        name: String,
        #[serde(rename = "Rows", default, deserialize_with = "lenient::opt_u64")]
        rows: Option<u64>,
        #[serde(rename = "Compiled", deserialize_with = "lenient::flag")]
        compiled: bool,
        #[serde(rename = "Comment", default, deserialize_with = "lenient::opt_text")]
        comment: Option<String>,
    }

    #[test]
    fn test_numeric_text_and_flags_decode() {
        let row = Row::from_pairs([
            ("Name", Value::String("orders".into())),
            ("Rows", Value::String("42".into())),
            ("Compiled", Value::String("Yes".into())),
            ("Comment", Value::Null),
        ]);
        let sample: Sample = from_row(&row).unwrap();
        assert_eq!(sample.name, "orders");
        assert_eq!(sample.rows, Some(42));
        assert!(sample.compiled);
        assert_eq!(sample.comment, None);
    }

    #[test]
    fn test_missing_optional_columns_default() {
        let row = Row::from_pairs([
            ("Name", Value::Null),
            ("Compiled", Value::Int64(0)),
        ]);
        let sample: Sample = from_row(&row).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.rows, None);
        assert!(!sample.compiled);
    }

    #[test]
    fn test_missing_required_column_is_decode_error() {
        let row = Row::from_pairs([("Name", Value::String("x".into()))]);
        let err = from_row::<Sample>(&row).unwrap_err();
        assert!(matches!(err, SqlmuxError::Decode(_)));
    }
}
