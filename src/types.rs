use crate::error::{NexusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single primitive value inside a raw record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the value; integers widen to `f64`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(Scalar::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Int(i)),
                None => n
                    .as_f64()
                    .map(Scalar::Real)
                    .ok_or_else(|| NexusError::Format(format!("unrepresentable number {n}"))),
            },
            serde_json::Value::String(s) => Ok(Scalar::Text(s)),
            other => Err(NexusError::UnclassifiableRecord(format!(
                "nested value {other} is not a primitive"
            ))),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Real(r) => write!(f, "{r:?}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Untyped input value as handed to the dispatcher or the pipeline manager
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RawRecord {
    /// Fixed-size ordered values, e.g. a sensor triple
    Tuple(Vec<Scalar>),
    /// Ordered sequence of values, e.g. a transaction or event batch
    Sequence(Vec<Scalar>),
    /// Encoded string
    Text(String),
    /// Key/value record
    Mapping(BTreeMap<String, Scalar>),
    /// A bare primitive
    Scalar(Scalar),
}

impl RawRecord {
    pub fn tuple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        RawRecord::Tuple(values.into_iter().map(Into::into).collect())
    }

    pub fn sequence<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        RawRecord::Sequence(values.into_iter().map(Into::into).collect())
    }

    pub fn text(value: impl Into<String>) -> Self {
        RawRecord::Text(value.into())
    }

    /// Short shape name used in log lines and error messages
    pub fn shape(&self) -> &'static str {
        match self {
            RawRecord::Tuple(_) => "tuple",
            RawRecord::Sequence(_) => "sequence",
            RawRecord::Text(_) => "text",
            RawRecord::Mapping(_) => "mapping",
            RawRecord::Scalar(_) => "scalar",
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Real(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// JSON mapping: string -> Text, array -> Sequence, `{"tuple": [..]}` -> Tuple,
/// any other object -> Mapping, number/bool -> Scalar.
impl TryFrom<serde_json::Value> for RawRecord {
    type Error = NexusError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(RawRecord::Text(s)),
            Value::Array(items) => Ok(RawRecord::Sequence(
                items.into_iter().map(Scalar::from_json).collect::<Result<_>>()?,
            )),
            Value::Object(mut obj) => {
                if obj.len() == 1 && obj.get("tuple").is_some_and(Value::is_array) {
                    if let Some(Value::Array(items)) = obj.remove("tuple") {
                        return Ok(RawRecord::Tuple(
                            items.into_iter().map(Scalar::from_json).collect::<Result<_>>()?,
                        ));
                    }
                }
                Ok(RawRecord::Mapping(
                    obj.into_iter()
                        .map(|(k, v)| Scalar::from_json(v).map(|s| (k, s)))
                        .collect::<Result<_>>()?,
                ))
            }
            Value::Null => Err(NexusError::UnclassifiableRecord(
                "null is not a record".to_string(),
            )),
            primitive => Ok(RawRecord::Scalar(Scalar::from_json(primitive)?)),
        }
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        RawRecord::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// The three typed streams a raw record can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Sensor,
    Transaction,
    Event,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Sensor, StreamKind::Transaction, StreamKind::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Sensor => "sensor",
            StreamKind::Transaction => "transaction",
            StreamKind::Event => "event",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shapes_map_to_record_variants() {
        let text = RawRecord::try_from(json!("temp:23")).unwrap();
        assert_eq!(text, RawRecord::text("temp:23"));

        let seq = RawRecord::try_from(json!([10, -5, 2.5])).unwrap();
        assert_eq!(
            seq,
            RawRecord::Sequence(vec![Scalar::Int(10), Scalar::Int(-5), Scalar::Real(2.5)])
        );

        let tuple = RawRecord::try_from(json!({"tuple": [22.5, 65.0, 1013.0]})).unwrap();
        assert_eq!(tuple, RawRecord::tuple([22.5, 65.0, 1013.0]));

        let mapping = RawRecord::try_from(json!({"a": 1, "b": "x"})).unwrap();
        assert!(matches!(mapping, RawRecord::Mapping(ref m) if m.len() == 2));

        let scalar = RawRecord::try_from(json!(42)).unwrap();
        assert_eq!(scalar, RawRecord::Scalar(Scalar::Int(42)));
    }

    #[test]
    fn test_null_and_nested_values_are_rejected() {
        assert!(RawRecord::try_from(json!(null)).is_err());
        assert!(RawRecord::try_from(json!([[1, 2]])).is_err());
    }

    #[test]
    fn test_records_deserialize_from_json_array() {
        let records: Vec<RawRecord> =
            serde_json::from_str(r#"[{"tuple": [1.0, 2.0, 3.0]}, [1, 2], ["login"]]"#).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].shape(), "tuple");
        assert_eq!(records[1].shape(), "sequence");
    }
}
