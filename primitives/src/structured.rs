//! Structured values and their canonical structured-text form.
//!
//! Mappings and sequences cross the boundary as compact JSON with mapping
//! keys in sorted order. Byte fields are written as standard padded base64
//! and date-time fields as ISO-8601 text.
//!
//! # Decode reinterpretation
//!
//! JSON has no byte or date-time type, so decoding is opportunistic: every
//! string, depth-first, is tried as base64 and then as an ISO-8601
//! date-time before it is accepted as plain text. A plain-text field that
//! happens to parse as one of those forms is silently reinterpreted:
//!
//! - `"2024-01-01T00:00:00"` decodes as [`Structured::DateTime`]
//! - `"abcd"` decodes as [`Structured::Bytes`] (`[0x69, 0xb7, 0x1d]`)
//! - an empty [`Structured::Bytes`] encodes as `""` and decodes back as
//!   [`Structured::Text`], since the empty string is never tried as base64
//!
//! Guest code relies on this, so it is kept as-is. Callers that need the
//! literal text should use a [`Json`](crate::object::Json) codec object,
//! which decodes through serde without reinterpretation.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{CodecError, CodecResult};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const NAIVE_FRACTION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A mapping / sequence tree as seen by guest code.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Bytes),
    /// Date-time without an offset.
    DateTime(NaiveDateTime),
    /// Date-time with a UTC offset.
    ZonedDateTime(DateTime<FixedOffset>),
    Seq(Vec<Structured>),
    Map(BTreeMap<String, Structured>),
}

impl Structured {
    /// An empty mapping.
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Insert into a mapping, returning `self` for chaining.
    /// Non-mapping values are returned unchanged.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Structured>) -> Self {
        if let Self::Map(entries) = &mut self {
            entries.insert(key.into(), value.into());
        }
        self
    }

    /// Short name of this value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) => "datetime",
            Self::ZonedDateTime(_) => "zoned datetime",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    /// Look up a key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Structured> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Encode to the canonical structured-text form.
    pub fn to_text(&self) -> CodecResult<String> {
        let value = self.to_json()?;
        serde_json::to_string(&value)
            .map_err(|e| CodecError::unsupported(self.kind(), e.to_string()))
    }

    /// Encode to the canonical structured-text form as bytes.
    pub fn to_vec(&self) -> CodecResult<Vec<u8>> {
        self.to_text().map(String::into_bytes)
    }

    /// Decode from the canonical structured-text form, applying the
    /// base64 / date-time reinterpretation to every string.
    pub fn from_slice(bytes: &[u8]) -> CodecResult<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| CodecError::decode("structured text", e))?;
        Ok(Self::from_json(value))
    }

    /// Convert any serde-serializable value. Strings go through the same
    /// reinterpretation as a decode would apply.
    pub fn from_serialize<T: Serialize>(value: &T) -> CodecResult<Self> {
        serde_json::to_value(value)
            .map(Self::from_json)
            .map_err(|e| CodecError::unsupported(std::any::type_name::<T>(), e.to_string()))
    }

    /// Deserialize into a serde type via the structured-text form.
    pub fn deserialize<T: DeserializeOwned>(&self) -> CodecResult<T> {
        let value = self.to_json()?;
        serde_json::from_value(value).map_err(|e| CodecError::decode(std::any::type_name::<T>(), e))
    }

    fn to_json(&self) -> CodecResult<Value> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                CodecError::unsupported("float", format!("{f} has no structured-text form"))
            })?,
            Self::Text(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::String(STANDARD.encode(b)),
            Self::DateTime(dt) => Value::String(dt.format(NAIVE_FRACTION_FORMAT).to_string()),
            Self::ZonedDateTime(dt) => Value::String(dt.to_rfc3339()),
            Self::Seq(items) => {
                Value::Array(items.iter().map(Self::to_json).collect::<CodecResult<_>>()?)
            }
            Self::Map(entries) => {
                let mut out = Map::new();
                for (key, value) in entries {
                    out.insert(key.clone(), value.to_json()?);
                }
                Value::Object(out)
            }
        })
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => reinterpret(s),
            Value::Array(items) => Self::Seq(items.into_iter().map(Self::from_json).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

/// Try a decoded string as base64, then as a date-time, then keep it as text.
fn reinterpret(text: String) -> Structured {
    if !text.is_empty() {
        if let Ok(bytes) = STANDARD.decode(text.as_bytes()) {
            return Structured::Bytes(Bytes::from(bytes));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Structured::ZonedDateTime(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&text, NAIVE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&text, NAIVE_FRACTION_FORMAT))
    {
        return Structured::DateTime(dt);
    }
    Structured::Text(text)
}

// ── Conversions ──

impl From<bool> for Structured {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Structured {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Structured {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Structured {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Structured {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for Structured {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Bytes> for Structured {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<u8>> for Structured {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<NaiveDateTime> for Structured {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Structured {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::ZonedDateTime(v)
    }
}

impl From<Vec<Structured>> for Structured {
    fn from(v: Vec<Structured>) -> Self {
        Self::Seq(v)
    }
}

impl From<BTreeMap<String, Structured>> for Structured {
    fn from(v: BTreeMap<String, Structured>) -> Self {
        Self::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_mapping_text_is_compact_and_sorted() {
        let value = Structured::map().with("zeta", 1).with("alpha", "x");
        assert_eq!(value.to_text().unwrap(), r#"{"alpha":"x","zeta":1}"#);
    }

    #[test]
    fn test_mapping_roundtrip() {
        let value = Structured::map()
            .with("count", 3)
            .with("name", "hello world")
            .with("ok", true)
            .with("tags", Structured::Seq(vec!["one two".into(), Structured::Null]));
        let decoded = Structured::from_slice(&value.to_vec().unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_bytes_field_roundtrip() {
        let value = Structured::map().with("blob", vec![0u8, 159, 146, 150]);
        let text = value.to_text().unwrap();
        assert_eq!(text, r#"{"blob":"AJ+Slg=="}"#);
        assert_eq!(Structured::from_slice(text.as_bytes()).unwrap(), value);
    }

    #[test]
    fn test_plain_datetime_text_is_reinterpreted() {
        let decoded = Structured::from_slice(br#"{"when":"2024-01-01T00:00:00"}"#).unwrap();
        assert_eq!(decoded.get("when"), Some(&Structured::DateTime(new_year())));
    }

    #[test]
    fn test_datetime_field_roundtrip() {
        let value = Structured::map().with("when", new_year());
        assert_eq!(value.to_text().unwrap(), r#"{"when":"2024-01-01T00:00:00"}"#);
        assert_eq!(Structured::from_slice(&value.to_vec().unwrap()).unwrap(), value);
    }

    #[test]
    fn test_zoned_datetime_roundtrip() {
        let dt = DateTime::parse_from_rfc3339("2024-06-30T12:30:00+02:00").unwrap();
        let value = Structured::Seq(vec![dt.into()]);
        let decoded = Structured::from_slice(&value.to_vec().unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_fractional_seconds() {
        let decoded = Structured::from_slice(br#"["2024-01-01T00:00:00.250"]"#).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 250)
            .unwrap();
        assert_eq!(decoded, Structured::Seq(vec![Structured::DateTime(expected)]));
    }

    #[test]
    fn test_base64_looking_text_is_reinterpreted() {
        let decoded = Structured::from_slice(br#"{"word":"abcd"}"#).unwrap();
        assert_eq!(
            decoded.get("word"),
            Some(&Structured::Bytes(Bytes::from_static(&[0x69, 0xb7, 0x1d])))
        );
    }

    #[test]
    fn test_empty_string_stays_text() {
        let decoded = Structured::from_slice(br#"[""]"#).unwrap();
        assert_eq!(decoded, Structured::Seq(vec![Structured::Text(String::new())]));
    }

    #[test]
    fn test_empty_bytes_field_decodes_as_text() {
        let value = Structured::map().with("b", Vec::<u8>::new());
        let text = value.to_text().unwrap();
        assert_eq!(text, r#"{"b":""}"#);

        let decoded = Structured::from_slice(text.as_bytes()).unwrap();
        assert_eq!(decoded.get("b"), Some(&Structured::Text(String::new())));
        assert_ne!(decoded, value);
    }

    #[test]
    fn test_nested_reinterpretation_is_depth_first() {
        let text = br#"{"outer":{"inner":["2024-01-01T00:00:00","plain text"]}}"#;
        let decoded = Structured::from_slice(text).unwrap();
        let inner = decoded.get("outer").and_then(|o| o.get("inner")).unwrap();
        assert_eq!(
            inner,
            &Structured::Seq(vec![
                Structured::DateTime(new_year()),
                Structured::Text("plain text".into())
            ])
        );
    }

    #[test]
    fn test_malformed_text_is_decode_failure() {
        let err = Structured::from_slice(b"{not json").unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_non_finite_float_is_unsupported() {
        let err = Structured::Float(f64::NAN).to_text().unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_serde_bridge() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Count {
            count: i64,
        }
        let value = Structured::from_serialize(&Count { count: 3 }).unwrap();
        assert_eq!(value.get("count"), Some(&Structured::Int(3)));
        assert_eq!(value.deserialize::<Count>().unwrap(), Count { count: 3 });
    }
}
