//! Dynamic values flowing through a render
//!
//! Template data, helper values, literals in embedded code and intermediate
//! results are all [`Value`]s. Data usually arrives as `serde_json::Value`
//! or any `Serialize` type and is converted once at the render boundary.
//!
//! # Example
//!
//! ```rust
//! use ejs::Value;
//!
//! let data = Value::hash(vec![("name", Value::string("World")), ("count", Value::int(3))]);
//! assert_eq!(data.get("count").and_then(Value::as_int), Some(3));
//! assert_eq!(data.get("name").map(|v| v.to_string()), Some("World".to_string()));
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Format used when a date is converted to display text
pub const DATE_FORMAT: &str = "%a %b %d %Y";

/// A value in the template runtime
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/undefined value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Hash/object of key-value pairs, ordered by key
    Hash(BTreeMap<String, Value>),
    /// Calendar date
    Date(NaiveDate),
}

impl Value {
    /// Create a nil value
    pub fn nil() -> Self {
        Value::Nil
    }

    /// Create a boolean value
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Create a hash value
    pub fn hash(pairs: Vec<(impl Into<String>, Value)>) -> Self {
        Value::Hash(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a date value
    pub fn date(date: NaiveDate) -> Self {
        Value::Date(date)
    }

    /// Convert any serializable value
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Check if this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truthiness used by conditions and logical operators
    ///
    /// Nil, `false`, zero, NaN and the empty string are falsy. Arrays and
    /// hashes are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Hash(_) | Value::Date(_) => true,
        }
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "object",
            Value::Date(_) => "date",
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as hash
    pub fn as_hash(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    /// Get as date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get a hash value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Hash(h) => h.get(key),
            _ => None,
        }
    }

    /// Get an array element by index
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }

    /// Display text, with nil rendered as `null_text`
    pub fn display_with(&self, null_text: &str) -> String {
        match self {
            Value::Nil => null_text.to_string(),
            other => other.to_string(),
        }
    }

    /// Loose equality: numbers compare by value across int and float
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (a, b) => a == b,
        }
    }

    /// Convert back into a `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Hash(h) => serde_json::Value::Object(
                h.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Formats a float the way script output expects: integral floats print
/// without a fractional part.
fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write_float(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Value::Hash(_) => write!(f, "[object]"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Hash(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(Value::Nil.to_string(), "");
        assert_eq!(Value::int(42).to_string(), "42");
        assert_eq!(Value::float(2.5).to_string(), "2.5");
        assert_eq!(Value::float(3.0).to_string(), "3");
        assert_eq!(Value::float(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(
            Value::array(vec![Value::int(1), Value::Nil, Value::string("x")]).to_string(),
            "1,,x"
        );
        assert_eq!(Value::hash(vec![("a", Value::int(1))]).to_string(), "[object]");
    }

    #[test]
    fn test_date_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(Value::date(date).to_string(), "Tue Mar 05 2024");
    }

    #[test]
    fn test_display_with_null_text() {
        assert_eq!(Value::Nil.display_with("-"), "-");
        assert_eq!(Value::int(0).display_with("-"), "0");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_loose_eq() {
        assert!(Value::int(2).loose_eq(&Value::float(2.0)));
        assert!(!Value::int(2).loose_eq(&Value::string("2")));
        assert!(Value::Nil.loose_eq(&Value::Nil));
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({
            "name": "ada",
            "age": 36,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "spouse": null
        }));

        assert_eq!(value.get("name").and_then(Value::as_str), Some("ada"));
        assert_eq!(value.get("age").and_then(Value::as_int), Some(36));
        assert_eq!(value.get("ratio").and_then(Value::as_float), Some(0.5));
        assert_eq!(value.get("tags").and_then(Value::as_array).map(|a| a.len()), Some(2));
        assert!(value.get("spouse").is_some_and(Value::is_nil));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
            admin: bool,
        }

        let value = Value::from_serialize(&User {
            name: "grace",
            admin: true,
        })
        .unwrap();
        assert_eq!(value.get("admin").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn test_json_round_trip() {
        let original = json!({"list": [1, 2.5, "three", null], "flag": false});
        assert_eq!(Value::from(original.clone()).to_json(), original);
    }
}
