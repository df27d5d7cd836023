//! Values flowing in and out of a resolution.
//!
//! - [`ScalarValue`] - a single column value, both in `where` filters and in
//!   fetched rows
//! - [`Row`] - one flat database row, column order preserved
//! - [`Value`] / [`ResultObject`] - the nested result graph handed back to
//!   the GraphQL execution layer
//! - [`InputValue`] - a GraphQL argument value (`where`, `limit`, ...)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One flat row as returned by an [`crate::executor::Executor`].
pub type Row = IndexMap<String, ScalarValue>;

/// A reshaped result object, field order follows the selection.
pub type ResultObject = IndexMap<String, Value>;

/// A scalar column value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Key used to match child results back to their parent row.
    ///
    /// Returns `None` for NULL, which never identifies a row.
    pub fn id_key(&self) -> Option<String> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Bool(b) => Some(format!("b:{b}")),
            ScalarValue::Int(n) => Some(format!("i:{n}")),
            ScalarValue::Float(f) => Some(format!("f:{f}")),
            ScalarValue::String(s) => Some(format!("s:{s}")),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(n) => write!(f, "{n}"),
            ScalarValue::Float(x) => write!(f, "{x}"),
            ScalarValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Int(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl From<f64> for ScalarValue {
    fn from(f: f64) -> Self {
        ScalarValue::Float(f)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.into())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

/// A node of the result graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(ScalarValue),
    Object(ResultObject),
    List(Vec<Value>),
}

impl Value {
    pub const NULL: Value = Value::Scalar(ScalarValue::Null);

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(ScalarValue::Null))
    }

    pub fn as_object(&self) -> Option<&ResultObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ResultObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup on an object value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(field))
    }

    /// Convert to a `serde_json::Value` for printing or comparison.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Scalar(s) => match s {
                ScalarValue::Null => serde_json::Value::Null,
                ScalarValue::Bool(b) => serde_json::Value::Bool(*b),
                ScalarValue::Int(n) => serde_json::Value::from(*n),
                ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                ScalarValue::String(s) => serde_json::Value::String(s.clone()),
            },
            Value::Object(obj) => serde_json::Value::Object(
                obj.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        Value::Scalar(value)
    }
}

impl From<ResultObject> for Value {
    fn from(obj: ResultObject) -> Self {
        Value::Object(obj)
    }
}

/// A GraphQL argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Scalar(ScalarValue),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl InputValue {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            InputValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in argument errors.
    pub fn kind(&self) -> &'static str {
        match self {
            InputValue::Scalar(ScalarValue::Null) => "null",
            InputValue::Scalar(ScalarValue::Bool(_)) => "boolean",
            InputValue::Scalar(ScalarValue::Int(_)) => "integer",
            InputValue::Scalar(ScalarValue::Float(_)) => "float",
            InputValue::Scalar(ScalarValue::String(_)) => "string",
            InputValue::List(_) => "list",
            InputValue::Object(_) => "object",
        }
    }
}

impl From<ScalarValue> for InputValue {
    fn from(value: ScalarValue) -> Self {
        InputValue::Scalar(value)
    }
}
