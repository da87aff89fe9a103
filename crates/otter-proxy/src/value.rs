//! Value representation
//!
//! A fixed set of value kinds stands in for a fully dynamic value space:
//! primitives, functions, and shared records. Records and functions are
//! reference types; cloning a [`Value`] clones the reference, never the data.

use crate::error::{ProxyError, ProxyResult};
use crate::function::Function;
use crate::key::{PropertyKey, number_to_string};
use crate::record::{Record, SharedRecord};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Nesting limit for JSON conversion (cyclic records would otherwise recurse forever)
const MAX_JSON_DEPTH: usize = 128;

/// A value stored in a record or passed through a trap
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (reading a missing key)
    #[default]
    Undefined,
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// IEEE-754 number
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Callable function
    Function(Function),
    /// Shared record
    Record(SharedRecord),
}

impl Value {
    /// The absent value
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// Null
    pub const fn null() -> Self {
        Self::Null
    }

    /// Boolean value
    pub const fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Number value
    pub const fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// String value
    pub fn string(s: &str) -> Self {
        Self::String(Arc::from(s))
    }

    /// Wrap a record in a new shared reference
    pub fn record(record: Record) -> Self {
        Self::Record(Rc::new(RefCell::new(record)))
    }

    /// Function value
    pub fn function(f: Function) -> Self {
        Self::Function(f)
    }

    /// Check if undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check if null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if a number
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Check if a string
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Check if callable
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Check if a record
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get as shared record
    pub fn as_record(&self) -> Option<&SharedRecord> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// `typeof` name of this value
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Record(_) => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
        }
    }

    /// Truthiness
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Function(_) | Self::Record(_) => true,
        }
    }

    /// Convert to a property key
    pub fn to_property_key(&self) -> PropertyKey {
        match self {
            Self::Number(n) => PropertyKey::from_number(*n),
            Self::String(s) => PropertyKey::string(s),
            other => PropertyKey::string(&other.to_string()),
        }
    }

    /// SameValue comparison
    ///
    /// NaN is SameValue to itself, +0 and -0 are distinct, and reference
    /// types compare by identity.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                if *a == 0.0 && *b == 0.0 {
                    return a.is_sign_positive() == b.is_sign_positive();
                }
                a == b
            }
            _ => self == other,
        }
    }

    /// Build a value from JSON; arrays become index-keyed records
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::string(s),
            serde_json::Value::Array(items) => {
                Self::record(Record::array(items.iter().map(Self::from_json)))
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::new();
                for (k, v) in map {
                    record.set(PropertyKey::string(k), Self::from_json(v));
                }
                Self::record(record)
            }
        }
    }

    /// Convert to JSON
    ///
    /// Undefined and functions serialize as null. Records whose keys are all
    /// dense indices serialize as arrays.
    pub fn to_json(&self) -> ProxyResult<serde_json::Value> {
        self.to_json_at(0)
    }

    fn to_json_at(&self, depth: usize) -> ProxyResult<serde_json::Value> {
        if depth > MAX_JSON_DEPTH {
            return Err(ProxyError::type_error("Converting circular structure to JSON"));
        }
        Ok(match self {
            Self::Undefined | Self::Null | Self::Function(_) => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.to_string()),
            Self::Record(record) => {
                let record = record.borrow();
                if record.is_array_like() {
                    let items = record
                        .values()
                        .map(|v| v.to_json_at(depth + 1))
                        .collect::<ProxyResult<Vec<_>>>()?;
                    serde_json::Value::Array(items)
                } else {
                    let mut map = serde_json::Map::new();
                    for (key, value) in record.entries() {
                        map.insert(key.to_string(), value.to_json_at(depth + 1)?);
                    }
                    serde_json::Value::Object(map)
                }
            }
        })
    }
}

impl PartialEq for Value {
    /// Strict equality; records and functions compare by identity
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Record(a), Self::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", number_to_string(*n)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Function(func) => write!(f, "[Function: {}]", func.name()),
            Self::Record(record) => match record.try_borrow() {
                Ok(record) => write!(f, "Record({} keys)", record.len()),
                Err(_) => write!(f, "Record(<borrowed>)"),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Record(_) => f.write_str("[object Object]"),
            Self::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::record(record)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}
