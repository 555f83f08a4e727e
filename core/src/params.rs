//! Per-request parameter sets.
//!
//! # Design
//! A parameter value is either a scalar or a single level of named
//! properties that expands to `key[prop]` entries. Deeper nesting is not
//! representable; converting such JSON fails with `ParamError::TooDeep`
//! instead of producing a mangled key.

use serde_json::Value;

use crate::error::ParamError;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    /// Properties expanded as `key[prop]=value`. May be empty, in which case
    /// it contributes no entries.
    Nested(Vec<(String, String)>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! scalar_from_display {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                Self::Scalar(value.to_string())
            }
        })*
    };
}

scalar_from_display!(bool, i32, i64, u32, u64, usize, f64);

/// Mapping from parameter names to values, supplied per request.
///
/// Inserting an existing key replaces its value in place. Iteration order is
/// insertion order; canonicalization sorts independently of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of a nested value.
    pub fn with_nested<K, V>(mut self, key: impl Into<String>, props: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let props = props.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.insert(key, ParamValue::Nested(props));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Expand nested values into bracketed keys.
    ///
    /// `{"filter": {"q": "x"}, "page": "2"}` becomes
    /// `[("filter[q]", "x"), ("page", "2")]`. Order follows the set's
    /// iteration order; callers sort afterwards.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut flat = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                ParamValue::Scalar(v) => flat.push((key.clone(), v.clone())),
                ParamValue::Nested(props) => {
                    for (prop, v) in props {
                        flat.push((format!("{key}[{prop}]"), v.clone()));
                    }
                }
            }
        }
        flat
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = ParamError;

    /// Convert a JSON object. `null` values become empty nested values,
    /// arrays expand with index keys.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(ParamError::NotAnObject);
        };
        let mut set = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => ParamValue::Nested(Vec::new()),
                Value::Object(props) => ParamValue::Nested(
                    props
                        .into_iter()
                        .map(|(prop, v)| scalar_text(&key, v).map(|v| (prop, v)))
                        .collect::<Result<_, _>>()?,
                ),
                Value::Array(items) => ParamValue::Nested(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| scalar_text(&key, v).map(|v| (i.to_string(), v)))
                        .collect::<Result<_, _>>()?,
                ),
                scalar => ParamValue::Scalar(scalar_text(&key, scalar)?),
            };
            set.insert(key, value);
        }
        Ok(set)
    }
}

fn scalar_text(key: &str, value: Value) -> Result<String, ParamError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Err(ParamError::TooDeep { key: key.to_string() }),
    }
}
