//! Request Descriptors - What Each Constant Resolves From

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::options::ConfigError;

/// Target of a single constant: a URL plus its ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    #[serde(default)]
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), query: vec![] }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Human-readable URI used in console output.
    ///
    /// Parameters are appended in declaration order without percent-encoding,
    /// so the line matches what the user wrote in the options file.
    pub fn display_uri(&self) -> String {
        let mut uri = self.url.clone();
        for (i, (key, value)) in self.query.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(key);
            uri.push('=');
            uri.push_str(value);
        }
        uri
    }

    /// Accepts either a bare URL string or `{ "url": ..., "qs": { ... } }`.
    pub(crate) fn from_value(name: &str, value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(url) => Ok(Self::new(url.clone())),
            Value::Object(map) => Self::from_object(name, map),
            _ => Err(ConfigError::InvalidConstant {
                name: name.to_string(),
                reason: "expected a URL string or a request object".into(),
            }),
        }
    }

    fn from_object(name: &str, map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let url = map
            .get("url")
            .or_else(|| map.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::InvalidConstant {
                name: name.to_string(),
                reason: "request object needs a string `url`".into(),
            })?;

        let mut descriptor = Self::new(url);

        match map.get("qs") {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) => {
                for (key, value) in params {
                    let value = scalar_to_string(value).ok_or_else(|| ConfigError::InvalidConstant {
                        name: name.to_string(),
                        reason: format!("query parameter `{}` must be a scalar", key),
                    })?;
                    descriptor.query.push((key.clone(), value));
                }
            }
            Some(_) => {
                return Err(ConfigError::InvalidConstant {
                    name: name.to_string(),
                    reason: "`qs` must be an object".into(),
                })
            }
        }

        Ok(descriptor)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ordered constant name → descriptor mapping. Order drives output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantSpec {
    entries: Vec<(String, RequestDescriptor)>,
}

impl ConstantSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. A repeated name replaces the earlier descriptor in place.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: RequestDescriptor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.entries.push((name, descriptor)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequestDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &RequestDescriptor> {
        self.entries.iter().map(|(_, d)| d)
    }

    pub(crate) fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut spec = Self::new();
        for (name, value) in map {
            spec.insert(name.clone(), RequestDescriptor::from_value(name, value)?);
        }
        Ok(spec)
    }
}

impl<K: Into<String>> FromIterator<(K, RequestDescriptor)> for ConstantSpec {
    fn from_iter<I: IntoIterator<Item = (K, RequestDescriptor)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (name, descriptor) in iter {
            spec.insert(name, descriptor);
        }
        spec
    }
}
