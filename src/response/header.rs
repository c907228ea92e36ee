use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single header keyword
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(x) => Some(*x as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for HeaderValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<i64> for HeaderValue {
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<usize> for HeaderValue {
    fn from(x: usize) -> Self {
        Self::Int(i64::try_from(x).unwrap_or(i64::MAX))
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for HeaderValue {
    fn from(x: bool) -> Self {
        Self::Bool(x)
    }
}

/// Keyword map of a single extension plus its free-text HISTORY records
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Header {
    #[serde(default)]
    pub keywords: BTreeMap<String, HeaderValue>,
    #[serde(default, rename = "HISTORY", skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.keywords.get(keyword)
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword)?.as_f64()
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword)?.as_i64()
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword)?.as_str()
    }

    /// Insert or overwrite a keyword
    pub fn set(&mut self, keyword: impl Into<String>, value: impl Into<HeaderValue>) -> &mut Self {
        self.keywords.insert(keyword.into(), value.into());
        self
    }

    pub fn add_history(&mut self, record: impl Into<String>) -> &mut Self {
        self.history.push(record.into());
        self
    }

    /// Builder-style [Header::set]
    pub fn with(mut self, keyword: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.set(keyword, value);
        self
    }
}
