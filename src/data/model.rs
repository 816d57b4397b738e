use std::collections::BTreeMap;
use std::fmt;

use crate::geodesy::GeoPoint;

// ---------------------------------------------------------------------------
// TagValue – a single tag on a feature
// ---------------------------------------------------------------------------

/// A dynamically-typed tag value as read from a feature library.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::String(s) => write!(f, "{s}"),
            TagValue::Integer(i) => write!(f, "{i}"),
            TagValue::Float(v) => write!(f, "{v}"),
            TagValue::Bool(b) => write!(f, "{b}"),
            TagValue::Null => write!(f, "<null>"),
        }
    }
}

impl TagValue {
    /// Numeric interpretation; strings are parsed so `"1602"` and `"1602.5"` count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Integer(i) => Some(*i as f64),
            TagValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whole-number interpretation, truncating fractional values toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Integer(i) => Some(*i),
            other => other
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TagValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Feature – one tagged point
// ---------------------------------------------------------------------------

/// A tagged point feature (one row of a feature library).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub location: GeoPoint,
    /// Tag columns: key → value.
    pub tags: BTreeMap<String, TagValue>,
}

impl Feature {
    pub fn new(location: GeoPoint) -> Self {
        Self {
            location,
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style tag insertion.
    pub fn with_tag(mut self, key: &str, value: TagValue) -> Self {
        self.tags.insert(key.to_string(), value);
        self
    }

    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key).filter(|v| !v.is_null())
    }

    /// Tag rendered as text, `None` when absent or null.
    pub fn text(&self, key: &str) -> Option<String> {
        self.tag(key).map(|v| match v {
            TagValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// FeatureSet – the complete loaded library
// ---------------------------------------------------------------------------

/// All features loaded from one or more library files.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
}

impl FeatureSet {
    pub fn from_features(features: Vec<Feature>) -> Self {
        FeatureSet { features }
    }

    /// Append another set, keeping load order.
    pub fn extend(&mut self, other: FeatureSet) {
        self.features.extend(other.features);
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
