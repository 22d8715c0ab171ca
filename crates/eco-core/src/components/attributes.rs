//! Attribute Store
//!
//! Nested key-value trees describing an organism: taxonomy, diet, movement
//! and reproduction parameters. Species files are TOML, so trees are usually
//! built from a `toml::Table`. Lookups use dotted paths such as
//! `"Taxonomy.Genus"`; a path that does not resolve is an error, never a
//! silent default.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::LookupError;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Scalar(f64),
    Text(String),
    Flag(bool),
    List(Vec<AttributeValue>),
    Nested(AttributeTree),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&AttributeTree> {
        match self {
            AttributeValue::Nested(tree) => Some(tree),
            _ => None,
        }
    }

    fn from_toml(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => AttributeValue::Text(s.clone()),
            toml::Value::Integer(i) => AttributeValue::Scalar(*i as f64),
            toml::Value::Float(f) => AttributeValue::Scalar(*f),
            toml::Value::Boolean(b) => AttributeValue::Flag(*b),
            toml::Value::Datetime(d) => AttributeValue::Text(d.to_string()),
            toml::Value::Array(items) => {
                AttributeValue::List(items.iter().map(AttributeValue::from_toml).collect())
            }
            toml::Value::Table(table) => AttributeValue::Nested(AttributeTree::from_toml(table)),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Scalar(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Scalar(f64::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

impl From<AttributeTree> for AttributeValue {
    fn from(value: AttributeTree) -> Self {
        AttributeValue::Nested(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        AttributeValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Scalar(value) => write!(f, "{}", value),
            AttributeValue::Text(value) => write!(f, "'{}'", value),
            AttributeValue::Flag(value) => write!(f, "{}", value),
            AttributeValue::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            AttributeValue::Nested(tree) => write!(f, "{}", tree),
        }
    }
}

/// A nested attribute mapping with dotted-path lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTree {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a top-level key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Parses a tree from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = source.parse()?;
        Ok(Self::from_toml(&table))
    }

    pub fn from_toml(table: &toml::Table) -> Self {
        let entries = table
            .iter()
            .map(|(key, value)| (key.clone(), AttributeValue::from_toml(value)))
            .collect();
        Self { entries }
    }

    /// Resolves a dotted path such as `"Taxonomy.Genus"`.
    pub fn get(&self, path: &str) -> Result<&AttributeValue, LookupError> {
        let missing = |segment: &str| LookupError::Missing {
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut value = self.entries.get(first).ok_or_else(|| missing(first))?;
        for segment in segments {
            value = match value {
                AttributeValue::Nested(tree) => {
                    tree.entries.get(segment).ok_or_else(|| missing(segment))?
                }
                _ => return Err(missing(segment)),
            };
        }
        Ok(value)
    }

    pub fn get_f64(&self, path: &str) -> Result<f64, LookupError> {
        self.get(path)?.as_f64().ok_or_else(|| wrong_type(path, "a number"))
    }

    pub fn get_str(&self, path: &str) -> Result<&str, LookupError> {
        self.get(path)?.as_str().ok_or_else(|| wrong_type(path, "text"))
    }

    pub fn get_list(&self, path: &str) -> Result<&[AttributeValue], LookupError> {
        self.get(path)?.as_list().ok_or_else(|| wrong_type(path, "a list"))
    }

    pub fn get_tree(&self, path: &str) -> Result<&AttributeTree, LookupError> {
        self.get(path)?.as_tree().ok_or_else(|| wrong_type(path, "a table"))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy of `self` with anything it leaves unspecified filled in
    /// from `defaults`. Nested tables merge key by key; any other value in
    /// `self` wins outright.
    pub fn merged_over(&self, defaults: &AttributeTree) -> AttributeTree {
        let mut merged = defaults.clone();
        for (key, value) in &self.entries {
            let combined = match (value, merged.entries.get(key)) {
                (AttributeValue::Nested(ours), Some(AttributeValue::Nested(theirs))) => {
                    AttributeValue::Nested(ours.merged_over(theirs))
                }
                _ => value.clone(),
            };
            merged.entries.insert(key.clone(), combined);
        }
        merged
    }
}

fn wrong_type(path: &str, expected: &'static str) -> LookupError {
    LookupError::WrongType {
        path: path.to_string(),
        expected,
    }
}

impl fmt::Display for AttributeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttributeTree {
        AttributeTree::from_toml_str(
            r#"
            Scalar = 42
            List = ["Spam", "Eggs"]

            [Dict]
            item1 = 1
            item2 = 2.5
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let tree = sample();
        assert_eq!(tree.get_f64("Scalar").unwrap(), 42.0);
        assert_eq!(tree.get_f64("Dict.item1").unwrap(), 1.0);
        assert_eq!(tree.get_f64("Dict.item2").unwrap(), 2.5);
        assert_eq!(tree.get_list("List").unwrap()[0], AttributeValue::from("Spam"));
        assert_eq!(tree.get_tree("Dict").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let tree = sample();
        assert_eq!(
            tree.get("Nonexistent"),
            Err(LookupError::Missing {
                path: "Nonexistent".to_string(),
                segment: "Nonexistent".to_string(),
            })
        );
        assert!(matches!(
            tree.get("Dict.item3"),
            Err(LookupError::Missing { ref segment, .. }) if segment == "item3"
        ));
        // Walking through a leaf does not resolve either.
        assert!(tree.get("Scalar.deeper").is_err());
        assert!(!tree.contains(""));
    }

    #[test]
    fn test_wrong_type() {
        let tree = sample();
        assert!(matches!(
            tree.get_str("Scalar"),
            Err(LookupError::WrongType { expected: "text", .. })
        ));
    }

    #[test]
    fn test_merge_fills_only_missing_values() {
        let defaults = AttributeTree::from_toml_str(
            r#"
            Scale = 1.0
            [Movement]
            Speed = 1
            Vision = 5
            "#,
        )
        .unwrap();
        let species = AttributeTree::from_toml_str(
            r#"
            CommonName = "Fox"
            [Movement]
            Speed = 3
            "#,
        )
        .unwrap();

        let merged = species.merged_over(&defaults);
        assert_eq!(merged.get_str("CommonName").unwrap(), "Fox");
        assert_eq!(merged.get_f64("Scale").unwrap(), 1.0);
        assert_eq!(merged.get_f64("Movement.Speed").unwrap(), 3.0);
        assert_eq!(merged.get_f64("Movement.Vision").unwrap(), 5.0);
    }

    #[test]
    fn test_builder_and_display() {
        let tree = AttributeTree::new()
            .with("Prey", vec!["Lepus europaeus"])
            .with("Taxonomy", AttributeTree::new().with("Genus", "Vulpes"));
        assert_eq!(tree.get_str("Taxonomy.Genus").unwrap(), "Vulpes");
        assert_eq!(
            tree.to_string(),
            "{Prey: ['Lepus europaeus'], Taxonomy: {Genus: 'Vulpes'}}"
        );
    }
}
