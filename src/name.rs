use crate::data::model::Feature;

/// Localized name first, then the fallback language, then the plain tag.
pub const DEFAULT_NAME_KEYS: [&str; 3] = ["name:cs", "name:en", "name"];
/// Label used when every name field is blank.
pub const DEFAULT_UNNAMED: &str = "Bezejmenný vrchol";

/// Name tag values in priority order, as read from one feature.
pub type NameFields = Vec<(String, Option<String>)>;

/// First non-blank value in `fields`, or `unnamed` when all are blank or missing.
pub fn resolve_name<'a, I>(fields: I, unnamed: &str) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    fields
        .into_iter()
        .filter_map(|(_, value)| value)
        .find(|value| !value.trim().is_empty())
        .unwrap_or(unnamed)
        .to_string()
}

/// Picks display names from a configurable list of name tags.
#[derive(Debug, Clone)]
pub struct NameResolver {
    keys: Vec<String>,
    unnamed: String,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_NAME_KEYS.iter().map(|k| k.to_string()).collect(),
            DEFAULT_UNNAMED.to_string(),
        )
    }
}

impl NameResolver {
    pub fn new(keys: Vec<String>, unnamed: String) -> Self {
        Self { keys, unnamed }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Snapshot the name tags of `feature` in priority order.
    pub fn fields(&self, feature: &Feature) -> NameFields {
        self.keys
            .iter()
            .map(|key| (key.clone(), feature.text(key)))
            .collect()
    }

    pub fn resolve(&self, fields: &[(String, Option<String>)]) -> String {
        resolve_name(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_deref())),
            &self.unnamed,
        )
    }

    /// Shorthand for `resolve(&fields(feature))`.
    pub fn name_of(&self, feature: &Feature) -> String {
        self.resolve(&self.fields(feature))
    }
}
