//! Addon manifest validation.
//!
//! A manifest is checked for a fixed set of required fields and is then
//! exposed as [`AddonManifest`], a view borrowing the decoded document.

use super::error::ValidationError;
use serde_json::{Map, Value};

/// Fields every manifest must carry.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "id",
    "version",
    "name",
    "description",
    "logo",
    "resources",
    "types",
];

/// Required fields that must be non-empty strings.
const TEXT_FIELDS: [&str; 5] = ["id", "version", "name", "description", "logo"];

/// Required fields that must be a list or an object.
const DECLARATION_FIELDS: [&str; 2] = ["resources", "types"];

/// Characters of the description shown in the import summary.
pub const DESCRIPTION_EXCERPT_CHARS: usize = 120;

/// `resources` / `types` are accepted as either shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Declarations<'a> {
    /// Ordered sequence.
    List(&'a [Value]),
    /// Keyed mapping.
    Map(&'a Map<String, Value>),
}

impl<'a> Declarations<'a> {
    /// Resolves a JSON value, `None` for any other shape.
    #[must_use]
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::List(items)),
            Value::Object(map) => Some(Self::Map(map)),
            _ => None,
        }
    }

    /// Number of entries (elements or keys).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Map(map) => map.len(),
        }
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A manifest document with its inspected fields resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AddonManifest<'a> {
    /// Unique key within the store.
    pub id: &'a str,
    /// Informational version string.
    pub version: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Free-form description.
    pub description: &'a str,
    /// Logo reference, usually a URL.
    pub logo: &'a str,
    /// Resource declarations.
    pub resources: Declarations<'a>,
    /// Type declarations.
    pub types: Declarations<'a>,
    /// The whole document, stored verbatim.
    pub document: &'a Map<String, Value>,
}

impl<'a> AddonManifest<'a> {
    /// Builds a view without the schema checks.
    ///
    /// Only an object with a string `id` is required, since the id is the
    /// merge key. Absent display fields read as empty.
    pub fn unchecked(doc: &'a Value, label: &str) -> Result<Self, ValidationError> {
        let document = as_object(doc, label)?;
        let id = document.get("id").and_then(Value::as_str).ok_or_else(|| {
            ValidationError::new(format!("Field 'id' must be a string in '{}'", label))
        })?;

        let text = move |key: &str| document.get(key).and_then(Value::as_str).unwrap_or("");
        let declarations = move |key: &str| {
            document
                .get(key)
                .and_then(Declarations::from_value)
                .unwrap_or(Declarations::List(&[]))
        };

        Ok(Self {
            id,
            version: text("version"),
            name: text("name"),
            description: text("description"),
            logo: text("logo"),
            resources: declarations("resources"),
            types: declarations("types"),
            document,
        })
    }

    /// Description cut to [`DESCRIPTION_EXCERPT_CHARS`] characters, with `…`
    /// appended when something was cut.
    #[must_use]
    pub fn description_excerpt(&self) -> String {
        let mut chars = self.description.chars();
        let excerpt: String = chars.by_ref().take(DESCRIPTION_EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            format!("{}…", excerpt)
        } else {
            excerpt
        }
    }
}

/// Validates `doc` and returns the resolved view.
///
/// Missing fields are reported together; after that the first offending
/// field ends the check.
pub fn validate<'a>(doc: &'a Value, label: &str) -> Result<AddonManifest<'a>, ValidationError> {
    let document = as_object(doc, label)?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !document.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::new(format!(
            "Missing required field(s) in '{}': {}",
            label,
            missing.join(", ")
        )));
    }

    let mut text = [""; TEXT_FIELDS.len()];
    for (slot, key) in text.iter_mut().zip(TEXT_FIELDS) {
        *slot = document
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ValidationError::new(format!(
                    "Field '{}' must be a non-empty string in '{}'",
                    key, label
                ))
            })?;
    }

    let mut declarations = [Declarations::List(&[]); DECLARATION_FIELDS.len()];
    for (slot, key) in declarations.iter_mut().zip(DECLARATION_FIELDS) {
        *slot = document
            .get(key)
            .and_then(Declarations::from_value)
            .ok_or_else(|| {
                ValidationError::new(format!(
                    "Field '{}' must be a list or object in '{}'",
                    key, label
                ))
            })?;
    }

    let [id, version, name, description, logo] = text;
    let [resources, types] = declarations;

    Ok(AddonManifest {
        id,
        version,
        name,
        description,
        logo,
        resources,
        types,
        document,
    })
}

fn as_object<'a>(doc: &'a Value, label: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    doc.as_object().ok_or_else(|| {
        ValidationError::new(format!("Manifest from '{}' is not a JSON object", label))
    })
}
