//! The description field.
//!
//! Older addons store free text here; newer ones store a JSON object
//! carrying the text together with the addon type and tags. Both share
//! the same null-terminated string, so decoding is a parse attempt that
//! falls back to plain text.

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::structures::{AddonTag, AddonType};

/// Decoded description field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    /// Legacy free text, kept verbatim.
    PlainText(String),
    /// JSON-encoded metadata.
    Structured {
        description: String,
        addon_type: Option<AddonType>,
        tags: Vec<AddonTag>,
    },
}

/// Raw JSON fields before the vocabularies are applied.
#[derive(Default)]
struct DescriptionJson {
    description: String,
    addon_type: String,
    tags: Vec<String>,
}

impl<'de> Deserialize<'de> for DescriptionJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DescriptionVisitor)
    }
}

struct DescriptionVisitor;

impl<'de> Visitor<'de> for DescriptionVisitor {
    type Value = DescriptionJson;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a description object")
    }

    // Keys match case-insensitively and a later key overwrites an
    // earlier one; a null value leaves the field as it was.
    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut json = DescriptionJson::default();
        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("description") {
                if let Some(v) = map.next_value::<Option<String>>()? {
                    json.description = v;
                }
            } else if key.eq_ignore_ascii_case("type") {
                if let Some(v) = map.next_value::<Option<String>>()? {
                    json.addon_type = v;
                }
            } else if key.eq_ignore_ascii_case("tags") {
                json.tags = map.next_value::<Option<Vec<String>>>()?.unwrap_or_default();
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(json)
    }
}

impl Description {
    /// Decode a raw description. Never fails: anything that is not a
    /// JSON object (or `null`) is plain text.
    ///
    /// Type and tag names outside the known vocabularies are dropped
    /// without affecting the rest of the object.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Option<DescriptionJson>>(raw) {
            Ok(json) => {
                let json = json.unwrap_or_default();
                Description::Structured {
                    description: json.description,
                    addon_type: json.addon_type.parse().ok(),
                    tags: json.tags.iter().filter_map(|t| t.parse().ok()).collect(),
                }
            }
            Err(e) => {
                log::trace!("description is plain text: {}", e);
                Description::PlainText(raw.to_string())
            }
        }
    }

    /// Split into `(description, type, tags)`.
    pub fn into_parts(self) -> (String, Option<AddonType>, Vec<AddonTag>) {
        match self {
            Description::PlainText(text) => (text, None, Vec::new()),
            Description::Structured {
                description,
                addon_type,
                tags,
            } => (description, addon_type, tags),
        }
    }
}
