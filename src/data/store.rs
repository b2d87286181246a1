//! Static category tables loaded from the Data Store document
//!
//! The document has three top-level keys: `categorias` (style → table),
//! `profesiones` (style → list) and `motivaciones` (flat list). A missing or
//! invalid document yields an empty store so startup never fails.

use crate::core::error::Result;
use crate::core::types::{Gender, DEFAULT_STYLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Gender tag → ordered list of strings
pub type GenderedList = BTreeMap<String, Vec<String>>;

/// Tables for one style
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(rename = "nombres", alias = "names", default)]
    pub names: GenderedList,
    #[serde(rename = "apellidos", alias = "surnames", default)]
    pub surnames: Option<Vec<String>>,
    #[serde(rename = "titulos", alias = "titles", default)]
    pub titles: Option<GenderedList>,
    #[serde(rename = "rasgos", alias = "traits", default)]
    pub traits: Option<Vec<String>>,
}

impl CategoryTable {
    /// Name list for `gender`, cascading exact → neutral → masculine
    pub fn names_for(&self, gender: Gender) -> &[String] {
        cascade(&self.names, gender)
    }

    /// Title list for `gender`, same cascade as names
    pub fn titles_for(&self, gender: Gender) -> &[String] {
        self.titles
            .as_ref()
            .map(|titles| cascade(titles, gender))
            .unwrap_or(&[])
    }

    pub fn surnames(&self) -> &[String] {
        self.surnames.as_deref().unwrap_or(&[])
    }

    pub fn traits(&self) -> &[String] {
        self.traits.as_deref().unwrap_or(&[])
    }
}

/// First non-empty list among the gender's own keys, then the neutral keys,
/// then the masculine keys
fn cascade(lists: &GenderedList, gender: Gender) -> &[String] {
    [gender, Gender::Neutral, Gender::Male]
        .iter()
        .flat_map(|g| g.table_keys().iter())
        .filter_map(|key| lists.get(*key))
        .find(|list| !list.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Read-only generation data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataStore {
    #[serde(rename = "categorias", alias = "categories", default)]
    pub categories: BTreeMap<String, CategoryTable>,
    #[serde(rename = "profesiones", alias = "professions", default)]
    pub professions: BTreeMap<String, Vec<String>>,
    #[serde(rename = "motivaciones", alias = "motivations", default)]
    pub motivations: Vec<String>,
}

impl DataStore {
    /// Parse a Data Store from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a Data Store from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a Data Store, yielding an empty one when the file is unusable
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => {
                tracing::info!(
                    "Loaded {} styles from {}",
                    store.categories.len(),
                    path.display()
                );
                store
            }
            Err(e) => {
                tracing::warn!("Could not load data from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Map a requested style onto one with a category table
    pub fn resolve_style(&self, style: &str) -> String {
        if self.categories.contains_key(style) {
            style.to_string()
        } else {
            DEFAULT_STYLE.to_string()
        }
    }

    pub fn category(&self, style: &str) -> Option<&CategoryTable> {
        self.categories.get(style)
    }

    pub fn professions_for(&self, style: &str) -> &[String] {
        self.professions
            .get(style)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Style tags in table order, for shells that offer a picker
    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}
