//! Region template interchange.
//!
//! A template is a named snapshot of the drawn regions. The set serializes
//! to a plain JSON document so external tooling can persist, ship and merge
//! it; durable storage itself stays outside this crate.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use ie::Region;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub created_at: String,
    pub regions: Vec<Region>,
}

/// Named templates, keyed by user-chosen name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSet(pub BTreeMap<String, Template>);

impl TemplateSet {
    /// Store a snapshot of `regions` under `name`, stamping the creation
    /// time. An existing template of the same name is overwritten.
    pub fn insert(&mut self, name: impl Into<String>, regions: &[Region]) {
        self.0.insert(
            name.into(),
            Template {
                created_at: chrono::Utc::now().to_rfc3339(),
                regions: regions.to_vec(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Template> {
        self.0.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Export the full collection as the interchange document.
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize templates")
    }

    /// Import templates from an interchange document, merging by name
    /// (overwrite on collision). Members that don't parse as a template are
    /// skipped rather than failing the whole import. Returns how many
    /// templates were taken.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(json).context("parse template document")?;

        let mut count = 0;
        for (name, value) in raw {
            match serde_json::from_value::<Template>(value) {
                Ok(template) => {
                    self.0.insert(name, template);
                    count += 1;
                }
                Err(err) => {
                    tracing::warn!(template = %name, error = %err, "skipping malformed template");
                }
            }
        }
        Ok(count)
    }
}
