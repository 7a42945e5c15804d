use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::domain::Transaction;

/// Description -> label rules, matched exactly (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classifier {
    rules: BTreeMap<String, String>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, txn: &Transaction) -> Option<&str> {
        self.lookup(txn.description())
    }

    pub fn lookup(&self, description: &str) -> Option<&str> {
        self.rules.get(description).map(String::as_str)
    }

    pub fn add_classification(&mut self, txn: &Transaction, label: impl Into<String>) {
        self.set(txn.description(), label);
    }

    pub fn set(&mut self, description: impl Into<String>, label: impl Into<String>) {
        self.rules.insert(description.into(), label.into());
    }

    pub fn remove(&mut self, description: &str) -> Option<String> {
        self.rules.remove(description)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules sorted by description.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace the in-memory rules with the contents of `path`.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read classifier store {}", path.display()))?;
        self.rules = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse classifier store {}", path.display()))?;
        tracing::info!(rules = self.rules.len(), path = %path.display(), "loaded classifier store");
        Ok(())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut classifier = Self::new();
        classifier.load(path)?;
        Ok(classifier)
    }

    /// Write every rule to `path` as indented JSON, keys sorted.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.rules.serialize(&mut ser)?;
        buf.push(b'\n');
        fs::write(path, buf)
            .with_context(|| format!("Failed to write classifier store {}", path.display()))?;
        tracing::info!(rules = self.rules.len(), path = %path.display(), "saved classifier store");
        Ok(())
    }
}
