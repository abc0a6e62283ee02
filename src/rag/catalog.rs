use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Trimmed, lower-cased form of an entity label.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub label: String,
    pub file_name: String,
}

impl CatalogEntry {
    pub fn path_in(&self, documents_dir: &Path) -> PathBuf {
        documents_dir.join(&self.file_name)
    }
}

/// Static entity label -> source document table.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: Vec<CatalogEntry>,
}

impl EntityCatalog {
    /// Labels colliding after normalisation keep the first file in map order.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut entries: Vec<CatalogEntry> = Vec::with_capacity(map.len());
        for (raw_label, file_name) in map {
            let entry = CatalogEntry {
                label: normalize_label(raw_label),
                file_name: file_name.trim().to_string(),
            };
            if entry.label.is_empty() || entry.file_name.is_empty() {
                tracing::warn!("Ignoring catalog entry '{}' without label or file", raw_label);
                continue;
            }
            if let Some(kept) = entries.iter().find(|existing| existing.label == entry.label) {
                tracing::warn!(
                    "Entity '{}' is listed twice; keeping '{}', ignoring '{}'",
                    entry.label,
                    kept.file_name,
                    entry.file_name
                );
                continue;
            }
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
