//! Persistence of harvested items.
//!
//! Each category run writes its own JSON array; a merge step then folds the
//! per-category files into one catalog keyed by category.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Category, OutputSettings};
use crate::models::CollectedItem;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives the final ordered item list of a run.
pub trait ResultSink {
    fn write(&self, items: &[CollectedItem]) -> Result<(), SinkError>;
}

/// Writes items as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    fn write(&self, items: &[CollectedItem]) -> Result<(), SinkError> {
        let json = serde_json::to_string_pretty(items)?;
        write_file(&self.path, &json)?;
        info!("Saved {} items to {:?}", items.len(), self.path);
        Ok(())
    }
}

/// Item counts per category in a merged catalog.
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    pub path: PathBuf,
    pub counts: Vec<(String, usize)>,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Fold per-category files into the merged catalog.
///
/// Categories keep their configured order. A missing or unreadable file
/// contributes an empty list. With `add_indices`, every item gets a 1-based
/// `index` within its category.
pub fn merge_category_files(
    categories: &[Category],
    output: &OutputSettings,
) -> Result<MergeSummary, SinkError> {
    let mut catalog = Map::new();
    let mut counts = Vec::with_capacity(categories.len());

    for category in categories {
        let path = output.category_file(&category.key);
        let mut items = load_items(&path);

        if output.add_indices {
            for (position, item) in items.iter_mut().enumerate() {
                if let Value::Object(fields) = item {
                    fields.insert("index".to_string(), Value::from(position + 1));
                }
            }
        }

        counts.push((category.key.clone(), items.len()));
        catalog.insert(category.key.clone(), Value::Array(items));
    }

    let path = output.merged_path();
    let json = serde_json::to_string_pretty(&Value::Object(catalog))?;
    write_file(&path, &json)?;

    let summary = MergeSummary { path, counts };
    info!(
        "Merged {} items from {} categories into {:?}",
        summary.total(),
        categories.len(),
        summary.path
    );
    Ok(summary)
}

fn load_items(path: &Path) -> Vec<Value> {
    if !path.exists() {
        warn!("No harvest file at {:?}", path);
        return Vec::new();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<Vec<Value>>(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to load {:?}: {}", path, e);
            Vec::new()
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    fs::write(path, content).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> CollectedItem {
        let mut item = CollectedItem::new(format!("https://example.com/products/{}", n));
        item.title = Some(format!("상품 {}", n));
        item
    }

    fn output_in(dir: &Path) -> OutputSettings {
        OutputSettings {
            dir: dir.to_path_buf(),
            ..OutputSettings::default()
        }
    }

    #[test]
    fn test_json_sink_writes_array_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nested/out.json"));

        sink.write(&[item(2), item(1)]).unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert!(content.contains("상품 2"), "non-ASCII written as-is");
        let loaded: Vec<CollectedItem> = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, vec![item(2), item(1)]);
    }

    #[test]
    fn test_merge_keeps_category_order_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_in(dir.path());
        let categories = vec![
            Category::new("shirt", "셔츠", "https://example.com/shirt"),
            Category::new("hoodie", "후드", "https://example.com/hoodie"),
        ];

        JsonFileSink::new(output.category_file("shirt"))
            .write(&[item(1), item(2)])
            .unwrap();
        JsonFileSink::new(output.category_file("hoodie"))
            .write(&[item(3)])
            .unwrap();

        let summary = merge_category_files(&categories, &output).unwrap();
        assert_eq!(summary.total(), 3);
        assert_eq!(
            summary.counts,
            vec![("shirt".to_string(), 2), ("hoodie".to_string(), 1)]
        );

        let merged: Value =
            serde_json::from_str(&fs::read_to_string(output.merged_path()).unwrap()).unwrap();
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["shirt", "hoodie"]);
        assert_eq!(merged["shirt"][0]["index"], 1);
        assert_eq!(merged["shirt"][1]["index"], 2);
        assert_eq!(merged["hoodie"][0]["product_url"], "https://example.com/products/3");
    }

    #[test]
    fn test_merge_substitutes_empty_list_for_missing_or_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputSettings {
            add_indices: false,
            ..output_in(dir.path())
        };
        let categories = vec![
            Category::new("missing", "", "https://example.com/a"),
            Category::new("broken", "", "https://example.com/b"),
        ];
        fs::write(output.category_file("broken"), "{ not json").unwrap();

        let summary = merge_category_files(&categories, &output).unwrap();
        assert_eq!(summary.total(), 0);

        let merged: Value =
            serde_json::from_str(&fs::read_to_string(output.merged_path()).unwrap()).unwrap();
        assert_eq!(merged["missing"], Value::Array(vec![]));
        assert_eq!(merged["broken"], Value::Array(vec![]));
    }
}
