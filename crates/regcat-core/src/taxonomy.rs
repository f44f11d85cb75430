//! Category → search-term taxonomy and product seed files.
//!
//! Both are YAML documents kept under `config/`. The taxonomy is a list
//! rather than a map so that iteration order is the file order.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::{ProductSeed, SeedsFile};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Flattens the taxonomy into `(category, term)` pairs, categories in
    /// file order and terms in list order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.categories.iter().flat_map(|c| {
            c.terms
                .iter()
                .map(move |t| (c.name.as_str(), t.as_str()))
        })
    }

    #[must_use]
    pub fn term_count(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }

    /// Returns a taxonomy holding only the named category (case-insensitive).
    /// The result is empty when nothing matches.
    #[must_use]
    pub fn only_category(&self, name: &str) -> Taxonomy {
        Taxonomy {
            categories: self
                .categories
                .iter()
                .filter(|c| c.name.eq_ignore_ascii_case(name))
                .cloned()
                .collect(),
        }
    }
}

/// Load and validate the taxonomy from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_taxonomy(path: &Path) -> Result<Taxonomy, ConfigError> {
    let content = read_file(path)?;
    parse_taxonomy(&content, path)
}

fn parse_taxonomy(content: &str, path: &Path) -> Result<Taxonomy, ConfigError> {
    let taxonomy: Taxonomy =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;
    validate_taxonomy(&taxonomy)?;
    Ok(taxonomy)
}

fn validate_taxonomy(taxonomy: &Taxonomy) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for category in &taxonomy.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }

        if !seen.insert(category.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{}'",
                category.name
            )));
        }

        if let Some(idx) = category.terms.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty search term at position {}",
                category.name,
                idx + 1
            )));
        }
    }

    Ok(())
}

/// Load product seeds from a YAML file with a top-level `products:` list.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or a seed has an
/// empty name or category.
pub fn load_seeds(path: &Path) -> Result<Vec<ProductSeed>, ConfigError> {
    let content = read_file(path)?;
    parse_seeds(&content, path)
}

fn parse_seeds(content: &str, path: &Path) -> Result<Vec<ProductSeed>, ConfigError> {
    let file: SeedsFile = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        source: e,
    })?;

    for (idx, seed) in file.products.iter().enumerate() {
        if seed.name.trim().is_empty() || seed.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed #{} must have a non-empty name and category",
                idx + 1
            )));
        }
    }

    Ok(file.products)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "taxonomy_test.rs"]
mod tests;
