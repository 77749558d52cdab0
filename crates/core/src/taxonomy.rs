//! Category taxonomy: name rules and the in-memory registry.
//!
//! Category identity is the lowercased name. Title-cased display names are
//! derived on demand by [`display_name`] and never stored. The
//! [`UNCATEGORIZED`] category always exists and cannot be renamed or
//! removed; images in a removed category fall back to it.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::CoreError;

/// The fallback category every image can always be assigned to.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Maximum length of a category name, in characters.
pub const MAX_NAME_LEN: usize = 64;

/// Canonicalize a category name: trimmed and lowercased.
pub fn normalize_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Category name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Category name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Title-case a stored name for presentation: `"fine-art prints"` ->
/// `"Fine-Art Prints"`.
pub fn display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// A category together with its presentation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLabel {
    pub name: String,
    pub display_name: String,
}

impl CategoryLabel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name(name),
        }
    }
}

/// The set of known category names.
///
/// Mutations validate first and only then change the set, so a rejected
/// call leaves the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    names: BTreeSet<String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::from_names(std::iter::empty::<String>())
    }
}

impl Taxonomy {
    /// Build a registry from stored names. `uncategorized` is always added.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        set.insert(UNCATEGORIZED.to_string());
        Self { names: set }
    }

    /// Sorted names.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn labels(&self) -> Vec<CategoryLabel> {
        self.names.iter().map(|n| CategoryLabel::new(n)).collect()
    }

    /// Case-insensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    fn require(&self, name: &str) -> Result<String, CoreError> {
        let normalized = normalize_name(name)?;
        if self.names.contains(&normalized) {
            Ok(normalized)
        } else {
            Err(CoreError::NotFoundByName {
                entity: "Category",
                name: normalized,
            })
        }
    }

    /// Check an `add` without applying it. Returns the normalized name.
    pub fn check_add(&self, name: &str) -> Result<String, CoreError> {
        let normalized = normalize_name(name)?;
        if self.names.contains(&normalized) {
            return Err(CoreError::Conflict(format!(
                "Category '{normalized}' already exists"
            )));
        }
        Ok(normalized)
    }

    pub fn add(&mut self, name: &str) -> Result<String, CoreError> {
        let normalized = self.check_add(name)?;
        self.names.insert(normalized.clone());
        Ok(normalized)
    }

    /// Check a `rename` without applying it. Returns `(old, new)` normalized.
    ///
    /// Renaming to the same name is allowed and is a no-op.
    pub fn check_rename(&self, old: &str, new: &str) -> Result<(String, String), CoreError> {
        let old = self.require(old)?;
        if old == UNCATEGORIZED {
            return Err(CoreError::Validation(format!(
                "The '{UNCATEGORIZED}' category cannot be renamed"
            )));
        }
        let new = normalize_name(new)?;
        if new != old && self.names.contains(&new) {
            return Err(CoreError::Conflict(format!("Category '{new}' already exists")));
        }
        Ok((old, new))
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, CoreError> {
        let (old, new) = self.check_rename(old, new)?;
        self.names.remove(&old);
        self.names.insert(new.clone());
        Ok(new)
    }

    /// Check a `remove` without applying it. Returns the normalized name.
    pub fn check_remove(&self, name: &str) -> Result<String, CoreError> {
        let normalized = self.require(name)?;
        if normalized == UNCATEGORIZED {
            return Err(CoreError::Validation(format!(
                "The '{UNCATEGORIZED}' category cannot be removed"
            )));
        }
        Ok(normalized)
    }

    pub fn remove(&mut self, name: &str) -> Result<String, CoreError> {
        let normalized = self.check_remove(name)?;
        self.names.remove(&normalized);
        Ok(normalized)
    }
}
