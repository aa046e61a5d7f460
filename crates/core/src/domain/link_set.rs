// Linked-OU collection embedded in PolicyRecord

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Ordered set of organizational-unit distinguished names.
///
/// Insertion order is preserved and duplicates (exact, case-sensitive match)
/// are silently ignored. Blank paths are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSet(Vec<String>);

impl LinkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `ou_path` unless it is already present.
    ///
    /// Returns `true` if the path was added.
    pub fn insert(&mut self, ou_path: &str) -> Result<bool> {
        let ou_path = validate_path(ou_path)?;
        if self.contains(ou_path) {
            return Ok(false);
        }
        self.0.push(ou_path.to_string());
        Ok(true)
    }

    /// Remove `ou_path` if present.
    ///
    /// Returns `true` if the path was removed.
    pub fn remove(&mut self, ou_path: &str) -> Result<bool> {
        let ou_path = validate_path(ou_path)?;
        match self.0.iter().position(|p| p == ou_path) {
            Some(index) => {
                self.0.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, ou_path: &str) -> bool {
        self.0.iter().any(|p| p == ou_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Snapshot copy of the current paths
    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

fn validate_path(ou_path: &str) -> Result<&str> {
    if ou_path.trim().is_empty() {
        return Err(DomainError::InvalidArgument(
            "OU path cannot be null or empty".to_string(),
        ));
    }
    Ok(ou_path)
}
