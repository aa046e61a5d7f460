// Upstream record shapes
//
// RawPolicyRecord mirrors what the local directory query returns (Get-GPO
// property names). FlatPolicyRecord is the reduced, primitive-only projection
// that crosses the remote-execution boundary.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status marker the directory reports for a fully disabled GPO
pub const GPO_STATUS_DISABLED: &str = "AllSettingsDisabled";

/// Raw policy record as returned by the directory collaborator
///
/// Every field is optional; the directory may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPolicyRecord {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub modification_time: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gpo_status: Option<String>,
}

impl RawPolicyRecord {
    /// Directory-assigned identity of this record
    ///
    /// # Errors
    /// `DomainError::RecordConstruction` if `Id` is absent or not a UUID
    pub fn identity(&self) -> Result<Uuid> {
        parse_identity(self.id.as_deref(), self.display_name.as_deref())
    }
}

/// Flat policy record carried across the remote-execution boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatPolicyRecord {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status_marker: Option<String>,
}

impl FlatPolicyRecord {
    /// Field-for-field projection of a raw record, without validation
    ///
    /// This is what a remote host ships back for each directory record.
    pub fn from_raw(raw: &RawPolicyRecord) -> Self {
        Self {
            display_name: raw.display_name.clone(),
            id: raw.id.clone(),
            domain: raw.domain_name.clone(),
            created: raw.creation_time.clone(),
            modified: raw.modification_time.clone(),
            owner: raw.owner.clone(),
            description: raw.description.clone(),
            status_marker: raw.gpo_status.clone(),
        }
    }

    /// Directory-assigned identity of this record
    ///
    /// # Errors
    /// `DomainError::RecordConstruction` if `id` is absent or not a UUID
    pub fn identity(&self) -> Result<Uuid> {
        parse_identity(self.id.as_deref(), self.display_name.as_deref())
    }
}

fn parse_identity(id: Option<&str>, display_name: Option<&str>) -> Result<Uuid> {
    let label = display_name.unwrap_or("<unnamed>");
    let id = id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DomainError::RecordConstruction(format!("'{}' has no Id", label)))?;

    Uuid::parse_str(id).map_err(|e| {
        DomainError::RecordConstruction(format!("'{}' has invalid Id '{}': {}", label, id, e))
    })
}
