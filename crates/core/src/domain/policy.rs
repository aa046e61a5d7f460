// PolicyRecord Domain Model

use super::error::Result;
use super::link_set::LinkSet;
use super::upstream::{FlatPolicyRecord, RawPolicyRecord, GPO_STATUS_DISABLED};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Defaults applied when the upstream record omits a field.
///
/// `owner` and `domain` default differently on purpose: an absent owner is
/// reported as "Unknown", an absent domain stays empty.
pub mod defaults {
    use chrono::{DateTime, Utc};

    pub const DISPLAY_NAME: &str = "";
    pub const DOMAIN: &str = "";
    pub const OWNER: &str = "Unknown";
    pub const DESCRIPTION: &str = "";

    /// Seconds from the Unix epoch to 0001-01-01T00:00:00Z
    const MIN_TIMESTAMP_SECS: i64 = -62_135_596_800;

    /// Sentinel for an absent or unparsable timestamp (0001-01-01T00:00:00Z)
    pub fn timestamp() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(MIN_TIMESTAMP_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A Group Policy Object and the OUs it is linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub display_name: String,
    /// `Uuid::nil()` means "unset"
    pub id: Uuid,
    pub domain: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub owner: String,
    pub is_enabled: bool,
    pub description: String,
    #[serde(rename = "linkedOUs")]
    linked_ous: LinkSet,
}

/// Serializable, field-complete view of a PolicyRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecordView {
    pub display_name: String,
    pub id: Uuid,
    pub domain: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub owner: String,
    pub is_enabled: bool,
    pub description: String,
    #[serde(rename = "linkedOUs")]
    pub linked_ous: Vec<String>,
    pub link_count: usize,
}

impl Default for PolicyRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRecord {
    /// Empty record for manual population
    pub fn new() -> Self {
        Self {
            display_name: defaults::DISPLAY_NAME.to_string(),
            id: Uuid::nil(),
            domain: defaults::DOMAIN.to_string(),
            created: defaults::timestamp(),
            modified: defaults::timestamp(),
            owner: defaults::OWNER.to_string(),
            is_enabled: true,
            description: defaults::DESCRIPTION.to_string(),
            linked_ous: LinkSet::new(),
        }
    }

    /// Minimal record carrying identity only
    pub fn with_identity(display_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            display_name: display_name.into(),
            id,
            ..Self::new()
        }
    }

    /// Build from a raw directory record. Never fails: missing fields take
    /// their defaults and an absent or malformed `Id` becomes `Uuid::nil()`.
    pub fn from_raw(raw: &RawPolicyRecord) -> Self {
        Self::from_fields(UpstreamFields {
            display_name: raw.display_name.as_deref(),
            id: raw.id.as_deref(),
            domain: raw.domain_name.as_deref(),
            created: raw.creation_time.as_deref(),
            modified: raw.modification_time.as_deref(),
            owner: raw.owner.as_deref(),
            description: raw.description.as_deref(),
            status_marker: raw.gpo_status.as_deref(),
        })
    }

    /// Build from a flat record returned by a remote query. Same defaulting
    /// rules as [`PolicyRecord::from_raw`].
    pub fn from_flat(flat: &FlatPolicyRecord) -> Self {
        Self::from_fields(UpstreamFields {
            display_name: flat.display_name.as_deref(),
            id: flat.id.as_deref(),
            domain: flat.domain.as_deref(),
            created: flat.created.as_deref(),
            modified: flat.modified.as_deref(),
            owner: flat.owner.as_deref(),
            description: flat.description.as_deref(),
            status_marker: flat.status_marker.as_deref(),
        })
    }

    fn from_fields(fields: UpstreamFields<'_>) -> Self {
        Self {
            display_name: fields
                .display_name
                .unwrap_or(defaults::DISPLAY_NAME)
                .to_string(),
            id: fields
                .id
                .and_then(|s| Uuid::parse_str(s.trim()).ok())
                .unwrap_or_else(Uuid::nil),
            domain: fields.domain.unwrap_or(defaults::DOMAIN).to_string(),
            created: parse_timestamp(fields.created),
            modified: parse_timestamp(fields.modified),
            owner: fields.owner.unwrap_or(defaults::OWNER).to_string(),
            is_enabled: fields.status_marker != Some(GPO_STATUS_DISABLED),
            description: fields
                .description
                .unwrap_or(defaults::DESCRIPTION)
                .to_string(),
            linked_ous: LinkSet::new(),
        }
    }

    /// Link this policy to an OU. Linking an already-linked OU is a no-op.
    ///
    /// # Errors
    /// `DomainError::InvalidArgument` if `ou_path` is blank
    pub fn link_to(&mut self, ou_path: &str) -> Result<()> {
        if self.linked_ous.insert(ou_path)? {
            tracing::debug!(gpo = %self.display_name, ou = %ou_path, "Linked OU");
        }
        Ok(())
    }

    /// Unlink this policy from an OU. Unlinking an OU that is not linked is a
    /// no-op.
    ///
    /// # Errors
    /// `DomainError::InvalidArgument` if `ou_path` is blank
    pub fn unlink_from(&mut self, ou_path: &str) -> Result<()> {
        if self.linked_ous.remove(ou_path)? {
            tracing::debug!(gpo = %self.display_name, ou = %ou_path, "Unlinked OU");
        }
        Ok(())
    }

    pub fn unlink_all(&mut self) {
        self.linked_ous.clear();
    }

    /// Snapshot of the linked OUs, in link order
    pub fn linked_ou_list(&self) -> Vec<String> {
        self.linked_ous.to_vec()
    }

    pub fn link_count(&self) -> usize {
        self.linked_ous.len()
    }

    pub fn is_linked_to(&self, ou_path: &str) -> bool {
        self.linked_ous.contains(ou_path)
    }

    pub fn to_structured(&self) -> PolicyRecordView {
        PolicyRecordView {
            display_name: self.display_name.clone(),
            id: self.id,
            domain: self.domain.clone(),
            created: self.created,
            modified: self.modified,
            owner: self.owner.clone(),
            is_enabled: self.is_enabled,
            description: self.description.clone(),
            linked_ous: self.linked_ou_list(),
            link_count: self.link_count(),
        }
    }

    /// Field-complete key/value form, including the derived `linkCount`
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("displayName".into(), Value::from(self.display_name.clone()));
        map.insert("id".into(), Value::from(self.id.to_string()));
        map.insert("domain".into(), Value::from(self.domain.clone()));
        map.insert("created".into(), Value::from(format_timestamp(&self.created)));
        map.insert("modified".into(), Value::from(format_timestamp(&self.modified)));
        map.insert("owner".into(), Value::from(self.owner.clone()));
        map.insert("isEnabled".into(), Value::from(self.is_enabled));
        map.insert("description".into(), Value::from(self.description.clone()));
        map.insert("linkedOUs".into(), Value::from(self.linked_ou_list()));
        map.insert("linkCount".into(), Value::from(self.link_count()));
        map
    }

    /// Projection sent across the remote-execution boundary
    pub fn to_flat(&self) -> FlatPolicyRecord {
        FlatPolicyRecord {
            display_name: Some(self.display_name.clone()),
            id: Some(self.id.to_string()),
            domain: Some(self.domain.clone()),
            created: Some(format_timestamp(&self.created)),
            modified: Some(format_timestamp(&self.modified)),
            owner: Some(self.owner.clone()),
            description: Some(self.description.clone()),
            status_marker: Some(
                if self.is_enabled {
                    "AllSettingsEnabled"
                } else {
                    GPO_STATUS_DISABLED
                }
                .to_string(),
            ),
        }
    }

    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PolicyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.display_name, self.id)
    }
}

struct UpstreamFields<'a> {
    display_name: Option<&'a str>,
    id: Option<&'a str>,
    domain: Option<&'a str>,
    created: Option<&'a str>,
    modified: Option<&'a str>,
    owner: Option<&'a str>,
    description: Option<&'a str>,
    status_marker: Option<&'a str>,
}

fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(defaults::timestamp)
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
