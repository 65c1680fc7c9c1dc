use super::{EntityError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type EntityId = Uuid;
pub type SpaceId = Uuid;
pub type UserId = Uuid;

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Soft lifecycle state of an entity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    #[default]
    Approved,
    PendingApproval,
    Draft,
    Deleted,
}

impl EntityStatus {
    pub const ALL: [EntityStatus; 4] = [
        EntityStatus::Approved,
        EntityStatus::PendingApproval,
        EntityStatus::Draft,
        EntityStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Approved => "approved",
            EntityStatus::PendingApproval => "pending_approval",
            EntityStatus::Draft => "draft",
            EntityStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for EntityStatus {
    type Err = EntityError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "approved" => Ok(EntityStatus::Approved),
            "pending_approval" => Ok(EntityStatus::PendingApproval),
            "draft" => Ok(EntityStatus::Draft),
            "deleted" => Ok(EntityStatus::Deleted),
            _ => Err(EntityError::InvalidValue(format!("unknown entity status: {raw}"))),
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `content` was encrypted when it was written. Decryption happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionType {
    #[default]
    None,
    InstanceKey,
    E2ee,
}

impl EncryptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionType::None => "none",
            EncryptionType::InstanceKey => "instance_key",
            EncryptionType::E2ee => "e2ee",
        }
    }
}

impl FromStr for EncryptionType {
    type Err = EntityError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "none" => Ok(EncryptionType::None),
            "instance_key" => Ok(EncryptionType::InstanceKey),
            "e2ee" => Ok(EncryptionType::E2ee),
            _ => Err(EntityError::InvalidValue(format!(
                "unknown encryption type: {raw}"
            ))),
        }
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
