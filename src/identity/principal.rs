use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// Unknown role strings coming from the identity collection degrade to the lowest tier.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Role::parse(&s).unwrap_or(Role::Guest))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
    ManageUsers,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
            Permission::ManageUsers => "manage_users",
        }
    }

    pub fn parse(s: &str) -> Option<Permission> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Some(Permission::Read),
            "write" => Some(Permission::Write),
            "delete" => Some(Permission::Delete),
            "manage_users" => Some(Permission::ManageUsers),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Drops permission names this console does not know instead of failing the whole record.
pub(crate) fn lenient_permissions<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<Permission>, D::Error> {
    let raw: Vec<String> = Vec::deserialize(d)?;
    Ok(raw.iter().filter_map(|s| Permission::parse(s)).collect())
}

/// Record shape of the remote identity collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient_permissions")]
    pub permissions: BTreeSet<Permission>,
}

fn default_role() -> Role { Role::Guest }

impl Default for Role {
    fn default() -> Self { Role::Guest }
}

/// The authenticated user's session record. Owned by the session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: u64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default, deserialize_with = "lenient_permissions")]
    pub permissions: BTreeSet<Permission>,
    pub session_started_at: DateTime<Utc>,
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,
}

impl Identity {
    /// Build the session identity from the server-declared record.
    pub fn from_record(rec: &IdentityRecord, now: DateTime<Utc>) -> Self {
        let display_name = if rec.name.trim().is_empty() {
            rec.email.split('@').next().filter(|s| !s.is_empty()).unwrap_or("User").to_string()
        } else {
            rec.name.clone()
        };
        Self {
            id: rec.id,
            email: rec.email.clone(),
            display_name,
            role: rec.role,
            permissions: rec.permissions.clone(),
            session_started_at: now,
            session_id: Uuid::new_v4(),
        }
    }

    /// Bearer-style token substitute attached to outgoing requests.
    pub fn bearer_token(&self) -> String { format!("Bearer {}", self.email) }
}
