use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of a season.
pub type SeasonId = uuid::Uuid;

/// Identity of a snapshot.
pub type SnapshotId = uuid::Uuid;

/// Identity of a task entry inside a snapshot.
pub type TaskId = uuid::Uuid;

/// Status of a single task entry in a season snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Blocked,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        };
        f.pad(s)
    }
}

/// Lifecycle status of a season.
///
/// - `Open`: work is in progress; departments may be asked to act.
/// - `OnHold`, `Closed`, `Canceled`: not actionable; attention is always empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeasonStatus {
    #[default]
    Open,
    OnHold,
    Closed,
    Canceled,
}

impl SeasonStatus {
    pub fn is_open(self) -> bool {
        matches!(self, SeasonStatus::Open)
    }
}

impl fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeasonStatus::Open => "open",
            SeasonStatus::OnHold => "on-hold",
            SeasonStatus::Closed => "closed",
            SeasonStatus::Canceled => "canceled",
        };
        f.pad(s)
    }
}

impl FromStr for SeasonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "open" => Ok(SeasonStatus::Open),
            "on-hold" | "onhold" | "hold" => Ok(SeasonStatus::OnHold),
            "closed" => Ok(SeasonStatus::Closed),
            "canceled" | "cancelled" => Ok(SeasonStatus::Canceled),
            other => Err(format!(
                "invalid season status: {other} (expected \"open\", \"on-hold\", \"closed\" or \"canceled\")"
            )),
        }
    }
}

/// Role of the actor performing an operation.
///
/// Only elevated roles (`Manager`, `Admin`) may amend completed tasks or edit
/// the template library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Manager,
    Admin,
}

impl Role {
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(format!(
                "invalid role: {other} (expected \"member\", \"manager\" or \"admin\")"
            )),
        }
    }
}

/// Someone performing an operation: an opaque id plus their role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}
