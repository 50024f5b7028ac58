//! Record types
//!
//! Rows as loaded from and written to the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::core::identity::{PartId, PartType, ProjectId};

/// Status given to parts created without one
pub const DEFAULT_STATUS: &str = "in design";

/// A project owning a numbering space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Short string used in generated part numbers (unique)
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub prefix: String,
    pub description: Option<String>,
}

/// A part or assembly record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub id: PartId,
    pub project_id: ProjectId,
    #[serde(rename = "type")]
    pub part_type: PartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PartId>,
    pub numeric_id: u32,
    pub part_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subteam_id: Option<PartId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem_id: Option<PartId>,
    #[serde(flatten)]
    pub details: PartDetails,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Part {
    pub fn is_assembly(&self) -> bool {
        self.part_type == PartType::Assembly
    }
}

/// A fully numbered record ready for insertion
#[derive(Debug, Clone)]
pub struct NewPart {
    pub project_id: ProjectId,
    pub part_type: PartType,
    pub parent_id: Option<PartId>,
    pub numeric_id: u32,
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub quantity: u32,
    pub subteam_id: Option<PartId>,
    pub subsystem_id: Option<PartId>,
    pub details: PartDetails,
}

/// Manufacturing priority of a part
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Shop-floor fields carried alongside the numbering fields. None of them
/// affects numbering or classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub quantity_on_hand: u32,
    pub quantity_on_order: u32,
    pub priority: Priority,
    pub drawing_created: bool,
}

/// Changes to a part's descriptive fields; `None` leaves a field as is.
///
/// Type, project and numbers are fixed at creation. Parent changes go
/// through a move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub quantity: Option<u32>,
    pub material: Option<String>,
    pub revision: Option<String>,
    pub notes: Option<String>,
    pub quantity_on_hand: Option<u32>,
    pub quantity_on_order: Option<u32>,
    pub priority: Option<Priority>,
    pub drawing_created: Option<bool>,
}

impl PartUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every set field onto `part`
    pub fn apply_to(self, part: &mut Part) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut part.name, self.name);
        set(&mut part.status, self.status);
        set(&mut part.quantity, self.quantity);
        set(&mut part.details.quantity_on_hand, self.quantity_on_hand);
        set(&mut part.details.quantity_on_order, self.quantity_on_order);
        set(&mut part.details.priority, self.priority);
        set(&mut part.details.drawing_created, self.drawing_created);
        if self.description.is_some() {
            part.description = self.description;
        }
        if self.material.is_some() {
            part.details.material = self.material;
        }
        if self.revision.is_some() {
            part.details.revision = self.revision;
        }
        if self.notes.is_some() {
            part.details.notes = self.notes;
        }
    }
}
