//! Query methods for projects and parts
//!
//! The engine-facing traits and the wider query surface used by the CLI are
//! both implemented directly on [`Connection`], so they work the same on a
//! plain connection and inside a [`super::StoreTx`].

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    now_rfc3339, parse_datetime, NewPart, NewProject, Part, PartDetails, PartRecordStore,
    Project, ProjectStore, StoreResult,
};
use crate::core::identity::{PartId, PartType, ProjectId, ASSEMBLY_STRIDE};

const PART_COLUMNS: &str = "id, project_id, type, parent_id, numeric_id, part_number, name, \
     description, status, quantity, subteam_id, subsystem_id, created_at, updated_at, \
     material, revision, notes, quantity_on_hand, quantity_on_order, priority, drawing_created";

const PROJECT_COLUMNS: &str = "id, name, prefix, description, created_at";

fn part_from_row(row: &Row<'_>) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        project_id: row.get(1)?,
        part_type: row.get(2)?,
        parent_id: row.get(3)?,
        numeric_id: row.get(4)?,
        part_number: row.get(5)?,
        name: row.get(6)?,
        description: row.get(7)?,
        status: row.get(8)?,
        quantity: row.get(9)?,
        subteam_id: row.get(10)?,
        subsystem_id: row.get(11)?,
        created: parse_datetime(row.get(12)?),
        updated: parse_datetime(row.get(13)?),
        details: PartDetails {
            material: row.get(14)?,
            revision: row.get(15)?,
            notes: row.get(16)?,
            quantity_on_hand: row.get(17)?,
            quantity_on_order: row.get(18)?,
            priority: row.get(19)?,
            drawing_created: row.get(20)?,
        },
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        prefix: row.get(2)?,
        description: row.get(3)?,
        created: parse_datetime(row.get(4)?),
    })
}

impl ProjectStore for Connection {
    fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let project = self
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }
}

impl PartRecordStore for Connection {
    fn max_assembly_id(&self, project_id: ProjectId) -> StoreResult<Option<u32>> {
        let max: Option<u32> = self.query_row(
            "SELECT MAX(numeric_id) FROM parts WHERE project_id = ?1 AND type = ?2",
            params![project_id, PartType::Assembly],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn max_id_in_block(
        &self,
        project_id: ProjectId,
        block_start: u32,
    ) -> StoreResult<Option<u32>> {
        let max: Option<u32> = self.query_row(
            "SELECT MAX(numeric_id) FROM parts
             WHERE project_id = ?1 AND numeric_id > ?2 AND numeric_id < ?2 + ?3",
            params![project_id, block_start, ASSEMBLY_STRIDE],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn get_part(&self, id: PartId) -> StoreResult<Option<Part>> {
        let part = self
            .query_row(
                &format!("SELECT {PART_COLUMNS} FROM parts WHERE id = ?1"),
                params![id],
                part_from_row,
            )
            .optional()?;
        Ok(part)
    }

    fn insert_part(&self, record: &NewPart) -> StoreResult<Part> {
        let now = now_rfc3339();
        self.execute(
            "INSERT INTO parts (
                project_id, type, parent_id, numeric_id, part_number, name,
                description, status, quantity, subteam_id, subsystem_id,
                material, revision, notes, quantity_on_hand, quantity_on_order,
                priority, drawing_created, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                      ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)",
            params![
                record.project_id,
                record.part_type,
                record.parent_id,
                record.numeric_id,
                record.part_number,
                record.name,
                record.description,
                record.status,
                record.quantity,
                record.subteam_id,
                record.subsystem_id,
                record.details.material,
                record.details.revision,
                record.details.notes,
                record.details.quantity_on_hand,
                record.details.quantity_on_order,
                record.details.priority,
                record.details.drawing_created,
                now,
            ],
        )?;
        let id = PartId(self.last_insert_rowid());
        let part = self.query_row(
            &format!("SELECT {PART_COLUMNS} FROM parts WHERE id = ?1"),
            params![id],
            part_from_row,
        )?;
        Ok(part)
    }
}

/// Queries beyond what the numbering engine needs
pub trait PartQueries {
    fn insert_project(&self, record: &NewProject) -> StoreResult<Project>;
    fn project_by_prefix(&self, prefix: &str) -> StoreResult<Option<Project>>;
    fn list_projects(&self) -> StoreResult<Vec<Project>>;

    fn part_by_number(&self, part_number: &str) -> StoreResult<Option<Part>>;
    /// Parts of a project ordered by numeric id, optionally only the direct
    /// children of one parent
    fn list_parts(&self, project_id: ProjectId, parent_id: Option<PartId>)
        -> StoreResult<Vec<Part>>;
    /// Direct children of a part, ordered by name
    fn children(&self, part_id: PartId) -> StoreResult<Vec<Part>>;
    fn has_children(&self, part_id: PartId) -> StoreResult<bool>;
    /// Number of assemblies and parts in a project
    fn count_by_type(&self, project_id: ProjectId) -> StoreResult<(u64, u64)>;

    fn set_parent(&self, part_id: PartId, parent_id: Option<PartId>) -> StoreResult<()>;
    /// Write back the descriptive fields of `part`; numbering and hierarchy
    /// columns are left alone
    fn update_details(&self, part: &Part) -> StoreResult<()>;
    fn set_classification(
        &self,
        part_id: PartId,
        subteam_id: Option<PartId>,
        subsystem_id: Option<PartId>,
    ) -> StoreResult<()>;
    fn delete_part(&self, part_id: PartId) -> StoreResult<()>;
}

impl PartQueries for Connection {
    fn insert_project(&self, record: &NewProject) -> StoreResult<Project> {
        self.execute(
            "INSERT INTO projects (name, prefix, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.name, record.prefix, record.description, now_rfc3339()],
        )?;
        let id = ProjectId(self.last_insert_rowid());
        let project = self.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )?;
        Ok(project)
    }

    fn project_by_prefix(&self, prefix: &str) -> StoreResult<Option<Project>> {
        let project = self
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE prefix = ?1"),
                params![prefix],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut stmt =
            self.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY prefix"))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    fn part_by_number(&self, part_number: &str) -> StoreResult<Option<Part>> {
        let part = self
            .query_row(
                &format!("SELECT {PART_COLUMNS} FROM parts WHERE part_number = ?1"),
                params![part_number],
                part_from_row,
            )
            .optional()?;
        Ok(part)
    }

    fn list_parts(
        &self,
        project_id: ProjectId,
        parent_id: Option<PartId>,
    ) -> StoreResult<Vec<Part>> {
        let parts = match parent_id {
            Some(parent_id) => {
                let mut stmt = self.prepare(&format!(
                    "SELECT {PART_COLUMNS} FROM parts
                     WHERE project_id = ?1 AND parent_id = ?2 ORDER BY numeric_id"
                ))?;
                let rows = stmt
                    .query_map(params![project_id, parent_id], part_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self.prepare(&format!(
                    "SELECT {PART_COLUMNS} FROM parts WHERE project_id = ?1 ORDER BY numeric_id"
                ))?;
                let rows = stmt
                    .query_map(params![project_id], part_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(parts)
    }

    fn children(&self, part_id: PartId) -> StoreResult<Vec<Part>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE parent_id = ?1 ORDER BY name, numeric_id"
        ))?;
        let parts = stmt
            .query_map(params![part_id], part_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts)
    }

    fn has_children(&self, part_id: PartId) -> StoreResult<bool> {
        let exists: bool = self.query_row(
            "SELECT EXISTS (SELECT 1 FROM parts WHERE parent_id = ?1)",
            params![part_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn count_by_type(&self, project_id: ProjectId) -> StoreResult<(u64, u64)> {
        let (assemblies, parts): (i64, i64) = self.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN type = 'assembly' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'part' THEN 1 ELSE 0 END), 0)
             FROM parts WHERE project_id = ?1",
            params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((assemblies.max(0) as u64, parts.max(0) as u64))
    }

    fn set_parent(&self, part_id: PartId, parent_id: Option<PartId>) -> StoreResult<()> {
        self.execute(
            "UPDATE parts SET parent_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![part_id, parent_id, now_rfc3339()],
        )?;
        Ok(())
    }

    fn update_details(&self, part: &Part) -> StoreResult<()> {
        self.execute(
            "UPDATE parts SET
                name = ?2, description = ?3, status = ?4, quantity = ?5,
                material = ?6, revision = ?7, notes = ?8,
                quantity_on_hand = ?9, quantity_on_order = ?10,
                priority = ?11, drawing_created = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                part.id,
                part.name,
                part.description,
                part.status,
                part.quantity,
                part.details.material,
                part.details.revision,
                part.details.notes,
                part.details.quantity_on_hand,
                part.details.quantity_on_order,
                part.details.priority,
                part.details.drawing_created,
                now_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn set_classification(
        &self,
        part_id: PartId,
        subteam_id: Option<PartId>,
        subsystem_id: Option<PartId>,
    ) -> StoreResult<()> {
        self.execute(
            "UPDATE parts SET subteam_id = ?2, subsystem_id = ?3, updated_at = ?4 WHERE id = ?1",
            params![part_id, subteam_id, subsystem_id, now_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_part(&self, part_id: PartId) -> StoreResult<()> {
        self.execute("DELETE FROM parts WHERE id = ?1", params![part_id])?;
        Ok(())
    }
}
