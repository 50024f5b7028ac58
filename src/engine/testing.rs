//! In-memory record arena for engine unit tests

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::Utc;

use crate::core::identity::{PartId, PartNumber, PartType, ProjectId, ASSEMBLY_STRIDE};
use crate::store::{
    NewPart, Part, PartDetails, PartRecordStore, Project, ProjectStore, StoreError, StoreResult,
    DEFAULT_STATUS,
};

pub(crate) struct Arena {
    pub project: Project,
    parts: RefCell<BTreeMap<PartId, Part>>,
}

impl Arena {
    pub fn new(prefix: &str) -> Self {
        Self {
            project: Project {
                id: ProjectId(1),
                name: format!("{prefix} project"),
                prefix: prefix.to_string(),
                description: None,
                created: Utc::now(),
            },
            parts: RefCell::new(BTreeMap::new()),
        }
    }

    /// Add a record with a fixed numeric id, bypassing allocation
    pub fn add(
        &mut self,
        part_type: PartType,
        parent_id: Option<PartId>,
        numeric_id: u32,
    ) -> PartId {
        let part_number = PartNumber::new(&self.project.prefix, part_type, numeric_id);
        self.insert_part(&NewPart {
            project_id: self.project.id,
            part_type,
            parent_id,
            numeric_id,
            part_number: part_number.to_string(),
            name: format!("{part_type} {numeric_id}"),
            description: None,
            status: DEFAULT_STATUS.to_string(),
            quantity: 1,
            subteam_id: None,
            subsystem_id: None,
            details: PartDetails::default(),
        })
        .unwrap()
        .id
    }

    pub fn named(
        &mut self,
        name: &str,
        part_type: PartType,
        parent_id: Option<PartId>,
        numeric_id: u32,
    ) -> PartId {
        let id = self.add(part_type, parent_id, numeric_id);
        if let Some(part) = self.parts.borrow_mut().get_mut(&id) {
            part.name = name.to_string();
        }
        id
    }

    pub fn get(&self, id: PartId) -> Part {
        self.parts.borrow()[&id].clone()
    }

    /// Rewire a parent link without any validation
    pub fn set_parent(&mut self, id: PartId, parent_id: Option<PartId>) {
        if let Some(part) = self.parts.borrow_mut().get_mut(&id) {
            part.parent_id = parent_id;
        }
    }

    pub fn parts(&self) -> Vec<Part> {
        self.parts.borrow().values().cloned().collect()
    }
}

impl ProjectStore for Arena {
    fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok((id == self.project.id).then(|| self.project.clone()))
    }
}

impl PartRecordStore for Arena {
    fn max_assembly_id(&self, project_id: ProjectId) -> StoreResult<Option<u32>> {
        Ok(self
            .parts
            .borrow()
            .values()
            .filter(|p| p.project_id == project_id && p.is_assembly())
            .map(|p| p.numeric_id)
            .max())
    }

    fn max_id_in_block(
        &self,
        project_id: ProjectId,
        block_start: u32,
    ) -> StoreResult<Option<u32>> {
        let end = u64::from(block_start) + u64::from(ASSEMBLY_STRIDE);
        Ok(self
            .parts
            .borrow()
            .values()
            .filter(|p| p.project_id == project_id)
            .map(|p| p.numeric_id)
            .filter(|&n| n > block_start && u64::from(n) < end)
            .max())
    }

    fn get_part(&self, id: PartId) -> StoreResult<Option<Part>> {
        Ok(self.parts.borrow().get(&id).cloned())
    }

    fn insert_part(&self, record: &NewPart) -> StoreResult<Part> {
        let mut parts = self.parts.borrow_mut();
        if parts.values().any(|p| {
            p.part_number == record.part_number
                || (p.project_id == record.project_id && p.numeric_id == record.numeric_id)
        }) {
            return Err(StoreError::UniqueViolation(record.part_number.clone()));
        }

        let id = PartId(parts.len() as i64 + 1);
        let now = Utc::now();
        let part = Part {
            id,
            project_id: record.project_id,
            part_type: record.part_type,
            parent_id: record.parent_id,
            numeric_id: record.numeric_id,
            part_number: record.part_number.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            status: record.status.clone(),
            quantity: record.quantity,
            subteam_id: record.subteam_id,
            subsystem_id: record.subsystem_id,
            details: record.details.clone(),
            created: now,
            updated: now,
        };
        parts.insert(id, part.clone());
        Ok(part)
    }
}
