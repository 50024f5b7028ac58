//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{PartStore, StoreError, StoreResult, SCHEMA_VERSION};

impl PartStore {
    /// Create tables and indexes if they do not exist yet
    pub(super) fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                prefix TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );

            -- Parts and assemblies share one self-referential table
            CREATE TABLE IF NOT EXISTS parts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                type TEXT NOT NULL CHECK (type IN ('assembly', 'part')),
                parent_id INTEGER REFERENCES parts(id),
                numeric_id INTEGER NOT NULL CHECK (numeric_id >= 0),
                part_number TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'in design',
                quantity INTEGER NOT NULL DEFAULT 1,
                material TEXT,
                revision TEXT,
                notes TEXT,
                quantity_on_hand INTEGER NOT NULL DEFAULT 0,
                quantity_on_order INTEGER NOT NULL DEFAULT 0,
                priority TEXT NOT NULL DEFAULT 'normal'
                    CHECK (priority IN ('low', 'normal', 'high')),
                drawing_created INTEGER NOT NULL DEFAULT 0,
                subteam_id INTEGER REFERENCES parts(id) ON DELETE SET NULL,
                subsystem_id INTEGER REFERENCES parts(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (parent_id IS NULL OR parent_id <> id),
                UNIQUE (project_id, numeric_id)
            );
            CREATE INDEX IF NOT EXISTS idx_parts_parent ON parts(parent_id);
            CREATE INDEX IF NOT EXISTS idx_parts_project_type ON parts(project_id, type);
            CREATE INDEX IF NOT EXISTS idx_parts_subteam ON parts(subteam_id);
            CREATE INDEX IF NOT EXISTS idx_parts_subsystem ON parts(subsystem_id);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version)
             SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Refuse to operate on a database written by another schema version
    pub(super) fn check_schema_version(&self) -> StoreResult<()> {
        let found: Option<i32> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        match found {
            Some(version) if version == SCHEMA_VERSION => Ok(()),
            Some(version) => Err(StoreError::SchemaMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            }),
            None => Err(StoreError::SchemaMismatch {
                found: 0,
                expected: SCHEMA_VERSION,
            }),
        }
    }
}
