use super::*;
use crate::core::identity::PartType;
use tempfile::tempdir;

fn project(store: &PartStore, prefix: &str) -> Project {
    store
        .insert_project(&NewProject {
            name: format!("{prefix} project"),
            prefix: prefix.to_string(),
            description: None,
        })
        .unwrap()
}

fn record(
    project: &Project,
    part_type: PartType,
    parent_id: Option<PartId>,
    numeric_id: u32,
) -> NewPart {
    NewPart {
        project_id: project.id,
        part_type,
        parent_id,
        numeric_id,
        part_number: format!(
            "{}-{}-{:04}",
            project.prefix,
            part_type.indicator(),
            numeric_id
        ),
        name: format!("item {numeric_id}"),
        description: None,
        status: DEFAULT_STATUS.to_string(),
        quantity: 1,
        subteam_id: None,
        subsystem_id: None,
        details: PartDetails::default(),
    }
}

#[test]
fn test_open_creates_schema() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("nested").join(DATABASE_FILE);
    {
        let store = PartStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        project(&store, "BP25");
    }
    assert!(path.exists());

    // Reopening keeps existing records
    let store = PartStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
    assert_eq!(store.list_projects().unwrap().len(), 1);
}

#[test]
fn test_schema_version_mismatch_rejected() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join(DATABASE_FILE);
    {
        let store = PartStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        store
            .execute("UPDATE schema_version SET version = 99", [])
            .unwrap();
    }
    let err = PartStore::open(&path, DEFAULT_BUSY_TIMEOUT).err().unwrap();
    assert!(matches!(
        err,
        StoreError::SchemaMismatch {
            found: 99,
            expected: SCHEMA_VERSION
        }
    ));
}

#[test]
fn test_insert_and_load_part() {
    let store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");

    let asm = store
        .insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    assert_eq!(asm.part_number, "BP25-A-0000");
    assert_eq!(asm.status, DEFAULT_STATUS);
    assert!(asm.is_assembly());

    let loaded = store.get_part(asm.id).unwrap().unwrap();
    assert_eq!(loaded, asm);
    assert_eq!(
        store.part_by_number("BP25-A-0000").unwrap().map(|p| p.id),
        Some(asm.id)
    );
    assert!(store.get_part(PartId(999)).unwrap().is_none());
}

#[test]
fn test_duplicate_numeric_id_is_unique_violation() {
    let store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");
    let asm = store
        .insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    store
        .insert_part(&record(&p, PartType::Part, Some(asm.id), 1))
        .unwrap();

    let mut duplicate = record(&p, PartType::Part, Some(asm.id), 1);
    duplicate.part_number = "BP25-P-0001-B".to_string();
    let err = store.insert_part(&duplicate).unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));

    let err = store
        .insert_part(&record(&p, PartType::Part, Some(asm.id), 1))
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
}

#[test]
fn test_duplicate_prefix_is_unique_violation() {
    let store = PartStore::open_in_memory().unwrap();
    project(&store, "BP25");
    let err = store
        .insert_project(&NewProject {
            name: "again".to_string(),
            prefix: "BP25".to_string(),
            description: None,
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
}

#[test]
fn test_max_assembly_id() {
    let store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");
    let other = project(&store, "XX");

    assert_eq!(store.max_assembly_id(p.id).unwrap(), None);

    let a0 = store
        .insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    store
        .insert_part(&record(&p, PartType::Assembly, None, 100))
        .unwrap();
    store
        .insert_part(&record(&p, PartType::Part, Some(a0.id), 1))
        .unwrap();
    store
        .insert_part(&record(&other, PartType::Assembly, None, 900))
        .unwrap();

    assert_eq!(store.max_assembly_id(p.id).unwrap(), Some(100));
    assert_eq!(store.max_assembly_id(other.id).unwrap(), Some(900));
}

#[test]
fn test_max_id_in_block_ignores_parent_links() {
    let store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");
    let other = project(&store, "XX");

    let a0 = store
        .insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    let a1 = store
        .insert_part(&record(&p, PartType::Assembly, None, 100))
        .unwrap();
    store
        .insert_part(&record(&p, PartType::Part, Some(a0.id), 1))
        .unwrap();
    // Numbered in A-0000's block but now hanging under A-0100
    store
        .insert_part(&record(&p, PartType::Part, Some(a1.id), 2))
        .unwrap();
    store
        .insert_part(&record(&other, PartType::Part, None, 150))
        .unwrap();

    assert_eq!(store.max_id_in_block(p.id, 0).unwrap(), Some(2));
    assert_eq!(store.max_id_in_block(p.id, 100).unwrap(), None);
    assert_eq!(store.max_id_in_block(other.id, 100).unwrap(), Some(150));
    assert_eq!(store.max_id_in_block(p.id, 200).unwrap(), None);
}

#[test]
fn test_children_and_delete() {
    let store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");
    let asm = store
        .insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    let mut sub = record(&p, PartType::Assembly, Some(asm.id), 100);
    sub.subteam_id = Some(asm.id);
    let sub = store.insert_part(&sub).unwrap();

    assert!(store.has_children(asm.id).unwrap());
    assert!(!store.has_children(sub.id).unwrap());
    assert_eq!(store.children(asm.id).unwrap().len(), 1);
    assert_eq!(store.count_by_type(p.id).unwrap(), (2, 0));

    // Moving the child away and deleting the old parent clears derived references
    store.set_parent(sub.id, None).unwrap();
    store.delete_part(asm.id).unwrap();
    let sub = store.get_part(sub.id).unwrap().unwrap();
    assert_eq!(sub.parent_id, None);
    assert_eq!(sub.subteam_id, None);
}

#[test]
fn test_transaction_rolls_back_on_drop() {
    let mut store = PartStore::open_in_memory().unwrap();
    let p = project(&store, "BP25");
    {
        let tx = store.begin().unwrap();
        tx.insert_part(&record(&p, PartType::Assembly, None, 0))
            .unwrap();
    }
    assert_eq!(store.list_parts(p.id, None).unwrap().len(), 0);

    let tx = store.begin().unwrap();
    tx.insert_part(&record(&p, PartType::Assembly, None, 0))
        .unwrap();
    tx.commit().unwrap();
    assert_eq!(store.list_parts(p.id, None).unwrap().len(), 1);
}
