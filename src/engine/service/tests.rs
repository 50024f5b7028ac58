use super::*;
use rusqlite::params;
use crate::store::Priority;

fn service() -> (PartNumberingService, Project) {
    let mut service =
        PartNumberingService::new(PartStore::open_in_memory().unwrap(), EngineConfig::default());
    let project = service
        .create_project("Baja 2025", "BP25", None)
        .unwrap();
    (service, project)
}

fn create(
    service: &mut PartNumberingService,
    project: &Project,
    part_type: PartType,
    parent: Option<&Part>,
    name: &str,
) -> Part {
    service
        .create_part(&CreatePart::new(
            project.id,
            part_type,
            parent.map(|p| p.id),
            name,
        ))
        .unwrap()
}

#[test]
fn test_create_project_validates_prefix() {
    let (mut service, _) = service();
    assert!(matches!(
        service.create_project("Again", "BP25", None).unwrap_err(),
        NumberingError::DuplicatePrefix(p) if p == "BP25"
    ));
    assert!(matches!(
        service.create_project("Bad", "BP-25", None).unwrap_err(),
        NumberingError::InvalidPrefix(_)
    ));
    assert!(matches!(
        service.create_project("  ", "OK", None).unwrap_err(),
        NumberingError::InvalidName
    ));
}

#[test]
fn test_sequential_assemblies() {
    let (mut service, project) = service();
    let numbers: Vec<String> = (0..3)
        .map(|i| {
            create(
                &mut service,
                &project,
                PartType::Assembly,
                None,
                &format!("Assembly {i}"),
            )
            .part_number
        })
        .collect();
    assert_eq!(numbers, ["BP25-A-0000", "BP25-A-0100", "BP25-A-0200"]);
}

#[test]
fn test_children_number_after_parent() {
    let (mut service, project) = service();
    create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, None, "Chassis");
    assert_eq!(chassis.numeric_id, 100);

    let first = create(&mut service, &project, PartType::Part, Some(&chassis), "Tube");
    let second = create(&mut service, &project, PartType::Part, Some(&chassis), "Gusset");
    assert_eq!(first.part_number, "BP25-P-0101");
    assert_eq!(second.part_number, "BP25-P-0102");
    assert_eq!(first.status, DEFAULT_STATUS);
    assert_eq!(first.quantity, 1);
}

#[test]
fn test_hundredth_child_overflows() {
    let (mut service, project) = service();
    let asm = create(&mut service, &project, PartType::Assembly, None, "TLA");
    for i in 1..100 {
        let part = create(
            &mut service,
            &project,
            PartType::Part,
            Some(&asm),
            &format!("Part {i}"),
        );
        assert_eq!(part.numeric_id, i);
    }

    let err = service
        .create_part(&CreatePart::new(
            project.id,
            PartType::Part,
            Some(asm.id),
            "One too many",
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        NumberingError::NumericIdOverflow { attempted: 100, .. }
    ));
    assert_eq!(service.store().count_by_type(project.id).unwrap(), (1, 99));
}

#[test]
fn test_derivation_through_service() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");
    let pedal_box = create(
        &mut service,
        &project,
        PartType::Assembly,
        Some(&chassis),
        "PedalBox",
    );
    let plate = create(
        &mut service,
        &project,
        PartType::Part,
        Some(&pedal_box),
        "FrontPlate",
    );

    assert_eq!(chassis.subteam_id, None);
    assert_eq!(pedal_box.subteam_id, Some(chassis.id));
    assert_eq!(pedal_box.subsystem_id, None);
    assert_eq!(plate.subteam_id, Some(chassis.id));
    assert_eq!(plate.subsystem_id, Some(pedal_box.id));
}

#[test]
fn test_explicit_override_per_field() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");
    let aero = create(&mut service, &project, PartType::Assembly, Some(&tla), "Aero");
    let pedal_box = create(
        &mut service,
        &project,
        PartType::Assembly,
        Some(&chassis),
        "PedalBox",
    );

    let mut request = CreatePart::new(project.id, PartType::Part, Some(pedal_box.id), "Plate");
    request.subteam_id = Some(aero.id);
    let part = service.create_part(&request).unwrap();
    assert_eq!(part.subteam_id, Some(aero.id));
    assert_eq!(part.subsystem_id, Some(pedal_box.id));

    let mut request = CreatePart::new(project.id, PartType::Part, Some(pedal_box.id), "Bolt");
    request.subsystem_id = Some(PartId(9999));
    assert!(matches!(
        service.create_part(&request).unwrap_err(),
        NumberingError::InvalidSubsystem(PartId(9999))
    ));
}

#[test]
fn test_override_from_other_project_rejected() {
    let (mut service, project) = service();
    let other = service.create_project("Other", "XX", None).unwrap();
    let foreign = create(&mut service, &other, PartType::Assembly, None, "Foreign");
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");

    let mut request = CreatePart::new(project.id, PartType::Part, Some(tla.id), "Plate");
    request.subteam_id = Some(foreign.id);
    assert!(matches!(
        service.create_part(&request).unwrap_err(),
        NumberingError::InvalidSubteam(id) if id == foreign.id
    ));

    let part = create(&mut service, &project, PartType::Part, Some(&tla), "Bolt");
    assert!(matches!(
        service
            .set_classification(part.id, None, Some(foreign.id))
            .unwrap_err(),
        NumberingError::InvalidSubsystem(id) if id == foreign.id
    ));
    assert_eq!(service.get_part(part.id).unwrap().subsystem_id, None);
}

#[test]
fn test_validation_failures_persist_nothing() {
    let (mut service, project) = service();
    let other = service.create_project("Other", "XX", None).unwrap();
    let foreign = create(&mut service, &other, PartType::Assembly, None, "Foreign");
    let asm = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let part = create(&mut service, &project, PartType::Part, Some(&asm), "Part");

    let cases = [
        (CreatePart::new(project.id, PartType::Part, None, "x"), "parent_not_found"),
        (
            CreatePart::new(project.id, PartType::Part, Some(foreign.id), "x"),
            "parent_project_mismatch",
        ),
        (
            CreatePart::new(project.id, PartType::Part, Some(part.id), "x"),
            "parent_type_mismatch",
        ),
        (
            CreatePart::new(project.id, PartType::Assembly, Some(PartId(999)), "x"),
            "parent_not_found",
        ),
    ];
    for (request, code) in cases {
        let err = service.create_part(&request).unwrap_err();
        let actual = miette::Diagnostic::code(&err).map(|c| c.to_string());
        assert_eq!(actual, Some(format!("partnum::validation::{code}")));
    }
    assert_eq!(service.store().count_by_type(project.id).unwrap(), (1, 1));
}

#[test]
fn test_conflict_retried_then_surfaced() {
    let (mut service, project) = service();
    let other = service.create_project("Other", "XX", None).unwrap();
    let a = create(&mut service, &project, PartType::Assembly, None, "A");

    // A row in another project already holds the number A's next child takes
    service
        .store()
        .execute(
            "INSERT INTO parts (project_id, type, numeric_id, part_number, name,
                                created_at, updated_at)
             VALUES (?1, 'part', 1, 'BP25-P-0001', 'stray', '', '')",
            params![other.id],
        )
        .unwrap();

    let err = service
        .create_part(&CreatePart::new(project.id, PartType::Part, Some(a.id), "Tube"))
        .unwrap_err();
    assert!(matches!(
        err,
        NumberingError::TransientConflict { attempts: 2, .. }
    ));
    assert_eq!(service.store().list_parts(project.id, Some(a.id)).unwrap().len(), 0);
}

#[test]
fn test_numbering_after_move_stays_in_block() {
    let (mut service, project) = service();
    let a = create(&mut service, &project, PartType::Assembly, None, "A");
    let b = create(&mut service, &project, PartType::Assembly, None, "B");
    let first = create(&mut service, &project, PartType::Part, Some(&a), "First");
    create(&mut service, &project, PartType::Part, Some(&a), "Second");
    assert_eq!(first.part_number, "BP25-P-0001");

    service.move_part(first.id, Some(b.id), false).unwrap();

    let under_b = create(&mut service, &project, PartType::Part, Some(&b), "Bolt");
    assert_eq!(under_b.part_number, "BP25-P-0101");
    let under_b = create(&mut service, &project, PartType::Part, Some(&b), "Nut");
    assert_eq!(under_b.part_number, "BP25-P-0102");

    // The moved record still holds its number, so A does not reuse it
    let under_a = create(&mut service, &project, PartType::Part, Some(&a), "Third");
    assert_eq!(under_a.part_number, "BP25-P-0003");

    // Moving the highest child away does not free its number either
    service.move_part(under_a.id, Some(b.id), false).unwrap();
    let under_a = create(&mut service, &project, PartType::Part, Some(&a), "Fourth");
    assert_eq!(under_a.part_number, "BP25-P-0004");
}

#[test]
fn test_preview_writes_nothing() {
    let (mut service, project) = service();
    let request = CreatePart::new(project.id, PartType::Assembly, None, "TLA");
    let allocation = service.preview(&request).unwrap();
    assert_eq!(allocation.part_number.to_string(), "BP25-A-0000");
    assert_eq!(service.store().count_by_type(project.id).unwrap(), (0, 0));
}

#[test]
fn test_resolve_ref() {
    let (mut service, project) = service();
    let asm = create(&mut service, &project, PartType::Assembly, None, "TLA");

    assert_eq!(service.resolve_ref("BP25-A-0000").unwrap().id, asm.id);
    assert_eq!(service.resolve_ref(&asm.id.to_string()).unwrap().id, asm.id);
    assert!(matches!(
        service.resolve_ref("BP25-A-0100").unwrap_err(),
        NumberingError::PartNotFound(_)
    ));
    assert!(matches!(
        service.resolve_ref("nonsense").unwrap_err(),
        NumberingError::InvalidReference(_)
    ));
}

#[test]
fn test_move_rejects_cycles() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");

    assert!(matches!(
        service.move_part(tla.id, Some(chassis.id), false).unwrap_err(),
        NumberingError::CycleDetected { .. }
    ));
    assert!(matches!(
        service.move_part(tla.id, Some(tla.id), false).unwrap_err(),
        NumberingError::CycleDetected { .. }
    ));
    assert_eq!(service.get_part(tla.id).unwrap().parent_id, None);
}

#[test]
fn test_move_keeps_number_and_rederives() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");
    let aero = create(&mut service, &project, PartType::Assembly, Some(&tla), "Aero");
    let wing = create(&mut service, &project, PartType::Part, Some(&chassis), "Wing");
    assert_eq!(wing.subteam_id, Some(chassis.id));

    let moved = service.move_part(wing.id, Some(aero.id), false).unwrap();
    assert_eq!(moved.part_number, wing.part_number);
    assert_eq!(moved.parent_id, Some(aero.id));
    assert_eq!(moved.subteam_id, Some(chassis.id));

    let moved = service.move_part(wing.id, Some(aero.id), true).unwrap();
    assert_eq!(moved.subteam_id, Some(aero.id));

    // Parts cannot be detached from every assembly
    assert!(matches!(
        service.move_part(wing.id, None, false).unwrap_err(),
        NumberingError::ParentNotFound { parent_id: None }
    ));
}

#[test]
fn test_update_part_details() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");

    let mut request = CreatePart::new(project.id, PartType::Part, Some(tla.id), "Plate");
    request.details.material = Some("6061-T6".to_string());
    let part = service.create_part(&request).unwrap();
    assert_eq!(part.details.material.as_deref(), Some("6061-T6"));
    assert_eq!(part.details.priority, Priority::Normal);
    assert!(!part.details.drawing_created);

    let updated = service
        .update_part(
            part.id,
            PartUpdate {
                name: Some("  Front Plate ".to_string()),
                revision: Some("B".to_string()),
                quantity_on_hand: Some(3),
                priority: Some(Priority::High),
                drawing_created: Some(true),
                ..PartUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Front Plate");
    assert_eq!(updated.part_number, part.part_number);
    assert_eq!(updated.parent_id, Some(tla.id));
    assert_eq!(updated.details.material.as_deref(), Some("6061-T6"));
    assert_eq!(updated.details.revision.as_deref(), Some("B"));
    assert_eq!(updated.details.quantity_on_hand, 3);
    assert_eq!(updated.details.priority, Priority::High);
    assert!(updated.details.drawing_created);
    assert_eq!(service.get_part(part.id).unwrap(), updated);

    let blank = PartUpdate {
        name: Some("   ".to_string()),
        ..PartUpdate::default()
    };
    assert!(matches!(
        service.update_part(part.id, blank).unwrap_err(),
        NumberingError::InvalidName
    ));
    assert!(matches!(
        service
            .update_part(PartId(999), PartUpdate::default())
            .unwrap_err(),
        NumberingError::PartNotFound(_)
    ));
}

#[test]
fn test_classification_updates() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");
    let part = create(&mut service, &project, PartType::Part, Some(&chassis), "Tube");

    let cleared = service.set_classification(part.id, None, None).unwrap();
    assert_eq!(cleared.subteam_id, None);
    assert!(matches!(
        service
            .set_classification(part.id, Some(part.id), None)
            .unwrap_err(),
        NumberingError::InvalidSubteam(_)
    ));

    let restored = service.reclassify(part.id).unwrap();
    assert_eq!(restored.subteam_id, Some(chassis.id));
}

#[test]
fn test_delete_requires_no_children() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let part = create(&mut service, &project, PartType::Part, Some(&tla), "Tube");

    assert!(matches!(
        service.delete_part(tla.id).unwrap_err(),
        NumberingError::HasChildren(_)
    ));
    service.delete_part(part.id).unwrap();
    service.delete_part(tla.id).unwrap();
    assert!(matches!(
        service.get_part(tla.id).unwrap_err(),
        NumberingError::PartNotFound(_)
    ));
}

#[test]
fn test_hierarchy_info() {
    let (mut service, project) = service();
    let tla = create(&mut service, &project, PartType::Assembly, None, "TLA");
    let chassis = create(&mut service, &project, PartType::Assembly, Some(&tla), "Chassis");
    let pedal_box = create(
        &mut service,
        &project,
        PartType::Assembly,
        Some(&chassis),
        "PedalBox",
    );
    create(&mut service, &project, PartType::Part, Some(&pedal_box), "Plate");

    let info = service.hierarchy_info(project.id).unwrap();
    assert_eq!(
        info.subteams.iter().map(|p| p.id).collect::<Vec<_>>(),
        [chassis.id]
    );
    assert_eq!(
        info.subsystems.iter().map(|p| p.id).collect::<Vec<_>>(),
        [pedal_box.id]
    );

    let tree = service.project_tree(project.id).unwrap();
    assert_eq!(tree.size(), 4);
    assert!(tree.warnings.is_empty());
}
