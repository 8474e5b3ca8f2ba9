use track_adapters::{ProjectAssignmentRegistry, StaticIssueTypeCatalog, StaticWorkflowCatalog};
use track_core::{ConflictKind, InMemorySchemeRepository, SchemeEngineError, SchemeRepository,
                 WorkflowSchemeEngine};
use track_domain::{NewScheme, SchemeUpdate};
use uuid::Uuid;

type Engine = WorkflowSchemeEngine<InMemorySchemeRepository, ProjectAssignmentRegistry>;

fn engine() -> (Engine, ProjectAssignmentRegistry) {
    let registry = ProjectAssignmentRegistry::new();
    let engine = WorkflowSchemeEngine::builder(InMemorySchemeRepository::new(), registry.clone())
        .catalogs(StaticWorkflowCatalog::new(["One", "Two", "Three", "Four", "Five"]),
                  StaticIssueTypeCatalog::new(["bug", "task", "feature", "improvement"]));
    (engine, registry)
}

#[test]
fn create_then_get_returns_the_same_scheme() {
    let (engine, _) = engine();
    let created = engine.create_scheme(NewScheme::named("X").with_default("One").with_mapping("bug", "Two"),
                                       "admin")
                        .expect("create should succeed");

    assert_ne!(created.id, Uuid::nil());
    let view = engine.get_scheme(created.id, false).unwrap();
    assert_eq!(view.name, "X");
    assert_eq!(view.default_workflow.as_deref(), Some("One"));
    assert_eq!(view.mappings.get("bug").map(String::as_str), Some("Two"));
    assert_eq!(view.last_modified_user, "admin");
}

#[test]
fn duplicate_name_is_a_conflict_carrying_the_name() {
    let (engine, _) = engine();
    engine.create_scheme(NewScheme::named("Taken"), "admin").unwrap();
    let err = engine.create_scheme(NewScheme::named("Taken"), "admin").unwrap_err();
    assert_eq!(err,
               SchemeEngineError::Conflict(ConflictKind::DuplicateName("Taken".to_string())));
}

#[test]
fn create_rejects_bad_references_without_touching_storage() {
    let (engine, _) = engine();

    let err = engine.create_scheme(NewScheme::named(""), "admin").unwrap_err();
    match err {
        SchemeEngineError::Validation(errors) => assert!(errors.has_field("name")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = engine.create_scheme(NewScheme::named("Bad default").with_default("Missing"), "admin")
                    .unwrap_err();
    match err {
        SchemeEngineError::Validation(errors) => assert!(errors.has_field("default_workflow")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = engine.create_scheme(NewScheme::named("Bad mapping").with_mapping("bug", "Missing"), "admin")
                    .unwrap_err();
    match err {
        SchemeEngineError::Validation(errors) => assert!(errors.has_field("mappings")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = engine.create_scheme(NewScheme::named("Bad issue type").with_mapping("epic", "One"), "admin")
                    .unwrap_err();
    match err {
        SchemeEngineError::Validation(errors) => assert!(errors.has_field("mappings")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // nada de lo anterior debe haber quedado almacenado
    for name in ["Bad default", "Bad mapping", "Bad issue type"] {
        assert!(engine.repository().find_id_by_name(name).unwrap().is_none());
    }
}

#[test]
fn validation_accumulates_all_failures() {
    let (engine, _) = engine();
    let err = engine.create_scheme(NewScheme::named("Multi").with_default("Missing")
                                                            .with_mapping("epic", "AlsoMissing"),
                                   "admin")
                    .unwrap_err();
    match err {
        SchemeEngineError::Validation(errors) => {
            assert_eq!(errors.len(), 3);
            assert_eq!(errors.first().unwrap().field, "default_workflow");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn partial_update_only_touches_supplied_fields() {
    let (engine, _) = engine();
    let created = engine.create_scheme(NewScheme::named("Partial").with_description("before")
                                                                  .with_default("One")
                                                                  .with_mapping("bug", "Two"),
                                       "admin")
                        .unwrap();

    // sólo el nombre: descripción, default y mapeo quedan intactos
    let view = engine.update_scheme(created.id, SchemeUpdate::new().with_name("Partial 2"), false, "admin")
                     .unwrap();
    assert_eq!(view.name, "Partial 2");
    assert_eq!(view.description.as_deref(), Some("before"));
    assert_eq!(view.default_workflow.as_deref(), Some("One"));
    assert_eq!(view.mappings.len(), 1);

    // limpiar el default es distinto de no mencionarlo
    let view = engine.update_scheme(created.id, SchemeUpdate::new().clear_default(), false, "admin")
                     .unwrap();
    assert!(view.default_workflow.is_none());

    // un mapeo presente reemplaza la tabla completa
    let view = engine.update_scheme(created.id,
                                    SchemeUpdate::new().with_mapping("task", "Three"),
                                    false,
                                    "admin")
                     .unwrap();
    assert_eq!(view.mappings.len(), 1);
    assert_eq!(view.mappings.get("task").map(String::as_str), Some("Three"));
}

#[test]
fn update_unknown_scheme_is_not_found() {
    let (engine, _) = engine();
    let err = engine.update_scheme(Uuid::new_v4(), SchemeUpdate::new().with_name("nope"), false, "admin")
                    .unwrap_err();
    assert_eq!(err, SchemeEngineError::SchemeNotFound);
}

#[test]
fn update_to_taken_name_is_a_conflict() {
    let (engine, _) = engine();
    engine.create_scheme(NewScheme::named("Owner"), "admin").unwrap();
    let other = engine.create_scheme(NewScheme::named("Other"), "admin").unwrap();

    let err = engine.update_scheme(other.id, SchemeUpdate::new().with_name("Owner"), false, "admin")
                    .unwrap_err();
    assert_eq!(err,
               SchemeEngineError::Conflict(ConflictKind::DuplicateName("Owner".to_string())));

    // renombrar al propio nombre no es colisión
    engine.update_scheme(other.id, SchemeUpdate::new().with_name("Other"), false, "admin")
          .expect("self-rename should be fine");
}

#[test]
fn delete_refuses_active_schemes_and_removes_drafts() {
    let (engine, registry) = engine();
    let created = engine.create_scheme(NewScheme::named("Doomed"), "admin").unwrap();

    registry.assign("PRJ", created.id);
    let err = engine.delete_scheme(created.id).unwrap_err();
    assert_eq!(err, SchemeEngineError::Conflict(ConflictKind::ActiveSchemeDelete));

    engine.create_draft(created.id, "admin").unwrap();
    registry.unassign("PRJ");

    engine.delete_scheme(created.id).expect("inactive scheme should be deletable");
    assert_eq!(engine.get_scheme(created.id, false).unwrap_err(), SchemeEngineError::SchemeNotFound);
    assert_eq!(engine.get_draft_scheme(created.id).unwrap_err(), SchemeEngineError::DraftNotFound);

    // borrar dos veces: el esquema ya no está
    assert_eq!(engine.delete_scheme(created.id).unwrap_err(), SchemeEngineError::SchemeNotFound);
}
