use track_adapters::{ProjectAssignmentRegistry, StaticIssueTypeCatalog, StaticWorkflowCatalog};
use track_core::{ConflictKind, InMemorySchemeRepository, SchemeEngineError, WorkflowSchemeEngine};
use track_domain::{NewScheme, SchemeUpdate, SYSTEM_DEFAULT_WORKFLOW};
use uuid::Uuid;

type Engine = WorkflowSchemeEngine<InMemorySchemeRepository, ProjectAssignmentRegistry>;

fn engine() -> (Engine, ProjectAssignmentRegistry) {
    let registry = ProjectAssignmentRegistry::new();
    let engine = WorkflowSchemeEngine::builder(InMemorySchemeRepository::new(), registry.clone())
        .catalogs(StaticWorkflowCatalog::new(["One", "Two", "Three", "Four", "Five"]),
                  StaticIssueTypeCatalog::new(["bug", "task", "feature", "improvement"]));
    (engine, registry)
}

/// Esquema activo asignado a un proyecto, listo para trabajar con borradores.
fn assigned_scheme(engine: &Engine, registry: &ProjectAssignmentRegistry) -> Uuid {
    let created = engine.create_scheme(NewScheme::named("Assigned").with_default("One")
                                                                   .with_mapping("bug", "Two")
                                                                   .with_mapping("task", "Two"),
                                       "admin")
                        .unwrap();
    registry.assign("PRJ", created.id);
    created.id
}

#[test]
fn explicit_draft_creation_copies_the_active_layer() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);

    let draft = engine.create_draft(id, "editor").unwrap();
    assert!(draft.draft);
    assert_eq!(draft.name, "Assigned");
    assert_eq!(draft.default_workflow.as_deref(), Some("One"));
    assert_eq!(draft.mappings.get("bug").map(String::as_str), Some("Two"));
    assert_eq!(draft.original_default_workflow.as_deref(), Some("One"));
    assert_eq!(draft.original_mappings.as_ref().unwrap().len(), 2);
    assert_eq!(draft.last_modified_user, "editor");

    // un segundo borrador es un conflicto
    let err = engine.create_draft(id, "editor").unwrap_err();
    assert_eq!(err, SchemeEngineError::Conflict(ConflictKind::DraftExists));
}

#[test]
fn draft_reads_are_isolated_from_the_active_layer() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);

    engine.create_draft(id, "admin").unwrap();
    engine.set_issue_type_mapping(id, "feature", "Five", false, "admin").unwrap();

    // sin pedir el borrador, siempre la capa activa
    let active = engine.get_scheme(id, false).unwrap();
    assert!(!active.draft);
    assert!(active.mappings.get("feature").is_none());

    // pidiéndolo, la capa del borrador
    let draft = engine.get_scheme(id, true).unwrap();
    assert!(draft.draft);
    assert_eq!(draft.mappings.get("feature").map(String::as_str), Some("Five"));
    assert_eq!(draft.original_mappings.as_ref().unwrap().len(), 2);
}

#[test]
fn draft_namespace_reports_not_found_without_a_draft() {
    let (engine, registry) = engine();

    // padre inexistente
    assert_eq!(engine.get_draft_scheme(Uuid::new_v4()).unwrap_err(),
               SchemeEngineError::DraftNotFound);

    // padre existente sin borrador
    let id = assigned_scheme(&engine, &registry);
    assert_eq!(engine.get_draft_scheme(id).unwrap_err(), SchemeEngineError::DraftNotFound);

    engine.create_draft(id, "admin").unwrap();
    assert!(engine.get_draft_scheme(id).unwrap().draft);
}

#[test]
fn discard_restores_the_active_baseline() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);

    engine.set_default(id, "Four", true, "admin").unwrap();
    assert_eq!(engine.get_scheme(id, true).unwrap().default_workflow.as_deref(), Some("Four"));

    engine.discard_draft(id).unwrap();

    let view = engine.get_scheme(id, true).unwrap();
    assert!(!view.draft);
    assert_eq!(view.default_workflow.as_deref(), Some("One"));
    assert_eq!(engine.get_draft_scheme(id).unwrap_err(), SchemeEngineError::DraftNotFound);

    // descartar de nuevo es inocuo
    engine.discard_draft(id).unwrap();
}

#[test]
fn draft_from_unset_default_inherits_unset() {
    let (engine, registry) = engine();
    let created = engine.create_scheme(NewScheme::named("No default").with_mapping("bug", "Two"), "admin")
                        .unwrap();
    registry.assign("ND", created.id);

    let draft = engine.create_draft(created.id, "admin").unwrap();
    assert!(draft.default_workflow.is_none());
    assert!(draft.original_default_workflow.is_none());
    // en lectura el default efectivo sigue resolviendo al workflow del sistema
    assert_eq!(engine.get_default(created.id, true).unwrap(), SYSTEM_DEFAULT_WORKFLOW);
}

#[test]
fn existing_draft_captures_edits_even_without_the_flag() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);
    engine.create_draft(id, "admin").unwrap();

    // con borrador presente la mutación va al borrador aunque el flag sea false
    let view = engine.set_default(id, "Three", false, "admin").unwrap();
    assert!(view.draft);
    assert_eq!(view.default_workflow.as_deref(), Some("Three"));
    assert_eq!(engine.get_scheme(id, false).unwrap().default_workflow.as_deref(), Some("One"));
}

#[test]
fn invalid_update_does_not_create_a_draft() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);

    let overlong = "&".repeat(512);
    let update = SchemeUpdate::new().with_name(&overlong).with_default("Five");
    let err = engine.update_scheme(id, update, true, "admin").unwrap_err();
    assert!(matches!(err, SchemeEngineError::Validation(_)));

    // la validación corre antes de cualquier escritura
    assert_eq!(engine.get_draft_scheme(id).unwrap_err(), SchemeEngineError::DraftNotFound);
    assert_eq!(engine.get_scheme(id, false).unwrap().default_workflow.as_deref(), Some("One"));
}

#[test]
fn draft_rename_may_shadow_another_active_scheme_name() {
    let (engine, registry) = engine();
    engine.create_scheme(NewScheme::named("Taken"), "admin").unwrap();
    let id = assigned_scheme(&engine, &registry);
    engine.create_draft(id, "admin").unwrap();

    // el nombre del borrador no se compara con las capas activas de otros
    // esquemas; la unicidad se re-verifica recién al publicar
    let view = engine.update_scheme(id, SchemeUpdate::new().with_name("Taken"), false, "admin")
                     .unwrap();
    assert!(view.draft);
    assert_eq!(view.name, "Taken");
    assert_eq!(engine.get_scheme(id, false).unwrap().name, "Assigned");
}

#[test]
fn draft_keeps_its_own_name_and_description() {
    let (engine, registry) = engine();
    let id = assigned_scheme(&engine, &registry);
    engine.create_draft(id, "admin").unwrap();

    let update = SchemeUpdate::new().with_name("Renamed draft").with_description("draft only");
    let view = engine.update_scheme(id, update, false, "admin").unwrap();
    assert!(view.draft);
    assert_eq!(view.name, "Renamed draft");

    let active = engine.get_scheme(id, false).unwrap();
    assert_eq!(active.name, "Assigned");
    assert!(active.description.is_none());
}
