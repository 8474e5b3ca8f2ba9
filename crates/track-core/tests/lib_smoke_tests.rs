use track_adapters::{ProjectAssignmentRegistry, StaticIssueTypeCatalog, StaticWorkflowCatalog};
use track_core::{ConflictKind, InMemorySchemeRepository, SchemeEngineError, WorkflowSchemeEngine};
use track_domain::NewScheme;

fn engine() -> (WorkflowSchemeEngine<InMemorySchemeRepository, ProjectAssignmentRegistry>,
                ProjectAssignmentRegistry) {
    let registry = ProjectAssignmentRegistry::new();
    let engine = WorkflowSchemeEngine::builder(InMemorySchemeRepository::new(), registry.clone())
        .catalogs(StaticWorkflowCatalog::new(["One", "Two", "Three"]),
                  StaticIssueTypeCatalog::new(["bug", "task", "feature"]));
    (engine, registry)
}

#[test]
fn create_and_read_round_trip() {
    let (engine, _) = engine();
    let created = engine.create_scheme(NewScheme::named("Dev scheme").with_default("One")
                                                                     .with_mapping("bug", "Two"),
                                       "admin")
                        .expect("create should succeed");
    let view = engine.get_scheme(created.id, false).expect("scheme should exist");
    assert_eq!(view.name, "Dev scheme");
    assert_eq!(view.default_workflow.as_deref(), Some("One"));
    assert_eq!(view.mappings.get("bug").map(String::as_str), Some("Two"));
    assert!(!view.draft);
}

#[test]
fn guarded_edit_on_assigned_scheme_needs_the_draft_flag() {
    let (engine, registry) = engine();
    let created = engine.create_scheme(NewScheme::named("Assigned"), "admin").unwrap();
    registry.assign("PRJ", created.id);

    let err = engine.set_issue_type_mapping(created.id, "bug", "Two", false, "admin")
                    .unwrap_err();
    assert_eq!(err, SchemeEngineError::Conflict(ConflictKind::ActiveScheme));

    let view = engine.set_issue_type_mapping(created.id, "bug", "Two", true, "admin")
                     .expect("draft edit should succeed");
    assert!(view.draft);
}
