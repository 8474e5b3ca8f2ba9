//! Demo del motor de esquemas en memoria: alta, asignación a proyecto,
//! guarda de activación, borrador y descarte.

use trackflow_rust::{InMemorySchemeRepository, NewScheme, ProjectAssignmentRegistry, SchemeEngineError,
                     SchemeUpdate, StaticIssueTypeCatalog, StaticWorkflowCatalog, WorkflowSchemeEngine};

fn run_demo() -> Result<(), String> {
    let registry = ProjectAssignmentRegistry::new();
    let engine = WorkflowSchemeEngine::builder(InMemorySchemeRepository::new(), registry.clone())
        .catalogs(StaticWorkflowCatalog::new(["Simple", "Reviewed", "Expedited"]),
                  StaticIssueTypeCatalog::new(["bug", "task", "feature"]));

    // 1. Alta del esquema y lectura de vuelta
    let created = engine.create_scheme(NewScheme::named("Equipo backend").with_description("flujo del equipo")
                                                                         .with_default("Simple")
                                                                         .with_mapping("bug", "Reviewed"),
                                       "admin")
                        .map_err(|e| e.to_string())?;
    println!("[demo] esquema creado: {} ({})", created.name, created.id);
    println!("[demo] default efectivo: {}", engine.get_default(created.id, false).map_err(|e| e.to_string())?);

    // 2. Sin proyecto asignado las ediciones aplican en el lugar
    engine.set_issue_type_mapping(created.id, "task", "Expedited", false, "admin")
          .map_err(|e| e.to_string())?;
    println!("[demo] edición directa aplicada sobre la capa activa");

    // 3. Con proyecto asignado la misma edición exige borrador
    registry.assign("BCK", created.id);
    match engine.set_issue_type_mapping(created.id, "feature", "Reviewed", false, "admin") {
        Err(SchemeEngineError::Conflict(kind)) => println!("[demo] guarda de activación: {kind}"),
        other => return Err(format!("se esperaba conflicto, llegó {other:?}")),
    }

    let draft = engine.set_issue_type_mapping(created.id, "feature", "Reviewed", true, "admin")
                      .map_err(|e| e.to_string())?;
    println!("[demo] borrador creado; mapeos del borrador: {}", draft.mappings.len());

    // los cambios cosméticos no pasan por la guarda... pero con borrador
    // presente el resto del payload sí aterriza en él
    engine.update_scheme(created.id, SchemeUpdate::new().with_description("editado en borrador"), false, "admin")
          .map_err(|e| e.to_string())?;

    let active = engine.get_scheme(created.id, false).map_err(|e| e.to_string())?;
    let proposed = engine.get_scheme(created.id, true).map_err(|e| e.to_string())?;
    println!("[demo] activa: {} mapeos / propuesta: {} mapeos",
             active.mappings.len(),
             proposed.mappings.len());

    // 4. Descartar el borrador restaura la línea base
    engine.discard_draft(created.id).map_err(|e| e.to_string())?;
    let restored = engine.get_scheme(created.id, true).map_err(|e| e.to_string())?;
    println!("[demo] tras descartar, vista efectiva sin borrador: {} mapeos", restored.mappings.len());

    // 5. Un esquema asignado no se puede borrar; al soltarlo, sí
    if engine.delete_scheme(created.id).is_ok() {
        return Err("el borrado de un esquema activo debía fallar".to_string());
    }
    registry.unassign("BCK");
    engine.delete_scheme(created.id).map_err(|e| e.to_string())?;
    println!("[demo] esquema borrado");

    Ok(())
}

fn main() {
    if let Err(err) = run_demo() {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}
