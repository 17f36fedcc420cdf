use serde_json::json;

use crate::app::{resolve_project, AppContext};
use crate::output::{print_json, project_row, PROJECT_COLUMNS};
use crate::ui::{badge, header, hint, print, table, Badge};

pub fn handle_list(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let ui = ctx.ui();

    if ui.mode.is_json() {
        return print_json(&view.projects);
    }

    let rows: Vec<Vec<String>> = view
        .projects
        .iter()
        .map(|project| project_row(&view, project))
        .collect();
    print(&ui, &header(&ui, "projects", None));
    print(&ui, &table(&ui, &PROJECT_COLUMNS, &rows));
    Ok(())
}

pub fn handle_add(ctx: &AppContext<'_>, name: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let project = store.add_project(&session, name)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&project);
    }
    if ctx.quiet() {
        println!("{}", project.id);
    } else {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Added project {}", project.name)));
        print(&ui, &hint(&ui, &format!("taskvault tasks add <title> --project \"{}\"", project.name)));
    }
    Ok(())
}

pub fn handle_rename(ctx: &AppContext<'_>, reference: &str, name: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let id = resolve_project(&view, reference)?.id.clone();
    let project = store.rename_project(&session, &id, name)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&project);
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Renamed project to {}", project.name)));
    }
    Ok(())
}

pub fn handle_delete(ctx: &AppContext<'_>, reference: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let project = resolve_project(&view, reference)?;
    let (id, name) = (project.id.clone(), project.name.clone());
    let moved = store.delete_project(&session, &id)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "deleted": id, "tasksMoved": moved }));
    }
    if !ctx.quiet() {
        let message = format!("Deleted project {}; {} task(s) moved to Inbox", name, moved);
        print(&ui, &badge(&ui, Badge::Ok, &message));
    }
    Ok(())
}
