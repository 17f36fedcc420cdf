use serde_json::json;

use taskvault_core::{MergedView, NewTask, TaskPatch};

use crate::app::{resolve_project, resolve_task, AppContext};
use crate::cli::{TaskAddArgs, TaskListArgs, TaskUpdateArgs};
use crate::helpers::parse_due;
use crate::output::{print_json, task_row, TASK_COLUMNS};
use crate::ui::{badge, header, hint, print, short_id, table, Badge};

fn project_id(view: &MergedView, reference: Option<&str>) -> anyhow::Result<Option<String>> {
    reference
        .map(|r| resolve_project(view, r).map(|project| project.id.clone()))
        .transpose()
        .map_err(Into::into)
}

pub fn handle_list(ctx: &AppContext<'_>, args: &TaskListArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let project = project_id(&view, args.project.as_deref())?;

    let tasks: Vec<_> = view
        .tasks
        .iter()
        .filter(|task| args.all || !task.completed)
        .filter(|task| project.as_deref().map_or(true, |id| task.project_id == id))
        .filter(|task| {
            args.tag
                .as_deref()
                .map_or(true, |tag| task.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        })
        .collect();

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&tasks);
    }

    let context = args.project.as_deref();
    print(&ui, &header(&ui, "tasks", context));
    if tasks.is_empty() {
        if !ctx.quiet() {
            print(&ui, "No tasks.");
            print(&ui, &hint(&ui, "taskvault tasks add <title>"));
        }
        return Ok(());
    }
    let rows: Vec<Vec<String>> = tasks.iter().map(|task| task_row(&view, task)).collect();
    print(&ui, &table(&ui, &TASK_COLUMNS, &rows));
    Ok(())
}

pub fn handle_add(ctx: &AppContext<'_>, args: &TaskAddArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;

    let new_task = NewTask {
        title: args.title.clone(),
        description: args.description.clone(),
        project_id: project_id(&view, args.project.as_deref())?,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
        priority: args.priority,
        tags: args.tags.clone(),
        completed: args.done,
    };
    let task = store.add_task(&session, new_task)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&task);
    }
    if ctx.quiet() {
        println!("{}", task.id);
    } else {
        let message = format!("Added task {} ({})", task.title, short_id(&task.id));
        print(&ui, &badge(&ui, Badge::Ok, &message));
    }
    Ok(())
}

pub fn handle_update(ctx: &AppContext<'_>, args: &TaskUpdateArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let id = resolve_task(&view, &args.id)?.id.clone();

    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due.as_deref().map(parse_due).transpose()?.map(Some)
    };
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(args.tags.clone())
    };
    let patch = TaskPatch {
        title: args.title.clone(),
        description: args.description.clone(),
        project_id: project_id(&view, args.project.as_deref())?,
        due_date,
        priority: args.priority,
        tags,
        completed: None,
    };
    let task = store.update_task(&session, &id, patch)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&task);
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Updated task {}", task.title)));
    }
    Ok(())
}

pub fn handle_set_completed(ctx: &AppContext<'_>, reference: &str, completed: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let id = resolve_task(&view, reference)?.id.clone();

    let patch = TaskPatch {
        completed: Some(completed),
        ..TaskPatch::default()
    };
    let task = store.update_task(&session, &id, patch)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&task);
    }
    if !ctx.quiet() {
        let state = if completed { "completed" } else { "reopened" };
        print(&ui, &badge(&ui, Badge::Ok, &format!("Task {} {}", task.title, state)));
    }
    Ok(())
}

pub fn handle_delete(ctx: &AppContext<'_>, reference: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let view = store.load(&session)?.view;
    let id = resolve_task(&view, reference)?.id.clone();
    let task = store.delete_task(&session, &id)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "deleted": task.id }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Deleted task {}", task.title)));
    }
    Ok(())
}
