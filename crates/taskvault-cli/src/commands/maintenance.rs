use serde_json::json;

use crate::app::AppContext;
use crate::constants::exit_codes;
use crate::errors::CliError;
use crate::helpers::confirm;
use crate::output::print_json;
use crate::ui::{badge, blank_line, header, hint, kv, print, Badge};

pub fn handle_reset(ctx: &AppContext<'_>, yes: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let prompt = format!(
        "Delete all tasks, projects and settings in {}?",
        store.paths().dir.display()
    );
    if !confirm(&prompt, yes, ctx.interactive())? {
        return Err(anyhow::anyhow!("Reset cancelled"));
    }

    let mut session = ctx.session()?;
    session.reset_environment(store)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "reset": true }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, "All data removed. Encryption is off."));
    }
    Ok(())
}

/// Report the store layout and security state, then run the integrity checks.
pub fn handle_doctor(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.unlocked_session()?;
    let security = session.security_config(store)?;
    let report = store.check_integrity(&session)?;
    let ui = ctx.ui();

    if ui.mode.is_json() {
        print_json(&json!({
            "dataDir": store.paths().dir,
            "security": security,
            "integrity": report,
        }))?;
    } else {
        print(&ui, &header(&ui, "doctor", None));
        print(&ui, &kv(&ui, "Data dir", &store.paths().dir.display().to_string()));
        for path in store.paths().all_files() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let state = if path.exists() { "present" } else { "absent" };
            print(&ui, &kv(&ui, &name, state));
        }
        print(&ui, &kv(&ui, "Active tasks", &report.active_tasks.to_string()));
        print(&ui, &kv(&ui, "Archived tasks", &report.archived_tasks.to_string()));
        blank_line(&ui);
        if report.is_healthy() {
            print(&ui, &badge(&ui, Badge::Ok, "No problems found."));
        } else {
            for problem in &report.problems {
                print(&ui, &badge(&ui, Badge::Err, problem));
            }
        }
    }

    if report.is_healthy() {
        Ok(())
    } else {
        if !ui.mode.is_json() {
            print(&ui, &hint(&ui, "Restore from a backup or fix the data files by hand."));
        }
        Err(CliError::new(
            exit_codes::INTEGRITY_FAILED,
            format!("Integrity check found {} problem(s)", report.problems.len()),
        )
        .into())
    }
}
