use std::path::Path;

use serde_json::json;
use tracing::debug;

use taskvault_core::{export_backup_to, import_backup_from, ImportOutcome, VaultError};

use crate::app::{unlock_session, AppContext};
use crate::helpers::confirm;
use crate::output::print_json;
use crate::ui::{badge, hint, print, Badge};

pub fn handle_export(ctx: &AppContext<'_>, destination: &Path) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let document = export_backup_to(store, destination)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({
            "path": destination,
            "encrypted": document.encryption_enabled,
        }));
    }
    if !ctx.quiet() {
        let message = format!("Wrote backup to {}", destination.display());
        print(&ui, &badge(&ui, Badge::Ok, &message));
        if document.encryption_enabled {
            print(&ui, &hint(&ui, "Restoring this backup requires the current secret."));
        }
    }
    Ok(())
}

pub fn handle_import(ctx: &AppContext<'_>, source: &Path, yes: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let prompt = format!("Replace all current data with {}?", source.display());
    if !confirm(&prompt, yes, ctx.interactive())? {
        return Err(anyhow::anyhow!("Import cancelled"));
    }

    let mut session = ctx.session()?;
    let outcome = match import_backup_from(store, &mut session, source) {
        Err(VaultError::Locked) => {
            debug!("plaintext backup into an encrypted store; unlocking");
            unlock_session(store, &mut session, ctx.cli().no_input)?;
            import_backup_from(store, &mut session, source)?
        }
        other => other?,
    };

    let ui = ctx.ui();
    let encrypted = matches!(outcome, ImportOutcome::Encrypted);
    if ui.mode.is_json() {
        return print_json(&json!({ "imported": source, "encrypted": encrypted }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Imported {}", source.display())));
        if encrypted {
            print(&ui, &hint(&ui, "Unlock with the secret that was active when the backup was made."));
        }
    }
    Ok(())
}
