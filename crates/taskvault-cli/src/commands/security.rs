use serde_json::json;

use taskvault_core::{EnableOutcome, UnlockMethod};

use crate::app::AppContext;
use crate::helpers::prompt_new_secret;
use crate::output::print_json;
use crate::ui::{badge, header, kv, print, Badge};

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn handle_status(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let session = ctx.session()?;
    let config = session.security_config(store)?;
    let ui = ctx.ui();

    if ui.mode.is_json() {
        return print_json(&json!({
            "dataDir": store.paths().dir,
            "security": config,
        }));
    }

    print(&ui, &header(&ui, "status", None));
    print(&ui, &kv(&ui, "Data dir", &store.paths().dir.display().to_string()));
    print(&ui, &kv(&ui, "Encryption", on_off(config.encryption_enabled)));
    print(&ui, &kv(&ui, "Biometric unlock", on_off(config.use_biometrics)));
    print(
        &ui,
        &kv(&ui, "Biometrics available", on_off(config.biometrics_available)),
    );
    Ok(())
}

pub fn handle_enable(ctx: &AppContext<'_>, biometrics: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let mut session = ctx.session()?;
    let ui = ctx.ui();

    if store.settings()?.encryption_enabled {
        if ui.mode.is_json() {
            return print_json(&json!({ "status": "already_enabled" }));
        }
        print(&ui, &badge(&ui, Badge::Info, "Encryption is already enabled."));
        return Ok(());
    }

    let secret = prompt_new_secret(ctx.interactive())?;
    let outcome = session.enable(store, &secret, biometrics)?;
    let escrowed = matches!(outcome, EnableOutcome::Enabled { biometrics: true });

    if ui.mode.is_json() {
        return print_json(&json!({ "status": "enabled", "biometrics": escrowed }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, "Encryption enabled."));
        if biometrics && !escrowed {
            print(
                &ui,
                &badge(&ui, Badge::Warn, "Biometric unlock is unavailable; the secret is required."),
            );
        }
    }
    Ok(())
}

pub fn handle_disable(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let mut session = ctx.unlocked_session()?;
    session.disable(store)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "status": "disabled" }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, "Encryption disabled. Data is stored as plaintext."));
    }
    Ok(())
}

pub fn handle_unlock(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let mut session = ctx.session()?;
    let method = crate::app::unlock_session(store, &mut session, ctx.cli().no_input)?;

    let label = match method {
        Some(UnlockMethod::Secret) => "secret",
        Some(UnlockMethod::Biometrics) => "biometrics",
        None => "none",
    };
    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "unlocked": method.is_some(), "method": label }));
    }
    if !ctx.quiet() {
        match method {
            Some(_) => print(&ui, &badge(&ui, Badge::Ok, &format!("Unlocked with {}.", label))),
            None => print(
                &ui,
                &badge(&ui, Badge::Info, "Encryption is off; nothing to unlock."),
            ),
        }
    }
    Ok(())
}

/// Every invocation starts locked; this only drops a key if one was loaded.
pub fn handle_lock(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let mut session = ctx.session()?;
    session.lock();

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "locked": true }));
    }
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Locked, "Session locked."));
    }
    Ok(())
}

pub fn handle_biometrics(ctx: &AppContext<'_>, enabled: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let mut session = ctx.unlocked_session()?;
    let state = session.set_use_biometrics(store, enabled)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "useBiometrics": state }));
    }
    if !ctx.quiet() {
        let message = format!("Biometric unlock {}.", on_off(state));
        print(&ui, &badge(&ui, Badge::Ok, &message));
    }
    Ok(())
}
