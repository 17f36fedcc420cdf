//! Application context shared by every command handler.

use std::io::IsTerminal;

use once_cell::unsync::OnceCell;
use tracing::debug;

use taskvault_core::{DataStore, KeyringEscrow, SessionLock};

use crate::cli::Cli;
use crate::config::{load_config, resolve_config_path, resolve_data_dir, store_config, TaskvaultConfig};
use crate::ui::UiContext;

use super::gate::ConsoleGate;
use super::unlock::unlock_session;

/// CLI flags plus the config and store, loaded on first use.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<TaskvaultConfig>,
    store: OnceCell<DataStore>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            store: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Prompts are allowed only on a terminal without `--no-input`.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && std::io::stdin().is_terminal()
    }

    pub fn ui(&self) -> UiContext {
        UiContext::from_env(self.cli.json, self.cli.no_color, self.cli.ascii)
    }

    pub fn config(&self) -> anyhow::Result<&TaskvaultConfig> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        })
    }

    /// Open the store in the resolved data directory.
    pub fn store(&self) -> anyhow::Result<&DataStore> {
        self.store.get_or_try_init(|| {
            let config = self.config()?;
            let dir = resolve_data_dir(self.cli.dir.as_deref(), config)?;
            debug!(dir = %dir.display(), "opening store");
            Ok(DataStore::open(store_config(dir, config))?)
        })
    }

    /// A locked session wired to the OS keychain and the console gate.
    pub fn session(&self) -> anyhow::Result<SessionLock> {
        let store = self.store()?;
        let gate = ConsoleGate::new(self.config()?.security.biometrics_prompt, self.cli.no_input);
        Ok(SessionLock::new(KeyringEscrow::for_data_dir(&store.paths().dir), gate))
    }

    /// A session unlocked for data access. Stays locked when encryption is off.
    pub fn unlocked_session(&self) -> anyhow::Result<SessionLock> {
        let mut session = self.session()?;
        unlock_session(self.store()?, &mut session, self.cli.no_input)?;
        Ok(session)
    }
}
