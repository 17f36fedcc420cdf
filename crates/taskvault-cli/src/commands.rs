//! Command handlers, one module per command group.

mod backup;
mod maintenance;
mod projects;
mod security;
mod tasks;

use crate::app::AppContext;
use crate::cli::{BackupSubcommand, Commands, ProjectsSubcommand, TasksSubcommand, Toggle};

/// Route the parsed command to its handler.
pub fn dispatch(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    match &ctx.cli().command {
        Commands::Status => security::handle_status(ctx),
        Commands::Enable(args) => security::handle_enable(ctx, args.biometrics),
        Commands::Disable => security::handle_disable(ctx),
        Commands::Unlock => security::handle_unlock(ctx),
        Commands::Lock => security::handle_lock(ctx),
        Commands::Biometrics(args) => {
            security::handle_biometrics(ctx, matches!(args.state, Toggle::On))
        }
        Commands::Projects(args) => match &args.command {
            ProjectsSubcommand::List => projects::handle_list(ctx),
            ProjectsSubcommand::Add { name } => projects::handle_add(ctx, name),
            ProjectsSubcommand::Rename { project, name } => {
                projects::handle_rename(ctx, project, name)
            }
            ProjectsSubcommand::Delete { project } => projects::handle_delete(ctx, project),
        },
        Commands::Tasks(args) => match &args.command {
            TasksSubcommand::List(list) => tasks::handle_list(ctx, list),
            TasksSubcommand::Add(add) => tasks::handle_add(ctx, add),
            TasksSubcommand::Update(update) => tasks::handle_update(ctx, update),
            TasksSubcommand::Done { id } => tasks::handle_set_completed(ctx, id, true),
            TasksSubcommand::Undone { id } => tasks::handle_set_completed(ctx, id, false),
            TasksSubcommand::Delete { id } => tasks::handle_delete(ctx, id),
        },
        Commands::Backup(args) => match &args.command {
            BackupSubcommand::Export { destination } => backup::handle_export(ctx, destination),
            BackupSubcommand::Import { source, yes } => backup::handle_import(ctx, source, *yes),
        },
        Commands::Reset(args) => maintenance::handle_reset(ctx, args.yes),
        Commands::Doctor => maintenance::handle_doctor(ctx),
    }
}
