//! Inkboard command line entry point.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, DocCommand, FontsCommand, SettingsCommand};
use commands::Workspace;
use inkboard_core::InkboardConfig;
use std::io;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = InkboardConfig::discover(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    log::debug!("Starting Inkboard with {:?}", config);

    let ws = Workspace::open(config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Doc(DocCommand::Get { id }) => commands::doc_get(&ws, &id, &mut out),
        Command::Doc(DocCommand::Put { id, file }) => {
            commands::doc_put(&ws, &id, file.as_deref(), io::stdin().lock())
        }
        Command::Doc(DocCommand::List) => commands::doc_list(&ws, &mut out),
        Command::Doc(DocCommand::Delete { id }) => commands::doc_delete(&ws, &id),
        Command::New { name } => commands::new_document(&ws, &name, &mut out),
        Command::Edit { id, name } => commands::edit(
            &ws,
            id.as_deref(),
            name.as_deref(),
            io::stdin().lock(),
            &mut out,
        )
        .map(|_| ()),
        Command::Settings(SettingsCommand::Get { key }) => {
            commands::settings_get(&ws, &key, &mut out)
        }
        Command::Settings(SettingsCommand::Set { key, value }) => {
            commands::settings_set(&ws, &key, &value)
        }
        Command::Settings(SettingsCommand::Clear { key }) => commands::settings_clear(&ws, &key),
        Command::Settings(SettingsCommand::List) => commands::settings_list(&ws, &mut out),
        Command::Fonts(FontsCommand::Add { name }) => commands::fonts_add(&ws, &name),
        Command::Fonts(FontsCommand::List) => commands::fonts_list(&ws, &mut out),
    }
}
