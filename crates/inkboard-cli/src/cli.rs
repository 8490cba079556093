//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "inkboard", version, about = "Manage Inkboard documents and settings")]
pub struct Cli {
    /// Config file (defaults to the per-user config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory, overriding the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read and write stored documents
    #[command(subcommand)]
    Doc(DocCommand),

    /// Create an empty document and make it current
    New {
        /// Display name
        #[arg(default_value = "Untitled")]
        name: String,
    },

    /// Edit a document: every stdin line is a new JSON scene
    Edit {
        /// Document id (defaults to the current document)
        id: Option<String>,
        /// Display name used in logs
        #[arg(long)]
        name: Option<String>,
    },

    /// Read and write settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage custom board fonts
    #[command(subcommand)]
    Fonts(FontsCommand),
}

#[derive(Debug, Subcommand)]
pub enum DocCommand {
    /// Print a document's content (the empty scene if never saved)
    Get { id: String },
    /// Store JSON content for a document, from a file or stdin
    Put {
        id: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored document ids
    List,
    /// Delete a stored document
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print one setting
    Get { key: String },
    /// Overwrite one setting
    Set { key: String, value: String },
    /// Remove one setting
    Clear { key: String },
    /// Print every setting
    List,
}

#[derive(Debug, Subcommand)]
pub enum FontsCommand {
    /// Add a font unless it is already listed
    Add { name: String },
    /// Print the custom font list
    List,
}
