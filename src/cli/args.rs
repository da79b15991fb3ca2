//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Build, edit and lay out single-parent trees stored as keyed documents
#[derive(Parser, Debug)]
#[command(name = "yggdraw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Document an edit is applied to
#[derive(Args, Debug)]
pub struct EditTarget {
    /// Document file (.json, .yaml, .yml)
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Print the animation frames from the old to the new layout
    #[arg(long)]
    pub frames: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a document holding a single root node
    New {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Display id of the root
        #[arg(default_value = "root")]
        id: String,
    },

    /// Show the tree by document key
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Add a child node
    Add {
        #[command(flatten)]
        target: EditTarget,
        /// Key of the parent node
        parent: String,
        /// Display id of the new node
        id: String,
        /// Payload, parsed as JSON when possible, else kept as text
        #[arg(long)]
        data: Option<String>,
    },

    /// Change the display id of a node
    Rename {
        #[command(flatten)]
        target: EditTarget,
        /// Key of the node
        key: String,
        /// New display id
        id: String,
    },

    /// Move a node under a new parent
    Move {
        #[command(flatten)]
        target: EditTarget,
        /// Key of the node to move
        key: String,
        /// Key of the new parent
        parent: String,
    },

    /// Remove a node and everything below it
    Remove {
        #[command(flatten)]
        target: EditTarget,
        /// Key of the node
        key: String,
    },

    /// Sort children by display id
    Sort {
        #[command(flatten)]
        target: EditTarget,
        /// Key of the node whose children are sorted (default: root)
        key: Option<String>,
        /// Sort the whole subtree
        #[arg(short, long)]
        recursive: bool,
    },

    /// Set a document option (e.g. graph.radius 30)
    Set {
        #[command(flatten)]
        target: EditTarget,
        /// Option key
        option: String,
        /// New value
        value: String,
    },

    /// Print document options
    Get {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Single option key (default: all)
        option: Option<String>,
    },

    /// Print node positions, connectors and arrowheads in pixels
    Layout {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Multiply every length by this factor
        #[arg(long)]
        scale: Option<f64>,
    },

    /// List export formats and their availability
    Formats,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show global config file location
    Path,
}
