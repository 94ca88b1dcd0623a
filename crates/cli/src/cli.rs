//! Command-line interface for Basalt.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Basalt - translate pattern-matching functional source trees into
/// module-based target programs
#[derive(Parser)]
#[command(name = "basalt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Source AST files to build (when no subcommand is specified)
    pub files: Vec<PathBuf>,

    /// Compilation root for emitted import paths
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate source AST files into target programs
    Build {
        /// Source AST files (JSON, one root form per file)
        files: Vec<PathBuf>,

        /// Compilation root for emitted import paths
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Directory to write emitted programs into (stdout when absent)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Translate files in parallel with per-file scratch contexts
        #[arg(long)]
        parallel: bool,
    },

    /// Translate without emitting, reporting errors only
    Check {
        /// Source AST files
        files: Vec<PathBuf>,

        /// Compilation root for emitted import paths
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

impl Cli {
    /// Resolve the actual command to run.
    pub fn resolve_command(self) -> ResolvedCommand {
        match self.command {
            Some(Commands::Build {
                files,
                root,
                out,
                parallel,
            }) => ResolvedCommand::Build {
                files,
                root,
                out,
                parallel,
            },
            Some(Commands::Check { files, root }) => ResolvedCommand::Check { files, root },
            None => ResolvedCommand::Build {
                files: self.files,
                root: self.root,
                out: None,
                parallel: false,
            },
        }
    }
}

/// Resolved command after processing CLI arguments.
pub enum ResolvedCommand {
    Build {
        files: Vec<PathBuf>,
        root: PathBuf,
        out: Option<PathBuf>,
        parallel: bool,
    },
    Check {
        files: Vec<PathBuf>,
        root: PathBuf,
    },
}
