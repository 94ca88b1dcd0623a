mod cli;
mod pipeline;

use clap::Parser;
use cli::{Cli, ResolvedCommand};
use pipeline::{build_files, check_files};
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.resolve_command() {
        ResolvedCommand::Build {
            files,
            root,
            out,
            parallel,
        } => build_files(&files, &root, out.as_deref(), parallel).map(|report| {
            eprintln!("emitted {} program(s)", report.programs);
        }),
        ResolvedCommand::Check { files, root } => check_files(&files, &root).map(|report| {
            eprintln!("checked {} program(s)", report.programs);
        }),
    };

    if let Err(error) = result {
        eprintln!("{}", error);
        process::exit(1);
    }
}
