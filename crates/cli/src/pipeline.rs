//! Pipeline for translating source AST files.
//!
//! Each input file holds one JSON-serialized root form (the parser is
//! an external collaborator). Files translate either sequentially into
//! one context, or in parallel into per-file scratch contexts that are
//! merged afterwards — duplicate module names across files are fatal
//! either way. After the merge, the import-resolution pass runs and
//! every finished program is emitted as JSON.

use basalt_estree::Node;
use basalt_syntax::Form;
use basalt_translate::{translate_source, CompilationContext, TranslateError};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline error type.
#[derive(Debug)]
pub enum PipelineError {
    /// File I/O error
    Io { path: PathBuf, source: std::io::Error },
    /// Malformed source AST JSON
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Translation error
    Translate {
        path: PathBuf,
        source: TranslateError,
    },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            PipelineError::Json { path, source } => {
                write!(f, "{}: malformed source AST: {}", path.display(), source)
            }
            PipelineError::Translate { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// One emitted program with its output path.
struct Emitted {
    /// Import-path-relative location, e.g. `hello/world`.
    path: String,
    /// The dotted module name, or the source file for file-scope
    /// programs.
    label: String,
    program: Node,
}

/// Summary of a build, for reporting.
pub struct BuildReport {
    pub programs: usize,
}

pub fn build_files(
    files: &[PathBuf],
    root: &Path,
    out: Option<&Path>,
    parallel: bool,
) -> PipelineResult<BuildReport> {
    let (ctx, scripts) = translate_files(files, root, parallel)?;
    let mut ctx = ctx;
    ctx.process_imports();

    let mut emitted: Vec<Emitted> = Vec::new();
    for (path, program) in scripts {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        emitted.push(Emitted {
            path: stem,
            label: path.display().to_string(),
            program,
        });
    }
    for translated in ctx.into_programs() {
        emitted.push(Emitted {
            path: translated.path.file_path(),
            label: translated.path.name(),
            program: translated.program,
        });
    }

    match out {
        Some(dir) => write_programs(dir, &emitted)?,
        None => print_programs(&emitted)?,
    }
    Ok(BuildReport {
        programs: emitted.len(),
    })
}

pub fn check_files(files: &[PathBuf], root: &Path) -> PipelineResult<BuildReport> {
    let (mut ctx, scripts) = translate_files(files, root, false)?;
    ctx.process_imports();
    let programs = ctx.into_programs().len() + scripts.len();
    Ok(BuildReport { programs })
}

/// Translate every file, sequentially or with per-file scratch
/// contexts merged in input order.
fn translate_files(
    files: &[PathBuf],
    root: &Path,
    parallel: bool,
) -> PipelineResult<(CompilationContext, Vec<(PathBuf, Node)>)> {
    if !parallel {
        let mut ctx = CompilationContext::new(root);
        let mut scripts = Vec::new();
        for file in files {
            if let Some(program) = translate_one(&mut ctx, file)? {
                scripts.push((file.clone(), program));
            }
        }
        return Ok((ctx, scripts));
    }

    let results: Vec<(CompilationContext, Option<(PathBuf, Node)>)> = files
        .par_iter()
        .map(|file| {
            let mut scratch = CompilationContext::new(root);
            let program = translate_one(&mut scratch, file)?;
            Ok((scratch, program.map(|p| (file.clone(), p))))
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut ctx = CompilationContext::new(root);
    let mut scripts = Vec::new();
    for (index, (scratch, script)) in results.into_iter().enumerate() {
        ctx.merge(scratch).map_err(|source| PipelineError::Translate {
            path: files.get(index).cloned().unwrap_or_default(),
            source,
        })?;
        scripts.extend(script);
    }
    Ok((ctx, scripts))
}

fn translate_one(ctx: &mut CompilationContext, file: &Path) -> PipelineResult<Option<Node>> {
    let text = fs::read_to_string(file).map_err(|source| PipelineError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let form: Form = serde_json::from_str(&text).map_err(|source| PipelineError::Json {
        path: file.to_path_buf(),
        source,
    })?;
    ctx.set_source_label(file.display().to_string());
    translate_source(ctx, &form).map_err(|source| PipelineError::Translate {
        path: file.to_path_buf(),
        source,
    })
}

fn write_programs(dir: &Path, emitted: &[Emitted]) -> PipelineResult<()> {
    for entry in emitted {
        let target = dir.join(format!("{}.json", entry.path));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&entry.program).map_err(|source| {
            PipelineError::Json {
                path: target.clone(),
                source,
            }
        })?;
        fs::write(&target, json).map_err(|source| PipelineError::Io {
            path: target.clone(),
            source,
        })?;
    }
    Ok(())
}

fn print_programs(emitted: &[Emitted]) -> PipelineResult<()> {
    let doc = serde_json::json!({
        "programs": emitted
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "name": entry.label,
                    "path": entry.path,
                    "ast": entry.program,
                })
            })
            .collect::<Vec<_>>(),
    });
    println!("{}", doc);
    Ok(())
}
