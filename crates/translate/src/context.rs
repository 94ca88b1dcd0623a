//! The compilation context: the registry of modules, protocols and
//! their aliases/imports for one compilation.
//!
//! The source system kept this state in an ambient process-wide table;
//! here it is an explicit value passed to every translator, which
//! keeps the core free of globals and lets a driver translate files
//! into private scratch contexts that are merged afterwards. Exactly
//! one context survives to emission. Translation is single-threaded
//! over a context, so every mutation is trivially atomic and every
//! read sees a consistent snapshot.

use crate::error::{TranslateError, TranslateResult};
use crate::expand::{ExpandError, Expander, NullExpander};
use basalt_estree::Node;
use basalt_syntax::{Env, Form, FunRef, ImportDirective, ImportFilter, ModulePath};
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};

/// One known module.
#[derive(Debug, Clone, Default)]
pub struct ModuleRecord {
    pub path: ModulePath,
    /// Public functions, as `(name, arity)`.
    pub functions: IndexSet<FunRef>,
    /// Private functions; never exported, never importable.
    pub private_functions: IndexSet<FunRef>,
    pub macros: IndexSet<FunRef>,
    /// Local alias name to canonical module path.
    pub aliases: IndexMap<String, ModulePath>,
    /// Import directives as written, in source order.
    pub imports: Vec<ImportDirective>,
    /// Materialized by the second pass, once every module's exports
    /// are known.
    pub resolved_imports: Vec<ResolvedImport>,
    /// The translated program, once the module body walk completes.
    pub program: Option<Node>,
    /// The source label (file) the module came from, for collision
    /// reporting.
    pub source: Option<String>,
}

/// A materialized import: the concrete names an `import M, opts`
/// directive brings into scope.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub module: ModulePath,
    pub functions: Vec<FunRef>,
    pub macros: Vec<FunRef>,
}

/// One known protocol and its per-type implementations.
#[derive(Debug, Clone)]
pub struct ProtocolRecord {
    /// The dotted protocol name, e.g. `String.Chars`.
    pub name: String,
    /// The emission path (standard protocols carry a canonical
    /// namespace prefix).
    pub path: ModulePath,
    /// The translated spec object; `None` when the record was created
    /// by an implementation seen before its protocol.
    pub spec: Option<Node>,
    /// Runtime type key to translated implementation.
    pub impls: IndexMap<String, Node>,
}

/// A finished program ready for the emitter.
#[derive(Debug, Clone)]
pub struct TranslatedProgram {
    pub path: ModulePath,
    pub program: Node,
}

pub struct CompilationContext {
    root: PathBuf,
    env: Env,
    modules: IndexMap<ModulePath, ModuleRecord>,
    protocols: IndexMap<String, ProtocolRecord>,
    /// Module paths in body-walk completion order; inner modules
    /// complete (and therefore emit) before their enclosing module.
    completed: Vec<ModulePath>,
    /// Import declarations owed to the program currently being
    /// assembled: qualified references written without a prior
    /// `alias`/`import` collect here (local name to canonical path)
    /// and are drained by the module/file walker.
    auto_imports: IndexMap<String, ModulePath>,
    expander: Box<dyn Expander + Send + Sync>,
    source_label: Option<String>,
    tmp: u32,
}

impl CompilationContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_expander(root, Box::new(NullExpander))
    }

    pub fn with_expander(
        root: impl Into<PathBuf>,
        expander: Box<dyn Expander + Send + Sync>,
    ) -> Self {
        CompilationContext {
            root: root.into(),
            env: Env::new(),
            modules: IndexMap::new(),
            protocols: IndexMap::new(),
            completed: Vec::new(),
            auto_imports: IndexMap::new(),
            expander,
            source_label: None,
            tmp: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Replace the ambient environment the context was started with.
    pub fn update_env(&mut self, env: Env) {
        self.env = env;
    }

    /// Label subsequent registrations with their source file, for
    /// collision reporting.
    pub fn set_source_label(&mut self, label: impl Into<String>) {
        self.source_label = Some(label.into());
    }

    pub fn expand(&self, form: &Form, env: &Env) -> Result<Form, ExpandError> {
        self.expander.expand(form, env)
    }

    /// A deterministic temporary name. The counter is reset at every
    /// clause body so translating the same tree twice yields the same
    /// output.
    pub fn fresh_value_name(&mut self) -> String {
        let name = format!("__value_{}", self.tmp);
        self.tmp += 1;
        name
    }

    pub fn reset_temporaries(&mut self) {
        self.tmp = 0;
    }

    /// Record an import owed for a qualified reference with no
    /// explicit binding in scope. The local name is deterministic
    /// (canonical segments joined with `__`), so every spelling of
    /// the same module shares one declaration.
    pub fn auto_import(&mut self, canonical: ModulePath) -> String {
        let local = canonical.segments().join("__");
        self.auto_imports
            .entry(local.clone())
            .or_insert(canonical);
        local
    }

    /// Drain the imports owed to the current program scope. Walkers
    /// call this when assembling a program, pairing it with
    /// [`restore_auto_imports`](Self::restore_auto_imports) around
    /// nested scopes.
    pub fn take_auto_imports(&mut self) -> IndexMap<String, ModulePath> {
        std::mem::take(&mut self.auto_imports)
    }

    pub fn restore_auto_imports(&mut self, saved: IndexMap<String, ModulePath>) {
        self.auto_imports = saved;
    }

    // --- module table -------------------------------------------------

    pub fn add_module(&mut self, path: ModulePath) -> TranslateResult<()> {
        if let Some(existing) = self.modules.get(&path) {
            return Err(TranslateError::DuplicateModule {
                name: path.name(),
                first: existing
                    .source
                    .clone()
                    .unwrap_or_else(|| "<unknown>".into()),
                second: self
                    .source_label
                    .clone()
                    .unwrap_or_else(|| "<unknown>".into()),
            });
        }
        self.modules.insert(
            path.clone(),
            ModuleRecord {
                path,
                source: self.source_label.clone(),
                ..ModuleRecord::default()
            },
        );
        Ok(())
    }

    pub fn delete_module(&mut self, path: &ModulePath) -> bool {
        self.completed.retain(|p| p != path);
        self.modules.shift_remove(path).is_some()
    }

    pub fn module_listed(&self, path: &ModulePath) -> bool {
        self.modules.contains_key(path)
    }

    pub fn get_module(&self, path: &ModulePath) -> Option<&ModuleRecord> {
        self.modules.get(path)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// Record an alias binding on a module. A binding whose canonical
    /// module is not yet listed is silently ignored: the module may be
    /// defined later in the compilation or be external. (The emitted
    /// import declaration and the environment-level alias are
    /// unaffected, so lowering still resolves the name.)
    pub fn add_alias(&mut self, module: &ModulePath, local: &str, canonical: ModulePath) {
        if !self.modules.contains_key(&canonical) {
            return;
        }
        if let Some(record) = self.modules.get_mut(module) {
            record.aliases.insert(local.to_string(), canonical);
        }
    }

    pub fn add_import(&mut self, module: &ModulePath, directive: ImportDirective) {
        if let Some(record) = self.modules.get_mut(module) {
            record.imports.push(directive);
        }
    }

    pub fn add_function(&mut self, module: &ModulePath, name: String, arity: usize, public: bool) {
        if let Some(record) = self.modules.get_mut(module) {
            if public {
                record.functions.insert((name, arity));
            } else {
                record.private_functions.insert((name, arity));
            }
        }
    }

    pub fn add_macro(&mut self, module: &ModulePath, name: String, arity: usize) {
        if let Some(record) = self.modules.get_mut(module) {
            record.macros.insert((name, arity));
        }
    }

    /// Install a module's finished program and mark it complete.
    pub fn set_module_program(&mut self, path: &ModulePath, program: Node) {
        if let Some(record) = self.modules.get_mut(path) {
            record.program = Some(program);
            self.completed.push(path.clone());
        }
    }

    // --- protocol table -----------------------------------------------

    pub fn add_protocol(&mut self, name: &str, path: ModulePath, spec: Option<Node>) {
        match self.protocols.get_mut(name) {
            Some(record) => {
                // The record may have been created by a `defimpl` seen
                // first; the spec arrives now.
                record.path = path;
                if record.spec.is_none() {
                    record.spec = spec;
                }
            }
            None => {
                self.protocols.insert(
                    name.to_string(),
                    ProtocolRecord {
                        name: name.to_string(),
                        path,
                        spec,
                        impls: IndexMap::new(),
                    },
                );
            }
        }
    }

    /// Register an implementation, creating the protocol record with a
    /// null spec when none exists yet.
    pub fn add_protocol_impl(&mut self, name: &str, path: ModulePath, type_key: &str, body: Node) {
        let record = self
            .protocols
            .entry(name.to_string())
            .or_insert_with(|| ProtocolRecord {
                name: name.to_string(),
                path,
                spec: None,
                impls: IndexMap::new(),
            });
        record.impls.insert(type_key.to_string(), body);
    }

    pub fn get_protocol(&self, name: &str) -> Option<&ProtocolRecord> {
        self.protocols.get(name)
    }

    pub fn protocols(&self) -> impl Iterator<Item = &ProtocolRecord> {
        self.protocols.values()
    }

    // --- passes -------------------------------------------------------

    /// The second pass: materialize every module's import directives
    /// into concrete name lists, now that every module's exports are
    /// known. Directives naming modules outside the compilation are
    /// left unresolved; calls against them stay late-bound.
    pub fn process_imports(&mut self) {
        let mut resolved_all: Vec<(ModulePath, Vec<ResolvedImport>)> = Vec::new();
        for (path, record) in &self.modules {
            let mut resolved = Vec::new();
            for directive in &record.imports {
                let Some(target) = self.modules.get(&directive.module) else {
                    continue;
                };
                let functions = if matches!(directive.opts.only, Some(ImportFilter::Macros)) {
                    Vec::new()
                } else {
                    target
                        .functions
                        .iter()
                        .filter(|(n, a)| directive.opts.admits(n, *a))
                        .cloned()
                        .collect()
                };
                let macros = if matches!(directive.opts.only, Some(ImportFilter::Functions)) {
                    Vec::new()
                } else {
                    target
                        .macros
                        .iter()
                        .filter(|(n, a)| directive.opts.admits(n, *a))
                        .cloned()
                        .collect()
                };
                resolved.push(ResolvedImport {
                    module: directive.module.clone(),
                    functions,
                    macros,
                });
            }
            resolved_all.push((path.clone(), resolved));
        }
        for (path, resolved) in resolved_all {
            if let Some(record) = self.modules.get_mut(&path) {
                record.resolved_imports = resolved;
            }
        }
    }

    /// Fold a scratch context (one file's translation) into this one.
    /// Module and protocol registrations commute because they are
    /// keyed by name; a module name appearing in both contexts is a
    /// fatal collision, never last-writer-wins.
    pub fn merge(&mut self, other: CompilationContext) -> TranslateResult<()> {
        for (path, record) in &other.modules {
            if let Some(existing) = self.modules.get(path) {
                return Err(TranslateError::DuplicateModule {
                    name: path.name(),
                    first: existing
                        .source
                        .clone()
                        .unwrap_or_else(|| "<unknown>".into()),
                    second: record.source.clone().unwrap_or_else(|| "<unknown>".into()),
                });
            }
        }
        self.modules.extend(other.modules);
        self.completed.extend(other.completed);
        for (name, record) in other.protocols {
            match self.protocols.get_mut(&name) {
                Some(existing) => {
                    if existing.spec.is_none() {
                        existing.spec = record.spec;
                        existing.path = record.path;
                    }
                    existing.impls.extend(record.impls);
                }
                None => {
                    self.protocols.insert(name, record);
                }
            }
        }
        Ok(())
    }

    /// Consume the context and emit every finished program: modules in
    /// completion order (inner modules before their enclosing module,
    /// files in input order), then one dispatch program per protocol.
    pub fn into_programs(self) -> Vec<TranslatedProgram> {
        let CompilationContext {
            mut modules,
            protocols,
            completed,
            ..
        } = self;
        let mut programs = Vec::with_capacity(completed.len() + protocols.len());
        for path in completed {
            if let Some(record) = modules.get_mut(&path) {
                if let Some(program) = record.program.take() {
                    programs.push(TranslatedProgram {
                        path: path.clone(),
                        program,
                    });
                }
            }
        }
        for record in protocols.values() {
            programs.push(TranslatedProgram {
                path: record.path.clone(),
                program: crate::translator::protocol::emit_program(record),
            });
        }
        programs
    }
}

impl std::fmt::Debug for CompilationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationContext")
            .field("root", &self.root)
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("protocols", &self.protocols.keys().collect::<Vec<_>>())
            .finish()
    }
}
