//! The compilation environment threaded through translation.
//!
//! An [`Env`] is logically immutable: every extension returns a new
//! value. One is created at each nested scope (module, function,
//! anonymous function, clause) and carries the current module path,
//! the active aliases, the in-scope import directives, and whether
//! translation is inside a `quote`.

use smallvec::SmallVec;
use std::fmt;

/// A fully-qualified module name: a non-empty ordered sequence of
/// capitalized segments. The segment list uniquely identifies the
/// module in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModulePath(SmallVec<[String; 4]>);

impl ModulePath {
    pub fn new() -> ModulePath {
        ModulePath(SmallVec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> ModulePath
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModulePath(segments.into_iter().map(Into::into).collect())
    }

    /// The path extended with further segments.
    pub fn child<I, S>(&self, segments: I) -> ModulePath
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = self.0.clone();
        path.extend(segments.into_iter().map(Into::into));
        ModulePath(path)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The dotted name, e.g. `Hello.World`.
    pub fn name(&self) -> String {
        self.0.join(".")
    }

    /// The last segment, which is the local binding name an import of
    /// this module introduces.
    pub fn last(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// The import path for this module: segments lowercased and joined
    /// with `/`, e.g. `[A, B, C]` maps to `a/b/c`.
    pub fn file_path(&self) -> String {
        self.0
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A function reference as `(name, arity)`.
pub type FunRef = (String, usize);

/// One `import M, opts` directive as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDirective {
    pub module: ModulePath,
    pub opts: ImportOpts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOpts {
    pub only: Option<ImportFilter>,
    pub except: Vec<FunRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportFilter {
    /// `only: :functions`
    Functions,
    /// `only: :macros`
    Macros,
    /// `only: [f: 1, …]`
    Names(Vec<FunRef>),
}

impl ImportOpts {
    /// Whether the directive lets the given function through.
    pub fn admits(&self, name: &str, arity: usize) -> bool {
        if self
            .except
            .iter()
            .any(|(n, a)| n == name && *a == arity)
        {
            return false;
        }
        match &self.only {
            None | Some(ImportFilter::Functions) | Some(ImportFilter::Macros) => true,
            Some(ImportFilter::Names(names)) => {
                names.iter().any(|(n, a)| n == name && *a == arity)
            }
        }
    }
}

/// The environment value.
#[derive(Debug, Clone, Default)]
pub struct Env {
    module: ModulePath,
    aliases: Vec<(String, ModulePath)>,
    imports: Vec<ImportDirective>,
    in_quote: bool,
}

impl Env {
    pub fn new() -> Env {
        Env::default()
    }

    pub fn module(&self) -> &ModulePath {
        &self.module
    }

    pub fn aliases(&self) -> &[(String, ModulePath)] {
        &self.aliases
    }

    pub fn imports(&self) -> &[ImportDirective] {
        &self.imports
    }

    pub fn in_quote(&self) -> bool {
        self.in_quote
    }

    pub fn with_module(&self, module: ModulePath) -> Env {
        let mut env = self.clone();
        env.module = module;
        env
    }

    /// Bind a local name to a canonical module. Re-aliasing the same
    /// local name replaces the previous binding.
    pub fn with_alias(&self, local: impl Into<String>, canonical: ModulePath) -> Env {
        let local = local.into();
        let mut env = self.clone();
        env.aliases.retain(|(name, _)| *name != local);
        env.aliases.push((local, canonical));
        env
    }

    pub fn with_import(&self, directive: ImportDirective) -> Env {
        let mut env = self.clone();
        env.imports.push(directive);
        env
    }

    pub fn with_quote(&self, in_quote: bool) -> Env {
        let mut env = self.clone();
        env.in_quote = in_quote;
        env
    }

    /// Resolve a written module reference against the active aliases:
    /// when the first segment is an aliased local name, it is replaced
    /// by the canonical path. Aliases affect only how references are
    /// resolved; they never rename definitions.
    pub fn resolve_alias(&self, segments: &[String]) -> ModulePath {
        if let Some(first) = segments.first() {
            if let Some((_, canonical)) = self.aliases.iter().rev().find(|(name, _)| name == first)
            {
                return canonical.child(segments[1..].iter().cloned());
            }
        }
        ModulePath::from_segments(segments.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> ModulePath {
        ModulePath::from_segments(segments.iter().copied())
    }

    #[test]
    fn test_module_path_naming() {
        let p = path(&["Hello", "World"]);
        assert_eq!(p.name(), "Hello.World");
        assert_eq!(p.file_path(), "hello/world");
        assert_eq!(p.last(), "World");
    }

    #[test]
    fn test_resolve_alias_rewrites_first_segment() {
        let env = Env::new().with_alias("World", path(&["Hello", "World"]));
        let resolved = env.resolve_alias(&["World".to_string(), "Inner".to_string()]);
        assert_eq!(resolved, path(&["Hello", "World", "Inner"]));
    }

    #[test]
    fn test_resolve_alias_passthrough() {
        let env = Env::new();
        let resolved = env.resolve_alias(&["Hello".to_string()]);
        assert_eq!(resolved, path(&["Hello"]));
    }

    #[test]
    fn test_realias_replaces() {
        let env = Env::new()
            .with_alias("T", path(&["A"]))
            .with_alias("T", path(&["B"]));
        assert_eq!(env.resolve_alias(&["T".to_string()]), path(&["B"]));
        assert_eq!(env.aliases().len(), 1);
    }

    #[test]
    fn test_import_opts_filtering() {
        let only = ImportOpts {
            only: Some(ImportFilter::Names(vec![("parse".into(), 1)])),
            except: Vec::new(),
        };
        assert!(only.admits("parse", 1));
        assert!(!only.admits("parse", 2));
        assert!(!only.admits("other", 1));

        let except = ImportOpts {
            only: None,
            except: vec![("parse".into(), 1)],
        };
        assert!(!except.admits("parse", 1));
        assert!(except.admits("parse", 2));
    }
}
