//! Project scanning.
//!
//! Directories are expanded recursively to every `*.graphql`, `*.gql` and
//! script file below them, skipping hidden files and directories. Each file
//! then gets a role from its name:
//!
//! - a basename containing `resolver(s)` or `mutator(s)`/`mutation(s)`
//!   (case-insensitive) is a resolver module;
//! - `schema.graphql` / `schema.gql` is a schema fragment;
//! - anything else is ignored.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::MatchOptions;
use regex::Regex;

use crate::config::RegistryConfig;
use crate::error::RegistryError;

static RESOLVER_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)resolvers?|mutat(?:or|ion)s?").expect("valid resolver file regex")
});

const SCHEMA_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// What a scanned file contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// A resolver or mutator module.
    Resolvers,
    /// A schema fragment.
    Schema,
    /// Not relevant.
    Ignored,
}

/// One scan path or a sequence of them.
///
/// A bare `&Path` iterates over its components, so `scan` takes this trait
/// rather than `IntoIterator` to accept `"src"` and `["src", "lib"]` alike.
pub trait ScanPaths {
    /// Returns the paths in order.
    fn into_paths(self) -> Vec<PathBuf>;
}

macro_rules! single_scan_path {
    ($($ty:ty),*) => {
        $(impl ScanPaths for $ty {
            fn into_paths(self) -> Vec<PathBuf> {
                vec![PathBuf::from(self)]
            }
        })*
    };
}

single_scan_path!(&str, String, &String, &Path, PathBuf, &PathBuf);

impl<P: AsRef<Path>> ScanPaths for Vec<P> {
    fn into_paths(self) -> Vec<PathBuf> {
        self.iter().map(|p| p.as_ref().to_path_buf()).collect()
    }
}

impl<P: AsRef<Path>> ScanPaths for &[P] {
    fn into_paths(self) -> Vec<PathBuf> {
        self.iter().map(|p| p.as_ref().to_path_buf()).collect()
    }
}

impl<P: AsRef<Path>, const N: usize> ScanPaths for [P; N] {
    fn into_paths(self) -> Vec<PathBuf> {
        self.iter().map(|p| p.as_ref().to_path_buf()).collect()
    }
}

/// Classifies a file by its name.
///
/// Resolver names win over the schema name, so a module is never read as
/// SDL; `schema.graphql` never matches the resolver pattern anyway.
#[must_use]
pub fn classify(path: &Path) -> FileRole {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return FileRole::Ignored;
    };

    if RESOLVER_FILE.is_match(name) {
        FileRole::Resolvers
    } else if name == "schema.graphql" || name == "schema.gql" {
        FileRole::Schema
    } else {
        FileRole::Ignored
    }
}

/// Hidden entries (`.cache/`, `.schema.graphql`) are not scanned.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// Returns whether `path` names a file `scan` cares about, as opposed to a
/// directory to expand.
fn is_literal_file(path: &Path, config: &RegistryConfig) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SCHEMA_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext))
                || config.is_script_extension(ext)
        })
}

/// Expands scan paths into files, keeping the order of `paths`.
///
/// Files found under one directory are sorted so scans are reproducible.
///
/// # Errors
///
/// Returns `RegistryError::InvalidScanPath` if a directory cannot be turned
/// into a glob pattern and `RegistryError::Scan` if walking it fails.
pub fn expand_paths<I, P>(paths: I, config: &RegistryConfig) -> Result<Vec<PathBuf>, RegistryError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if is_literal_file(path, config) {
            files.push(path.to_path_buf());
            continue;
        }

        let base = path.to_str().ok_or_else(|| RegistryError::InvalidScanPath {
            path: path.to_path_buf(),
            message: "path is not valid UTF-8".to_string(),
        })?;
        let base = glob::Pattern::escape(base.trim_end_matches('/'));

        let mut found = Vec::new();
        let extensions = config
            .script_extensions
            .iter()
            .map(String::as_str)
            .chain(SCHEMA_EXTENSIONS);
        for ext in extensions {
            let pattern = format!("{base}/**/*.{ext}");
            let entries =
                glob::glob_with(&pattern, GLOB_OPTIONS).map_err(|e| RegistryError::InvalidScanPath {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            for entry in entries {
                let file = entry.map_err(|e| RegistryError::Scan {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                })?;
                found.push(file);
            }
        }

        found.sort();
        found.dedup();
        files.extend(found);
    }

    Ok(files)
}
