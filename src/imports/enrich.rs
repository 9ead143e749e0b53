//! Import enrichment
//!
//! Classifies raw relation rows as internal/external/builtin and resolves
//! internal references to the module and package they point at, using
//! longest-prefix matching over the known module names.

use super::collect::{ImportRow, NO_IMPORTS};
use super::stdlib::is_stdlib;
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// A raw relation row with its classification and resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedImport {
    pub module: String,
    pub import_reference: String,
    pub import_root: String,
    pub is_no_imports: bool,
    pub is_internal: bool,
    pub is_external: bool,
    pub is_builtin: bool,
    pub import_module: Option<String>,
    pub import_package: Option<String>,
    pub module_depth: usize,
    pub invalid_import: bool,
    pub unused_module: bool,
    pub module_name: String,
    pub package: String,
    pub package_name: String,
    pub is_init_file: bool,
    pub is_script_file: bool,
}

/// First dotted component of a path
pub fn import_root(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Last dotted component of a path
pub fn local_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Everything but the last dotted component (empty for a single component)
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('.').map(|(parent, _)| parent).unwrap_or("")
}

/// Longest-prefix resolution.
///
/// Among `candidates` that are a string prefix of `reference`, returns the
/// one leaving the smallest remainder; equal remainders go to the
/// lexicographically smallest candidate.
pub fn resolve<'a, I>(reference: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if reference.is_empty() {
        return None;
    }
    candidates
        .into_iter()
        .filter(|candidate| reference.starts_with(candidate))
        .min_by(|a, b| {
            (reference.len() - a.len())
                .cmp(&(reference.len() - b.len()))
                .then_with(|| a.cmp(b))
        })
}

/// The single root shared by every module name.
///
/// `None` when there are no modules; more than one root is a configuration error.
pub fn project_root<'a, I>(modules: I) -> Result<Option<&'a str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let roots: BTreeSet<&str> = modules.into_iter().map(import_root).collect();
    if roots.len() > 1 {
        return Err(Error::MultipleProjectRoots {
            roots: roots.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(roots.into_iter().next())
}

/// Enrich raw rows. `script_modules` names the modules carrying a main guard.
pub fn enrich(
    rows: &[ImportRow],
    script_modules: &HashSet<String>,
    package_marker: &str,
) -> Result<Vec<EnrichedImport>> {
    let modules: BTreeSet<&str> = rows.iter().map(|r| r.module.as_str()).collect();
    let Some(root) = project_root(modules.iter().copied())? else {
        return Ok(Vec::new());
    };
    let packages: BTreeSet<&str> = modules
        .iter()
        .copied()
        .map(parent_path)
        .filter(|p| !p.is_empty())
        .collect();

    let mut enriched: Vec<EnrichedImport> = rows
        .iter()
        .map(|row| {
            let reference = row.import_reference.as_str();
            let is_no_imports = row.is_no_imports();
            let reference_root = import_root(reference);
            let is_internal = !is_no_imports && reference_root == root;
            let is_external = !is_internal && !is_no_imports;

            let import_module = if is_internal {
                resolve(reference, modules.iter().copied()).map(str::to_string)
            } else {
                None
            };
            let import_package = if is_no_imports {
                None
            } else if is_internal {
                import_module
                    .as_deref()
                    .and_then(|m| resolve(m, packages.iter().copied()))
                    .map(str::to_string)
            } else {
                Some(reference_root.to_string())
            };

            let package = parent_path(&row.module);
            let module_name = local_name(&row.module);
            EnrichedImport {
                module: row.module.clone(),
                import_reference: row.import_reference.clone(),
                import_root: reference_root.to_string(),
                is_no_imports,
                is_internal,
                is_external,
                is_builtin: is_external && is_stdlib(reference_root),
                invalid_import: is_internal && import_module.is_none(),
                import_module,
                import_package,
                module_depth: row.module.split('.').count(),
                unused_module: false,
                module_name: module_name.to_string(),
                package: package.to_string(),
                package_name: local_name(package).to_string(),
                is_init_file: module_name == package_marker,
                is_script_file: script_modules.contains(&row.module),
            }
        })
        .collect();

    let used: HashSet<String> = enriched
        .iter()
        .filter_map(|row| row.import_module.clone())
        .collect();
    for row in &mut enriched {
        row.unused_module = !used.contains(&row.module);
    }

    let invalid = enriched.iter().filter(|r| r.invalid_import).count();
    debug!(root, modules = modules.len(), packages = packages.len(), "Resolution candidates");
    info!(rows = enriched.len(), invalid, "Enriched import table");
    Ok(enriched)
}
