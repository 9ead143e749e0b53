//! Dependency statistics over the enriched import table
//!
//! Aggregates are computed on rows of used modules only; a module nobody
//! imports contributes to the unused list instead.

use super::enrich::EnrichedImport;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Distinct values of one aggregate, with their count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Distinct {
    pub values: Vec<String>,
    pub count: usize,
}

impl From<&BTreeSet<String>> for Distinct {
    fn from(values: &BTreeSet<String>) -> Self {
        Self {
            values: values.iter().cloned().collect(),
            count: values.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDependencies {
    pub module: String,
    pub external_packages: Distinct,
    pub builtin_packages: Distinct,
    pub internal_packages: Distinct,
    pub internal_modules: Distinct,
    pub imported_from_packages: Distinct,
    pub imported_from_modules: Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDependencies {
    pub package: String,
    pub external_packages: Distinct,
    pub builtin_packages: Distinct,
    pub internal_packages: Distinct,
    /// Rows importing from the package they belong to
    pub imports_itself: usize,
    pub internal_modules: Distinct,
    pub imported_from_packages: Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranking {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedModule {
    pub module: String,
    pub is_script_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidImport {
    pub module: String,
    pub import_reference: String,
}

/// A `(source, target)` relation
pub type Edge = (String, String);

type Groups = BTreeMap<String, BTreeSet<String>>;

/// Group `value` by `key`. Rows with a missing key are dropped; a missing
/// value still creates the group.
fn group<'r, I, K, V>(rows: I, key: K, value: V) -> Groups
where
    I: IntoIterator<Item = &'r EnrichedImport>,
    K: Fn(&EnrichedImport) -> Option<&str>,
    V: Fn(&EnrichedImport) -> Option<&str>,
{
    let mut groups = Groups::new();
    for row in rows {
        let Some(k) = key(row) else { continue };
        let entry = groups.entry(k.to_string()).or_default();
        if let Some(v) = value(row) {
            entry.insert(v.to_string());
        }
    }
    groups
}

fn distinct(groups: &Groups, key: &str) -> Distinct {
    groups.get(key).map(Distinct::from).unwrap_or_default()
}

fn module(row: &EnrichedImport) -> Option<&str> {
    Some(&row.module)
}

fn package(row: &EnrichedImport) -> Option<&str> {
    Some(&row.package)
}

fn import_module(row: &EnrichedImport) -> Option<&str> {
    row.import_module.as_deref()
}

fn import_package(row: &EnrichedImport) -> Option<&str> {
    row.import_package.as_deref()
}

fn used_rows(rows: &[EnrichedImport]) -> Vec<&EnrichedImport> {
    rows.iter().filter(|r| !r.unused_module).collect()
}

/// Per-module dependency aggregates
pub fn module_dependencies(rows: &[EnrichedImport]) -> Vec<ModuleDependencies> {
    let used = used_rows(rows);
    let external = || used.iter().copied().filter(|r| r.is_external);
    let builtin = || used.iter().copied().filter(|r| r.is_builtin);
    let internal = || used.iter().copied().filter(|r| r.is_internal);

    let external_packages = group(external(), module, import_package);
    let builtin_packages = group(builtin(), module, import_package);
    let internal_packages = group(internal(), module, import_package);
    let internal_modules = group(internal(), module, import_module);
    let imported_from_packages = group(internal(), import_module, package);
    let imported_from_modules = group(internal(), import_module, module);

    let keys: BTreeSet<&String> = [
        &external_packages,
        &builtin_packages,
        &internal_packages,
        &internal_modules,
        &imported_from_packages,
        &imported_from_modules,
    ]
    .into_iter()
    .flat_map(|g| g.keys())
    .collect();

    keys.into_iter()
        .map(|key| ModuleDependencies {
            module: key.clone(),
            external_packages: distinct(&external_packages, key),
            builtin_packages: distinct(&builtin_packages, key),
            internal_packages: distinct(&internal_packages, key),
            internal_modules: distinct(&internal_modules, key),
            imported_from_packages: distinct(&imported_from_packages, key),
            imported_from_modules: distinct(&imported_from_modules, key),
        })
        .collect()
}

/// Per-package dependency aggregates
pub fn package_dependencies(rows: &[EnrichedImport]) -> Vec<PackageDependencies> {
    let used = used_rows(rows);
    let external = || used.iter().copied().filter(|r| r.is_external);
    let builtin = || used.iter().copied().filter(|r| r.is_builtin);
    let internal = || used.iter().copied().filter(|r| r.is_internal);

    let external_packages = group(external(), package, import_package);
    let builtin_packages = group(builtin(), package, import_package);
    let internal_packages = group(internal(), package, import_package);
    let internal_modules = group(internal(), package, import_module);
    let imported_from_packages = group(internal(), import_package, package);

    let mut imports_itself: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &used {
        if row.import_package.as_deref() == Some(row.package.as_str()) {
            *imports_itself.entry(row.package.as_str()).or_default() += 1;
        }
    }

    let mut keys: BTreeSet<&str> = [
        &external_packages,
        &builtin_packages,
        &internal_packages,
        &internal_modules,
        &imported_from_packages,
    ]
    .into_iter()
    .flat_map(|g| g.keys().map(String::as_str))
    .collect();
    keys.extend(imports_itself.keys().copied());

    keys.into_iter()
        .map(|key| PackageDependencies {
            package: key.to_string(),
            external_packages: distinct(&external_packages, key),
            builtin_packages: distinct(&builtin_packages, key),
            internal_packages: distinct(&internal_packages, key),
            imports_itself: imports_itself.get(key).copied().unwrap_or(0),
            internal_modules: distinct(&internal_modules, key),
            imported_from_packages: distinct(&imported_from_packages, key),
        })
        .collect()
}

/// Occurrence counts, most frequent first, ties by name
fn rank<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<Ranking> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut ranking: Vec<Ranking> = counts
        .into_iter()
        .map(|(name, count)| Ranking {
            name: name.to_string(),
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking
}

/// Import roots by number of importing rows
pub fn most_imported_roots(rows: &[EnrichedImport]) -> Vec<Ranking> {
    rank(
        rows.iter()
            .filter(|r| !r.is_no_imports && !r.import_root.is_empty())
            .map(|r| r.import_root.as_str()),
    )
}

/// Project modules by number of importing rows
pub fn most_imported_modules(rows: &[EnrichedImport]) -> Vec<Ranking> {
    rank(rows.iter().filter_map(|r| r.import_module.as_deref()))
}

/// Project packages by number of importing rows
pub fn most_imported_packages(rows: &[EnrichedImport]) -> Vec<Ranking> {
    rank(
        rows.iter()
            .filter(|r| r.is_internal)
            .filter_map(|r| r.import_package.as_deref()),
    )
}

/// Modules nobody imports, package markers excluded
pub fn unused_modules(rows: &[EnrichedImport]) -> Vec<UnusedModule> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| r.unused_module && !r.is_init_file)
        .filter(|r| seen.insert(r.module.as_str()))
        .map(|r| UnusedModule {
            module: r.module.clone(),
            is_script_file: r.is_script_file,
        })
        .collect()
}

pub fn invalid_imports(rows: &[EnrichedImport]) -> Vec<InvalidImport> {
    rows.iter()
        .filter(|r| r.invalid_import)
        .map(|r| InvalidImport {
            module: r.module.clone(),
            import_reference: r.import_reference.clone(),
        })
        .collect()
}

/// `(module, import_module)` for resolved project imports, first occurrence order
pub fn module_graph_edges(rows: &[EnrichedImport]) -> Vec<Edge> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| r.is_internal)
        .filter_map(|r| {
            r.import_module
                .as_ref()
                .map(|target| (r.module.clone(), target.clone()))
        })
        .filter(|edge| seen.insert(edge.clone()))
        .collect()
}

/// `(module, import_root)` for outside imports, grouped by root
///
/// Relative imports climbing above the project root have no root and are left out.
pub fn external_package_edges(rows: &[EnrichedImport]) -> BTreeMap<String, Vec<Edge>> {
    let mut seen = HashSet::new();
    let mut grouped: BTreeMap<String, Vec<Edge>> = BTreeMap::new();
    let outside = rows
        .iter()
        .filter(|r| !r.is_internal && !r.is_no_imports && !r.import_root.is_empty());
    for row in outside {
        let edge = (row.module.clone(), row.import_root.clone());
        if seen.insert(edge.clone()) {
            grouped.entry(row.import_root.clone()).or_default().push(edge);
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::collect::{ImportRow, NO_IMPORTS};
    use crate::imports::enrich::enrich;

    fn table() -> Vec<EnrichedImport> {
        let rows = [
            ("app.__init__", NO_IMPORTS),
            ("app.main", "app.core.engine.run"),
            ("app.main", "os.path"),
            ("app.main", "requests"),
            ("app.core.engine", "app.core.util.helper"),
            ("app.core.engine", "json"),
            ("app.core.engine", "app.gone"),
            ("app.core.util", "json"),
            ("app.core.util", "requests.adapters"),
        ];
        let rows: Vec<ImportRow> = rows.iter().map(|(m, r)| ImportRow::new(*m, *r)).collect();
        let scripts = ["app.main".to_string()].into_iter().collect();
        enrich(&rows, &scripts, "__init__").unwrap()
    }

    #[test]
    fn test_module_dependencies() {
        let stats = module_dependencies(&table());
        let engine = stats.iter().find(|s| s.module == "app.core.engine").unwrap();
        assert_eq!(engine.builtin_packages.values, vec!["json"]);
        assert_eq!(engine.internal_modules.values, vec!["app.core.util"]);
        assert_eq!(engine.internal_packages.values, vec!["app.core"]);
        assert_eq!(engine.imported_from_modules.count, 0, "app.main is unused and filtered out");

        let util = stats.iter().find(|s| s.module == "app.core.util").unwrap();
        assert_eq!(util.external_packages.values, vec!["json", "requests"]);
        assert_eq!(util.imported_from_modules.values, vec!["app.core.engine"]);
        assert_eq!(util.imported_from_packages.values, vec!["app.core"]);

        assert!(stats.iter().all(|s| s.module != "app.main"));
    }

    #[test]
    fn test_package_dependencies() {
        let stats = package_dependencies(&table());
        let core = stats.iter().find(|s| s.package == "app.core").unwrap();
        assert_eq!(core.imports_itself, 1);
        assert_eq!(core.internal_modules.values, vec!["app.core.util"]);
        assert_eq!(core.imported_from_packages.values, vec!["app.core"]);
    }

    #[test]
    fn test_rankings() {
        let table = table();
        let roots = most_imported_roots(&table);
        assert_eq!(roots[0], Ranking { name: "app".into(), count: 3 });
        assert!(roots.iter().all(|r| r.name != NO_IMPORTS));
        assert_eq!(
            roots.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["app", "json", "requests", "os"]
        );

        let modules = most_imported_modules(&table);
        assert_eq!(modules.len(), 2);
        assert_eq!(most_imported_packages(&table)[0].name, "app.core");
    }

    #[test]
    fn test_unused_and_invalid() {
        let table = table();
        assert_eq!(
            unused_modules(&table),
            vec![UnusedModule { module: "app.main".into(), is_script_file: true }]
        );
        assert_eq!(
            invalid_imports(&table),
            vec![InvalidImport {
                module: "app.core.engine".into(),
                import_reference: "app.gone".into(),
            }]
        );
    }

    #[test]
    fn test_edge_tables() {
        let table = table();
        assert_eq!(
            module_graph_edges(&table),
            vec![
                ("app.main".to_string(), "app.core.engine".to_string()),
                ("app.core.engine".to_string(), "app.core.util".to_string()),
            ]
        );

        let external = external_package_edges(&table);
        assert_eq!(external.keys().collect::<Vec<_>>(), vec!["json", "os", "requests"]);
        assert_eq!(
            external["requests"],
            vec![
                ("app.main".to_string(), "requests".to_string()),
                ("app.core.util".to_string(), "requests".to_string()),
            ]
        );
    }

    #[test]
    fn test_relative_import_above_root_has_no_external_graph() {
        let rows = [
            ("app.main", "....far.away"),
            ("app.main", "json"),
            ("app.util", "app.main"),
        ];
        let rows: Vec<ImportRow> = rows.iter().map(|(m, r)| ImportRow::new(*m, *r)).collect();
        let table = enrich(&rows, &HashSet::new(), "__init__").unwrap();
        assert!(table.iter().any(|r| r.import_root.is_empty()));

        let external = external_package_edges(&table);
        assert_eq!(external.keys().collect::<Vec<_>>(), vec!["json"]);
        assert!(most_imported_roots(&table).iter().all(|r| !r.name.is_empty()));
    }
}
