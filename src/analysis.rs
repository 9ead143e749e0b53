//! Analysis session
//!
//! One [`Analysis`] per analyzed project. It owns the configuration and a
//! cached cell per artifact (tree dict, raw import rows, script modules,
//! enriched rows); every downstream table and diagram is derived from those.
//! Nothing is shared between sessions.
//!
//! @module analysis

use crate::cache::{Cached, JsonFile};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::project::Project;
use crate::diagram::{relation_graph, ClassDiagramVisitor, InheritanceVisitor};
use crate::graph::split_components;
use crate::imports::stats::{
    self, InvalidImport, ModuleDependencies, PackageDependencies, Ranking, UnusedModule,
};
use crate::imports::{enrich, EnrichedImport, ImportCollector, ImportRow};
use crate::metrics::{self, TypeSummary};
use crate::tree::{SourceTree, TreeBuilder, TreeDict};
use chrono::{DateTime, Utc};
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

const TREE_KEY: &str = "SourceTree";
const IMPORT_ROWS_KEY: &str = "ImportRows";
const SCRIPT_MODULES_KEY: &str = "ScriptModules";
const ENRICHED_KEY: &str = "EnrichedImports";

/// A named diagram document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagram {
    pub name: String,
    pub document: String,
}

impl Diagram {
    fn new(name: impl Into<String>, document: String) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

/// Which diagram families to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramSelection {
    pub external: bool,
    pub classes: bool,
    pub inheritance: bool,
}

/// Every dependency table of one run
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub modules: Vec<ModuleDependencies>,
    pub packages: Vec<PackageDependencies>,
    pub most_imported_roots: Vec<Ranking>,
    pub most_imported_modules: Vec<Ranking>,
    pub most_imported_packages: Vec<Ranking>,
    pub unused_modules: Vec<UnusedModule>,
    pub invalid_imports: Vec<InvalidImport>,
    pub node_summary: Vec<TypeSummary>,
}

pub struct Analysis {
    project: Project,
    config: Config,
    cache_dir: Option<PathBuf>,
    tree_dict: Cached<TreeDict>,
    tree: OnceCell<SourceTree>,
    import_rows: Cached<Vec<ImportRow>>,
    script_modules: Cached<BTreeSet<String>>,
    enriched: Cached<Vec<EnrichedImport>>,
}

impl Analysis {
    /// Session over `project`. With `use_cache` off (or caching disabled in
    /// config) artifacts live in memory only.
    pub fn new(project: Project, config: Config, use_cache: bool) -> Result<Self> {
        let cache_dir = if use_cache && config.cache.enabled {
            Some(config.cache_dir(&project.root)?)
        } else {
            None
        };

        Ok(Self {
            tree_dict: cell(cache_dir.as_ref(), TREE_KEY),
            tree: OnceCell::new(),
            import_rows: cell(cache_dir.as_ref(), IMPORT_ROWS_KEY),
            script_modules: cell(cache_dir.as_ref(), SCRIPT_MODULES_KEY),
            enriched: cell(cache_dir.as_ref(), ENRICHED_KEY),
            project,
            config,
            cache_dir,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_dir(&self) -> Option<&PathBuf> {
        self.cache_dir.as_ref()
    }

    // =========================================================================
    // ARTIFACTS
    // =========================================================================

    pub fn tree_dict(&self) -> Result<&TreeDict> {
        self.tree_dict.get_or_try_build(|| {
            let tree = TreeBuilder::new(&self.config.analysis).build(&self.project.root)?;
            Ok(tree.to_dict())
        })
    }

    /// The source tree, always reconstructed from the dict so a cached and a
    /// fresh run see the same tree
    pub fn tree(&self) -> Result<&SourceTree> {
        self.tree
            .get_or_try_init(|| SourceTree::from_dict(self.tree_dict()?))
    }

    pub fn import_rows(&self) -> Result<&Vec<ImportRow>> {
        self.import_rows.get_or_try_build(|| {
            let mut collector = ImportCollector::new()?;
            self.tree()?.accept(&mut collector);
            Ok(collector.into_rows())
        })
    }

    pub fn script_modules(&self) -> Result<&BTreeSet<String>> {
        self.script_modules
            .get_or_try_build(|| Ok(metrics::script_modules(self.tree()?)))
    }

    pub fn enriched_imports(&self) -> Result<&Vec<EnrichedImport>> {
        self.enriched.get_or_try_build(|| {
            let scripts: HashSet<String> = self.script_modules()?.iter().cloned().collect();
            enrich(
                self.import_rows()?,
                &scripts,
                &self.config.analysis.package_marker,
            )
        })
    }

    // =========================================================================
    // TABLES
    // =========================================================================

    pub fn report(&self) -> Result<DependencyReport> {
        let rows = self.enriched_imports()?;
        Ok(DependencyReport {
            project: self.project.name.clone(),
            generated_at: Utc::now(),
            modules: stats::module_dependencies(rows),
            packages: stats::package_dependencies(rows),
            most_imported_roots: stats::most_imported_roots(rows),
            most_imported_modules: stats::most_imported_modules(rows),
            most_imported_packages: stats::most_imported_packages(rows),
            unused_modules: stats::unused_modules(rows),
            invalid_imports: stats::invalid_imports(rows),
            node_summary: metrics::summarize(self.tree()?),
        })
    }

    // =========================================================================
    // DIAGRAMS
    // =========================================================================

    /// One document per connected component of the in-project module graph,
    /// largest first
    pub fn module_graphs(&self) -> Result<Vec<Diagram>> {
        let edges = stats::module_graph_edges(self.enriched_imports()?);
        let limit = self.config.render.max_component_nodes;

        Ok(split_components(&edges)
            .into_iter()
            .enumerate()
            .map(|(i, component)| {
                if limit > 0 && component.node_count() > limit {
                    warn!(
                        component = i + 1,
                        nodes = component.node_count(),
                        limit,
                        "Module graph component exceeds the configured size"
                    );
                }
                Diagram::new(format!("module_graph_{}", i + 1), relation_graph(&component.edges))
            })
            .collect())
    }

    /// One document per imported external root
    pub fn external_graphs(&self) -> Result<Vec<Diagram>> {
        Ok(stats::external_package_edges(self.enriched_imports()?)
            .into_iter()
            .map(|(root, edges)| Diagram::new(format!("external_{}", root), relation_graph(&edges)))
            .collect())
    }

    pub fn class_diagrams(&self) -> Result<Vec<Diagram>> {
        let mut visitor = ClassDiagramVisitor::new();
        self.tree()?.accept(&mut visitor);
        Ok(visitor
            .into_documents()
            .into_iter()
            .map(|(package, doc)| Diagram::new(format!("classes_{}", package), doc))
            .collect())
    }

    pub fn inheritance_graph(&self) -> Result<Diagram> {
        let mut visitor = InheritanceVisitor::new();
        self.tree()?.accept(&mut visitor);
        Ok(Diagram::new("inheritance", visitor.into_document()))
    }

    /// Module graphs plus the selected extra families
    pub fn diagrams(&self, selection: DiagramSelection) -> Result<Vec<Diagram>> {
        let mut diagrams = self.module_graphs()?;
        if selection.external {
            diagrams.extend(self.external_graphs()?);
        }
        if selection.classes {
            diagrams.extend(self.class_diagrams()?);
        }
        if selection.inheritance {
            diagrams.push(self.inheritance_graph()?);
        }
        info!(count = diagrams.len(), "Prepared diagram documents");
        Ok(diagrams)
    }

    // =========================================================================
    // CACHE
    // =========================================================================

    /// Delete persisted artifacts; returns how many existed
    pub fn clear_cache(&self) -> Result<usize> {
        let removed = [
            self.tree_dict.delete()?,
            self.import_rows.delete()?,
            self.script_modules.delete()?,
            self.enriched.delete()?,
        ]
        .into_iter()
        .filter(|&existed| existed)
        .count();
        info!(removed, "Cleared cached artifacts");
        Ok(removed)
    }
}

fn cell<T>(dir: Option<&PathBuf>, key: &'static str) -> Cached<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    match dir {
        Some(dir) => Cached::with_adapter(key, Box::new(JsonFile::<T>::new(dir, key))),
        None => Cached::in_memory(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// `app/` with a script entry point, one model module and an orphan
    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path().join("app");
        write(&root, "__init__.py", "");
        write(
            &root,
            "main.py",
            "import os\nfrom app import models\nfrom app.missing import thing\n\n\ndef run():\n    return models.Shape()\n\n\nif __name__ == \"__main__\":\n    run()\n",
        );
        write(
            &root,
            "models.py",
            "import abc\n\n\nclass Shape(abc.ABC):\n    def area(self):\n        pass\n\n\nclass Square(Shape):\n    def area(self):\n        return 1\n",
        );
        write(&root, "orphan.py", "X = 1\n");
        dir
    }

    fn session(dir: &TempDir, cache: &Path, use_cache: bool) -> Analysis {
        let project = Project::from_path(&dir.path().join("app")).unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(cache.to_path_buf());
        Analysis::new(project, config, use_cache).unwrap()
    }

    #[test]
    fn test_enriched_imports() {
        let dir = fixture();
        let cache = tempdir().unwrap();
        let analysis = session(&dir, cache.path(), false);
        let rows = analysis.enriched_imports().unwrap();

        let missing = rows
            .iter()
            .find(|r| r.import_reference == "app.missing.thing")
            .unwrap();
        assert!(missing.is_internal);
        assert!(missing.invalid_import);

        let os = rows.iter().find(|r| r.import_reference == "os").unwrap();
        assert!(os.is_builtin);

        let main = rows.iter().find(|r| r.module == "app.main").unwrap();
        assert!(main.is_script_file);
        assert!(main.unused_module);

        let models = rows.iter().find(|r| r.module == "app.models").unwrap();
        assert!(!models.unused_module);
    }

    #[test]
    fn test_report() {
        let dir = fixture();
        let cache = tempdir().unwrap();
        let report = session(&dir, cache.path(), false).report().unwrap();

        assert_eq!(report.project, "app");
        assert!(report
            .unused_modules
            .iter()
            .any(|u| u.module == "app.orphan" && !u.is_script_file));
        assert!(report
            .invalid_imports
            .iter()
            .any(|i| i.import_reference == "app.missing.thing"));
        assert!(!report.node_summary.is_empty());
    }

    #[test]
    fn test_diagrams() {
        let dir = fixture();
        let cache = tempdir().unwrap();
        let analysis = session(&dir, cache.path(), false);

        let graphs = analysis.module_graphs().unwrap();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].name, "module_graph_1");
        assert!(graphs[0].document.contains("app.main --> app.models"));

        let all = analysis
            .diagrams(DiagramSelection {
                external: true,
                classes: true,
                inheritance: true,
            })
            .unwrap();
        let names: Vec<&str> = all.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&"external_os"));
        assert!(names.contains(&"classes_app"));
        assert_eq!(names.last(), Some(&"inheritance"));
        assert!(all
            .last()
            .unwrap()
            .document
            .contains("Shape <|-- Square"));
    }

    #[test]
    fn test_artifacts_are_persisted_and_reused() {
        let dir = fixture();
        let cache = tempdir().unwrap();

        let first = session(&dir, cache.path(), true);
        let rows = first.enriched_imports().unwrap().clone();
        let cache_dir = first.cache_dir().unwrap().clone();
        for key in [TREE_KEY, IMPORT_ROWS_KEY, SCRIPT_MODULES_KEY, ENRICHED_KEY] {
            assert!(cache_dir.join(format!("{}.json", key)).exists(), "{}", key);
        }

        // Source changes are not picked up while the cache is warm
        fs::remove_file(dir.path().join("app").join("orphan.py")).unwrap();
        let second = session(&dir, cache.path(), true);
        assert_eq!(second.enriched_imports().unwrap(), &rows);

        assert_eq!(second.clear_cache().unwrap(), 4);
        let third = session(&dir, cache.path(), true);
        assert!(third
            .enriched_imports()
            .unwrap()
            .iter()
            .all(|r| r.module != "app.orphan"));
    }

    #[test]
    fn test_tree_roundtrips_through_dict() {
        let dir = fixture();
        let cache = tempdir().unwrap();
        let analysis = session(&dir, cache.path(), false);
        let tree = analysis.tree().unwrap();

        assert_eq!(&tree.to_dict(), analysis.tree_dict().unwrap());
        assert!(tree.find("app.models.Square.area").is_some());
    }
}
