//! Graph command implementation
//!
//! @module cli/graph

use crate::analysis::{Diagram, DiagramSelection};
use crate::cli::{open_analysis, GlobalArgs};
use crate::core::error::Result;
use crate::output::human;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the graph command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    strata graph                          Module graph components on stdout
    strata graph --external --classes     Add external and class diagrams
    strata graph --inheritance --out uml  Write .puml files into ./uml")]
pub struct GraphArgs {
    /// Project path (default: current directory)
    pub path: Option<PathBuf>,

    /// Add one graph per imported external package
    #[arg(long)]
    pub external: bool,

    /// Add one class diagram per package
    #[arg(long)]
    pub classes: bool,

    /// Add the class inheritance graph
    #[arg(long)]
    pub inheritance: bool,

    /// Write one .puml file per diagram into this directory
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

impl GraphArgs {
    pub fn selection(&self) -> DiagramSelection {
        DiagramSelection {
            external: self.external,
            classes: self.classes,
            inheritance: self.inheritance,
        }
    }
}

/// Run the graph command
pub fn run(args: GraphArgs, global: &GlobalArgs) -> Result<()> {
    let selection = args.selection();
    let analysis = open_analysis(args.path, global)?;
    let diagrams = analysis.diagrams(selection)?;

    match args.out {
        Some(dir) => {
            write_documents(&dir, &diagrams)?;
            println!("Wrote {} diagrams to {}", diagrams.len(), dir.display());
        }
        None => print!("{}", human::diagrams(&diagrams)),
    }
    Ok(())
}

/// `<dir>/<name>.puml` per diagram
pub fn write_documents(dir: &Path, diagrams: &[Diagram]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for diagram in diagrams {
        let path = dir.join(format!("{}.puml", diagram.name));
        fs::write(&path, &diagram.document)?;
        info!(path = %path.display(), "Wrote diagram document");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_documents() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("uml");
        let diagrams = vec![Diagram {
            name: "module_graph_1".to_string(),
            document: "@startuml\n@enduml\n".to_string(),
        }];

        write_documents(&out, &diagrams).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("module_graph_1.puml")).unwrap(),
            "@startuml\n@enduml\n"
        );
    }
}
