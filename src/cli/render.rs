//! Render command implementation
//!
//! @module cli/render

use crate::analysis::{Diagram, DiagramSelection};
use crate::cli::{open_analysis, GlobalArgs};
use crate::core::config::ImageFormat;
use crate::core::error::Result;
use crate::diagram::{PlantUmlServer, RenderOutcome, RenderPool};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the render command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    strata render                         Render module graphs into ./diagrams
    strata render --classes --out img     Include class diagrams, write to ./img

The PlantUML server is taken from render.server_url in the config.
A diagram that fails to render is written as <name>.error.txt instead.")]
pub struct RenderArgs {
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

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "diagrams")]
    pub out: PathBuf,
}

/// Run the render command
pub fn run(args: RenderArgs, global: &GlobalArgs) -> Result<()> {
    let analysis = open_analysis(args.path, global)?;
    let diagrams = analysis.diagrams(DiagramSelection {
        external: args.external,
        classes: args.classes,
        inheritance: args.inheritance,
    })?;

    let render = &analysis.config().render;
    let server = PlantUmlServer::new(render)?;
    let pool = RenderPool::new(render.workers)?;

    let documents: Vec<String> = diagrams.iter().map(|d| d.document.clone()).collect();
    let outcomes = pool.render_all(&server, &documents);

    let rendered = write_outcomes(&args.out, &diagrams, &outcomes, render.format)?;
    println!(
        "Rendered {} of {} diagrams into {}",
        rendered,
        diagrams.len(),
        args.out.display()
    );
    Ok(())
}

/// Write each outcome next to its diagram name; returns the rendered count
pub fn write_outcomes(
    dir: &Path,
    diagrams: &[Diagram],
    outcomes: &[RenderOutcome],
    format: ImageFormat,
) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut rendered = 0;
    for (diagram, outcome) in diagrams.iter().zip(outcomes) {
        let path = match outcome {
            RenderOutcome::Rendered { bytes } => {
                rendered += 1;
                let path = dir.join(format!("{}.{}", diagram.name, format.as_str()));
                fs::write(&path, bytes)?;
                path
            }
            RenderOutcome::Failed { message } => {
                let path = dir.join(format!("{}.error.txt", diagram.name));
                fs::write(&path, format!("{}\n", message))?;
                path
            }
        };
        info!(path = %path.display(), "Wrote render result");
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn diagram(name: &str) -> Diagram {
        Diagram {
            name: name.to_string(),
            document: String::new(),
        }
    }

    #[test]
    fn test_failed_renders_become_error_files() {
        let dir = tempdir().unwrap();
        let outcomes = vec![
            RenderOutcome::Rendered {
                bytes: b"<svg/>".to_vec(),
            },
            RenderOutcome::Failed {
                message: "server said no".to_string(),
            },
        ];

        let rendered = write_outcomes(
            dir.path(),
            &[diagram("a"), diagram("b")],
            &outcomes,
            ImageFormat::Svg,
        )
        .unwrap();

        assert_eq!(rendered, 1);
        assert_eq!(fs::read(dir.path().join("a.svg")).unwrap(), b"<svg/>");
        assert_eq!(
            fs::read_to_string(dir.path().join("b.error.txt")).unwrap(),
            "server said no\n"
        );
        assert!(!dir.path().join("b.svg").exists());
    }
}
