//! Human-readable output formatting

use crate::analysis::{DependencyReport, Diagram};
use crate::imports::stats::{Distinct, Ranking};
use crate::imports::{EnrichedImport, ImportRow};
use crate::tree::{PrintTreeVisitor, SourceTree};

/// Indented hierarchy, one node per line
pub fn tree(tree: &SourceTree) -> String {
    let mut visitor = PrintTreeVisitor::new();
    tree.accept(&mut visitor);
    let mut output = visitor.into_lines().join("\n");
    output.push('\n');
    output
}

pub fn import_rows(rows: &[ImportRow]) -> String {
    table(
        &["MODULE", "IMPORT"],
        rows.iter()
            .map(|r| vec![r.module.clone(), r.import_reference.clone()])
            .collect(),
    )
}

pub fn enriched_imports(rows: &[EnrichedImport]) -> String {
    table(
        &["MODULE", "IMPORT", "KIND", "RESOLVED MODULE", "RESOLVED PACKAGE", "FLAGS"],
        rows.iter()
            .map(|r| {
                vec![
                    r.module.clone(),
                    r.import_reference.clone(),
                    import_kind(r).to_string(),
                    r.import_module.clone().unwrap_or_default(),
                    r.import_package.clone().unwrap_or_default(),
                    flags(r),
                ]
            })
            .collect(),
    )
}

fn import_kind(row: &EnrichedImport) -> &'static str {
    if row.is_no_imports {
        "-"
    } else if row.is_internal {
        "internal"
    } else if row.is_builtin {
        "builtin"
    } else {
        "external"
    }
}

fn flags(row: &EnrichedImport) -> String {
    let mut flags = Vec::new();
    if row.invalid_import {
        flags.push("invalid");
    }
    if row.unused_module {
        flags.push("unused");
    }
    if row.is_init_file {
        flags.push("init");
    }
    if row.is_script_file {
        flags.push("script");
    }
    flags.join(",")
}

pub fn report(report: &DependencyReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("DEPENDENCY STATISTICS: {}\n", report.project));
    output.push_str(&format!(
        "Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    output.push_str("\nNODES\n");
    output.push_str(&table(
        &["TYPE", "ITEMS", "LINES", "MIN", "MEAN", "MAX"],
        report
            .node_summary
            .iter()
            .map(|s| {
                vec![
                    s.node_type.to_string(),
                    s.items.to_string(),
                    s.total_lines.to_string(),
                    optional(s.min_lines),
                    s.mean_lines.map(|m| format!("{:.1}", m)).unwrap_or_default(),
                    optional(s.max_lines),
                ]
            })
            .collect(),
    ));

    output.push_str("\nMODULES\n");
    output.push_str(&table(
        &["MODULE", "EXTERNAL", "BUILTIN", "INT. PACKAGES", "INT. MODULES", "IMPORTED BY"],
        report
            .modules
            .iter()
            .map(|m| {
                vec![
                    m.module.clone(),
                    count(&m.external_packages),
                    count(&m.builtin_packages),
                    count(&m.internal_packages),
                    count(&m.internal_modules),
                    count(&m.imported_from_modules),
                ]
            })
            .collect(),
    ));

    output.push_str("\nPACKAGES\n");
    output.push_str(&table(
        &["PACKAGE", "EXTERNAL", "BUILTIN", "INT. PACKAGES", "SELF", "IMPORTED BY"],
        report
            .packages
            .iter()
            .map(|p| {
                vec![
                    display_package(&p.package),
                    count(&p.external_packages),
                    count(&p.builtin_packages),
                    count(&p.internal_packages),
                    p.imports_itself.to_string(),
                    count(&p.imported_from_packages),
                ]
            })
            .collect(),
    ));

    ranking(&mut output, "MOST IMPORTED ROOTS", &report.most_imported_roots);
    ranking(&mut output, "MOST IMPORTED MODULES", &report.most_imported_modules);
    ranking(&mut output, "MOST IMPORTED PACKAGES", &report.most_imported_packages);

    output.push_str(&format!("\nUNUSED MODULES ({})\n", report.unused_modules.len()));
    for unused in &report.unused_modules {
        let marker = if unused.is_script_file { " [script]" } else { "" };
        output.push_str(&format!("  {}{}\n", unused.module, marker));
    }

    output.push_str(&format!("\nINVALID IMPORTS ({})\n", report.invalid_imports.len()));
    for invalid in &report.invalid_imports {
        output.push_str(&format!("  {} -> {}\n", invalid.module, invalid.import_reference));
    }

    output
}

fn ranking(output: &mut String, title: &str, ranking: &[Ranking]) {
    output.push_str(&format!("\n{}\n", title));
    if ranking.is_empty() {
        output.push_str("  (none)\n");
        return;
    }
    for (i, entry) in ranking.iter().enumerate() {
        output.push_str(&format!("  {:>3}. {} ({})\n", i + 1, entry.name, entry.count));
    }
}

/// Documents separated by a comment line naming each
pub fn diagrams(diagrams: &[Diagram]) -> String {
    let mut output = String::new();
    for diagram in diagrams {
        output.push_str(&format!("' {}\n", diagram.name));
        output.push_str(&diagram.document);
        output.push('\n');
    }
    output
}

fn count(distinct: &Distinct) -> String {
    distinct.count.to_string()
}

fn optional(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn display_package(package: &str) -> String {
    if package.is_empty() {
        "(root)".to_string()
    } else {
        package.to_string()
    }
}

/// Left-aligned columns sized to their widest cell
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut output, &header, &widths);
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    output.push_str(&"-".repeat(total));
    output.push('\n');
    for row in &rows {
        push_row(&mut output, row, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    output.push_str(line.join("  ").trim_end());
    output.push('\n');
}
