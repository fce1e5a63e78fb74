//! Catalog command - inspect document types and try classification.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use poliza_core::extraction::Classifier;
use poliza_core::{Catalog, DocumentTypeId};

use super::{load_catalog, load_config};

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List document types in priority order
    List,

    /// Show the fields of one document type
    Show {
        /// Document type id (e.g., "vida_temporal")
        id: String,
    },

    /// Score a text file against every document type
    Classify {
        /// Extracted document text
        input: PathBuf,
    },

    /// Compile a catalog JSON file and report problems
    Check {
        /// Catalog JSON file
        path: PathBuf,
    },
}

pub async fn run(args: CatalogArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let catalog = || -> anyhow::Result<Catalog> { load_catalog(&load_config(config_path)?) };

    match args.command {
        CatalogCommand::List => list_types(&catalog()?),
        CatalogCommand::Show { id } => show_type(&catalog()?, &id),
        CatalogCommand::Classify { input } => classify_text(&catalog()?, &input),
        CatalogCommand::Check { path } => check_catalog(&path),
    }
}

fn list_types(catalog: &Catalog) -> anyhow::Result<()> {
    println!(
        "{:<4} {:<20} {:<12} {:>9} {:>8} {:>7} {:>6}",
        "#", "ID", "KIND", "THRESHOLD", "MARKERS", "FIELDS", "RULES"
    );

    for doc_type in catalog.document_types() {
        println!(
            "{:<4} {:<20} {:<12} {:>9.2} {:>8} {:>7} {:>6}",
            doc_type.priority,
            doc_type.id,
            doc_type.kind.as_str(),
            doc_type.threshold,
            doc_type.markers.len(),
            doc_type.fields.len(),
            doc_type.rules.len()
        );
    }

    Ok(())
}

fn show_type(catalog: &Catalog, id: &str) -> anyhow::Result<()> {
    let Some(doc_type) = catalog.document_type(&DocumentTypeId::known(id)) else {
        anyhow::bail!("Unknown document type: {}", id);
    };

    println!("{} ({})", style(&doc_type.name).bold(), doc_type.id);
    println!("Kind: {}", doc_type.kind);
    println!(
        "Classification: {} markers, threshold {:.2}",
        doc_type.markers.len(),
        doc_type.threshold
    );
    println!();

    println!("{:<32} {:<8} {:>8} {:>10}", "FIELD", "KIND", "ATTEMPTS", "SENTINEL");
    for field in &doc_type.fields {
        println!(
            "{:<32} {:<8} {:>8} {:>10}",
            field.field,
            field.kind.name(),
            field.attempts.len(),
            format!("{:?}", field.sentinel)
        );
    }

    if !doc_type.rules.is_empty() {
        println!();
        println!("Derivation rules:");
        for rule in &doc_type.rules {
            println!("  - {} -> {}", rule.name, rule.target);
        }
    }

    Ok(())
}

fn classify_text(catalog: &Catalog, input: &Path) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)?;
    let classifier = Classifier::new(catalog);

    for score in classifier.scores(&text) {
        let mark = if score.qualifies {
            style("✓").green()
        } else {
            style("·").dim()
        };
        println!(
            "{} {:<20} {}/{} = {:.2} (threshold {:.2})",
            mark, score.id, score.matches, score.total, score.score, score.threshold
        );
    }

    println!();
    println!("Document type: {}", classifier.classify(&text));

    Ok(())
}

fn check_catalog(path: &Path) -> anyhow::Result<()> {
    match Catalog::from_file(path) {
        Ok(catalog) => {
            let fields: usize = catalog.document_types().iter().map(|t| t.fields.len()).sum();
            println!(
                "{} {} compiles: {} document types, {} field specs, {} known fixtures",
                style("✓").green(),
                path.display(),
                catalog.document_types().len(),
                fields,
                catalog.fixtures().len()
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("{}: {}", path.display(), e),
    }
}
