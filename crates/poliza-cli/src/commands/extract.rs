//! Extract command - pull the field record out of a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use poliza_core::acquire::{DefaultSource, DocumentSource};

use super::{OutputFormat, build_pipeline, format_output, format_record, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF (path or http(s) URL)
    #[arg(required = true)]
    input: String,

    /// Also write the result to `<stem>.<ext>` inside this directory
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print document type and diagnostics along with the record
    #[arg(long)]
    full: bool,

    /// Treat the input as already-extracted text
    #[arg(long)]
    text: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;

    info!("Processing document: {}", args.input);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);

    let text = if args.text {
        pb.set_message("Reading text...");
        match fs::read_to_string(&args.input) {
            Ok(text) => text,
            Err(e) => {
                pb.finish_and_clear();
                anyhow::bail!("Failed to read {}: {}", args.input, e);
            }
        }
    } else {
        pb.set_message("Extracting text...");
        let source = DefaultSource::new(&config.fetch, &config.pdf)?;
        match source.acquire_text(&args.input).await {
            Ok(text) => text,
            Err(e) => {
                pb.finish_and_clear();
                anyhow::bail!("{}", e);
            }
        }
    };

    pb.set_message("Extracting fields...");
    let output = pipeline.run(&text);
    pb.finish_and_clear();

    for warning in output.warnings() {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let rendered = if args.full {
        format_output(&output, args.format)?
    } else {
        format_record(&output.record, args.format)?
    };

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
        let stem = std::path::Path::new(&args.input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("poliza");
        let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
        fs::write(&output_path, &rendered)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    }

    println!("{}", rendered.trim_end());

    debug!(
        "Classified as {} in {:?}",
        output.document_type,
        start.elapsed()
    );

    Ok(())
}
