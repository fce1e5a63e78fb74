//! Batch processing command for many documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::{StreamExt, stream};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use poliza_core::PipelineOutput;
use poliza_core::acquire::{DocumentSource, FileSource};
use poliza_core::extraction::ExtractionPipeline;

use super::{OutputFormat, build_pipeline, format_record, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching PDF or .txt files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of documents processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Stop at the first failed document
    #[arg(long)]
    fail_fast: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    output: Option<PipelineOutput>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;
    let source = FileSource::new(&config.pdf);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    let mut pending = stream::iter(files)
        .map(|path| process_single_file(path, &source, &pipeline))
        .buffered(args.jobs.max(1));

    while let Some(result) = pending.next().await {
        overall_pb.inc(1);

        if let Some(error) = &result.error {
            warn!("Failed to process {}: {}", result.path.display(), error);
            if args.fail_fast {
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}: {}", result.path.display(), error);
            }
        }

        if let (Some(output), Some(output_dir)) = (&result.output, &args.output_dir) {
            write_output(output, &result.path, output_dir, args.format)?;
        }

        results.push(result);
    }

    overall_pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: PathBuf,
    source: &FileSource,
    pipeline: &ExtractionPipeline,
) -> ProcessResult {
    let file_start = Instant::now();
    let location = path.to_string_lossy().into_owned();

    let (output, error) = match source.acquire_text(&location).await {
        Ok(text) => (Some(pipeline.run(&text)), None),
        Err(e) => (None, Some(e.to_string())),
    };

    ProcessResult {
        path,
        output,
        error,
        processing_time_ms: file_start.elapsed().as_millis() as u64,
    }
}

fn write_output(
    output: &PipelineOutput,
    path: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("poliza");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    fs::write(&output_path, format_record(&output.record, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

/// Policy number of a record, whichever schema it uses.
fn policy_number(output: &PipelineOutput) -> &str {
    output
        .record
        .get("Número de póliza")
        .or_else(|| output.record.get("numero_poliza"))
        .unwrap_or("")
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let processed_at = chrono::Local::now().to_rfc3339();

    wtr.write_record([
        "filename",
        "status",
        "document_type",
        "kind",
        "policy_number",
        "warnings",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(output) = &result.output {
            wtr.write_record([
                filename,
                "success",
                output.document_type.as_str(),
                output.kind.as_str(),
                policy_number(output),
                &output.warnings().count().to_string(),
                &result.processing_time_ms.to_string(),
                &processed_at,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                &processed_at,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
