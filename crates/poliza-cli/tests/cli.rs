use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Command isolated from the user's config directory.
fn poliza(home: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("poliza").into();
    cmd.current_dir(home);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("NO_COLOR", "1");
    cmd
}

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../poliza-core/testdata")
        .join(name)
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("poliza"));
}

// --- Extract ---

#[test]
fn extract_life_policy_text() {
    let tmp = TempDir::new().unwrap();
    let assert = poliza(tmp.path())
        .args(["extract", "--text"])
        .arg(testdata("vida_temporal.txt"))
        .assert()
        .success();

    let record = stdout_json(&assert.get_output().stdout);
    assert_eq!(record["Número de póliza"], "1059331H");
    assert_eq!(record["Prima anual total"], "12345.67");
    assert_eq!(record["Prima mensual"], "1028.81");
}

#[test]
fn extract_record_has_every_schema_key() {
    let tmp = TempDir::new().unwrap();
    let assert = poliza(tmp.path())
        .arg("extract")
        .arg(testdata("endoso_autos.txt"))
        .assert()
        .success();

    let record = stdout_json(&assert.get_output().stdout);
    let keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 12);
    assert_eq!(keys[0], "numero_poliza");
    assert_eq!(record["precio_total"], "1566.00");
}

#[test]
fn extract_full_output() {
    let tmp = TempDir::new().unwrap();
    let assert = poliza(tmp.path())
        .args(["extract", "--full"])
        .arg(testdata("autos_individual.txt"))
        .assert()
        .success();

    let output = stdout_json(&assert.get_output().stdout);
    assert_eq!(output["document_type"], "autos_individual");
    assert_eq!(output["kind"], "policy");
    assert_eq!(output["record"]["Número de póliza"], "AU-778812");
    assert!(output["diagnostics"].is_array());
}

#[test]
fn extract_csv_format() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .args(["extract", "--format", "csv"])
        .arg(testdata("gmm_familiar.txt"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Número de póliza,"))
        .stdout(predicate::str::contains("GM-5521903"));
}

#[test]
fn extract_writes_output_dir() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");

    poliza(tmp.path())
        .arg("extract")
        .arg(testdata("vida_temporal.txt"))
        .arg(&out)
        .assert()
        .success();

    let written = fs::read_to_string(out.join("vida_temporal.json")).unwrap();
    let record: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(record["Número de póliza"], "1059331H");
}

#[test]
fn extract_unknown_document_warns() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("recibo.txt");
    fs::write(&input, "Recibo de luz. Total a pagar 450.00").unwrap();

    poliza(tmp.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("document type not recognized"));
}

#[test]
fn extract_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .args(["extract", "no-such-file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn extract_broken_pdf_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("broken.pdf");
    fs::write(&input, b"not a pdf at all").unwrap();

    poliza(tmp.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to render"));
}

// --- Batch ---

#[test]
fn batch_records_per_file_failures() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::copy(testdata("vida_temporal.txt"), docs.join("vida.txt")).unwrap();
    fs::copy(testdata("autos_individual.txt"), docs.join("autos.txt")).unwrap();
    fs::write(docs.join("broken.pdf"), b"not a pdf").unwrap();
    let out = tmp.path().join("out");

    poliza(tmp.path())
        .arg("batch")
        .arg(format!("{}/*", docs.display()))
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 1 failed"));

    assert!(out.join("vida.json").exists());
    assert!(out.join("autos.json").exists());
    assert!(!out.join("broken.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 4);
    assert_eq!(summary.lines().filter(|l| l.contains(",error,")).count(), 1);
    assert!(summary.contains("vida_temporal"));
}

#[test]
fn batch_fail_fast_stops() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.pdf"), b"not a pdf").unwrap();

    poliza(tmp.path())
        .args(["batch", "*.pdf", "--fail-fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn batch_without_matches_fails() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .args(["batch", "*.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

// --- Catalog ---

#[test]
fn catalog_list_in_priority_order() {
    let tmp = TempDir::new().unwrap();
    let assert = poliza(tmp.path()).args(["catalog", "list"]).assert().success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let ids = [
        "endoso_autos",
        "endoso_gmm",
        "autos_individual",
        "gmm_familiar",
        "vida_temporal",
        "vida ",
        "salud",
    ];
    let positions: Vec<usize> = ids.iter().map(|id| stdout.find(id).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn catalog_show_document_type() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .args(["catalog", "show", "vida_temporal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Número de póliza"))
        .stdout(predicate::str::contains("Derivation rules:"));

    poliza(tmp.path())
        .args(["catalog", "show", "hogar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown document type"));
}

#[test]
fn catalog_classify_text() {
    let tmp = TempDir::new().unwrap();
    poliza(tmp.path())
        .args(["catalog", "classify"])
        .arg(testdata("endoso_autos.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Document type: endoso_autos"));
}

#[test]
fn catalog_check_reports_errors() {
    let tmp = TempDir::new().unwrap();
    let bad = tmp.path().join("catalog.json");
    fs::write(&bad, r#"{"schemas": "#).unwrap();

    poliza(tmp.path())
        .args(["catalog", "check"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse catalog"));

    let builtin = Path::new(env!("CARGO_MANIFEST_DIR")).join("../poliza-core/catalog/default.json");
    poliza(tmp.path())
        .args(["catalog", "check"])
        .arg(builtin)
        .assert()
        .success()
        .stdout(predicate::str::contains("7 document types"));
}

// --- Config ---

#[test]
fn config_init_set_get() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.json");
    let config_arg = config.to_str().unwrap();

    poliza(tmp.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    poliza(tmp.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    poliza(tmp.path())
        .args(["--config", config_arg, "config", "set", "pdf.max_pages", "3"])
        .assert()
        .success();

    poliza(tmp.path())
        .args(["--config", config_arg, "config", "get", "pdf.max_pages"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.json");

    poliza(tmp.path())
        .args(["--config", config.to_str().unwrap()])
        .args(["config", "set", "pdf.password", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_enables_known_fixtures() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.json");
    let config_arg = config.to_str().unwrap();

    poliza(tmp.path())
        .args(["--config", config_arg, "config", "set"])
        .args(["extraction.apply_known_fixtures", "true"])
        .assert()
        .success();

    let input = tmp.path().join("vida.txt");
    fs::write(
        &input,
        "SEGURO DE VIDA\nPÓLIZA 1059331H\nPrima anual total 1,200.00\nAsegurado: X",
    )
    .unwrap();

    let assert = poliza(tmp.path())
        .args(["--config", config_arg, "extract", "--full"])
        .arg(&input)
        .assert()
        .success();

    let output = stdout_json(&assert.get_output().stdout);
    assert_eq!(output["record"]["Nombre del plan"], "VIDA TEMPORAL PROTGT 20");
    assert!(
        output["diagnostics"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["type"] == "fixture_applied")
    );
}
