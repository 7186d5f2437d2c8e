use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn staged(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        fs::copy(fixture_path(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn routexml2csv() -> Command {
    let mut cmd = Command::cargo_bin("routexml2csv").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_writes_both_tables() {
    let dir = staged(&["stage_routes.xml", "night_routes.xml"]);
    let main = dir.path().join("out/all_routes.csv");
    let detail = dir.path().join("out/routes_detail.tsv");

    let output = routexml2csv()
        .arg("--dir")
        .arg(dir.path())
        .arg("-o")
        .arg(&main)
        .arg("--detail-tsv")
        .arg(&detail)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("Wrote main CSV: {}", main.display())));
    assert!(stdout.contains(&format!("Wrote detail TSV: {}", detail.display())));
    assert!(main.exists());
    assert!(detail.exists());
}

#[test]
fn test_cli_warns_once_and_continues_on_broken_file() {
    let dir = staged(&["stage_routes.xml", "night_routes.xml", "broken.xml"]);
    let main = dir.path().join("all_routes.csv");

    let output = routexml2csv()
        .arg(dir.path().join("*.xml"))
        .arg("--output-csv")
        .arg(&main)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.matches("skipping unreadable input").count(), 1);
    assert!(stderr.contains("broken.xml"));

    let text = fs::read_to_string(&main).unwrap();
    // BOM, header and one row per placemark from the two good files
    assert_eq!(text.matches("\r\n").count(), 4);
}

#[test]
fn test_cli_without_detail_flag_only_writes_main() {
    let dir = staged(&["night_routes.xml"]);
    let main = dir.path().join("main.csv");

    let output = routexml2csv()
        .arg(dir.path().join("night_routes.xml"))
        .arg("-o")
        .arg(&main)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Wrote main CSV"));
    assert!(!stdout.contains("Wrote detail TSV"));
}

#[test]
fn test_cli_no_input_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("main.csv");

    let output = routexml2csv()
        .arg(dir.path().join("*.xml"))
        .arg("-o")
        .arg(&main)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("No input XML files found"));
    assert!(!main.exists());
}

#[test]
fn test_cli_all_inputs_broken_fails() {
    let dir = staged(&["broken.xml"]);
    let main = dir.path().join("main.csv");

    let output = routexml2csv()
        .arg("--dir")
        .arg(dir.path())
        .arg("-o")
        .arg(&main)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("No route rows were produced"));
    assert!(!main.exists());
}

#[test]
fn test_cli_requires_output_csv() {
    let output = routexml2csv().arg("routes.xml").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_invalid_pattern_does_not_stop_the_run() {
    let dir = staged(&["latin1_routes.xml"]);
    let main = dir.path().join("main.csv");

    let output = routexml2csv()
        .arg(dir.path().join("latin1_routes.xml"))
        .arg(dir.path().join("miss[ing.xml"))
        .arg("-o")
        .arg(&main)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("invalid pattern matches no files"));
    assert!(!stderr.contains("skipping unreadable input"));

    let bytes = fs::read(&main).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains(r#""Café Route""#));
}
