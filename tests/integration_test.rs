use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_timetable-export"))
}

fn output_dir(name: &str) -> PathBuf {
    Path::new("tests/output").join(name)
}

/// Fresh, empty output directory for one test.
fn setup(name: &str) -> PathBuf {
    let dir = output_dir(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create output directory");
    dir
}

#[test]
fn test_single_section_pdf() {
    let dir = setup("single-pdf");

    let output = cargo_bin()
        .args([
            "-s", "demos/schedules.json",
            "-n", "Juan Dela Cruz",
            "-f", "pdf",
            "-d", "2026-10-17",
            "--base-name", "juan",
            "-o", dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);

    let path = dir.join("juan_2026-10-17.pdf");
    assert!(path.exists(), "PDF file was not created");

    let metadata = fs::metadata(&path).expect("Failed to get file metadata");
    assert!(metadata.len() > 1000, "PDF file is too small, likely empty or corrupt");
}

#[test]
fn test_all_sections_csv() {
    let dir = setup("all-sections-csv");

    let output = cargo_bin()
        .args([
            "-s", "demos/schedules.json",
            "-f", "csv",
            "--all-sections",
            "-d", "2026-10-17",
            "-o", dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);

    let path = dir.join("all_sections_schedule_2026-10-17.csv");
    let content = fs::read_to_string(&path).expect("CSV file was not created");

    // First-year section comes before third-year regardless of input order
    let first = content.find("Section,BSIT 1B").expect("BSIT 1B missing");
    let third = content.find("Section,BSIT 3A").expect("BSIT 3A missing");
    assert!(first < third);

    assert!(content.contains("\"PC 317; 9:00 AM - 11:00 AM; Juan Dela Cruz; CL1\""));
    assert!(content.contains("\"PC 317 L; 1:00 PM - 4:00 PM; Juan Dela Cruz; CL2\""));
    assert!(content.contains("\"IT 101; 2:00 PM - 4:00 PM; TBA; CL1\""));
    assert!(content.contains("\nAdviser,Maria Santos\n"));
}

#[test]
fn test_all_sections_pdf_with_missing_branding_assets() {
    let dir = setup("branding-pdf");

    let output = cargo_bin()
        .args([
            "-s", "demos/schedules.json",
            "-f", "pdf",
            "--all-sections",
            "--branding", "demos/branding.toml",
            "--avatar", "demos/missing-avatar.png",
            "-d", "2026-10-17",
            "-o", dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Missing images must not fail the export: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pages: 2"), "unexpected output: {}", stdout);
    assert!(dir.join("all_sections_schedule_2026-10-17.pdf").exists());
}

#[test]
fn test_interactive_choice() {
    let dir = setup("interactive");

    let mut child = cargo_bin()
        .args([
            "-s", "demos/schedules.json",
            "-d", "2026-10-17",
            "--base-name", "prompted",
            "-o", dir.to_str().unwrap(),
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");

    child
        .stdin
        .take()
        .expect("stdin not piped")
        .write_all(b"maybe\n2\n")
        .expect("Failed to write choice");
    let output = child.wait_with_output().expect("Failed to wait for command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(dir.join("prompted_2026-10-17.csv").exists());
}

#[test]
fn test_interactive_cancel() {
    let dir = setup("cancelled");

    let mut child = cargo_bin()
        .args(["-s", "demos/schedules.json", "-o", dir.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");

    child
        .stdin
        .take()
        .expect("stdin not piped")
        .write_all(b"q\n")
        .expect("Failed to write choice");
    let output = child.wait_with_output().expect("Failed to wait for command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Export cancelled"));
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn test_empty_schedule_list() {
    let dir = setup("empty");
    let schedules = dir.join("empty.json");
    fs::write(&schedules, "[]").unwrap();

    let output = cargo_bin()
        .args([
            "-s", schedules.to_str().unwrap(),
            "-f", "pdf",
            "-o", dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for empty schedules");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1, "only the input file may exist");
}

#[test]
fn test_invalid_schedule_file() {
    let output = cargo_bin()
        .args([
            "-s", "nonexistent.json",
            "-f", "csv",
            "-o", "tests/output/should-not-exist",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for missing schedules");
}

#[test]
fn test_invalid_date_format() {
    let output = cargo_bin()
        .args([
            "-s", "demos/schedules.json",
            "-f", "csv",
            "-d", "not-a-date",
            "-o", "tests/output/should-not-exist",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for invalid date");
}
