use std::path::{Path, PathBuf};

use assert_cmd::Command;
use calamine::{Data, Reader};
use predicates::prelude::*;

fn pricematch(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pricematch").unwrap();
    cmd.env("PRICEMATCH_CONFIG_DIR", config_dir)
        .env("NO_COLOR", "1")
        .env_remove("PRICEMATCH_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn master_csv(dir: &Path) -> PathBuf {
    write(
        dir,
        "master.csv",
        "S No., Item Code ,Unit,UNIT PRICE\n1,A100,pcs,10\n2,A100,pcs,8\n3,B200,kg,5\n",
    )
}

fn raw_csv(dir: &Path) -> PathBuf {
    write(dir, "raw.csv", "Item Code,Qty\na100,3\nxyz-unrelated,1\n,7\n")
}

#[test]
fn match_writes_csv_in_raw_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("merged.csv");

    pricematch(dir.path())
        .arg("match")
        .arg(master_csv(dir.path()))
        .arg(raw_csv(dir.path()))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Master sheet loaded: 3 rows"))
        .stdout(predicate::str::contains("Raw sheet loaded: 3 rows"))
        .stdout(predicate::str::contains("Matched data preview"))
        .stdout(predicate::str::contains("1 matched"));

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "item code,qty,matched_code,unit,unit price");
    assert_eq!(lines[1], "a100,3,A100,pcs,8");
    assert_eq!(lines[2], "xyz-unrelated,1,,,");
    assert_eq!(lines[3], ",7,,,");
}

#[test]
fn match_writes_xlsx_by_default_name() {
    let dir = tempfile::tempdir().unwrap();
    let master = master_csv(dir.path());
    let raw = raw_csv(dir.path());

    pricematch(dir.path())
        .current_dir(dir.path())
        .arg("match")
        .arg(&master)
        .arg(&raw)
        .arg("--no-preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched data preview").not());

    let out = dir.path().join("updated_with_prices_and_units.xlsx");
    let mut workbook = calamine::open_workbook_auto(&out).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][2], Data::String("matched_code".into()));
    assert_eq!(rows[1][2], Data::String("A100".into()));
    assert_eq!(rows[1][4], Data::Float(8.0));
    assert_eq!(rows[2][2], Data::Empty);
}

#[test]
fn match_reads_xlsx_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let master = dir.path().join("master.xlsx");
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Prices").unwrap();
    for (col, h) in ["S No.", "Item Code", "Unit", "Unit Price"].iter().enumerate() {
        sheet.write_string(0, col as u16, *h).unwrap();
    }
    sheet.write_number(1, 0, 1.0).unwrap();
    sheet.write_string(1, 1, "BOLT M8").unwrap();
    sheet.write_string(1, 2, "pcs").unwrap();
    sheet.write_number(1, 3, 0.25).unwrap();
    workbook.save(&master).unwrap();

    let raw = write(dir.path(), "raw.csv", "item code\nM8 BOLT\n");
    let out = dir.path().join("out.csv");

    pricematch(dir.path())
        .arg("match")
        .arg(&master)
        .arg(&raw)
        .args(["--master-sheet", "Prices", "--output"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.lines().nth(1).unwrap().starts_with("M8 BOLT,BOLT M8,pcs,0.25"));
}

#[test]
fn missing_master_column_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let master = write(dir.path(), "master.csv", "S No.,Item Code,Unit\n1,A100,pcs\n");
    let out = dir.path().join("merged.csv");

    pricematch(dir.path())
        .arg("match")
        .arg(&master)
        .arg(raw_csv(dir.path()))
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Master sheet is missing required columns: unit price"));

    assert!(!out.exists());
}

#[test]
fn threshold_flag_controls_matching() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("merged.csv");

    pricematch(dir.path())
        .arg("match")
        .arg(master_csv(dir.path()))
        .arg(raw_csv(dir.path()))
        .args(["--threshold", "90", "--no-preview", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 matched"));

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().nth(1), Some("a100,3,,,"));
}

#[test]
fn check_reports_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();

    pricematch(dir.path())
        .arg("check")
        .arg(master_csv(dir.path()))
        .args(["--role", "master"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Master sheet uploaded successfully: 3 rows"))
        .stdout(predicate::str::contains("Columns: s no., item code, unit, unit price"));

    let bad = write(dir.path(), "raw.csv", "Code\nA100\n");
    pricematch(dir.path())
        .arg("check")
        .arg(&bad)
        .args(["--role", "raw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Raw sheet is missing required columns: item code"));
}

#[test]
fn config_set_persists_and_applies() {
    let dir = tempfile::tempdir().unwrap();

    pricematch(dir.path())
        .args(["config", "set", "threshold", "90"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved threshold = 90"));

    let saved = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
    assert!(saved.contains("\"threshold\": 90.0"));

    pricematch(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("threshold"))
        .stdout(predicate::str::contains("token-sort"));

    let out = dir.path().join("merged.csv");
    pricematch(dir.path())
        .arg("match")
        .arg(master_csv(dir.path()))
        .arg(raw_csv(dir.path()))
        .args(["--no-preview", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 matched"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    pricematch(dir.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown key 'colour'"));
}

#[test]
fn unsupported_output_fails_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("merged.pdf");

    pricematch(dir.path())
        .arg("match")
        .arg(master_csv(dir.path()))
        .arg(raw_csv(dir.path()))
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("sheet loaded").not())
        .stderr(predicate::str::contains("merged.pdf"));

    assert!(!out.exists());
}
