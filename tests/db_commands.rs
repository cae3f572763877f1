mod stubs;

use predicates::prelude::*;
use stubs::{FilingFixture, stakewatch};

fn processed_db(temp: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let downloads = temp.path().join("downloads");
    let db = temp.path().join("reports.db");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");
    FilingFixture {
        kind: "大量保有報告書",
        holder: "別の保有者",
        submission_date: "2025年4月10日",
        ..FilingFixture::default()
    }
    .write_bundle(&downloads, "S100BBBB");

    stakewatch(&downloads, &db)
        .args(["process", "--dry-run"])
        .assert()
        .success();
    (downloads, db)
}

#[test]
fn stats_counts_records_per_kind() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let (downloads, db) = processed_db(&temp);

    stakewatch(&downloads, &db)
        .args(["db", "stats"])
        .assert()
        .success()
        .stdout("変更報告書: 1\n大量保有報告書: 1\ntotal: 2\n");
}

#[test]
fn search_and_latest_print_json_lines() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let (downloads, db) = processed_db(&temp);

    let assert = stakewatch(&downloads, &db)
        .args(["db", "search", "--holder", "別の"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 1, "{stdout}");
    let record: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
    assert_eq!(record["holder_name"], "別の保有者");
    assert_eq!(record["report_type"], "大量保有報告書");

    stakewatch(&downloads, &db)
        .args(["db", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("株式会社光通信"))
        .stdout(predicate::str::contains("別の保有者").not());
}

#[test]
fn export_then_import_moves_every_record() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let (downloads, db) = processed_db(&temp);
    let json = temp.path().join("processed_reports.json");
    let copy = temp.path().join("copy.db");

    stakewatch(&downloads, &db)
        .args(["db", "export", "--json"])
        .arg(&json)
        .assert()
        .success()
        .stderr(predicate::str::contains("exported 2 records"));

    stakewatch(&downloads, &copy)
        .args(["db", "import", "--json"])
        .arg(&json)
        .assert()
        .success()
        .stderr(predicate::str::contains("imported 2 records"));

    stakewatch(&downloads, &copy)
        .args(["db", "list"])
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| out.lines().count() == 2));
}
