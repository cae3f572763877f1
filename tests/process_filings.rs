mod stubs;

use predicates::prelude::*;
use stubs::{FilingFixture, stakewatch};

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn dry_run_notifies_new_filing_once_across_runs() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    let db = temp.path().join("reports.db");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");

    let first = stakewatch(&downloads, &db)
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 filings seen, 1 new"));
    let stdout = String::from_utf8_lossy(&first.get_output().stdout).into_owned();
    assert_eq!(count(&stdout, "📊 変更報告書"), 1, "{stdout}");
    assert!(stdout.contains("【変更報告書】"), "{stdout}");
    assert!(stdout.contains("🏢 株式会社サンプル商事 (12340)"), "{stdout}");
    assert!(stdout.contains("📉 変更前: 5.10%"), "{stdout}");
    assert!(stdout.contains("📈 変更後: 6.35% (+1.25%)"), "{stdout}");
    assert!(stdout.contains("📝 1,234,500株"), "{stdout}");
    assert!(stdout.contains("📅 2025年4月4日"), "{stdout}");
    assert!(stdout.contains("🔍 目的: 純投資"), "{stdout}");

    let second = stakewatch(&downloads, &db)
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 filings seen, 0 new, 1 already processed"));
    let stdout = String::from_utf8_lossy(&second.get_output().stdout).into_owned();
    assert_eq!(count(&stdout, "📊"), 0, "{stdout}");
}

#[test]
fn json_store_backend_remembers_processed_filings() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    let db = temp.path().join("processed_reports.json");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");

    for expected_new in ["1 new", "0 new"] {
        stakewatch(&downloads, &db)
            .args(["--store", "json", "process", "--dry-run"])
            .assert()
            .success()
            .stderr(predicate::str::contains(expected_new));
    }

    let raw = std::fs::read_to_string(&db).expect("read json store");
    let stored: serde_json::Value = serde_json::from_str(&raw).expect("parse json store");
    let records = stored.as_object().expect("object keyed by id");
    assert_eq!(records.len(), 1);
    let (id, record) = records.iter().next().expect("one record");
    assert_eq!(id, "12340_2025411_202544_変更報告書_株式会社光通信");
    assert_eq!(record["holder_name"], "株式会社光通信");
    assert_eq!(record["report_type"], "変更報告書");
}

#[test]
fn missing_company_renders_placeholder() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    FilingFixture {
        company: None,
        ..FilingFixture::default()
    }
    .write_bundle(&downloads, "S100AAAA");

    stakewatch(&downloads, &temp.path().join("reports.db"))
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("🏢 不明 (12340)"));
}

#[test]
fn bundles_differing_only_in_shares_notify_once() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");
    FilingFixture {
        shares: "9,999,999",
        ..FilingFixture::default()
    }
    .write_bundle(&downloads, "S100BBBB");

    let assert = stakewatch(&downloads, &temp.path().join("reports.db"))
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 filings seen, 1 new, 1 already processed"));
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert_eq!(count(&stdout, "📊"), 1, "{stdout}");
    assert!(stdout.contains("📝 1,234,500株"), "{stdout}");
}

#[test]
fn unreadable_bundles_are_skipped_without_aborting() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");

    let incomplete = downloads.join("S100CCCC").join("XBRL").join("PublicDoc");
    std::fs::create_dir_all(&incomplete).expect("create dir");
    std::fs::write(incomplete.join("0101010_honbun_x.htm"), "<html></html>").expect("write");

    let unclassifiable = downloads.join("S100DDDD").join("XBRL").join("PublicDoc");
    std::fs::create_dir_all(&unclassifiable).expect("create dir");
    std::fs::write(unclassifiable.join("0000000_header_x.htm"), "<html><body></body></html>")
        .expect("write");
    std::fs::write(unclassifiable.join("0101010_honbun_x.htm"), "<html></html>").expect("write");

    stakewatch(&downloads, &temp.path().join("reports.db"))
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 filings seen, 1 new, 0 already processed, 2 failed"));
}

#[test]
fn dir_option_limits_the_scan() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");
    FilingFixture {
        holder: "別の保有者",
        ..FilingFixture::default()
    }
    .write_bundle(&downloads, "S100BBBB");

    stakewatch(&downloads, &temp.path().join("reports.db"))
        .args(["process", "--dry-run", "--dir", "S100BBBB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("👤 別の保有者"))
        .stdout(predicate::str::contains("👤 株式会社光通信").not());
}

#[test]
fn process_without_push_credentials_fails_before_touching_the_store() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    let db = temp.path().join("reports.db");
    FilingFixture::default().write_bundle(&downloads, "S100AAAA");

    stakewatch(&downloads, &db)
        .args(["process"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LINE_CHANNEL_ACCESS_TOKEN"));
    assert!(!db.exists());
}

#[test]
fn pending_archives_are_unpacked_before_processing() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let downloads = temp.path().join("downloads");
    std::fs::create_dir_all(&downloads).expect("create downloads");
    let archive = downloads.join("S100AAAA.zip");
    std::fs::write(&archive, FilingFixture::default().zip_bytes()).expect("write zip");

    stakewatch(&downloads, &temp.path().join("reports.db"))
        .args(["process", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 filings seen, 1 new"))
        .stdout(predicate::str::contains("【変更報告書】"));
    assert!(!archive.exists());
    assert!(downloads.join("S100AAAA").join("XBRL").join("PublicDoc").is_dir());
}
