//! End-to-end tests of the `cavemon` binary.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A scratch home directory with its own database.
struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.home.path().join("records.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cavemon").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("CAVEMON_DB")
            .env_remove("CAVEMON_TEST_DB")
            .env_remove("CAVEMON_ACTOR")
            .env_remove("CAVEMON_PROBE_URL")
            .env_remove("CAVEMON_EXPORT_DIR")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn init(&self) {
        self.cmd().arg("init").assert().success();
    }

    fn add(&self, cave: &str, person: &str, date: &str) -> i64 {
        let output = self
            .cmd()
            .args(["--silent", "add", "--cave", cave, "--person", person, "--date", date])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8(output.stdout).unwrap()
    }
}

fn zip_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_add_then_list() {
    let env = Env::new();
    env.init();

    let first = env.add("El Indio", "Ana María", "2024-05-02");
    let second = env.add("La Fábrica", "Nicolas Peña", "2024-05-03");
    assert_eq!((first, second), (1, 2));

    let json = env.stdout(&["list", "--json"]);
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    let records = records.as_array().unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], 2);
    assert_eq!(records[1]["caveName"], "El Indio");
    assert_eq!(records[1]["synced"], false);
    assert_eq!(records[1]["imageName"], serde_json::Value::Null);
    assert!(records[1]["customId"]
        .as_str()
        .unwrap()
        .starts_with("El_Indio-2024-05-02-Ana_María-"));
}

#[test]
fn test_list_csv_has_bom_and_fixed_header() {
    let env = Env::new();
    env.init();
    env.add("El Indio", "Ana", "2024-05-02");

    let csv = env.stdout(&["list", "--format", "csv"]);
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.trim_start_matches('\u{feff}').starts_with("id,customId,caveName,"));
    assert_eq!(csv.trim_end().lines().count(), 2);
}

#[test]
fn test_export_single_record_archive() {
    let env = Env::new();
    env.init();
    let id = env.add("El Indio", "Ana", "2024-05-02");
    let out = env.home.path().join("out");

    let path = env.stdout(&[
        "--silent",
        "export",
        "record",
        &id.to_string(),
        "--out",
        out.to_str().unwrap(),
    ]);
    let path = PathBuf::from(path.trim());

    assert_eq!(path.file_name().unwrap(), "El_Indio-Ana-2024-05-02.zip");
    assert_eq!(
        zip_names(&path),
        vec![
            "El_Indio-Ana-2024-05-02.csv",
            "El_Indio-Ana-2024-05-02.json",
            "El_Indio-Ana-2024-05-02.txt",
            "El_Indio-Ana-2024-05-02_QR.png",
        ]
    );
}

#[test]
fn test_export_all_archive() {
    let env = Env::new();
    env.init();
    env.add("El Indio", "Ana", "2024-05-02");
    env.add("La Fábrica", "Nicolas", "2024-05-03");
    let out = env.home.path().join("out");

    let path = env.stdout(&["--silent", "export", "all", "--out", out.to_str().unwrap()]);
    let path = PathBuf::from(path.trim());
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let utc_day = chrono::Utc::now().date_naive().format("%Y-%m-%d");
    assert_eq!(name, format!("export-monitoreo-cavernas-{utc_day}.zip"));

    let names = zip_names(&path);
    assert!(names.contains(&"monitoreo-cavernas.json".to_string()));
    assert!(names.contains(&"monitoreo-cavernas.csv".to_string()));
    assert_eq!(names.iter().filter(|n| n.starts_with("qrcodes/")).count(), 2);

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    let mut json = String::new();
    archive
        .by_name("monitoreo-cavernas.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(records[0]["caveName"], "El Indio");
}

#[test]
fn test_sync_marks_records_synced() {
    let env = Env::new();
    env.init();
    fs::write(
        env.home.path().join(".cavemon/config.json"),
        r#"{"sync_latency_ms": 0}"#,
    )
    .unwrap();
    env.add("El Indio", "Ana", "2024-05-02");
    env.add("El Indio", "Ana", "2024-05-09");

    env.cmd().args(["sync", "--json"]).assert().success();

    let status: serde_json::Value =
        serde_json::from_str(&env.stdout(&["status", "--json"])).unwrap();
    assert_eq!(status["total_records"], 2);
    assert_eq!(status["unsynced_records"], 0);

    // An edit puts the record back in the queue.
    env.cmd()
        .args(["update", "1", "--drip-count", "14"])
        .assert()
        .success();
    let status: serde_json::Value =
        serde_json::from_str(&env.stdout(&["status", "--json"])).unwrap();
    assert_eq!(status["unsynced_records"], 1);
}

#[test]
fn test_offline_sync_fails_without_touching_records() {
    let env = Env::new();
    env.init();
    env.add("El Indio", "Ana", "2024-05-02");

    env.cmd().args(["sync", "--offline"]).assert().code(6);

    let status: serde_json::Value =
        serde_json::from_str(&env.stdout(&["status", "--json"])).unwrap();
    assert_eq!(status["unsynced_records"], 1);
}

#[test]
fn test_error_exit_codes() {
    let env = Env::new();

    // No database yet.
    env.cmd().args(["list"]).assert().code(2);

    env.init();
    env.cmd().args(["delete", "42"]).assert().code(3);
    env.cmd().args(["add", "--person", "Ana"]).assert().code(4);
    env.cmd()
        .args(["add", "--cave", "El Indio", "--person", "Otro"])
        .assert()
        .code(4);
    env.cmd().args(["export", "all"]).assert().code(5);
}

#[test]
fn test_json_errors_are_structured() {
    let env = Env::new();
    env.init();

    let output = env.cmd().args(["--json", "show", "7"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));

    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["code"], "RECORD_NOT_FOUND");
}

#[test]
fn test_delete_removes_record() {
    let env = Env::new();
    env.init();
    let id = env.add("El Indio", "Ana", "2024-05-02");

    env.cmd().args(["delete", &id.to_string()]).assert().success();
    env.cmd().args(["show", &id.to_string()]).assert().code(3);
}
