//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizvault").unwrap();
    cmd.env_remove("QUIZVAULT_SECRET")
        .env_remove("QUIZVAULT_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

const BANK: &str = r#"[
  {
    "id": 1,
    "name": "Science Quiz",
    "description": "Two quick questions",
    "time": 600,
    "degree": 10,
    "questions": [
      {"question": "Water boils at?", "pic": null,
       "answers": [{"string": "100 C", "valid": true}, {"string": "50 C", "valid": false}]},
      {"question": "Closest star?", "pic": null,
       "answers": [{"string": "Sirius", "valid": false}, {"string": "The Sun", "valid": true}]}
    ]
  }
]"#;

const LEGACY_BANK: &str = r#"[
  {
    "name": "Old Math",
    "description": "",
    "time": 120,
    "degree": 4,
    "questions": [
      {"question": "Even numbers?", "pic": null, "answers": ["1", "2", "3", "4"], "valid": [1, 3]}
    ]
  }
]"#;

const INVALID_BANK: &str = r#"[
  {
    "name": "Broken",
    "time": 60,
    "degree": 5,
    "questions": [
      {"question": "Pick one", "answers": [{"string": "a", "valid": true}, {"string": "b", "valid": true}]}
    ]
  }
]"#;

/// A workspace with a plain-JSON config, so most tests skip key stretching.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "data_dir = '{}'\nbank_file = 'tests.json'\ndegrees_file = 'degrees.json'\n",
            dir.path().join("state").display()
        );
        std::fs::write(dir.path().join("quizvault.toml"), config).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = quizvault();
        cmd.current_dir(self.dir.path())
            .arg("--config")
            .arg(self.path("quizvault.toml"));
        cmd
    }

    fn import_bank(&self) {
        let bank = self.write("bank.json", BANK);
        self.cmd()
            .arg("import")
            .arg("--from")
            .arg(bank)
            .assert()
            .success();
    }

    fn take(&self, name: &str, input: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["take", "--test", "Science Quiz", "--name", name])
            .args(["--grade", "First", "--school", "Nile", "--phone", "0100"])
            .arg("--no-shuffle")
            .write_stdin(input)
            .assert()
    }

    fn results_json(&self) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["results", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn help_output() {
    quizvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed multiple-choice exams"));
}

#[test]
fn version_output() {
    quizvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizvault"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizvault()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizvault.toml"));

    assert!(dir.path().join("quizvault.toml").exists());
    assert!(dir.path().join("res/state/tests.enc").exists());
    assert!(dir.path().join("res/state/degrees.enc").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizvault()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizvault()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_reports_invalid_questions() {
    let ws = Workspace::new();
    let bank = ws.write("broken.json", INVALID_BANK);
    ws.cmd()
        .arg("validate")
        .arg("--bank")
        .arg(bank)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[Broken] question 1"))
        .stdout(predicate::str::contains("cannot be all correct"))
        .stderr(predicate::str::contains("1 issue(s) found"));
}

#[test]
fn validate_accepts_legacy_bank() {
    let ws = Workspace::new();
    let bank = ws.write("legacy.json", LEGACY_BANK);
    ws.cmd()
        .arg("validate")
        .arg("--bank")
        .arg(bank)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 tests, 1 questions"))
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn validate_nonexistent_file() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["validate", "--bank", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn import_rejects_invalid_bank() {
    let ws = Workspace::new();
    let bank = ws.write("broken.json", INVALID_BANK);
    ws.cmd()
        .arg("import")
        .arg("--from")
        .arg(bank)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
    assert!(!ws.path("state/tests.json").exists());
}

#[test]
fn import_list_and_export() {
    let ws = Workspace::new();
    ws.import_bank();

    // Importing the same bank again discards it.
    ws.cmd()
        .arg("import")
        .arg("--from")
        .arg(ws.path("bank.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, discarded"));

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Science Quiz"))
        .stdout(predicate::str::contains("10:00"));

    let out = ws.path("out.json");
    ws.cmd()
        .arg("export")
        .arg("--to")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 test(s)"));
    let exported: serde_json::Value = serde_json::from_str(&read(&out)).unwrap();
    assert_eq!(exported[0]["name"], "Science Quiz");
    assert_eq!(exported[0]["questions"][1]["answers"][1]["valid"], true);
}

#[test]
fn import_conflict_policies() {
    let ws = Workspace::new();
    ws.import_bank();
    let changed = ws.write("changed.json", &BANK.replace("\"time\": 600", "\"time\": 300"));

    ws.cmd()
        .arg("import")
        .arg("--from")
        .arg(&changed)
        .assert()
        .success()
        .stdout(predicate::str::contains("different details: skipped"));

    ws.cmd()
        .arg("import")
        .arg("--from")
        .arg(&changed)
        .args(["--on-conflict", "override"])
        .assert()
        .success()
        .stdout(predicate::str::contains("different details: overridden"));

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("5:00"));
}

#[test]
fn take_scores_and_saves_result() {
    let ws = Workspace::new();
    ws.import_bank();

    ws.take("sara hassan", "1\nn\n2\ns\n")
        .success()
        .stdout(predicate::str::contains("Question 1/2"))
        .stdout(predicate::str::contains("Name:   Sara Hassan"))
        .stdout(predicate::str::contains("Phone:  +20100"))
        .stdout(predicate::str::contains("Degree: 10 / 10"));

    let json = ws.results_json();
    let result = &json["results"][0];
    assert_eq!(result["name"], "Sara Hassan");
    assert_eq!(result["degree"].as_f64(), Some(10.0));
    assert_eq!(result["index"], 0);
    assert_eq!(result["failed_at"], serde_json::json!([]));
    assert_eq!(json["summaries"][0]["attempts"], 1);

    // Same name and grade needs --retake.
    ws.take("Sara Hassan", "s\n")
        .failure()
        .stderr(predicate::str::contains("already took"));
}

#[test]
fn submit_with_unanswered_questions_needs_confirmation() {
    let ws = Workspace::new();
    ws.import_bank();

    ws.take("Omar Ali", "2\ns\ns\n")
        .success()
        .stdout(predicate::str::contains("You did not answer question(s) 2"))
        .stdout(predicate::str::contains("Degree: 0 / 10"))
        .stdout(predicate::str::contains("Failed 50.0% | Left 50.0%"));

    let json = ws.results_json();
    assert_eq!(json["results"][0]["failed_at"], serde_json::json!([0]));
    assert_eq!(json["results"][0]["left"], serde_json::json!([1]));
}

#[test]
fn quitting_saves_nothing() {
    let ws = Workspace::new();
    ws.import_bank();

    ws.take("Omar Ali", "1\nq\n")
        .success()
        .stdout(predicate::str::contains("nothing was saved"));
    ws.take("Omar Ali", "1\n")
        .failure()
        .stderr(predicate::str::contains("input closed"));

    ws.cmd()
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results yet."));
}

#[test]
fn take_rejects_unknown_test_and_short_name() {
    let ws = Workspace::new();
    ws.import_bank();

    ws.cmd()
        .args(["take", "--test", "Missing", "--name", "Omar Ali", "--grade", "First"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no test named 'Missing'"));

    ws.take("Omar", "")
        .failure()
        .stderr(predicate::str::contains("full name"));
}

#[test]
fn results_table_and_delete() {
    let ws = Workspace::new();
    ws.import_bank();
    ws.take("Sara Hassan", "1\nn\n1\ns\n").success();
    ws.take("Omar Ali", "1\nn\n2\ns\n").success();

    ws.cmd()
        .args(["results", "--test", "Science Quiz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sara Hassan"))
        .stdout(predicate::str::contains("Omar Ali"))
        .stdout(predicate::str::contains("2 attempt(s)"))
        .stdout(predicate::str::contains("most failed: question 2"));

    ws.cmd()
        .args(["delete-result", "--index", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted result 0: Sara Hassan"));

    let json = ws.results_json();
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["results"][0]["name"], "Omar Ali");

    ws.cmd()
        .args(["delete-result", "--index", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no result at index 5"));
}

#[test]
fn results_for_test_without_questions() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.path("state")).unwrap();
    ws.write(
        "state/tests.json",
        r#"[{"id": 1, "name": "Emptied", "description": "", "time": 60, "degree": 5, "questions": []}]"#,
    );
    ws.write(
        "state/degrees.json",
        r#"[{"name": "Ali Omar", "phone": "", "school": "", "grade": "First", "degree": 0,
             "out_of": 5, "failed_at": [], "left": [], "test": "Emptied"}]"#,
    );

    ws.cmd()
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ali Omar"))
        .stdout(predicate::str::contains("0 / 5"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn encrypted_end_to_end() {
    let dir = TempDir::new().unwrap();
    let run = || {
        let mut cmd = quizvault();
        cmd.current_dir(dir.path()).env("QUIZVAULT_SECRET", "classroom secret");
        cmd
    };

    run().arg("init").assert().success();
    std::fs::write(dir.path().join("bank.json"), BANK).unwrap();
    run()
        .args(["import", "--from", "bank.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added with id 1"));

    let stored = std::fs::read(dir.path().join("res/state/tests.enc")).unwrap();
    assert!(!String::from_utf8_lossy(&stored).contains("Science Quiz"));

    run()
        .args(["take", "--test", "Science Quiz", "--name", "Mona Adel", "--grade", "Second"])
        .arg("--no-shuffle")
        .write_stdin("1\nn\n2\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Degree: 10 / 10"));

    run()
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mona Adel"));

    // Without the secret the built-in key cannot open the files.
    quizvault()
        .current_dir(dir.path())
        .arg("results")
        .assert()
        .failure()
        .stderr(predicate::str::contains("authentication failed"));
}
