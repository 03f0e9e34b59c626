use std::os::unix::fs::PermissionsExt;
use std::path::{ Path, PathBuf };
use std::time::Duration;

use tempfile::TempDir;
use tokio::test;

use crate::implementations::checks::pytest::PytestCheck;
use crate::models::common::Language;
use crate::models::verification::{ VerificationOutcome, VerificationStatus };
use crate::tests::support::setup;
use crate::traits::verification_engine::{ Check, CheckRequest };

const CODE: &str = "def add(a, b):\n    return a + b\n";
const TESTS: &str = "def test_add():\n    assert add(1, 2) == 3\n";

/// Stand-in interpreter: records its working directory, then runs `body`
struct FakePython {
    dir: TempDir,
}

impl FakePython {
    fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("cwd.txt");
        let script = format!("#!/bin/sh\npwd > '{}'\n{}\n", record.display(), body);
        let path = dir.path().join("python");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    fn check(&self) -> PytestCheck {
        PytestCheck::new(self.dir.path().join("python").display().to_string())
    }

    /// Directory the check ran the interpreter in
    fn recorded_cwd(&self) -> PathBuf {
        let recorded = std::fs::read_to_string(self.dir.path().join("cwd.txt")).unwrap();
        PathBuf::from(recorded.trim())
    }
}

async fn run(check: &PytestCheck, timeout: Duration) -> VerificationOutcome {
    let language = Language::Python;
    check.run_check(CheckRequest { code: CODE, tests: TESTS, language: &language, timeout }).await
}

fn assert_released(dir: &Path) {
    assert!(dir.file_name().unwrap().to_string_lossy().starts_with("cv-tests-"), "unexpected cwd {:?}", dir);
    assert!(!dir.exists(), "{:?} was left behind", dir);
}

#[test]
async fn passing_run_releases_its_directory() {
    setup();
    let python = FakePython::new("echo '1 passed in 0.01s'\nexit 0");

    let outcome = run(&python.check(), Duration::from_secs(10)).await;

    assert_eq!(outcome.status, VerificationStatus::Pass);
    assert_released(&python.recorded_cwd());
}

#[test]
async fn failing_run_releases_its_directory() {
    setup();
    let python = FakePython::new("echo 'FAILED test_solution.py::test_add - assert 4 == 3'\nexit 1");

    let outcome = run(&python.check(), Duration::from_secs(10)).await;

    assert_eq!(outcome.status, VerificationStatus::Fail);
    assert_eq!(outcome.errors, vec!["FAILED test_solution.py::test_add - assert 4 == 3".to_string()]);
    assert_released(&python.recorded_cwd());
}

#[test]
async fn timed_out_run_releases_its_directory() {
    setup();
    let python = FakePython::new("exec sleep 5");

    let outcome = run(&python.check(), Duration::from_millis(200)).await;

    assert_eq!(outcome.status, VerificationStatus::Error);
    assert_eq!(outcome.errors, vec!["Timeout".to_string()]);
    assert_released(&python.recorded_cwd());
}

#[test]
async fn dropped_run_releases_its_directory() {
    setup();
    let python = FakePython::new("exec sleep 5");
    let check = python.check();

    // The caller gives up before the check's own bound fires
    let abandoned = tokio::time::timeout(Duration::from_millis(300), run(&check, Duration::from_secs(10))).await;

    assert!(abandoned.is_err());
    assert_released(&python.recorded_cwd());
}
