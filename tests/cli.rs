//! Integration tests for the labelpipe CLI.
//!
//! Only offline surfaces are exercised here — the queue subcommands and
//! argument handling. Pipeline behavior against a scripted gateway is
//! covered by the unit tests in the library.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a labelpipe Command rooted in a temp project dir.
fn labelpipe(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("labelpipe");
    cmd.current_dir(dir.path());
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Drop a well-formed review item into the default queue directory.
fn seed_queue_item(dir: &TempDir, data_id: &str, reason: &str) {
    let queue_dir = dir.path().join("data/review_queue");
    fs::create_dir_all(&queue_dir).unwrap();
    let item = format!(
        r#"{{
  "data_id": "{data_id}",
  "original_input": {{"text_content": "hello", "modality": "TEXT"}},
  "labeler_attempts": [],
  "critic_reviews": [],
  "error_log": ["labeler: all attempts failed, escalating"],
  "fallback_reason": "{reason}",
  "timestamp": "2026-08-27T00:00:00Z"
}}"#
    );
    fs::write(
        queue_dir.join(format!("{data_id}_20260827_000000_000000000.json")),
        item,
    )
    .unwrap();
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = create_temp_project();
        labelpipe(&dir).arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        let dir = create_temp_project();
        labelpipe(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_label_requires_api_key() {
        let dir = create_temp_project();
        labelpipe(&dir)
            .env("OPENAI_API_KEY", "")
            .args(["label", "--text", "hello"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_batch_missing_input_file_fails() {
        let dir = create_temp_project();
        labelpipe(&dir)
            .env("OPENAI_API_KEY", "sk-test")
            .args(["batch", "missing.jsonl"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing.jsonl"));
    }

    #[test]
    fn test_invalid_modality_is_rejected() {
        let dir = create_temp_project();
        labelpipe(&dir)
            .env("OPENAI_API_KEY", "sk-test")
            .args(["label", "--text", "hi", "--modality", "VOICE"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid modality"));
    }
}

mod queue_commands {
    use super::*;

    #[test]
    fn test_summary_of_empty_queue() {
        let dir = create_temp_project();
        labelpipe(&dir)
            .args(["queue", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total: 0"));
    }

    #[test]
    fn test_list_shows_seeded_items() {
        let dir = create_temp_project();
        seed_queue_item(&dir, "item-1", "RETRY_LIMIT");
        seed_queue_item(&dir, "item-2", "LOW_CONFIDENCE");

        labelpipe(&dir)
            .args(["queue", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("item-1"))
            .stdout(predicate::str::contains("RETRY_LIMIT"))
            .stdout(predicate::str::contains("2 item(s)"));
    }

    #[test]
    fn test_summary_counts_by_reason() {
        let dir = create_temp_project();
        seed_queue_item(&dir, "a", "PARSING_ERROR");
        seed_queue_item(&dir, "b", "PARSING_ERROR");

        labelpipe(&dir)
            .args(["queue", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total: 2"))
            .stdout(predicate::str::contains("PARSING_ERROR"));
    }

    #[test]
    fn test_delete_removes_matching_items() {
        let dir = create_temp_project();
        seed_queue_item(&dir, "gone", "RETRY_LIMIT");
        seed_queue_item(&dir, "kept", "RETRY_LIMIT");

        labelpipe(&dir)
            .args(["queue", "delete", "gone"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1"));

        labelpipe(&dir)
            .args(["queue", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kept"))
            .stdout(predicate::str::contains("gone").not());
    }

    #[test]
    fn test_clear_requires_force() {
        let dir = create_temp_project();
        seed_queue_item(&dir, "item", "VALIDATION_ERROR");

        labelpipe(&dir)
            .args(["queue", "clear"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        labelpipe(&dir)
            .args(["queue", "clear", "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 1"));
    }

    #[test]
    fn test_export_writes_csv() {
        let dir = create_temp_project();
        seed_queue_item(&dir, "row-1", "LOW_CONFIDENCE");
        let out = dir.path().join("queue.csv");

        labelpipe(&dir)
            .args(["queue", "export", "--output"])
            .arg(&out)
            .assert()
            .success();

        let csv = fs::read_to_string(&out).unwrap();
        assert!(csv.starts_with("data_id,fallback_reason,timestamp,"));
        assert!(csv.contains("row-1,LOW_CONFIDENCE"));
    }

    #[test]
    fn test_queue_dir_override_via_env() {
        let dir = create_temp_project();
        let alt = dir.path().join("elsewhere");
        fs::create_dir_all(&alt).unwrap();

        labelpipe(&dir)
            .env("LABELPIPE_REVIEW_QUEUE_DIR", &alt)
            .args(["queue", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total: 0"));
    }
}
