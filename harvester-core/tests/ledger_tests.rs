// Tests for the processed-id ledger

use harvester_core::ledger::Ledger;
use std::fs;
use tempfile::TempDir;

fn ledger_path(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("fetched.txt")
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn test_load_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);

    let ledger = Ledger::load(&path).unwrap();

    assert!(ledger.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_load_skips_blank_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);
    fs::write(&path, "a0N1\n\na0N2\r\n\n").unwrap();

    let ledger = Ledger::load(&path).unwrap();

    assert_eq!(ledger.len(), 2);
    assert!(ledger.contains("a0N1"));
    assert!(ledger.contains("a0N2"));
    assert!(!ledger.contains(""));
}

#[test]
fn test_load_duplicate_lines_collapse() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);
    fs::write(&path, "7\n7\n8\n").unwrap();

    let ledger = Ledger::load(&path).unwrap();
    assert_eq!(ledger.len(), 2);
}

#[test]
fn test_load_directory_is_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Ledger::load(temp_dir.path()).is_err());
}

// ============================================================================
// Append Tests
// ============================================================================

#[test]
fn test_append_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);
    let mut ledger = Ledger::load(&path).unwrap();

    ledger.append("42").unwrap();

    assert!(path.exists());
    assert!(ledger.contains("42"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "42\n");
}

#[test]
fn test_append_preserves_existing_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);
    fs::write(&path, "1\n2\n").unwrap();
    let mut ledger = Ledger::load(&path).unwrap();

    ledger.append("3").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "1\n2\n3\n");
}

#[test]
fn test_append_known_id_is_not_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);
    let mut ledger = Ledger::load(&path).unwrap();

    ledger.append("5").unwrap();
    ledger.append("5").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "5\n");
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_appended_ids_survive_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = ledger_path(&temp_dir);

    {
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.append("x1").unwrap();
        ledger.append("x2").unwrap();
    }

    let reloaded = Ledger::load(&path).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.contains("x1"));
    assert!(reloaded.contains("x2"));
    assert_eq!(reloaded.path(), path.as_path());
}

#[test]
fn test_append_failure_leaves_memory_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    // Pointing the ledger at a directory makes every append fail.
    let mut ledger = Ledger::load(&ledger_path(&temp_dir)).unwrap();
    fs::create_dir(ledger_path(&temp_dir)).unwrap();

    assert!(ledger.append("9").is_err());
    assert!(!ledger.contains("9"));
}
