use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("keepsafe"))
}

fn sample_tree(root: &Path) -> std::path::PathBuf {
    let source = root.join("src");
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::write(source.join("a.txt"), "hello").unwrap();
    fs::write(source.join("sub").join("b.txt"), "world").unwrap();
    source
}

#[test]
fn backup_then_restore_roundtrip() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());
    let backup_dir = dir.path().join("backup");
    let restored = dir.path().join("restored");

    // backup
    bin()
        .env("KEEPSAFE_PASSWORD", "correctpw123")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 processed"));

    assert!(backup_dir.join("a.txt.enc").is_file());
    assert!(backup_dir.join("sub").join("b.txt.enc").is_file());

    // restore
    bin()
        .env("KEEPSAFE_PASSWORD", "correctpw123")
        .arg("restore")
        .arg(&backup_dir)
        .arg(&restored)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 restored"));

    assert_eq!(fs::read_to_string(restored.join("a.txt")).unwrap(), "hello");
    assert_eq!(
        fs::read_to_string(restored.join("sub").join("b.txt")).unwrap(),
        "world"
    );
}

#[test]
fn second_backup_of_unchanged_tree_processes_nothing() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());
    let backup_dir = dir.path().join("backup");

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success();

    // state persists across invocations, so nothing is re-encrypted
    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing new to back up"));
}

#[test]
fn wrong_password_restores_nothing() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());
    let backup_dir = dir.path().join("backup");
    let restored = dir.path().join("restored");

    bin()
        .env("KEEPSAFE_PASSWORD", "correctpw123")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success();

    bin()
        .env("KEEPSAFE_PASSWORD", "wrongpw456")
        .arg("restore")
        .arg(&backup_dir)
        .arg(&restored)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 restored"))
        .stdout(predicate::str::contains("2 failed"));

    assert!(!restored.join("a.txt").exists());
}

#[test]
fn missing_source_fails_validation() {
    let dir = tempdir().unwrap();

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(dir.path().join("nowhere"))
        .arg(dir.path().join("backup"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn file_source_declared_as_directory_fails_validation() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("f.txt");
    fs::write(&file, "data").unwrap();

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&file)
        .arg(dir.path().join("backup"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn single_file_backup_with_flag() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("report.txt");
    fs::write(&file, "quarterly numbers").unwrap();
    let backup_dir = dir.path().join("backup");

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&file)
        .arg(&backup_dir)
        .arg("--file")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed"));

    assert!(backup_dir.join("report").join("report.txt.enc").is_file());
}

#[test]
fn restore_of_missing_backup_dir_fails() {
    let dir = tempdir().unwrap();

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("restore")
        .arg(dir.path().join("nowhere"))
        .arg(dir.path().join("restored"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("path not found"));
}

#[test]
fn check_reports_changes_and_quiesces_after_backup() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());
    let backup_dir = dir.path().join("backup");

    bin()
        .arg("check")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 file(s) changed"));

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success();

    bin()
        .arg("check")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("no changes detected"));

    fs::write(source.join("a.txt"), "hello again").unwrap();

    bin()
        .arg("check")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) changed"));
}

#[test]
fn reset_forces_full_backup() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());
    let backup_dir = dir.path().join("backup");

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success();

    bin()
        .arg("reset")
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("change tracking reset"));

    bin()
        .env("KEEPSAFE_PASSWORD", "pw")
        .arg("backup")
        .arg(&source)
        .arg(&backup_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 processed"));
}

#[test]
fn fixed_key_encrypt_decrypt_roundtrip() {
    let dir = tempdir().unwrap();
    let key_file = dir.path().join("test.key");
    let file = dir.path().join("secret.txt");
    fs::write(&file, "hidden content").unwrap();
    let hidden = dir.path().join("hidden");

    bin()
        .arg("--key-file")
        .arg(&key_file)
        .arg("encrypt")
        .arg(&file)
        .arg(&hidden)
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted to"));

    let encrypted = hidden.join("secret.txt.enc");
    assert!(encrypted.is_file());
    assert_eq!(fs::read(&key_file).unwrap().len(), 32);

    let output = dir.path().join("recovered.txt");
    bin()
        .arg("--key-file")
        .arg(&key_file)
        .arg("decrypt")
        .arg(&encrypted)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("decrypted to"));

    assert_eq!(fs::read_to_string(&output).unwrap(), "hidden content");
}

#[test]
fn malformed_key_file_is_fatal() {
    let dir = tempdir().unwrap();
    let key_file = dir.path().join("bad.key");
    fs::write(&key_file, "too short").unwrap();
    let file = dir.path().join("secret.txt");
    fs::write(&file, "data").unwrap();

    bin()
        .arg("--key-file")
        .arg(&key_file)
        .arg("encrypt")
        .arg(&file)
        .arg(dir.path().join("hidden"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("key file error"));
}

#[test]
fn no_password_fails() {
    let dir = tempdir().unwrap();
    let source = sample_tree(dir.path());

    bin()
        .env_remove("KEEPSAFE_PASSWORD")
        .arg("backup")
        .arg(&source)
        .arg(dir.path().join("backup"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password provided"));
}
