//! End-to-end runs of the `stamp` binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn stamp_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stamp"))
}

fn stamp(dir: &Path, args: &[&str]) -> Output {
    Command::new(stamp_binary())
        .args(args)
        .arg("--history-dir")
        .arg(dir.join("history"))
        .env("STAMP_CONFIG", dir.join("no-config.json"))
        .env_remove("STAMP_HASH_ALGORITHM")
        .env_remove("STAMP_BUILD_CACHE_ENABLED")
        .env_remove("STAMP_MAX_OUT_OF_DATE_MESSAGES")
        .current_dir(dir)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "stamp failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src/Foo.java"), "class Foo {}").unwrap();
    std::fs::write(
        temp.path().join("task.json"),
        r#"{
            "identity": ":compileJava",
            "implementation": { "type_name": "JavaCompile", "code_hash": "00ff" },
            "inputs": { "sources": { "root": "src", "strategy": "relative" } },
            "outputs": { "classes": "build/classes" }
        }"#,
    )
    .unwrap();
    temp
}

#[test]
fn test_record_then_status() {
    let temp = project();
    let dir = temp.path();

    let first = stdout(&stamp(dir, &["status", "task.json"]));
    assert!(first.contains("No history is available."));

    stdout(&stamp(dir, &["record", "task.json"]));
    assert_eq!(
        stdout(&stamp(dir, &["status", "task.json"])),
        ":compileJava is up to date\n"
    );

    std::fs::write(dir.join("src/Foo.java"), "class Foo { }").unwrap();
    let edited = stdout(&stamp(dir, &["status", "task.json"]));
    assert!(edited.contains("Input property 'sources' file Foo.java has been modified."));
}

#[test]
fn test_no_build_cache_flag() {
    let temp = project();
    let output = stdout(&stamp(temp.path(), &["key", "task.json", "--no-build-cache"]));
    assert!(output.contains("Caching: disabled"));
    assert!(output.contains("BUILD_CACHE_DISABLED: Build cache is disabled"));
}

#[test]
fn test_unknown_algorithm_fails() {
    let temp = project();
    let output = Command::new(stamp_binary())
        .args(["status", "task.json", "--history-dir"])
        .arg(temp.path().join("history"))
        .env("STAMP_CONFIG", temp.path().join("no-config.json"))
        .env("STAMP_HASH_ALGORITHM", "md5")
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
}
