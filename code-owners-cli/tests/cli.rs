use std::{fs, path::Path};

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const CODEOWNERS: &str = "lib/* @alice\nlib/special.rb @bob\n!vendor/ @nobody\n";

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in [
        ("CODEOWNERS", CODEOWNERS),
        ("lib/a.rb", ""),
        ("lib/special.rb", ""),
        ("other.rb", ""),
    ] {
        write(dir.path(), path, contents);
    }
    dir
}

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("code-owners");
    cmd.current_dir(dir.path())
        .env_remove("CODE_OWNERS_LOG")
        .arg("--repo")
        .arg(dir.path())
        .arg("--native");
    cmd
}

#[test]
fn prints_owners_table() {
    let dir = fixture();
    cmd(&dir)
        .assert()
        .success()
        .stdout(contains(format!("{:<70}  @alice", "lib/a.rb")))
        .stdout(contains(format!("{:<70}  @bob", "lib/special.rb")))
        .stdout(contains(format!("{:<70}  UNOWNED", "other.rb")))
        .stderr(contains(
            "Parse error line 3: \"!vendor/ @nobody\" (negation patterns are not supported)",
        ));
}

#[test]
fn verbose_shows_deciding_rule() {
    let dir = fixture();
    cmd(&dir)
        .arg("--verbose")
        .assert()
        .success()
        .stdout(contains("@bob  (2:lib/special.rb)"))
        .stdout(contains("@alice  (1:lib/*)"));
}

#[test]
fn json_output() {
    let dir = fixture();
    let output = cmd(&dir).arg("--json").output().unwrap();
    assert!(output.status.success());

    let records = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(records.len(), 4);
    assert!(records.contains(&serde_json::json!({
        "file": "lib/special.rb", "owner": "@bob", "line": 2, "pattern": "lib/special.rb"
    })));
    assert!(records.contains(&serde_json::json!({
        "file": "other.rb", "owner": "UNOWNED", "line": null, "pattern": null
    })));
}

#[test]
fn unowned_only() {
    let dir = fixture();
    cmd(&dir)
        .arg("--unowned")
        .assert()
        .success()
        .stdout(contains("other.rb"))
        .stdout(contains("CODEOWNERS"))
        .stdout(contains("lib/").not());
}

#[test]
fn scoped_to_paths() {
    let dir = fixture();
    cmd(&dir)
        .arg("lib")
        .assert()
        .success()
        .stdout(contains("lib/a.rb"))
        .stdout(contains("other.rb").not());
}

#[test]
fn ignore_files_skip_paths() {
    let dir = fixture();
    write(dir.path(), "skip.txt", "other.rb\nCODEOWNERS\nskip.txt\n");
    cmd(&dir)
        .arg("--ignore-file")
        .arg(dir.path().join("skip.txt"))
        .assert()
        .success()
        .stdout(contains("lib/a.rb"))
        .stdout(contains("other.rb").not());
}

#[test]
fn check_reports_parse_errors() {
    let dir = fixture();
    cmd(&dir)
        .arg("--check")
        .assert()
        .failure()
        .stdout(contains("2 rules, 1 errors"))
        .stderr(contains("Parse error line 3"));

    write(dir.path(), "CODEOWNERS", "* @everyone\n");
    cmd(&dir).arg("--check").assert().success();
}

#[test]
fn explicit_codeowners_file() {
    let dir = fixture();
    write(dir.path(), "alt/OWNERS", "*.rb @ruby\n");
    cmd(&dir)
        .arg("-f")
        .arg(dir.path().join("alt/OWNERS"))
        .assert()
        .success()
        .stdout(contains(format!("{:<70}  @ruby", "other.rb")));
}

#[test]
fn missing_codeowners_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.rb", "");
    cmd(&dir)
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("CODEOWNERS file does not exist"));
}

fn git(dir: &Path, args: &[&str]) -> bool {
    std::process::Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_or(false, |output| output.status.success())
}

#[test]
fn repo_flag_accepts_a_subdirectory() {
    let dir = fixture();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git is not available; skipping");
        return;
    }
    assert!(git(dir.path(), &["add", "-A"]));

    for native in [false, true] {
        let mut cmd = cargo_bin_cmd!("code-owners");
        cmd.current_dir(dir.path())
            .env_remove("CODE_OWNERS_LOG")
            .arg("--repo")
            .arg(dir.path().join("lib"));
        if native {
            cmd.arg("--native");
        }
        cmd.assert()
            .success()
            .stdout(contains(format!("{:<70}  @alice", "lib/a.rb")))
            .stdout(contains(format!("{:<70}  @bob", "lib/special.rb")))
            .stdout(contains(format!("{:<70}  UNOWNED", "other.rb")));
    }
}
