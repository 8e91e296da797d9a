
use fixtures::*;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn contents_dump() -> Command {
    Command::new(assert_cmd::cargo_bin!("contents_dump"))
}

#[test]
fn test_dump_reproduces_entry_lines() {
    let output = contents_dump()
        .args(["dump", sample_contents().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let printed: Vec<&str> = stdout.lines().collect();
    assert_eq!(printed, sample_entry_lines());
}

#[test]
fn test_dump_filters_by_package() {
    contents_dump()
        .args(["dump", "-p", "SUNWgrub", sample_contents().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/boot/grub/bin/grub f none"))
        .stdout(predicate::str::contains("/boot d none"))
        .stdout(predicate::str::contains("/etc/passwd").not());
}

#[test]
fn test_dump_jsonl() {
    let output = contents_dump()
        .args(["dump", "-o", "jsonl", sample_contents().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["path"], "/bin");
    assert_eq!(first["type"], "sym_link");
    assert_eq!(first["target"], "./usr/bin");
}

#[test]
fn test_dump_long_renders_timestamps() {
    contents_dump()
        .args(["dump", "-o", "long", sample_contents().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2010-08-06T16:29:46Z"))
        .stdout(predicate::str::contains("/bin -> ./usr/bin"));
}

#[test]
fn test_dump_fails_on_invalid_lines_unless_skipped() {
    let d = tempdir().unwrap();
    let f = d.path().join("contents");
    fs::write(
        &f,
        "/bin=./usr/bin s none SUNWcsr\n/dev/bogus Z none\n/dev d none 0755 root sys SUNWcsr\n",
    )
    .unwrap();

    contents_dump()
        .args(["dump", f.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 2"));

    contents_dump()
        .args(["dump", "--skip-invalid", f.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/dev d none 0755 root sys SUNWcsr"));
}

#[test]
fn test_dump_reads_stdin() {
    contents_dump()
        .args(["dump", "-"])
        .write_stdin("/etc/passwd e passwd 0644 root sys 580 48299 1077177419 SUNWcsr\n")
        .assert()
        .success()
        .stdout("/etc/passwd e passwd 0644 root sys 580 48299 1077177419 SUNWcsr\n");
}

#[test]
fn test_missing_contents_file_fails() {
    contents_dump()
        .args(["dump", "/nonexistent/contents"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_sum() {
    let d = tempdir().unwrap();
    let f = d.path().join("at-signs");
    fs::write(&f, "@".repeat(1025)).unwrap();

    contents_dump()
        .args(["sum", f.to_str().unwrap()])
        .assert()
        .success()
        .stdout(format!("64 3 {}\n", f.display()));
}

#[test]
fn test_sum_reads_stdin() {
    contents_dump()
        .args(["sum"])
        .write_stdin("a")
        .assert()
        .success()
        .stdout("97 1\n");
}

#[cfg(unix)]
#[test]
fn test_stat_describes_files() {
    use std::os::unix::fs::PermissionsExt;

    let d = tempdir().unwrap();
    let f = d.path().join("motd");
    fs::write(&f, "aa").unwrap();
    fs::set_permissions(&f, fs::Permissions::from_mode(0o644)).unwrap();

    contents_dump()
        .args([
            "stat",
            "--display-path",
            "/etc/motd",
            "-p",
            "SUNWcsr",
            f.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/etc/motd f none 0644 "))
        .stdout(predicate::str::contains(" 2 194 "))
        .stdout(predicate::str::ends_with(" SUNWcsr\n"));
}

#[test]
fn test_stat_rejects_display_path_with_many_paths() {
    contents_dump()
        .args(["stat", "--display-path", "/etc/motd", "/etc", "/tmp"])
        .assert()
        .failure()
        .code(1);
}
