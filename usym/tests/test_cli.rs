mod common;

use std::io::Write;
use std::process::{Command, Output, Stdio};

use common::{func, FakeElf, FakeProc};

const MAPS: &str = "\
0000000000002000-0000000000003000 r-xp 00000000 fd:01 42 /usr/lib/libfake.so
00007ffd4a5c1000-00007ffd4a5e2000 rw-p 00000000 00:00 0          [stack]
";

fn fake_process() -> FakeProc {
    let fake = FakeProc::new();
    let exe = FakeElf::new(0x1000, 0x100).symtab(&[func("main", 0x1000, 0x20)]).build();
    let lib = FakeElf::new(0x0, 0x200).symtab(&[func("lib_entry", 0x100, 0x40)]).build();
    fake.add_process(31, "/bin/app", &exe, MAPS);
    fake.add_file(31, "/usr/lib/libfake.so", &lib);
    fake
}

/// `usym` against the fake tree, with warnings
fn usym_verbose(fake: &FakeProc) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_usym"));
    cmd.arg("--proc-root")
        .arg(fake.proc_root.path())
        .arg("--host-tmp")
        .arg(fake.host_tmp.path());
    cmd
}

fn usym(fake: &FakeProc) -> Command {
    let mut cmd = usym_verbose(fake);
    cmd.arg("-q");
    cmd
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect()
}

#[test]
fn test_resolves_addresses_from_arguments() {
    let fake = fake_process();
    let output =
        usym(&fake).args(["--pid", "31", "0x1010", "2120", "0x2000", "0x9000"]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_lines(&output),
        vec![
            "0x0000000000001010 main",
            "0x0000000000002120 lib_entry",
            "0x0000000000002000 <unknown>",
            "0x0000000000009000 ??",
        ]
    );
}

#[test]
fn test_resolves_addresses_from_stdin() {
    let fake = fake_process();
    let mut child = usym_verbose(&fake)
        .args(["--pid", "31"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"0x1000\n\nnot-an-address\n0x2110\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["0x0000000000001000 main", "0x0000000000002110 lib_entry"]
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipping unparsable address: not-an-address"), "stderr: {stderr}");
}

#[test]
fn test_json_output() {
    let fake = fake_process();
    let output = usym(&fake).args(["--pid", "31", "--json", "0x1010", "0x9000"]).output().unwrap();
    assert!(output.status.success());

    let reports: Vec<serde_json::Value> = stdout_lines(&output)
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["pid"], 31);
    assert_eq!(reports[0]["address"], "0x1010");
    assert_eq!(reports[0]["status"], "symbol");
    assert_eq!(reports[0]["name"], "main");
    assert_eq!(reports[1]["status"], "unresolved");
    assert!(reports[1]["name"].is_null());
}

#[test]
fn test_missing_process_fails() {
    let fake = FakeProc::new();
    let output = usym(&fake).args(["--pid", "4242", "0x1000"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_missing_maps_is_plain_failure() {
    let fake = FakeProc::new();
    std::fs::create_dir_all(fake.proc_dir(55)).unwrap();
    let output = usym(&fake).args(["--pid", "55", "0x1000"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot read"));
}

#[test]
fn test_missing_target_is_usage_error() {
    let fake = FakeProc::new();
    let output = usym(&fake).arg("0x1000").output().unwrap();

    assert_eq!(output.status.code(), Some(2));
}
