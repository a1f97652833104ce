use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn json_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn samplesym() -> Command {
    Command::new(env!("CARGO_BIN_EXE_samplesym"))
}

#[test]
fn test_prints_one_block_per_sample() {
    let events = json_file(
        r#"[
            {"type":"comm","tid":30,"name":"binder:30_1"},
            {"type":"mmap","pid":5,"tid":5,"start":4096,"len":1280,"pgoff":0,"filename":"libfoo.so"},
            {"type":"sample","pid":5,"tid":6,"ip":4608,"callchain":[36864, 18446744069414584320]},
            {"type":"sample","pid":30,"tid":30,"ip":4608}
        ]"#,
    );
    let symbols = json_file(
        r#"{"libfoo.so": {"min_vaddr": 0, "symbols": [{"addr": 512, "len": 16, "name": "foo_func"}]}}"#,
    );

    let output = samplesym()
        .arg(events.path())
        .arg("--symbols")
        .arg(symbols.path())
        .arg("--quiet")
        .output()
        .expect("run samplesym");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "5 6\n    foo_func (libfoo.so)\n    0x9000 (no mapped segment)\n    [kernel] ([kernel])\n\
         30 30\n    [binder:30_1]\n"
    );
}

#[test]
fn test_skip_kernel_flag() {
    let events = json_file(
        r#"[{"type":"sample","pid":0,"tid":0,"ip":18446744069414584320}]"#,
    );

    let output = samplesym().arg(events.path()).arg("--skip-kernel").arg("-q").output().expect("run");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0 0\n");
}

#[test]
fn test_missing_events_file() {
    let output = samplesym().arg("/nonexistent/events.json").output().expect("run samplesym");
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to open events file"));
}

#[test]
fn test_malformed_events_file() {
    let events = json_file(r#"{"not": "an array"}"#);
    let output = samplesym().arg(events.path()).output().expect("run samplesym");
    assert_eq!(output.status.code(), Some(65));
}
