use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_logic2vcd").to_string()
}

const DATE: &str = "2022-05-01 10:20:30";

#[test]
fn cli_convert_file_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.bin");
    let output = dir.path().join("capture.vcd");
    std::fs::write(&input, [0b00u8, 0b01, 0b01, 0b11]).unwrap();

    let st = Command::new(bin())
        .args(["convert", "-C", "A,B", "--samplerate", "1k", "--date", DATE])
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());

    let vcd = std::fs::read_to_string(&output).unwrap();
    assert!(vcd.starts_with("$date Sun May  1 10:20:30 2022 $end\n"));
    assert!(vcd.contains("$timescale 1 ms $end\n"));
    assert!(vcd.ends_with("$enddefinitions $end\n#1\n$dumpvars\n0!\n0\"\n$end\n#2\n1!\n#4\n1\"\n"));
}

#[test]
fn cli_refuses_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let output = dir.path().join("out.vcd");
    std::fs::write(&input, [1u8]).unwrap();
    std::fs::write(&output, b"keep me").unwrap();

    let st = Command::new(bin())
        .args(["convert", "-C", "A"])
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(!st.success());
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");

    let st = Command::new(bin())
        .args(["--force", "convert", "-C", "A"])
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert!(std::fs::read_to_string(&output).unwrap().contains("$dumpvars"));
}

#[test]
fn cli_stdin_to_stdout() {
    let mut child = Command::new(bin())
        .args(["convert", "-C", "d<1>,d<0>", "--date", DATE])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(&[0b01, 0b10]).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());

    let vcd = String::from_utf8(out.stdout).unwrap();
    assert!(vcd.contains("$var wire 2 ! d $end\n"));
    assert!(vcd.ends_with("#1\n$dumpvars\nb10 !\n$end\n#2\nb01 !\n"));
}

#[test]
fn cli_too_many_probes_fails() {
    let names: Vec<String> = (0..95).map(|i| format!("p{i}")).collect();
    let out = Command::new(bin())
        .args(["probes", "-C", &names.join(",")])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("94"));
}

#[test]
fn cli_oversized_bit_index_fails() {
    let out = Command::new(bin())
        .args(["probes", "-C", "clk,n<4294967295>"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("bit index 4294967295"));
}

#[test]
fn cli_probes_lists_symbols() {
    let out = Command::new(bin())
        .args(["probes", "-C", "clk,d<0>,d<3>"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("!   1 clk"));
    assert!(lines[1].starts_with("\"   2 d [3@2 0@1]"));
}

#[test]
fn cli_probes_json() {
    let out = Command::new(bin())
        .args(["--json", "probes", "-C", "A,B", "--disable", "B", "-r", "2M"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["enabled"], 1);
    assert_eq!(v["sample_rate"], 2_000_000);
    assert_eq!(v["probes"].as_array().unwrap().len(), 1);
}

#[cfg(feature = "gzip")]
#[test]
fn cli_gzip_output() {
    use std::io::Read;

    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let output = dir.path().join("out.vcd.gz");
    std::fs::write(&input, [0u8, 1, 0, 1]).unwrap();

    let st = Command::new(bin())
        .args(["convert", "-C", "A", "-z"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());

    let mut text = String::new();
    flate2::read::GzDecoder::new(std::fs::File::open(&output).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    assert!(text.ends_with("#4\n1!\n"));
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("MAX_PROBES=94"));
}
