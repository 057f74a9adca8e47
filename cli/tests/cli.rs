use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn push_string(out: &mut Vec<u8>, payload: &[u8]) {
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(payload);
}

fn single_file_torrent() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"d8:announce");
    push_string(&mut out, b"http://tracker.example/announce");
    out.extend_from_slice(b"4:infod");
    out.extend_from_slice(b"6:lengthi1024e");
    out.extend_from_slice(b"4:name");
    push_string(&mut out, b"demo.txt");
    out.extend_from_slice(b"12:piece lengthi16384e");
    out.extend_from_slice(b"6:pieces");
    push_string(&mut out, &[0xab; 20]);
    out.extend_from_slice(b"ee");
    out
}

fn multi_file_torrent() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"d8:announce");
    push_string(&mut out, b"http://tracker.example/announce");
    out.extend_from_slice(b"4:infod");
    out.extend_from_slice(b"5:filesl");
    out.extend_from_slice(b"d6:lengthi100e4:pathl3:dir5:a.txtee");
    out.extend_from_slice(b"d6:lengthi200e4:pathl3:dir5:b.txtee");
    out.extend_from_slice(b"e");
    out.extend_from_slice(b"4:name");
    push_string(&mut out, b"demo");
    out.extend_from_slice(b"12:piece lengthi16384e");
    out.extend_from_slice(b"6:pieces");
    push_string(&mut out, &[0x01; 40]);
    out.extend_from_slice(b"ee");
    out
}

fn write_file(path: &Path, contents: &[u8]) {
    fs::write(path, contents).expect("write test file");
}

#[test]
fn decodes_single_file_torrent() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("demo.torrent");
    write_file(&input, &single_file_torrent());

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("\"announce\":\"http://tracker.example/announce\"")
                .and(contains("\"length\":1024"))
                .and(contains("\"name\":\"demo.txt\""))
                .and(contains("\"piece length\":16384"))
                .and(contains("ab".repeat(20))),
        );
}

#[test]
fn decodes_multi_file_torrent() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("demo.torrent");
    write_file(&input, &multi_file_torrent());

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("\"files\":[")
                .and(contains("\"path\":[\"dir\",\"a.txt\"]"))
                .and(contains("\"length\":200"))
                .and(contains("\"name\":\"demo\"")),
        );
}

#[test]
fn raw_mode_dumps_any_bencode() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("input.bencode");
    write_file(&input, b"d3:fooi42e3:barl1:a1:bee");

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .arg("--raw")
        .assert()
        .success()
        .stdout(contains("\"foo\":42").and(contains("\"bar\":[\"a\",\"b\"]")));
}

#[test]
fn writes_output_file() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("demo.torrent");
    let output = dir.path().join("demo.json");
    write_file(&input, &single_file_torrent());

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .args(["--output", output.to_str().expect("utf-8 path")])
        .assert()
        .success();

    let rendered = fs::read_to_string(&output).expect("read output");
    assert!(rendered.contains("\"name\":\"demo.txt\""));
}

#[test]
fn rejects_malformed_input() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("broken.torrent");
    write_file(&input, b"d8:announce");

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("ERROR"));
}

#[test]
fn rejects_metainfo_missing_piece_length() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("broken.torrent");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"d8:announce");
    push_string(&mut bytes, b"http://tracker.example/announce");
    bytes.extend_from_slice(b"4:infod6:pieces");
    push_string(&mut bytes, &[0xab; 20]);
    bytes.extend_from_slice(b"ee");
    write_file(&input, &bytes);

    cargo_bin_cmd!("bencode2json")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("missing field"));
}
