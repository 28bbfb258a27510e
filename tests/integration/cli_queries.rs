#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    nodes: PathBuf,
    edges: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("tao.toml");
    let nodes = dir.path().join("nodes.csv");
    let edges = dir.path().join("edges.csv");
    fs::write(
        &config,
        "name = \"cli\"\n\n[schema]\nproperty_total = 2\nzero_indexed = true\n\n[warmup]\nprogress_interval = 2\n",
    )
    .expect("write config");
    fs::write(
        &nodes,
        "id,attr0,attr1\n0,ada,london\n1,grace,nyc\n2,alan,london\n3,edsger,london\n",
    )
    .expect("write nodes");
    fs::write(
        &edges,
        "src,dst,atype,timestamp\n0,1,0,100\n0,2,0,300\n0,3,0,200\n0,3,1,50\n",
    )
    .expect("write edges");
    Fixture {
        _dir: dir,
        config,
        nodes,
        edges,
    }
}

fn tao(fx: &Fixture, args: &[&str]) -> assert_cmd::assert::Assert {
    cargo_bin_cmd!("tao")
        .arg("--config")
        .arg(&fx.config)
        .arg("--nodes")
        .arg(&fx.nodes)
        .arg("--edges")
        .arg(&fx.edges)
        .args(args)
        .assert()
}

fn stdout(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.success().get_output().stdout.clone()).expect("utf8 stdout")
}

#[test]
fn neighbors_by_type_prints_recent_first() {
    let fx = fixture();
    let out = stdout(tao(&fx, &["neighbors-by-type", "0", "0"]));
    assert_eq!(out, "2\n3\n1\n");
}

#[test]
fn assoc_range_json_output() {
    let fx = fixture();
    let out = stdout(tao(&fx, &["--format", "json", "assoc-range", "0", "0", "1", "2"]));
    let json: Value = serde_json::from_str(&out).expect("json");
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["dst"], 3);
    assert_eq!(rows[0]["timestamp"], 200);
    assert_eq!(rows[1]["dst"], 1);
    assert_eq!(rows[1]["src"], 0);
    assert_eq!(rows[1]["atype"], 0);
}

#[test]
fn count_time_range_and_get() {
    let fx = fixture();
    assert_eq!(stdout(tao(&fx, &["assoc-count", "0", "0"])), "3\n");
    assert_eq!(
        stdout(tao(&fx, &["assoc-time-range", "0", "0", "150", "250"])),
        "0 0 3 200\n"
    );
    assert_eq!(
        stdout(tao(&fx, &["assoc-get", "0", "0", "--dst", "1,3"])),
        "0 0 3 200\n0 0 1 100\n"
    );
}

#[test]
fn object_and_attribute_queries() {
    let fx = fixture();
    assert_eq!(stdout(tao(&fx, &["obj-get", "2"])), "alan\nlondon\n");
    // Node 3 is reached over two association types.
    assert_eq!(
        stdout(tao(&fx, &["neighbors-by-attr", "0", "1", "london"])),
        "2\n3\n3\n"
    );
    assert_eq!(
        stdout(tao(&fx, &["find-nodes", "1", "london"])),
        "0\n2\n3\n"
    );
    assert_eq!(
        stdout(tao(&fx, &["find-nodes", "1", "london", "--and", "0=alan"])),
        "2\n"
    );
}

#[test]
fn warmup_reports_totals_as_json() {
    let fx = fixture();
    let out = stdout(tao(&fx, &["--format", "json", "warmup"]));
    let json: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(json["nodes"], 4);
    assert_eq!(json["edges"], 4);
}

#[test]
fn missing_node_fails_with_message() {
    let fx = fixture();
    let assert = tao(&fx, &["obj-get", "99"]).failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("node 99 not found"), "stderr: {stderr}");
}

#[test]
fn unknown_atype_fails() {
    let fx = fixture();
    tao(&fx, &["assoc-count", "0", "5"]).failure();
}

#[test]
fn warmup_rejects_zero_progress_interval() {
    let fx = fixture();
    let assert = tao(&fx, &["warmup", "--progress-interval", "0"]).failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("--progress-interval"), "stderr: {stderr}");
    let out = stdout(tao(&fx, &["--format", "json", "warmup", "--progress-interval", "1"]));
    let json: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(json["edges"], 4);
}
