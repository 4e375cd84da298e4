use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn siftree(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("siftree"));
    cmd.env_remove("SIFTREE_MODELS")
        .env_remove("SIFTREE_LOG")
        .arg("--root")
        .arg(root);
    cmd
}

fn paths(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|v| v["relative_path"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn discover_lists_included_files_in_order() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("b.txt"), b"b");
    write_file(&temp.path().join("a.txt"), b"a");
    write_file(&temp.path().join("debug.log"), b"log");
    write_file(&temp.path().join("sub/zz.md"), b"z");

    let assert = siftree(temp.path())
        .args(["discover", "--classifier", "heuristic"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(paths(&items), vec!["a.txt", "b.txt", "sub/zz.md"]);
    assert_eq!(items[0]["size"], 1);
    assert_eq!(items[0]["is_binary"], false);
}

#[test]
fn discover_removed_explains_reasons() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("keep.txt"), b"keep");
    write_file(&temp.path().join("debug.log"), b"log");
    write_file(&temp.path().join("blob.dat"), b"a\0b");

    let assert = siftree(temp.path())
        .args(["discover", "--select", "removed", "--classifier", "heuristic"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(paths(&items), vec!["blob.dat", "debug.log"]);
    assert_eq!(items[0]["reasons"][0]["kind"], "binary");
    assert_eq!(items[0]["flags"][0], "binary");
    assert_eq!(items[1]["reasons"][0]["kind"], "pattern");
    assert_eq!(items[1]["reasons"][0]["pattern"], "*.log");
    assert_eq!(items[1]["reasons"][0]["origin"], "default");
}

#[test]
fn discover_counts_tokens_per_model() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"hello world");

    let assert = siftree(temp.path())
        .args(["discover", "--model", "chars-4", "--model", "estimate"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["tokens"]["chars-4"], 3);
    assert!(items[0]["tokens"]["estimate"].as_u64().unwrap() > 0);
}

#[test]
fn unknown_model_fails_without_output() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"hello");

    siftree(temp.path())
        .args(["discover", "--model", "foo-bar"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("foo-bar"));
}

#[test]
fn missing_root_fails() {
    let temp = tempdir().unwrap();

    siftree(&temp.path().join("missing"))
        .arg("discover")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn json_format_emits_single_array() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"a");
    write_file(&temp.path().join("b.txt"), b"bb");

    let assert = siftree(temp.path())
        .args(["--format", "json", "discover"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    let items = value.as_array().unwrap();
    assert_eq!(paths(items), vec!["a.txt", "b.txt"]);
}

#[test]
fn user_ignore_and_nested_gitignore() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join(".gitignore"), b"*.tmp\n");
    write_file(&temp.path().join("sub/.gitignore"), b"!keep.tmp\n");
    write_file(&temp.path().join("sub/keep.tmp"), b"k");
    write_file(&temp.path().join("sub/other.tmp"), b"o");
    write_file(&temp.path().join("docs/guide.md"), b"g");

    let assert = siftree(temp.path())
        .args(["discover", "--ignore", "docs/", "--ignore", ".gitignore"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(paths(&items), vec!["sub/keep.tmp"]);
}

#[test]
fn stats_reports_totals_and_patterns() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.rs"), b"fn a() {}");
    write_file(&temp.path().join("dir/b.rs"), b"fn b() {}");
    write_file(&temp.path().join("c.log"), b"log");

    let assert = siftree(temp.path())
        .args(["stats", "--ignore", "*.tmp", "--classifier", "heuristic"])
        .assert()
        .success();
    let report: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(report["selection"], "included");
    assert_eq!(report["totals"]["size"], 18);
    assert_eq!(report["extensions"]["rs"]["count"], 2);
    assert_eq!(report["discovery"]["classifier"], "heuristic");
    assert_eq!(report["discovery"]["files_visited"], 3);
    assert_eq!(report["discovery"]["files_kept"], 2);
    assert_eq!(report["discovery"]["patterns_by_origin"]["user"][0], "*.tmp");
    assert_eq!(report["removed_extensions"]["log"]["size"], 3);
    assert!(report["extensions"].get("log").is_none());
}

#[test]
fn tree_emits_nodes_with_aggregates() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"12");
    write_file(&temp.path().join("d/b.txt"), b"345");

    let assert = siftree(temp.path())
        .args(["tree", "--model", "chars-1"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    let rows: Vec<(String, String, u64, u64)> = items
        .iter()
        .map(|v| {
            (
                v["path"].as_str().unwrap().to_string(),
                v["kind"].as_str().unwrap().to_string(),
                v["size"].as_u64().unwrap(),
                v["tokens"]["chars-1"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("".to_string(), "directory".to_string(), 5, 5),
            ("a.txt".to_string(), "file".to_string(), 2, 2),
            ("d".to_string(), "directory".to_string(), 3, 3),
            ("d/b.txt".to_string(), "file".to_string(), 3, 3),
        ]
    );
}

#[test]
fn max_depth_flag_limits_output() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("top.txt"), b"t");
    write_file(&temp.path().join("a/b/deep.txt"), b"d");

    let assert = siftree(temp.path())
        .args(["discover", "--max-depth", "0"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(paths(&items), vec!["top.txt"]);
}

#[test]
fn output_is_deterministic() {
    let temp = tempdir().unwrap();
    for name in ["c.txt", "a/x.md", "a/y.md", "b/z.rs"] {
        write_file(&temp.path().join(name), name.as_bytes());
    }

    let run = || {
        siftree(temp.path())
            .args(["discover", "--model", "estimate"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn summarize_streams_text_files_to_stdout() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"alpha");
    write_file(&temp.path().join("d/b.rs"), b"fn b() {}");
    write_file(&temp.path().join("blob.bin"), b"\0\0\0");
    write_file(&temp.path().join("skip.log"), b"log");

    siftree(temp.path())
        .args(["summarize", "--classifier", "heuristic"])
        .assert()
        .success()
        .stdout("a.txt:\n```\nalpha\n```\n\nd/b.rs:\n```\nfn b() {}\n```\n\n");
}

#[test]
fn summarize_output_file_inside_root_is_not_its_own_input() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), b"alpha");
    let output = temp.path().join("summary.txt");

    siftree(temp.path())
        .args(["summarize", "--delimiter", "~~~", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, "a.txt:\n~~~\nalpha\n~~~\n\n");
}
