//! niche_inventory against the bundled fixture

use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/niche_fixture.json")
}

fn run_inventory(args: &[&str]) -> Value {
    // Run outside the workspace so no config/niche.toml is picked up
    let cwd = tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_niche_inventory"))
        .current_dir(cwd.path())
        .env("RUST_LOG", "warn")
        .arg("--fixture")
        .arg(fixture_path())
        .args(args)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "niche_inventory failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn texts(items: &Value, pointer: &str) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.pointer(pointer).unwrap().as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_json_report_for_form() {
    let report = run_inventory(&["--form", "listings", "--niche", "SEO", "--json"]);

    assert_eq!(
        texts(&report["options"], "/text"),
        vec!["Marketing", "SEO", "Tech", "Finanças"]
    );
    assert_eq!(report["options"][1]["icon"], "BoltIcon");

    assert_eq!(
        texts(&report["counts"], "/option/text"),
        vec!["SEO", "Finanças", "Marketing", "Tech"]
    );
    assert_eq!(report["counts"][0]["count"], 2);

    assert_eq!(report["matching_records"], serde_json::json!(["r1", "r4"]));
}

#[test]
fn test_json_report_without_form() {
    let report = run_inventory(&["--search", "te", "--json"]);

    assert_eq!(texts(&report["options"], "/text"), vec!["Tech"]);
    assert_eq!(report["counts"], serde_json::json!([]));
    assert_eq!(report["matching_records"], serde_json::json!([]));
}
