// Exported ecosystem files as a supervisor reads them

use launchspec::config::Ecosystem;
use launchspec::platform::Platform;
use serde_json::{json, Value};

#[test]
fn test_json_export_matches_supervisor_contract() {
    let exported = Ecosystem::builtin().to_json_string(&Platform::Linux).unwrap();
    let value: Value = serde_json::from_str(&exported).unwrap();

    assert_eq!(
        value,
        json!({
            "apps": [{
                "name": "pdf-extractor-api",
                "script": "run.py",
                "interpreter": "./venv/bin/python",
                "instances": 1,
                "autorestart": true,
                "watch": false,
                "max_memory_restart": "1G",
                "env": { "NODE_ENV": "production" }
            }]
        })
    );
}

#[test]
fn test_json_export_for_windows() {
    let exported = Ecosystem::builtin().to_json_string(&Platform::Windows).unwrap();
    let value: Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["apps"][0]["interpreter"], "./venv/Scripts/python");
}

#[test]
fn test_json_export_reloads() {
    let exported = Ecosystem::builtin().to_json_string(&Platform::Linux).unwrap();
    let reloaded = Ecosystem::from_json_str(&exported).unwrap();

    let resolved = reloaded.resolve(&Platform::Windows);
    // The exported interpreter is fixed to the platform it was exported for
    assert_eq!(
        resolved.apps()[0].interpreter().display().to_string(),
        "./venv/bin/python"
    );
    assert_eq!(resolved.apps()[0].max_memory_restart().unwrap().to_string(), "1G");
}

#[test]
fn test_toml_export_reloads() {
    let exported = Ecosystem::builtin().to_toml_string(&Platform::Linux).unwrap();
    assert!(exported.contains("[[apps]]"));

    let reloaded = Ecosystem::from_toml_str(&exported).unwrap();
    assert_eq!(
        reloaded.resolve(&Platform::Linux),
        Ecosystem::builtin().resolve(&Platform::Linux)
    );
}
