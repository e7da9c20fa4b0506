use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use ztree::config::ZtreeConfig;
use ztree::tooling::cli::{CliContext, Commands};
use ztree::{ApiError, HierarchicalStore, MemoryStore, NodePath, StoreError};

fn memory_cli() -> CliContext {
    CliContext::with_store(ZtreeConfig::default(), Arc::new(MemoryStore::new()))
}

fn run(cli: &CliContext, command: Commands) -> String {
    cli.execute(&command).unwrap()
}

fn create(cli: &CliContext, path: &str, data: &str) -> String {
    run(
        cli,
        Commands::Create {
            path: path.to_string(),
            data: data.to_string(),
            sequential: false,
        },
    )
}

#[test]
fn crud_round_trip_through_commands() {
    let cli = memory_cli();
    assert_eq!(create(&cli, "/atguigu", "shanguigu"), "/atguigu");

    let exists = run(
        &cli,
        Commands::Exists {
            path: "/atguigu".to_string(),
            format: "text".to_string(),
        },
    );
    assert_eq!(exists, "exists (version 0)");

    let data = run(
        &cli,
        Commands::Get {
            path: "/atguigu".to_string(),
            hex: false,
        },
    );
    assert_eq!(data, "shanguigu");

    let set = run(
        &cli,
        Commands::Set {
            path: "/atguigu".to_string(),
            data: "sggggg".to_string(),
            version: Some(0),
        },
    );
    assert_eq!(set, "version: 1");

    let stale = cli
        .execute(&Commands::Set {
            path: "/atguigu".to_string(),
            data: "again".to_string(),
            version: Some(0),
        })
        .unwrap_err();
    assert!(matches!(
        stale,
        ApiError::Store(StoreError::BadVersion { .. })
    ));

    let listing = run(
        &cli,
        Commands::Ls {
            path: "/".to_string(),
            format: "json".to_string(),
        },
    );
    let parsed: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(parsed["children"], serde_json::json!(["atguigu"]));

    let deleted = run(
        &cli,
        Commands::Delete {
            path: "/atguigu".to_string(),
            version: None,
        },
    );
    assert_eq!(deleted, "deleted /atguigu");

    let missing = run(
        &cli,
        Commands::Exists {
            path: "/atguigu".to_string(),
            format: "text".to_string(),
        },
    );
    assert_eq!(missing, "not exist");
}

#[test]
fn sequential_create_reports_generated_name() {
    let cli = memory_cli();
    create(&cli, "/locks", "");
    let created = run(
        &cli,
        Commands::Create {
            path: "/locks/lock-".to_string(),
            data: String::new(),
            sequential: true,
        },
    );
    assert_eq!(created, "/locks/lock-0000000000");
}

#[test]
fn rmr_json_contract_has_required_fields() {
    let cli = memory_cli();
    for path in ["/a", "/a/b", "/a/c", "/a/c/d"] {
        create(&cli, path, "");
    }

    let output = run(
        &cli,
        Commands::Rmr {
            path: "/a".to_string(),
            timeout_ms: None,
            format: "json".to_string(),
        },
    );

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["root"], "/a");
    assert!(parsed["aborted"].is_null());
    assert!(parsed.get("duration_ms").and_then(|v| v.as_u64()).is_some());
    let outcomes = parsed["outcomes"].as_array().unwrap();
    let paths: Vec<_> = outcomes.iter().map(|o| o["path"].as_str().unwrap()).collect();
    assert_eq!(paths, vec!["/a/b", "/a/c/d", "/a/c", "/a"]);
    assert!(outcomes.iter().all(|o| o["status"] == "deleted"));
}

#[test]
fn rmr_text_lists_every_node() {
    let cli = memory_cli();
    create(&cli, "/x", "");
    create(&cli, "/x/y", "");

    let output = run(
        &cli,
        Commands::Rmr {
            path: "/x".to_string(),
            timeout_ms: None,
            format: "text".to_string(),
        },
    );
    assert!(output.contains("/x/y"));
    assert!(output.contains("deleted: 2"));
    assert!(output.contains("on hadoop100:2181"));
}

#[test]
fn rmr_missing_path_reports_not_found() {
    let cli = memory_cli();
    let output = run(
        &cli,
        Commands::Rmr {
            path: "/nope".to_string(),
            timeout_ms: None,
            format: "json".to_string(),
        },
    );
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        parsed["outcomes"],
        serde_json::json!([{"path": "/nope", "status": "not_found"}])
    );
}

#[test]
fn context_from_config_file_uses_sled_path() {
    let temp_dir = TempDir::new().unwrap();
    let store_dir = temp_dir.path().join("db");
    let config_path = temp_dir.path().join("ztree.toml");
    fs::write(
        &config_path,
        format!(
            "[store]\nbackend = \"sled\"\npath = \"{}\"\n",
            store_dir.display()
        ),
    )
    .unwrap();

    {
        let cli = CliContext::new(Some(config_path.clone())).unwrap();
        create(&cli, "/persisted", "yes");
    }

    let cli = CliContext::new(Some(config_path)).unwrap();
    let data = run(
        &cli,
        Commands::Get {
            path: "/persisted".to_string(),
            hex: false,
        },
    );
    assert_eq!(data, "yes");
    assert!(store_dir.exists());
}

fn rmr_json(cli: &CliContext, timeout_ms: Option<u64>) -> serde_json::Value {
    let output = run(
        cli,
        Commands::Rmr {
            path: "/a".to_string(),
            timeout_ms,
            format: "json".to_string(),
        },
    );
    serde_json::from_str(&output).unwrap()
}

#[test]
fn rmr_expired_timeout_cancels_before_descending() {
    let cli = memory_cli();
    for path in ["/a", "/a/b", "/a/c"] {
        create(&cli, path, "");
    }

    let parsed = rmr_json(&cli, Some(0));

    assert_eq!(parsed["aborted"]["kind"], "cancelled");
    assert_eq!(parsed["aborted"]["path"], "/a");
    assert_eq!(
        parsed["outcomes"],
        serde_json::json!([{"path": "/a", "status": "failed", "reason": "cancelled"}])
    );
    assert_eq!(cli.store().list_children(&NodePath::parse("/a").unwrap()).unwrap().len(), 2);
}

#[test]
fn rmr_uses_configured_delete_timeout() {
    let mut config = ZtreeConfig::default();
    config.session.delete_timeout_ms = Some(0);
    let cli = CliContext::with_store(config, Arc::new(MemoryStore::new()));
    create(&cli, "/a", "");
    create(&cli, "/a/b", "");

    let parsed = rmr_json(&cli, None);

    assert_eq!(parsed["aborted"]["kind"], "cancelled");
    assert!(cli.store().exists(&NodePath::parse("/a/b").unwrap()).unwrap().is_some());

    // An explicit flag takes precedence over the configured deadline.
    let parsed = rmr_json(&cli, Some(60_000));
    assert!(parsed["aborted"].is_null());
    assert!(cli.store().exists(&NodePath::parse("/a").unwrap()).unwrap().is_none());
}

#[test]
fn stat_on_missing_node_is_an_error() {
    let cli = memory_cli();
    let err = cli
        .execute(&Commands::Stat {
            path: "/missing".to_string(),
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Store(StoreError::NoNode(_))));
}
