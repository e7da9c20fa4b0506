//! CLI Tooling
//!
//! Command-line interface over a hierarchical store: the node CRUD calls a
//! client performs plus the recursive, version-checked subtree delete.

use crate::config::{ConfigLoader, ZtreeConfig};
use crate::delete::{CancellationToken, TreeDeleter};
use crate::error::ApiError;
use crate::path::NodePath;
use crate::store::{self, CreateMode, HierarchicalStore};
use crate::tooling::format::{
    format_children_text, format_outcome_text, format_report_text, format_stat_text,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// ztree CLI - versioned hierarchical node store
#[derive(Parser)]
#[command(name = "ztree")]
#[command(about = "Versioned hierarchical node store with safe recursive delete")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a node under an existing parent
    Create {
        path: String,
        /// Initial data stored in the node
        #[arg(default_value = "")]
        data: String,
        /// Append a monotonically increasing counter to the name
        #[arg(long)]
        sequential: bool,
    },
    /// List the immediate children of a node
    Ls {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Report whether a node exists
    Exists {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show node metadata
    Stat {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the data stored in a node
    Get {
        path: String,
        /// Print data as hex instead of UTF-8
        #[arg(long)]
        hex: bool,
    },
    /// Replace the data stored in a node
    Set {
        path: String,
        data: String,
        /// Only write if the node is at this version
        #[arg(long)]
        version: Option<u64>,
    },
    /// Delete a single node that has no children
    Delete {
        path: String,
        /// Expected version (defaults to the version read just before deleting)
        #[arg(long)]
        version: Option<u64>,
    },
    /// Delete a node and its entire subtree
    Rmr {
        path: String,
        /// Stop descending once this many milliseconds have elapsed
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context holding the loaded configuration and an open store
pub struct CliContext {
    config: ZtreeConfig,
    store: Arc<dyn HierarchicalStore>,
}

impl CliContext {
    /// Load configuration and open the configured store
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_with_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    /// Open the store named by an already loaded configuration
    pub fn from_config(config: ZtreeConfig) -> Result<Self, ApiError> {
        let store = store::open(&config.store)?;
        Ok(Self::with_store(config, store))
    }

    /// Build a context over an already opened store
    pub fn with_store(config: ZtreeConfig, store: Arc<dyn HierarchicalStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ZtreeConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn HierarchicalStore {
        self.store.as_ref()
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Create {
                path,
                data,
                sequential,
            } => {
                let path = NodePath::parse(path)?;
                let mode = if *sequential {
                    CreateMode::PersistentSequential
                } else {
                    CreateMode::Persistent
                };
                let created = self.store.create(&path, data.as_bytes(), mode)?;
                info!(path = %created, "Created node");
                Ok(created.to_string())
            }
            Commands::Ls { path, format } => {
                let path = NodePath::parse(path)?;
                let children = self.store.list_children(&path)?;
                match parse_format(format)? {
                    OutputFormat::Json => to_json(&json!({
                        "path": path,
                        "children": children,
                    })),
                    OutputFormat::Text => Ok(format_children_text(&children)),
                }
            }
            Commands::Exists { path, format } => {
                let path = NodePath::parse(path)?;
                let version = self.store.exists(&path)?;
                match parse_format(format)? {
                    OutputFormat::Json => to_json(&json!({
                        "path": path,
                        "exists": version.is_some(),
                        "version": version,
                    })),
                    OutputFormat::Text => Ok(match version {
                        Some(version) => format!("exists (version {})", version),
                        None => "not exist".to_string(),
                    }),
                }
            }
            Commands::Stat { path, format } => {
                let path = NodePath::parse(path)?;
                let stat = self
                    .store
                    .stat(&path)?
                    .ok_or_else(|| crate::error::StoreError::NoNode(path.to_string()))?;
                match parse_format(format)? {
                    OutputFormat::Json => to_json(&json!({
                        "path": path,
                        "stat": stat,
                    })),
                    OutputFormat::Text => Ok(format_stat_text(&path, &stat)),
                }
            }
            Commands::Get { path, hex } => {
                let path = NodePath::parse(path)?;
                let (data, _) = self.store.get_data(&path)?;
                if *hex {
                    Ok(hex::encode(data))
                } else {
                    Ok(String::from_utf8_lossy(&data).into_owned())
                }
            }
            Commands::Set {
                path,
                data,
                version,
            } => {
                let path = NodePath::parse(path)?;
                let stat = self.store.set_data(&path, data.as_bytes(), *version)?;
                info!(path = %path, version = stat.version, "Updated node");
                Ok(format!("version: {}", stat.version))
            }
            Commands::Delete { path, version } => {
                let path = NodePath::parse(path)?;
                let outcome = TreeDeleter::new(self.store.as_ref()).delete_node(&path, *version);
                Ok(format_outcome_text(&outcome))
            }
            Commands::Rmr {
                path,
                timeout_ms,
                format,
            } => {
                let path = NodePath::parse(path)?;
                let output_format = parse_format(format)?;
                let timeout = timeout_ms
                    .map(Duration::from_millis)
                    .or_else(|| self.config.session.delete_timeout());
                let token = match timeout {
                    Some(timeout) => CancellationToken::new().with_timeout(timeout),
                    None => CancellationToken::new(),
                };
                let report = TreeDeleter::new(self.store.as_ref())
                    .with_cancellation(token)
                    .delete_tree(&path);
                match output_format {
                    OutputFormat::Json => to_json(&report),
                    OutputFormat::Text => Ok(format_report_text(
                        &report,
                        &self.config.session.connect_string,
                    )),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat, ApiError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApiError::InvalidArgument(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidArgument(format!("Failed to serialize output: {}", e)))
}
