//! Integration tests for the ztree node store and recursive delete

mod cli_contracts;
mod config_loading;
mod delete_properties;
mod support;
