//! JADX MCP Server
//!
//! This library provides an MCP (Model Context Protocol) server in front of
//! the JADX decompiler's HTTP plugin. It lets LLM agents read decompiled
//! classes, methods, smali and resources, and rename or comment symbols.
//!
//! # Architecture
//!
//! - **BackendGateway** (`backend`): the only code that talks HTTP to the
//!   JADX plugin. Every endpoint is a fixed [`backend::Endpoint`].
//!
//! - **PageCache** (`cache`): large results (lines of text or JSON records)
//!   are stored once under a deterministic key and handed out in pages, so
//!   a 5,000-line class never has to cross the wire in a single response.
//!
//! - **JadxService** (`service`): the per-tool read and mutation flows.
//!   Reads decide between inline and paged output; mutations flush the
//!   cache before they are forwarded and again once they return.
//!
//! - **JadxMcpServer** (`server`): the rmcp tool surface. One service, and
//!   with it one cache, is shared by every MCP session.
//!
//! # Tools
//!
//! ## Classes
//! - `get_all_classes`, `get_class_source`, `get_smali_of_class`
//! - `get_class_info`, `get_methods`, `get_fields`, `get_current_class`
//!
//! ## Methods
//! - `get_method_source`, `get_method_source_page`, `get_method_info`
//! - `search_method`, `get_method_parameters`, `get_method_instructions`
//!
//! ## Android & resources
//! - `get_android_manifest`, `get_main_activity`, `get_strings`
//! - `get_main_application_classes_code`, `get_main_application_classes_names`
//! - `get_list_all_resource_files_names`, `get_resource_file`
//!
//! ## Paging
//! - `get_cached_page`: fetch any page of a cached result by `cache_key`
//! - `cache_stats`, `clear_cache`
//!
//! ## Editing
//! - `rename_class`, `rename_method`, `rename_field`, `rename_method_parameter`
//! - `add_class_comment`, `add_method_comment`, `add_field_comment`

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod tool_registry;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::ToolError;
pub use server::JadxMcpServer;
pub use service::JadxService;
pub use tool_registry::{ToolCategory, ToolInfo, TOOL_REGISTRY};
