//! MCP tool request types.
//!
//! These structs define the parameters for each MCP tool exposed by the server.

use crate::backend::{ClassTarget, FieldTarget, MethodTarget};
use crate::error::ToolError;
use crate::service::PageRequest;
use rmcp::schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyParams {}

/// Paging arguments shared by every cache-backed read.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PageArgs {
    #[schemars(description = "1-based page number (default: 1). Page 1 always refetches")]
    #[serde(alias = "page")]
    pub page_index: Option<i64>,
    #[schemars(description = "Units (lines or records) per page (default: 200)")]
    #[serde(alias = "lines_per_page", alias = "limit")]
    pub page_size: Option<i64>,
    #[schemars(description = "Refetch from the backend even for later pages (default: false)")]
    pub refresh: Option<bool>,
}

impl PageArgs {
    pub fn request(&self) -> Result<PageRequest, ToolError> {
        PageRequest::from_args(self.page_index, self.page_size, self.refresh)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PagedRequest {
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassRequest {
    #[schemars(description = "Raw (obfuscated) class name, e.g. androidx.core.i.d. Wins over class_name")]
    pub class_raw_name: Option<String>,
    #[schemars(description = "Display class name, e.g. com.example.MainActivity")]
    #[serde(alias = "class")]
    pub class_name: Option<String>,
}

impl ClassRequest {
    pub fn target(&self) -> ClassTarget {
        ClassTarget::new(self.class_raw_name.clone(), self.class_name.clone())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassPageRequest {
    #[serde(flatten)]
    pub class: ClassRequest,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MethodRequest {
    #[serde(flatten)]
    pub class: ClassRequest,
    #[schemars(description = "Original (pre-rename) method name, e.g. y. Wins over method_name")]
    #[serde(alias = "original_name")]
    pub method_original_name: Option<String>,
    #[schemars(description = "Method name as currently shown, e.g. onCreate")]
    #[serde(alias = "method")]
    pub method_name: Option<String>,
    #[schemars(
        description = "Method short id to pick an overload, e.g. onCreate(Landroid/os/Bundle;)V"
    )]
    #[serde(alias = "signature")]
    pub method_signature: Option<String>,
}

impl MethodRequest {
    pub fn target(&self) -> MethodTarget {
        MethodTarget {
            class: self.class.target(),
            original_name: self.method_original_name.clone(),
            name: self.method_name.clone(),
            signature: self.method_signature.clone(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MethodPageRequest {
    #[serde(flatten)]
    pub method: MethodRequest,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MethodSourcePageRequest {
    #[schemars(description = "1-based page number (default: 1)")]
    #[serde(alias = "page")]
    pub page_index: Option<i64>,
    #[schemars(description = "Lines per page (default: 200)")]
    #[serde(alias = "page_size")]
    pub lines_per_page: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FieldRequest {
    #[serde(flatten)]
    pub class: ClassRequest,
    #[schemars(description = "Raw (obfuscated) field name. Wins over field_name")]
    pub field_raw_name: Option<String>,
    #[schemars(description = "Field name as currently shown")]
    #[serde(alias = "field")]
    pub field_name: Option<String>,
}

impl FieldRequest {
    pub fn target(&self) -> FieldTarget {
        FieldTarget {
            class: self.class.target(),
            raw_name: self.field_raw_name.clone(),
            name: self.field_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResourceFileRequest {
    #[schemars(description = "Resource file name, e.g. res/layout/activity_main.xml")]
    #[serde(alias = "name", alias = "path")]
    pub filename: String,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CachedPageRequest {
    #[schemars(description = "cache_key returned by a cached read, e.g. get-class-source:com.example.Main")]
    #[serde(alias = "key")]
    pub cache_key: String,
    #[schemars(description = "1-based page number (default: 1)")]
    #[serde(alias = "page")]
    pub page_index: Option<i64>,
    #[schemars(description = "Units per page (default: 200)")]
    #[serde(alias = "lines_per_page")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClearCacheRequest {
    #[schemars(description = "Entry to drop. Omit to drop every entry")]
    #[serde(alias = "key")]
    pub cache_key: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameClassRequest {
    #[serde(flatten)]
    pub class: ClassRequest,
    #[schemars(description = "New class name. Empty resets to the original name")]
    pub new_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameMethodRequest {
    #[serde(flatten)]
    pub method: MethodRequest,
    #[schemars(description = "New method name. Empty resets to the original name")]
    pub new_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameFieldRequest {
    #[serde(flatten)]
    pub field: FieldRequest,
    #[schemars(description = "New field name. Empty resets to the original name")]
    pub new_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameMethodParameterRequest {
    #[serde(flatten)]
    pub method: MethodRequest,
    #[schemars(description = "0-based index of the parameter to rename")]
    #[serde(alias = "index")]
    pub parameter_index: i64,
    #[schemars(description = "New parameter name. Empty resets to the original name")]
    pub new_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddClassCommentRequest {
    #[serde(flatten)]
    pub class: ClassRequest,
    #[schemars(description = "Comment text")]
    pub comment: String,
    #[schemars(description = "JAVADOC (default) or LINE")]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddMethodCommentRequest {
    #[serde(flatten)]
    pub method: MethodRequest,
    #[schemars(description = "Comment text")]
    pub comment: String,
    #[schemars(description = "JAVADOC (default) or LINE")]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddFieldCommentRequest {
    #[serde(flatten)]
    pub field: FieldRequest,
    #[schemars(description = "Comment text")]
    pub comment: String,
    #[schemars(description = "LINE (default) or JAVADOC")]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToolCatalogRequest {
    #[schemars(description = "Free-text search, e.g. 'rename a method' or 'smali'")]
    #[serde(alias = "q")]
    pub query: Option<String>,
    #[schemars(description = "Restrict to one category (see tool_catalog with no arguments)")]
    pub category: Option<String>,
    #[schemars(description = "Maximum tools to return (default: 7, max: 15)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToolHelpRequest {
    #[schemars(description = "Tool name, e.g. get_class_source")]
    #[serde(alias = "tool")]
    pub name: String,
}
