//! MCP server implementation with JADX tools.

mod requests;

pub use requests::*;

use crate::backend::{Endpoint, Params};
use crate::error::ToolError;
use crate::service::{JadxService, ReadResult};
use crate::tool_registry::{self, ToolCategory};
use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo, Tool},
    schemars::{schema_for, JsonSchema},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

/// MCP server for a JADX decompiler session
#[derive(Clone)]
pub struct JadxMcpServer {
    service: JadxService,
    tool_mux: ToolMux<JadxMcpServer>,
}

/// Routes calls and lists tools in registry order.
#[derive(Clone)]
struct ToolMux<S> {
    call_router: ToolRouter<S>,
}

impl<S> ToolMux<S>
where
    S: Send + Sync + 'static,
{
    fn new(call_router: ToolRouter<S>) -> Self {
        Self { call_router }
    }

    async fn call(
        &self,
        context: ToolCallContext<'_, S>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.call_router.call(context).await
    }

    fn list_all(&self) -> Vec<Tool> {
        tool_registry::all_tools()
            .filter_map(|info| self.call_router.map.get(info.name))
            .map(|route| route.attr.clone())
            .collect()
    }
}

fn json_result<T: Serialize + std::fmt::Debug>(value: &T) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}")),
    )])
}

fn respond<T: Serialize + std::fmt::Debug>(
    result: Result<T, ToolError>,
) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => Ok(json_result(&value)),
        Err(e) => Ok(e.to_tool_result()),
    }
}

fn respond_read(result: Result<ReadResult, ToolError>) -> Result<CallToolResult, McpError> {
    respond(result.map(|r| r.to_json()))
}

/// Normalize a comment style. Only `JAVADOC` and `LINE` are accepted.
fn comment_style(style: Option<&str>, default: &'static str) -> Result<&'static str, ToolError> {
    let style = style.map(str::trim).unwrap_or("");
    if style.is_empty() {
        return Ok(default);
    }
    match style.to_ascii_uppercase().as_str() {
        "JAVADOC" => Ok("JAVADOC"),
        "LINE" => Ok("LINE"),
        _ => Err(ToolError::invalid(format!(
            "style must be JAVADOC or LINE, got '{style}'"
        ))),
    }
}

fn comment_params(
    mut params: Params,
    comment: &str,
    style: Option<&str>,
    default_style: &'static str,
) -> Result<Params, ToolError> {
    if comment.trim().is_empty() {
        return Err(ToolError::invalid("comment must not be empty"));
    }
    params
        .set("comment", comment)
        .set("style", comment_style(style, default_style)?);
    Ok(params)
}

fn with_new_name(mut params: Params, new_name: Option<&str>) -> Params {
    // An empty name is omitted, which the backend treats as a reset.
    params.set_opt("newName", new_name.map(str::trim));
    params
}

impl JadxMcpServer {
    pub fn new(service: JadxService) -> Self {
        info!("Creating JADX MCP server");
        Self {
            service,
            tool_mux: ToolMux::new(Self::tool_router()),
        }
    }

    fn instructions(&self) -> String {
        format!(
            "JADX decompiler bridge for Android reverse engineering. \
             Backend: {backend} \
             \n\nWorkflow: \
             \n1. health: Check that the JADX plugin is reachable \
             \n2. tool_catalog: Discover tools for your task (e.g., 'rename method', 'smali') \
             \n3. tool_help: Get full docs for a specific tool \
             \n4. Read code with get_class_source / get_method_source and friends \
             \n\nPaging: large results (at least {threshold} lines or records) are cached once \
             and returned one page at a time with cached=true, cache_key, current_page, total_pages \
             and total_units. Ask for page_index=2,3,... to continue without refetching; \
             page_index=1 (or refresh=true) refetches. get_cached_page(cache_key) pages any cached \
             entry, get_method_source_page pages the last method source. \
             \nRenames and comments flush the cache. \
             \n\nTool Categories: \
             \n- core: health and discovery (health, tool_catalog, tool_help) \
             \n- classes: class lists, source, smali, info, methods, fields \
             \n- methods: method source, info, search, parameters, instructions \
             \n- android: manifest, main activity, application classes \
             \n- resources: strings and resource files \
             \n- paging: cached pages and cache statistics \
             \n- editing: rename classes/methods/fields/parameters, add comments \
             \n\nTip: Use tool_catalog(query='what you want to do') to find the right tool.",
            backend = self.service.gateway().base_url(),
            threshold = self.service.cache().config().threshold,
        )
    }
}

#[tool_router]
impl JadxMcpServer {
    #[tool(description = "Check that the JADX plugin backend is reachable and report its status.")]
    #[instrument(skip(self))]
    async fn health(&self) -> Result<CallToolResult, McpError> {
        debug!("Tool call: health");
        respond(self.service.health().await)
    }

    #[tool(description = "Discover available tools by query or category. \
        Use this to find the right tool for your task before calling tool_help for full details.")]
    #[instrument(skip(self))]
    async fn tool_catalog(
        &self,
        Parameters(req): Parameters<ToolCatalogRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: tool_catalog");
        let limit = req.limit.unwrap_or(7).min(15);

        if let Some(cat_str) = &req.category {
            if let Ok(cat) = cat_str.parse::<ToolCategory>() {
                let tools: Vec<_> = tool_registry::tools_by_category(cat)
                    .take(limit)
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.short_desc,
                            "category": t.category.as_str(),
                        })
                    })
                    .collect();
                return Ok(json_result(&json!({
                    "category": cat.as_str(),
                    "category_description": cat.description(),
                    "tools": tools,
                    "hint": "Use tool_help(name) for full documentation and examples"
                })));
            }
        }

        if let Some(query) = &req.query {
            let tools: Vec<_> = tool_registry::search_tools(query, limit)
                .iter()
                .map(|(t, keywords)| {
                    json!({
                        "name": t.name,
                        "description": t.short_desc,
                        "category": t.category.as_str(),
                        "matched": keywords,
                    })
                })
                .collect();
            return Ok(json_result(&json!({
                "query": query,
                "tools": tools,
                "hint": "Use tool_help(name) for full documentation and examples"
            })));
        }

        let categories: Vec<_> = ToolCategory::all()
            .iter()
            .map(|c| {
                json!({
                    "category": c.as_str(),
                    "description": c.description(),
                    "tool_count": tool_registry::tools_by_category(*c).count(),
                })
            })
            .collect();
        Ok(json_result(&json!({
            "categories": categories,
            "hint": "Use tool_catalog(category='...') to list tools in a category, or tool_catalog(query='...') to search."
        })))
    }

    #[tool(
        description = "Get full documentation for a tool including description, parameters schema, and example."
    )]
    #[instrument(skip(self))]
    async fn tool_help(
        &self,
        Parameters(req): Parameters<ToolHelpRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: tool_help for {}", req.name);

        match tool_registry::get_tool(&req.name) {
            Some(tool) => Ok(json_result(&json!({
                "name": tool.name,
                "category": tool.category.as_str(),
                "description": tool.full_desc,
                "parameters": tool_params_schema(&req.name),
                "example": tool.example,
                "keywords": tool.keywords,
            }))),
            None => {
                let suggestions: Vec<_> = tool_registry::search_tools(&req.name, 3)
                    .iter()
                    .map(|(t, _)| t.name)
                    .collect();
                Ok(json_result(&json!({
                    "error": format!("Tool '{}' not found", req.name),
                    "suggestions": suggestions,
                    "hint": "Use tool_catalog to discover available tools"
                })))
            }
        }
    }

    #[tool(description = "Source of the class currently open in the JADX window (paged).")]
    #[instrument(skip(self))]
    async fn get_current_class(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_current_class");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.read(Endpoint::CurrentClass, page).await)
    }

    #[tool(description = "Text currently selected in the JADX window (paged).")]
    #[instrument(skip(self))]
    async fn get_selected_text(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_selected_text");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.read(Endpoint::SelectedText, page).await)
    }

    #[tool(description = "List every class in the project, including inner and anonymous classes (paged).")]
    #[instrument(skip(self))]
    async fn get_all_classes(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_all_classes");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.read(Endpoint::AllClasses, page).await)
    }

    #[tool(description = "Decompiled Java source of a class (paged). \
        Identify the class by class_raw_name (preferred) or class_name.")]
    #[instrument(skip(self))]
    async fn get_class_source(
        &self,
        Parameters(req): Parameters<ClassPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_class_source");
        self.class_read(Endpoint::ClassSource, &req).await
    }

    #[tool(description = "Smali disassembly of a class (paged).")]
    #[instrument(skip(self))]
    async fn get_smali_of_class(
        &self,
        Parameters(req): Parameters<ClassPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_smali_of_class");
        self.class_read(Endpoint::SmaliOfClass, &req).await
    }

    #[tool(description = "Class metadata: name, package, modifiers, super class, interfaces.")]
    #[instrument(skip(self))]
    async fn get_class_info(
        &self,
        Parameters(req): Parameters<ClassRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_class_info");
        respond(self.service.class_info(&req.target()).await)
    }

    #[tool(description = "Methods declared in a class with their signatures (paged).")]
    #[instrument(skip(self))]
    async fn get_methods(
        &self,
        Parameters(req): Parameters<ClassPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_methods");
        self.class_read(Endpoint::Methods, &req).await
    }

    #[tool(description = "Fields declared in a class with their types (paged).")]
    #[instrument(skip(self))]
    async fn get_fields(
        &self,
        Parameters(req): Parameters<ClassPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_fields");
        self.class_read(Endpoint::Fields, &req).await
    }

    #[tool(description = "Decompiled source of one method (paged). \
        The full source is also kept for get_method_source_page.")]
    #[instrument(skip(self))]
    async fn get_method_source(
        &self,
        Parameters(req): Parameters<MethodPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_method_source");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.method_source(&req.method.target(), page).await)
    }

    #[tool(description = "Page through the most recently fetched method source without refetching.")]
    #[instrument(skip(self))]
    async fn get_method_source_page(
        &self,
        Parameters(req): Parameters<MethodSourcePageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_method_source_page");
        respond(
            self.service
                .method_source_page(req.page_index, req.lines_per_page),
        )
    }

    #[tool(description = "Method metadata: signature, modifiers, return and parameter types.")]
    #[instrument(skip(self))]
    async fn get_method_info(
        &self,
        Parameters(req): Parameters<MethodRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_method_info");
        respond(self.service.method_info(&req.target()).await)
    }

    #[tool(description = "Search methods by name across the project or within one class (paged).")]
    #[instrument(skip(self))]
    async fn search_method(
        &self,
        Parameters(req): Parameters<MethodPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: search_method");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.search_method(&req.method.target(), page).await)
    }

    #[tool(description = "Parameters of a method with their types and names (paged).")]
    #[instrument(skip(self))]
    async fn get_method_parameters(
        &self,
        Parameters(req): Parameters<MethodPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_method_parameters");
        self.method_read(Endpoint::MethodParameters, &req).await
    }

    #[tool(description = "Bytecode instruction listing of a method (paged).")]
    #[instrument(skip(self))]
    async fn get_method_instructions(
        &self,
        Parameters(req): Parameters<MethodPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_method_instructions");
        self.method_read(Endpoint::MethodInstructions, &req).await
    }

    #[tool(description = "AndroidManifest.xml of the loaded APK (paged).")]
    #[instrument(skip(self))]
    async fn get_android_manifest(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_android_manifest");
        self.plain_read(Endpoint::Manifest, &req).await
    }

    #[tool(description = "Source of the launcher activity declared in the manifest (paged).")]
    #[instrument(skip(self))]
    async fn get_main_activity(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_main_activity");
        self.plain_read(Endpoint::MainActivity, &req).await
    }

    #[tool(description = "Source of the Application class and the main classes of the app package (paged).")]
    #[instrument(skip(self))]
    async fn get_main_application_classes_code(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_main_application_classes_code");
        self.plain_read(Endpoint::MainApplicationClassesCode, &req)
            .await
    }

    #[tool(description = "Names of the Application class and the main classes of the app package (paged).")]
    #[instrument(skip(self))]
    async fn get_main_application_classes_names(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_main_application_classes_names");
        self.plain_read(Endpoint::MainApplicationClassesNames, &req)
            .await
    }

    #[tool(description = "String resources from strings.xml (paged).")]
    #[instrument(skip(self))]
    async fn get_strings(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_strings");
        self.plain_read(Endpoint::Strings, &req).await
    }

    #[tool(description = "Names of every resource file in the APK (paged).")]
    #[instrument(skip(self))]
    async fn get_list_all_resource_files_names(
        &self,
        Parameters(req): Parameters<PagedRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_list_all_resource_files_names");
        self.plain_read(Endpoint::ResourceFileNames, &req).await
    }

    #[tool(description = "Content of one resource file, e.g. res/layout/activity_main.xml (paged).")]
    #[instrument(skip(self))]
    async fn get_resource_file(
        &self,
        Parameters(req): Parameters<ResourceFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_resource_file");
        let page = match req.page.request() {
            Ok(p) => p,
            Err(e) => return Ok(e.to_tool_result()),
        };
        respond_read(self.service.resource_file(&req.filename, page).await)
    }

    #[tool(description = "Read one page of any cached result by its cache_key. Never contacts the backend.")]
    #[instrument(skip(self))]
    async fn get_cached_page(
        &self,
        Parameters(req): Parameters<CachedPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: get_cached_page");
        respond(
            self.service
                .cached_page(&req.cache_key, req.page_index, req.page_size),
        )
    }

    #[tool(description = "Cache statistics: live entries, capacity, threshold, hits, misses, evictions.")]
    #[instrument(skip(self))]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        debug!("Tool call: cache_stats");
        Ok(json_result(&self.service.stats()))
    }

    #[tool(description = "Drop one cached entry by cache_key, or the whole cache when no key is given.")]
    #[instrument(skip(self))]
    async fn clear_cache(
        &self,
        Parameters(req): Parameters<ClearCacheRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: clear_cache");
        let removed = self.service.clear(req.cache_key.as_deref());
        Ok(json_result(&json!({ "removed": removed })))
    }

    #[tool(description = "Rename a class. An empty new_name resets it to the original name. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn rename_class(
        &self,
        Parameters(req): Parameters<RenameClassRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: rename_class");
        let class = req.class.target();
        if let Err(e) = class.require() {
            return Ok(e.to_tool_result());
        }
        let params = with_new_name(class.params(), req.new_name.as_deref());
        respond(
            self.service
                .mutate(Endpoint::RenameClass, &params)
                .await,
        )
    }

    #[tool(description = "Rename a method. An empty new_name resets it to the original name. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn rename_method(
        &self,
        Parameters(req): Parameters<RenameMethodRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: rename_method");
        let method = req.method.target();
        if let Err(e) = method.require() {
            return Ok(e.to_tool_result());
        }
        let params = with_new_name(method.params(), req.new_name.as_deref());
        respond(
            self.service
                .mutate(Endpoint::RenameMethod, &params)
                .await,
        )
    }

    #[tool(description = "Rename a field. An empty new_name resets it to the original name. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn rename_field(
        &self,
        Parameters(req): Parameters<RenameFieldRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: rename_field");
        let field = req.field.target();
        if let Err(e) = field.require() {
            return Ok(e.to_tool_result());
        }
        let params = with_new_name(field.params(), req.new_name.as_deref());
        respond(
            self.service
                .mutate(Endpoint::RenameField, &params)
                .await,
        )
    }

    #[tool(description = "Rename one parameter of a method by its 0-based index. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn rename_method_parameter(
        &self,
        Parameters(req): Parameters<RenameMethodParameterRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: rename_method_parameter");
        let method = req.method.target();
        if let Err(e) = method.require() {
            return Ok(e.to_tool_result());
        }
        if req.parameter_index < 0 {
            return Ok(ToolError::invalid(format!(
                "parameter_index must be at least 0, got {}",
                req.parameter_index
            ))
            .to_tool_result());
        }
        let mut params = with_new_name(method.params(), req.new_name.as_deref());
        params.set_num("parameterIndex", req.parameter_index);
        respond(
            self.service
                .mutate(Endpoint::RenameMethodParameter, &params)
                .await,
        )
    }

    #[tool(description = "Attach a comment to a class. style is JAVADOC (default) or LINE. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn add_class_comment(
        &self,
        Parameters(req): Parameters<AddClassCommentRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: add_class_comment");
        let class = req.class.target();
        let params = class.require().and_then(|_| {
            comment_params(class.params(), &req.comment, req.style.as_deref(), "JAVADOC")
        });
        match params {
            Ok(params) => respond(
                self.service
                    .mutate(Endpoint::AddClassComment, &params)
                    .await,
            ),
            Err(e) => Ok(e.to_tool_result()),
        }
    }

    #[tool(description = "Attach a comment to a method. style is JAVADOC (default) or LINE. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn add_method_comment(
        &self,
        Parameters(req): Parameters<AddMethodCommentRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: add_method_comment");
        let method = req.method.target();
        let params = method.require().and_then(|_| {
            comment_params(method.params(), &req.comment, req.style.as_deref(), "JAVADOC")
        });
        match params {
            Ok(params) => respond(
                self.service
                    .mutate(Endpoint::AddMethodComment, &params)
                    .await,
            ),
            Err(e) => Ok(e.to_tool_result()),
        }
    }

    #[tool(description = "Attach a comment to a field. style is LINE (default) or JAVADOC. Flushes the cache.")]
    #[instrument(skip(self))]
    async fn add_field_comment(
        &self,
        Parameters(req): Parameters<AddFieldCommentRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call: add_field_comment");
        let field = req.field.target();
        let params = field.require().and_then(|_| {
            comment_params(field.params(), &req.comment, req.style.as_deref(), "LINE")
        });
        match params {
            Ok(params) => respond(
                self.service
                    .mutate(Endpoint::AddFieldComment, &params)
                    .await,
            ),
            Err(e) => Ok(e.to_tool_result()),
        }
    }
}

impl JadxMcpServer {
    async fn plain_read(
        &self,
        endpoint: Endpoint,
        req: &PagedRequest,
    ) -> Result<CallToolResult, McpError> {
        match req.page.request() {
            Ok(page) => respond_read(self.service.read(endpoint, page).await),
            Err(e) => Ok(e.to_tool_result()),
        }
    }

    async fn class_read(
        &self,
        endpoint: Endpoint,
        req: &ClassPageRequest,
    ) -> Result<CallToolResult, McpError> {
        match req.page.request() {
            Ok(page) => respond_read(
                self.service
                    .read_class(endpoint, &req.class.target(), page)
                    .await,
            ),
            Err(e) => Ok(e.to_tool_result()),
        }
    }

    async fn method_read(
        &self,
        endpoint: Endpoint,
        req: &MethodPageRequest,
    ) -> Result<CallToolResult, McpError> {
        match req.page.request() {
            Ok(page) => respond_read(
                self.service
                    .read_method(endpoint, &req.method.target(), page)
                    .await,
            ),
            Err(e) => Ok(e.to_tool_result()),
        }
    }
}

fn tool_params_schema(name: &str) -> Option<Value> {
    fn schema<T: JsonSchema>() -> Value {
        serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({}))
    }

    match name {
        // Core
        "health" | "cache_stats" => Some(schema::<EmptyParams>()),
        "tool_catalog" => Some(schema::<ToolCatalogRequest>()),
        "tool_help" => Some(schema::<ToolHelpRequest>()),

        // Reads
        "get_current_class"
        | "get_selected_text"
        | "get_all_classes"
        | "get_android_manifest"
        | "get_main_activity"
        | "get_main_application_classes_code"
        | "get_main_application_classes_names"
        | "get_strings"
        | "get_list_all_resource_files_names" => Some(schema::<PagedRequest>()),
        "get_class_source" | "get_smali_of_class" | "get_methods" | "get_fields" => {
            Some(schema::<ClassPageRequest>())
        }
        "get_class_info" => Some(schema::<ClassRequest>()),
        "get_method_source"
        | "search_method"
        | "get_method_parameters"
        | "get_method_instructions" => Some(schema::<MethodPageRequest>()),
        "get_method_info" => Some(schema::<MethodRequest>()),
        "get_method_source_page" => Some(schema::<MethodSourcePageRequest>()),
        "get_resource_file" => Some(schema::<ResourceFileRequest>()),

        // Paging
        "get_cached_page" => Some(schema::<CachedPageRequest>()),
        "clear_cache" => Some(schema::<ClearCacheRequest>()),

        // Editing
        "rename_class" => Some(schema::<RenameClassRequest>()),
        "rename_method" => Some(schema::<RenameMethodRequest>()),
        "rename_field" => Some(schema::<RenameFieldRequest>()),
        "rename_method_parameter" => Some(schema::<RenameMethodParameterRequest>()),
        "add_class_comment" => Some(schema::<AddClassCommentRequest>()),
        "add_method_comment" => Some(schema::<AddMethodCommentRequest>()),
        "add_field_comment" => Some(schema::<AddFieldCommentRequest>()),

        _ => None,
    }
}

#[tool_handler(router = self.tool_mux)]
impl ServerHandler for JadxMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(self.instructions()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, Config};
    use crate::test_support::MockBackend;

    fn server_for(mock: &MockBackend) -> JadxMcpServer {
        let config = Config {
            backend: mock.config(),
            cache: CacheConfig::default(),
        };
        JadxMcpServer::new(JadxService::new(&config).expect("service"))
    }

    #[test]
    fn comment_styles() {
        assert_eq!(comment_style(None, "LINE"), Ok("LINE"));
        assert_eq!(comment_style(Some(" javadoc "), "LINE"), Ok("JAVADOC"));
        assert!(matches!(
            comment_style(Some("BLOCK"), "LINE"),
            Err(ToolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_new_name_is_omitted() {
        let params = with_new_name(Params::new(), Some(""));
        assert_eq!(params.get("newName"), None);
        let params = with_new_name(Params::new(), Some("Launcher"));
        assert_eq!(params.get("newName"), Some("Launcher"));
    }

    #[test]
    fn every_registered_tool_is_routed_and_documented() {
        let routed: Vec<String> = JadxMcpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        for info in tool_registry::all_tools() {
            assert!(routed.iter().any(|n| n == info.name), "{} not routed", info.name);
            assert!(
                tool_params_schema(info.name).is_some(),
                "{} has no schema",
                info.name
            );
        }
        for name in &routed {
            assert!(
                tool_registry::get_tool(name).is_some(),
                "{name} missing from registry"
            );
        }
    }

    #[tokio::test]
    async fn bad_style_is_rejected_before_any_request() {
        let mock = MockBackend::start().await;
        let server = server_for(&mock);
        let result = server
            .add_class_comment(Parameters(AddClassCommentRequest {
                class: ClassRequest {
                    class_raw_name: None,
                    class_name: Some("com.example.Main".into()),
                },
                comment: "entry point".into(),
                style: Some("BLOCK".into()),
            }))
            .await
            .expect("tool result");
        assert_eq!(result.is_error, Some(true));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn field_comment_defaults_to_line_style() {
        let mock = MockBackend::start().await;
        mock.respond("add-field-comment", 200, r#"{"result":"ok"}"#);
        let server = server_for(&mock);
        let result = server
            .add_field_comment(Parameters(AddFieldCommentRequest {
                field: FieldRequest {
                    class: ClassRequest {
                        class_raw_name: Some("a.b".into()),
                        class_name: None,
                    },
                    field_raw_name: None,
                    field_name: Some("token".into()),
                },
                comment: "session token".into(),
                style: None,
            }))
            .await
            .expect("tool result");
        assert_ne!(result.is_error, Some(true));
        let calls = mock.requests();
        assert_eq!(calls[0].param("style"), Some("LINE"));
        assert_eq!(calls[0].param("field_name"), Some("token"));
    }

    #[tokio::test]
    async fn missing_class_is_an_error_result() {
        let mock = MockBackend::start().await;
        let server = server_for(&mock);
        let result = server
            .get_class_source(Parameters(ClassPageRequest {
                class: ClassRequest {
                    class_raw_name: None,
                    class_name: None,
                },
                page: PageArgs::default(),
            }))
            .await
            .expect("tool result");
        assert_eq!(result.is_error, Some(true));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn parameter_index_is_sent() {
        let mock = MockBackend::start().await;
        mock.respond("rename-method-parameter", 200, r#"{"result":"ok"}"#);
        let server = server_for(&mock);
        server
            .rename_method_parameter(Parameters(RenameMethodParameterRequest {
                method: MethodRequest {
                    class: ClassRequest {
                        class_raw_name: None,
                        class_name: Some("com.example.Main".into()),
                    },
                    method_original_name: None,
                    method_name: Some("login".into()),
                    method_signature: None,
                },
                parameter_index: 1,
                new_name: Some("password".into()),
            }))
            .await
            .expect("tool result");
        let calls = mock.requests();
        assert_eq!(calls[0].param("parameterIndex"), Some("1"));
        assert_eq!(calls[0].param("newName"), Some("password"));
    }
}
