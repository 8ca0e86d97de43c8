//! Tool registry for dynamic tool discovery.
//!
//! All tools are exposed in tools/list. The registry backs `tool_catalog`
//! and `tool_help` and fixes the order in which tools are listed.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tool category for grouping related tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Backend health and discovery
    Core,
    /// Class lists, class source, smali, class members
    Classes,
    /// Method source, metadata, search
    Methods,
    /// Manifest and application entry points
    Android,
    /// String and file resources
    Resources,
    /// Cached pages and cache maintenance
    Paging,
    /// Renaming and comments
    Editing,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Classes => "classes",
            Self::Methods => "methods",
            Self::Android => "android",
            Self::Resources => "resources",
            Self::Paging => "paging",
            Self::Editing => "editing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Core => "Backend health check and tool discovery",
            Self::Classes => "List classes; read class source, smali, info, methods and fields",
            Self::Methods => "Read method source, info, parameters and instructions; search methods",
            Self::Android => "AndroidManifest.xml, main activity and Application classes",
            Self::Resources => "String resources and resource files",
            Self::Paging => "Page through cached results and inspect the cache",
            Self::Editing => "Rename classes, methods, fields and parameters; add comments",
        }
    }

    pub fn all() -> &'static [ToolCategory] {
        &[
            Self::Core,
            Self::Classes,
            Self::Methods,
            Self::Android,
            Self::Resources,
            Self::Paging,
            Self::Editing,
        ]
    }
}

impl FromStr for ToolCategory {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "core" | "discovery" => Ok(Self::Core),
            "classes" | "class" => Ok(Self::Classes),
            "methods" | "method" => Ok(Self::Methods),
            "android" | "manifest" | "app" => Ok(Self::Android),
            "resources" | "resource" | "res" => Ok(Self::Resources),
            "paging" | "cache" | "pages" => Ok(Self::Paging),
            "editing" | "edit" | "rename" | "comments" => Ok(Self::Editing),
            _ => Err(()),
        }
    }
}

/// Metadata for a single tool
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub category: ToolCategory,
    /// Short description (1 line, <100 chars) - used in tool_catalog results
    pub short_desc: &'static str,
    /// Full description with usage details - used in tool_help
    pub full_desc: &'static str,
    /// Example invocation (JSON)
    pub example: &'static str,
    /// Keywords for semantic search
    pub keywords: &'static [&'static str],
}

/// Static registry of all tools
pub static TOOL_REGISTRY: &[ToolInfo] = &[
    // === CORE ===
    ToolInfo {
        name: "health",
        category: ToolCategory::Core,
        short_desc: "Check that the JADX plugin is reachable",
        full_desc: "Call the plugin's /health route and report its answer together with the \
                    backend URL. Fails with a transport error when JADX is not running or the \
                    plugin's HTTP server is not started.",
        example: r#"{}"#,
        keywords: &["health", "status", "ping", "alive", "backend", "connect"],
    },
    ToolInfo {
        name: "tool_catalog",
        category: ToolCategory::Core,
        short_desc: "Discover tools by query or category",
        full_desc: "Search the tool registry. With query, ranks tools by name, description and \
                    keyword matches. With category, lists the tools of that category. With \
                    neither, lists the categories.",
        example: r#"{"query": "rename a method"}"#,
        keywords: &["discover", "find", "search", "tools", "help", "catalog"],
    },
    ToolInfo {
        name: "tool_help",
        category: ToolCategory::Core,
        short_desc: "Full documentation for one tool",
        full_desc: "Return the full description, JSON parameter schema, example and keywords \
                    of a tool. Unknown names return close matches.",
        example: r#"{"name": "get_class_source"}"#,
        keywords: &["help", "docs", "schema", "parameters", "usage"],
    },
    // === CLASSES ===
    ToolInfo {
        name: "get_current_class",
        category: ToolCategory::Classes,
        short_desc: "Source of the class open in the JADX window",
        full_desc: "Decompiled source of the class currently selected in the JADX GUI. \
                    Large sources are cached and paged (page_index, page_size).",
        example: r#"{}"#,
        keywords: &["current", "selected", "open", "class", "source", "gui"],
    },
    ToolInfo {
        name: "get_selected_text",
        category: ToolCategory::Classes,
        short_desc: "Text selected in the JADX window",
        full_desc: "The text fragment currently highlighted in the JADX GUI code view. \
                    Paged like any other text result.",
        example: r#"{}"#,
        keywords: &["selected", "selection", "highlight", "text", "gui"],
    },
    ToolInfo {
        name: "get_all_classes",
        category: ToolCategory::Classes,
        short_desc: "List every class in the project",
        full_desc: "All classes of the loaded APK/DEX, including inner and anonymous classes. \
                    The list is cached once and paged by record; ask for page_index=2,3,... to \
                    continue without refetching.",
        example: r#"{"page_index": 1, "page_size": 500}"#,
        keywords: &["classes", "list", "all", "enumerate", "packages", "structure"],
    },
    ToolInfo {
        name: "get_class_source",
        category: ToolCategory::Classes,
        short_desc: "Decompiled Java source of a class",
        full_desc: "Full decompiled Java source of one class. Identify it with class_raw_name \
                    (obfuscated name, survives renames) or class_name (display name); the raw \
                    name wins when both are given and the result reports found_by. Sources of \
                    at least the cache threshold in lines are cached under \
                    get-class-source:<class> and returned one page at a time.",
        example: r#"{"class_name": "com.example.MainActivity", "page_index": 1}"#,
        keywords: &["source", "decompile", "java", "class", "code", "read"],
    },
    ToolInfo {
        name: "get_smali_of_class",
        category: ToolCategory::Classes,
        short_desc: "Smali disassembly of a class",
        full_desc: "Smali (Dalvik assembly) of one class, identified like get_class_source. \
                    Usually much longer than the Java source, so expect several pages.",
        example: r#"{"class_raw_name": "a.b.c", "page_index": 2}"#,
        keywords: &["smali", "dalvik", "bytecode", "disassembly", "class"],
    },
    ToolInfo {
        name: "get_class_info",
        category: ToolCategory::Classes,
        short_desc: "Class metadata (modifiers, super class, interfaces)",
        full_desc: "Metadata of one class: full name, package, access flags, super class and \
                    implemented interfaces. Returned inline, never cached.",
        example: r#"{"class_name": "com.example.MainActivity"}"#,
        keywords: &["info", "metadata", "class", "super", "interfaces", "modifiers"],
    },
    ToolInfo {
        name: "get_methods",
        category: ToolCategory::Classes,
        short_desc: "Methods declared in a class",
        full_desc: "Methods of one class with names, signatures and access flags. Paged by \
                    record when the class is large.",
        example: r#"{"class_name": "com.example.MainActivity"}"#,
        keywords: &["methods", "list", "members", "functions", "class"],
    },
    ToolInfo {
        name: "get_fields",
        category: ToolCategory::Classes,
        short_desc: "Fields declared in a class",
        full_desc: "Fields of one class with names, types and access flags. Paged by record \
                    when the class is large.",
        example: r#"{"class_raw_name": "a.b.c"}"#,
        keywords: &["fields", "members", "variables", "attributes", "class"],
    },
    // === METHODS ===
    ToolInfo {
        name: "get_method_source",
        category: ToolCategory::Methods,
        short_desc: "Decompiled source of one method",
        full_desc: "Decompiled source of one method. Identify the class as in get_class_source \
                    and the method by method_original_name (wins) or method_name; pass \
                    method_signature to pick an overload. Every full fetch also replaces the \
                    source kept for get_method_source_page.",
        example: r#"{"class_name": "com.example.MainActivity", "method_name": "onCreate"}"#,
        keywords: &["method", "source", "decompile", "function", "code"],
    },
    ToolInfo {
        name: "get_method_source_page",
        category: ToolCategory::Methods,
        short_desc: "Page through the last fetched method source",
        full_desc: "Slice the most recently fetched method source into pages of lines_per_page \
                    lines without contacting the backend. Fails with not-found before any \
                    get_method_source call.",
        example: r#"{"page_index": 2, "lines_per_page": 100}"#,
        keywords: &["method", "page", "next", "continue", "source"],
    },
    ToolInfo {
        name: "get_method_info",
        category: ToolCategory::Methods,
        short_desc: "Method metadata (signature, modifiers, types)",
        full_desc: "Signature, access flags, return type and parameter types of one method. \
                    Returned inline with found_by.",
        example: r#"{"class_name": "com.example.Api", "method_name": "login"}"#,
        keywords: &["method", "info", "signature", "metadata", "return", "types"],
    },
    ToolInfo {
        name: "search_method",
        category: ToolCategory::Methods,
        short_desc: "Search methods by name",
        full_desc: "Find methods whose name contains method_name (or method_original_name), \
                    across the project or within one class when class_name/class_raw_name is \
                    given. method_signature narrows to an exact overload. Results are paged.",
        example: r#"{"method_name": "encrypt"}"#,
        keywords: &["search", "find", "method", "name", "lookup", "grep"],
    },
    ToolInfo {
        name: "get_method_parameters",
        category: ToolCategory::Methods,
        short_desc: "Parameters of a method",
        full_desc: "Parameter list of one method with types and names, identified like \
                    get_method_source.",
        example: r#"{"class_name": "com.example.Api", "method_name": "login"}"#,
        keywords: &["parameters", "arguments", "params", "method", "types"],
    },
    ToolInfo {
        name: "get_method_instructions",
        category: ToolCategory::Methods,
        short_desc: "Bytecode instructions of a method",
        full_desc: "Dalvik instruction listing of one method. Long listings are cached and \
                    paged by line.",
        example: r#"{"class_raw_name": "a.b.c", "method_original_name": "a"}"#,
        keywords: &["instructions", "bytecode", "opcodes", "dalvik", "method"],
    },
    // === ANDROID ===
    ToolInfo {
        name: "get_android_manifest",
        category: ToolCategory::Android,
        short_desc: "AndroidManifest.xml",
        full_desc: "Decoded AndroidManifest.xml: package, permissions, components, intent \
                    filters. Paged by line.",
        example: r#"{}"#,
        keywords: &["manifest", "permissions", "activities", "services", "receivers", "xml"],
    },
    ToolInfo {
        name: "get_main_activity",
        category: ToolCategory::Android,
        short_desc: "Source of the launcher activity",
        full_desc: "Decompiled source of the activity declared as MAIN/LAUNCHER in the manifest.",
        example: r#"{}"#,
        keywords: &["main", "activity", "launcher", "entry", "start"],
    },
    ToolInfo {
        name: "get_main_application_classes_code",
        category: ToolCategory::Android,
        short_desc: "Source of the Application and main app classes",
        full_desc: "Decompiled source of the Application class and the classes in the app's \
                    main package. Usually large, so it is cached and paged.",
        example: r#"{"page_index": 1, "page_size": 500}"#,
        keywords: &["application", "main", "classes", "code", "package", "source"],
    },
    ToolInfo {
        name: "get_main_application_classes_names",
        category: ToolCategory::Android,
        short_desc: "Names of the Application and main app classes",
        full_desc: "Names of the Application class and the classes in the app's main package.",
        example: r#"{}"#,
        keywords: &["application", "main", "classes", "names", "package", "list"],
    },
    // === RESOURCES ===
    ToolInfo {
        name: "get_strings",
        category: ToolCategory::Resources,
        short_desc: "String resources (strings.xml)",
        full_desc: "String resources of the app as found in strings.xml. Paged.",
        example: r#"{"page_index": 1}"#,
        keywords: &["strings", "resources", "text", "xml", "localization"],
    },
    ToolInfo {
        name: "get_list_all_resource_files_names",
        category: ToolCategory::Resources,
        short_desc: "Names of every resource file",
        full_desc: "Names of all resource files in the APK (layouts, drawables, raw assets). \
                    Paged by record.",
        example: r#"{}"#,
        keywords: &["resources", "files", "list", "layouts", "assets", "names"],
    },
    ToolInfo {
        name: "get_resource_file",
        category: ToolCategory::Resources,
        short_desc: "Content of one resource file",
        full_desc: "Decoded content of one resource file, cached under \
                    get-resource-file:<filename> when large.",
        example: r#"{"filename": "res/layout/activity_main.xml"}"#,
        keywords: &["resource", "file", "layout", "xml", "content", "read"],
    },
    // === PAGING ===
    ToolInfo {
        name: "get_cached_page",
        category: ToolCategory::Paging,
        short_desc: "Read a page of any cached result",
        full_desc: "Slice the entry stored under cache_key (as returned by any cached read) \
                    into the requested page. Never contacts the backend; fails with not-found \
                    when the entry was evicted or invalidated.",
        example: r#"{"cache_key": "get-class-source:com.example.MainActivity", "page_index": 3}"#,
        keywords: &["page", "cache", "next", "continue", "key"],
    },
    ToolInfo {
        name: "cache_stats",
        category: ToolCategory::Paging,
        short_desc: "Cache statistics and live entries",
        full_desc: "Entry count, capacity, threshold, default page size, hit/miss/eviction/\
                    invalidation counters and a summary of every live entry and slot.",
        example: r#"{}"#,
        keywords: &["cache", "stats", "statistics", "entries", "memory"],
    },
    ToolInfo {
        name: "clear_cache",
        category: ToolCategory::Paging,
        short_desc: "Drop one cached entry or the whole cache",
        full_desc: "Remove the entry stored under cache_key, or every entry and slot when no \
                    key is given. The next read refetches from the backend.",
        example: r#"{"cache_key": "get-all-classes"}"#,
        keywords: &["cache", "clear", "invalidate", "flush", "reset"],
    },
    // === EDITING ===
    ToolInfo {
        name: "rename_class",
        category: ToolCategory::Editing,
        short_desc: "Rename a class",
        full_desc: "Rename one class in the JADX project. An empty or missing new_name resets \
                    the class to its original name. Flushes the whole cache, since \
                    references in other classes change too.",
        example: r#"{"class_raw_name": "a.b.c", "new_name": "LoginActivity"}"#,
        keywords: &["rename", "class", "name", "deobfuscate", "label"],
    },
    ToolInfo {
        name: "rename_method",
        category: ToolCategory::Editing,
        short_desc: "Rename a method",
        full_desc: "Rename one method, identified like get_method_source. An empty new_name \
                    resets it. Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "method_original_name": "a", "new_name": "login"}"#,
        keywords: &["rename", "method", "function", "name", "deobfuscate"],
    },
    ToolInfo {
        name: "rename_field",
        category: ToolCategory::Editing,
        short_desc: "Rename a field",
        full_desc: "Rename one field, identified by field_raw_name (wins) or field_name inside \
                    a class. An empty new_name resets it. Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "field_raw_name": "b", "new_name": "token"}"#,
        keywords: &["rename", "field", "variable", "member", "name"],
    },
    ToolInfo {
        name: "rename_method_parameter",
        category: ToolCategory::Editing,
        short_desc: "Rename a method parameter",
        full_desc: "Rename the parameter at 0-based parameter_index of one method. \
                    Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "method_name": "login", "parameter_index": 0, "new_name": "user"}"#,
        keywords: &["rename", "parameter", "argument", "method", "name"],
    },
    ToolInfo {
        name: "add_class_comment",
        category: ToolCategory::Editing,
        short_desc: "Comment a class",
        full_desc: "Attach a comment to one class. style is JAVADOC (default) or LINE. \
                    Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "comment": "REST client"}"#,
        keywords: &["comment", "annotate", "note", "class", "javadoc"],
    },
    ToolInfo {
        name: "add_method_comment",
        category: ToolCategory::Editing,
        short_desc: "Comment a method",
        full_desc: "Attach a comment to one method. style is JAVADOC (default) or LINE. \
                    Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "method_name": "login", "comment": "Posts credentials"}"#,
        keywords: &["comment", "annotate", "note", "method", "javadoc"],
    },
    ToolInfo {
        name: "add_field_comment",
        category: ToolCategory::Editing,
        short_desc: "Comment a field",
        full_desc: "Attach a comment to one field. style is LINE (default) or JAVADOC. \
                    Flushes the whole cache.",
        example: r#"{"class_name": "com.example.Api", "field_name": "token", "comment": "Bearer token"}"#,
        keywords: &["comment", "annotate", "note", "field", "line"],
    },
];

/// Get all tools
pub fn all_tools() -> impl Iterator<Item = &'static ToolInfo> {
    TOOL_REGISTRY.iter()
}

/// Get tool by name
pub fn get_tool(name: &str) -> Option<&'static ToolInfo> {
    TOOL_REGISTRY.iter().find(|t| t.name == name)
}

/// Get tools by category
pub fn tools_by_category(category: ToolCategory) -> impl Iterator<Item = &'static ToolInfo> {
    TOOL_REGISTRY.iter().filter(move |t| t.category == category)
}

/// Search tools by query (simple keyword matching)
pub fn search_tools(query: &str, limit: usize) -> Vec<(&'static ToolInfo, Vec<&'static str>)> {
    let query_lower = query.to_lowercase();
    let query_words: Vec<&str> = query_lower.split_whitespace().collect();

    let mut results: Vec<(&'static ToolInfo, Vec<&'static str>, usize)> = TOOL_REGISTRY
        .iter()
        .filter_map(|tool| {
            let (score, matched) = score_tool(tool, &query_words);
            (score > 0).then_some((tool, matched, score))
        })
        .collect();

    // Stable sort keeps registry order among equal scores.
    results.sort_by(|a, b| b.2.cmp(&a.2));
    results
        .into_iter()
        .take(limit)
        .map(|(tool, keywords, _)| (tool, keywords))
        .collect()
}

fn score_tool(tool: &'static ToolInfo, words: &[&str]) -> (usize, Vec<&'static str>) {
    let mut matched: Vec<&'static str> = Vec::new();
    let mut score = 0usize;
    let name = tool.name.to_lowercase();
    let desc = tool.short_desc.to_lowercase();

    for word in words {
        if name.contains(word) {
            score += 10;
            if !matched.contains(&"name match") {
                matched.push("name match");
            }
        }
        if desc.contains(word) {
            score += 5;
        }
        for keyword in tool.keywords {
            if keyword.contains(word) || word.contains(keyword) {
                score += 3;
                if !matched.contains(keyword) {
                    matched.push(keyword);
                }
            }
        }
        if tool.category.as_str().contains(word) {
            score += 2;
            if !matched.contains(&tool.category.as_str()) {
                matched.push(tool.category.as_str());
            }
        }
    }
    (score, matched)
}
