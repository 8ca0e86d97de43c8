use jadx_mcp::{ToolCategory, ToolInfo, TOOL_REGISTRY};
use std::collections::HashMap;
use std::fmt::Write as _;

fn category_title(cat: ToolCategory) -> &'static str {
    match cat {
        ToolCategory::Core => "Core",
        ToolCategory::Classes => "Classes",
        ToolCategory::Methods => "Methods",
        ToolCategory::Android => "Android",
        ToolCategory::Resources => "Resources",
        ToolCategory::Paging => "Paging",
        ToolCategory::Editing => "Editing",
    }
}

fn render() -> String {
    let mut groups: HashMap<ToolCategory, Vec<&ToolInfo>> = HashMap::new();
    for tool in TOOL_REGISTRY {
        groups.entry(tool.category).or_default().push(tool);
    }

    let mut out = String::new();
    let _ = writeln!(out, "# Tools\n");
    let _ = writeln!(
        out,
        "> Auto-generated from `src/tool_registry.rs`. Do not edit by hand."
    );
    let _ = writeln!(
        out,
        "> Regenerate with: `cargo run --bin gen_tools_doc -- docs/TOOLS.md`.\n"
    );

    let _ = writeln!(out, "## Discovery Workflow\n");
    let _ = writeln!(
        out,
        "- `tools/list` returns the full tool set (currently {} tools)",
        TOOL_REGISTRY.len()
    );
    let _ = writeln!(out, "- `tool_catalog(query=...)` searches all tools by intent");
    let _ = writeln!(out, "- `tool_help(name=...)` returns full documentation and schema");
    let _ = writeln!(out);

    for &cat in ToolCategory::all() {
        let Some(tools) = groups.get(&cat) else {
            continue;
        };
        let _ = writeln!(out, "## {} (`{}`)\n", category_title(cat), cat.as_str());
        let _ = writeln!(out, "{}", cat.description());
        let _ = writeln!(out, "\n| Tool | Description |");
        let _ = writeln!(out, "|------|-------------|");
        for tool in tools {
            let _ = writeln!(out, "| `{}` | {} |", tool.name, tool.short_desc);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Paging\n");
    let _ = writeln!(
        out,
        "- Results with at least `--cache-threshold` lines or records (default 200) are cached"
    );
    let _ = writeln!(
        out,
        "- Cached responses carry `cache_key`, `current_page`, `total_pages` and `has_more`"
    );
    let _ = writeln!(
        out,
        "- Page 1 always refetches; later pages are served from the cache via `get_cached_page`"
    );
    let _ = writeln!(
        out,
        "- Renames and comments drop every cached entry, before the write and again after it"
    );
    out
}

fn main() {
    let out = render();
    match std::env::args().nth(1) {
        Some(path) => {
            if let Err(err) = std::fs::write(&path, out) {
                eprintln!("failed to write {path}: {err}");
                std::process::exit(1);
            }
        }
        None => print!("{out}"),
    }
}
