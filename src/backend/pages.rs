//! The plugin's own pagination.
//!
//! Routes that page their results answer with
//! `{"data": [...], "pagination": {"current_page", "total_pages", ...}}`,
//! either at the top level or under one field (`get-method-source` nests it
//! under `code`). Text routes page by characters, so `data` holds one string
//! chunk per page; list routes put the items of the page in `data`.

use serde::Serialize;
use serde_json::{Map, Value};

/// Page size that asks a route for its whole result in one page. The
/// plugin parses it as a Java `int`.
pub const FULL_PAGE_SIZE: i64 = i32::MAX as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageUnit {
    /// Pages are character chunks of one text.
    Chars,
    /// Pages are slices of an item list.
    Items,
}

/// One page of a result as the plugin returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub items: Vec<Value>,
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: Option<u64>,
}

impl Envelope {
    /// Find the envelope in a response body, at the top level or one
    /// field down.
    pub fn find(body: &Value) -> Option<Self> {
        let map = body.as_object()?;
        if is_envelope(map) {
            return Some(Self::parse(map));
        }
        map.values()
            .filter_map(Value::as_object)
            .find(|inner| is_envelope(inner))
            .map(Self::parse)
    }

    fn parse(map: &Map<String, Value>) -> Self {
        let pagination = map.get("pagination").and_then(Value::as_object);
        let number = |key: &str| pagination.and_then(|p| p.get(key)).and_then(Value::as_u64);
        // `data`, unless the route renamed it after its item type.
        let items = map
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(Value::as_array))
            .cloned()
            .unwrap_or_default();
        Self {
            items,
            current_page: number("current_page").unwrap_or(1),
            total_pages: number("total_pages").unwrap_or(1),
            page_size: number("page_size").filter(|n| *n > 0),
        }
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    map.get("pagination").is_some_and(Value::is_object)
}

/// Join the items of every page into one value: a single string for
/// character pages, an array for item pages.
pub fn assemble(unit: PageUnit, items: Vec<Value>) -> Value {
    match unit {
        PageUnit::Chars => Value::String(items.iter().filter_map(Value::as_str).collect()),
        PageUnit::Items => Value::Array(items),
    }
}
