//! Cache keys, entries and page slicing.

use crate::backend::{Endpoint, Resolved};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Deterministic identity of a cached payload: the operation plus its
/// resolved identifying parameters.
///
/// Rendered as `endpoint[:part]*`, e.g. `get-class-source:com.example.Main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    id: String,
}

impl CacheKey {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            id: endpoint.path().to_string(),
        }
    }

    /// Scope the key to a resolved class.
    pub fn class(self, class: &Resolved) -> Self {
        self.part(class.key_token())
    }

    /// Append a qualifying part (member name, signature, filename, query).
    pub fn part(mut self, part: impl AsRef<str>) -> Self {
        self.id.push(':');
        self.id.push_str(part.as_ref());
        self
    }

    pub fn parts<I, S>(self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parts.into_iter().fold(self, |key, p| key.part(p))
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Line,
    Record,
}

/// The paged unit sequence of a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Units {
    /// Lines with their terminators kept.
    Lines(Vec<String>),
    Records(Vec<Value>),
}

impl Units {
    /// Split text into lines, keeping terminators, so that concatenating
    /// the lines gives back `text` exactly.
    pub fn from_text(text: &str) -> Self {
        Units::Lines(text.split_inclusive('\n').map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Units::Lines(lines) => lines.len(),
            Units::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            Units::Lines(_) => UnitKind::Line,
            Units::Records(_) => UnitKind::Record,
        }
    }

    fn slice(&self, start: usize, end: usize) -> PageContent {
        match self {
            Units::Lines(lines) => PageContent::Text(lines[start..end].concat()),
            Units::Records(records) => PageContent::Records(records[start..end].to_vec()),
        }
    }

    /// The whole payload as a single content value.
    pub fn to_content(&self) -> PageContent {
        self.slice(0, self.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageContent {
    Text(String),
    Records(Vec<Value>),
}

impl PageContent {
    pub fn into_value(self) -> Value {
        match self {
            PageContent::Text(text) => Value::String(text),
            PageContent::Records(records) => Value::Array(records),
        }
    }
}

/// An immutable cached payload. Replaced on upsert, never mutated.
#[derive(Debug)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub units: Units,
    /// Logical creation order, used for eviction.
    pub created_at: u64,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, units: Units, created_at: u64) -> Self {
        Self {
            key,
            units,
            created_at,
            cached_at: Utc::now(),
        }
    }

    pub fn total_units(&self) -> usize {
        self.units.len()
    }

    /// Slice page `page_index` (1-based). Callers validate that both
    /// arguments are at least 1.
    pub fn page(&self, page_index: usize, page_size: usize) -> Page {
        let total_units = self.total_units();
        let total_pages = total_units.div_ceil(page_size);
        let start = page_index
            .saturating_sub(1)
            .saturating_mul(page_size)
            .min(total_units);
        let end = start.saturating_add(page_size).min(total_units);
        let (start_unit, end_unit) = if start < end {
            (Some(start + 1), Some(end))
        } else {
            (None, None)
        };
        Page {
            cache_key: self.key.to_string(),
            page_index,
            page_size,
            total_pages,
            total_units,
            start_unit,
            end_unit,
            has_more: end < total_units,
            unit: self.units.kind(),
            content: self.units.slice(start, end),
        }
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            key: self.key.to_string(),
            unit: self.units.kind(),
            total_units: self.total_units(),
            cached_at: self.cached_at,
        }
    }
}

/// One page of a cached payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub cache_key: String,
    #[serde(rename = "current_page")]
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_units: usize,
    /// 1-based inclusive bounds of the returned units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_unit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_unit: Option<usize>,
    pub has_more: bool,
    pub unit: UnitKind,
    pub content: PageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub unit: UnitKind,
    pub total_units: usize,
    pub cached_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    fn text_entry(text: &str) -> CacheEntry {
        CacheEntry::new(
            CacheKey::new(Endpoint::ClassSource).part("com.example.Main"),
            Units::from_text(text),
            1,
        )
    }

    #[test]
    fn key_rendering() {
        let class = Resolved {
            found_by: "class_name",
            value: "com.example.Main".into(),
            stable: false,
        };
        let key = CacheKey::new(Endpoint::ClassSource).class(&class);
        assert_eq!(key.as_str(), "get-class-source:com.example.Main");

        let raw = Resolved {
            found_by: "class_raw_name",
            value: "a.b".into(),
            stable: true,
        };
        let key = CacheKey::new(Endpoint::MethodSource)
            .class(&raw)
            .parts(["onCreate", "onCreate(Landroid/os/Bundle;)V"]);
        assert_eq!(
            key.to_string(),
            "get-method-source:class_raw_name=a.b:onCreate:onCreate(Landroid/os/Bundle;)V"
        );
    }

    #[test]
    fn lines_keep_terminators() {
        let units = Units::from_text("a\r\nb\n\nc");
        assert_eq!(
            units,
            Units::Lines(vec!["a\r\n".into(), "b\n".into(), "\n".into(), "c".into()])
        );
        assert!(Units::from_text("").is_empty());
    }

    #[test]
    fn pages_reconstruct_the_payload() {
        let text = format!("{}tail without newline", numbered_lines(37));
        let entry = text_entry(&text);
        for page_size in [1, 2, 5, 10, 37, 38, 100] {
            let total_pages = entry.page(1, page_size).total_pages;
            let rebuilt: String = (1..=total_pages)
                .map(|i| match entry.page(i, page_size).content {
                    PageContent::Text(t) => t,
                    PageContent::Records(_) => unreachable!(),
                })
                .collect();
            assert_eq!(rebuilt, text, "page_size {page_size}");
        }
    }

    #[test]
    fn four_hundred_fifty_lines_in_pages_of_two_hundred() {
        let entry = text_entry(&numbered_lines(450));

        let first = entry.page(1, 200);
        assert_eq!(first.total_units, 450);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_more);
        assert_eq!((first.start_unit, first.end_unit), (Some(1), Some(200)));

        let last = entry.page(3, 200);
        assert!(!last.has_more);
        assert_eq!((last.start_unit, last.end_unit), (Some(401), Some(450)));
        match last.content {
            PageContent::Text(t) => {
                assert!(t.starts_with("line 401\n"));
                assert!(t.ends_with("line 450\n"));
            }
            PageContent::Records(_) => panic!("expected text"),
        }
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let entry = text_entry(&numbered_lines(450));
        let page = entry.page(4, 200);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_more);
        assert_eq!(page.start_unit, None);
        assert_eq!(page.content, PageContent::Text(String::new()));

        let far = entry.page(usize::MAX, usize::MAX);
        assert_eq!(far.total_pages, 1);
        assert!(!far.has_more);
    }

    #[test]
    fn record_pages() {
        let records: Vec<Value> = (0..5).map(|i| json!({ "name": format!("m{i}") })).collect();
        let entry = CacheEntry::new(
            CacheKey::new(Endpoint::Methods).part("a.B"),
            Units::Records(records),
            1,
        );
        let page = entry.page(2, 2);
        assert_eq!(page.unit, UnitKind::Record);
        assert_eq!(
            page.content,
            PageContent::Records(vec![json!({"name": "m2"}), json!({"name": "m3"})])
        );
        let json = serde_json::to_value(&page).expect("serialize");
        assert_eq!(json["current_page"], 2);
        assert_eq!(json["unit"], "record");
    }
}
