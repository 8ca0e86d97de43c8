//! Operations behind the MCP tools.
//!
//! [`JadxService`] owns the backend gateway and the page cache. Read
//! operations fetch a payload once and either return it inline or cache it
//! and return one page; mutations flush the cache around the write.

use crate::backend::{
    BackendGateway, ClassTarget, Endpoint, MethodTarget, Params, Payload, Resolved,
    ResolvedMember, Shape,
};
use crate::cache::{CacheKey, CacheSlot, CacheStats, Page, PageCache, Stored, UnitKind, Units};
use crate::config::Config;
use crate::error::ToolError;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// Which page a caller wants, and whether to bypass the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
    pub refresh: bool,
}

impl PageRequest {
    /// Build from raw tool arguments. Indexes and sizes below 1 are rejected.
    pub fn from_args(
        page_index: Option<i64>,
        page_size: Option<i64>,
        refresh: Option<bool>,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            page_index: positive("page_index", page_index)?,
            page_size: positive("page_size", page_size)?,
            refresh: refresh.unwrap_or(false),
        })
    }

    pub fn first() -> Self {
        Self::default()
    }

    pub fn page(page_index: usize) -> Self {
        Self {
            page_index: Some(page_index),
            ..Self::default()
        }
    }

    fn index(&self) -> usize {
        self.page_index.unwrap_or(1)
    }

    /// The first page, or an explicit refresh, always goes to the backend.
    fn wants_fresh(&self) -> bool {
        self.refresh || self.index() == 1
    }
}

/// Validate an optional count argument as `>= 1`.
pub fn positive(name: &str, value: Option<i64>) -> Result<Option<usize>, ToolError> {
    match value {
        None => Ok(None),
        Some(n) if n >= 1 => usize::try_from(n)
            .map(Some)
            .map_err(|_| ToolError::invalid(format!("{name} is too large: {n}"))),
        Some(n) => Err(ToolError::invalid(format!(
            "{name} must be at least 1, got {n}"
        ))),
    }
}

/// Result of a read operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Below the threshold, or not pageable: the full payload.
    Inline {
        total_units: Option<usize>,
        unit: Option<UnitKind>,
        content: Value,
    },
    /// One page of a cached payload.
    Paged(Page),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub outcome: ReadOutcome,
    /// Which identifier resolved each target, e.g. `{"class": "class_name"}`.
    pub found_by: Option<Value>,
}

impl ReadResult {
    fn new(outcome: ReadOutcome) -> Self {
        Self {
            outcome,
            found_by: None,
        }
    }

    fn found_by(mut self, found_by: Option<Value>) -> Self {
        self.found_by = found_by;
        self
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.outcome, ReadOutcome::Paged(_))
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        match &self.outcome {
            ReadOutcome::Inline {
                total_units,
                unit,
                content,
            } => {
                out.insert("cached".into(), Value::Bool(false));
                if let Some(total) = total_units {
                    out.insert("total_units".into(), json!(total));
                }
                if let Some(unit) = unit {
                    out.insert("unit".into(), json!(unit));
                }
                out.insert("content".into(), content.clone());
            }
            ReadOutcome::Paged(page) => {
                out.insert("cached".into(), Value::Bool(true));
                if let Value::Object(fields) = json!(page) {
                    out.extend(fields);
                }
            }
        }
        if let Some(found_by) = &self.found_by {
            out.insert("found_by".into(), found_by.clone());
        }
        Value::Object(out)
    }
}

fn class_found_by(class: &Resolved) -> Value {
    json!({ "class": class.found_by })
}

fn member_found_by(member: &ResolvedMember) -> Value {
    json!({ "class": member.class.found_by, "member": member.member.found_by })
}

#[derive(Clone)]
pub struct JadxService {
    gateway: BackendGateway,
    cache: PageCache,
}

impl JadxService {
    pub fn new(config: &Config) -> Result<Self, ToolError> {
        Ok(Self::with_parts(
            BackendGateway::new(&config.backend)?,
            PageCache::new(config.cache),
        ))
    }

    pub fn with_parts(gateway: BackendGateway, cache: PageCache) -> Self {
        Self { gateway, cache }
    }

    pub fn gateway(&self) -> &BackendGateway {
        &self.gateway
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    fn page_size(&self, request: &PageRequest) -> usize {
        request
            .page_size
            .unwrap_or(self.cache.config().default_page_size)
    }

    /// Paged read of a route that takes no identifying parameters.
    pub async fn read(
        &self,
        endpoint: Endpoint,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        self.paged(endpoint, Params::new(), CacheKey::new(endpoint), request)
            .await
    }

    /// Paged read scoped to one class (source, smali, methods, fields).
    pub async fn read_class(
        &self,
        endpoint: Endpoint,
        class: &ClassTarget,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        let resolved = class.require()?;
        let key = CacheKey::new(endpoint).class(&resolved);
        Ok(self
            .paged(endpoint, class.params(), key, request)
            .await?
            .found_by(Some(class_found_by(&resolved))))
    }

    /// Paged read scoped to one method (parameters, instructions).
    pub async fn read_method(
        &self,
        endpoint: Endpoint,
        method: &MethodTarget,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        let resolved = method.require()?;
        let key = method_key(endpoint, &resolved);
        Ok(self
            .paged(endpoint, method.params(), key, request)
            .await?
            .found_by(Some(member_found_by(&resolved))))
    }

    /// Full method source. Every successful fetch replaces the
    /// last-method-source slot, or empties it when nothing is pageable.
    pub async fn method_source(
        &self,
        method: &MethodTarget,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        let resolved = method.require()?;
        let key = method_key(Endpoint::MethodSource, &resolved);
        let found_by = Some(member_found_by(&resolved));

        if let Some(page) = self.cached_page_for(&key, &request) {
            return Ok(ReadResult::new(ReadOutcome::Paged(page)).found_by(found_by));
        }

        let payload = self
            .gateway
            .fetch_all(Endpoint::MethodSource, &method.params())
            .await?;
        let units = match payload.shape() {
            Shape::Text(text) => Units::from_text(&text),
            Shape::Records(records) => Units::Records(records),
            Shape::Inline(value) => {
                if self.cache.forget(CacheSlot::LastMethodSource) {
                    debug!(key = %key, "Dropped last method source");
                }
                return Ok(ReadResult::new(inline_value(value)).found_by(found_by));
            }
        };
        let total = self
            .cache
            .remember(CacheSlot::LastMethodSource, key.clone(), units.clone());
        debug!(key = %key, total, "Remembered last method source");
        Ok(ReadResult::new(self.store(key, units, &request)).found_by(found_by))
    }

    /// Page through the most recently fetched method source.
    pub fn method_source_page(
        &self,
        page_index: Option<i64>,
        lines_per_page: Option<i64>,
    ) -> Result<Page, ToolError> {
        let page_index = positive("page_index", page_index)?.unwrap_or(1);
        let page_size = positive("lines_per_page", lines_per_page)?
            .unwrap_or(self.cache.config().default_page_size);
        self.cache
            .slot_page(CacheSlot::LastMethodSource, page_index, page_size)
    }

    /// Method search, optionally limited to one class.
    pub async fn search_method(
        &self,
        method: &MethodTarget,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        let query = method
            .resolve_method()
            .ok_or_else(|| ToolError::invalid("provide method_name or method_original_name"))?;
        let class = method.class.resolve();

        let mut key = CacheKey::new(Endpoint::SearchMethod);
        if let Some(class) = &class {
            key = key.class(class);
        }
        key = key.part(query.key_token());
        if let Some(sig) = method.signature.as_deref().filter(|s| !s.trim().is_empty()) {
            key = key.part(sig.trim());
        }

        let mut found_by = json!({ "member": query.found_by });
        if let Some(class) = &class {
            found_by["class"] = json!(class.found_by);
        }
        Ok(self
            .paged(Endpoint::SearchMethod, method.params(), key, request)
            .await?
            .found_by(Some(found_by)))
    }

    pub async fn resource_file(
        &self,
        filename: &str,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ToolError::invalid("filename must not be empty"));
        }
        let mut params = Params::new();
        params.set("name", filename);
        let key = CacheKey::new(Endpoint::ResourceFile).part(filename);
        self.paged(Endpoint::ResourceFile, params, key, request)
            .await
    }

    /// Unpaged read of class metadata.
    pub async fn class_info(&self, class: &ClassTarget) -> Result<Value, ToolError> {
        let resolved = class.require()?;
        let payload = self.gateway.fetch(Endpoint::ClassInfo, &class.params()).await?;
        Ok(with_found_by(payload, class_found_by(&resolved)))
    }

    /// Unpaged read of method metadata.
    pub async fn method_info(&self, method: &MethodTarget) -> Result<Value, ToolError> {
        let resolved = method.require()?;
        let payload = self
            .gateway
            .fetch(Endpoint::MethodInfo, &method.params())
            .await?;
        Ok(with_found_by(payload, member_found_by(&resolved)))
    }

    async fn paged(
        &self,
        endpoint: Endpoint,
        params: Params,
        key: CacheKey,
        request: PageRequest,
    ) -> Result<ReadResult, ToolError> {
        if let Some(page) = self.cached_page_for(&key, &request) {
            return Ok(ReadResult::new(ReadOutcome::Paged(page)));
        }
        let payload = self.gateway.fetch_all(endpoint, &params).await?;
        let outcome = match payload.shape() {
            Shape::Text(text) => self.store(key, Units::from_text(&text), &request),
            Shape::Records(records) => self.store(key, Units::Records(records), &request),
            Shape::Inline(value) => inline_value(value),
        };
        Ok(ReadResult::new(outcome))
    }

    /// Serve a later page from the cache when the entry is still there.
    fn cached_page_for(&self, key: &CacheKey, request: &PageRequest) -> Option<Page> {
        if request.wants_fresh() {
            return None;
        }
        let entry = self.cache.lookup(key.as_str())?;
        debug!(key = %key, page = request.index(), "Serving page from cache");
        Some(entry.page(request.index(), self.page_size(request)))
    }

    fn store(&self, key: CacheKey, units: Units, request: &PageRequest) -> ReadOutcome {
        let threshold = self.cache.config().threshold;
        match self.cache.store_if_large(key, units, threshold) {
            Stored::Cached(entry) => {
                ReadOutcome::Paged(entry.page(request.index(), self.page_size(request)))
            }
            Stored::Inline(units) => ReadOutcome::Inline {
                total_units: Some(units.len()),
                unit: Some(units.kind()),
                content: units.to_content().into_value(),
            },
        }
    }

    pub fn cached_page(
        &self,
        cache_key: &str,
        page_index: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page, ToolError> {
        let page_index = positive("page_index", page_index)?.unwrap_or(1);
        let page_size =
            positive("page_size", page_size)?.unwrap_or(self.cache.config().default_page_size);
        self.cache.get_page(cache_key, page_index, page_size)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop one entry, or everything when no key is given.
    pub fn clear(&self, cache_key: Option<&str>) -> usize {
        match cache_key {
            Some(key) => usize::from(self.cache.invalidate(key)),
            None => self.cache.clear(),
        }
    }

    /// Submit a write. The whole cache is flushed before the write and
    /// again once it returns, whether it succeeded or not.
    pub async fn mutate(&self, endpoint: Endpoint, params: &Params) -> Result<Value, ToolError> {
        let removed = self.cache.clear();
        info!(%endpoint, removed, "Flushed cache before write");

        let result = self.gateway.submit(endpoint, params).await;

        let removed = self.cache.clear();
        info!(%endpoint, removed, ok = result.is_ok(), "Flushed cache after write");
        Ok(result?.into_value())
    }

    pub async fn health(&self) -> Result<Value, ToolError> {
        let status = self.gateway.health().await?.into_value();
        Ok(json!({
            "backend": self.gateway.base_url(),
            "status": status,
        }))
    }
}

fn method_key(endpoint: Endpoint, method: &ResolvedMember) -> CacheKey {
    CacheKey::new(endpoint).parts(method.key_tokens())
}

fn inline_value(value: Value) -> ReadOutcome {
    ReadOutcome::Inline {
        total_units: None,
        unit: None,
        content: value,
    }
}

fn with_found_by(payload: Payload, found_by: Value) -> Value {
    match payload.into_value() {
        Value::Object(mut map) => {
            map.insert("found_by".into(), found_by);
            Value::Object(map)
        }
        other => json!({ "content": other, "found_by": found_by }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PageContent;
    use crate::config::CacheConfig;
    use crate::test_support::MockBackend;
    use std::time::Duration;

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    fn service_for(mock: &MockBackend) -> JadxService {
        JadxService::new(&Config {
            backend: mock.config(),
            cache: CacheConfig::default(),
        })
        .expect("service")
    }

    fn main_class() -> ClassTarget {
        ClassTarget::new(None, Some("com.example.Main".into()))
    }

    fn on_create() -> MethodTarget {
        MethodTarget {
            class: main_class(),
            name: Some("onCreate".into()),
            ..Default::default()
        }
    }

    fn page_of(result: &ReadResult) -> &Page {
        match &result.outcome {
            ReadOutcome::Paged(page) => page,
            ReadOutcome::Inline { .. } => panic!("expected a cached page, got {result:?}"),
        }
    }

    #[test]
    fn page_arguments_are_validated() {
        assert!(PageRequest::from_args(Some(0), None, None).is_err());
        assert!(PageRequest::from_args(None, Some(-3), None).is_err());
        let req = PageRequest::from_args(Some(2), Some(50), Some(true)).expect("valid");
        assert_eq!(req.page_index, Some(2));
        assert!(req.wants_fresh());
        assert!(!PageRequest::page(2).wants_fresh());
    }

    #[tokio::test]
    async fn large_class_source_is_paged_from_one_fetch() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-source", 200, numbered_lines(450));
        let service = service_for(&mock);

        let first = service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("first page");
        let page = page_of(&first);
        assert_eq!(page.cache_key, "get-class-source:com.example.Main");
        assert_eq!(page.total_units, 450);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);
        assert_eq!(first.found_by, Some(json!({"class": "class_name"})));

        let third = service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::page(3))
            .await
            .expect("third page");
        let page = page_of(&third);
        assert!(!page.has_more);
        assert_eq!((page.start_unit, page.end_unit), (Some(401), Some(450)));
        assert_eq!(mock.count("get-class-source"), 1);

        let json = third.to_json();
        assert_eq!(json["cached"], true);
        assert_eq!(json["current_page"], 3);
        assert_eq!(json["total_pages"], 3);

        // The general paging tool sees the same entry.
        let page = service
            .cached_page("get-class-source:com.example.Main", Some(2), None)
            .expect("cached page");
        assert_eq!(page.start_unit, Some(201));
        assert_eq!(mock.count("get-class-source"), 1);
    }

    #[tokio::test]
    async fn first_page_refetches_and_upserts() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-source", 200, numbered_lines(450));
        let service = service_for(&mock);
        service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("first fetch");

        mock.respond("get-class-source", 200, numbered_lines(250));
        let again = service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("second fetch");
        assert_eq!(page_of(&again).total_units, 250);
        assert_eq!(mock.count("get-class-source"), 2);
    }

    #[tokio::test]
    async fn later_page_without_entry_fetches() {
        let mock = MockBackend::start().await;
        mock.respond("get-smali-of-class", 200, numbered_lines(600));
        let service = service_for(&mock);

        let result = service
            .read_class(Endpoint::SmaliOfClass, &main_class(), PageRequest::page(2))
            .await
            .expect("page 2");
        assert_eq!(page_of(&result).start_unit, Some(201));
        assert_eq!(mock.count("get-smali-of-class"), 1);
    }

    #[tokio::test]
    async fn small_record_list_is_inline() {
        let mock = MockBackend::start().await;
        let classes: Vec<String> = (0..50).map(|i| format!("com.example.C{i}")).collect();
        mock.respond("get-all-classes", 200, json!(classes).to_string());
        let service = service_for(&mock);

        let result = service
            .read(Endpoint::AllClasses, PageRequest::first())
            .await
            .expect("classes");
        assert!(!result.is_cached());
        let json = result.to_json();
        assert_eq!(json["cached"], false);
        assert_eq!(json["total_units"], 50);
        assert_eq!(json["unit"], "record");
        assert_eq!(json["content"].as_array().map(Vec::len), Some(50));

        assert!(matches!(
            service.cached_page("get-all-classes", Some(1), None),
            Err(ToolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn object_with_code_field_is_paged_as_text() {
        let mock = MockBackend::start().await;
        mock.respond(
            "get-main-application-classes-code",
            200,
            json!({ "code": numbered_lines(300) }).to_string(),
        );
        let service = service_for(&mock);

        let result = service
            .read(Endpoint::MainApplicationClassesCode, PageRequest::first())
            .await
            .expect("code");
        let page = page_of(&result);
        assert_eq!(page.total_units, 300);
        assert!(matches!(&page.content, PageContent::Text(t) if t.starts_with("line 1\n")));
    }

    #[tokio::test]
    async fn method_source_fills_the_slot_even_when_small() {
        let mock = MockBackend::start().await;
        mock.respond(
            "get-method-source",
            200,
            "protected void onCreate(Bundle b) {\n    super.onCreate(b);\n}\n",
        );
        let service = service_for(&mock);

        assert!(matches!(
            service.method_source_page(None, None),
            Err(ToolError::NotFound(_))
        ));

        let result = service
            .method_source(&on_create(), PageRequest::first())
            .await
            .expect("method source");
        assert!(!result.is_cached());
        assert_eq!(
            result.found_by,
            Some(json!({"class": "class_name", "member": "method_name"}))
        );

        let page = service.method_source_page(Some(1), Some(2)).expect("slot");
        assert_eq!(page.total_units, 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_more);

        let calls = mock.requests();
        assert_eq!(calls[0].param("method"), Some("onCreate"));
        assert_eq!(calls[0].param("class_raw_name"), None);
    }

    #[tokio::test]
    async fn method_source_unwraps_the_nested_code_field() {
        let mock = MockBackend::start().await;
        mock.respond(
            "get-method-source",
            200,
            json!({
                "className": "com.example.Main",
                "methodName": "onCreate",
                "arguments": ["android.os.Bundle"],
                "code": {"content": numbered_lines(240), "auto_paged": false},
            })
            .to_string(),
        );
        let service = service_for(&mock);

        let result = service
            .method_source(&on_create(), PageRequest::first())
            .await
            .expect("method source");
        let page = page_of(&result);
        assert_eq!(page.cache_key, "get-method-source:com.example.Main:onCreate");
        assert_eq!(page.total_units, 240);
        assert!(matches!(&page.content, PageContent::Text(t) if t.starts_with("line 1\n")));

        let slot = service.method_source_page(Some(2), None).expect("slot");
        assert_eq!((slot.start_unit, slot.end_unit), (Some(201), Some(240)));
        assert_eq!(mock.requests()[0].param("page_size"), Some("2147483647"));
    }

    #[tokio::test]
    async fn method_source_without_text_empties_the_slot() {
        let mock = MockBackend::start().await;
        mock.respond("get-method-source", 200, numbered_lines(5));
        let service = service_for(&mock);
        service
            .method_source(&on_create(), PageRequest::first())
            .await
            .expect("first method");
        assert!(service.method_source_page(None, None).is_ok());

        mock.respond(
            "get-method-source",
            200,
            r#"{"className":"com.example.Main","isAbstract":true}"#,
        );
        let result = service
            .method_source(&on_create(), PageRequest::first())
            .await
            .expect("abstract method");
        assert!(!result.is_cached());
        assert!(matches!(
            service.method_source_page(None, None),
            Err(ToolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn auto_paged_class_source_is_stored_whole() {
        let mock = MockBackend::start().await;
        let text = numbered_lines(450);
        let (head, tail) = text.split_at(text.len() / 2);
        let page = |n: u64, chunk: &str| {
            json!({
                "data": [chunk],
                "pagination": {"current_page": n, "total_pages": 2, "page_size": head.len()},
            })
            .to_string()
        };
        mock.respond_page("get-class-source", 1, page(1, head));
        mock.respond_page("get-class-source", 2, page(2, tail));
        let service = service_for(&mock);

        let result = service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("source");
        assert_eq!(page_of(&result).total_units, 450);
        assert_eq!(mock.count("get-class-source"), 2);

        let last = service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::page(3))
            .await
            .expect("last page");
        assert!(matches!(&page_of(&last).content, PageContent::Text(t) if t.ends_with("line 450\n")));
        assert_eq!(mock.count("get-class-source"), 2);
    }

    #[tokio::test]
    async fn comment_flushes_unscoped_entries() {
        let mock = MockBackend::start().await;
        mock.respond(
            "get-current-class",
            200,
            json!({"name": "com.example.Main", "type": "code/java", "content": numbered_lines(450)})
                .to_string(),
        );
        mock.respond("add-class-comment", 200, r#"{"result":"ok"}"#);
        let service = service_for(&mock);

        service
            .read(Endpoint::CurrentClass, PageRequest::first())
            .await
            .expect("current class");
        let mut params = main_class().params();
        params.set("comment", "entry point");
        service
            .mutate(Endpoint::AddClassComment, &params)
            .await
            .expect("comment");

        service
            .read(Endpoint::CurrentClass, PageRequest::page(2))
            .await
            .expect("page 2");
        assert_eq!(mock.count("get-current-class"), 2);
    }

    #[tokio::test]
    async fn comment_by_raw_name_drops_entry_keyed_by_display_name() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-source", 200, numbered_lines(450));
        mock.respond("add-class-comment", 200, r#"{"result":"ok"}"#);
        let service = service_for(&mock);

        service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("source");
        let raw = ClassTarget::new(Some("a.b".into()), None);
        let mut params = raw.params();
        params.set("comment", "obfuscated entry point");
        service
            .mutate(Endpoint::AddClassComment, &params)
            .await
            .expect("comment");

        assert!(matches!(
            service.cached_page("get-class-source:com.example.Main", None, None),
            Err(ToolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_still_flushes() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-source", 200, numbered_lines(450));
        mock.respond("add-class-comment", 500, r#"{"error":"write failed"}"#);
        let service = service_for(&mock);

        service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("fetch");
        let mut params = main_class().params();
        params.set("comment", "entry point");

        let err = service
            .mutate(Endpoint::AddClassComment, &params)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Backend { status: Some(500), .. }));
        assert_eq!(service.stats().entries, 0);
    }

    #[tokio::test]
    async fn reads_during_a_write_are_flushed_when_it_returns() {
        for status in [200, 500] {
            let mock = MockBackend::start().await;
            mock.respond("get-class-source", 200, numbered_lines(450));
            mock.respond("rename-class", status, r#"{"result":"done"}"#);
            mock.hold("rename-class", Duration::from_millis(300));
            let service = service_for(&mock);

            let mut params = main_class().params();
            params.set("newName", "Launcher");
            let write = {
                let service = service.clone();
                tokio::spawn(async move { service.mutate(Endpoint::RenameClass, &params).await })
            };
            tokio::time::sleep(Duration::from_millis(50)).await;

            service
                .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
                .await
                .expect("read while the write is pending");
            assert_eq!(service.stats().entries, 1);

            let outcome = write.await.expect("write task");
            assert_eq!(outcome.is_ok(), status == 200);
            assert_eq!(service.stats().entries, 0, "status {status}");
        }
    }

    #[tokio::test]
    async fn rename_flushes_everything() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-source", 200, numbered_lines(450));
        mock.respond("get-all-classes", 200, json!(vec!["a.B"; 300]).to_string());
        mock.respond("rename-class", 200, r#"{"result":"renamed"}"#);
        let service = service_for(&mock);

        service
            .read_class(Endpoint::ClassSource, &main_class(), PageRequest::first())
            .await
            .expect("source");
        service
            .read(Endpoint::AllClasses, PageRequest::first())
            .await
            .expect("classes");
        assert_eq!(service.stats().entries, 2);

        let mut params = main_class().params();
        params.set("newName", "Launcher");
        let result = service
            .mutate(Endpoint::RenameClass, &params)
            .await
            .expect("rename");
        assert_eq!(result, json!({"result": "renamed"}));
        assert_eq!(service.stats().entries, 0);
        assert_eq!(mock.requests().last().map(|r| r.method.as_str()), Some("POST"));
    }

    #[tokio::test]
    async fn cached_pages_survive_backend_outage() {
        let mock = MockBackend::start().await;
        mock.respond("get-manifest", 200, numbered_lines(220));
        let service = service_for(&mock);
        service
            .read(Endpoint::Manifest, PageRequest::first())
            .await
            .expect("manifest");

        let offline = JadxService::with_parts(
            BackendGateway::new(&MockBackend::unreachable_config()).expect("gateway"),
            service.cache().clone(),
        );
        let page = offline
            .read(Endpoint::Manifest, PageRequest::page(2))
            .await
            .expect("served from cache");
        assert_eq!(page_of(&page).start_unit, Some(201));

        let err = offline.health().await.unwrap_err();
        assert!(matches!(err, ToolError::Transport(_)));
    }

    #[tokio::test]
    async fn search_key_includes_scope_and_query() {
        let mock = MockBackend::start().await;
        let hits: Vec<Value> = (0..210)
            .map(|i| json!({ "class": "com.example.Main", "method": format!("load{i}") }))
            .collect();
        mock.respond("search-method", 200, json!({ "methods": hits }).to_string());
        let service = service_for(&mock);

        let target = MethodTarget {
            class: main_class(),
            name: Some("load".into()),
            ..Default::default()
        };
        let result = service
            .search_method(&target, PageRequest::first())
            .await
            .expect("search");
        assert_eq!(
            page_of(&result).cache_key,
            "search-method:com.example.Main:load"
        );

        let unscoped = MethodTarget {
            name: Some("load".into()),
            ..Default::default()
        };
        let result = service
            .search_method(&unscoped, PageRequest::first())
            .await
            .expect("search");
        assert_eq!(page_of(&result).cache_key, "search-method:load");
    }

    #[tokio::test]
    async fn class_info_reports_found_by() {
        let mock = MockBackend::start().await;
        mock.respond("get-class-info", 200, r#"{"name":"com.example.Main"}"#);
        let service = service_for(&mock);
        let class = ClassTarget::new(Some("a.b".into()), Some("com.example.Main".into()));
        let info = service.class_info(&class).await.expect("info");
        assert_eq!(info["found_by"], json!({"class": "class_raw_name"}));
        assert_eq!(mock.requests()[0].param("class_raw_name"), Some("a.b"));
    }

    #[tokio::test]
    async fn resource_file_requires_a_name() {
        let mock = MockBackend::start().await;
        let service = service_for(&mock);
        assert!(matches!(
            service.resource_file("  ", PageRequest::first()).await,
            Err(ToolError::InvalidArgument(_))
        ));
        assert!(mock.requests().is_empty());
    }
}
