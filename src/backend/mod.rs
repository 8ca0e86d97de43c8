//! Access to the JADX plugin's HTTP API.
//!
//! - [`Endpoint`]: every backend route this server uses, read or write.
//! - [`Params`]: ordered request parameters; absent values are never sent.
//! - [`target`]: class/method/field identifier resolution with priority order.
//! - [`gateway`]: the HTTP client.
//! - [`pages`]: the plugin's own page envelope, taken apart and rejoined.

pub mod gateway;
pub mod pages;
pub mod target;

pub use gateway::{BackendGateway, Payload, Shape};
pub use pages::PageUnit;
pub use target::{ClassTarget, FieldTarget, MethodTarget, Resolved, ResolvedMember};

use serde::Serialize;

/// Backend routes, named after the URL path they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum Endpoint {
    Health,
    CurrentClass,
    AllClasses,
    SelectedText,
    ClassSource,
    SmaliOfClass,
    ClassInfo,
    MethodSource,
    MethodInfo,
    SearchMethod,
    Methods,
    Fields,
    MethodParameters,
    MethodInstructions,
    Manifest,
    MainActivity,
    MainApplicationClassesCode,
    MainApplicationClassesNames,
    Strings,
    ResourceFileNames,
    ResourceFile,
    RenameClass,
    RenameMethod,
    RenameField,
    RenameMethodParameter,
    AddClassComment,
    AddMethodComment,
    AddFieldComment,
}

impl Endpoint {
    pub const ALL: &'static [Endpoint] = &[
        Self::Health,
        Self::CurrentClass,
        Self::AllClasses,
        Self::SelectedText,
        Self::ClassSource,
        Self::SmaliOfClass,
        Self::ClassInfo,
        Self::MethodSource,
        Self::MethodInfo,
        Self::SearchMethod,
        Self::Methods,
        Self::Fields,
        Self::MethodParameters,
        Self::MethodInstructions,
        Self::Manifest,
        Self::MainActivity,
        Self::MainApplicationClassesCode,
        Self::MainApplicationClassesNames,
        Self::Strings,
        Self::ResourceFileNames,
        Self::ResourceFile,
        Self::RenameClass,
        Self::RenameMethod,
        Self::RenameField,
        Self::RenameMethodParameter,
        Self::AddClassComment,
        Self::AddMethodComment,
        Self::AddFieldComment,
    ];

    /// Look up a route by its URL path, with or without a leading slash.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_start_matches('/');
        Self::ALL.iter().copied().find(|e| e.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::CurrentClass => "get-current-class",
            Self::AllClasses => "get-all-classes",
            Self::SelectedText => "get-selected-text",
            Self::ClassSource => "get-class-source",
            Self::SmaliOfClass => "get-smali-of-class",
            Self::ClassInfo => "get-class-info",
            Self::MethodSource => "get-method-source",
            Self::MethodInfo => "get-method-info",
            Self::SearchMethod => "search-method",
            Self::Methods => "get-methods",
            Self::Fields => "get-fields",
            Self::MethodParameters => "get-method-parameters",
            Self::MethodInstructions => "get-method-instructions",
            Self::Manifest => "get-manifest",
            Self::MainActivity => "get-main-activity",
            Self::MainApplicationClassesCode => "get-main-application-classes-code",
            Self::MainApplicationClassesNames => "get-main-application-classes-names",
            Self::Strings => "get-strings",
            Self::ResourceFileNames => "get-list-all-resource-files-names",
            Self::ResourceFile => "get-resource-file",
            Self::RenameClass => "rename-class",
            Self::RenameMethod => "rename-method",
            Self::RenameField => "rename-field",
            Self::RenameMethodParameter => "rename-method-parameter",
            Self::AddClassComment => "add-class-comment",
            Self::AddMethodComment => "add-method-comment",
            Self::AddFieldComment => "add-field-comment",
        }
    }

    /// Whether this route changes backend state (POST).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::RenameClass
                | Self::RenameMethod
                | Self::RenameField
                | Self::RenameMethodParameter
                | Self::AddClassComment
                | Self::AddMethodComment
                | Self::AddFieldComment
        )
    }

    /// Routes that accept `page_index`/`page_size` and page their result
    /// themselves, and what they count.
    pub fn paging(&self) -> Option<PageUnit> {
        match self {
            Self::SelectedText
            | Self::ClassSource
            | Self::SmaliOfClass
            | Self::MethodSource
            | Self::Manifest
            | Self::MainActivity
            | Self::ResourceFile => Some(PageUnit::Chars),
            Self::AllClasses
            | Self::SearchMethod
            | Self::MethodInstructions
            | Self::MainApplicationClassesCode
            | Self::ResourceFileNames => Some(PageUnit::Items),
            _ => None,
        }
    }
}

impl From<Endpoint> for &'static str {
    fn from(e: Endpoint) -> Self {
        e.path()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Ordered request parameters. Keys keep insertion order, a key inserted
/// twice keeps its first position and takes the latest value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string value. Empty strings are treated as absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if value.is_empty() {
            return self;
        }
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
        self
    }

    /// Set a value only when present (and non-empty).
    pub fn set_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.set(key, v);
        }
        self
    }

    pub fn set_num(&mut self, key: &str, value: i64) -> &mut Self {
        self.set(key, value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn extend(&mut self, other: &Params) -> &mut Self {
        for (k, v) in &other.pairs {
            self.set(k, v.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}
