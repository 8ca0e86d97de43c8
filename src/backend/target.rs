//! Class, method and field targets.
//!
//! Callers may identify an entity by several names. Each target lists its
//! candidates in priority order (raw/original name first, then the display
//! name); the first non-empty candidate decides what the result reports as
//! `found_by` and which name the cache key is built from. All supplied names
//! are still forwarded to the backend, which applies the same priority.

use super::Params;
use crate::error::ToolError;
use serde::Serialize;

/// The identifier that won resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Parameter name of the winning candidate, e.g. `class_raw_name`.
    pub found_by: &'static str,
    pub value: String,
    /// Raw/original names survive renames; display names do not.
    #[serde(skip)]
    pub stable: bool,
}

impl Resolved {
    /// Token used inside cache keys. Stable names are tagged so a raw name
    /// never collides with an identical display name.
    pub fn key_token(&self) -> String {
        if self.stable {
            format!("{}={}", self.found_by, self.value)
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    param: &'static str,
    value: Option<&'a str>,
    stable: bool,
}

fn first_present(candidates: &[Candidate<'_>]) -> Option<Resolved> {
    candidates.iter().find_map(|c| {
        let value = c.value.map(str::trim).filter(|v| !v.is_empty())?;
        Some(Resolved {
            found_by: c.param,
            value: value.to_string(),
            stable: c.stable,
        })
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTarget {
    pub raw_name: Option<String>,
    pub name: Option<String>,
}

impl ClassTarget {
    pub fn new(raw_name: Option<String>, name: Option<String>) -> Self {
        Self { raw_name, name }
    }

    fn candidates(&self) -> [Candidate<'_>; 2] {
        [
            Candidate {
                param: "class_raw_name",
                value: self.raw_name.as_deref(),
                stable: true,
            },
            Candidate {
                param: "class_name",
                value: self.name.as_deref(),
                stable: false,
            },
        ]
    }

    pub fn resolve(&self) -> Option<Resolved> {
        first_present(&self.candidates())
    }

    pub fn require(&self) -> Result<Resolved, ToolError> {
        self.resolve()
            .ok_or_else(|| ToolError::invalid("provide class_raw_name or class_name"))
    }

    pub fn params(&self) -> Params {
        let mut params = Params::new();
        params
            .set_opt("class_raw_name", non_empty(&self.raw_name))
            .set_opt("class_name", non_empty(&self.name));
        params
    }
}

/// Resolution outcome for a method or field inside a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMember {
    pub class: Resolved,
    pub member: Resolved,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ResolvedMember {
    pub fn key_tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.class.key_token(), self.member.key_token()];
        if let Some(sig) = &self.signature {
            tokens.push(sig.clone());
        }
        tokens
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodTarget {
    pub class: ClassTarget,
    pub original_name: Option<String>,
    pub name: Option<String>,
    /// Short id such as `onCreate(Landroid/os/Bundle;)V`, for overloads.
    pub signature: Option<String>,
}

impl MethodTarget {
    fn candidates(&self) -> [Candidate<'_>; 2] {
        [
            Candidate {
                param: "method_original_name",
                value: self.original_name.as_deref(),
                stable: true,
            },
            Candidate {
                param: "method_name",
                value: self.name.as_deref(),
                stable: false,
            },
        ]
    }

    pub fn resolve_method(&self) -> Option<Resolved> {
        first_present(&self.candidates())
    }

    pub fn require(&self) -> Result<ResolvedMember, ToolError> {
        let class = self.class.require()?;
        let member = self
            .resolve_method()
            .ok_or_else(|| ToolError::invalid("provide method_original_name or method_name"))?;
        Ok(ResolvedMember {
            class,
            member,
            signature: non_empty(&self.signature).map(str::to_string),
        })
    }

    pub fn params(&self) -> Params {
        let mut params = self.class.params();
        let original = non_empty(&self.original_name);
        let name = non_empty(&self.name);
        params
            .set_opt("method_original_name", original)
            .set_opt("method_name", name)
            // The backend's plain `method` lookup prefers the display name.
            .set_opt("method", name.or(original))
            .set_opt("method_signature", non_empty(&self.signature));
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTarget {
    pub class: ClassTarget,
    pub raw_name: Option<String>,
    pub name: Option<String>,
}

impl FieldTarget {
    fn candidates(&self) -> [Candidate<'_>; 2] {
        [
            Candidate {
                param: "field_raw_name",
                value: self.raw_name.as_deref(),
                stable: true,
            },
            Candidate {
                param: "field_name",
                value: self.name.as_deref(),
                stable: false,
            },
        ]
    }

    pub fn require(&self) -> Result<ResolvedMember, ToolError> {
        let class = self.class.require()?;
        let member = first_present(&self.candidates())
            .ok_or_else(|| ToolError::invalid("provide field_raw_name or field_name"))?;
        Ok(ResolvedMember {
            class,
            member,
            signature: None,
        })
    }

    pub fn params(&self) -> Params {
        let mut params = self.class.params();
        params
            .set_opt("field_raw_name", non_empty(&self.raw_name))
            .set_opt("field_name", non_empty(&self.name));
        params
    }
}
