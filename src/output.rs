//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Always JSON:** all CLI output on stdout is valid JSON
//! 2. **Status first:** every response has `status` as its first field
//! 3. **Deterministic:** same input gives identical bytes (source order,
//!    stable field order)
//! 4. **Versioned:** `schema_version` lets consumers detect changes

use std::io::{self, Write};

use serde::Serialize;

use sharpdom_core::error::{DomError, OutputErrorCode};

use crate::facet::Slot;
use crate::node::NodeKindTag;
use crate::view::NodeRef;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Errors
// ============================================================================

/// Position in the input file, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit code.
    pub code: u8,
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    pub fn from_error(err: &DomError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let (details, location) = match err {
            DomError::UnsupportedConstruct {
                kind,
                line,
                col,
                snippet,
            } => (
                Some(serde_json::json!({ "kind": kind, "snippet": snippet })),
                Some(Location {
                    line: *line,
                    col: *col,
                }),
            ),
            DomError::MalformedInput { factory, .. } => {
                (Some(serde_json::json!({ "factory": factory })), None)
            }
            DomError::MissingCloneSupport { kind } | DomError::UnsupportedNode { kind } => {
                (Some(serde_json::json!({ "kind": kind })), None)
            }
            DomError::FileNotFound { path } => (Some(serde_json::json!({ "path": path })), None),
            _ => (None, None),
        };
        ErrorInfo {
            code,
            message: err.to_string(),
            details,
            location,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &DomError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }

    /// Create an error response with just code and message.
    pub fn new(code: OutputErrorCode, message: impl Into<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo {
                code: code.code(),
                message: message.into(),
                details: None,
                location: None,
            },
        }
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// Response for `sharpdom compare`.
#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub left: String,
    pub right: String,
    pub include_annotations: bool,
    pub same_intent: bool,
}

impl CompareResponse {
    pub fn new(left: impl Into<String>, right: impl Into<String>, include_annotations: bool, same_intent: bool) -> Self {
        CompareResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            left: left.into(),
            right: right.into(),
            include_annotations,
            same_intent,
        }
    }
}

/// Response for `sharpdom roundtrip`.
#[derive(Debug, Clone, Serialize)]
pub struct RoundtripResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Whether the rebuilt text builds a model equivalent to the original.
    pub same_intent: bool,
    pub has_syntax_errors: bool,
    /// Declarations whose symbol could not be resolved.
    pub degraded: usize,
    pub text: String,
}

impl RoundtripResponse {
    pub fn new(file: impl Into<String>, same_intent: bool, has_syntax_errors: bool, degraded: usize, text: String) -> Self {
        RoundtripResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            same_intent,
            has_syntax_errors,
            degraded,
            text,
        }
    }
}

/// Response for `sharpdom format`.
#[derive(Debug, Clone, Serialize)]
pub struct FormatResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub text: String,
}

impl FormatResponse {
    pub fn new(file: impl Into<String>, text: String) -> Self {
        FormatResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            text,
        }
    }
}

/// One declaration in an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub kind: String,
    pub name: String,
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Declarations below `node`, in source order. Statement bodies and
    /// expressions are left out.
    pub fn children_of(node: NodeRef<'_>) -> Vec<OutlineNode> {
        let mut out = Vec::new();
        for slot in [Slot::Usings, Slot::Members, Slot::Accessors] {
            for child in node.children(slot) {
                if is_outlined(child.tag()) {
                    out.push(OutlineNode::from_node(child));
                }
            }
        }
        out
    }

    pub fn from_node(node: NodeRef<'_>) -> Self {
        OutlineNode {
            kind: node.kind_name().to_string(),
            name: node.name(),
            qualified_name: node.qualified_name(),
            access: node.access_modifier().map(|a| a.to_string()),
            return_type: node.return_type().map(|t| t.name()),
            degraded: node.is_degraded(),
            children: OutlineNode::children_of(node),
        }
    }
}

fn is_outlined(tag: NodeKindTag) -> bool {
    tag.is_type()
        || matches!(
            tag,
            NodeKindTag::Using
                | NodeKindTag::Namespace
                | NodeKindTag::EnumMember
                | NodeKindTag::Method
                | NodeKindTag::Property
                | NodeKindTag::Accessor
                | NodeKindTag::Field
        )
}

/// Response for `sharpdom outline`.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub has_syntax_errors: bool,
    pub declarations: Vec<OutlineNode>,
}

impl OutlineResponse {
    pub fn new(file: impl Into<String>, has_syntax_errors: bool, declarations: Vec<OutlineNode>) -> Self {
        OutlineResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            has_syntax_errors,
            declarations,
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;

    mod error_tests {
        use super::*;

        #[test]
        fn unsupported_construct_carries_location() {
            let err = DomError::UnsupportedConstruct {
                kind: "ThrowStatement".to_string(),
                line: 4,
                col: 9,
                snippet: "throw e;".to_string(),
            };
            let info = ErrorInfo::from_error(&err);
            assert_eq!(info.code, 3);
            assert_eq!(info.location, Some(Location { line: 4, col: 9 }));
            let json = serde_json::to_value(&info).unwrap();
            assert_eq!(json["details"]["kind"], "ThrowStatement");
        }

        #[test]
        fn error_response_envelope() {
            let response = ErrorResponse::from_error(&DomError::file_not_found("a.cs"));
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["status"], "error");
            assert_eq!(json["schema_version"], SCHEMA_VERSION);
            assert_eq!(json["error"]["code"], 3);
            assert_eq!(json["error"]["details"]["path"], "a.cs");
            assert!(json["error"].get("location").is_none());
        }
    }

    mod outline_tests {
        use super::*;

        #[test]
        fn declarations_nest_in_source_order() {
            let dom = build(
                "using System;\nnamespace N { public class C { int x; public string Name { get; set; } void M() { int y = 1; } } }",
            )
            .unwrap();
            let outline = OutlineNode::children_of(dom.root());
            assert_eq!(outline[0].kind, "Using");
            let class = &outline[1].children[0];
            assert_eq!(class.qualified_name, "N.C");
            assert_eq!(class.access.as_deref(), Some("public"));
            let kinds: Vec<&str> = class.children.iter().map(|c| c.kind.as_str()).collect();
            assert_eq!(kinds, vec!["Field", "Property", "Method"]);
            assert_eq!(class.children[1].children.len(), 2);
            assert!(class.children[2].children.is_empty());
            assert_eq!(class.children[2].return_type.as_deref(), Some("void"));
        }

        #[test]
        fn emitted_json_ends_with_newline() {
            let response = FormatResponse::new("a.cs", "class C\n{\n}\n".to_string());
            let mut out = Vec::new();
            emit_response(&response, &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.starts_with("{\n  \"status\": \"ok\""));
            assert!(text.ends_with("}\n"));
        }
    }
}
