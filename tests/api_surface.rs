//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Model
// ============================================================================

use sharpdom::{
    AccessorKind, Arity, AttributeValueStyle, Container, Dom, ExtensionNode, Facet, MemberFlags,
    Modifiers, Node, NodeId, NodeKind, NodeKindTag, NodeRef, ParameterModifier, Resolution, Slot,
    Value,
};

// Equivalence
use sharpdom::{same_intent, same_intent_list_by, same_intent_opt};

// ============================================================================
// Syntax Mapping
// ============================================================================

use sharpdom::{build, build_with, build_with_resolver, rebuild, rebuild_with, FragmentKind};
use sharpdom::{BuildContext, Factory, FactoryRegistry, RebuildContext};
use sharpdom::FormatOptions;

// ============================================================================
// Core Types
// ============================================================================

use sharpdom::{
    AccessModifier, AnnotationList, AnnotationValue, DomError, OutputErrorCode, PublicAnnotation,
    ResolveError, Symbol, SymbolKind,
};
use sharpdom_core::text;
use sharpdom_core::Span;

// Syntax layer
use sharpdom_syntax::{
    normalized_text, parse_compilation_unit, parse_expression, parse_member, parse_statement,
    Diagnostic, SemanticModel, SymbolResolver, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken,
    SyntaxTree, TokenKind,
};

// ============================================================================
// Front Door
// ============================================================================

use sharpdom::cli::{run_compare, run_format, run_outline, run_roundtrip};
use sharpdom::config::{
    CliOverrides, ConfigFile, ConfigSource, ConfigValue, DomConfig, Newline, CONFIG_FILE_NAME,
};
use sharpdom::output::{
    emit_response, CompareResponse, ErrorInfo, ErrorResponse, FormatResponse, Location,
    OutlineNode, OutlineResponse, RoundtripResponse, SCHEMA_VERSION,
};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    // The imports above form the public API contract.
    // Any change that breaks these imports is a breaking change.
    let _ = std::any::type_name::<Dom>();
    let _ = std::any::type_name::<NodeRef<'static>>();
    let _ = std::any::type_name::<FactoryRegistry>();
    let _ = std::any::type_name::<DomError>();
    let _ = std::any::type_name::<DomConfig>();
    let _ = std::any::type_name::<SyntaxTree>();
    let _ = std::any::type_name::<ErrorResponse>();
}

#[test]
fn schema_version_is_stable() {
    // The schema version is part of the public API contract
    assert_eq!(SCHEMA_VERSION, "1");
    assert_eq!(CONFIG_FILE_NAME, "sharpdom.json");
}
