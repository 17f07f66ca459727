//! sharpdom: an editable, semantically annotated object model over C# source.
//!
//! A source file is parsed into a syntax tree, turned into a tree of typed
//! [`Node`]s by a [`FactoryRegistry`], enriched with symbols by a resolve
//! pass, and regenerated as formatted source by the same registry.
//!
//! ```
//! use sharpdom::{build, rebuild, Slot};
//!
//! let mut dom = build("namespace N { class C { int x = 1, y = 2; } }").unwrap();
//! let class = dom.root().root_classes()[0].id();
//! let y = dom.node(class).fields()[1].id();
//! let copy = dom.copy(y).unwrap();
//! dom.set_name(copy, "z").unwrap();
//! dom.add_or_move(class, Slot::Members, copy).unwrap();
//! assert_eq!(rebuild(&dom, copy).unwrap(), "int z = 2;");
//! ```
//!
//! Two models can be compared for equivalent intent, ignoring layout,
//! comments and member order:
//!
//! ```
//! let a = sharpdom::build("class A { int x; void M() { } }").unwrap();
//! let b = sharpdom::build("class A\n{\n    void M() { }\n    int x;\n}").unwrap();
//! assert!(a.same_intent(&b, false));
//! ```

// Model
pub mod container;
pub mod copy;
pub mod dom;
pub mod facet;
pub mod node;
pub mod resolve;
pub mod same_intent;
pub mod view;

// Syntax mapping
pub mod build;
pub mod factory;

// Front door
pub mod cli;
pub mod config;
pub mod output;

pub use build::{build, build_with, build_with_resolver, rebuild, rebuild_with, FragmentKind};
pub use container::Container;
pub use dom::Dom;
pub use facet::{Arity, Facet, Slot};
pub use factory::{BuildContext, Factory, FactoryRegistry, RebuildContext};
pub use node::{
    AccessorKind, AttributeValueStyle, ExtensionNode, MemberFlags, Modifiers, Node, NodeId,
    NodeKind, NodeKindTag, ParameterModifier, Resolution, Value,
};
pub use same_intent::{same_intent, same_intent_opt, same_intent_list_by};
pub use view::NodeRef;

pub use sharpdom_core::annotation::{AnnotationList, AnnotationValue, PublicAnnotation};
pub use sharpdom_core::error::{DomError, OutputErrorCode, ResolveError};
pub use sharpdom_core::types::{AccessModifier, Symbol, SymbolKind};
pub use sharpdom_syntax::FormatOptions;
