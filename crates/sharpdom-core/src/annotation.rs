//! Public annotations: caller-defined tags carried in source comments.
//!
//! An annotation is a line comment of the form
//!
//! ```text
//! //[[ name ]]
//! //[[ name(value) ]]
//! //[[ name(key: value, other = 42) ]]
//! ```
//!
//! placed directly before a declaration or statement. Values are quoted
//! strings, integers, `true`/`false`, or bare words (kept as strings). A
//! single positional value is stored under the annotation's own name, so
//! `//[[ Owner("Fred") ]]` and `//[[ Owner(Owner: "Fred") ]]` are the same
//! annotation.
//!
//! ## Design
//!
//! Annotations never influence the syntax the model regenerates beyond
//! re-emitting the same comment, and equivalence checks compare them only on
//! request. Comparison is order-insensitive for both annotations and their
//! values.

use std::fmt;

use serde::{Deserialize, Serialize};
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat, terminated};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

// ============================================================================
// Types
// ============================================================================

/// Scalar value of an annotation argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Bool(b) => write!(f, "{}", b),
            AnnotationValue::Int(n) => write!(f, "{}", n),
            AnnotationValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::Str(value.to_string())
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<i32> for AnnotationValue {
    fn from(value: i32) -> Self {
        AnnotationValue::Int(i64::from(value))
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

/// A single named annotation with keyed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAnnotation {
    name: String,
    values: Vec<(String, AnnotationValue)>,
}

impl PublicAnnotation {
    pub fn new(name: impl Into<String>) -> Self {
        PublicAnnotation {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Builder-style value setter; replaces an existing value for `key`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.set_value(key, value);
        self
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The positional value, stored under the annotation's own name.
    pub fn default_value(&self) -> Option<&AnnotationValue> {
        self.value(&self.name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }

    /// Equal names and equal value sets, ignoring value order.
    pub fn same_intent(&self, other: &PublicAnnotation) -> bool {
        self.name == other.name
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(key, value)| other.value(key) == Some(value))
    }

    /// Render as the comment form this annotation was parsed from.
    pub fn to_comment(&self) -> String {
        if self.values.is_empty() {
            return format!("//[[ {} ]]", self.name);
        }
        if let [(key, value)] = self.values.as_slice() {
            if *key == self.name {
                return format!("//[[ {}({}) ]]", self.name, value);
            }
        }
        let args: Vec<String> = self
            .values
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        format!("//[[ {}({}) ]]", self.name, args.join(", "))
    }
}

/// The annotations attached to one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationList {
    items: Vec<PublicAnnotation>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation, replacing any existing one with the same name.
    pub fn add(&mut self, annotation: PublicAnnotation) {
        match self.items.iter_mut().find(|a| a.name == annotation.name) {
            Some(existing) => *existing = annotation,
            None => self.items.push(annotation),
        }
    }

    /// Remove the annotation called `name`, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<PublicAnnotation> {
        let index = self.items.iter().position(|a| a.name == name)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&PublicAnnotation> {
        self.items.iter().find(|a| a.name == name)
    }

    /// Look up `key` on annotation `name`.
    pub fn value(&self, name: &str, key: &str) -> Option<&AnnotationValue> {
        self.get(name).and_then(|a| a.value(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublicAnnotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Same annotations by name, each with the same values, in any order.
    pub fn same_intent(&self, other: &AnnotationList) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .all(|a| other.get(&a.name).is_some_and(|b| a.same_intent(b)))
    }

    /// Parse every annotation comment in `comments`, ignoring other comments.
    pub fn from_comments<'a>(comments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = AnnotationList::new();
        for comment in comments {
            if let Some(annotation) = parse_annotation_comment(comment) {
                list.add(annotation);
            }
        }
        list
    }
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

/// Parse a `//[[ ... ]]` comment. Returns `None` for any other comment.
pub fn parse_annotation_comment(comment: &str) -> Option<PublicAnnotation> {
    parse_annotation.parse(comment.trim_end()).ok()
}

fn parse_annotation(input: &mut &str) -> ModalResult<PublicAnnotation> {
    ("//", multispace0, "[[", multispace0).parse_next(input)?;
    let name = parse_word(input)?;
    let _ = multispace0.parse_next(input)?;
    let args = opt(delimited(
        ('(', multispace0),
        parse_arguments,
        (multispace0, ')'),
    ))
    .parse_next(input)?;
    (multispace0, "]]", multispace0).parse_next(input)?;

    let mut annotation = PublicAnnotation::new(name.clone());
    for (key, value) in args.unwrap_or_default() {
        annotation.set_value(key.unwrap_or_else(|| name.clone()), value);
    }
    Ok(annotation)
}

type Argument = (Option<String>, AnnotationValue);

fn parse_arguments(input: &mut &str) -> ModalResult<Vec<Argument>> {
    let Some(first) = opt(parse_argument).parse_next(input)? else {
        return Ok(Vec::new());
    };
    let rest: Vec<Argument> =
        repeat(0.., preceded((multispace0, ',', multispace0), parse_argument)).parse_next(input)?;
    let mut all = vec![first];
    all.extend(rest);
    Ok(all)
}

fn parse_argument(input: &mut &str) -> ModalResult<Argument> {
    let key = opt(terminated(
        parse_word,
        (multispace0, alt((':', '=')), multispace0),
    ))
    .parse_next(input)?;
    let value = parse_value(input)?;
    Ok((key, value))
}

fn parse_value(input: &mut &str) -> ModalResult<AnnotationValue> {
    alt((
        parse_quoted.map(AnnotationValue::Str),
        parse_integer.map(AnnotationValue::Int),
        parse_word.map(|word| match word.as_str() {
            "true" => AnnotationValue::Bool(true),
            "false" => AnnotationValue::Bool(false),
            _ => AnnotationValue::Str(word),
        }),
    ))
    .parse_next(input)
}

fn parse_quoted(input: &mut &str) -> ModalResult<String> {
    delimited('"', take_till(0.., |c| c == '"'), '"')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn parse_integer(input: &mut &str) -> ModalResult<i64> {
    let digits: &str = (opt('-'), take_while(1.., |c: char| c.is_ascii_digit()))
        .take()
        .parse_next(input)?;
    digits.parse::<i64>().map_err(|_| ErrMode::from_input(input))
}

fn parse_word(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;

        #[test]
        fn bare_annotation() {
            let a = parse_annotation_comment("//[[ Serializable ]]").unwrap();
            assert_eq!(a.name(), "Serializable");
            assert_eq!(a.keys().count(), 0);
        }

        #[test]
        fn positional_value_uses_annotation_name() {
            let a = parse_annotation_comment("//[[ Owner(\"Fred\") ]]").unwrap();
            assert_eq!(a.default_value(), Some(&AnnotationValue::Str("Fred".into())));
            assert_eq!(a.value("Owner"), Some(&AnnotationValue::Str("Fred".into())));
        }

        #[test]
        fn keyed_values_of_each_type() {
            let a = parse_annotation_comment(
                "//[[ kad_Test1(val1: \"Fred\", val2 = 40, flag: true, mode: Fast) ]]",
            )
            .unwrap();
            assert_eq!(a.name(), "kad_Test1");
            assert_eq!(a.value("val1"), Some(&AnnotationValue::Str("Fred".into())));
            assert_eq!(a.value("val2"), Some(&AnnotationValue::Int(40)));
            assert_eq!(a.value("flag"), Some(&AnnotationValue::Bool(true)));
            assert_eq!(a.value("mode"), Some(&AnnotationValue::Str("Fast".into())));
        }

        #[test]
        fn negative_integer() {
            let a = parse_annotation_comment("//[[ Offset(-3) ]]").unwrap();
            assert_eq!(a.default_value(), Some(&AnnotationValue::Int(-3)));
        }

        #[test]
        fn tolerates_spacing() {
            let a = parse_annotation_comment("//   [[Tag( a : 1 ,b:2 )]]  ").unwrap();
            assert_eq!(a.value("a"), Some(&AnnotationValue::Int(1)));
            assert_eq!(a.value("b"), Some(&AnnotationValue::Int(2)));
        }

        #[test]
        fn ordinary_comments_are_not_annotations() {
            assert!(parse_annotation_comment("// just a note").is_none());
            assert!(parse_annotation_comment("//[[ unterminated").is_none());
            assert!(parse_annotation_comment("/* [[ Block ]] */").is_none());
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn comment_forms() {
            assert_eq!(PublicAnnotation::new("A").to_comment(), "//[[ A ]]");
            assert_eq!(
                PublicAnnotation::new("A").with_value("A", 3).to_comment(),
                "//[[ A(3) ]]"
            );
            assert_eq!(
                PublicAnnotation::new("A")
                    .with_value("x", "y")
                    .with_value("n", false)
                    .to_comment(),
                "//[[ A(x: \"y\", n: false) ]]"
            );
        }

        #[test]
        fn rendered_comment_parses_back() {
            let a = PublicAnnotation::new("Tag")
                .with_value("k", "v")
                .with_value("n", 7);
            assert_eq!(parse_annotation_comment(&a.to_comment()), Some(a));
        }
    }

    mod equivalence {
        use super::*;

        #[test]
        fn value_order_is_irrelevant() {
            let a = PublicAnnotation::new("T").with_value("x", 1).with_value("y", 2);
            let b = PublicAnnotation::new("T").with_value("y", 2).with_value("x", 1);
            assert!(a.same_intent(&b));
        }

        #[test]
        fn list_order_is_irrelevant_but_content_is_not() {
            let list = AnnotationList::from_comments(["//[[ A ]]", "//[[ B(1) ]]"]);
            let reversed = AnnotationList::from_comments(["//[[ B(1) ]]", "//[[ A ]]"]);
            let changed = AnnotationList::from_comments(["//[[ B(2) ]]", "//[[ A ]]"]);
            assert!(list.same_intent(&reversed));
            assert!(!list.same_intent(&changed));
        }

        #[test]
        fn add_replaces_same_name() {
            let mut list = AnnotationList::new();
            list.add(PublicAnnotation::new("A").with_value("A", 1));
            list.add(PublicAnnotation::new("A").with_value("A", 2));
            assert_eq!(list.len(), 1);
            assert_eq!(list.value("A", "A"), Some(&AnnotationValue::Int(2)));
            assert!(list.remove("A").is_some());
            assert!(list.is_empty());
        }
    }
}
