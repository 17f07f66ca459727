// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for the C# subset.
//!
//! Produces a flat token vector that always ends with an end-of-file token.
//! Whitespace, newlines and comments become leading trivia of the next token.
//! Characters that start no known token become single-character `Unknown`
//! tokens with a diagnostic, so tokenizing never fails.
//!
//! `>>` is deliberately not a token: the parser sees two `>` tokens, which
//! keeps nested generic argument lists (`List<List<int>>`) unambiguous.

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};
use winnow::ModalResult;

use sharpdom_core::types::Span;

use crate::kind::{is_keyword, TokenKind};
use crate::tree::{Diagnostic, SyntaxToken, Trivia};

/// Punctuators and operators, longest first.
const PUNCTUATION: &[&str] = &[
    "<<=", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "++", "--", "=>", "??", "::", "<<", "{", "}", "(", ")", "[", "]", ";", ",", ".", ":", "?",
    "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "@",
];

/// Tokenize `source`, returning the tokens and any lexical diagnostics.
pub fn tokenize(source: &str) -> (Vec<SyntaxToken>, Vec<Diagnostic>) {
    let mut input = source;
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    loop {
        let leading: Vec<Trivia> = repeat(0.., lex_trivia)
            .parse_next(&mut input)
            .unwrap_or_default();
        for trivia in &leading {
            if let Trivia::BlockComment(text) = trivia {
                if !text.ends_with("*/") || text.len() < 4 {
                    let end = source.len() - input.len();
                    diagnostics.push(Diagnostic::new(
                        "unterminated block comment",
                        Span::new(end - text.len(), end),
                    ));
                }
            }
        }

        let offset = source.len() - input.len();
        if input.is_empty() {
            tokens.push(SyntaxToken::lexed(TokenKind::EndOfFile, "", leading, offset));
            break;
        }

        match lex_token(&mut input) {
            Ok((kind, text)) => {
                if matches!(kind, TokenKind::StringLiteral | TokenKind::CharLiteral)
                    && !is_terminated_literal(text)
                {
                    diagnostics.push(Diagnostic::new(
                        "unterminated literal",
                        Span::new(offset, offset + text.len()),
                    ));
                }
                tokens.push(SyntaxToken::lexed(kind, text, leading, offset));
            }
            Err(_) => {
                let ch = input.chars().next().map(char::len_utf8).unwrap_or(1);
                let (text, rest) = input.split_at(ch);
                diagnostics.push(Diagnostic::new(
                    format!("unexpected character `{}`", text),
                    Span::new(offset, offset + ch),
                ));
                tokens.push(SyntaxToken::lexed(TokenKind::Unknown, text, leading, offset));
                input = rest;
            }
        }
    }

    (tokens, diagnostics)
}

/// A literal is terminated when an unescaped copy of its opening quote
/// follows the opening one.
fn is_terminated_literal(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return false;
    };
    let mut escaped = false;
    for c in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return true;
        }
    }
    false
}

// ============================================================================
// Trivia
// ============================================================================

fn lex_trivia(input: &mut &str) -> ModalResult<Trivia> {
    alt((
        take_while(1.., |c: char| c == ' ' || c == '\t' || c == '\u{feff}')
            .map(|s: &str| Trivia::Whitespace(s.to_string())),
        alt(("\r\n", "\n", "\r")).map(|s: &str| Trivia::Newline(s.to_string())),
        ("//", take_till(0.., |c| c == '\n' || c == '\r'))
            .take()
            .map(|s: &str| Trivia::LineComment(s.to_string())),
        lex_block_comment.map(|s: &str| Trivia::BlockComment(s.to_string())),
    ))
    .parse_next(input)
}

/// `/* ... */`, or everything to end of input when unterminated.
fn lex_block_comment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    if !input.starts_with("/*") {
        return Err(ErrMode::from_input(input));
    }
    let end = input[2..].find("*/").map(|i| i + 4).unwrap_or(input.len());
    let (comment, rest) = input.split_at(end);
    *input = rest;
    Ok(comment)
}

// ============================================================================
// Tokens
// ============================================================================

fn lex_token<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    alt((lex_word, lex_number, lex_string, lex_char, lex_punctuation)).parse_next(input)
}

fn lex_word<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    let word: &str = (
        opt('@'),
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    let kind = if is_keyword(word) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    };
    Ok((kind, word))
}

fn lex_number<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    let (text, fraction): (&str, Option<&str>) = (
        digit1,
        opt(('.', digit1).take()),
        take_while(0.., |c: char| c.is_ascii_alphabetic()),
    )
        .with_taken()
        .map(|((_, fraction, _), text)| (text, fraction))
        .parse_next(input)?;
    let suffix = text.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    let real = fraction.is_some() || matches!(suffix, "f" | "F" | "d" | "D" | "m" | "M");
    let kind = if real {
        TokenKind::RealLiteral
    } else {
        TokenKind::IntegerLiteral
    };
    Ok((kind, text))
}

fn lex_string<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    let text = lex_quoted(input, '"')?;
    Ok((TokenKind::StringLiteral, text))
}

fn lex_char<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    let text = lex_quoted(input, '\'')?;
    Ok((TokenKind::CharLiteral, text))
}

/// A quoted literal with backslash escapes, ending at the closing quote or
/// at the end of the line when unterminated.
fn lex_quoted<'i>(input: &mut &'i str, mut quote: char) -> ModalResult<&'i str> {
    let start = *input;
    quote.parse_next(input)?;
    loop {
        let next = opt(any).parse_next(input)?;
        match next {
            None => break,
            Some('\\') => {
                let _ = opt(any).parse_next(input)?;
            }
            Some(c) if c == quote => break,
            Some('\n') => {
                // leave the newline for the next token's trivia
                *input = &start[start.len() - input.len() - 1..];
                break;
            }
            Some(_) => {}
        }
    }
    Ok(&start[..start.len() - input.len()])
}

fn lex_punctuation<'i>(input: &mut &'i str) -> ModalResult<(TokenKind, &'i str)> {
    for punct in PUNCTUATION {
        if input.starts_with(punct) {
            let (text, rest) = input.split_at(punct.len());
            *input = rest;
            return Ok((TokenKind::Punctuation, text));
        }
    }
    Err(ErrMode::from_input(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn kinds_and_texts(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .0
            .into_iter()
            .map(|t| (t.kind(), t.text().to_string()))
            .collect()
    }

    fn texts(source: &str) -> String {
        tokenize(source).0.iter().map(|t| t.text()).join("|")
    }

    mod tokens {
        use super::*;

        #[test]
        fn keywords_and_identifiers() {
            assert_eq!(
                kinds_and_texts("public class Foo"),
                vec![
                    (TokenKind::Keyword, "public".to_string()),
                    (TokenKind::Keyword, "class".to_string()),
                    (TokenKind::Identifier, "Foo".to_string()),
                    (TokenKind::EndOfFile, String::new()),
                ]
            );
        }

        #[test]
        fn contextual_keywords_are_identifiers() {
            let tokens = tokenize("get set var partial").0;
            assert!(tokens[..4].iter().all(|t| t.kind() == TokenKind::Identifier));
        }

        #[test]
        fn numbers() {
            let tokens = tokenize("42 3.14 10L 2.5f 7m").0;
            let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind()).collect();
            assert_eq!(
                kinds,
                vec![
                    TokenKind::IntegerLiteral,
                    TokenKind::RealLiteral,
                    TokenKind::IntegerLiteral,
                    TokenKind::RealLiteral,
                    TokenKind::RealLiteral,
                    TokenKind::EndOfFile,
                ]
            );
        }

        #[test]
        fn member_access_on_number_is_not_a_fraction() {
            assert_eq!(texts("1.ToString()"), "1|.|ToString|(|)|");
        }

        #[test]
        fn strings_with_escapes() {
            assert_eq!(texts(r#"x = "a\"b";"#), r#"x|=|"a\"b"|;|"#);
            assert_eq!(texts(r"c = '\'';"), r"c|=|'\''|;|");
        }

        #[test]
        fn longest_punctuation_wins() {
            assert_eq!(texts("a += b && c != d"), "a|+=|b|&&|c|!=|d|");
        }

        #[test]
        fn shift_right_is_two_tokens() {
            assert_eq!(texts("List<List<int>>"), "List|<|List|<|int|>|>|");
        }
    }

    mod trivia {
        use super::*;

        #[test]
        fn comments_lead_next_token() {
            let (tokens, diagnostics) = tokenize("// note\n/* block */ int x;");
            assert!(diagnostics.is_empty());
            let leading: Vec<&str> = tokens[0].leading_trivia().iter().map(Trivia::text).collect();
            assert_eq!(leading, vec!["// note", "\n", "/* block */", " "]);
            assert_eq!(tokens[0].text(), "int");
        }

        #[test]
        fn trailing_trivia_belongs_to_eof() {
            let tokens = tokenize("x;  \n").0;
            let eof = tokens.last().unwrap();
            assert_eq!(eof.kind(), TokenKind::EndOfFile);
            assert_eq!(eof.leading_trivia().len(), 2);
        }

        #[test]
        fn offsets_point_at_token_text() {
            let tokens = tokenize("  ab cd").0;
            assert_eq!(tokens[0].offset(), 2);
            assert_eq!(tokens[1].offset(), 5);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn unknown_character() {
            let (tokens, diagnostics) = tokenize("a # b");
            assert_eq!(tokens[1].kind(), TokenKind::Unknown);
            assert_eq!(tokens[1].text(), "#");
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].span, Span::new(2, 3));
        }

        #[test]
        fn unterminated_string_stops_at_newline() {
            let (tokens, diagnostics) = tokenize("s = \"abc\nx");
            assert_eq!(tokens[2].text(), "\"abc");
            assert_eq!(tokens[3].text(), "x");
            assert_eq!(diagnostics.len(), 1);
        }

        #[test]
        fn unterminated_block_comment() {
            let (tokens, diagnostics) = tokenize("x /* never closed");
            assert_eq!(tokens.len(), 2);
            assert_eq!(diagnostics.len(), 1);
        }
    }
}
