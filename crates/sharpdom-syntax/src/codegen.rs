// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Source generation from syntax trees.
//!
//! Generation is a plain concatenation of every token's leading trivia and
//! text; missing tokens contribute nothing. A tree produced by the parser
//! therefore generates its source text byte for byte.

use std::fmt;

use crate::tree::{SyntaxElement, SyntaxNode, SyntaxToken, Trivia};

/// Accumulates generated source text.
#[derive(Debug, Default)]
pub struct CodegenState {
    tokens: String,
}

impl CodegenState {
    pub fn add_token(&mut self, text: &str) {
        self.tokens.push_str(text);
    }

    pub fn add_trivia(&mut self, trivia: &Trivia) {
        self.tokens.push_str(trivia.text());
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for CodegenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens)
    }
}

pub trait Codegen {
    fn codegen(&self, state: &mut CodegenState);
}

impl Codegen for SyntaxToken {
    fn codegen(&self, state: &mut CodegenState) {
        for trivia in self.leading_trivia() {
            state.add_trivia(trivia);
        }
        state.add_token(self.text());
    }
}

impl Codegen for SyntaxNode {
    fn codegen(&self, state: &mut CodegenState) {
        for child in self.children() {
            child.codegen(state);
        }
    }
}

impl Codegen for SyntaxElement {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            SyntaxElement::Node(node) => node.codegen(state),
            SyntaxElement::Token(token) => token.codegen(state),
        }
    }
}
