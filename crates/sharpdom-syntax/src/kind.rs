// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Token and node kinds.

use std::fmt;

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    CharLiteral,
    Punctuation,
    /// A character the tokenizer does not recognize.
    Unknown,
    EndOfFile,
}

/// Reserved words. Contextual keywords (`get`, `set`, `var`, `partial`,
/// `value`, `async`) are lexed as identifiers.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Keywords that name a built-in type.
pub const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

/// Declaration modifiers accepted in a modifier list.
pub const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "virtual", "override",
    "sealed", "readonly", "const", "new", "extern", "unsafe", "volatile",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_predefined_type(word: &str) -> bool {
    PREDEFINED_TYPES.contains(&word)
}

/// Kind of an interior syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    CompilationUnit,
    UsingDirective,
    QualifiedName,
    NamespaceDeclaration,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMemberDeclaration,
    BaseList,
    TypeParameterList,
    TypeParameter,
    AttributeList,
    Attribute,
    AttributeArgumentList,
    AttributeArgument,
    ModifierList,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,
    FieldDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValueClause,
    ParameterList,
    Parameter,
    Type,
    Block,
    IfStatement,
    ElseClause,
    ForStatement,
    WhileStatement,
    ReturnStatement,
    LocalDeclarationStatement,
    ExpressionStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    EmptyStatement,
    LiteralExpression,
    IdentifierName,
    ThisExpression,
    MemberAccessExpression,
    InvocationExpression,
    ElementAccessExpression,
    ArgumentList,
    BracketedArgumentList,
    Argument,
    ObjectCreationExpression,
    ParenthesizedExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    BinaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    /// Tokens the parser skipped while recovering from an error.
    Error,
}

impl SyntaxKind {
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::EmptyStatement
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::LiteralExpression
                | SyntaxKind::IdentifierName
                | SyntaxKind::ThisExpression
                | SyntaxKind::MemberAccessExpression
                | SyntaxKind::InvocationExpression
                | SyntaxKind::ElementAccessExpression
                | SyntaxKind::ObjectCreationExpression
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::PrefixUnaryExpression
                | SyntaxKind::PostfixUnaryExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::AssignmentExpression
                | SyntaxKind::ConditionalExpression
        )
    }

    /// Declarations that live in a type body.
    pub fn is_member_declaration(self) -> bool {
        self.is_type_declaration()
            || matches!(
                self,
                SyntaxKind::MethodDeclaration
                    | SyntaxKind::ConstructorDeclaration
                    | SyntaxKind::PropertyDeclaration
                    | SyntaxKind::FieldDeclaration
                    | SyntaxKind::EnumMemberDeclaration
            )
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
