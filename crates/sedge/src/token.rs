//! Tokens and the precedence protocol the parser climbs on.

use std::str::FromStr;

use strum::{Display, EnumString, IntoStaticStr};

/// Half-open span of UTF-16 code units into the source buffer.
///
/// Tokens and AST nodes carry ranges rather than slices so the parsed program
/// stays free of lifetimes and can be serialized; the original text is
/// recovered through [`CodeRange::slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CodeRange {
    pub start: usize,
    pub end: usize,
}

impl CodeRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The covered code units.
    pub fn slice<'a>(&self, units: &'a [u16]) -> &'a [u16] {
        &units[self.start..self.end]
    }

    /// Lossy UTF-8 rendering of the covered units, for keyword comparison and
    /// diagnostics.
    pub fn text(&self, units: &[u16]) -> String {
        String::from_utf16_lossy(self.slice(units))
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Reserved words of the language proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    Instanceof,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

/// Punctuator subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBrack,
    RBrack,
    Dot,
    Semicolon,
    Comma,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Not,
    BitNot,
    And,
    Or,
    Question,
    Colon,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

/// Token kind tags.
///
/// `LineTerm` and `NotFound` exist for protocol completeness: the lexer folds
/// line terminators into the following token's flag, and "no token here"
/// positions (an absent function name, an unlabelled break) are represented
/// with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    FutureReserved,
    Null,
    Bool(bool),
    Number,
    String,
    Regex,
    Punct(Punct),
    LineTerm,
    Eos,
    NotFound,
    Illegal,
}

/// A scanned token: a kind, the source range it covers, and whether a line
/// terminator was skipped immediately before it (the ASI signal).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: CodeRange,
    pub preceded_by_line_terminator: bool,
}

impl Token {
    pub fn new(kind: TokenKind, range: CodeRange, preceded_by_line_terminator: bool) -> Self {
        Self {
            kind,
            range,
            preceded_by_line_terminator,
        }
    }

    /// The placeholder token for absent positions.
    pub fn not_found() -> Self {
        Self::new(TokenKind::NotFound, CodeRange::default(), false)
    }

    pub fn source<'a>(&self, units: &'a [u16]) -> &'a [u16] {
        self.range.slice(units)
    }

    pub fn text(&self, units: &[u16]) -> String {
        self.range.text(units)
    }

    /// Plain identifier (reserved words excluded).
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    /// IdentifierName: identifiers plus every reserved word. Valid after `.`
    /// and as a property name.
    pub fn is_identifier_name(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Ident | TokenKind::Keyword(_) | TokenKind::FutureReserved | TokenKind::Null | TokenKind::Bool(_)
        )
    }

    /// PropertyName: IdentifierName, string literal or numeric literal.
    pub fn is_property_name(&self) -> bool {
        self.is_identifier_name() || matches!(self.kind, TokenKind::String | TokenKind::Number)
    }

    pub fn is_semicolon(&self) -> bool {
        self.kind == TokenKind::Punct(Punct::Semicolon)
    }

    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Punct(
                Punct::Assign
                    | Punct::AddAssign
                    | Punct::SubAssign
                    | Punct::MulAssign
                    | Punct::DivAssign
                    | Punct::ModAssign
                    | Punct::ShlAssign
                    | Punct::ShrAssign
                    | Punct::UShrAssign
                    | Punct::BitAndAssign
                    | Punct::BitOrAssign
                    | Punct::BitXorAssign
            )
        )
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    /// Binding strength when this token is used as a binary operator, zero
    /// for everything else. `no_in` suppresses the `in` operator inside
    /// `for (...)` headers.
    pub fn binary_priority(&self, no_in: bool) -> u8 {
        match self.kind {
            TokenKind::Punct(p) => match p {
                Punct::Or => 2,
                Punct::And => 3,
                Punct::BitOr => 4,
                Punct::BitXor => 5,
                Punct::BitAnd => 6,
                Punct::Eq | Punct::Ne | Punct::StrictEq | Punct::StrictNe => 7,
                Punct::Lt | Punct::Gt | Punct::Le | Punct::Ge => 8,
                Punct::Shl | Punct::Shr | Punct::UShr => 9,
                Punct::Add | Punct::Sub => 10,
                Punct::Mul | Punct::Div | Punct::Mod => 11,
                _ => 0,
            },
            TokenKind::Keyword(Keyword::Instanceof) => 8,
            TokenKind::Keyword(Keyword::In) => {
                if no_in {
                    0
                } else {
                    8
                }
            }
            _ => 0,
        }
    }

    /// Binding strength as a prefix operator, zero for non-prefix tokens.
    pub fn unary_prefix_priority(&self) -> u8 {
        match self.kind {
            TokenKind::Punct(Punct::Inc | Punct::Dec | Punct::Add | Punct::Sub | Punct::BitNot | Punct::Not) => 100,
            TokenKind::Keyword(Keyword::Delete | Keyword::Void | Keyword::Typeof) => 100,
            _ => 0,
        }
    }

    /// Binding strength as a postfix operator (`++`/`--` only).
    pub fn unary_postfix_priority(&self) -> u8 {
        match self.kind {
            TokenKind::Punct(Punct::Inc | Punct::Dec) => 200,
            _ => 0,
        }
    }
}

/// Future reserved words per the third edition.
pub fn is_future_reserved(word: &str) -> bool {
    matches!(
        word,
        "abstract"
            | "boolean"
            | "byte"
            | "char"
            | "class"
            | "const"
            | "double"
            | "enum"
            | "export"
            | "extends"
            | "final"
            | "float"
            | "goto"
            | "implements"
            | "import"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "short"
            | "static"
            | "super"
            | "synchronized"
            | "throws"
            | "transient"
            | "volatile"
    )
}

/// Classifies a scanned IdentifierName into its token kind.
pub fn classify_word(word: &str) -> TokenKind {
    match word {
        "null" => TokenKind::Null,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => {
            if let Ok(keyword) = Keyword::from_str(word) {
                TokenKind::Keyword(keyword)
            } else if is_future_reserved(word) {
                TokenKind::FutureReserved
            } else {
                TokenKind::Ident
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_classification() {
        assert_eq!(classify_word("var"), TokenKind::Keyword(Keyword::Var));
        assert_eq!(classify_word("null"), TokenKind::Null);
        assert_eq!(classify_word("true"), TokenKind::Bool(true));
        assert_eq!(classify_word("class"), TokenKind::FutureReserved);
        assert_eq!(classify_word("Null"), TokenKind::Ident);
    }

    #[test]
    fn in_priority_suppressed_by_no_in() {
        let token = Token::new(TokenKind::Keyword(Keyword::In), CodeRange::new(0, 2), false);
        assert_eq!(token.binary_priority(false), 8);
        assert_eq!(token.binary_priority(true), 0);
    }
}
