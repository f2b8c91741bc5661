//! The scanner: UTF-16 code units in, [`Token`]s out.
//!
//! The lexer is deliberately dumb about `/`: whether a slash starts a regular
//! expression literal or the division operator is a grammar question, so the
//! parser rewinds and calls [`Lexer::scan_regex_literal`] explicitly when a
//! regex is permitted. Keeping the decision out of the lexer means
//! peek-then-rewind lookahead in the parser can never desynchronize a mode
//! flag.

use crate::{
    character,
    token::{classify_word, CodeRange, Punct, Token, TokenKind},
};

/// Cursor state a caller can save and restore, see [`Lexer::rewind`].
pub type LexerCheckpoint = (usize, Token);

pub struct Lexer<'a> {
    units: &'a [u16],
    pos: usize,
    last: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(units: &'a [u16]) -> Self {
        Self {
            units,
            pos: 0,
            last: Token::not_found(),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The most recently consumed token.
    pub fn last(&self) -> Token {
        self.last
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        (self.pos, self.last)
    }

    /// Restores a cursor position previously obtained from [`Lexer::checkpoint`].
    pub fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.pos = checkpoint.0;
        self.last = checkpoint.1;
    }

    fn peek_unit(&self, offset: usize) -> Option<u16> {
        self.units.get(self.pos + offset).copied()
    }

    /// Skips whitespace, line terminators and comments. Returns whether a
    /// line terminator was crossed (a block comment spanning lines counts,
    /// per the semicolon-insertion rules).
    fn skip_separators(&mut self) -> bool {
        let mut saw_line_term = false;
        loop {
            match self.peek_unit(0) {
                Some(c) if character::is_whitespace(c) => self.pos += 1,
                Some(c) if character::is_line_terminator(c) => {
                    saw_line_term = true;
                    self.pos += 1;
                }
                Some(c) if c == u16::from(b'/') => match self.peek_unit(1) {
                    Some(n) if n == u16::from(b'/') => {
                        self.pos += 2;
                        while let Some(c) = self.peek_unit(0) {
                            if character::is_line_terminator(c) {
                                break;
                            }
                            self.pos += 1;
                        }
                    }
                    Some(n) if n == u16::from(b'*') => {
                        self.pos += 2;
                        loop {
                            match self.peek_unit(0) {
                                None => break,
                                Some(c) if c == u16::from(b'*') && self.peek_unit(1) == Some(u16::from(b'/')) => {
                                    self.pos += 2;
                                    break;
                                }
                                Some(c) => {
                                    if character::is_line_terminator(c) {
                                        saw_line_term = true;
                                    }
                                    self.pos += 1;
                                }
                            }
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        saw_line_term
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Token {
        let preceded = self.skip_separators();
        let start = self.pos;
        let kind = match self.peek_unit(0) {
            None => TokenKind::Eos,
            Some(c) if character::is_identifier_start(c) => self.scan_identifier(),
            Some(c) if character::is_decimal_digit(c) => self.scan_number(),
            Some(c) if c == u16::from(b'.') => {
                if self.peek_unit(1).is_some_and(character::is_decimal_digit) {
                    self.scan_number()
                } else {
                    self.pos += 1;
                    TokenKind::Punct(Punct::Dot)
                }
            }
            Some(c) if c == u16::from(b'"') || c == u16::from(b'\'') => self.scan_string(c),
            Some(_) => self.scan_punctuator(),
        };
        let token = Token::new(kind, CodeRange::new(start, self.pos), preceded);
        self.last = token;
        token
    }

    /// Peeks the next token without consuming it.
    pub fn next_and_rewind(&mut self) -> Token {
        let checkpoint = self.checkpoint();
        let token = self.next();
        self.rewind(checkpoint);
        token
    }

    /// Whether a line terminator separates the cursor from the next token.
    pub fn line_term_ahead(&mut self) -> bool {
        self.next_and_rewind().preceded_by_line_terminator
    }

    /// Automatic semicolon insertion. Succeeds when an explicit `;` is next
    /// (consuming it), when the next token is `}` or end-of-source (not
    /// consumed), or when a line terminator precedes the next token.
    pub fn try_skip_semicolon(&mut self) -> bool {
        let token = self.next_and_rewind();
        if token.is_semicolon() {
            self.next();
            return true;
        }
        if token.is_punct(Punct::RBrace) || token.kind == TokenKind::Eos {
            return true;
        }
        token.preceded_by_line_terminator
    }

    /// Re-scans from the cursor as a regular expression literal.
    ///
    /// The parser calls this after rewinding to just before a `/` that sits
    /// in primary-expression position. Returns a `Regex` token spanning
    /// `/ body / flags`, or `Illegal` on a malformed literal.
    pub fn scan_regex_literal(&mut self) -> Token {
        let preceded = self.skip_separators();
        let start = self.pos;
        debug_assert_eq!(self.peek_unit(0), Some(u16::from(b'/')));
        self.pos += 1;

        let mut in_class = false;
        let kind = loop {
            match self.peek_unit(0) {
                None => break TokenKind::Illegal,
                Some(c) if character::is_line_terminator(c) => break TokenKind::Illegal,
                Some(c) if c == u16::from(b'\\') => {
                    match self.peek_unit(1) {
                        Some(n) if !character::is_line_terminator(n) => self.pos += 2,
                        _ => {
                            self.pos += 1;
                            break TokenKind::Illegal;
                        }
                    }
                }
                Some(c) if c == u16::from(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(c) if c == u16::from(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(c) if c == u16::from(b'/') && !in_class => {
                    self.pos += 1;
                    // flags are IdentifierPart units
                    while self.peek_unit(0).is_some_and(character::is_identifier_part) {
                        self.pos += 1;
                    }
                    break TokenKind::Regex;
                }
                Some(_) => self.pos += 1,
            }
        };
        let token = Token::new(kind, CodeRange::new(start, self.pos), preceded);
        self.last = token;
        token
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek_unit(0).is_some_and(character::is_identifier_part) {
            self.pos += 1;
        }
        let word = String::from_utf16_lossy(&self.units[start..self.pos]);
        classify_word(&word)
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.peek_unit(0) == Some(u16::from(b'0'))
            && self
                .peek_unit(1)
                .is_some_and(|c| c == u16::from(b'x') || c == u16::from(b'X'))
        {
            self.pos += 2;
            if !self.peek_unit(0).is_some_and(character::is_hex_digit) {
                return TokenKind::Illegal;
            }
            while self.peek_unit(0).is_some_and(character::is_hex_digit) {
                self.pos += 1;
            }
            return TokenKind::Number;
        }

        while self.peek_unit(0).is_some_and(character::is_decimal_digit) {
            self.pos += 1;
        }
        if self.peek_unit(0) == Some(u16::from(b'.')) {
            self.pos += 1;
            while self.peek_unit(0).is_some_and(character::is_decimal_digit) {
                self.pos += 1;
            }
        }
        if self
            .peek_unit(0)
            .is_some_and(|c| c == u16::from(b'e') || c == u16::from(b'E'))
        {
            let mut lookahead = 1;
            if self
                .peek_unit(1)
                .is_some_and(|c| c == u16::from(b'+') || c == u16::from(b'-'))
            {
                lookahead = 2;
            }
            if self.peek_unit(lookahead).is_some_and(character::is_decimal_digit) {
                self.pos += lookahead;
                while self.peek_unit(0).is_some_and(character::is_decimal_digit) {
                    self.pos += 1;
                }
            } else {
                self.pos += 1;
                return TokenKind::Illegal;
            }
        }
        TokenKind::Number
    }

    fn scan_string(&mut self, quote: u16) -> TokenKind {
        self.pos += 1;
        loop {
            match self.peek_unit(0) {
                None => return TokenKind::Illegal,
                Some(c) if character::is_line_terminator(c) => return TokenKind::Illegal,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return TokenKind::String;
                }
                Some(c) if c == u16::from(b'\\') => {
                    self.pos += 1;
                    match self.peek_unit(0) {
                        None => return TokenKind::Illegal,
                        // line continuation: \ followed by a terminator (CRLF counts as one)
                        Some(n) if character::is_line_terminator(n) => {
                            self.pos += 1;
                            if n == 0x000D && self.peek_unit(0) == Some(0x000A) {
                                self.pos += 1;
                            }
                        }
                        Some(n) if n == u16::from(b'x') => {
                            self.pos += 1;
                            if !self.consume_hex_digits(2) {
                                return TokenKind::Illegal;
                            }
                        }
                        Some(n) if n == u16::from(b'u') => {
                            self.pos += 1;
                            if !self.consume_hex_digits(4) {
                                return TokenKind::Illegal;
                            }
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn consume_hex_digits(&mut self, count: usize) -> bool {
        for _ in 0..count {
            if !self.peek_unit(0).is_some_and(character::is_hex_digit) {
                return false;
            }
            self.pos += 1;
        }
        true
    }

    fn scan_punctuator(&mut self) -> TokenKind {
        let c = self.units[self.pos];
        let next = self.peek_unit(1);
        let next2 = self.peek_unit(2);
        let next3 = self.peek_unit(3);
        let eq = Some(u16::from(b'='));

        let (punct, len) = match c {
            c if c == u16::from(b'{') => (Punct::LBrace, 1),
            c if c == u16::from(b'}') => (Punct::RBrace, 1),
            c if c == u16::from(b'(') => (Punct::LParen, 1),
            c if c == u16::from(b')') => (Punct::RParen, 1),
            c if c == u16::from(b'[') => (Punct::LBrack, 1),
            c if c == u16::from(b']') => (Punct::RBrack, 1),
            c if c == u16::from(b';') => (Punct::Semicolon, 1),
            c if c == u16::from(b',') => (Punct::Comma, 1),
            c if c == u16::from(b'?') => (Punct::Question, 1),
            c if c == u16::from(b':') => (Punct::Colon, 1),
            c if c == u16::from(b'~') => (Punct::BitNot, 1),
            c if c == u16::from(b'<') => match (next, next2) {
                (Some(n), o) if n == u16::from(b'<') => {
                    if o == eq {
                        (Punct::ShlAssign, 3)
                    } else {
                        (Punct::Shl, 2)
                    }
                }
                (n, _) if n == eq => (Punct::Le, 2),
                _ => (Punct::Lt, 1),
            },
            c if c == u16::from(b'>') => match (next, next2, next3) {
                (Some(n), Some(o), p) if n == u16::from(b'>') && o == u16::from(b'>') => {
                    if p == eq {
                        (Punct::UShrAssign, 4)
                    } else {
                        (Punct::UShr, 3)
                    }
                }
                (Some(n), o, _) if n == u16::from(b'>') => {
                    if o == eq {
                        (Punct::ShrAssign, 3)
                    } else {
                        (Punct::Shr, 2)
                    }
                }
                (n, _, _) if n == eq => (Punct::Ge, 2),
                _ => (Punct::Gt, 1),
            },
            c if c == u16::from(b'=') => match (next, next2) {
                (n, o) if n == eq && o == eq => (Punct::StrictEq, 3),
                (n, _) if n == eq => (Punct::Eq, 2),
                _ => (Punct::Assign, 1),
            },
            c if c == u16::from(b'!') => match (next, next2) {
                (n, o) if n == eq && o == eq => (Punct::StrictNe, 3),
                (n, _) if n == eq => (Punct::Ne, 2),
                _ => (Punct::Not, 1),
            },
            c if c == u16::from(b'+') => match next {
                Some(n) if n == u16::from(b'+') => (Punct::Inc, 2),
                n if n == eq => (Punct::AddAssign, 2),
                _ => (Punct::Add, 1),
            },
            c if c == u16::from(b'-') => match next {
                Some(n) if n == u16::from(b'-') => (Punct::Dec, 2),
                n if n == eq => (Punct::SubAssign, 2),
                _ => (Punct::Sub, 1),
            },
            c if c == u16::from(b'*') => {
                if next == eq {
                    (Punct::MulAssign, 2)
                } else {
                    (Punct::Mul, 1)
                }
            }
            c if c == u16::from(b'%') => {
                if next == eq {
                    (Punct::ModAssign, 2)
                } else {
                    (Punct::Mod, 1)
                }
            }
            c if c == u16::from(b'/') => {
                if next == eq {
                    (Punct::DivAssign, 2)
                } else {
                    (Punct::Div, 1)
                }
            }
            c if c == u16::from(b'&') => match next {
                Some(n) if n == u16::from(b'&') => (Punct::And, 2),
                n if n == eq => (Punct::BitAndAssign, 2),
                _ => (Punct::BitAnd, 1),
            },
            c if c == u16::from(b'|') => match next {
                Some(n) if n == u16::from(b'|') => (Punct::Or, 2),
                n if n == eq => (Punct::BitOrAssign, 2),
                _ => (Punct::BitOr, 1),
            },
            c if c == u16::from(b'^') => {
                if next == eq {
                    (Punct::BitXorAssign, 2)
                } else {
                    (Punct::BitXor, 1)
                }
            }
            _ => {
                self.pos += 1;
                return TokenKind::Illegal;
            }
        };
        self.pos += len;
        TokenKind::Punct(punct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Keyword;

    fn units(source: &str) -> Vec<u16> {
        source.encode_utf16().collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        let units = units(source);
        let mut lexer = Lexer::new(&units);
        let mut out = vec![];
        loop {
            let token = lexer.next();
            if token.kind == TokenKind::Eos {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn punctuator_longest_match() {
        assert_eq!(
            kinds(">>>= >>> >>= >> >= >"),
            vec![
                TokenKind::Punct(Punct::UShrAssign),
                TokenKind::Punct(Punct::UShr),
                TokenKind::Punct(Punct::ShrAssign),
                TokenKind::Punct(Punct::Shr),
                TokenKind::Punct(Punct::Ge),
                TokenKind::Punct(Punct::Gt),
            ]
        );
        assert_eq!(
            kinds("=== == ="),
            vec![
                TokenKind::Punct(Punct::StrictEq),
                TokenKind::Punct(Punct::Eq),
                TokenKind::Punct(Punct::Assign),
            ]
        );
    }

    #[test]
    fn line_terminator_flag_set_on_following_token() {
        let units = units("a\nb");
        let mut lexer = Lexer::new(&units);
        assert!(!lexer.next().preceded_by_line_terminator);
        assert!(lexer.next().preceded_by_line_terminator);
    }

    #[test]
    fn comments_are_separators() {
        assert_eq!(
            kinds("a // trailing\nb /* inner */ c"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Ident]
        );
        // a block comment spanning lines carries the terminator flag
        let units = units("a /* x\ny */ b");
        let mut lexer = Lexer::new(&units);
        lexer.next();
        assert!(lexer.next().preceded_by_line_terminator);
    }

    #[test]
    fn keywords_and_literals() {
        assert_eq!(
            kinds("var x = null"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Ident,
                TokenKind::Punct(Punct::Assign),
                TokenKind::Null,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("0 101 0.01 12.05 .8 0xAbC09 1e3 1.5e-2"), vec![TokenKind::Number; 8]);
        assert_eq!(kinds("0x"), vec![TokenKind::Illegal]);
    }

    #[test]
    fn strings() {
        assert_eq!(kinds("'' \"a\\n\" '\\u1234\\x12'"), vec![TokenKind::String; 3]);
        // unterminated
        assert_eq!(kinds("'abc"), vec![TokenKind::Illegal]);
        // bad hex escape
        assert_eq!(kinds("'\\xZZ'"), vec![TokenKind::Illegal, TokenKind::Ident, TokenKind::Illegal]);
    }

    #[test]
    fn regex_rescan() {
        let source = units("/[a-z]*?/g");
        let mut lexer = Lexer::new(&source);
        let token = lexer.scan_regex_literal();
        assert_eq!(token.kind, TokenKind::Regex);
        assert_eq!(token.text(&source), "/[a-z]*?/g");
    }

    #[test]
    fn try_skip_semicolon_rules() {
        // explicit semicolon is consumed
        let source = units("; a");
        let mut lexer = Lexer::new(&source);
        assert!(lexer.try_skip_semicolon());
        assert_eq!(lexer.next().kind, TokenKind::Ident);
        // closing brace is not consumed
        let source = units("}");
        let mut lexer = Lexer::new(&source);
        assert!(lexer.try_skip_semicolon());
        assert_eq!(lexer.next().kind, TokenKind::Punct(Punct::RBrace));
        // a line terminator licenses insertion
        let source = units("\nb");
        let mut lexer = Lexer::new(&source);
        assert!(lexer.try_skip_semicolon());
        // anything else refuses
        let source = units("b");
        let mut lexer = Lexer::new(&source);
        assert!(!lexer.try_skip_semicolon());
    }

    #[test]
    fn lone_surrogate_is_illegal() {
        let source: Vec<u16> = vec![0xD83D, 0xDE0A];
        let mut lexer = Lexer::new(&source);
        let token = lexer.next();
        assert_eq!(token.kind, TokenKind::Illegal);
        assert_eq!(token.source(&source), &[0xD83D]);
    }
}
