//! Hand-rolled lexer: byte stream to token stream.
//!
//! Grounded on `lexical_analysis/lexer.py` from the reference interpreter: same `\n` source
//! rewrite, same comment/whitespace skipping, same greedy multi-character operator
//! disambiguation order. Reworked into a pull-based Rust iterator-style API with an explicit
//! checkpoint/restore pair (`mark`/`reset`) standing in for the original's pickle-based
//! `@restorable` decorator, which the parser uses for lookahead.
use crate::{
    error::CError,
    token::{Token, TokenKind, keyword},
};

/// A lightweight snapshot of lexer position, used by the parser to backtrack.
#[derive(Debug, Clone, Copy)]
pub struct LexerMark {
    pos: usize,
    line: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    /// Builds a lexer over `source`, rewriting the literal two-character sequence `\n`
    /// to an actual newline before scanning (spec §6's legacy convenience).
    #[must_use]
    pub fn new(source: &str) -> Self {
        let rewritten = source.replace("\\n", "\n");
        Self { chars: rewritten.chars().collect(), pos: 0, line: 1 }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn mark(&self) -> LexerMark {
        LexerMark { pos: self.pos, line: self.line }
    }

    pub fn reset(&mut self, mark: LexerMark) {
        self.pos = mark.pos;
        self.line = mark.line;
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance(1);
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance(2);
        while let Some(c) = self.current() {
            if c == '\n' {
                self.line += 1;
                self.advance(1);
                return;
            }
            self.advance(1);
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), CError> {
        self.advance(2);
        while let Some(c) = self.current() {
            if c == '*' && self.peek(1) == Some('/') {
                self.advance(2);
                return Ok(());
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance(1);
        }
        Err(CError::lexical("unterminated comment", self.line))
    }

    fn number(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(c) = self.current().filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.advance(1);
        }
        if self.current() == Some('.') {
            text.push('.');
            self.advance(1);
            while let Some(c) = self.current().filter(|c| c.is_ascii_digit()) {
                text.push(c);
                self.advance(1);
            }
            let value: f64 = text.parse().unwrap_or(0.0);
            Token::new(TokenKind::RealConst(value), line)
        } else {
            let value: i64 = text.parse().unwrap_or(0);
            Token::new(TokenKind::IntegerConst(value), line)
        }
    }

    fn string(&mut self) -> Result<Token, CError> {
        let line = self.line;
        self.advance(1);
        let mut result = String::new();
        loop {
            match self.current() {
                None => return Err(CError::lexical("unterminated string literal", self.line)),
                Some('"') => {
                    self.advance(1);
                    return Ok(Token::new(TokenKind::StringConst(result), line));
                }
                Some(c) => {
                    result.push(c);
                    self.advance(1);
                }
            }
        }
    }

    fn char_literal(&mut self) -> Result<Token, CError> {
        let line = self.line;
        self.advance(1);
        let ch = self.current().ok_or_else(|| CError::lexical("unterminated char literal", self.line))?;
        self.advance(1);
        if self.current() != Some('\'') {
            return Err(CError::lexical("unterminated char literal", self.line));
        }
        self.advance(1);
        Ok(Token::new(TokenKind::CharConst(i64::from(ch as u32)), line))
    }

    fn ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(c) = self.current().filter(|c| c.is_alphanumeric() || *c == '_') {
            text.push(c);
            self.advance(1);
        }
        let kind = keyword(&text).unwrap_or(TokenKind::Ident(text));
        Token::new(kind, line)
    }

    /// Returns the next token, consuming it from the stream.
    ///
    /// # Errors
    /// Returns `CError::Lexical` for an unterminated literal/comment or an invalid character.
    pub fn next_token(&mut self) -> Result<Token, CError> {
        loop {
            let Some(c) = self.current() else {
                return Ok(Token::new(TokenKind::Eof, self.line));
            };

            if c.is_whitespace() {
                self.skip_whitespace();
                continue;
            }
            if c == '/' && self.peek(1) == Some('/') {
                self.skip_line_comment();
                continue;
            }
            if c == '/' && self.peek(1) == Some('*') {
                self.skip_block_comment()?;
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                return Ok(self.ident_or_keyword());
            }
            if c.is_ascii_digit() {
                return Ok(self.number());
            }
            if c == '"' {
                return self.string();
            }
            if c == '\'' {
                return self.char_literal();
            }

            let line = self.line;
            let p1 = self.peek(1);
            let p2 = self.peek(2);

            // three-char tokens
            if c == '<' && p1 == Some('<') && p2 == Some('=') {
                self.advance(3);
                return Ok(Token::new(TokenKind::LeftAssign, line));
            }
            if c == '>' && p1 == Some('>') && p2 == Some('=') {
                self.advance(3);
                return Ok(Token::new(TokenKind::RightAssign, line));
            }

            // two-char tokens
            let two = match (c, p1) {
                ('+', Some('=')) => Some(TokenKind::AddAssign),
                ('-', Some('=')) => Some(TokenKind::SubAssign),
                ('*', Some('=')) => Some(TokenKind::MulAssign),
                ('/', Some('=')) => Some(TokenKind::DivAssign),
                ('%', Some('=')) => Some(TokenKind::ModAssign),
                ('&', Some('=')) => Some(TokenKind::AndAssign),
                ('^', Some('=')) => Some(TokenKind::XorAssign),
                ('|', Some('=')) => Some(TokenKind::OrAssign),
                ('-', Some('>')) => Some(TokenKind::Arrow),
                ('>', Some('>')) => Some(TokenKind::RightOp),
                ('<', Some('<')) => Some(TokenKind::LeftOp),
                ('+', Some('+')) => Some(TokenKind::IncOp),
                ('-', Some('-')) => Some(TokenKind::DecOp),
                ('&', Some('&')) => Some(TokenKind::LogAndOp),
                ('|', Some('|')) => Some(TokenKind::LogOrOp),
                ('<', Some('=')) => Some(TokenKind::LeOp),
                ('>', Some('=')) => Some(TokenKind::GeOp),
                ('=', Some('=')) => Some(TokenKind::EqOp),
                ('!', Some('=')) => Some(TokenKind::NeOp),
                _ => None,
            };
            if let Some(kind) = two {
                self.advance(2);
                return Ok(Token::new(kind, line));
            }

            // one-char tokens
            let one = match c {
                '<' => TokenKind::LtOp,
                '>' => TokenKind::GtOp,
                '=' => TokenKind::Assign,
                '!' => TokenKind::LogNeg,
                '&' => TokenKind::Ampersand,
                '|' => TokenKind::OrOp,
                '^' => TokenKind::XorOp,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Asterisk,
                '/' => TokenKind::DivOp,
                '%' => TokenKind::ModOp,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBracket,
                '}' => TokenKind::RBracket,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '#' => TokenKind::Hash,
                '?' => TokenKind::QuestionMark,
                other => return Err(CError::lexical(format!("invalid character '{other}'"), self.line)),
            };
            self.advance(1);
            return Ok(Token::new(one, line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn rewrites_escaped_newline_sequence() {
        let mut lexer = Lexer::new(r#""a\nb""#);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::StringConst("a\nb".to_string()));
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let mut lexer = Lexer::new("int // comment\nx;");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Int);
        let ident = lexer.next_token().unwrap();
        assert_eq!(ident.kind, TokenKind::Ident("x".to_string()));
        assert_eq!(ident.line, 2);
    }

    #[test]
    fn unterminated_block_comment_is_lexical_error() {
        let mut lexer = Lexer::new("/* never closes");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn multi_char_operators_disambiguate_greedily() {
        assert_eq!(
            kinds("<<= << <= <"),
            vec![TokenKind::LeftAssign, TokenKind::LeftOp, TokenKind::LeOp, TokenKind::LtOp]
        );
        assert_eq!(
            kinds(">>= >> >= >"),
            vec![TokenKind::RightAssign, TokenKind::RightOp, TokenKind::GeOp, TokenKind::GtOp]
        );
        assert_eq!(kinds("+= ++ +"), vec![TokenKind::AddAssign, TokenKind::IncOp, TokenKind::Plus]);
        assert_eq!(kinds("&= && &"), vec![TokenKind::AndAssign, TokenKind::LogAndOp, TokenKind::Ampersand]);
    }

    #[test]
    fn arrow_is_distinct_from_minus_then_greater_than() {
        assert_eq!(kinds("a->b"), vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Arrow,
            TokenKind::Ident("b".to_string()),
        ]);
    }

    #[test]
    fn char_literal_yields_codepoint() {
        let mut lexer = Lexer::new("'A'");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::CharConst(65));
    }

    #[test]
    fn mark_and_reset_rewinds_position() {
        let mut lexer = Lexer::new("int x");
        let mark = lexer.mark();
        let first = lexer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::Int);
        lexer.reset(mark);
        let replayed = lexer.next_token().unwrap();
        assert_eq!(replayed.kind, TokenKind::Int);
    }
}
