//! Token kinds produced by the lexer.
//!
//! Mirrors `lexical_analysis/token_type.py` from the reference interpreter: one variant per
//! reserved keyword, literal kind, operator and punctuation mark, plus `Eof`.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // literals
    IntegerConst(i64),
    RealConst(f64),
    CharConst(i64),
    StringConst(String),
    Ident(String),

    // type keywords
    Char,
    Int,
    Float,
    Double,
    Long,
    Short,
    Signed,
    Unsigned,
    Struct,

    // control keywords
    If,
    Else,
    For,
    While,
    Do,
    Return,
    Break,
    Continue,
    Switch,
    Case,
    Default,

    // three/two-char assignment/shift operators
    LeftAssign,  // <<=
    RightAssign, // >>=
    AddAssign,   // +=
    SubAssign,   // -=
    MulAssign,   // *=
    DivAssign,   // /=
    ModAssign,   // %=
    AndAssign,   // &=
    XorAssign,   // ^=
    OrAssign,    // |=
    LeftOp,      // <<
    RightOp,     // >>
    IncOp,       // ++
    DecOp,       // --
    LogAndOp,    // &&
    LogOrOp,     // ||
    LeOp,        // <=
    GeOp,        // >=
    EqOp,        // ==
    NeOp,        // !=

    // one-char operators and punctuation
    LtOp,      // <
    GtOp,      // >
    Assign,    // =
    LogNeg,    // !
    Ampersand, // &
    OrOp,      // |
    XorOp,     // ^
    Plus,      // +
    Minus,     // -
    Asterisk,  // *
    DivOp,     // /
    ModOp,     // %
    LParen,    // (
    RParen,    // )
    LBracket,  // {
    RBracket,  // }
    Semicolon, // ;
    Colon,     // :
    Comma,     // ,
    Dot,       // .
    Arrow,     // ->
    Hash,      // #
    QuestionMark, // ?

    Eof,
}

impl TokenKind {
    /// True for the compound-assignment family (`=`, `+=`, `-=`, ... `>>=`).
    #[must_use]
    pub fn is_assign_op(&self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::AddAssign
                | Self::SubAssign
                | Self::MulAssign
                | Self::DivAssign
                | Self::ModAssign
                | Self::AndAssign
                | Self::XorAssign
                | Self::OrAssign
                | Self::LeftAssign
                | Self::RightAssign
        )
    }

    #[must_use]
    pub fn is_type_start(&self) -> bool {
        matches!(
            self,
            Self::Char | Self::Int | Self::Float | Self::Double | Self::Long | Self::Short | Self::Signed
                | Self::Unsigned | Self::Struct
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }
}

/// Maps reserved words to their keyword token kind; anything else is an identifier.
#[must_use]
pub fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "char" => TokenKind::Char,
        "int" => TokenKind::Int,
        "float" => TokenKind::Float,
        "double" => TokenKind::Double,
        "long" => TokenKind::Long,
        "short" => TokenKind::Short,
        "signed" => TokenKind::Signed,
        "unsigned" => TokenKind::Unsigned,
        "struct" => TokenKind::Struct,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        _ => return None,
    })
}
