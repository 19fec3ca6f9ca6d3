use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[logos(skip r"[ \t\r\n]+")] // Whitespace
#[logos(skip r"//[^\n]*")] // Line comments
pub enum TokenKind {
    // --- Keywords ---
    #[token("unsigned")]
    Unsigned,
    #[token("signed")]
    Signed,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("void")]
    Void,
    #[token("return")]
    Return,
    #[token("unsafe")]
    Unsafe,

    // --- Identifiers and literals ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+")]
    DecInteger,

    #[regex(r"'(?:[^'\\\n]|\\.)'")]
    CharacterLiteral,

    #[regex(r#""[^"\n]*""#)]
    StringLiteral,

    // --- Punctuation ---
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    // --- Operators ---
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("++")]
    Increment,
    #[token("+=")]
    PlusAssign,
    #[token("-")]
    Minus,
    #[token("--")]
    Decrement,
    #[token("-=")]
    MinusAssign,
    #[token("*")]
    Multiply,
    #[token("*=")]
    MultiplyAssign,
    #[token("/")]
    Divide,
    #[token("/=")]
    DivideAssign,
    #[token("%")]
    Modulo,
    #[token("%=")]
    ModuloAssign,

    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    #[token("&&")]
    LogicAnd,
    #[token("||")]
    LogicOr,

    #[token("~")]
    BitNot,
    #[token("&")]
    BitAnd,
    #[token("&=")]
    BitAndAssign,
    #[token("|")]
    BitOr,
    #[token("|=")]
    BitOrAssign,
    #[token("^")]
    BitXor,
    #[token("^=")]
    BitXorAssign,
    #[token("<<")]
    ShiftLeft,
    #[token("<<=")]
    ShiftLeftAssign,
    #[token(">>")]
    ShiftRight,
    #[token(">>=")]
    ShiftRightAssign,

    #[token(".")]
    Dot,

    /// End-of-input sentinel appended by `lex`; never consumed by a
    /// production. The NUL pattern keeps the scanner total and cannot occur
    /// in source text.
    #[token("\0")]
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Unsigned => "'unsigned'",
            TokenKind::Signed => "'signed'",
            TokenKind::Char => "'char'",
            TokenKind::Short => "'short'",
            TokenKind::Int => "'int'",
            TokenKind::Long => "'long'",
            TokenKind::Void => "'void'",
            TokenKind::Return => "'return'",
            TokenKind::Unsafe => "'unsafe'",
            TokenKind::Identifier => "identifier",
            TokenKind::DecInteger => "number",
            TokenKind::CharacterLiteral => "character",
            TokenKind::StringLiteral => "string",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Increment => "'++'",
            TokenKind::PlusAssign => "'+='",
            TokenKind::Minus => "'-'",
            TokenKind::Decrement => "'--'",
            TokenKind::MinusAssign => "'-='",
            TokenKind::Multiply => "'*'",
            TokenKind::MultiplyAssign => "'*='",
            TokenKind::Divide => "'/'",
            TokenKind::DivideAssign => "'/='",
            TokenKind::Modulo => "'%'",
            TokenKind::ModuloAssign => "'%='",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::LogicAnd => "'&&'",
            TokenKind::LogicOr => "'||'",
            TokenKind::BitNot => "'~'",
            TokenKind::BitAnd => "'&'",
            TokenKind::BitAndAssign => "'&='",
            TokenKind::BitOr => "'|'",
            TokenKind::BitOrAssign => "'|='",
            TokenKind::BitXor => "'^'",
            TokenKind::BitXorAssign => "'^='",
            TokenKind::ShiftLeft => "'<<'",
            TokenKind::ShiftLeftAssign => "'<<='",
            TokenKind::ShiftRight => "'>>'",
            TokenKind::ShiftRightAssign => "'>>='",
            TokenKind::Dot => "'.'",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{s}")
    }
}

/// Line/column source coordinates (1-based), used to tag diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One lexical token: its kind, the exact source text, and where it began.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: SourcePos,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// A positionless placeholder for nodes synthesized outside parsing.
    pub fn empty() -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
            pos: SourcePos::default(),
        }
    }
}

/// Custom error type for lexical errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub location: usize,
    pub line: usize,
    pub column: usize,
    pub unexpected_char: char,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected character '{}' at line {}, column {} (position {})",
            self.unexpected_char, self.line, self.column, self.location
        )
    }
}

impl std::error::Error for LexicalError {}

/// Convert a byte position to line and column numbers (1-based)
pub fn position_to_line_col(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

fn create_lexical_error(source: &str, position: usize) -> LexicalError {
    let (line, column) = position_to_line_col(source, position);
    let unexpected_char = source[position..].chars().next().unwrap_or('\0');

    LexicalError {
        location: position,
        line,
        column,
        unexpected_char,
    }
}

/// Scan `source` into the token sequence the parser consumes, terminated by
/// the `Eof` sentinel.
pub fn lex(source: &str) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => {
                let (line, column) = position_to_line_col(source, span.start);
                tokens.push(Token::new(
                    kind,
                    &source[span.clone()],
                    SourcePos { line, column },
                ));
            }
            Err(_) => return Err(create_lexical_error(source, span.start)),
        }
    }

    let (line, column) = position_to_line_col(source, source.len());
    tokens.push(Token::new(TokenKind::Eof, "", SourcePos { line, column }));
    Ok(tokens)
}
