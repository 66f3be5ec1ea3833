//! Token definitions for the S-expression host syntax
//!
//! Tokens are produced by the logos derive macro. Whitespace and `;` line comments are
//! skipped; the reader only ever sees structural tokens and scalars.
use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[token("nil")]
    Nil,

    // Operators and punctuated method names are symbols too: `:==`, `:>>`, `:transform!`.
    // Names that are empty or hold delimiters are written quoted: `:"two words"`
    #[regex(r#":[^\s()";]+"#, |lex| lex.slice()[1..].to_string())]
    #[regex(r#":"([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[2..lex.slice().len() - 1]))]
    Symbol(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    Str(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"-?[0-9]+[eE][-+]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    #[token("inf", |_| f64::INFINITY)]
    #[token("-inf", |_| f64::NEG_INFINITY)]
    #[token("nan", |_| f64::NAN)]
    Float(f64),

    /// Node tags
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn unescape(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            other => out.push(other),
        }
    }
    Some(out)
}

impl Token {
    pub fn describe(&self) -> &'static str {
        match self {
            Token::OpenParen => "'('",
            Token::CloseParen => "')'",
            Token::Nil => "nil",
            Token::Symbol(_) => "symbol",
            Token::Str(_) => "string",
            Token::Int(_) => "integer",
            Token::Float(_) => "float",
            Token::Ident(_) => "identifier",
        }
    }
}
