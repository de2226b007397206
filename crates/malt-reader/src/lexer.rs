use malt_core::{ReadError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Quote,
    Quasiquote,
    Unquote,
    SpliceUnquote,
    Deref,
    Meta,
    Int(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Keyword(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    /// Byte offset just past the token.
    pub end: usize,
}

/// On-demand tokenizer. Tokens are produced one at a time so a reader can
/// stop after the first complete form without looking at the rest.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ';' => {
                    while matches!(self.peek(), Some(c) if c != '\n') {
                        self.bump();
                    }
                }
                c if c.is_whitespace() || c == ',' => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Option<SpannedToken>, ReadError> {
        self.skip_trivia();
        let span = self.span();
        let Some(ch) = self.bump() else {
            return Ok(None);
        };

        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '\'' => Token::Quote,
            '`' => Token::Quasiquote,
            '~' if self.peek() == Some('@') => {
                self.bump();
                Token::SpliceUnquote
            }
            '~' => Token::Unquote,
            '@' => Token::Deref,
            '^' => Token::Meta,
            '"' => self.read_string(span)?,
            _ => {
                let start = self.pos - ch.len_utf8();
                while matches!(self.peek(), Some(c) if is_atom_char(c)) {
                    self.bump();
                }
                classify(&self.src[start..self.pos], span)?
            }
        };

        Ok(Some(SpannedToken {
            token,
            span,
            end: self.pos,
        }))
    }

    fn read_string(&mut self, span: Span) -> Result<Token, ReadError> {
        let unterminated = ReadError::UnbalancedInput {
            expected: "'\"'",
            span,
        };
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(unterminated),
                Some('"') => return Ok(Token::String(s)),
                Some('\\') => match self.bump() {
                    None => return Err(unterminated),
                    Some('n') => s.push('\n'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                },
                Some(c) => s.push(c),
            }
        }
    }
}

/// Tokenize all of `input`.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, ReadError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

fn is_atom_char(ch: char) -> bool {
    !(ch.is_whitespace()
        || matches!(
            ch,
            ',' | ';' | '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '`' | '"'
        ))
}

fn classify(text: &str, span: Span) -> Result<Token, ReadError> {
    match text {
        "nil" => return Ok(Token::Nil),
        "true" => return Ok(Token::Bool(true)),
        "false" => return Ok(Token::Bool(false)),
        _ => {}
    }
    if let Some(name) = text.strip_prefix(':') {
        if name.is_empty() {
            return Err(ReadError::Malformed {
                message: "expected keyword name after ':'".to_string(),
                span,
            });
        }
        return Ok(Token::Keyword(name.to_string()));
    }
    if is_integer(text) {
        return text.parse().map(Token::Int).map_err(|_| ReadError::Malformed {
            message: format!("integer out of range: {text}"),
            span,
        });
    }
    if is_float(text) {
        if let Ok(f) = text.parse() {
            return Ok(Token::Float(f));
        }
    }
    Ok(Token::Symbol(text.to_string()))
}

fn is_integer(text: &str) -> bool {
    let digits = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(text: &str) -> bool {
    let body = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let mut dots = 0;
    let mut digits = 0;
    for b in body.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return false,
        }
    }
    dots == 1 && digits > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn delimiters_and_macros() {
        assert_eq!(
            kinds("( ) [ ] { } ' ` ~ ~@ @ ^"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
                Token::Quote,
                Token::Quasiquote,
                Token::Unquote,
                Token::SpliceUnquote,
                Token::Deref,
                Token::Meta,
            ]
        );
    }

    #[test]
    fn commas_and_comments_are_trivia() {
        assert_eq!(
            kinds("1,2 ; three\n,,4"),
            vec![Token::Int(1), Token::Int(2), Token::Int(4)]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("-12"), vec![Token::Int(-12)]);
        assert_eq!(kinds("1.5"), vec![Token::Float(1.5)]);
        assert_eq!(kinds("-.5"), vec![Token::Float(-0.5)]);
        assert_eq!(kinds("+2.0"), vec![Token::Float(2.0)]);
        assert_eq!(kinds("+2"), vec![Token::Int(2)]);
        assert_eq!(kinds("+"), vec![Token::Symbol("+".into())]);
        assert_eq!(kinds("+a"), vec![Token::Symbol("+a".into())]);
        assert_eq!(kinds("1.2.3"), vec![Token::Symbol("1.2.3".into())]);
        assert_eq!(kinds("-"), vec![Token::Symbol("-".into())]);
        assert_eq!(kinds("."), vec![Token::Symbol(".".into())]);
    }

    #[test]
    fn integer_overflow_is_malformed() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(matches!(err, ReadError::Malformed { .. }));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\\c\"d\q""#),
            vec![Token::String("a\nb\\c\"d\\q".into())]
        );
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize("\"abc").unwrap_err();
        assert!(err.is_incomplete());
        let err = tokenize("\"abc\\").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn keywords_and_literals() {
        assert_eq!(
            kinds(":kw nil true false sym!"),
            vec![
                Token::Keyword("kw".into()),
                Token::Nil,
                Token::Bool(true),
                Token::Bool(false),
                Token::Symbol("sym!".into()),
            ]
        );
        assert!(tokenize(":").is_err());
    }

    #[test]
    fn spans_and_offsets() {
        let toks = tokenize("(a\n  bc)").unwrap();
        assert_eq!(toks[1].span, Span::point(1, 2));
        assert_eq!(toks[2].span, Span::point(2, 3));
        assert_eq!(toks[2].end, 7);
        assert_eq!(toks[3].end, 8);
    }

    #[test]
    fn unicode_symbols() {
        assert_eq!(kinds("λ→x"), vec![Token::Symbol("λ→x".into())]);
    }
}
