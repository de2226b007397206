use malt_core::{CritMap, ReadError, Span, Value};

use crate::lexer::{Lexer, SpannedToken, Token};

/// One form read from the front of some text.
#[derive(Debug, Clone, PartialEq)]
pub struct Read<'a> {
    pub value: Value,
    /// Text after the form, untouched.
    pub rest: &'a str,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<SpannedToken>,
    consumed: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            lookahead: None,
            consumed: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<&SpannedToken>, ReadError> {
        if self.lookahead.is_none() {
            self.lookahead = self.lexer.next_token()?;
        }
        Ok(self.lookahead.as_ref())
    }

    fn advance(&mut self) -> Result<Option<SpannedToken>, ReadError> {
        self.peek()?;
        let tok = self.lookahead.take();
        if let Some(t) = &tok {
            self.consumed = t.end;
        }
        Ok(tok)
    }

    fn parse_expr(&mut self) -> Result<Value, ReadError> {
        let Some(tok) = self.advance()? else {
            return Err(ReadError::EmptyInput);
        };
        let span = tok.span;
        match tok.token {
            Token::LParen => Ok(Value::list(self.parse_seq(')', "')'", span)?)),
            Token::LBracket => Ok(Value::vector(self.parse_seq(']', "']'", span)?)),
            Token::LBrace => self.parse_map(span),
            Token::RParen => Err(stray(')', span)),
            Token::RBracket => Err(stray(']', span)),
            Token::RBrace => Err(stray('}', span)),
            Token::Quote => self.wrap("quote", span),
            Token::Quasiquote => self.wrap("quasiquote", span),
            Token::Unquote => self.wrap("unquote", span),
            Token::SpliceUnquote => self.wrap("splice-unquote", span),
            Token::Deref => self.wrap("deref", span),
            Token::Meta => {
                let meta = self.parse_operand(span)?;
                let target = self.parse_operand(span)?;
                Ok(Value::list(vec![Value::symbol("with-meta"), target, meta]))
            }
            Token::Int(n) => Ok(Value::Int(n)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::String(s) => Ok(Value::string(&s)),
            Token::Symbol(s) => Ok(Value::symbol(&s)),
            Token::Keyword(s) => Ok(Value::keyword(&s)),
            Token::Bool(b) => Ok(Value::Bool(b)),
            Token::Nil => Ok(Value::Nil),
        }
    }

    /// The form following a reader macro. Running out of text here means the
    /// input is incomplete, not empty.
    fn parse_operand(&mut self, span: Span) -> Result<Value, ReadError> {
        match self.parse_expr() {
            Err(ReadError::EmptyInput) => Err(ReadError::UnbalancedInput {
                expected: "a form",
                span,
            }),
            other => other,
        }
    }

    fn wrap(&mut self, head: &str, span: Span) -> Result<Value, ReadError> {
        let inner = self.parse_operand(span)?;
        Ok(Value::list(vec![Value::symbol(head), inner]))
    }

    fn parse_seq(
        &mut self,
        close: char,
        expected: &'static str,
        open: Span,
    ) -> Result<Vec<Value>, ReadError> {
        let mut items = Vec::new();
        loop {
            let next = self.peek()?.map(|t| (closer(&t.token), t.span));
            match next {
                None => {
                    return Err(ReadError::UnbalancedInput {
                        expected,
                        span: open,
                    })
                }
                Some((Some(c), _)) if c == close => {
                    self.advance()?;
                    return Ok(items);
                }
                Some((Some(c), span)) => return Err(stray(c, span)),
                Some((None, _)) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_map(&mut self, open: Span) -> Result<Value, ReadError> {
        let items = self.parse_seq('}', "'}'", open)?;
        if items.len() % 2 != 0 {
            return Err(ReadError::Malformed {
                message: "map literal must have an even number of forms".to_string(),
                span: open,
            });
        }
        let mut map = CritMap::new();
        for pair in items.chunks(2) {
            map = map
                .insert(pair[0].clone(), pair[1].clone())
                .map_err(|_| ReadError::Malformed {
                    message: format!("map key must be a string or keyword, got {}", pair[0]),
                    span: open,
                })?;
        }
        Ok(Value::map(map))
    }
}

fn closer(token: &Token) -> Option<char> {
    match token {
        Token::RParen => Some(')'),
        Token::RBracket => Some(']'),
        Token::RBrace => Some('}'),
        _ => None,
    }
}

fn stray(found: char, span: Span) -> ReadError {
    ReadError::UnexpectedCloseDelimiter { found, span }
}

/// Read the first form of `input` and report what follows it.
pub fn read_one(input: &str) -> Result<Read<'_>, ReadError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_expr()?;
    Ok(Read {
        value,
        rest: &input[parser.consumed..],
    })
}

/// Read a single form.
pub fn read(input: &str) -> Result<Value, ReadError> {
    read_one(input).map(|r| r.value)
}

/// Read all forms in `input`. Blank input gives an empty vector.
pub fn read_many(input: &str) -> Result<Vec<Value>, ReadError> {
    let mut parser = Parser::new(input);
    let mut exprs = Vec::new();
    while parser.peek()?.is_some() {
        exprs.push(parser.parse_expr()?);
    }
    Ok(exprs)
}
