//! Recursive descent parser for request documents.
//!
//! Supported grammar:
//!
//! ```text
//! Document     := Definition+
//! Definition   := SelectionSet
//!               | ("query" | "mutation") Name? VariableDefs? SelectionSet
//! VariableDefs := "(" ("$" Name ":" Type ("=" Value)?)+ ")"
//! SelectionSet := "{" Field+ "}"
//! Field        := (Name ":")? Name Arguments? SelectionSet?
//! Arguments    := "(" (Name ":" Value)+ ")"
//! Type         := (Name | "[" Type "]") "!"?
//! ```
//!
//! Commas are insignificant and `#` starts a comment that runs to the end of
//! the line.

use crate::ast::{Document, InputValue, Operation, OperationKind, Selection, VariableDefinition};
use crate::error::{Location, ParseError};
use crate::schema::TypeRef;

/// Parses a document.
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the first unexpected token.
///
/// # Example
///
/// ```
/// use periscope_query::parser::parse;
///
/// let doc = parse("query Example { a { b } }").unwrap();
/// let op = &doc.operations[0];
/// assert_eq!(op.name.as_deref(), Some("Example"));
/// assert_eq!(op.selection_set[0].selection_set[0].name, "b");
/// ```
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut operations = Vec::new();
    loop {
        operations.push(parser.parse_operation()?);
        if parser.peek_is(&TokenKind::Eof) {
            break;
        }
    }
    Ok(Document { operations })
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Punct(char),
    Spread,
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Punct(c) => format!("\"{c}\""),
            TokenKind::Spread => "\"...\"".to_owned(),
            TokenKind::Name(name) => format!("Name \"{name}\""),
            TokenKind::Int(i) => format!("Int \"{i}\""),
            TokenKind::Float(f) => format!("Float \"{f}\""),
            TokenKind::Str(s) => format!("String \"{s}\""),
            TokenKind::Eof => "<EOF>".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    location: Location,
}

struct Lexer<'a> {
    chars: core::iter::Peekable<core::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, location: Location, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location,
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\n' | '\r' | ',' | '\u{feff}' => {
                    self.bump();
                }
                '#' => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_ignored();
        let location = self.location();
        let Some(&c) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location,
            });
        };

        let kind = match c {
            '!' | '$' | '(' | ')' | ':' | '=' | '@' | '[' | ']' | '{' | '}' | '|' => {
                self.bump();
                TokenKind::Punct(c)
            }
            '.' => {
                for _ in 0..3 {
                    if self.bump() != Some('.') {
                        return Err(self.error(location, "Unexpected \".\""));
                    }
                }
                TokenKind::Spread
            }
            '"' => self.lex_string(location)?,
            '-' | '0'..='9' => self.lex_number(location)?,
            c if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                TokenKind::Name(name)
            }
            other => {
                return Err(self.error(
                    location,
                    format!("Cannot parse the unexpected character \"{other}\"."),
                ));
            }
        };
        Ok(Token { kind, location })
    }

    fn lex_number(&mut self, location: Location) -> Result<TokenKind, ParseError> {
        let mut text = String::new();
        let mut is_float = false;
        if self.chars.peek() == Some(&'-') {
            text.push('-');
            self.bump();
        }
        self.lex_digits(&mut text, location)?;
        if self.chars.peek() == Some(&'.') {
            is_float = true;
            text.push('.');
            self.bump();
            self.lex_digits(&mut text, location)?;
        }
        if let Some(&e @ ('e' | 'E')) = self.chars.peek() {
            is_float = true;
            text.push(e);
            self.bump();
            if let Some(&sign @ ('+' | '-')) = self.chars.peek() {
                text.push(sign);
                self.bump();
            }
            self.lex_digits(&mut text, location)?;
        }

        if is_float {
            text.parse()
                .map(TokenKind::Float)
                .map_err(|_| self.error(location, format!("Invalid number \"{text}\".")))
        } else {
            text.parse()
                .map(TokenKind::Int)
                .map_err(|_| self.error(location, format!("Invalid number \"{text}\".")))
        }
    }

    fn lex_digits(&mut self, text: &mut String, location: Location) -> Result<(), ParseError> {
        let start = text.len();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if text.len() == start {
            return Err(self.error(location, "Invalid number, expected digit."));
        }
        Ok(())
    }

    fn lex_string(&mut self, location: Location) -> Result<TokenKind, ParseError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(location, "Unterminated string.")),
                Some('"') => return Ok(TokenKind::Str(value)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                            u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    self.error(
                                        location,
                                        format!("Invalid unicode escape \"\\u{hex}\"."),
                                    )
                                })?
                        }
                        other => {
                            let shown = other.map(String::from).unwrap_or_default();
                            return Err(self.error(
                                location,
                                format!("Invalid character escape sequence: \\{shown}."),
                            ));
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(core::mem::replace(&mut self.current, next))
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn peek_punct(&self, c: char) -> bool {
        self.current.kind == TokenKind::Punct(c)
    }

    fn unexpected(&self) -> ParseError {
        ParseError {
            message: format!("Unexpected {}", self.current.kind.describe()),
            location: self.current.location,
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<Location, ParseError> {
        if self.peek_punct(c) {
            Ok(self.advance()?.location)
        } else {
            Err(ParseError {
                message: format!("Expected \"{c}\", found {}", self.current.kind.describe()),
                location: self.current.location,
            })
        }
    }

    fn expect_name(&mut self) -> Result<(String, Location), ParseError> {
        if let TokenKind::Name(name) = &self.current.kind {
            let name = name.clone();
            let location = self.advance()?.location;
            Ok((name, location))
        } else {
            Err(ParseError {
                message: format!("Expected Name, found {}", self.current.kind.describe()),
                location: self.current.location,
            })
        }
    }

    fn parse_operation(&mut self) -> Result<Operation, ParseError> {
        let location = self.current.location;
        if self.peek_punct('{') {
            return Ok(Operation {
                kind: OperationKind::Query,
                name: None,
                variables: Vec::new(),
                selection_set: self.parse_selection_set()?,
                location,
            });
        }

        let kind = match &self.current.kind {
            TokenKind::Name(keyword) if keyword == "query" => OperationKind::Query,
            TokenKind::Name(keyword) if keyword == "mutation" => OperationKind::Mutation,
            _ => return Err(self.unexpected()),
        };
        self.advance()?;

        let name = match &self.current.kind {
            TokenKind::Name(_) => Some(self.expect_name()?.0),
            _ => None,
        };
        let variables = if self.peek_punct('(') {
            self.parse_variable_definitions()?
        } else {
            Vec::new()
        };

        Ok(Operation {
            kind,
            name,
            variables,
            selection_set: self.parse_selection_set()?,
            location,
        })
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<VariableDefinition>, ParseError> {
        self.expect_punct('(')?;
        let mut definitions = Vec::new();
        loop {
            let location = self.expect_punct('$')?;
            let (name, _) = self.expect_name()?;
            self.expect_punct(':')?;
            let ty = self.parse_type()?;
            let default_value = if self.peek_punct('=') {
                self.advance()?;
                Some(self.parse_value(true)?)
            } else {
                None
            };
            definitions.push(VariableDefinition {
                name,
                ty,
                default_value,
                location,
            });
            if self.peek_punct(')') {
                self.advance()?;
                return Ok(definitions);
            }
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let inner = if self.peek_punct('[') {
            self.advance()?;
            let item = self.parse_type()?;
            self.expect_punct(']')?;
            TypeRef::list(item)
        } else {
            TypeRef::named(self.expect_name()?.0)
        };
        if self.peek_punct('!') {
            self.advance()?;
            return Ok(TypeRef::non_null(inner));
        }
        Ok(inner)
    }

    fn parse_selection_set(&mut self) -> Result<Vec<Selection>, ParseError> {
        self.expect_punct('{')?;
        let mut selections = Vec::new();
        loop {
            selections.push(self.parse_selection()?);
            if self.peek_punct('}') {
                self.advance()?;
                return Ok(selections);
            }
        }
    }

    fn parse_selection(&mut self) -> Result<Selection, ParseError> {
        let (first, location) = self.expect_name()?;
        let (alias, name) = if self.peek_punct(':') {
            self.advance()?;
            (Some(first), self.expect_name()?.0)
        } else {
            (None, first)
        };

        let arguments = if self.peek_punct('(') {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let selection_set = if self.peek_punct('{') {
            self.parse_selection_set()?
        } else {
            Vec::new()
        };

        Ok(Selection {
            alias,
            name,
            arguments,
            selection_set,
            location,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<(String, InputValue)>, ParseError> {
        self.expect_punct('(')?;
        let mut arguments = Vec::new();
        loop {
            let (name, _) = self.expect_name()?;
            self.expect_punct(':')?;
            arguments.push((name, self.parse_value(false)?));
            if self.peek_punct(')') {
                self.advance()?;
                return Ok(arguments);
            }
        }
    }

    fn parse_value(&mut self, constant: bool) -> Result<InputValue, ParseError> {
        let value = match &self.current.kind {
            TokenKind::Punct('$') if !constant => {
                self.advance()?;
                InputValue::Variable(self.expect_name()?.0)
            }
            TokenKind::Punct('[') => {
                self.advance()?;
                let mut items = Vec::new();
                while !self.peek_punct(']') {
                    items.push(self.parse_value(constant)?);
                }
                self.advance()?;
                InputValue::List(items)
            }
            TokenKind::Punct('{') => {
                self.advance()?;
                let mut fields = Vec::new();
                while !self.peek_punct('}') {
                    let (name, _) = self.expect_name()?;
                    self.expect_punct(':')?;
                    fields.push((name, self.parse_value(constant)?));
                }
                self.advance()?;
                InputValue::Object(fields)
            }
            TokenKind::Int(i) => {
                let value = InputValue::Int(*i);
                self.advance()?;
                value
            }
            TokenKind::Float(f) => {
                let value = InputValue::Float(*f);
                self.advance()?;
                value
            }
            TokenKind::Str(s) => {
                let value = InputValue::String(s.clone());
                self.advance()?;
                value
            }
            TokenKind::Name(name) => {
                let value = match name.as_str() {
                    "true" => InputValue::Boolean(true),
                    "false" => InputValue::Boolean(false),
                    "null" => InputValue::Null,
                    other => InputValue::Enum(other.to_owned()),
                };
                self.advance()?;
                value
            }
            _ => return Err(self.unexpected()),
        };
        Ok(value)
    }
}
