//! Recursive descent parser for navigation instructions.
//!
//! Parses a URL (or validates an object graph) into an [`InstructionTree`].
//! Uses the logos-based tokenizer from [`crate::instruction::tokenizer`].
//!
//! ```text
//! route     := '/'? composite
//! composite := scoped ('+' scoped)*
//! scoped    := segment ('/' scoped)?
//! segment   := '(' composite ')' | '-' ('@' name)? | name params? ('@' name)?
//! params    := '(' (param (',' param)*)? ')'
//! param     := value | key '=' value
//! ```

use std::collections::HashSet;

use logos::Logos;

use super::model::{InstructionTree, NavigationInstruction, Parameters, ViewportInstruction};
use super::tokenizer::Token;
use crate::error::ParseError;

/// A token with its index in the stream (for error reporting).
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    pos: usize,
}

fn tokenize_with_positions(input: &str) -> Vec<PToken> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .enumerate()
        .map(|(pos, (token, span))| PToken {
            token,
            text: input[span].to_string(),
            pos,
        })
        .collect()
}

fn decode(text: &str, pos: usize) -> Result<String, ParseError> {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::UnexpectedToken {
            position: pos,
            message: format!("invalid percent-encoding in '{text}'"),
        })
}

fn malformed(segment: &str, message: impl Into<String>) -> ParseError {
    ParseError::MalformedParameter {
        segment: segment.to_owned(),
        message: message.into(),
    }
}

/// Parse any navigation input into a validated [`InstructionTree`].
pub fn parse(input: impl Into<NavigationInstruction>) -> Result<InstructionTree, ParseError> {
    let tree = match input.into() {
        NavigationInstruction::Url(url) => return parse_url(&url),
        NavigationInstruction::Component(component) => {
            InstructionTree::new(vec![ViewportInstruction::new(component)])
        }
        NavigationInstruction::Instruction(instruction) => InstructionTree::new(vec![instruction]),
        NavigationInstruction::Instructions(list) => InstructionTree::new(list),
        NavigationInstruction::Tree(tree) => tree,
    };
    validate(&tree.instructions)?;
    Ok(tree)
}

/// Parse a URL string into a validated [`InstructionTree`].
pub fn parse_url(input: &str) -> Result<InstructionTree, ParseError> {
    let mut parser = Parser {
        tokens: tokenize_with_positions(input),
        cursor: 0,
    };
    let instructions = parser.parse_route()?;
    validate(&instructions)?;
    Ok(InstructionTree::new(instructions))
}

/// Check the rules URL parsing enforces, for instructions built as objects.
pub fn validate(list: &[ViewportInstruction]) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for instruction in list {
        if let Some(viewport) = &instruction.viewport {
            if viewport.is_empty() {
                return Err(ParseError::InvalidInstruction("empty viewport name".into()));
            }
            if !seen.insert(viewport.as_str()) {
                return Err(ParseError::DuplicateViewport {
                    viewport: viewport.clone(),
                });
            }
        }
        match &instruction.component {
            None => {
                if !instruction.parameters.is_empty() {
                    return Err(malformed("-", "a clear segment takes no parameters"));
                }
                if !instruction.children.is_empty() {
                    return Err(ParseError::InvalidInstruction(
                        "a cleared viewport cannot have children".into(),
                    ));
                }
            }
            Some(component) => {
                let name = component.name();
                if name.is_empty() || name.starts_with('-') {
                    return Err(ParseError::InvalidInstruction(format!(
                        "invalid component name '{name}'"
                    )));
                }
                if instruction.parameters.iter().any(|p| {
                    p.value.is_empty() || p.name.as_deref().is_some_and(str::is_empty)
                }) {
                    return Err(malformed(name, "empty parameter"));
                }
            }
        }
        validate(&instruction.children)?;
    }
    Ok(())
}

/// Recursive descent parser state.
struct Parser {
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.tokens.len())
    }

    fn expect(&mut self, expected: &Token) -> Result<PToken, ParseError> {
        match self.advance() {
            Some(tok) if &tok.token == expected => Ok(tok),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected {:?}, got {:?} '{}'", expected, tok.token, tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {expected:?}"))),
        }
    }

    fn parse_route(&mut self) -> Result<Vec<ViewportInstruction>, ParseError> {
        let instructions = self.parse_composite()?;
        match self.peek() {
            None => Ok(instructions),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("unexpected {:?} '{}'", tok.token, tok.text),
            }),
        }
    }

    /// `scoped ('+' scoped)*`. Empty entries (`a++b`, leading `/`) are skipped.
    fn parse_composite(&mut self) -> Result<Vec<ViewportInstruction>, ParseError> {
        let mut out = Vec::new();
        loop {
            match self.peek_token() {
                None | Some(Token::ParenClose) => break,
                Some(Token::Plus) | Some(Token::Slash) => {
                    self.advance();
                }
                Some(_) => {
                    out.extend(self.parse_scoped()?);
                    if self.peek_token() == Some(&Token::Plus) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(out)
    }

    /// `segment ('/' scoped)?`. Repeated and trailing slashes are skipped.
    fn parse_scoped(&mut self) -> Result<Vec<ViewportInstruction>, ParseError> {
        let mut heads = self.parse_segment()?;
        if self.peek_token() != Some(&Token::Slash) {
            return Ok(heads);
        }
        while self.peek_token() == Some(&Token::Slash) {
            self.advance();
        }
        if matches!(
            self.peek_token(),
            None | Some(Token::Plus) | Some(Token::ParenClose)
        ) {
            return Ok(heads);
        }

        let position = self.current_pos();
        let children = self.parse_scoped()?;
        match heads.as_mut_slice() {
            [head] if !head.is_clear() => head.children.extend(children),
            [_] => {
                return Err(ParseError::InvalidInstruction(
                    "a cleared viewport cannot have children".into(),
                ))
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    position,
                    message: "only a single segment can have children".into(),
                })
            }
        }
        Ok(heads)
    }

    fn parse_segment(&mut self) -> Result<Vec<ViewportInstruction>, ParseError> {
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expected a segment".into()))?;

        match tok.token {
            Token::ParenOpen => {
                let inner = self.parse_composite()?;
                self.expect(&Token::ParenClose)?;
                Ok(inner)
            }
            Token::Text if tok.text == "-" => {
                let viewport = self.parse_viewport_suffix()?;
                if self.peek_token() == Some(&Token::ParenOpen) {
                    return Err(malformed("-", "a clear segment takes no parameters"));
                }
                Ok(vec![ViewportInstruction::clear(viewport.as_deref())])
            }
            Token::Text if tok.text.starts_with('-') => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("component name '{}' cannot start with '-'", tok.text),
            }),
            Token::Text => {
                let name = decode(&tok.text, tok.pos)?;
                let mut instruction = ViewportInstruction::new(name.as_str());
                if self.peek_token() == Some(&Token::ParenOpen) {
                    instruction.parameters = self.parse_params(&name)?;
                }
                instruction.viewport = self.parse_viewport_suffix()?;
                Ok(vec![instruction])
            }
            other => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected a segment, got {:?} '{}'", other, tok.text),
            }),
        }
    }

    /// `('@' name)?`
    fn parse_viewport_suffix(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek_token() != Some(&Token::At) {
            return Ok(None);
        }
        self.advance();
        match self.advance() {
            Some(tok) if tok.token == Token::Text => decode(&tok.text, tok.pos).map(Some),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected a viewport name after '@', got '{}'", tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(
                "expected a viewport name after '@'".into(),
            )),
        }
    }

    /// `'(' (param (',' param)*)? ')'`
    fn parse_params(&mut self, segment: &str) -> Result<Parameters, ParseError> {
        self.expect(&Token::ParenOpen)?;
        let mut params = Parameters::new();
        if self.peek_token() == Some(&Token::ParenClose) {
            self.advance();
            return Ok(params);
        }

        loop {
            let first = match self.advance() {
                Some(tok) if tok.token == Token::Text => decode(&tok.text, tok.pos)?,
                Some(tok) => {
                    return Err(malformed(
                        segment,
                        format!("expected a value, got '{}'", tok.text),
                    ))
                }
                None => return Err(malformed(segment, "unclosed parameter list")),
            };

            if self.peek_token() == Some(&Token::Equals) {
                self.advance();
                let value = match self.advance() {
                    Some(tok) if tok.token == Token::Text => decode(&tok.text, tok.pos)?,
                    Some(_) => {
                        return Err(malformed(segment, format!("missing value for '{first}'")))
                    }
                    None => return Err(malformed(segment, "unclosed parameter list")),
                };
                params.push_named(first, value);
            } else {
                params.push_positional(first);
            }

            match self.advance() {
                Some(tok) if tok.token == Token::Comma => continue,
                Some(tok) if tok.token == Token::ParenClose => break,
                Some(tok) => {
                    return Err(malformed(
                        segment,
                        format!("unexpected '{}' in parameter list", tok.text),
                    ))
                }
                None => return Err(malformed(segment, "unclosed parameter list")),
            }
        }

        Ok(params)
    }
}
