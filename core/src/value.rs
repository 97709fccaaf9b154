//! The lexical JSON value tree.
//!
//! `Value` preserves what was written rather than what it might mean:
//! numbers keep their lexical text, object members keep insertion order.
//! Typed interpretation is the binder's job (see [`Datum`] for the
//! promoted dynamic form).
//!
//! [`Datum`]: crate::datum::Datum

use crate::error::ScanResult;
use crate::read::skip_and_default;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, FromJson, FromJsonAsync, Tokens};

/// A JSON value with lexical fidelity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// A number, kept as its source text.
    Number(String),
    String(String),
    List(Vec<Value>),
    /// Members in insertion order.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Looks up an object member by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Element count for lists and objects.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Object(entries) => Some(entries.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|n| n == 0)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Lexical number text, if this is a number.
    pub fn number_text(&self) -> Option<&str> {
        match self {
            Value::Number(text) => Some(text),
            _ => None,
        }
    }
}

impl FromJson for Value {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::Null => {
                tokens.next_token()?;
                Ok(Value::Null)
            }
            TokenKind::True => {
                tokens.next_token()?;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                tokens.next_token()?;
                Ok(Value::Bool(false))
            }
            TokenKind::Number => Ok(Value::Number(tokens.read_value()?)),
            TokenKind::String => Ok(Value::String(tokens.read_value()?)),
            TokenKind::ListStart => {
                tokens.next_token()?;
                let mut items = Vec::new();
                loop {
                    match tokens.kind() {
                        TokenKind::ListEnd => {
                            tokens.next_token()?;
                            break;
                        }
                        TokenKind::None => break,
                        TokenKind::Comma => {
                            tokens.next_token()?;
                        }
                        _ => items.push(Value::from_json(tokens)?),
                    }
                }
                Ok(Value::List(items))
            }
            TokenKind::ObjectStart => {
                tokens.next_token()?;
                let mut entries = Vec::new();
                loop {
                    match tokens.kind() {
                        TokenKind::ObjectEnd => {
                            tokens.next_token()?;
                            break;
                        }
                        TokenKind::None => break,
                        TokenKind::Comma | TokenKind::Colon => {
                            tokens.next_token()?;
                        }
                        TokenKind::String => {
                            let name = tokens.read_value()?;
                            if tokens.kind() == TokenKind::Colon {
                                tokens.next_token()?;
                            }
                            entries.push((name, Value::from_json(tokens)?));
                        }
                        _ => tokens.skip_element()?,
                    }
                }
                Ok(Value::Object(entries))
            }
            _ => skip_and_default(tokens),
        }
    }
}

impl FromJsonAsync for Value {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::Null => {
                tokens.next_token().await?;
                Ok(Value::Null)
            }
            TokenKind::True => {
                tokens.next_token().await?;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                tokens.next_token().await?;
                Ok(Value::Bool(false))
            }
            TokenKind::Number => Ok(Value::Number(tokens.read_value().await?)),
            TokenKind::String => Ok(Value::String(tokens.read_value().await?)),
            TokenKind::ListStart => {
                tokens.next_token().await?;
                let mut items = Vec::new();
                loop {
                    match tokens.kind() {
                        TokenKind::ListEnd => {
                            tokens.next_token().await?;
                            break;
                        }
                        TokenKind::None => break,
                        TokenKind::Comma => {
                            tokens.next_token().await?;
                        }
                        _ => items.push(Box::pin(Value::from_json_async(tokens)).await?),
                    }
                }
                Ok(Value::List(items))
            }
            TokenKind::ObjectStart => {
                tokens.next_token().await?;
                let mut entries = Vec::new();
                loop {
                    match tokens.kind() {
                        TokenKind::ObjectEnd => {
                            tokens.next_token().await?;
                            break;
                        }
                        TokenKind::None => break,
                        TokenKind::Comma | TokenKind::Colon => {
                            tokens.next_token().await?;
                        }
                        TokenKind::String => {
                            let name = tokens.read_value().await?;
                            if tokens.kind() == TokenKind::Colon {
                                tokens.next_token().await?;
                            }
                            entries.push((name, Box::pin(Value::from_json_async(tokens)).await?));
                        }
                        _ => tokens.skip_element().await?,
                    }
                }
                Ok(Value::Object(entries))
            }
            _ => {
                tokens.skip_element().await?;
                Ok(Value::Null)
            }
        }
    }
}
