//! Dynamically typed cells and the column type vocabulary.
//!
//! [`Datum`] is what the Any binder and the tabular field reader produce:
//! a native value promoted from lexical JSON. Number promotion tries
//! `i32`, then `i64`, then `f64`, then `Decimal`, and keeps the lexical
//! text when none fit.

use chrono::{DateTime, Duration, FixedOffset};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, FromJson, FromJsonAsync, Tokens};
use crate::value::Value;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Datum {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Date(DateTime<FixedOffset>),
    Span(Duration),
    Guid(Uuid),
    List(Vec<Datum>),
    /// String-keyed members in insertion order.
    Map(IndexMap<String, Datum>),
    /// An uninterpreted value tree, from `json`-typed columns.
    Json(Value),
}

impl Datum {
    /// Promotes lexical number text to the narrowest fitting variant.
    pub fn from_number_text(text: &str) -> Datum {
        if let Ok(v) = text.parse::<i32>() {
            return Datum::Int(v);
        }
        if let Ok(v) = text.parse::<i64>() {
            return Datum::Long(v);
        }
        if let Ok(v) = text.parse::<f64>() {
            if v.is_finite() {
                return Datum::Double(v);
            }
        }
        if let Ok(v) = text.parse::<Decimal>() {
            return Datum::Decimal(v);
        }
        Datum::Text(text.to_owned())
    }
}

impl FromJson for Datum {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::Null => {
                tokens.next_token()?;
                Ok(Datum::Null)
            }
            TokenKind::True => {
                tokens.next_token()?;
                Ok(Datum::Bool(true))
            }
            TokenKind::False => {
                tokens.next_token()?;
                Ok(Datum::Bool(false))
            }
            TokenKind::Number => {
                let text = tokens.read_value()?;
                Ok(Datum::from_number_text(&text))
            }
            TokenKind::String => Ok(Datum::Text(tokens.read_value()?)),
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
                        _ => items.push(Datum::from_json(tokens)?),
                    }
                }
                Ok(Datum::List(items))
            }
            TokenKind::ObjectStart => {
                tokens.next_token()?;
                let mut map = IndexMap::new();
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
                            map.insert(name, Datum::from_json(tokens)?);
                        }
                        _ => tokens.skip_element()?,
                    }
                }
                Ok(Datum::Map(map))
            }
            _ => {
                tokens.skip_element()?;
                Ok(Datum::Null)
            }
        }
    }
}

impl FromJsonAsync for Datum {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        match tokens.kind() {
            TokenKind::Null => {
                tokens.next_token().await?;
                Ok(Datum::Null)
            }
            TokenKind::True => {
                tokens.next_token().await?;
                Ok(Datum::Bool(true))
            }
            TokenKind::False => {
                tokens.next_token().await?;
                Ok(Datum::Bool(false))
            }
            TokenKind::Number => {
                let text = tokens.read_value().await?;
                Ok(Datum::from_number_text(&text))
            }
            TokenKind::String => Ok(Datum::Text(tokens.read_value().await?)),
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
                        _ => items.push(Box::pin(Datum::from_json_async(tokens)).await?),
                    }
                }
                Ok(Datum::List(items))
            }
            TokenKind::ObjectStart => {
                tokens.next_token().await?;
                let mut map = IndexMap::new();
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
                            map.insert(name, Box::pin(Datum::from_json_async(tokens)).await?);
                        }
                        _ => tokens.skip_element().await?,
                    }
                }
                Ok(Datum::Map(map))
            }
            _ => {
                tokens.skip_element().await?;
                Ok(Datum::Null)
            }
        }
    }
}

/// The column type vocabulary of tabular documents.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    /// Untyped: bound by the Any reader.
    #[default]
    Any,
    Text,
    UInt8,
    Int8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float64,
    Float32,
    Decimal,
    DateTime,
    TimeSpan,
    Guid,
    Bool,
    /// Bound as an unparsed [`Value`] tree.
    Json,
}

impl ColumnType {
    /// Resolves a declared column type name, case-insensitively. Unknown
    /// names fall through to [`ColumnType::Any`].
    pub fn parse(name: &str) -> ColumnType {
        match name.to_ascii_lowercase().as_str() {
            "object" | "" => ColumnType::Any,
            "string" => ColumnType::Text,
            "byte" | "uint8" => ColumnType::UInt8,
            "sbyte" | "int8" => ColumnType::Int8,
            "short" | "int16" => ColumnType::Int16,
            "ushort" | "uint16" => ColumnType::UInt16,
            "int" | "int32" => ColumnType::Int32,
            "uint" | "uint32" => ColumnType::UInt32,
            "long" | "int64" => ColumnType::Int64,
            "ulong" | "uint64" => ColumnType::UInt64,
            "double" | "real" => ColumnType::Float64,
            "float" | "single" => ColumnType::Float32,
            "decimal" => ColumnType::Decimal,
            "datetime" => ColumnType::DateTime,
            "timespan" => ColumnType::TimeSpan,
            "guid" => ColumnType::Guid,
            "bool" | "boolean" => ColumnType::Bool,
            "json" => ColumnType::Json,
            _ => ColumnType::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::from_json_text;

    #[test]
    fn number_promotion_order() {
        assert_eq!(Datum::from_number_text("1"), Datum::Int(1));
        assert_eq!(
            Datum::from_number_text("3000000000"),
            Datum::Long(3_000_000_000)
        );
        assert_eq!(Datum::from_number_text("3.5"), Datum::Double(3.5));
        assert_eq!(Datum::from_number_text("x"), Datum::Text("x".into()));
    }

    #[test]
    fn binds_mixed_list() {
        let d: Datum = from_json_text(r#"[1,"two",3.5,true,null]"#).unwrap();
        let Datum::List(items) = d else { panic!("expected list") };
        assert_eq!(items[0], Datum::Int(1));
        assert_eq!(items[1], Datum::Text("two".into()));
        assert_eq!(items[2], Datum::Double(3.5));
        assert_eq!(items[3], Datum::Bool(true));
        assert_eq!(items[4], Datum::Null);
    }

    #[test]
    fn map_keeps_insertion_order() {
        let d: Datum = from_json_text(r#"{"a":1,"b":"x"}"#).unwrap();
        let Datum::Map(map) = d else { panic!("expected map") };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(map["a"], Datum::Int(1));
        assert_eq!(map["b"], Datum::Text("x".into()));
    }

    #[test]
    fn column_type_vocabulary() {
        assert_eq!(ColumnType::parse("LONG"), ColumnType::Int64);
        assert_eq!(ColumnType::parse("Real"), ColumnType::Float64);
        assert_eq!(ColumnType::parse("boolean"), ColumnType::Bool);
        assert_eq!(ColumnType::parse(""), ColumnType::Any);
        assert_eq!(ColumnType::parse("mystery"), ColumnType::Any);
    }
}
