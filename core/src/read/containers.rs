//! Container readers: options, boxes, sequences, and string-keyed maps.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, FromJson, FromJsonAsync, Tokens};

impl<T: FromJson> FromJson for Option<T> {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        if tokens.kind() == TokenKind::Null {
            tokens.next_token()?;
            return Ok(None);
        }
        Ok(Some(T::from_json(tokens)?))
    }
}

impl<T: FromJsonAsync> FromJsonAsync for Option<T> {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        if tokens.kind() == TokenKind::Null {
            tokens.next_token().await?;
            return Ok(None);
        }
        Ok(Some(T::from_json_async(tokens).await?))
    }
}

impl<T: FromJson> FromJson for Box<T> {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        Ok(Box::new(T::from_json(tokens)?))
    }
}

impl<T: FromJsonAsync> FromJsonAsync for Box<T> {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        Ok(Box::new(T::from_json_async(tokens).await?))
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
        let mut items = Vec::new();
        match tokens.kind() {
            TokenKind::ListStart => {
                tokens.next_token()?;
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
                        _ => items.push(T::from_json(tokens)?),
                    }
                }
            }
            TokenKind::Null => {
                tokens.next_token()?;
            }
            _ => tokens.skip_element()?,
        }
        Ok(items)
    }
}

impl<T: FromJsonAsync> FromJsonAsync for Vec<T> {
    async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
        let mut items = Vec::new();
        match tokens.kind() {
            TokenKind::ListStart => {
                tokens.next_token().await?;
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
                        _ => items.push(T::from_json_async(tokens).await?),
                    }
                }
            }
            TokenKind::Null => {
                tokens.next_token().await?;
            }
            _ => tokens.skip_element().await?,
        }
        Ok(items)
    }
}

macro_rules! map_from_json {
    ($($map:ident),* $(,)?) => {$(
        impl<V: FromJson> FromJson for $map<String, V> {
            fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self> {
                let mut map = $map::default();
                match tokens.kind() {
                    TokenKind::ObjectStart => {
                        tokens.next_token()?;
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
                                    let key = tokens.read_value()?;
                                    if tokens.kind() == TokenKind::Colon {
                                        tokens.next_token()?;
                                    }
                                    map.insert(key, V::from_json(tokens)?);
                                }
                                _ => tokens.skip_element()?,
                            }
                        }
                    }
                    TokenKind::Null => {
                        tokens.next_token()?;
                    }
                    _ => tokens.skip_element()?,
                }
                Ok(map)
            }
        }

        impl<V: FromJsonAsync> FromJsonAsync for $map<String, V> {
            async fn from_json_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Self> {
                let mut map = $map::default();
                match tokens.kind() {
                    TokenKind::ObjectStart => {
                        tokens.next_token().await?;
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
                                    let key = tokens.read_value().await?;
                                    if tokens.kind() == TokenKind::Colon {
                                        tokens.next_token().await?;
                                    }
                                    map.insert(key, V::from_json_async(tokens).await?);
                                }
                                _ => tokens.skip_element().await?,
                            }
                        }
                    }
                    TokenKind::Null => {
                        tokens.next_token().await?;
                    }
                    _ => tokens.skip_element().await?,
                }
                Ok(map)
            }
        }
    )*};
}

map_from_json!(HashMap, BTreeMap, IndexMap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::from_json_text;

    #[test]
    fn vec_of_numbers() {
        let v: Vec<i32> = from_json_text("[1, 2, 3]").unwrap();
        assert_eq!(v, [1, 2, 3]);
    }

    #[test]
    fn vec_tolerates_redundant_commas() {
        let v: Vec<i32> = from_json_text("[1,,2,]").unwrap();
        assert_eq!(v, [1, 2]);
    }

    #[test]
    fn vec_on_null_and_mismatch() {
        let v: Vec<i32> = from_json_text("null").unwrap();
        assert!(v.is_empty());
        let v: Vec<i32> = from_json_text(r#""nope""#).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn option_null_and_value() {
        assert_eq!(from_json_text::<Option<i32>>("null").unwrap(), None);
        assert_eq!(from_json_text::<Option<i32>>("4").unwrap(), Some(4));
    }

    #[test]
    fn maps_bind_string_keys() {
        let m: HashMap<String, i64> = from_json_text(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m["b"], 2);

        let m: IndexMap<String, String> = from_json_text(r#"{"z":"1","a":"2"}"#).unwrap();
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn nested_containers() {
        let m: BTreeMap<String, Vec<Option<i32>>> =
            from_json_text(r#"{"xs":[1,null,3]}"#).unwrap();
        assert_eq!(m["xs"], [Some(1), None, Some(3)]);
    }
}
