//! Generic record-binding walks.
//!
//! `#[derive(FromJson)]` generates the per-type field dispatch
//! ([`JsonRecord`]); the object-shaped walk lives here so every record
//! type shares one implementation, and so the tabular row binder can
//! reuse the same dispatch with column names instead of property names.
//!
//! [`JsonRecord`]: crate::traits::JsonRecord

use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, JsonRecord, JsonRecordAsync, Tokens};

/// Reads an object into a record: properties are matched to fields
/// case-insensitively, unknown properties are skipped, missing fields
/// default. Any non-object shape is skipped and yields the all-default
/// record.
pub fn read_record<T: JsonRecord>(tokens: &mut dyn Tokens) -> ScanResult<T> {
    let mut partial = T::Partial::default();
    if tokens.kind() != TokenKind::ObjectStart {
        tokens.skip_element()?;
        return Ok(T::finish(partial));
    }
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
                let name = tokens.read_value()?;
                if tokens.kind() == TokenKind::Colon {
                    tokens.next_token()?;
                }
                if !T::read_field(&mut partial, &name, tokens)? {
                    tokens.skip_element()?;
                }
            }
            _ => tokens.skip_element()?,
        }
    }
    Ok(T::finish(partial))
}

/// The suspending twin of [`read_record`].
pub async fn read_record_async<T: JsonRecordAsync, A: AsyncTokens>(
    tokens: &mut A,
) -> ScanResult<T> {
    let mut partial = T::Partial::default();
    if tokens.kind() != TokenKind::ObjectStart {
        tokens.skip_element().await?;
        return Ok(T::finish(partial));
    }
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
                let name = tokens.read_value().await?;
                if tokens.kind() == TokenKind::Colon {
                    tokens.next_token().await?;
                }
                if !T::read_field_async(&mut partial, &name, tokens).await? {
                    tokens.skip_element().await?;
                }
            }
            _ => tokens.skip_element().await?,
        }
    }
    Ok(T::finish(partial))
}
