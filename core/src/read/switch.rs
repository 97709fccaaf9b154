//! Per-shape reader composition.

use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::Tokens;

type Handler<T> = Box<dyn Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync>;

/// A discriminated reader: selects a sub-reader by the current token's
/// shape. Shapes without a handler fall back to `fallback`, or skip the
/// element and yield the default.
///
/// ```ignore
/// let reader = Switch::<i64>::new()
///     .on_number(|t| i64::from_json(t))
///     .on_string(|t| Ok(t.read_value()?.len() as i64));
/// let n = reader.read(&mut scanner)?;
/// ```
pub struct Switch<T> {
    on_null: Option<Handler<T>>,
    on_bool: Option<Handler<T>>,
    on_number: Option<Handler<T>>,
    on_string: Option<Handler<T>>,
    on_list: Option<Handler<T>>,
    on_object: Option<Handler<T>>,
    fallback: Option<Handler<T>>,
}

impl<T: Default> Default for Switch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Switch<T> {
    pub fn new() -> Self {
        Self {
            on_null: None,
            on_bool: None,
            on_number: None,
            on_string: None,
            on_list: None,
            on_object: None,
            fallback: None,
        }
    }

    pub fn on_null(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_null = Some(Box::new(f));
        self
    }

    pub fn on_bool(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_bool = Some(Box::new(f));
        self
    }

    pub fn on_number(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_number = Some(Box::new(f));
        self
    }

    pub fn on_string(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_string = Some(Box::new(f));
        self
    }

    pub fn on_list(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_list = Some(Box::new(f));
        self
    }

    pub fn on_object(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.on_object = Some(Box::new(f));
        self
    }

    pub fn fallback(mut self, f: impl Fn(&mut dyn Tokens) -> ScanResult<T> + Send + Sync + 'static) -> Self {
        self.fallback = Some(Box::new(f));
        self
    }

    /// Reads one element, dispatching on its shape.
    pub fn read(&self, tokens: &mut dyn Tokens) -> ScanResult<T> {
        let handler = match tokens.kind() {
            TokenKind::Null => self.on_null.as_ref(),
            TokenKind::True | TokenKind::False => self.on_bool.as_ref(),
            TokenKind::Number => self.on_number.as_ref(),
            TokenKind::String => self.on_string.as_ref(),
            TokenKind::ListStart => self.on_list.as_ref(),
            TokenKind::ObjectStart => self.on_object.as_ref(),
            _ => None,
        };
        match handler.or(self.fallback.as_ref()) {
            Some(f) => f(tokens),
            None => super::skip_and_default(tokens),
        }
    }
}
