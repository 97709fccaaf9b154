//! The tabular streaming reader.
//!
//! Interprets documents shaped as a list of
//! `{"name": ..., "columns": [...], "rows": [[...], ...]}` tables without
//! buffering a whole table. A layered state machine over the token
//! scanner surfaces tables, then rows, then fields; field values bind
//! through the declared column type, a registry reader, or a record
//! binder.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::datum::{ColumnType, Datum};
use crate::error::ScanResult;
use crate::read::registry::{ErasedReader, Slot};
use crate::scanner::TokenScanner;
use crate::source::{IoSource, TextSource};
use crate::token::TokenKind;
use crate::traits::{
    AsyncTokens, CharSource, FromJson, FromJsonAsync, JsonRecord, JsonRecordAsync, Tokens,
};
use crate::value::Value;

/// Where the reader stands within the table stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TableState {
    /// Nothing consumed yet.
    #[default]
    Start,
    /// Between tables of the top-level list.
    Tables,
    /// Inside a table's rowset, between rows.
    Rows,
    /// Inside a row, between field values.
    Row,
    /// Positioned on an unread field value.
    Field,
    /// The stream is exhausted.
    Done,
}

/// One declared column of the current table.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type name; empty when the schema gave none.
    pub ty: String,
}

/// Interprets a `columns` member: entries are either plain name strings
/// or `{"name": ..., "type": ...}` objects.
fn parse_columns(value: Value) -> Vec<ColumnDef> {
    let Value::List(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(name) => ColumnDef {
                name,
                ty: String::new(),
            },
            Value::Object(_) => ColumnDef {
                name: item.get("name").and_then(Value::as_str).unwrap_or("").to_owned(),
                ty: item.get("type").and_then(Value::as_str).unwrap_or("").to_owned(),
            },
            _ => ColumnDef::default(),
        })
        .collect()
}

/// Binds one field value according to its declared column type.
fn read_typed_field(tokens: &mut dyn Tokens, ty: ColumnType) -> ScanResult<Datum> {
    fn opt<T>(value: Option<T>, wrap: impl FnOnce(T) -> Datum) -> Datum {
        value.map(wrap).unwrap_or(Datum::Null)
    }
    Ok(match ty {
        ColumnType::Any => Datum::from_json(tokens)?,
        ColumnType::Text => opt(Option::<String>::from_json(tokens)?, Datum::Text),
        ColumnType::UInt8 => opt(Option::<u8>::from_json(tokens)?, |v| Datum::Int(v.into())),
        ColumnType::Int8 => opt(Option::<i8>::from_json(tokens)?, |v| Datum::Int(v.into())),
        ColumnType::Int16 => opt(Option::<i16>::from_json(tokens)?, |v| Datum::Int(v.into())),
        ColumnType::UInt16 => opt(Option::<u16>::from_json(tokens)?, |v| Datum::Int(v.into())),
        ColumnType::Int32 => opt(Option::<i32>::from_json(tokens)?, Datum::Int),
        ColumnType::UInt32 => opt(Option::<u32>::from_json(tokens)?, |v| Datum::Long(v.into())),
        ColumnType::Int64 => opt(Option::<i64>::from_json(tokens)?, Datum::Long),
        ColumnType::UInt64 => opt(Option::<u64>::from_json(tokens)?, |v| {
            Datum::Decimal(Decimal::from(v))
        }),
        ColumnType::Float64 => opt(Option::<f64>::from_json(tokens)?, Datum::Double),
        ColumnType::Float32 => opt(Option::<f32>::from_json(tokens)?, |v| {
            Datum::Double(v.into())
        }),
        ColumnType::Decimal => opt(Option::<Decimal>::from_json(tokens)?, Datum::Decimal),
        ColumnType::DateTime => opt(
            Option::<DateTime<FixedOffset>>::from_json(tokens)?,
            Datum::Date,
        ),
        ColumnType::TimeSpan => opt(Option::<Duration>::from_json(tokens)?, Datum::Span),
        ColumnType::Guid => opt(Option::<Uuid>::from_json(tokens)?, Datum::Guid),
        ColumnType::Bool => opt(Option::<bool>::from_json(tokens)?, Datum::Bool),
        ColumnType::Json => Datum::Json(Value::from_json(tokens)?),
    })
}

/// The suspending twin of [`read_typed_field`].
async fn read_typed_field_async<A: AsyncTokens>(
    tokens: &mut A,
    ty: ColumnType,
) -> ScanResult<Datum> {
    fn opt<T>(value: Option<T>, wrap: impl FnOnce(T) -> Datum) -> Datum {
        value.map(wrap).unwrap_or(Datum::Null)
    }
    Ok(match ty {
        ColumnType::Any => Datum::from_json_async(tokens).await?,
        ColumnType::Text => opt(Option::<String>::from_json_async(tokens).await?, Datum::Text),
        ColumnType::UInt8 => opt(Option::<u8>::from_json_async(tokens).await?, |v| {
            Datum::Int(v.into())
        }),
        ColumnType::Int8 => opt(Option::<i8>::from_json_async(tokens).await?, |v| {
            Datum::Int(v.into())
        }),
        ColumnType::Int16 => opt(Option::<i16>::from_json_async(tokens).await?, |v| {
            Datum::Int(v.into())
        }),
        ColumnType::UInt16 => opt(Option::<u16>::from_json_async(tokens).await?, |v| {
            Datum::Int(v.into())
        }),
        ColumnType::Int32 => opt(Option::<i32>::from_json_async(tokens).await?, Datum::Int),
        ColumnType::UInt32 => opt(Option::<u32>::from_json_async(tokens).await?, |v| {
            Datum::Long(v.into())
        }),
        ColumnType::Int64 => opt(Option::<i64>::from_json_async(tokens).await?, Datum::Long),
        ColumnType::UInt64 => opt(Option::<u64>::from_json_async(tokens).await?, |v| {
            Datum::Decimal(Decimal::from(v))
        }),
        ColumnType::Float64 => opt(Option::<f64>::from_json_async(tokens).await?, Datum::Double),
        ColumnType::Float32 => opt(Option::<f32>::from_json_async(tokens).await?, |v| {
            Datum::Double(v.into())
        }),
        ColumnType::Decimal => opt(
            Option::<Decimal>::from_json_async(tokens).await?,
            Datum::Decimal,
        ),
        ColumnType::DateTime => opt(
            Option::<DateTime<FixedOffset>>::from_json_async(tokens).await?,
            Datum::Date,
        ),
        ColumnType::TimeSpan => opt(
            Option::<Duration>::from_json_async(tokens).await?,
            Datum::Span,
        ),
        ColumnType::Guid => opt(Option::<Uuid>::from_json_async(tokens).await?, Datum::Guid),
        ColumnType::Bool => opt(Option::<bool>::from_json_async(tokens).await?, Datum::Bool),
        ColumnType::Json => Datum::Json(Value::from_json_async(tokens).await?),
    })
}

/// Binds `T` from a literal `null`, the permissive stand-in when a field
/// operation is invoked without being positioned on a field.
fn bind_null<T: FromJson>() -> ScanResult<T> {
    let mut scanner = TokenScanner::from_text("null");
    scanner.next_token()?;
    T::from_json(&mut scanner)
}

/// A user-supplied reader for a declared column type name.
pub type TypeOverride = Box<dyn Fn(&mut dyn Tokens) -> ScanResult<Datum> + Send + Sync>;

/// The synchronous tabular reader.
pub struct TableReader<S> {
    scanner: TokenScanner<S>,
    state: TableState,
    name: Option<String>,
    columns: Vec<ColumnDef>,
    /// Index of the field the reader is positioned on.
    field: Option<usize>,
    overrides: HashMap<String, TypeOverride>,
    primed: bool,
}

impl TableReader<TextSource> {
    /// Reader over in-memory text with the default configuration.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(TextSource::new(text), ScanConfig::default())
    }
}

impl<R: std::io::Read> TableReader<IoSource<R>> {
    /// Reader over any [`std::io::Read`] with the default configuration.
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoSource::new(reader), ScanConfig::default())
    }
}

impl<S: CharSource> TableReader<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            scanner: TokenScanner::new(source, config),
            state: TableState::Start,
            name: None,
            columns: Vec::new(),
            field: None,
            overrides: HashMap::new(),
            primed: false,
        }
    }

    /// Registers a reader for a declared column type name, consulted
    /// before the built-in vocabulary. Names match case-insensitively.
    pub fn with_type_reader(
        mut self,
        name: impl Into<String>,
        reader: impl Fn(&mut dyn Tokens) -> ScanResult<Datum> + Send + Sync + 'static,
    ) -> Self {
        self.overrides
            .insert(name.into().to_ascii_lowercase(), Box::new(reader));
        self
    }

    /// Name of the current table, or `""` when it declared none.
    pub fn table_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Number of declared columns.
    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    /// Declared name of column `index`, or `""` out of range.
    pub fn field_name(&self, index: usize) -> &str {
        self.columns.get(index).map(|c| c.name.as_str()).unwrap_or("")
    }

    /// Declared type of column `index`, or `""` out of range.
    pub fn field_type(&self, index: usize) -> &str {
        self.columns.get(index).map(|c| c.ty.as_str()).unwrap_or("")
    }

    /// Index of the field the reader is positioned on.
    pub fn field_index(&self) -> Option<usize> {
        self.field
    }

    fn prime(&mut self) -> ScanResult<()> {
        if !self.primed {
            self.scanner.next_token()?;
            self.primed = true;
        }
        Ok(())
    }

    /// Consumes everything up to and including the current table's
    /// closing `}`, walking out of any in-progress row or rowset.
    fn finish_table(&mut self) -> ScanResult<()> {
        loop {
            match self.state {
                TableState::Field => {
                    self.scanner.skip_element()?;
                    self.state = TableState::Row;
                }
                TableState::Row => match self.scanner.kind() {
                    TokenKind::ListEnd => {
                        self.scanner.next_token()?;
                        self.state = TableState::Rows;
                    }
                    TokenKind::None => self.state = TableState::Done,
                    TokenKind::Comma => {
                        self.scanner.next_token()?;
                    }
                    _ => self.scanner.skip_element()?,
                },
                TableState::Rows => match self.scanner.kind() {
                    TokenKind::ListEnd => {
                        self.scanner.next_token()?;
                        self.finish_table_members()?;
                        if self.state != TableState::Done {
                            self.state = TableState::Tables;
                        }
                        return Ok(());
                    }
                    TokenKind::None => self.state = TableState::Done,
                    TokenKind::Comma => {
                        self.scanner.next_token()?;
                    }
                    _ => self.scanner.skip_element()?,
                },
                _ => return Ok(()),
            }
        }
    }

    /// Skips table members trailing the rowset and consumes the `}`.
    fn finish_table_members(&mut self) -> ScanResult<()> {
        loop {
            match self.scanner.kind() {
                TokenKind::ObjectEnd => {
                    self.scanner.next_token()?;
                    return Ok(());
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(());
                }
                TokenKind::Comma | TokenKind::Colon => {
                    self.scanner.next_token()?;
                }
                _ => self.scanner.skip_element()?,
            }
        }
    }

    /// Advances to the next table and parses its header. Returns `false`
    /// when the table stream is exhausted.
    pub fn next_table(&mut self) -> ScanResult<bool> {
        self.prime()?;
        self.finish_table()?;
        if self.state == TableState::Done {
            return Ok(false);
        }
        if self.state == TableState::Start {
            match self.scanner.kind() {
                TokenKind::ListStart => {
                    self.scanner.next_token()?;
                    self.state = TableState::Tables;
                }
                // A single table object at the top level.
                TokenKind::ObjectStart => self.state = TableState::Tables,
                _ => {
                    self.scanner.skip_element()?;
                    self.state = TableState::Done;
                    return Ok(false);
                }
            }
        }
        loop {
            match self.scanner.kind() {
                TokenKind::Comma => {
                    self.scanner.next_token()?;
                }
                TokenKind::ObjectStart => {
                    if self.read_header()? {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(table = self.table_name(), "table header read");
                        return Ok(true);
                    }
                    if self.state == TableState::Done {
                        return Ok(false);
                    }
                    // A table without rows; keep looking.
                }
                TokenKind::ListEnd | TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => self.scanner.skip_element()?,
            }
        }
    }

    /// Parses a table header from its `{`. Returns `true` once the
    /// opening `[` of `rows` is consumed.
    fn read_header(&mut self) -> ScanResult<bool> {
        self.name = None;
        self.columns.clear();
        self.field = None;
        self.scanner.next_token()?;
        loop {
            match self.scanner.kind() {
                TokenKind::ObjectEnd => {
                    self.scanner.next_token()?;
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                TokenKind::Comma | TokenKind::Colon => {
                    self.scanner.next_token()?;
                }
                TokenKind::String => {
                    let member = self.scanner.read_value()?;
                    if self.scanner.kind() == TokenKind::Colon {
                        self.scanner.next_token()?;
                    }
                    match member.to_ascii_lowercase().as_str() {
                        "name" => {
                            if self.scanner.kind() == TokenKind::String {
                                self.name = Some(self.scanner.read_value()?);
                            } else {
                                self.scanner.skip_element()?;
                            }
                        }
                        "columns" => {
                            let schema = Value::from_json(&mut self.scanner)?;
                            self.columns = parse_columns(schema);
                        }
                        "rows" => {
                            if self.scanner.kind() == TokenKind::ListStart {
                                self.scanner.next_token()?;
                                self.state = TableState::Rows;
                                return Ok(true);
                            }
                            self.scanner.skip_element()?;
                        }
                        _ => self.scanner.skip_element()?,
                    }
                }
                _ => self.scanner.skip_element()?,
            }
        }
    }

    /// Advances to the next row of the current table. Returns `false`
    /// once the rowset ends (the table's `}` is consumed as well).
    pub fn next_row(&mut self) -> ScanResult<bool> {
        self.prime()?;
        loop {
            match self.state {
                TableState::Field => {
                    self.scanner.skip_element()?;
                    self.state = TableState::Row;
                }
                TableState::Row => match self.scanner.kind() {
                    TokenKind::ListEnd => {
                        self.scanner.next_token()?;
                        self.state = TableState::Rows;
                    }
                    TokenKind::None => {
                        self.state = TableState::Done;
                        return Ok(false);
                    }
                    TokenKind::Comma => {
                        self.scanner.next_token()?;
                    }
                    _ => self.scanner.skip_element()?,
                },
                TableState::Rows => break,
                _ => return Ok(false),
            }
        }
        loop {
            match self.scanner.kind() {
                TokenKind::Comma => {
                    self.scanner.next_token()?;
                }
                TokenKind::ListStart => {
                    self.scanner.next_token()?;
                    self.state = TableState::Row;
                    self.field = None;
                    return Ok(true);
                }
                TokenKind::ListEnd => {
                    self.scanner.next_token()?;
                    self.finish_table_members()?;
                    if self.state != TableState::Done {
                        self.state = TableState::Tables;
                    }
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => self.scanner.skip_element()?,
            }
        }
    }

    /// Advances to the next field of the current row. Returns `false` at
    /// the row's `]`.
    pub fn next_field(&mut self) -> ScanResult<bool> {
        self.prime()?;
        if self.state == TableState::Field {
            self.scanner.skip_element()?;
            self.state = TableState::Row;
        }
        if self.state != TableState::Row {
            return Ok(false);
        }
        loop {
            match self.scanner.kind() {
                TokenKind::Comma => {
                    self.scanner.next_token()?;
                }
                TokenKind::ListEnd => {
                    self.scanner.next_token()?;
                    self.state = TableState::Rows;
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => {
                    self.field = Some(self.field.map_or(0, |i| i + 1));
                    self.state = TableState::Field;
                    return Ok(true);
                }
            }
        }
    }

    /// Binds the current field by its declared column type: a registered
    /// override first, then the built-in vocabulary, defaulting to the
    /// Any reader.
    pub fn field_value(&mut self) -> ScanResult<Datum> {
        if self.state != TableState::Field {
            return Ok(Datum::Null);
        }
        let ty = self
            .field_type(self.field.unwrap_or(0))
            .to_ascii_lowercase();
        let datum = match self.overrides.get(&ty) {
            Some(reader) => reader(&mut self.scanner)?,
            None => read_typed_field(&mut self.scanner, ColumnType::parse(&ty))?,
        };
        self.state = TableState::Row;
        Ok(datum)
    }

    /// Binds the current field into `T`.
    pub fn field<T: FromJson>(&mut self) -> ScanResult<T> {
        if self.state != TableState::Field {
            return bind_null::<T>();
        }
        let value = T::from_json(&mut self.scanner)?;
        self.state = TableState::Row;
        Ok(value)
    }

    /// Binds the current field through a type-erased registry reader.
    pub fn field_with(&mut self, reader: &dyn ErasedReader) -> ScanResult<Slot> {
        if self.state != TableState::Field {
            return Ok(Box::new(()));
        }
        let slot = reader.read_dyn(&mut self.scanner)?;
        self.state = TableState::Row;
        Ok(slot)
    }

    /// Binds the rest of the current row onto a record type, treating the
    /// column schema as a virtual object: each column name is a property,
    /// each row value its value. Call after `next_row` returned `true`.
    pub fn read_row<T: JsonRecord>(&mut self) -> ScanResult<T> {
        let mut partial = T::Partial::default();
        while self.next_field()? {
            let index = self.field.unwrap_or(0);
            let name = self
                .columns
                .get(index)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            if !T::read_field(&mut partial, &name, &mut self.scanner)? {
                self.scanner.skip_element()?;
            }
            self.state = TableState::Row;
        }
        Ok(T::finish(partial))
    }
}

/// The suspending tabular reader, over an
/// [`AsyncTokenScanner`](crate::async_stream::AsyncTokenScanner).
///
/// Same state machine and semantics as [`TableReader`]; column types
/// dispatch through the built-in vocabulary (name-keyed overrides are a
/// synchronous-reader feature).
pub struct AsyncTableReader<A> {
    tokens: A,
    state: TableState,
    name: Option<String>,
    columns: Vec<ColumnDef>,
    field: Option<usize>,
    primed: bool,
}

impl<A: AsyncTokens> AsyncTableReader<A> {
    pub fn new(tokens: A) -> Self {
        Self {
            tokens,
            state: TableState::Start,
            name: None,
            columns: Vec::new(),
            field: None,
            primed: false,
        }
    }

    pub fn table_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn field_name(&self, index: usize) -> &str {
        self.columns.get(index).map(|c| c.name.as_str()).unwrap_or("")
    }

    pub fn field_type(&self, index: usize) -> &str {
        self.columns.get(index).map(|c| c.ty.as_str()).unwrap_or("")
    }

    pub fn field_index(&self) -> Option<usize> {
        self.field
    }

    async fn prime(&mut self) -> ScanResult<()> {
        if !self.primed {
            self.tokens.next_token().await?;
            self.primed = true;
        }
        Ok(())
    }

    async fn finish_table(&mut self) -> ScanResult<()> {
        loop {
            match self.state {
                TableState::Field => {
                    self.tokens.skip_element().await?;
                    self.state = TableState::Row;
                }
                TableState::Row => match self.tokens.kind() {
                    TokenKind::ListEnd => {
                        self.tokens.next_token().await?;
                        self.state = TableState::Rows;
                    }
                    TokenKind::None => self.state = TableState::Done,
                    TokenKind::Comma => {
                        self.tokens.next_token().await?;
                    }
                    _ => self.tokens.skip_element().await?,
                },
                TableState::Rows => match self.tokens.kind() {
                    TokenKind::ListEnd => {
                        self.tokens.next_token().await?;
                        self.finish_table_members().await?;
                        if self.state != TableState::Done {
                            self.state = TableState::Tables;
                        }
                        return Ok(());
                    }
                    TokenKind::None => self.state = TableState::Done,
                    TokenKind::Comma => {
                        self.tokens.next_token().await?;
                    }
                    _ => self.tokens.skip_element().await?,
                },
                _ => return Ok(()),
            }
        }
    }

    async fn finish_table_members(&mut self) -> ScanResult<()> {
        loop {
            match self.tokens.kind() {
                TokenKind::ObjectEnd => {
                    self.tokens.next_token().await?;
                    return Ok(());
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(());
                }
                TokenKind::Comma | TokenKind::Colon => {
                    self.tokens.next_token().await?;
                }
                _ => self.tokens.skip_element().await?,
            }
        }
    }

    pub async fn next_table(&mut self) -> ScanResult<bool> {
        self.prime().await?;
        self.finish_table().await?;
        if self.state == TableState::Done {
            return Ok(false);
        }
        if self.state == TableState::Start {
            match self.tokens.kind() {
                TokenKind::ListStart => {
                    self.tokens.next_token().await?;
                    self.state = TableState::Tables;
                }
                TokenKind::ObjectStart => self.state = TableState::Tables,
                _ => {
                    self.tokens.skip_element().await?;
                    self.state = TableState::Done;
                    return Ok(false);
                }
            }
        }
        loop {
            match self.tokens.kind() {
                TokenKind::Comma => {
                    self.tokens.next_token().await?;
                }
                TokenKind::ObjectStart => {
                    if self.read_header().await? {
                        return Ok(true);
                    }
                    if self.state == TableState::Done {
                        return Ok(false);
                    }
                }
                TokenKind::ListEnd | TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => self.tokens.skip_element().await?,
            }
        }
    }

    async fn read_header(&mut self) -> ScanResult<bool> {
        self.name = None;
        self.columns.clear();
        self.field = None;
        self.tokens.next_token().await?;
        loop {
            match self.tokens.kind() {
                TokenKind::ObjectEnd => {
                    self.tokens.next_token().await?;
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                TokenKind::Comma | TokenKind::Colon => {
                    self.tokens.next_token().await?;
                }
                TokenKind::String => {
                    let member = self.tokens.read_value().await?;
                    if self.tokens.kind() == TokenKind::Colon {
                        self.tokens.next_token().await?;
                    }
                    match member.to_ascii_lowercase().as_str() {
                        "name" => {
                            if self.tokens.kind() == TokenKind::String {
                                self.name = Some(self.tokens.read_value().await?);
                            } else {
                                self.tokens.skip_element().await?;
                            }
                        }
                        "columns" => {
                            let schema = Value::from_json_async(&mut self.tokens).await?;
                            self.columns = parse_columns(schema);
                        }
                        "rows" => {
                            if self.tokens.kind() == TokenKind::ListStart {
                                self.tokens.next_token().await?;
                                self.state = TableState::Rows;
                                return Ok(true);
                            }
                            self.tokens.skip_element().await?;
                        }
                        _ => self.tokens.skip_element().await?,
                    }
                }
                _ => self.tokens.skip_element().await?,
            }
        }
    }

    pub async fn next_row(&mut self) -> ScanResult<bool> {
        self.prime().await?;
        loop {
            match self.state {
                TableState::Field => {
                    self.tokens.skip_element().await?;
                    self.state = TableState::Row;
                }
                TableState::Row => match self.tokens.kind() {
                    TokenKind::ListEnd => {
                        self.tokens.next_token().await?;
                        self.state = TableState::Rows;
                    }
                    TokenKind::None => {
                        self.state = TableState::Done;
                        return Ok(false);
                    }
                    TokenKind::Comma => {
                        self.tokens.next_token().await?;
                    }
                    _ => self.tokens.skip_element().await?,
                },
                TableState::Rows => break,
                _ => return Ok(false),
            }
        }
        loop {
            match self.tokens.kind() {
                TokenKind::Comma => {
                    self.tokens.next_token().await?;
                }
                TokenKind::ListStart => {
                    self.tokens.next_token().await?;
                    self.state = TableState::Row;
                    self.field = None;
                    return Ok(true);
                }
                TokenKind::ListEnd => {
                    self.tokens.next_token().await?;
                    self.finish_table_members().await?;
                    if self.state != TableState::Done {
                        self.state = TableState::Tables;
                    }
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => self.tokens.skip_element().await?,
            }
        }
    }

    pub async fn next_field(&mut self) -> ScanResult<bool> {
        self.prime().await?;
        if self.state == TableState::Field {
            self.tokens.skip_element().await?;
            self.state = TableState::Row;
        }
        if self.state != TableState::Row {
            return Ok(false);
        }
        loop {
            match self.tokens.kind() {
                TokenKind::Comma => {
                    self.tokens.next_token().await?;
                }
                TokenKind::ListEnd => {
                    self.tokens.next_token().await?;
                    self.state = TableState::Rows;
                    return Ok(false);
                }
                TokenKind::None => {
                    self.state = TableState::Done;
                    return Ok(false);
                }
                _ => {
                    self.field = Some(self.field.map_or(0, |i| i + 1));
                    self.state = TableState::Field;
                    return Ok(true);
                }
            }
        }
    }

    pub async fn field_value(&mut self) -> ScanResult<Datum> {
        if self.state != TableState::Field {
            return Ok(Datum::Null);
        }
        let ty = ColumnType::parse(self.field_type(self.field.unwrap_or(0)));
        let datum = read_typed_field_async(&mut self.tokens, ty).await?;
        self.state = TableState::Row;
        Ok(datum)
    }

    pub async fn field<T: FromJsonAsync>(&mut self) -> ScanResult<T> {
        if self.state != TableState::Field {
            let mut scanner = crate::async_stream::AsyncTokenScanner::from_text("null");
            scanner.next_token().await?;
            return T::from_json_async(&mut scanner).await;
        }
        let value = T::from_json_async(&mut self.tokens).await?;
        self.state = TableState::Row;
        Ok(value)
    }

    pub async fn read_row<T: JsonRecordAsync>(&mut self) -> ScanResult<T> {
        let mut partial = T::Partial::default();
        while self.next_field().await? {
            let index = self.field.unwrap_or(0);
            let name = self
                .columns
                .get(index)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            if !T::read_field_async(&mut partial, &name, &mut self.tokens).await? {
                self.tokens.skip_element().await?;
            }
            self.state = TableState::Row;
        }
        Ok(T::finish(partial))
    }
}
