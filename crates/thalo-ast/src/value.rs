//! Metadata values, links and tags

use serde::{Deserialize, Serialize};

use crate::error::Parsed;
use crate::query::Query;
use crate::span::{Relocate, Shift, Span};
use crate::timestamp::{Date, Time, Timezone};

/// A bare identifier (entity name, metadata key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A `^id` link; `id` excludes the caret, `span` includes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRef {
    pub id: String,
    pub span: Span,
}

/// A `#tag`; `name` excludes the hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub span: Span,
}

/// A date with optional time, as written in a metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub date: Date,
    pub time: Option<Time>,
    pub timezone: Option<Timezone>,
}

impl DateValue {
    /// Minutes since the Unix epoch, in UTC; a bare date is midnight UTC
    pub fn instant(&self) -> i64 {
        let time = self.time.map(|t| i64::from(t.hour) * 60 + i64::from(t.minute));
        let offset = self.timezone.map(|tz| tz.offset_minutes()).unwrap_or(0);
        self.date.days_from_epoch() * 1440 + time.unwrap_or(0) - offset
    }
}

/// A date with month and day optional (`2024`, `2024-03`, `2024-03-01`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: u16,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl PartialDate {
    /// Earliest full date covered
    pub fn lower_bound(&self) -> (u16, u8, u8) {
        (self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
    }

    /// Latest full date covered
    pub fn upper_bound(&self) -> (u16, u8, u8) {
        (self.year, self.month.unwrap_or(12), self.day.unwrap_or(31))
    }
}

/// `start ~ end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: PartialDate,
    pub end: PartialDate,
}

impl DateRange {
    /// A range is ordered when it does not end before it starts
    pub fn is_ordered(&self) -> bool {
        self.start.lower_bound() <= self.end.upper_bound()
    }
}

/// The typed content of a metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueContent {
    /// `key:` with nothing after it
    Empty,
    Link(LinkRef),
    Quoted(String),
    Datetime(DateValue),
    DateRange(DateRange),
    Number(f64),
    /// Comma-separated scalars
    Array(Vec<Value>),
    /// Query list (only under `sources:` of a synthesis)
    Query(Vec<Query>),
    /// Anything else, trimmed
    Plain(String),
}

impl ValueContent {
    /// Short name of the kind, for messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueContent::Empty => "empty value",
            ValueContent::Link(_) => "link",
            ValueContent::Quoted(_) => "quoted string",
            ValueContent::Datetime(_) => "datetime",
            ValueContent::DateRange(_) => "date range",
            ValueContent::Number(_) => "number",
            ValueContent::Array(_) => "array",
            ValueContent::Query(_) => "query",
            ValueContent::Plain(_) => "text",
        }
    }

    /// The text of a quoted or plain value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ValueContent::Quoted(s) | ValueContent::Plain(s) => Some(s),
            _ => None,
        }
    }
}

/// A metadata value: raw text, location and typed content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub raw: String,
    pub span: Span,
    pub content: Parsed<ValueContent>,
}

impl Value {
    /// Check if nothing was written
    pub fn is_empty(&self) -> bool {
        matches!(self.content, Ok(ValueContent::Empty))
    }

    /// Every link in this value: scalars, array elements and query conditions
    pub fn links(&self) -> Vec<&LinkRef> {
        let mut links = Vec::new();
        collect_links(self, &mut links);
        links
    }

    /// Normalised text for equality comparisons (`^a` → `a`, `"x"` → `x`)
    pub fn normalized(&self) -> String {
        match &self.content {
            Ok(ValueContent::Link(link)) => link.id.clone(),
            Ok(ValueContent::Quoted(s)) | Ok(ValueContent::Plain(s)) => s.clone(),
            Ok(ValueContent::Array(items)) => items
                .iter()
                .map(Value::normalized)
                .collect::<Vec<_>>()
                .join(","),
            _ => self.raw.trim().to_string(),
        }
    }
}

fn collect_links<'a>(value: &'a Value, out: &mut Vec<&'a LinkRef>) {
    match &value.content {
        Ok(ValueContent::Link(link)) => out.push(link),
        Ok(ValueContent::Array(items)) => {
            for item in items {
                collect_links(item, out);
            }
        }
        Ok(ValueContent::Query(queries)) => {
            for query in queries {
                out.extend(query.links());
            }
        }
        _ => {}
    }
}

impl Relocate for Ident {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

impl Relocate for LinkRef {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

impl Relocate for Tag {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

impl Relocate for ValueContent {
    fn relocate(&mut self, shift: &Shift) {
        match self {
            ValueContent::Link(link) => link.relocate(shift),
            ValueContent::Array(items) => items.relocate(shift),
            ValueContent::Query(queries) => queries.relocate(shift),
            ValueContent::Empty
            | ValueContent::Quoted(_)
            | ValueContent::Datetime(_)
            | ValueContent::DateRange(_)
            | ValueContent::Number(_)
            | ValueContent::Plain(_) => {}
        }
    }
}

impl Relocate for Value {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
        self.content.relocate(shift);
    }
}
