//! AST builder
//!
//! Turns one chunk of lines into an [`Item`]. The pest grammar recognises
//! tokens within a line; this module checks their order, decomposes compound
//! tokens and puts a [`SyntaxError`] node wherever an expected sub-field is
//! missing or unreadable.

use std::collections::VecDeque;
use std::str::FromStr;

use pest::iterators::Pair;
use pest::Parser;
use thalo_ast::{
    ActualizeEntry, Condition, ContentLine, Date, DateRange, DateValue, Entry, FieldDefinition,
    Header, Ident, InstanceDirective, InstanceEntry, LinkRef, Metadata, Parsed, PartialDate,
    PrimitiveType, Query, Removal, SchemaDirective, SchemaEntry, Section, SectionDefinition, Span,
    SynthesisEntry, SyntaxError, SyntaxErrorCode, Tag, Time, Timestamp, Timezone, Title,
    TypeExpression, Value, ValueContent,
};

use super::grammar::{Rule, ThaloGrammar};
use super::lines::{ChunkRange, Line};
use super::tree::Item;
use crate::error::{Error, Result};

/// Position of a parsed string inside its line
#[derive(Clone, Copy)]
struct Anchor<'a> {
    line: Line<'a>,
    column: usize,
}

impl<'a> Anchor<'a> {
    fn new(line: Line<'a>, column: usize) -> Self {
        Self { line, column }
    }

    fn span(&self, pair: &Pair<'_, Rule>) -> Span {
        let s = pair.as_span();
        self.line.span(self.column + s.start(), s.end() - s.start())
    }
}

fn after(span: Span) -> Span {
    Span::point(span.end, span.end_point)
}

fn rule_name(rule: Rule) -> String {
    format!("{:?}", rule)
}

fn parse_line(rule: Rule, text: &str) -> Option<Pair<'_, Rule>> {
    ThaloGrammar::parse(rule, text).ok().and_then(|mut pairs| pairs.next())
}

fn child<'i>(pair: &Pair<'i, Rule>, rule: Rule) -> Option<Pair<'i, Rule>> {
    pair.clone().into_inner().find(|p| p.as_rule() == rule)
}

fn require<'i>(pair: &Pair<'i, Rule>, rule: Rule) -> Result<Pair<'i, Rule>> {
    child(pair, rule).ok_or_else(|| Error::MissingNode {
        parent: rule_name(pair.as_rule()),
        expected: rule_name(rule),
    })
}

fn first_inner<'i>(pair: &Pair<'i, Rule>) -> Result<Pair<'i, Rule>> {
    pair.clone()
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or_else(|| Error::MissingNode {
            parent: rule_name(pair.as_rule()),
            expected: "child".to_string(),
        })
}

fn token<T: FromStr>(pair: &Pair<'_, Rule>) -> Result<T> {
    pair.as_str().parse().map_err(|_| malformed(pair))
}

fn malformed(pair: &Pair<'_, Rule>) -> Error {
    Error::MalformedToken {
        rule: rule_name(pair.as_rule()),
        text: pair.as_str().to_string(),
    }
}

fn unexpected(parent: Rule, found: &Pair<'_, Rule>) -> Error {
    Error::UnexpectedNode {
        parent: rule_name(parent),
        found: rule_name(found.as_rule()),
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn quoted_text(pair: &Pair<'_, Rule>) -> Result<String> {
    Ok(unescape(require(pair, Rule::quoted_text)?.as_str()))
}

fn is_ident(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// Timestamps and dates

fn build_date(pair: &Pair<'_, Rule>) -> Result<Date> {
    Ok(Date {
        year: token(&require(pair, Rule::year)?)?,
        month: token(&require(pair, Rule::month)?)?,
        day: token(&require(pair, Rule::day)?)?,
    })
}

fn build_time(pair: &Pair<'_, Rule>) -> Result<Time> {
    Ok(Time {
        hour: token(&require(pair, Rule::hour)?)?,
        minute: token(&require(pair, Rule::minute)?)?,
    })
}

fn build_timezone(pair: &Pair<'_, Rule>) -> Result<Timezone> {
    let text = pair.as_str();
    if text == "Z" {
        return Ok(Timezone::Utc);
    }
    let field = |range: std::ops::Range<usize>| -> Result<i16> {
        text.get(range)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(pair))
    };
    let minutes = field(1..3)? * 60 + field(4..6)?;
    Ok(Timezone::Offset(if text.starts_with('-') {
        -minutes
    } else {
        minutes
    }))
}

fn build_timestamp(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<Timestamp> {
    let date = build_date(&require(pair, Rule::date)?)?;
    let time_pair = require(pair, Rule::time)?;
    let time = build_time(&time_pair)?;
    let timezone = match child(pair, Rule::timezone) {
        Some(tz) => Ok(build_timezone(&tz)?),
        None => Err(SyntaxError::new(
            SyntaxErrorCode::MissingTimezone,
            "Timestamp is missing a timezone (add `Z` or an offset like `+01:00`)",
            after(anchor.span(&time_pair)),
        )),
    };
    Ok(Timestamp {
        date,
        time,
        timezone,
        span: anchor.span(pair),
    })
}

fn build_partial_date(pair: &Pair<'_, Rule>) -> Result<PartialDate> {
    Ok(PartialDate {
        year: token(&require(pair, Rule::year)?)?,
        month: child(pair, Rule::month).map(|p| token(&p)).transpose()?,
        day: child(pair, Rule::day).map(|p| token(&p)).transpose()?,
    })
}

fn build_date_value(pair: &Pair<'_, Rule>) -> Result<DateValue> {
    Ok(DateValue {
        date: build_date(&require(pair, Rule::date)?)?,
        time: child(pair, Rule::time).map(|t| build_time(&t)).transpose()?,
        timezone: child(pair, Rule::timezone)
            .map(|tz| build_timezone(&tz))
            .transpose()?,
    })
}

// Values

fn build_link(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<LinkRef> {
    Ok(LinkRef {
        id: require(pair, Rule::link_id)?.as_str().to_string(),
        span: anchor.span(pair),
    })
}

fn build_tag(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<Tag> {
    Ok(Tag {
        name: require(pair, Rule::tag_name)?.as_str().to_string(),
        span: anchor.span(pair),
    })
}

fn build_scalar(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<Value> {
    Ok(Value {
        raw: pair.as_str().to_string(),
        span: anchor.span(pair),
        content: build_content(pair, anchor)?,
    })
}

fn build_content(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<Parsed<ValueContent>> {
    let content = match pair.as_rule() {
        Rule::link => ValueContent::Link(build_link(pair, anchor)?),
        Rule::quoted => ValueContent::Quoted(quoted_text(pair)?),
        Rule::number => ValueContent::Number(token(pair)?),
        Rule::date_range => {
            let mut bounds = pair.clone().into_inner().filter(|p| p.as_rule() == Rule::partial_date);
            let (Some(start), Some(end)) = (bounds.next(), bounds.next()) else {
                return Err(Error::MissingNode {
                    parent: rule_name(Rule::date_range),
                    expected: rule_name(Rule::partial_date),
                });
            };
            ValueContent::DateRange(DateRange {
                start: build_partial_date(&start)?,
                end: build_partial_date(&end)?,
            })
        }
        Rule::datetime_value => {
            let value = build_date_value(pair)?;
            if !value.date.is_valid() {
                return Ok(Err(SyntaxError::new(
                    SyntaxErrorCode::InvalidValue,
                    format!("`{}` is not a valid date", pair.as_str()),
                    anchor.span(pair),
                )));
            }
            ValueContent::Datetime(value)
        }
        Rule::value_array => {
            let items = pair
                .clone()
                .into_inner()
                .map(|item| build_scalar(&item, anchor))
                .collect::<Result<Vec<_>>>()?;
            ValueContent::Array(items)
        }
        Rule::plain | Rule::default_plain | Rule::bare_word => {
            let text = pair.as_str();
            if text.starts_with('"') && !text[1..].contains('"') {
                return Ok(Err(SyntaxError::new(
                    SyntaxErrorCode::UnterminatedString,
                    "String is missing its closing quote",
                    anchor.span(pair),
                )));
            }
            ValueContent::Plain(text.to_string())
        }
        _ => return Err(unexpected(Rule::value, pair)),
    };
    Ok(Ok(content))
}

/// Build a metadata value from the text after `key:`
fn build_value(line: Line<'_>, column: usize, raw: &str) -> Result<Value> {
    if raw.is_empty() {
        return Ok(Value {
            raw: String::new(),
            span: line.point(column),
            content: Ok(ValueContent::Empty),
        });
    }
    let anchor = Anchor::new(line, column);
    let span = line.span(column, raw.len());
    let content = match parse_line(Rule::value_line, raw) {
        Some(value_line) => {
            let value = require(&value_line, Rule::value)?;
            build_content(&first_inner(&value)?, &anchor)?
        }
        None => Err(SyntaxError::new(
            SyntaxErrorCode::InvalidValue,
            format!("Cannot read value `{}`", raw),
            span,
        )),
    };
    Ok(Value {
        raw: raw.to_string(),
        span,
        content,
    })
}

// Queries

fn build_query(pair: &Pair<'_, Rule>, anchor: &Anchor<'_>) -> Result<Query> {
    let mut entity = None;
    let mut conditions = Vec::new();
    for part in pair.clone().into_inner() {
        match part.as_rule() {
            Rule::ident => entity = Some(Ident::new(part.as_str(), anchor.span(&part))),
            Rule::tag => conditions.push(Condition::Tag(build_tag(&part, anchor)?)),
            Rule::link => conditions.push(Condition::Link(build_link(&part, anchor)?)),
            Rule::field_condition => {
                let key = require(&part, Rule::ident)?;
                let value = part
                    .clone()
                    .into_inner()
                    .nth(1)
                    .ok_or_else(|| Error::MissingNode {
                        parent: rule_name(Rule::field_condition),
                        expected: "value".to_string(),
                    })?;
                conditions.push(Condition::Field {
                    key: Ident::new(key.as_str(), anchor.span(&key)),
                    value: build_scalar(&value, anchor)?,
                    span: anchor.span(&part),
                });
            }
            _ => return Err(unexpected(Rule::query, &part)),
        }
    }
    let entity = entity.ok_or_else(|| Error::MissingNode {
        parent: rule_name(Rule::query),
        expected: rule_name(Rule::ident),
    })?;
    Ok(Query {
        entity,
        conditions,
        span: anchor.span(pair),
    })
}

/// Parse a query list written at `column` of `line`
pub(crate) fn build_queries(line: Line<'_>, column: usize, raw: &str) -> Result<Parsed<Vec<Query>>> {
    let anchor = Anchor::new(line, column);
    let Some(list) = parse_line(Rule::query_list, raw) else {
        return Ok(Err(SyntaxError::new(
            SyntaxErrorCode::InvalidQuery,
            format!("Invalid query `{}`; expected `entity where #tag and field = value`", raw),
            line.span(column, raw.len()),
        )));
    };
    list.into_inner()
        .filter(|p| p.as_rule() == Rule::query)
        .map(|q| build_query(&q, &anchor))
        .collect::<Result<Vec<_>>>()
        .map(Ok)
}

fn build_query_value(line: Line<'_>, column: usize, raw: &str) -> Result<Value> {
    if raw.is_empty() {
        return build_value(line, column, raw);
    }
    Ok(Value {
        raw: raw.to_string(),
        span: line.span(column, raw.len()),
        content: build_queries(line, column, raw)?.map(ValueContent::Query),
    })
}

// Headers

/// Header tokens after the directive, consumed front to back
struct HeaderTokens<'i, 'a> {
    tokens: VecDeque<Pair<'i, Rule>>,
    anchor: Anchor<'a>,
    /// End of the last consumed token
    cursor: Span,
}

impl<'i, 'a> HeaderTokens<'i, 'a> {
    fn peek(&self, rule: Rule) -> bool {
        self.tokens.front().is_some_and(|p| p.as_rule() == rule)
    }

    fn pop(&mut self) -> Option<Pair<'i, Rule>> {
        let pair = self.tokens.pop_front()?;
        self.cursor = after(self.anchor.span(&pair));
        Some(pair)
    }

    fn entity(&mut self, directive: &str) -> Parsed<Ident> {
        match self.peek(Rule::ident).then(|| self.pop()).flatten() {
            Some(pair) => Ok(Ident::new(pair.as_str(), self.anchor.span(&pair))),
            None => Err(SyntaxError::new(
                SyntaxErrorCode::MissingEntity,
                format!("Expected an entity name after `{}`", directive),
                self.cursor,
            )),
        }
    }

    fn title(&mut self) -> Result<Parsed<Title>> {
        if self.peek(Rule::quoted) {
            if let Some(pair) = self.pop() {
                return Ok(Ok(Title {
                    text: quoted_text(&pair)?,
                    span: self.anchor.span(&pair),
                }));
            }
        }
        let unterminated = self
            .tokens
            .front()
            .is_some_and(|p| p.as_rule() == Rule::stray && p.as_str().starts_with('"'));
        if unterminated {
            // The words of the broken title, up to the first link or tag
            let start = self.cursor;
            let mut span = start;
            while self.peek(Rule::stray) || self.peek(Rule::ident) || self.peek(Rule::directive) {
                if let Some(pair) = self.pop() {
                    span = span.merge(&self.anchor.span(&pair));
                }
            }
            return Ok(Err(SyntaxError::new(
                SyntaxErrorCode::UnterminatedString,
                "Title is missing its closing quote",
                span,
            )));
        }
        Ok(Err(SyntaxError::new(
            SyntaxErrorCode::MissingTitle,
            "Expected a quoted title",
            self.cursor,
        )))
    }

    /// Links and tags after the title; anything else is an error node
    fn trailing(
        &mut self,
        allow_link: bool,
        link: &mut Option<LinkRef>,
        tags: &mut Vec<Tag>,
        errors: &mut Vec<SyntaxError>,
    ) -> Result<()> {
        while let Some(pair) = self.pop() {
            let span = self.anchor.span(&pair);
            match pair.as_rule() {
                Rule::tag => tags.push(build_tag(&pair, &self.anchor)?),
                Rule::link if allow_link && link.is_none() => {
                    *link = Some(build_link(&pair, &self.anchor)?)
                }
                Rule::link if allow_link => errors.push(SyntaxError::new(
                    SyntaxErrorCode::UnexpectedToken,
                    "Entry already has a link id",
                    span,
                )),
                _ => errors.push(SyntaxError::new(
                    SyntaxErrorCode::UnexpectedToken,
                    format!("Unexpected `{}` in entry header", pair.as_str()),
                    span,
                )),
            }
        }
        Ok(())
    }
}

/// Build the item for one chunk
pub(crate) fn build_chunk(lines: &[Line<'_>], range: &ChunkRange) -> Result<Item> {
    let chunk_span = range.span(lines);
    if range.orphan {
        return Ok(Item::Error(SyntaxError::new(
            SyntaxErrorCode::UnexpectedIndentation,
            "Indented lines must belong to an entry",
            chunk_span,
        )));
    }

    let header = lines[range.first];
    let body: Vec<Line<'_>> = lines[range.first + 1..=range.last]
        .iter()
        .filter(|l| !l.is_comment())
        .copied()
        .collect();

    let text = header.text.trim_end();
    let anchor = Anchor::new(header, 0);
    let Some(header_line) = parse_line(Rule::header_line, text) else {
        return Ok(Item::Error(SyntaxError::new(
            SyntaxErrorCode::InvalidHeader,
            format!("Expected an entry header like `2026-01-05T18:00Z create lore \"Title\"`, found `{}`", text),
            header.content_span(),
        )));
    };

    let mut pairs = header_line.into_inner().filter(|p| p.as_rule() != Rule::EOI);
    let ts_pair = pairs.next().ok_or_else(|| Error::MissingNode {
        parent: rule_name(Rule::header_line),
        expected: rule_name(Rule::timestamp),
    })?;
    let timestamp = build_timestamp(&ts_pair, &anchor)?;
    let mut tokens = HeaderTokens {
        tokens: pairs.collect(),
        anchor,
        cursor: after(timestamp.span),
    };

    let mut errors = Vec::new();
    if !timestamp.date.is_valid() {
        errors.push(SyntaxError::new(
            SyntaxErrorCode::InvalidHeader,
            format!("`{}` is not a valid date", timestamp.date),
            timestamp.span,
        ));
    }

    let directive = match tokens.tokens.front() {
        Some(pair) if pair.as_rule() == Rule::directive => {
            let keyword = pair.as_str().to_string();
            tokens.pop();
            keyword
        }
        Some(pair) => {
            return Ok(Item::Error(SyntaxError::new(
                SyntaxErrorCode::UnknownDirective,
                format!("Unknown directive `{}`", pair.as_str()),
                anchor.span(pair),
            )))
        }
        None => {
            return Ok(Item::Error(SyntaxError::new(
                SyntaxErrorCode::UnknownDirective,
                "Expected a directive after the timestamp",
                tokens.cursor,
            )))
        }
    };

    let header_span = header.content_span();
    let entry = match directive.as_str() {
        "create" | "update" => {
            let entity = tokens.entity(&directive);
            let title = tokens.title()?;
            let mut link = None;
            let mut tags = Vec::new();
            tokens.trailing(true, &mut link, &mut tags, &mut errors)?;
            let body = build_body(&body, None)?;
            errors.extend(body.errors);
            Entry::Instance(InstanceEntry {
                directive: if directive == "create" {
                    InstanceDirective::Create
                } else {
                    InstanceDirective::Update
                },
                entity,
                header: Header {
                    timestamp,
                    title,
                    link,
                    tags,
                    span: header_span,
                },
                metadata: body.metadata,
                sections: body.sections,
                errors,
                span: chunk_span,
            })
        }
        "define-entity" | "alter-entity" => {
            let entity = tokens.entity(&directive);
            let title = tokens.title()?;
            let mut link = None;
            let mut tags = Vec::new();
            tokens.trailing(true, &mut link, &mut tags, &mut errors)?;
            let schema = build_schema_body(&body)?;
            errors.extend(schema.errors);
            Entry::Schema(SchemaEntry {
                directive: if directive == "define-entity" {
                    SchemaDirective::DefineEntity
                } else {
                    SchemaDirective::AlterEntity
                },
                entity,
                header: Header {
                    timestamp,
                    title,
                    link,
                    tags,
                    span: header_span,
                },
                fields: schema.fields,
                sections: schema.sections,
                removed_fields: schema.removed_fields,
                removed_sections: schema.removed_sections,
                errors,
                span: chunk_span,
            })
        }
        "define-synthesis" => {
            let title = tokens.title()?;
            let mut link = None;
            let mut tags = Vec::new();
            tokens.trailing(true, &mut link, &mut tags, &mut errors)?;
            let body = build_body(&body, Some("sources"))?;
            errors.extend(body.errors);
            Entry::Synthesis(SynthesisEntry {
                header: Header {
                    timestamp,
                    title,
                    link,
                    tags,
                    span: header_span,
                },
                metadata: body.metadata,
                sections: body.sections,
                errors,
                span: chunk_span,
            })
        }
        "actualize-synthesis" => {
            let target = match tokens.peek(Rule::link).then(|| tokens.pop()).flatten() {
                Some(pair) => Ok(build_link(&pair, &anchor)?),
                None => Err(SyntaxError::new(
                    SyntaxErrorCode::MissingLinkTarget,
                    "Expected the `^id` of the synthesis to actualize",
                    tokens.cursor,
                )),
            };
            let mut tags = Vec::new();
            tokens.trailing(false, &mut None, &mut tags, &mut errors)?;
            let body = build_body(&body, None)?;
            errors.extend(body.errors);
            errors.extend(
                body.sections
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        SyntaxError::new(
                            SyntaxErrorCode::UnexpectedToken,
                            "Actualize entries take metadata only",
                            s.span,
                        )
                    }),
            );
            Entry::Actualize(ActualizeEntry {
                timestamp,
                target,
                tags,
                metadata: body.metadata,
                errors,
                header_span,
                span: chunk_span,
            })
        }
        other => {
            return Err(Error::MalformedToken {
                rule: rule_name(Rule::directive),
                text: other.to_string(),
            })
        }
    };
    Ok(Item::Entry(entry))
}

// Bodies

struct Body {
    metadata: Vec<Metadata>,
    sections: Vec<Section>,
    errors: Vec<SyntaxError>,
}

/// `# Name` heading: the name and its span
fn heading(line: &Line<'_>) -> Option<Ident> {
    let content = line.content();
    let rest = content.strip_prefix('#')?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let name = rest.trim();
    if name.is_empty() {
        return None;
    }
    let lead = rest.len() - rest.trim_start().len();
    let column = line.content_column() + 1 + lead;
    Some(Ident::new(name, line.span(column, name.len())))
}

fn build_metadata(line: Line<'_>, query_key: Option<&str>) -> Result<Parsed<Metadata>> {
    let content = line.content();
    let column = line.content_column();
    let invalid = || {
        SyntaxError::new(
            SyntaxErrorCode::InvalidMetadataLine,
            format!("Expected `key: value`, found `{}`", content),
            line.content_span(),
        )
    };
    let Some(colon) = content.find(':') else {
        return Ok(Err(invalid()));
    };
    let key = content[..colon].trim_end();
    if !is_ident(key) {
        return Ok(Err(invalid()));
    }
    let rest = &content[colon + 1..];
    let raw = rest.trim();
    let value_column = column + colon + 1 + (rest.len() - rest.trim_start().len());
    let value = if query_key == Some(key) {
        build_query_value(line, value_column, raw)?
    } else {
        build_value(line, value_column, raw)?
    };
    Ok(Ok(Metadata {
        key: Ident::new(key, line.span(column, key.len())),
        value,
        span: line.content_span(),
    }))
}

/// Metadata lines up to the first blank line or heading, then content
fn build_body(body: &[Line<'_>], query_key: Option<&str>) -> Result<Body> {
    let mut metadata = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut errors = Vec::new();
    let mut in_content = false;
    let indent = body
        .iter()
        .find(|l| !l.is_blank())
        .map(Line::indent)
        .unwrap_or(0);

    for line in body {
        if line.is_blank() {
            in_content = true;
            if let Some(section) = sections.last_mut() {
                section.lines.push(ContentLine {
                    text: String::new(),
                    span: line.point(0),
                });
            }
            continue;
        }
        if let Some(name) = heading(line) {
            in_content = true;
            sections.push(Section {
                span: line.content_span(),
                heading: Some(name),
                lines: Vec::new(),
            });
            continue;
        }
        if !in_content {
            match build_metadata(*line, query_key)? {
                Ok(entry) => metadata.push(entry),
                Err(err) => errors.push(err),
            }
            continue;
        }
        let strip = line.indent().min(indent);
        let span = line.content_span();
        if sections.is_empty() {
            sections.push(Section {
                heading: None,
                lines: Vec::new(),
                span,
            });
        }
        if let Some(section) = sections.last_mut() {
            section.lines.push(ContentLine {
                text: line.text[strip..].trim_end().to_string(),
                span,
            });
            section.span = section.span.merge(&span);
        }
    }

    // Blank lines only matter between content lines
    for section in &mut sections {
        while section.lines.last().is_some_and(|l| l.text.is_empty()) {
            section.lines.pop();
        }
    }

    Ok(Body {
        metadata,
        sections,
        errors,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SchemaBlock {
    Metadata,
    Sections,
    RemoveMetadata,
    RemoveSections,
    Unknown,
}

struct SchemaBody {
    fields: Vec<FieldDefinition>,
    sections: Vec<SectionDefinition>,
    removed_fields: Vec<Removal>,
    removed_sections: Vec<Removal>,
    errors: Vec<SyntaxError>,
}

fn build_schema_body(body: &[Line<'_>]) -> Result<SchemaBody> {
    let mut schema = SchemaBody {
        fields: Vec::new(),
        sections: Vec::new(),
        removed_fields: Vec::new(),
        removed_sections: Vec::new(),
        errors: Vec::new(),
    };
    let mut block = None;

    for line in body.iter().filter(|l| !l.is_blank()) {
        if let Some(name) = heading(line) {
            block = Some(match name.name.to_ascii_lowercase().as_str() {
                "metadata" => SchemaBlock::Metadata,
                "sections" => SchemaBlock::Sections,
                "remove metadata" => SchemaBlock::RemoveMetadata,
                "remove sections" => SchemaBlock::RemoveSections,
                _ => {
                    schema.errors.push(SyntaxError::new(
                        SyntaxErrorCode::UnknownSchemaBlock,
                        format!(
                            "Unknown schema block `# {}`; expected Metadata, Sections, Remove Metadata or Remove Sections",
                            name.name
                        ),
                        name.span,
                    ));
                    SchemaBlock::Unknown
                }
            });
            continue;
        }
        match block {
            None => schema.errors.push(SyntaxError::new(
                SyntaxErrorCode::ContentOutsideBlock,
                "Schema lines must sit under `# Metadata` or `# Sections`",
                line.content_span(),
            )),
            Some(SchemaBlock::Unknown) => {}
            Some(SchemaBlock::Metadata) => match build_field(*line)? {
                Ok(field) => schema.fields.push(field),
                Err(err) => schema.errors.push(err),
            },
            Some(SchemaBlock::Sections) => match build_section_definition(*line)? {
                Ok(section) => schema.sections.push(section),
                Err(err) => schema.errors.push(err),
            },
            Some(SchemaBlock::RemoveMetadata) => {
                match build_removal(*line, SyntaxErrorCode::InvalidFieldDefinition)? {
                    Ok(removal) => schema.removed_fields.push(removal),
                    Err(err) => schema.errors.push(err),
                }
            }
            Some(SchemaBlock::RemoveSections) => {
                match build_removal(*line, SyntaxErrorCode::InvalidSectionDefinition)? {
                    Ok(removal) => schema.removed_sections.push(removal),
                    Err(err) => schema.errors.push(err),
                }
            }
        }
    }
    Ok(schema)
}

fn build_type(pair: &Pair<'_, Rule>) -> Result<TypeExpression> {
    let mut terms = pair
        .clone()
        .into_inner()
        .filter(|p| p.as_rule() == Rule::type_term)
        .map(|term| build_type_term(&term))
        .collect::<Result<Vec<_>>>()?;
    match terms.len() {
        0 => Err(Error::MissingNode {
            parent: rule_name(Rule::type_expr),
            expected: rule_name(Rule::type_term),
        }),
        1 => Ok(terms.remove(0)),
        _ => Ok(TypeExpression::Union(terms)),
    }
}

fn build_type_term(pair: &Pair<'_, Rule>) -> Result<TypeExpression> {
    let mut inner = pair.clone().into_inner();
    let atom = inner.next().ok_or_else(|| Error::MissingNode {
        parent: rule_name(Rule::type_term),
        expected: "type".to_string(),
    })?;
    let mut ty = match atom.as_rule() {
        Rule::primitive_type => PrimitiveType::from_keyword(atom.as_str())
            .map(TypeExpression::Primitive)
            .ok_or_else(|| malformed(&atom))?,
        Rule::literal_type => TypeExpression::Literal(quoted_text(&atom)?),
        Rule::group_type => build_type(&require(&atom, Rule::type_expr)?)?,
        _ => return Err(unexpected(Rule::type_term, &atom)),
    };
    for suffix in inner {
        if suffix.as_rule() != Rule::array_suffix {
            return Err(unexpected(Rule::type_term, &suffix));
        }
        ty = TypeExpression::Array(Box::new(ty));
    }
    Ok(ty)
}

fn description(pair: &Pair<'_, Rule>) -> Result<String> {
    quoted_text(&require(pair, Rule::quoted)?)
}

fn build_field(line: Line<'_>) -> Result<Parsed<FieldDefinition>> {
    let content = line.content();
    let anchor = Anchor::new(line, line.content_column());
    let Some(field_line) = parse_line(Rule::field_line, content) else {
        return Ok(Err(SyntaxError::new(
            SyntaxErrorCode::InvalidFieldDefinition,
            format!("Expected `name: type`, found `{}`", content),
            line.content_span(),
        )));
    };

    let mut name = None;
    let mut optional = false;
    let mut type_expr = None;
    let mut default = None;
    let mut desc = None;
    for part in field_line.into_inner() {
        match part.as_rule() {
            Rule::ident => name = Some(Ident::new(part.as_str(), anchor.span(&part))),
            Rule::optional_mark => optional = true,
            Rule::type_expr => type_expr = Some(Ok(build_type(&part)?)),
            Rule::bad_type => {
                type_expr = Some(Err(SyntaxError::new(
                    SyntaxErrorCode::InvalidTypeExpression,
                    format!(
                        "Unknown type `{}`; expected string, number, datetime, date-range, link, a quoted literal, `T[]` or `A | B`",
                        part.as_str()
                    ),
                    anchor.span(&part),
                )))
            }
            Rule::description => desc = Some(description(&part)?),
            Rule::EOI => {}
            _ => {
                let value = build_scalar(&part, &anchor)?;
                default = Some(match value.content {
                    Ok(_) => Ok(value),
                    Err(err) => Err(SyntaxError::new(
                        SyntaxErrorCode::InvalidDefaultValue,
                        err.message,
                        err.span,
                    )),
                });
            }
        }
    }

    let name = name.ok_or_else(|| Error::MissingNode {
        parent: rule_name(Rule::field_line),
        expected: rule_name(Rule::ident),
    })?;
    let type_expr = type_expr.ok_or_else(|| Error::MissingNode {
        parent: rule_name(Rule::field_line),
        expected: rule_name(Rule::type_expr),
    })?;
    Ok(Ok(FieldDefinition {
        name,
        optional,
        type_expr,
        default,
        description: desc,
        span: line.content_span(),
    }))
}

/// Name, optional flag and description of a section or removal line
fn section_parts(line: Line<'_>) -> Result<Option<(Ident, bool, Option<String>)>> {
    let anchor = Anchor::new(line, line.content_column());
    let Some(section_line) = parse_line(Rule::section_line, line.content()) else {
        return Ok(None);
    };
    let name = require(&section_line, Rule::section_name)?;
    let desc = child(&section_line, Rule::description)
        .map(|d| description(&d))
        .transpose()?;
    Ok(Some((
        Ident::new(name.as_str(), anchor.span(&name)),
        child(&section_line, Rule::optional_mark).is_some(),
        desc,
    )))
}

fn build_section_definition(line: Line<'_>) -> Result<Parsed<SectionDefinition>> {
    Ok(match section_parts(line)? {
        Some((name, optional, description)) => Ok(SectionDefinition {
            name,
            optional,
            description,
            span: line.content_span(),
        }),
        None => Err(SyntaxError::new(
            SyntaxErrorCode::InvalidSectionDefinition,
            format!("Expected `Name ; \"description\"`, found `{}`", line.content()),
            line.content_span(),
        )),
    })
}

fn build_removal(line: Line<'_>, code: SyntaxErrorCode) -> Result<Parsed<Removal>> {
    Ok(match section_parts(line)? {
        Some((name, _, reason)) => Ok(Removal {
            name,
            reason,
            span: line.content_span(),
        }),
        None => Err(SyntaxError::new(
            code,
            format!("Expected a name to remove, found `{}`", line.content()),
            line.content_span(),
        )),
    })
}
