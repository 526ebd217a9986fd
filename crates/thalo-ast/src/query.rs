//! Query expressions
//!
//! `lore where #career and subject = ^self, journal`

use serde::{Deserialize, Serialize};

use crate::span::{Relocate, Shift, Span};
use crate::value::{Ident, LinkRef, Tag, Value};

/// One condition of a `where` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `#tag`
    Tag(Tag),
    /// `^link`
    Link(LinkRef),
    /// `field = value`
    Field {
        key: Ident,
        value: Value,
        span: Span,
    },
}

/// `entity [where cond (and cond)*]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub entity: Ident,
    pub conditions: Vec<Condition>,
    pub span: Span,
}

impl Query {
    /// Links named in this query's conditions
    pub fn links(&self) -> Vec<&LinkRef> {
        let mut links = Vec::new();
        for condition in &self.conditions {
            match condition {
                Condition::Link(link) => links.push(link),
                Condition::Field { value, .. } => links.extend(value.links()),
                Condition::Tag(_) => {}
            }
        }
        links
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.entity.name)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            f.write_str(if i == 0 { " where " } else { " and " })?;
            match condition {
                Condition::Tag(tag) => write!(f, "#{}", tag.name)?,
                Condition::Link(link) => write!(f, "^{}", link.id)?,
                Condition::Field { key, value, .. } => write!(f, "{} = {}", key.name, value.raw)?,
            }
        }
        Ok(())
    }
}

impl Relocate for Condition {
    fn relocate(&mut self, shift: &Shift) {
        match self {
            Condition::Tag(tag) => tag.relocate(shift),
            Condition::Link(link) => link.relocate(shift),
            Condition::Field { key, value, span } => {
                key.relocate(shift);
                value.relocate(shift);
                span.relocate(shift);
            }
        }
    }
}

impl Relocate for Query {
    fn relocate(&mut self, shift: &Shift) {
        self.entity.relocate(shift);
        self.conditions.relocate(shift);
        self.span.relocate(shift);
    }
}
