//! Field type expressions
//!
//! `string`, `"high" | "low"`, `link[]`, `(string | link)[]`

use serde::{Deserialize, Serialize};

/// Built-in field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Number,
    Datetime,
    DateRange,
    Link,
}

impl PrimitiveType {
    /// Parse a primitive type keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(PrimitiveType::String),
            "number" => Some(PrimitiveType::Number),
            "datetime" => Some(PrimitiveType::Datetime),
            "date-range" => Some(PrimitiveType::DateRange),
            "link" => Some(PrimitiveType::Link),
            _ => None,
        }
    }

    /// The keyword as written in source
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Datetime => "datetime",
            PrimitiveType::DateRange => "date-range",
            PrimitiveType::Link => "link",
        }
    }
}

/// A field type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpression {
    Primitive(PrimitiveType),
    Literal(String),
    Array(Box<TypeExpression>),
    Union(Vec<TypeExpression>),
}

impl std::fmt::Display for TypeExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpression::Primitive(p) => f.write_str(p.keyword()),
            TypeExpression::Literal(s) => write!(f, "\"{}\"", s),
            TypeExpression::Array(inner) => match inner.as_ref() {
                TypeExpression::Union(_) => write!(f, "({})[]", inner),
                _ => write!(f, "{}[]", inner),
            },
            TypeExpression::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_source_form() {
        let ty = TypeExpression::Array(Box::new(TypeExpression::Union(vec![
            TypeExpression::Primitive(PrimitiveType::String),
            TypeExpression::Primitive(PrimitiveType::Link),
        ])));
        assert_eq!(ty.to_string(), "(string | link)[]");

        let literals = TypeExpression::Union(vec![
            TypeExpression::Literal("high".into()),
            TypeExpression::Literal("low".into()),
        ]);
        assert_eq!(literals.to_string(), "\"high\" | \"low\"");
    }

    #[test]
    fn test_primitive_keywords() {
        for keyword in ["string", "number", "datetime", "date-range", "link"] {
            let primitive = PrimitiveType::from_keyword(keyword).unwrap();
            assert_eq!(primitive.keyword(), keyword);
        }
        assert!(PrimitiveType::from_keyword("boolean").is_none());
    }
}
