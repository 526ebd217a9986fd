//! Syntax layer
//!
//! Thalo text is split into chunks by a line scanner, each chunk's lines are
//! tokenised by the pest grammar in `thalo.pest`, and the builder assembles
//! typed entries. Parsing never fails on user input: defects become
//! [`thalo_ast::SyntaxError`] nodes.

mod builder;
mod grammar;
mod lines;
mod tree;


pub use tree::{Item, SyntaxTree};

pub(crate) use builder::build_queries;
pub(crate) use lines::Line;
