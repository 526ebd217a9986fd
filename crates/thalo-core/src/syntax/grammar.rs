use pest_derive::Parser;

/// Line-level Thalo grammar
#[derive(Parser)]
#[grammar = "syntax/thalo.pest"]
pub(crate) struct ThaloGrammar;
