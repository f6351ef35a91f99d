use crate::env::is_identifier;
use crate::error::{BuildError, BuildResult};
use crate::statement::{extract_code_section, parse_parentheses};

use super::{parse_body, AstNode};

/// A `@foreach (name in collection) { body }` loop. The collection source
/// must evaluate to an array at walk time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub binding: String,
    pub collection: String,
    pub children: Vec<AstNode>,
}

impl ForEach {
    pub fn parse(statement: &str) -> BuildResult<ForEach> {
        let header = parse_parentheses(statement);
        let Some((binding, collection)) = header.split_once(" in ") else {
            return Err(BuildError::parse(
                "foreach header must be `name in collection`",
            )
            .with_snippet(statement));
        };

        let binding = binding.trim().to_owned();
        let collection = collection.trim().to_owned();
        if !is_identifier(&binding) {
            return Err(BuildError::parse(format!("invalid loop variable: {binding}"))
                .with_snippet(statement));
        }
        if collection.is_empty() {
            return Err(BuildError::parse("foreach without a collection").with_snippet(statement));
        }

        let body = extract_code_section(statement);
        Ok(ForEach {
            binding,
            collection,
            children: parse_body(&body)?,
        })
    }
}
