use crate::error::{BuildError, BuildResult};
use crate::statement::{extract_code_section, parse_parentheses, split_statements, trim_var};

use super::{parse_body, AstNode};

/// A `@for (init; cond; inc) { body }` loop. All three header parts stay
/// source strings: the init is parsed as an assignment at loop entry and the
/// increment is re-parsed on every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub init: String,
    pub condition: String,
    pub increment: String,
    pub children: Vec<AstNode>,
}

impl ForLoop {
    pub fn parse(statement: &str) -> BuildResult<ForLoop> {
        let header = parse_parentheses(statement);
        let parts = split_statements(&header);
        if parts.len() != 3 {
            return Err(BuildError::parse(
                "for loop header must have init, condition, and increment",
            )
            .with_snippet(statement));
        }

        let body = extract_code_section(statement);
        Ok(ForLoop {
            init: trim_var(&parts[0]).to_owned(),
            condition: trim_var(&parts[1]).to_owned(),
            increment: trim_var(&parts[2]).to_owned(),
            children: parse_body(&body)?,
        })
    }
}
