use crate::error::BuildResult;
use crate::statement::{extract_code_section, parse_parentheses};

use super::{parse_body, AstNode};

/// A `@while (cond) { body }` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: String,
    pub children: Vec<AstNode>,
}

impl WhileLoop {
    pub fn parse(statement: &str) -> BuildResult<WhileLoop> {
        let condition = parse_parentheses(statement);
        let body = extract_code_section(statement);
        Ok(WhileLoop {
            condition,
            children: parse_body(&body)?,
        })
    }
}
