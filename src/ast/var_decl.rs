use crate::env::is_identifier;
use crate::error::{BuildError, BuildResult};
use crate::statement::{parse_assignment, trim_var};

/// A `@var name = expr;` declaration. The right-hand side stays a source
/// string and is evaluated against the environment at walk time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub expr: String,
}

impl VarDecl {
    pub fn parse(statement: &str) -> BuildResult<VarDecl> {
        let line = trim_var(statement);
        let Some((name, expr)) = parse_assignment(line) else {
            return Err(
                BuildError::parse("variable declaration without `=`").with_snippet(statement)
            );
        };
        if !is_identifier(&name) {
            return Err(
                BuildError::parse(format!("invalid variable name: {name}")).with_snippet(statement)
            );
        }
        Ok(VarDecl { name, expr })
    }
}
