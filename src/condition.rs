//! The condition evaluator behind `@if`, `@while`, and `@for` headers.

use crate::env::Environment;
use crate::error::{BuildError, BuildResult};
use crate::expr::eval_expr;
use crate::registry::FunctionRegistry;
use crate::statement::parse_parentheses;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionOp {
    And,
    Or,
}

/// Evaluate a condition string to a boolean. Conjunctions and disjunctions
/// are combined strictly left-to-right in textual order; both operands of
/// every operator are evaluated eagerly.
pub fn evaluate_condition(
    condition: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<bool> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Err(BuildError::parse("empty condition"));
    }

    let (subconditions, ops) = split_conditions(condition);
    resolve_conditions(&subconditions, &ops, condition, env, registry)
}

fn resolve_condition(
    condition: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<bool> {
    let tokens = tokenize_condition(condition);
    if tokens.len() == 3 {
        return resolve_comparison(&tokens[0], &tokens[1], &tokens[2], condition, env, registry);
    }

    let (subconditions, ops) = split_conditions(condition);
    if ops.is_empty() && subconditions.len() == 1 && subconditions[0] == condition {
        // Nothing left to peel off; recursing would never terminate.
        return Err(BuildError::parse(format!("invalid condition: {condition}")));
    }
    resolve_conditions(&subconditions, &ops, condition, env, registry)
}

fn resolve_conditions(
    subconditions: &[String],
    ops: &[ConditionOp],
    source: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<bool> {
    if subconditions.is_empty() {
        return Err(BuildError::parse("empty condition").with_snippet(source));
    }
    if subconditions.len() != ops.len() + 1 {
        return Err(
            BuildError::parse("mismatched conditions and operators").with_snippet(source)
        );
    }

    let mut results = vec![];
    for subcondition in subconditions {
        results.push(resolve_condition(subcondition, env, registry)?);
    }

    let mut result = results[0];
    for (op, value) in ops.iter().zip(&results[1..]) {
        match op {
            ConditionOp::And => result = result && *value,
            ConditionOp::Or => result = result || *value,
        }
    }
    Ok(result)
}

fn resolve_comparison(
    lhs: &str,
    op: &str,
    rhs: &str,
    source: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<bool> {
    let left = eval_expr(lhs, env, registry)?;
    let right = eval_expr(rhs, env, registry)?;

    if left.is_unknown() || right.is_unknown() {
        return Err(BuildError::value("unknown value in condition").with_snippet(source));
    }

    match (&left, &right) {
        (Value::Str(a), Value::Str(b)) => match op {
            "==" => Ok(a == b),
            "!=" => Ok(a != b),
            _ => Err(BuildError::type_error(format!(
                "invalid operator for string comparison: {op}"
            ))
            .with_snippet(source)),
        },
        (Value::Number(a), Value::Number(b)) => match op {
            "==" => Ok(a == b),
            "!=" => Ok(a != b),
            "<" => Ok(a < b),
            "<=" => Ok(a <= b),
            ">" => Ok(a > b),
            ">=" => Ok(a >= b),
            _ => Err(BuildError::type_error(format!(
                "invalid operator for numeric comparison: {op}"
            ))
            .with_snippet(source)),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            "==" => Ok(a == b),
            "!=" => Ok(a != b),
            _ => Err(BuildError::type_error(format!(
                "invalid operator for boolean comparison: {op}"
            ))
            .with_snippet(source)),
        },
        _ => Err(BuildError::type_error(format!(
            "type mismatch in condition: {} vs {}",
            left.kind(),
            right.kind()
        ))
        .with_snippet(source)),
    }
}

/// Split a condition on `&&` and `||` at parenthesis depth zero, outside
/// quotes. Each sub-condition loses one level of surrounding parentheses.
/// Operators come back in textual order.
fn split_conditions(condition: &str) -> (Vec<String>, Vec<ConditionOp>) {
    let mut conditions = vec![];
    let mut ops = vec![];
    let mut current = String::new();
    let mut in_quotes = false;
    let mut paren_depth = 0i32;
    let mut chars = condition.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' || c == '\'' {
            in_quotes = !in_quotes;
            current.push(c);
            continue;
        }
        if !in_quotes {
            if c == '(' {
                paren_depth += 1;
            } else if c == ')' {
                paren_depth -= 1;
            } else if (c == '&' || c == '|') && paren_depth == 0 && chars.peek() == Some(&c) {
                chars.next();
                flush_condition(&mut conditions, &mut current);
                ops.push(if c == '&' {
                    ConditionOp::And
                } else {
                    ConditionOp::Or
                });
                continue;
            }
        }
        current.push(c);
    }
    flush_condition(&mut conditions, &mut current);

    let conditions = conditions.into_iter().map(strip_parens).collect();
    (conditions, ops)
}

fn flush_condition(conditions: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        conditions.push(trimmed.to_owned());
    }
    current.clear();
}

fn strip_parens(condition: String) -> String {
    if condition.starts_with('(') && condition.ends_with(')') {
        parse_parentheses(&condition).trim().to_owned()
    } else {
        condition
    }
}

/// Whitespace-tokenize a condition, outside quotes.
fn tokenize_condition(condition: &str) -> Vec<String> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut in_quotes = false;

    for c in condition.chars() {
        if c == '"' || c == '\'' {
            in_quotes = !in_quotes;
            current.push(c);
            continue;
        }
        if !in_quotes && c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(current.clone());
                current.clear();
            }
            continue;
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
