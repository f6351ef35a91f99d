//! The expression evaluator: literals, variable lookup, `+` accumulation,
//! function invocation, and array literals.

use unescape::unescape;

use crate::env::Environment;
use crate::error::{BuildError, BuildResult};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Evaluate an expression against the environment. An empty expression
/// yields [`Value::Unknown`]; an identifier that is neither a literal nor a
/// bound variable is a name error.
pub fn eval_expr(
    expr: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<Value> {
    let mut result = Value::Unknown;

    for token in split_top_level(expr) {
        if token.is_empty() {
            continue;
        }
        let evaluated = eval_token(&token, env, registry)?;

        if result.is_unknown() {
            result = evaluated;
        } else {
            result = accumulate(result, evaluated, expr)?;
        }
    }

    Ok(result)
}

/// Cut an expression on `+` at parenthesis depth zero, outside
/// double-quoted strings. Tokens come back trimmed.
fn split_top_level(expr: &str) -> Vec<String> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut paren_depth = 0i32;
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in expr.chars() {
        if c == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
            current.push(c);
            prev = Some(c);
            continue;
        }

        if !in_quotes {
            if c == '(' {
                paren_depth += 1;
            } else if c == ')' {
                paren_depth -= 1;
            } else if c == '+' && paren_depth == 0 {
                tokens.push(current.trim().to_owned());
                current.clear();
                prev = Some(c);
                continue;
            }
        }

        current.push(c);
        prev = Some(c);
    }

    if !current.is_empty() {
        tokens.push(current.trim().to_owned());
    }

    tokens
}

fn eval_token(
    token: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<Value> {
    if is_function_expr(token) {
        return eval_function(token, env, registry);
    }
    if token.starts_with('[') && token.ends_with(']') {
        return eval_array(token, env, registry);
    }
    if is_string_literal(token) {
        let inner = &token[1..token.len() - 1];
        return Ok(Value::Str(expand_escapes(inner)));
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse()
            .map(Value::Number)
            .map_err(|_| BuildError::value(format!("number literal out of range: {token}")));
    }
    if token == "true" || token == "false" {
        return Ok(Value::Bool(token == "true"));
    }
    if let Some(value) = env.get(token) {
        return Ok(value.clone());
    }

    Err(BuildError::name(format!("unknown token in expression: {token}")))
}

/// Fold one evaluated token into the accumulator under `+`. Strings
/// dominate and concatenate canonical renderings; two numbers add; any
/// other pairing is a type error.
fn accumulate(acc: Value, token: Value, expr: &str) -> BuildResult<Value> {
    if matches!(acc, Value::Str(_)) || matches!(token, Value::Str(_)) {
        return Ok(Value::Str(format!("{}{}", acc.render(), token.render())));
    }
    if let (Value::Number(lhs), Value::Number(rhs)) = (&acc, &token) {
        return Ok(Value::Number(lhs.wrapping_add(*rhs)));
    }
    Err(
        BuildError::type_error(format!(
            "incompatible types in expression: {} + {}",
            acc.kind(),
            token.kind()
        ))
        .with_snippet(expr),
    )
}

fn is_string_literal(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

/// Expand `\n`, `\t`, `\"` and `\\`. Sequences the expander rejects leave
/// the literal untouched.
fn expand_escapes(raw: &str) -> String {
    unescape(raw).unwrap_or_else(|| raw.to_owned())
}

/// Whether a token looks like a namespaced call, e.g. `std::len("x")`.
pub fn is_function_expr(token: &str) -> bool {
    token.contains("::") && token.contains('(') && token.contains(')')
}

/// Evaluate a `ns::fn(a1, a2, …)` call through the registry. Arguments are
/// evaluated recursively; an Unknown argument aborts the call.
pub fn eval_function(
    expr: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<Value> {
    let (namespace, name, args) = parse_function_call(expr)?;

    let mut values = vec![];
    for arg in &args {
        let value = eval_expr(arg, env, registry)?;
        if value.is_unknown() {
            return Err(
                BuildError::value(format!("failed to evaluate function argument: {arg}"))
                    .with_snippet(expr),
            );
        }
        values.push(value);
    }

    if !registry.exists(&namespace, &name) {
        return Err(BuildError::name(format!(
            "function not found: {namespace}::{name}"
        )));
    }
    Ok(registry.call(&namespace, &name, &values))
}

/// Split `ns::fn(args)` into namespace, name, and raw argument sources.
fn parse_function_call(expr: &str) -> BuildResult<(String, String, Vec<String>)> {
    let expr = expr.trim();
    let Some((namespace, rest)) = expr.split_once("::") else {
        return Err(BuildError::parse(format!("invalid function call: {expr}")));
    };
    let namespace = namespace.trim().to_owned();
    let rest = rest.trim();

    let Some(paren) = rest.find('(') else {
        return Err(BuildError::parse(format!("invalid function call: {expr}")));
    };
    if !rest.ends_with(')') {
        return Err(BuildError::parse(format!("invalid function call: {expr}")));
    }

    let name = rest[..paren].trim().to_owned();
    let args_str = rest[paren + 1..rest.len() - 1].trim();

    Ok((namespace, name, split_arguments(args_str)))
}

/// Split an argument list on `,` at parenthesis depth zero, outside quotes.
fn split_arguments(args_str: &str) -> Vec<String> {
    let mut args = vec![];
    let mut current = String::new();
    let mut paren_depth = 0i32;
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in args_str.chars() {
        if c == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
            current.push(c);
            prev = Some(c);
            continue;
        }

        if !in_quotes {
            if c == '(' {
                paren_depth += 1;
            } else if c == ')' {
                paren_depth -= 1;
            } else if c == ',' && paren_depth == 0 {
                args.push(current.trim().to_owned());
                current.clear();
                prev = Some(c);
                continue;
            }
        }

        current.push(c);
        prev = Some(c);
    }

    if !current.is_empty() {
        args.push(current.trim().to_owned());
    }

    args
}

/// Evaluate an `[e1, e2, …]` literal. Elements evaluate recursively; an
/// Unknown element aborts the literal.
fn eval_array(
    token: &str,
    env: &Environment,
    registry: &FunctionRegistry,
) -> BuildResult<Value> {
    let inner = &token[1..token.len() - 1];

    let mut items = vec![];
    for element in split_arguments(inner) {
        let value = eval_expr(&element, env, registry)?;
        if value.is_unknown() {
            return Err(
                BuildError::value(format!("failed to evaluate array element: {element}"))
                    .with_snippet(token),
            );
        }
        items.push(value);
    }

    Ok(Value::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn eval(expr: &str, env: &Environment) -> BuildResult<Value> {
        eval_expr(expr, env, &FunctionRegistry::with_std())
    }

    fn empty() -> Environment {
        Environment::new()
    }

    #[test]
    fn test_literals() {
        let env = empty();
        assert_eq!(eval("42", &env).unwrap(), Value::Number(42));
        assert_eq!(eval("\"hi\"", &env).unwrap(), Value::Str("hi".into()));
        assert_eq!(eval("true", &env).unwrap(), Value::Bool(true));
        assert_eq!(eval("false", &env).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_digit_literal_is_number_not_bool() {
        let env = empty();
        assert_eq!(eval("1", &env).unwrap(), Value::Number(1));
        assert_eq!(eval("0", &env).unwrap(), Value::Number(0));
    }

    #[test]
    fn test_empty_expression_is_unknown() {
        assert_eq!(eval("", &empty()).unwrap(), Value::Unknown);
        assert_eq!(eval("   ", &empty()).unwrap(), Value::Unknown);
    }

    #[test]
    fn test_variable_lookup() {
        let mut env = empty();
        env.set("a", Value::Number(2));
        assert_eq!(eval("a", &env).unwrap(), Value::Number(2));
    }

    #[test]
    fn test_unknown_identifier_is_name_error() {
        let err = eval("missing", &empty()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn test_number_addition() {
        let mut env = empty();
        env.set("a", Value::Number(2));
        env.set("b", Value::Number(3));
        assert_eq!(eval("a + b + 5", &env).unwrap(), Value::Number(10));
    }

    #[test]
    fn test_string_dominance() {
        let mut env = empty();
        env.set("a", Value::Number(2));
        env.set("b", Value::Number(3));
        assert_eq!(
            eval("a + b + \" items\"", &env).unwrap(),
            Value::Str("5 items".into())
        );
        assert_eq!(
            eval("\"n=\" + a", &env).unwrap(),
            Value::Str("n=2".into())
        );
    }

    #[test]
    fn test_incompatible_operands() {
        let mut env = empty();
        env.set("flag", Value::Bool(true));
        let err = eval("flag + 1", &env).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_escape_expansion() {
        let env = empty();
        assert_eq!(
            eval(r#""a\nb\tc""#, &env).unwrap(),
            Value::Str("a\nb\tc".into())
        );
        assert_eq!(
            eval(r#""say \"hi\"""#, &env).unwrap(),
            Value::Str("say \"hi\"".into())
        );
        assert_eq!(
            eval(r#""back\\slash""#, &env).unwrap(),
            Value::Str("back\\slash".into())
        );
    }

    #[test]
    fn test_plus_inside_string_is_literal() {
        assert_eq!(
            eval("\"a + b\"", &empty()).unwrap(),
            Value::Str("a + b".into())
        );
    }

    #[test]
    fn test_array_literal() {
        let mut env = empty();
        env.set("x", Value::Number(9));
        assert_eq!(
            eval("[\"a\", 2, x]", &env).unwrap(),
            Value::Array(vec![
                Value::Str("a".into()),
                Value::Number(2),
                Value::Number(9)
            ])
        );
        assert_eq!(eval("[]", &env).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_function_call() {
        let env = empty();
        assert_eq!(
            eval("std::toUpper(\"ab\")", &env).unwrap(),
            Value::Str("AB".into())
        );
        assert_eq!(
            eval("std::len(\"abc\") + 1", &env).unwrap(),
            Value::Number(4)
        );
    }

    #[test]
    fn test_nested_function_call() {
        let env = empty();
        assert_eq!(
            eval("std::toLower(std::toUpper(\"ab\"))", &env).unwrap(),
            Value::Str("ab".into())
        );
    }

    #[test]
    fn test_function_args_with_commas_in_strings() {
        let env = empty();
        assert_eq!(
            eval("std::len(\"a,b\")", &env).unwrap(),
            Value::Number(3)
        );
    }

    #[test]
    fn test_missing_function_is_name_error() {
        let err = eval("std::nothing()", &empty()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn test_plus_inside_call_parens_stays_one_token() {
        let mut env = empty();
        env.set("a", Value::Number(1));
        assert_eq!(
            eval("std::toStr(a + 2)", &env).unwrap(),
            Value::Str("3".into())
        );
    }

    #[test]
    fn test_unknown_function_argument_aborts() {
        let err = eval("std::toUpper(std::toUpper(1))", &empty()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn test_is_function_expr() {
        assert!(is_function_expr("std::len(\"x\")"));
        assert!(is_function_expr("math::add(1, 2)"));
        assert!(!is_function_expr("std::len"));
        assert!(!is_function_expr("len(\"x\")"));
    }
}
