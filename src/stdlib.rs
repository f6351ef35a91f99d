//! The built-in `std` function bundle.

use log::error;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::registry::{Bundle, FunctionRegistry};
use crate::value::Value;

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn random_chars(rng: &mut impl Rng, count: usize) -> String {
    (0..count)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn format_uuid(rng: &mut impl Rng) -> String {
    let mut result = String::with_capacity(36);
    for i in 0..36 {
        if i == 8 || i == 13 || i == 18 || i == 23 {
            result.push('-');
        } else {
            result.push(CHARSET[rng.gen_range(0..CHARSET.len())] as char);
        }
    }
    result
}

/// Parse a value's canonical rendering as a non-negative decimal integer.
fn as_digit_string(value: &Value) -> Option<i64> {
    let rendered = value.render();
    if rendered.is_empty() || !rendered.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rendered.parse().ok()
}

/// Registers the `std` namespace: string helpers, type probes, array
/// accessors, and the two random generators.
pub struct StdBundle;

impl Bundle for StdBundle {
    fn register(&self, registry: &mut FunctionRegistry) {
        registry.register_namespace("std");

        registry.register_function(
            "std",
            "toUpper",
            Box::new(|args| match args {
                [Value::Str(s)] => Value::Str(s.to_ascii_uppercase()),
                _ => {
                    error!("std::toUpper expects a single string argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "toLower",
            Box::new(|args| match args {
                [Value::Str(s)] => Value::Str(s.to_ascii_lowercase()),
                _ => {
                    error!("std::toLower expects a single string argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "randStr",
            Box::new(|args| match args {
                [Value::Number(n)] => {
                    let length = (*n).max(0) as usize;
                    Value::Str(random_chars(&mut rand::thread_rng(), length))
                }
                _ => {
                    error!("std::randStr expects a single numeric argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "isInt",
            Box::new(|args| match args {
                [value] => Value::Bool(matches!(value, Value::Number(_))),
                _ => {
                    error!("std::isInt expects a single argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "isStr",
            Box::new(|args| match args {
                [value] => Value::Bool(matches!(value, Value::Str(_))),
                _ => {
                    error!("std::isStr expects a single argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "toInt",
            Box::new(|args| match args {
                [value] => match as_digit_string(value) {
                    Some(n) => Value::Number(n),
                    None => {
                        error!("std::toInt expects a single numeric argument");
                        Value::Unknown
                    }
                },
                _ => {
                    error!("std::toInt expects a single numeric argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "toStr",
            Box::new(|args| match args {
                [Value::Array(_)] | [Value::Unknown] => {
                    error!("std::toStr expects a single scalar argument");
                    Value::Unknown
                }
                [value] => Value::Str(value.render()),
                _ => {
                    error!("std::toStr expects a single scalar argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "len",
            Box::new(|args| match args {
                [Value::Str(s)] => Value::Number(s.len() as i64),
                _ => {
                    error!("std::len expects a single string argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "trim",
            Box::new(|args| match args {
                [Value::Str(s)] => Value::Str(s.trim().to_owned()),
                _ => {
                    error!("std::trim expects a single string argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "trimQuotes",
            Box::new(|args| match args {
                [Value::Str(s)] => {
                    let trimmed = if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
                        s[1..s.len() - 1].to_owned()
                    } else {
                        s.clone()
                    };
                    Value::Str(trimmed)
                }
                _ => {
                    error!("std::trimQuotes expects a single string argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "get",
            Box::new(|args| match args {
                [Value::Array(items), Value::Number(index)] => {
                    match usize::try_from(*index).ok().and_then(|i| items.get(i)) {
                        Some(value) => value.clone(),
                        None => {
                            error!("std::get index {index} out of bounds (len {})", items.len());
                            Value::Unknown
                        }
                    }
                }
                _ => {
                    error!("std::get expects an array and a numeric index");
                    Value::Unknown
                }
            }),
            2,
            2,
        );

        registry.register_function(
            "std",
            "count",
            Box::new(|args| match args {
                [Value::Array(items)] => Value::Number(items.len() as i64),
                _ => {
                    error!("std::count expects a single array argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "print",
            Box::new(|args| match args {
                [value] => Value::Str(value.render()),
                _ => {
                    error!("std::print expects a single argument");
                    Value::Unknown
                }
            }),
            1,
            1,
        );

        registry.register_function(
            "std",
            "uuid",
            Box::new(|args| match args {
                [] => Value::Str(format_uuid(&mut rand::thread_rng())),
                [Value::Number(seed)] => {
                    let mut rng = StdRng::seed_from_u64(*seed as u64);
                    Value::Str(format_uuid(&mut rng))
                }
                _ => {
                    error!("std::uuid expects 0 or 1 numeric argument (seed)");
                    Value::Unknown
                }
            }),
            0,
            1,
        );
    }
}
