//! The document pipeline: scan tags, resolve includes and defines, evaluate
//! blocks, and run the final placeholder pass.

use std::fs;
use std::path::Path;

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{parse_body, AstNode, AstRoot};
use crate::env::{is_identifier, Environment};
use crate::error::{BuildError, BuildResult};
use crate::expr::{eval_expr, eval_function, is_function_expr};
use crate::interpreter::Interpreter;
use crate::preprocess::preprocess;
use crate::registry::FunctionRegistry;
use crate::scanner::{find_tags, XtmlTag};
use crate::value::Value;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^\}]+)\}\}").expect("placeholder pattern must compile"));

static UNRESOLVED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{@([a-zA-Z0-9_]+)\}\}").expect("unresolved pattern must compile")
});

/// Builds documents against a function registry. The registry is written at
/// construction and only read during evaluation.
pub struct Builder {
    registry: FunctionRegistry,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder with the `std` bundle registered.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::with_std())
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Read and build a single file. Includes resolve relative to the
    /// file's directory.
    pub fn build_file(&self, path: &Path, env: &mut Environment) -> BuildResult<String> {
        info!("building file {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|err| BuildError::io(format!("could not read {}: {err}", path.display())))?;
        let base_path = path.parent().unwrap_or_else(|| Path::new(""));
        self.build_content(&content, base_path, env)
    }

    /// Build a document in memory. The environment is the document's root
    /// environment: define tags, block statements and global includes all
    /// mutate it, and the caller sees the final state.
    pub fn build_content(
        &self,
        content: &str,
        base_path: &Path,
        env: &mut Environment,
    ) -> BuildResult<String> {
        let mut root = AstRoot::new();
        root.merge_vars(env);
        let interpreter = Interpreter::new(&self.registry);

        let mut output = content.to_owned();
        for tag in find_tags(content) {
            if tag.self_closing && tag.attributes.contains_key("include") {
                let resolve_global = tag
                    .attributes
                    .get("resolve")
                    .map(|value| value.trim() != "local")
                    .unwrap_or(true);
                let include = tag
                    .attributes
                    .get("include")
                    .map(|value| value.trim())
                    .unwrap_or_default();
                let include_path = base_path.join(include);
                let included =
                    self.resolve_include(&include_path, &mut root.env, &tag, resolve_global)?;
                output = output.replacen(&tag.full, &included, 1);
                continue;
            }

            if tag.self_closing && tag.attributes.contains_key("define") {
                let (name, value) = resolve_define(&tag)?;
                root.env.set(name, value);
                output = output.replacen(&tag.full, "", 1);
                continue;
            }

            let source = preprocess(&tag.content);
            let block = AstNode::Block(parse_body(&source)?);
            let emitted = interpreter.evaluate(&block, &mut root.env)?;
            root.add_child(block);
            output = output.replacen(&tag.full, &emitted.text, 1);
        }

        output = self.resolve_placeholders(&output, &root.env)?;

        let unresolved = find_unresolved(&output);
        if !unresolved.is_empty() {
            for name in &unresolved {
                error!("unresolved variable: {name}");
            }
            return Err(BuildError::name(format!(
                "build failed due to unresolved variables: {}",
                unresolved.join(", ")
            )));
        }

        env.merge(&root.env);
        Ok(output.trim().to_owned())
    }

    /// Build an included file. The include always evaluates against a
    /// snapshot of the caller's environment extended with `param-*`
    /// bindings; with `resolve_global` the mutated snapshot merges back,
    /// otherwise it is discarded.
    fn resolve_include(
        &self,
        include_path: &Path,
        env: &mut Environment,
        tag: &XtmlTag,
        resolve_global: bool,
    ) -> BuildResult<String> {
        info!("resolving include: {}", include_path.display());

        let mut local_env = env.snapshot();
        for (key, value) in &tag.attributes {
            let Some(name) = key.strip_prefix("param-") else {
                continue;
            };
            if !is_identifier(name) {
                return Err(BuildError::parse(format!("invalid parameter name: {name}"))
                    .with_snippet(&tag.head));
            }
            local_env.set(name, Value::Str(replace_vars(value, env)));
        }

        let content = fs::read_to_string(include_path).map_err(|err| {
            BuildError::io(format!(
                "could not read include {}: {err}",
                include_path.display()
            ))
        })?;
        let base_path = include_path.parent().unwrap_or_else(|| Path::new(""));
        let included = self.build_content(&content, base_path, &mut local_env)?;

        if resolve_global {
            env.merge(&local_env);
        }

        Ok(included)
    }

    /// Substitute `{{@name}}` and `{{ns::fn(args)}}` placeholders. Any
    /// other placeholder shape, and any name missing from the environment,
    /// fails the build.
    fn resolve_placeholders(&self, content: &str, env: &Environment) -> BuildResult<String> {
        let mut replacements = vec![];
        for captures in PLACEHOLDER_RE.captures_iter(content) {
            let placeholder = captures[0].to_owned();
            let inner = captures[1].trim().to_owned();
            debug!("resolving placeholder {placeholder}");

            let value = if let Some(name) = inner.strip_prefix('@') {
                eval_expr(name, env, &self.registry)?
            } else if is_function_expr(&inner) {
                eval_function(&inner, env, &self.registry)?
            } else {
                return Err(BuildError::parse(format!(
                    "unknown placeholder format: {placeholder}"
                )));
            };

            replacements.push((placeholder, value.render()));
        }

        let mut result = content.to_owned();
        for (placeholder, value) in replacements {
            result = result.replace(&placeholder, &value);
        }
        Ok(result)
    }
}

/// Write a fully evaluated document next to its final location and move it
/// into place.
pub fn write_file(content: &str, output_path: &Path) -> BuildResult<()> {
    let Some(file_name) = output_path.file_name() else {
        return Err(BuildError::io(format!(
            "invalid output path: {}",
            output_path.display()
        )));
    };
    let tmp_path = output_path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|err| {
        BuildError::io(format!("could not write {}: {err}", tmp_path.display()))
    })?;
    fs::rename(&tmp_path, output_path).map_err(|err| {
        BuildError::io(format!("could not create {}: {err}", output_path.display()))
    })
}

/// Bind a `<xtml define="name" value="…" type="…" />` tag.
fn resolve_define(tag: &XtmlTag) -> BuildResult<(String, Value)> {
    let name = tag
        .attributes
        .get("define")
        .map(|value| value.trim())
        .unwrap_or_default();
    if !is_identifier(name) {
        return Err(
            BuildError::parse(format!("invalid define name: '{name}'")).with_snippet(&tag.full)
        );
    }

    let value = tag
        .attributes
        .get("value")
        .map(|value| value.trim())
        .unwrap_or_default();
    if value.is_empty() {
        return Err(
            BuildError::parse(format!("empty value for variable: {name}")).with_snippet(&tag.full)
        );
    }

    let kind = tag
        .attributes
        .get("type")
        .map(|value| value.trim())
        .unwrap_or("string");
    match kind {
        "string" => Ok((name.to_owned(), Value::Str(value.to_owned()))),
        "number" => {
            if !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(BuildError::parse(format!(
                    "invalid number value for variable: {name}"
                ))
                .with_snippet(&tag.full));
            }
            let number = value.parse().map_err(|_| {
                BuildError::value(format!("number out of range for variable: {name}"))
            })?;
            Ok((name.to_owned(), Value::Number(number)))
        }
        _ => Err(
            BuildError::parse(format!("unknown variable type: {kind}")).with_snippet(&tag.full)
        ),
    }
}

/// Substitute `{{@name}}` references in a parameter value from the caller's
/// environment.
fn replace_vars(content: &str, env: &Environment) -> String {
    let mut result = content.to_owned();
    for (name, value) in env.iter() {
        let placeholder = format!("{{{{@{name}}}}}");
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, &value.render());
        }
    }
    result
}

/// `{{@name}}` fragments still present after the substitution pass.
fn find_unresolved(content: &str) -> Vec<String> {
    UNRESOLVED_RE
        .captures_iter(content)
        .map(|captures| captures[1].to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn build(content: &str) -> BuildResult<String> {
        let mut env = Environment::new();
        Builder::new().build_content(content, Path::new("."), &mut env)
    }

    #[test]
    fn test_document_level_scenario() {
        let out = build("<xtml>@var name = \"world\";</xtml>Hello, {{@name}}!").unwrap();
        assert_eq!(out, "Hello, world!");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(build("").unwrap(), "");
    }

    #[test]
    fn test_block_emission_replaces_the_tag() {
        let out = build("<p><xtml>@print(\"hi\");</xtml></p>").unwrap();
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_two_blocks_share_the_environment() {
        let out =
            build("<xtml>@var a = 1;</xtml><xtml>@print(a + 1);</xtml>").unwrap();
        assert_eq!(out, "2");
    }

    #[test]
    fn test_each_block_is_evaluated_once() {
        let out = build("<xtml>@print(\"a\");</xtml>-<xtml>@print(\"b\");</xtml>").unwrap();
        assert_eq!(out, "a-b");
    }

    #[test]
    fn test_define_tag() {
        let out = build("<xtml define=\"n\" value=\"5\" type=\"number\" />{{@n}}").unwrap();
        assert_eq!(out, "5");
    }

    #[test]
    fn test_define_defaults_to_string() {
        let mut env = Environment::new();
        Builder::new()
            .build_content("<xtml define=\"s\" value=\"7\" />", Path::new("."), &mut env)
            .unwrap();
        assert_eq!(env.get("s"), Some(&Value::Str("7".into())));
    }

    #[test]
    fn test_define_rejects_bad_number() {
        let err = build("<xtml define=\"n\" value=\"5x\" type=\"number\" />").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_define_rejects_unknown_type() {
        let err = build("<xtml define=\"n\" value=\"5\" type=\"float\" />").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_function_placeholder() {
        let out = build("{{std::toUpper(\"hi\")}}").unwrap();
        assert_eq!(out, "HI");
    }

    #[test]
    fn test_missing_placeholder_variable_fails_the_build() {
        let err = build("Hello, {{@missing}}!").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn test_unknown_placeholder_format_fails_the_build() {
        let err = build("{{name}}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_placeholder_pass_is_idempotent() {
        let builder = Builder::new();
        let mut env = Environment::new();
        env.set("name", Value::Str("world".into()));
        let once = builder
            .build_content("Hello, {{@name}}!", Path::new("."), &mut env)
            .unwrap();
        let twice = builder
            .build_content(&once, Path::new("."), &mut env)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_injected_placeholder_is_caught_as_unresolved() {
        let mut env = Environment::new();
        env.set("x", Value::Str("{{@ghost}}".into()));
        let err = Builder::new()
            .build_content("{{@x}}", Path::new("."), &mut env)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
        assert!(err.message.contains("ghost"));
    }

    #[test]
    fn test_plain_self_closing_tag_is_removed() {
        assert_eq!(build("a<xtml />b").unwrap(), "ab");
    }

    #[test]
    fn test_replace_vars_substitutes_parameters() {
        let mut env = Environment::new();
        env.set("title", Value::Str("Home".into()));
        assert_eq!(replace_vars("Page: {{@title}}", &env), "Page: Home");
        assert_eq!(replace_vars("no refs", &env), "no refs");
    }

    #[test]
    fn test_output_is_trimmed() {
        let out = build("  <xtml>@print(\"x\");</xtml>  ").unwrap();
        assert_eq!(out, "x");
    }
}
