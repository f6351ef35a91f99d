use std::path::Path;

use xtml::{builder::Builder, env::Environment};

fn build(content: &str) -> String {
    let mut env = Environment::new();
    Builder::new()
        .build_content(content, Path::new("."), &mut env)
        .expect("document should build")
}

#[test]
fn document_with_block_and_placeholder() {
    let output = build("<xtml>@var name = \"world\";</xtml>Hello, {{@name}}!");
    assert_eq!(output, "Hello, world!");
}

#[test]
fn empty_document_builds_to_empty_output() {
    assert_eq!(build(""), "");
}

#[test]
fn whitespace_only_block_emits_nothing() {
    assert_eq!(build("a<xtml>   \n\t </xtml>b"), "ab");
}

#[test]
fn loops_and_conditions_emit_inline() {
    let source = "<xtml>\
        @var i = 0; \
        @while (i < 5) { \
            @if (i == 3) { @break; } \
            @print(i); \
            @var i = i + 1; \
        }\
    </xtml>";
    assert_eq!(build(source), "012");
}

#[test]
fn foreach_over_array_literal() {
    let source = "<xtml>@foreach (x in [\"a\",\"b\",\"c\"]) { @print(x); }</xtml>";
    assert_eq!(build(source), "abc");
}

#[test]
fn function_placeholders_resolve() {
    assert_eq!(build("{{std::toLower(\"ABC\")}}"), "abc");
}
