use std::path::Path;

use xtml::{builder::Builder, env::Environment, value::Value};

#[test]
fn include_with_parameters() {
    let mut env = Environment::new();
    let output = Builder::new()
        .build_file(Path::new("./demos/page.xtml"), &mut env)
        .expect("page demo should build");

    assert_eq!(output, "<header>Home | Docs</header>\n<p>Body of Docs</p>");
}

#[test]
fn local_include_keeps_mutations_scoped() {
    let mut env = Environment::new();
    let output = Builder::new()
        .build_file(Path::new("./demos/scope_local.xtml"), &mut env)
        .expect("scope demo should build");

    assert_eq!(output, "set mode=outer");
    assert_eq!(env.get("mode"), Some(&Value::Str("outer".into())));
}

#[test]
fn global_include_merges_mutations_back() {
    let mut env = Environment::new();
    let output = Builder::new()
        .build_file(Path::new("./demos/scope_global.xtml"), &mut env)
        .expect("scope demo should build");

    assert_eq!(output, "set mode=inner");
    assert_eq!(env.get("mode"), Some(&Value::Str("inner".into())));
}

#[test]
fn missing_include_fails_the_build() {
    let mut env = Environment::new();
    let result = Builder::new().build_content(
        r#"<xtml include="partials/ghost.xtml" />"#,
        Path::new("./demos"),
        &mut env,
    );

    assert!(result.is_err());
}
