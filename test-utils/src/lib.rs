use std::{
    env,
    error::Error,
    fs,
    path::Path,
    process::{self, Command, Output},
    str,
};

const XTML_PATH: &str = "./target/debug/xtml";

pub struct Expected<'a> {
    pub output: &'a str,
}

fn run_build(src_path: &Path) -> Result<Output, Box<dyn Error>> {
    Ok(Command::new(XTML_PATH).arg("build").arg(src_path).output()?)
}

/// Build a document through the compiled binary and compare the emitted
/// html. The document is staged in a scratch directory first, so the
/// output lands next to the copy instead of in the repository.
pub fn check_build(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let staged_dir = env::temp_dir().join(format!("xtml-test-{}", process::id()));
    fs::create_dir_all(&staged_dir)?;
    let staged = staged_dir.join(src_path.file_name().ok_or("missing file name")?);
    fs::copy(src_path, &staged)?;

    let build_output = run_build(&staged)?;
    let build_stderr = str::from_utf8(&build_output.stderr)?;
    assert!(
        build_output.status.success(),
        "xtml exited with status {:?}: {build_stderr}",
        build_output.status.code()
    );

    let html = fs::read_to_string(staged.with_extension("html"))?;
    assert_eq!(html, expected.output);

    Ok(())
}

/// Build a document that must fail; asserts a non-zero exit code.
pub fn check_failing_build(src_path: &Path) -> Result<(), Box<dyn Error>> {
    let build_output = run_build(src_path)?;
    assert!(
        !build_output.status.success(),
        "xtml should exit with a non-zero status"
    );
    Ok(())
}

/// The `version` subcommand must print the version banner.
pub fn check_version() -> Result<(), Box<dyn Error>> {
    let output = Command::new(XTML_PATH).arg("version").output()?;
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout)?;
    assert!(
        stdout.starts_with("xtml version:"),
        "unexpected banner: {stdout}"
    );
    Ok(())
}
