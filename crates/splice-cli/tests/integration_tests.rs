//! Integration tests for the splice CLI
//!
//! These tests verify the CLI behavior end-to-end

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Helper function to create a test CLI command
#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("splice").unwrap()
}

/// A shader tree with one root and one include
fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("include")).unwrap();
    fs::write(
        temp_dir.path().join("main.frag"),
        "#version 450\n@import \"common.glsl\"\nvoid main(){}\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("include/common.glsl"),
        "float k = 1.0; // \u{2550}\n",
    )
    .unwrap();
    temp_dir
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("expands @import directives"))
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_version_command() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_version_detailed() {
    cli()
        .args(["version", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("splice {VERSION}")))
        .stdout(predicate::str::contains("Build information:"))
        .stdout(predicate::str::contains("OS:"));
}

#[test]
fn test_build_help() {
    cli()
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--define"))
        .stdout(predicate::str::contains("--emit-map"))
        .stdout(predicate::str::contains("--no-line-directives"));
}

#[test]
fn test_build_to_stdout() {
    let temp_dir = create_test_project();
    cli()
        .args(["build", temp_dir.path().to_str().unwrap(), "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/* @import \"common.glsl\" */"))
        .stdout(predicate::str::contains("#line 1 1\nfloat k = 1.0; // \n"))
        .stdout(predicate::str::contains("void main(){}"))
        .stdout(predicate::str::contains("\u{2550}").not());
}

#[test]
fn test_build_with_defines_and_flags() {
    let temp_dir = create_test_project();
    cli()
        .args([
            "build",
            temp_dir.path().join("main.frag").to_str().unwrap(),
            "--stdout",
            "-D",
            "QUALITY=2",
            "--no-line-directives",
            "--keep-unicode",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#version 450\n#define QUALITY 2\n"))
        .stdout(predicate::str::contains("#line").not())
        .stdout(predicate::str::contains("\u{2550}"));
}

#[test]
fn test_build_writes_outputs_and_maps() {
    let temp_dir = create_test_project();
    let out_dir = temp_dir.path().join("out");
    cli()
        .args([
            "build",
            temp_dir.path().to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
            "--emit-map",
        ])
        .assert()
        .success();

    let text = fs::read_to_string(out_dir.join("main.frag")).unwrap();
    assert!(text.contains("float k = 1.0;"));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("main.frag.map.json")).unwrap())
            .unwrap();
    assert_eq!(map["resource"]["namespace"], "shader");
    assert_eq!(map["resourcePaths"]["1"], "shader:include/common.glsl");
    assert_eq!(map["hadImports"], true);
}

#[test]
fn test_build_reports_missing_imports() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("main.frag"),
        "#version 450\n@import \"missing\"\nvoid main(){}\n",
    )
    .unwrap();
    cli()
        .args(["build", temp_dir.path().to_str().unwrap(), "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("// WARNING: import 'missing' not found"));
}

#[test]
fn test_build_survives_directory_and_latin1_includes() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("include/lights")).unwrap();
    fs::write(
        temp_dir.path().join("include/common.glsl"),
        b"// \xA9 Studio\nfloat k = 1.0;\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("main.frag"),
        "#version 450\n@import \"lights\"\n@import \"common.glsl\"\nvoid main(){}\n",
    )
    .unwrap();
    cli()
        .args(["build", temp_dir.path().to_str().unwrap(), "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("// WARNING: import 'lights' not found"))
        .stdout(predicate::str::contains("float k = 1.0;"));
}

#[test]
fn test_build_fails_without_version_for_defines() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("main.frag"), "void main(){}\n").unwrap();
    cli()
        .args([
            "build",
            temp_dir.path().to_str().unwrap(),
            "--stdout",
            "-D",
            "A",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("1 of 1 shaders failed"));
}

#[test]
fn test_build_rejects_bad_define() {
    cli()
        .args(["build", ".", "-D", "not a name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid define"));
}

#[test]
fn test_build_missing_path() {
    let temp_dir = TempDir::new().unwrap();
    cli()
        .args([
            "build",
            temp_dir.path().join("nope.frag").to_str().unwrap(),
            "--stdout",
        ])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_build_uses_config_roots() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::create_dir_all(temp_dir.path().join("engine/include")).unwrap();
    fs::write(
        temp_dir.path().join("src/main.frag"),
        "#version 450\n@import \"engine:include/noise.glsl\"\nvoid main(){}\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("engine/include/noise.glsl"),
        "float noise(vec2 p){ return 0.0; }\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("splice.yaml"),
        "roots:\n  shader: src\n  engine: engine\n",
    )
    .unwrap();

    cli()
        .args([
            "build",
            temp_dir.path().join("src").to_str().unwrap(),
            "--stdout",
            "-c",
            temp_dir.path().join("splice.yaml").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("float noise(vec2 p)"));
}

#[test]
fn test_config_init_and_show() {
    let temp_dir = TempDir::new().unwrap();
    cli()
        .current_dir(temp_dir.path())
        .args(["config", "init", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("splice.yaml"));
    assert!(temp_dir.path().join("splice.yaml").exists());

    cli()
        .current_dir(temp_dir.path())
        .args(["config", "init", "--format", "yaml"])
        .assert()
        .failure();

    cli()
        .current_dir(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"namespace\": \"shader\""))
        .stdout(predicate::str::contains("\"includeDir\": \"include\""));
}

#[test]
fn test_generate_completion() {
    cli()
        .args(["--generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("splice"));
}

#[test]
fn test_no_command_shows_help() {
    cli()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}
