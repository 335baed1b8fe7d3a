use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_roteiro"))
        .args(args)
        .env("HOME", home)
        .env_remove("ROTEIRO_API_BASE")
        .env_remove("ROTEIRO_API_TOKEN")
        .output()
        .expect("run roteiro")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn init_writes_default_config_once() {
    let dir = tempdir().expect("tempdir");
    let home = dir.path();

    let output = run(home, &["init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("config written"));
    let raw = fs::read_to_string(home.join(".roteiro/config.yaml")).expect("config");
    assert!(raw.contains("trigger_char:"));
    assert!(raw.contains("principal_name: Principal"));

    let again = run(home, &["init"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("config already exists"));
}

#[test]
fn templates_include_extras_from_config() {
    let dir = tempdir().expect("tempdir");
    let home = dir.path();
    fs::create_dir_all(home.join(".roteiro")).expect("config dir");
    fs::write(
        home.join(".roteiro/config.yaml"),
        r#"
templates:
  - id: previdencia
    name: Previdência
    description: Planos de previdência privada
    steps:
      - name: Abertura
        body_html: "<p>Olá!</p>"
"#,
    )
    .expect("write config");

    let output = run(home, &["templates"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let listed = stdout(&output);
    assert!(listed.lines().any(|l| l.starts_with("bancario")));
    assert!(listed
        .lines()
        .any(|l| l.starts_with("previdencia") && l.contains("steps=1")));
}

#[test]
fn backend_commands_fail_without_a_base_url() {
    let dir = tempdir().expect("tempdir");
    let output = run(dir.path(), &["agents"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not configured"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().expect("tempdir");
    let home = dir.path();
    fs::create_dir_all(home.join(".roteiro")).expect("config dir");
    fs::write(
        home.join(".roteiro/config.yaml"),
        "editor:\n  trigger_char: \"ab\"\n",
    )
    .expect("write config");

    let output = run(home, &["templates"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("trigger_char"));
}

#[test]
fn unknown_verb_exits_with_failure() {
    let dir = tempdir().expect("tempdir");
    let output = run(dir.path(), &["deploy"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown command `deploy`"));
}
