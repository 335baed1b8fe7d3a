#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Init,
    Wizard,
    Templates,
    Agents,
    Batch,
    Render,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "init" => CliVerb::Init,
        "wizard" => CliVerb::Wizard,
        "templates" => CliVerb::Templates,
        "agents" => CliVerb::Agents,
        "batch" => CliVerb::Batch,
        "render" => CliVerb::Render,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  init                                 Write a default config to ~/.roteiro/config.yaml"
            .to_string(),
        "  wizard                               Create and configure agents interactively"
            .to_string(),
        "  templates                            List agent templates".to_string(),
        "  agents                               List agents registered in the CRM".to_string(),
        "  batch <template>... [--principal <name>] [--name <template>=<name>]".to_string(),
        "                                       Create a principal plus specialist agents"
            .to_string(),
        "  render <file.html>                   Print stored script HTML with decision labels"
            .to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Environment:".to_string());
    lines.push(format!(
        "  {:<36} Overrides api.base_url",
        crate::config::API_BASE_ENV
    ));
    lines.push(
        "  ROTEIRO_API_TOKEN                    Bearer token (see api.token_env)".to_string(),
    );
    lines.join("\n")
}
