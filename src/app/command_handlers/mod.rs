use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::map_config_err;
use crate::config::{default_global_config_path, save_settings_to, Settings};

pub mod agents;
pub mod batch;
pub mod render;
pub mod templates;
pub mod wizard;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Init => cmd_init(),
        CliVerb::Wizard => wizard::cmd_wizard(),
        CliVerb::Templates => templates::cmd_templates(),
        CliVerb::Agents => agents::cmd_agents(),
        CliVerb::Batch => batch::cmd_batch(&args[1..]),
        CliVerb::Render => render::cmd_render(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

fn cmd_init() -> Result<String, String> {
    let path = default_global_config_path().map_err(map_config_err)?;
    if path.exists() {
        return Ok(format!("config already exists\nconfig={}", path.display()));
    }
    let path = save_settings_to(&path, &Settings::default()).map_err(map_config_err)?;
    Ok(format!("config written\nconfig={}", path.display()))
}
