use crate::app::command_support::{api_client, load_settings, session_log, template_catalog};
use crate::batch::BatchReport;
use crate::decision::TokenCodec;
use crate::shared::TemplateId;
use crate::wizard::{StepId, Wizard, WizardContext, WizardMode};

const USAGE: &str =
    "usage: batch <template>... [--principal <name>] [--name <template>=<name>]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchArgs {
    pub templates: Vec<String>,
    pub principal: Option<String>,
    pub names: Vec<(String, String)>,
}

pub fn parse_batch_args(args: &[String]) -> Result<BatchArgs, String> {
    let mut parsed = BatchArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--principal" => {
                let name = iter.next().ok_or_else(|| USAGE.to_string())?;
                parsed.principal = Some(name.clone());
            }
            "--name" => {
                let pair = iter.next().ok_or_else(|| USAGE.to_string())?;
                let (template, name) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("--name expects <template>=<name>, got `{pair}`"))?;
                parsed
                    .names
                    .push((template.trim().to_string(), name.to_string()));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option `{flag}`\n{USAGE}"));
            }
            template => parsed.templates.push(template.to_string()),
        }
    }
    if parsed.templates.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(parsed)
}

pub fn cmd_batch(args: &[String]) -> Result<String, String> {
    let parsed = parse_batch_args(args)?;
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let catalog = template_catalog(&settings);
    let codec = TokenCodec::new();
    let log = session_log();
    let ctx = WizardContext {
        registry: &client,
        content: &client,
        catalog: &catalog,
        codec: &codec,
        log: &log,
        principal_name: settings.batch.principal_name.clone(),
        resolve_delay: settings.resolve_delay(),
    };
    run_batch(&ctx, &parsed)
}

/// Runs the multi-agent wizard without a terminal: creates the agents, then
/// saves each agent's template content unchanged.
pub fn run_batch(ctx: &WizardContext<'_>, args: &BatchArgs) -> Result<String, String> {
    let mut wizard = Wizard::new();
    wizard
        .choose_mode(ctx, WizardMode::Multi)
        .map_err(|e| e.to_string())?;
    for template in &args.templates {
        if wizard
            .state()
            .multi
            .selected_templates
            .iter()
            .any(|id| id.as_str() == template)
        {
            return Err(format!("template `{template}` is listed more than once"));
        }
        wizard
            .toggle_template(ctx, template)
            .map_err(|e| e.to_string())?;
    }
    wizard.confirm_templates(ctx).map_err(|e| e.to_string())?;
    if let Some(principal) = &args.principal {
        wizard
            .set_agent_name(TemplateId::PRINCIPAL, principal)
            .map_err(|e| e.to_string())?;
    }
    for (template, name) in &args.names {
        wizard
            .set_agent_name(template, name)
            .map_err(|e| e.to_string())?;
    }
    wizard.confirm_names(ctx).map_err(|e| e.to_string())?;

    let created = wizard.create_agents(ctx).map(report_lines);
    let mut lines = match created {
        Ok(lines) => lines,
        Err(err) => {
            let mut lines = wizard
                .state()
                .multi
                .batch
                .as_ref()
                .map(report_lines)
                .unwrap_or_default();
            lines.push(err.to_string());
            return Err(lines.join("\n"));
        }
    };

    wizard.begin_multi_edit(ctx).map_err(|e| e.to_string())?;
    while wizard.step() == StepId::EditMultiAgent {
        let agent = wizard
            .state()
            .multi
            .current_agent()
            .map(|a| a.name.clone())
            .unwrap_or_default();
        let phase = wizard.state().multi.phase;
        let content = wizard.editing_content().clone();
        if let Err(err) = wizard.save_content(ctx, content) {
            lines.push(format!("content: {agent} {}: {err}", phase.as_str()));
            return Err(lines.join("\n"));
        }
    }
    lines.push(format!(
        "content saved for {} agent(s)",
        wizard.state().multi.edited_content.len()
    ));
    Ok(lines.join("\n"))
}

fn report_lines(report: &BatchReport) -> Vec<String> {
    report
        .statuses()
        .map(|status| {
            let mut line = format!(
                "{}\t{}\t{}",
                status.state.as_str(),
                status.template_id,
                status.display_name()
            );
            if let Some(id) = status.agent_id {
                line.push_str(&format!("\tid={id}"));
            }
            if let Some(error) = &status.error {
                line.push_str(&format!("\terror={error}"));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_templates_and_overrides() {
        let parsed = parse_batch_args(&args(&[
            "bancario",
            "--principal",
            "Recepção",
            "bpc",
            "--name",
            "bpc=BPC LOAS",
        ]))
        .expect("parse");
        assert_eq!(parsed.templates, vec!["bancario", "bpc"]);
        assert_eq!(parsed.principal.as_deref(), Some("Recepção"));
        assert_eq!(
            parsed.names,
            vec![("bpc".to_string(), "BPC LOAS".to_string())]
        );
    }

    #[test]
    fn rejects_missing_templates_and_bad_pairs() {
        assert!(parse_batch_args(&args(&["--principal", "X"])).is_err());
        assert!(parse_batch_args(&args(&["bpc", "--name", "bpc"])).is_err());
        assert!(parse_batch_args(&args(&["bpc", "--force"])).is_err());
    }
}
