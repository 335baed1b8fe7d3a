use super::state::WizardState;
use super::steps::{StepId, WizardMode};
use crate::batch::BatchReport;
use crate::content::ContentPhase;
use crate::shared::TemplateId;
use crate::templates::TemplateCatalog;

pub const MODE_OPTIONS: [(WizardMode, &str); 2] = [
    (WizardMode::Single, "Create one agent"),
    (WizardMode::Multi, "Create a principal and specialist agents"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRow {
    pub key: String,
    pub label: String,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub name: String,
    pub state: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenKind {
    Choice { rows: Vec<ChoiceRow> },
    NameEntry { current: String },
    NameTable { rows: Vec<ChoiceRow> },
    ContentEditor { agent_name: String, phase: ContentPhase },
    BatchStatus { rows: Vec<StatusRow>, can_continue: bool },
    Summary { lines: Vec<String> },
    NotImplemented { step: StepId },
}

/// What the driver should draw for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenView {
    pub step: StepId,
    pub title: String,
    pub kind: ScreenKind,
}

fn choice(key: &str, label: &str) -> ChoiceRow {
    ChoiceRow {
        key: key.to_string(),
        label: label.to_string(),
        checked: None,
    }
}

fn status_rows(report: &BatchReport) -> Vec<StatusRow> {
    report
        .statuses()
        .map(|status| StatusRow {
            name: status.display_name().to_string(),
            state: status.state.as_str().to_string(),
            detail: match (&status.error, status.agent_id) {
                (Some(error), _) => error.clone(),
                (None, Some(id)) => format!("id {id}"),
                (None, None) => String::new(),
            },
        })
        .collect()
}

/// Projects `state` onto a screen. A step reached under a mode it does not
/// belong to gets an explicit placeholder.
pub fn screen_for(state: &WizardState, catalog: &TemplateCatalog, principal_name: &str) -> ScreenView {
    let step = state.current_step;
    let placeholder = ScreenView {
        step,
        title: format!("{step}"),
        kind: ScreenKind::NotImplemented { step },
    };
    if let Some(branch) = step.branch() {
        if state.mode != Some(branch) {
            return placeholder;
        }
    } else if step == StepId::FinalConfirmation && state.mode.is_none() {
        return placeholder;
    }

    let (title, kind) = match step {
        StepId::SelectMode => (
            "How many agents?".to_string(),
            ScreenKind::Choice {
                rows: MODE_OPTIONS
                    .iter()
                    .map(|(mode, label)| choice(mode.as_str(), label))
                    .collect(),
            },
        ),
        StepId::SelectCreationType => (
            "Start from".to_string(),
            ScreenKind::Choice {
                rows: vec![
                    choice("template", "A template"),
                    choice("scratch", "Scratch"),
                ],
            },
        ),
        StepId::SelectTemplate => (
            "Choose a template".to_string(),
            ScreenKind::Choice {
                rows: std::iter::once(catalog.principal())
                    .chain(catalog.specialists())
                    .map(|t| ChoiceRow {
                        key: t.id.to_string(),
                        label: if t.description.is_empty() {
                            t.name.clone()
                        } else {
                            format!("{} - {}", t.name, t.description)
                        },
                        checked: None,
                    })
                    .collect(),
            },
        ),
        StepId::DefineName => (
            "Agent name".to_string(),
            ScreenKind::NameEntry {
                current: state.single.name.clone(),
            },
        ),
        StepId::EditRules | StepId::EditSteps | StepId::EditFaq => {
            let phase = match step {
                StepId::EditRules => ContentPhase::Rules,
                StepId::EditSteps => ContentPhase::Steps,
                _ => ContentPhase::Faq,
            };
            (
                format!("Edit {}", phase.as_str()),
                ScreenKind::ContentEditor {
                    agent_name: state.single.name.clone(),
                    phase,
                },
            )
        }
        StepId::SelectTemplates => (
            "Choose specialist templates".to_string(),
            ScreenKind::Choice {
                rows: catalog
                    .specialists()
                    .iter()
                    .map(|t| ChoiceRow {
                        key: t.id.to_string(),
                        label: t.name.clone(),
                        checked: Some(state.multi.selected_templates.contains(&t.id)),
                    })
                    .collect(),
            },
        ),
        StepId::ConfigureNames => {
            let name_for = |id: &TemplateId, fallback: &str| {
                state
                    .multi
                    .name_overrides
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| fallback.to_string())
            };
            let principal = TemplateId::principal();
            let mut rows = vec![ChoiceRow {
                key: principal.to_string(),
                label: name_for(&principal, principal_name),
                checked: None,
            }];
            for id in &state.multi.selected_templates {
                let fallback = catalog
                    .get(id.as_str())
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| id.to_string());
                rows.push(ChoiceRow {
                    key: id.to_string(),
                    label: name_for(id, &fallback),
                    checked: None,
                });
            }
            ("Agent names".to_string(), ScreenKind::NameTable { rows })
        }
        StepId::CreateAgents => {
            let (rows, can_continue) = match &state.multi.batch {
                Some(report) => (status_rows(report), report.any_success()),
                None => (Vec::new(), false),
            };
            (
                "Create agents".to_string(),
                ScreenKind::BatchStatus { rows, can_continue },
            )
        }
        StepId::EditMultiAgent => {
            let Some(agent) = state.multi.current_agent() else {
                return placeholder;
            };
            (
                format!(
                    "Agent {} of {}",
                    state.multi.current_agent_index + 1,
                    state.multi.created_agents.len()
                ),
                ScreenKind::ContentEditor {
                    agent_name: agent.name.clone(),
                    phase: state.multi.phase,
                },
            )
        }
        StepId::FinalConfirmation => {
            let lines = match state.mode {
                Some(WizardMode::Single) => vec![format!(
                    "Agent `{}` is configured.",
                    state.single.name
                )],
                _ => state
                    .multi
                    .created_agents
                    .iter()
                    .map(|agent| {
                        let saved = state.multi.edited_content.contains_key(&agent.agent_id);
                        format!(
                            "{} (id {}): {}",
                            agent.name,
                            agent.agent_id,
                            if saved { "configured" } else { "created" }
                        )
                    })
                    .collect(),
            };
            ("Done".to_string(), ScreenKind::Summary { lines })
        }
    };
    ScreenView { step, title, kind }
}
