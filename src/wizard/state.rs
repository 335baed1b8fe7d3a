use super::steps::{CreationType, StepId, WizardMode};
use crate::backend::AgentRecord;
use crate::batch::{BatchReport, CreatedAgentRef};
use crate::content::{AgentContent, ContentPhase};
use crate::shared::TemplateId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SingleAgentState {
    pub creation_type: Option<CreationType>,
    pub template_id: Option<TemplateId>,
    pub name: String,
    pub created_agent: Option<AgentRecord>,
    pub edited_content: AgentContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiAgentState {
    /// Specialist templates, in selection order.
    pub selected_templates: Vec<TemplateId>,
    /// Template id (or `principal`) to operator-chosen name.
    pub name_overrides: BTreeMap<TemplateId, String>,
    pub batch: Option<BatchReport>,
    pub created_agents: Vec<CreatedAgentRef>,
    pub current_agent_index: usize,
    pub phase: ContentPhase,
    /// Content of the agent currently being edited.
    pub draft: AgentContent,
    /// Agent id to content, filled in as each agent's FAQ is saved.
    pub edited_content: BTreeMap<i64, AgentContent>,
}

impl Default for MultiAgentState {
    fn default() -> Self {
        Self {
            selected_templates: Vec::new(),
            name_overrides: BTreeMap::new(),
            batch: None,
            created_agents: Vec::new(),
            current_agent_index: 0,
            phase: ContentPhase::Rules,
            draft: AgentContent::default(),
            edited_content: BTreeMap::new(),
        }
    }
}

impl MultiAgentState {
    pub fn current_agent(&self) -> Option<&CreatedAgentRef> {
        self.created_agents.get(self.current_agent_index)
    }
}

/// Partial update for [`SingleAgentState`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct SingleAgentPatch {
    pub creation_type: Option<CreationType>,
    pub template_id: Option<Option<TemplateId>>,
    pub name: Option<String>,
    pub created_agent: Option<AgentRecord>,
    pub edited_content: Option<AgentContent>,
}

#[derive(Debug, Clone, Default)]
pub struct MultiAgentPatch {
    pub selected_templates: Option<Vec<TemplateId>>,
    pub name_overrides: Option<BTreeMap<TemplateId, String>>,
    pub batch: Option<BatchReport>,
    pub created_agents: Option<Vec<CreatedAgentRef>>,
    pub current_agent_index: Option<usize>,
    pub phase: Option<ContentPhase>,
    pub draft: Option<AgentContent>,
    pub edited_content: Option<BTreeMap<i64, AgentContent>>,
}

#[derive(Debug, Clone, Default)]
pub struct WizardPatch {
    pub mode: Option<WizardMode>,
    pub single: Option<SingleAgentPatch>,
    pub multi: Option<MultiAgentPatch>,
}

impl WizardPatch {
    pub fn single(patch: SingleAgentPatch) -> Self {
        Self {
            single: Some(patch),
            ..Self::default()
        }
    }

    pub fn multi(patch: MultiAgentPatch) -> Self {
        Self {
            multi: Some(patch),
            ..Self::default()
        }
    }
}

impl SingleAgentState {
    fn merged(&self, patch: SingleAgentPatch) -> Self {
        Self {
            creation_type: patch.creation_type.or(self.creation_type),
            template_id: patch.template_id.unwrap_or_else(|| self.template_id.clone()),
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            created_agent: patch.created_agent.or_else(|| self.created_agent.clone()),
            edited_content: patch
                .edited_content
                .unwrap_or_else(|| self.edited_content.clone()),
        }
    }
}

impl MultiAgentState {
    fn merged(&self, patch: MultiAgentPatch) -> Self {
        Self {
            selected_templates: patch
                .selected_templates
                .unwrap_or_else(|| self.selected_templates.clone()),
            name_overrides: patch
                .name_overrides
                .unwrap_or_else(|| self.name_overrides.clone()),
            batch: patch.batch.or_else(|| self.batch.clone()),
            created_agents: patch
                .created_agents
                .unwrap_or_else(|| self.created_agents.clone()),
            current_agent_index: patch
                .current_agent_index
                .unwrap_or(self.current_agent_index),
            phase: patch.phase.unwrap_or(self.phase),
            draft: patch.draft.unwrap_or_else(|| self.draft.clone()),
            edited_content: patch
                .edited_content
                .unwrap_or_else(|| self.edited_content.clone()),
        }
    }
}

/// Everything the wizard has accumulated. Transitions build a new value;
/// nothing mutates a state in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub mode: Option<WizardMode>,
    pub current_step: StepId,
    pub single: SingleAgentState,
    pub multi: MultiAgentState,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            mode: None,
            current_step: StepId::SelectMode,
            single: SingleAgentState::default(),
            multi: MultiAgentState::default(),
        }
    }
}

impl WizardState {
    /// Shallow-merges `patch` onto the sub-states and moves to `step`.
    pub fn advanced(&self, step: StepId, patch: WizardPatch) -> Self {
        Self {
            mode: patch.mode.or(self.mode),
            current_step: step,
            single: match patch.single {
                Some(single) => self.single.merged(single),
                None => self.single.clone(),
            },
            multi: match patch.multi {
                Some(multi) => self.multi.merged(multi),
                None => self.multi.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichText;

    #[test]
    fn patch_preserves_unrelated_fields() {
        let start = WizardState::default().advanced(
            StepId::DefineName,
            WizardPatch {
                mode: Some(WizardMode::Single),
                single: Some(SingleAgentPatch {
                    creation_type: Some(CreationType::Template),
                    template_id: Some(Some(TemplateId::parse("bpc").expect("id"))),
                    name: Some("BPC".to_string()),
                    ..SingleAgentPatch::default()
                }),
                multi: None,
            },
        );
        let next = start.advanced(
            StepId::EditRules,
            WizardPatch::single(SingleAgentPatch {
                edited_content: Some(AgentContent::new(
                    RichText::plain("Seja breve."),
                    Vec::new(),
                    Vec::new(),
                )),
                ..SingleAgentPatch::default()
            }),
        );
        assert_eq!(next.mode, Some(WizardMode::Single));
        assert_eq!(next.single.name, "BPC");
        assert_eq!(next.single.creation_type, Some(CreationType::Template));
        assert_eq!(next.single.edited_content.rules.to_plain_text(), "Seja breve.");
        assert_eq!(start.current_step, StepId::DefineName);
    }

    #[test]
    fn template_id_can_be_cleared() {
        let with_template = WizardState::default().advanced(
            StepId::SelectTemplate,
            WizardPatch::single(SingleAgentPatch {
                template_id: Some(Some(TemplateId::parse("fgts").expect("id"))),
                ..SingleAgentPatch::default()
            }),
        );
        let cleared = with_template.advanced(
            StepId::DefineName,
            WizardPatch::single(SingleAgentPatch {
                template_id: Some(None),
                ..SingleAgentPatch::default()
            }),
        );
        assert_eq!(cleared.single.template_id, None);
    }
}
