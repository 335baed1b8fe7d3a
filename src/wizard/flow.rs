use super::state::{MultiAgentPatch, SingleAgentPatch, WizardPatch, WizardState};
use super::steps::{previous_step, CreationType, StepId, WizardMode};
use crate::backend::{
    AgentRecord, AgentRegistry, AgentUpdate, BackendError, ContentStore, FaqPayload, NewAgent,
    RulesPayload, StepsPayload,
};
use crate::batch::{
    resolve_created_id, AgentBlueprint, BatchCoordinator, BatchOptions, BatchReport,
    BatchRequest, NameSet,
};
use crate::content::{AgentContent, ContentPhase};
use crate::decision::TokenCodec;
use crate::shared::{SessionLog, TemplateId};
use crate::templates::TemplateCatalog;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),
    #[error("{action} failed: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("{0}")]
    IdResolution(String),
    #[error("unknown template `{0}`")]
    UnknownTemplate(String),
    #[error("no agent has been created yet")]
    NoAgent,
    #[error("no agent was created; fix the errors above and try again")]
    NothingCreated,
    #[error("`{action}` is not available on step `{step}`")]
    InvalidStep { step: StepId, action: &'static str },
}

/// Collaborators and settings the flows need. Built once per session.
pub struct WizardContext<'a> {
    pub registry: &'a dyn AgentRegistry,
    pub content: &'a dyn ContentStore,
    pub catalog: &'a TemplateCatalog,
    pub codec: &'a TokenCodec,
    pub log: &'a SessionLog,
    pub principal_name: String,
    pub resolve_delay: Duration,
}

/// Owns the [`WizardState`] and replaces it on every transition.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    state: WizardState,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: WizardState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> StepId {
        self.state.current_step
    }

    fn go_next(&mut self, ctx: &WizardContext<'_>, step: StepId, patch: WizardPatch) {
        let from = self.state.current_step;
        self.state = self.state.advanced(step, patch);
        if from != step {
            ctx.log
                .info("wizard.transition", &format!("{from} -> {step}"));
        }
    }

    /// Stays on the current step while recording `patch`.
    fn stay(&mut self, patch: WizardPatch) {
        self.state = self.state.advanced(self.state.current_step, patch);
    }

    fn expect_step(&self, step: StepId, action: &'static str) -> Result<(), WizardError> {
        if self.state.current_step == step {
            Ok(())
        } else {
            Err(WizardError::InvalidStep {
                step: self.state.current_step,
                action,
            })
        }
    }

    /// Moves to the canonical predecessor. Inside `edit-multi-agent` this
    /// first steps back through the content sub-phases. Returns the step
    /// the wizard ends up on.
    pub fn go_back(&mut self, log: &SessionLog) -> StepId {
        let from = self.state.current_step;
        if from == StepId::EditMultiAgent {
            if let Some(phase) = self.state.multi.phase.previous() {
                self.state = self.state.advanced(
                    from,
                    WizardPatch::multi(MultiAgentPatch {
                        phase: Some(phase),
                        ..MultiAgentPatch::default()
                    }),
                );
                log.info(
                    "wizard.back",
                    &format!("{from} phase -> {}", phase.as_str()),
                );
                return from;
            }
        }
        let Some(previous) =
            previous_step(self.state.mode, from, self.state.single.creation_type)
        else {
            return from;
        };
        self.state = self.state.advanced(previous, WizardPatch::default());
        log.info("wizard.back", &format!("{from} -> {previous}"));
        previous
    }

    pub fn choose_mode(&mut self, ctx: &WizardContext<'_>, mode: WizardMode) -> Result<(), WizardError> {
        self.expect_step(StepId::SelectMode, "choose mode")?;
        let next = match mode {
            WizardMode::Single => StepId::SelectCreationType,
            WizardMode::Multi => StepId::SelectTemplates,
        };
        self.go_next(
            ctx,
            next,
            WizardPatch {
                mode: Some(mode),
                ..WizardPatch::default()
            },
        );
        Ok(())
    }

    pub fn choose_creation_type(
        &mut self,
        ctx: &WizardContext<'_>,
        creation_type: CreationType,
    ) -> Result<(), WizardError> {
        self.expect_step(StepId::SelectCreationType, "choose creation type")?;
        match creation_type {
            CreationType::Template => self.go_next(
                ctx,
                StepId::SelectTemplate,
                WizardPatch::single(SingleAgentPatch {
                    creation_type: Some(creation_type),
                    ..SingleAgentPatch::default()
                }),
            ),
            CreationType::Scratch => self.go_next(
                ctx,
                StepId::DefineName,
                WizardPatch::single(SingleAgentPatch {
                    creation_type: Some(creation_type),
                    template_id: Some(None),
                    edited_content: Some(AgentContent::default()),
                    ..SingleAgentPatch::default()
                }),
            ),
        }
        Ok(())
    }

    pub fn choose_template(
        &mut self,
        ctx: &WizardContext<'_>,
        template_id: &str,
    ) -> Result<(), WizardError> {
        self.expect_step(StepId::SelectTemplate, "choose template")?;
        let template = ctx
            .catalog
            .get(template_id)
            .ok_or_else(|| WizardError::UnknownTemplate(template_id.to_string()))?;
        let name = if self.state.single.name.trim().is_empty() {
            Some(template.name.clone())
        } else {
            None
        };
        self.go_next(
            ctx,
            StepId::DefineName,
            WizardPatch::single(SingleAgentPatch {
                template_id: Some(Some(template.id.clone())),
                name,
                edited_content: Some(template.to_content(ctx.codec)),
                ..SingleAgentPatch::default()
            }),
        );
        Ok(())
    }

    /// Validates the name locally and against the registry, then creates
    /// the agent. Revisiting this step after creation renames the agent
    /// instead of creating a second one.
    pub fn submit_single_name(
        &mut self,
        ctx: &WizardContext<'_>,
        name: &str,
    ) -> Result<(), WizardError> {
        self.expect_step(StepId::DefineName, "submit name")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WizardError::Validation(
                "agent name must not be empty".to_string(),
            ));
        }
        let existing = ctx
            .registry
            .list_agents()
            .map_err(|source| WizardError::Backend {
                action: "listing agents",
                source,
            })?;
        let own_id = self.state.single.created_agent.as_ref().map(|a| a.id);
        let taken: NameSet = existing
            .iter()
            .filter(|agent| Some(agent.id) != own_id)
            .map(|agent| agent.name.as_str())
            .collect();
        if taken.contains(name) {
            return Err(WizardError::Validation(format!(
                "an agent named `{name}` already exists"
            )));
        }

        let record = match &self.state.single.created_agent {
            Some(agent) if agent.name == name => agent.clone(),
            Some(agent) => {
                let update = AgentUpdate {
                    name: Some(name.to_string()),
                    ..AgentUpdate::default()
                };
                ctx.registry
                    .update_agent(agent.id, &update)
                    .map_err(|source| WizardError::Backend {
                        action: "renaming agent",
                        source,
                    })?;
                AgentRecord {
                    name: name.to_string(),
                    ..agent.clone()
                }
            }
            None => {
                let created = ctx
                    .registry
                    .create_agent(&NewAgent::named(name, false))
                    .map_err(|source| WizardError::Backend {
                        action: "creating agent",
                        source,
                    })?;
                let id = resolve_created_id(
                    ctx.registry,
                    &created,
                    name,
                    ctx.resolve_delay,
                    ctx.log,
                )
                .map_err(WizardError::IdResolution)?;
                AgentRecord {
                    id,
                    name: name.to_string(),
                    active: true,
                    is_principal: false,
                }
            }
        };
        self.go_next(
            ctx,
            StepId::EditRules,
            WizardPatch::single(SingleAgentPatch {
                name: Some(name.to_string()),
                created_agent: Some(record),
                ..SingleAgentPatch::default()
            }),
        );
        Ok(())
    }

    pub fn toggle_template(
        &mut self,
        ctx: &WizardContext<'_>,
        template_id: &str,
    ) -> Result<(), WizardError> {
        self.expect_step(StepId::SelectTemplates, "toggle template")?;
        let template = ctx
            .catalog
            .specialists()
            .iter()
            .find(|t| t.id.as_str() == template_id)
            .ok_or_else(|| WizardError::UnknownTemplate(template_id.to_string()))?;
        let mut selected = self.state.multi.selected_templates.clone();
        match selected.iter().position(|id| *id == template.id) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(template.id.clone()),
        }
        self.stay(WizardPatch::multi(MultiAgentPatch {
            selected_templates: Some(selected),
            ..MultiAgentPatch::default()
        }));
        Ok(())
    }

    pub fn confirm_templates(&mut self, ctx: &WizardContext<'_>) -> Result<(), WizardError> {
        self.expect_step(StepId::SelectTemplates, "confirm templates")?;
        if self.state.multi.selected_templates.is_empty() {
            return Err(WizardError::Validation(
                "select at least one specialist template".to_string(),
            ));
        }
        self.go_next(ctx, StepId::ConfigureNames, WizardPatch::default());
        Ok(())
    }

    /// Name the principal (`principal`) or a selected specialist will be
    /// created under.
    pub fn effective_name(&self, ctx: &WizardContext<'_>, template_id: &TemplateId) -> String {
        if let Some(name) = self.state.multi.name_overrides.get(template_id) {
            return name.clone();
        }
        if template_id.is_principal() {
            return ctx.principal_name.clone();
        }
        ctx.catalog
            .get(template_id.as_str())
            .map(|t| t.name.clone())
            .unwrap_or_else(|| template_id.to_string())
    }

    pub fn set_agent_name(
        &mut self,
        template_id: &str,
        name: &str,
    ) -> Result<(), WizardError> {
        self.expect_step(StepId::ConfigureNames, "set agent name")?;
        let key = TemplateId::parse(template_id)
            .map_err(|_| WizardError::UnknownTemplate(template_id.to_string()))?;
        if !key.is_principal() && !self.state.multi.selected_templates.contains(&key) {
            return Err(WizardError::UnknownTemplate(template_id.to_string()));
        }
        let mut overrides = self.state.multi.name_overrides.clone();
        overrides.insert(key, name.trim().to_string());
        self.stay(WizardPatch::multi(MultiAgentPatch {
            name_overrides: Some(overrides),
            ..MultiAgentPatch::default()
        }));
        Ok(())
    }

    fn batch_request(&self, ctx: &WizardContext<'_>) -> BatchRequest {
        BatchRequest {
            principal_name: self.effective_name(ctx, &TemplateId::principal()),
            specialists: self
                .state
                .multi
                .selected_templates
                .iter()
                .map(|id| AgentBlueprint {
                    template_id: id.clone(),
                    desired_name: self.effective_name(ctx, id),
                })
                .collect(),
        }
    }

    /// Names must be non-empty and distinct within the batch. Collisions
    /// with existing agents are resolved later by suffixing.
    pub fn confirm_names(&mut self, ctx: &WizardContext<'_>) -> Result<(), WizardError> {
        self.expect_step(StepId::ConfigureNames, "confirm names")?;
        let request = self.batch_request(ctx);
        let mut seen = NameSet::new();
        let names = std::iter::once(&request.principal_name)
            .chain(request.specialists.iter().map(|b| &b.desired_name));
        for name in names {
            if name.trim().is_empty() {
                return Err(WizardError::Validation(
                    "agent names must not be empty".to_string(),
                ));
            }
            if seen.contains(name) {
                return Err(WizardError::Validation(format!(
                    "`{name}` is used for more than one agent"
                )));
            }
            seen.insert(name);
        }
        self.go_next(ctx, StepId::CreateAgents, WizardPatch::default());
        Ok(())
    }

    /// Runs the batch once. A report with at least one success is kept and
    /// returned as is on later calls.
    pub fn create_agents(&mut self, ctx: &WizardContext<'_>) -> Result<&BatchReport, WizardError> {
        self.expect_step(StepId::CreateAgents, "create agents")?;
        let already_created = self
            .state
            .multi
            .batch
            .as_ref()
            .is_some_and(BatchReport::any_success);
        if !already_created {
            let request = self.batch_request(ctx);
            let report = BatchCoordinator::new(
                ctx.registry,
                ctx.log,
                BatchOptions {
                    resolve_delay: ctx.resolve_delay,
                },
            )
            .run(&request);
            let created_agents = report.created_agents();
            self.stay(WizardPatch::multi(MultiAgentPatch {
                batch: Some(report),
                created_agents: Some(created_agents),
                ..MultiAgentPatch::default()
            }));
        }
        match &self.state.multi.batch {
            Some(report) if report.any_success() => Ok(report),
            _ => Err(WizardError::NothingCreated),
        }
    }

    /// Leaves the status screen for the per-agent edit phase.
    pub fn begin_multi_edit(&mut self, ctx: &WizardContext<'_>) -> Result<(), WizardError> {
        self.expect_step(StepId::CreateAgents, "begin editing")?;
        if self.state.multi.created_agents.is_empty() {
            return Err(WizardError::NothingCreated);
        }
        let draft = self.draft_for(ctx, 0, &self.state.multi.edited_content);
        self.go_next(
            ctx,
            StepId::EditMultiAgent,
            WizardPatch::multi(MultiAgentPatch {
                current_agent_index: Some(0),
                phase: Some(ContentPhase::Rules),
                draft: Some(draft),
                ..MultiAgentPatch::default()
            }),
        );
        Ok(())
    }

    /// Saved content for a revisited agent, else its template's content.
    fn draft_for(
        &self,
        ctx: &WizardContext<'_>,
        index: usize,
        edited: &BTreeMap<i64, AgentContent>,
    ) -> AgentContent {
        let Some(agent) = self.state.multi.created_agents.get(index) else {
            return AgentContent::default();
        };
        if let Some(content) = edited.get(&agent.agent_id) {
            return content.clone();
        }
        ctx.catalog
            .get(agent.template_id.as_str())
            .map(|t| t.to_content(ctx.codec))
            .unwrap_or_default()
    }

    /// Content the current step edits, for seeding an editor.
    pub fn editing_content(&self) -> &AgentContent {
        match self.state.mode {
            Some(WizardMode::Multi) => &self.state.multi.draft,
            _ => &self.state.single.edited_content,
        }
    }

    /// Phase being edited, or `None` when the wizard is not on an edit step.
    pub fn editing_phase(&self) -> Option<ContentPhase> {
        match self.state.current_step {
            StepId::EditRules => Some(ContentPhase::Rules),
            StepId::EditSteps => Some(ContentPhase::Steps),
            StepId::EditFaq => Some(ContentPhase::Faq),
            StepId::EditMultiAgent => Some(self.state.multi.phase),
            _ => None,
        }
    }

    /// Persists the part of `content` the current edit phase covers and
    /// advances. On failure the edits stay in the wizard state and the
    /// step does not change.
    pub fn save_content(
        &mut self,
        ctx: &WizardContext<'_>,
        content: AgentContent,
    ) -> Result<(), WizardError> {
        match self.state.current_step {
            StepId::EditRules | StepId::EditSteps | StepId::EditFaq => {
                self.save_single_phase(ctx, content)
            }
            StepId::EditMultiAgent => self.save_multi_phase(ctx, content),
            step => Err(WizardError::InvalidStep {
                step,
                action: "save content",
            }),
        }
    }

    fn save_single_phase(
        &mut self,
        ctx: &WizardContext<'_>,
        content: AgentContent,
    ) -> Result<(), WizardError> {
        let Some(agent_id) = self.state.single.created_agent.as_ref().map(|a| a.id) else {
            return Err(WizardError::NoAgent);
        };
        let Some(phase) = self.editing_phase() else {
            return Err(WizardError::InvalidStep {
                step: self.state.current_step,
                action: "save content",
            });
        };
        let saved = persist_phase(ctx, phase, agent_id, &content);
        let patch = SingleAgentPatch {
            edited_content: Some(content),
            ..SingleAgentPatch::default()
        };
        if let Err(err) = saved {
            self.stay(WizardPatch::single(patch));
            return Err(err);
        }
        let next = match phase {
            ContentPhase::Rules => StepId::EditSteps,
            ContentPhase::Steps => StepId::EditFaq,
            ContentPhase::Faq => StepId::FinalConfirmation,
        };
        self.go_next(ctx, next, WizardPatch::single(patch));
        Ok(())
    }

    fn save_multi_phase(
        &mut self,
        ctx: &WizardContext<'_>,
        content: AgentContent,
    ) -> Result<(), WizardError> {
        let Some(agent) = self.state.multi.current_agent().cloned() else {
            return Err(WizardError::NoAgent);
        };
        let phase = self.state.multi.phase;
        if let Err(err) = persist_phase(ctx, phase, agent.agent_id, &content) {
            self.stay(WizardPatch::multi(MultiAgentPatch {
                draft: Some(content),
                ..MultiAgentPatch::default()
            }));
            return Err(err);
        }

        if let Some(next_phase) = phase.next() {
            self.stay(WizardPatch::multi(MultiAgentPatch {
                phase: Some(next_phase),
                draft: Some(content),
                ..MultiAgentPatch::default()
            }));
            return Ok(());
        }

        let mut edited = self.state.multi.edited_content.clone();
        edited.insert(agent.agent_id, content);
        let next_index = self.state.multi.current_agent_index + 1;
        if next_index < self.state.multi.created_agents.len() {
            let draft = self.draft_for(ctx, next_index, &edited);
            self.stay(WizardPatch::multi(MultiAgentPatch {
                current_agent_index: Some(next_index),
                phase: Some(ContentPhase::Rules),
                draft: Some(draft),
                edited_content: Some(edited),
                ..MultiAgentPatch::default()
            }));
            ctx.log.info(
                "wizard.transition",
                &format!(
                    "{} agent {} -> {}",
                    StepId::EditMultiAgent,
                    agent.name,
                    self.state
                        .multi
                        .current_agent()
                        .map(|a| a.name.as_str())
                        .unwrap_or_default()
                ),
            );
        } else {
            self.go_next(
                ctx,
                StepId::FinalConfirmation,
                WizardPatch::multi(MultiAgentPatch {
                    edited_content: Some(edited),
                    ..MultiAgentPatch::default()
                }),
            );
        }
        Ok(())
    }
}

fn persist_phase(
    ctx: &WizardContext<'_>,
    phase: ContentPhase,
    agent_id: i64,
    content: &AgentContent,
) -> Result<(), WizardError> {
    let (action, result) = match phase {
        ContentPhase::Rules => (
            "saving rules",
            ctx.content
                .save_rules(&RulesPayload::build(agent_id, content, ctx.codec)),
        ),
        ContentPhase::Steps => (
            "saving script steps",
            ctx.content
                .save_steps(&StepsPayload::build(agent_id, &content.steps, ctx.codec)),
        ),
        ContentPhase::Faq => (
            "saving FAQ",
            ctx.content
                .save_faq(&FaqPayload::build(agent_id, &content.faq, ctx.codec)),
        ),
    };
    match result {
        Ok(()) => {
            ctx.log.info(
                "content.saved",
                &format!("{} for agent {agent_id}", phase.as_str()),
            );
            Ok(())
        }
        Err(source) => {
            ctx.log.error(
                "content.save_failed",
                &format!("{} for agent {agent_id}: {source}", phase.as_str()),
            );
            Err(WizardError::Backend { action, source })
        }
    }
}
