pub mod naming;

pub use naming::{resolve_unique_name, NameSet};

use crate::backend::{newest_agent_named, AgentRegistry, AgentUpdate, CreatedAgent, NewAgent};
use crate::shared::{SessionLog, TemplateId};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Pending,
    Creating,
    Success,
    Error,
}

impl CreationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// Progress of one agent through a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCreationStatus {
    pub template_id: TemplateId,
    pub desired_name: String,
    pub resolved_name: Option<String>,
    pub state: CreationState,
    pub agent_id: Option<i64>,
    pub error: Option<String>,
}

impl AgentCreationStatus {
    pub fn pending(template_id: TemplateId, desired_name: &str) -> Self {
        Self {
            template_id,
            desired_name: desired_name.trim().to_string(),
            resolved_name: None,
            state: CreationState::Pending,
            agent_id: None,
            error: None,
        }
    }

    pub fn is_principal(&self) -> bool {
        self.template_id.is_principal()
    }

    /// Name the agent was (or would have been) created under.
    pub fn display_name(&self) -> &str {
        self.resolved_name.as_deref().unwrap_or(&self.desired_name)
    }

    fn succeed(&mut self, agent_id: i64) {
        self.state = CreationState::Success;
        self.agent_id = Some(agent_id);
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.state = CreationState::Error;
        self.error = Some(message);
    }
}

/// One specialist to create: which template it came from and the name the
/// operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBlueprint {
    pub template_id: TemplateId,
    pub desired_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub principal_name: String,
    pub specialists: Vec<AgentBlueprint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Wait before re-listing agents when a create response has no id.
    pub resolve_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            resolve_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub principal: AgentCreationStatus,
    pub specialists: Vec<AgentCreationStatus>,
}

/// A successfully created agent, in the order the edit phase visits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAgentRef {
    pub template_id: TemplateId,
    pub agent_id: i64,
    pub name: String,
}

impl BatchReport {
    pub fn statuses(&self) -> impl Iterator<Item = &AgentCreationStatus> {
        std::iter::once(&self.principal).chain(self.specialists.iter())
    }

    pub fn success_count(&self) -> usize {
        self.statuses()
            .filter(|s| s.state == CreationState::Success)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.statuses()
            .filter(|s| s.state == CreationState::Error)
            .count()
    }

    pub fn any_success(&self) -> bool {
        self.success_count() > 0
    }

    /// Principal first, then specialists in creation order.
    pub fn created_agents(&self) -> Vec<CreatedAgentRef> {
        self.statuses()
            .filter(|s| s.state == CreationState::Success)
            .filter_map(|s| {
                Some(CreatedAgentRef {
                    template_id: s.template_id.clone(),
                    agent_id: s.agent_id?,
                    name: s.display_name().to_string(),
                })
            })
            .collect()
    }
}

/// Returns the id from a create response, or falls back to re-listing
/// agents once after `delay` and taking the newest exact name match.
pub fn resolve_created_id(
    registry: &dyn AgentRegistry,
    created: &CreatedAgent,
    name: &str,
    delay: Duration,
    log: &SessionLog,
) -> Result<i64, String> {
    if let Some(id) = created.id {
        return Ok(id);
    }
    log.warn(
        "batch.id_fallback",
        &format!("create response for `{name}` carried no id; re-listing agents"),
    );
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
    let agents = registry
        .list_agents()
        .map_err(|err| format!("could not resolve id for `{name}`: {err}"))?;
    newest_agent_named(&agents, name)
        .map(|agent| agent.id)
        .ok_or_else(|| format!("agent `{name}` was created but its id could not be resolved"))
}

/// Creates a principal plus specialists one at a time, keeping names unique
/// across the existing registry and everything created earlier in the run.
pub struct BatchCoordinator<'a> {
    registry: &'a dyn AgentRegistry,
    log: &'a SessionLog,
    options: BatchOptions,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(registry: &'a dyn AgentRegistry, log: &'a SessionLog, options: BatchOptions) -> Self {
        Self {
            registry,
            log,
            options,
        }
    }

    pub fn run(&self, request: &BatchRequest) -> BatchReport {
        let mut report = BatchReport {
            principal: AgentCreationStatus::pending(
                TemplateId::principal(),
                &request.principal_name,
            ),
            specialists: request
                .specialists
                .iter()
                .map(|b| AgentCreationStatus::pending(b.template_id.clone(), &b.desired_name))
                .collect(),
        };
        let existing = match self.registry.list_agents() {
            Ok(agents) => agents,
            Err(err) => {
                let message = format!("could not list existing agents: {err}");
                self.log.error("batch.item_failed", &message);
                report.principal.fail(message.clone());
                for status in &mut report.specialists {
                    status.fail(message.clone());
                }
                return report;
            }
        };
        let mut taken: NameSet = existing.iter().map(|a| a.name.as_str()).collect();
        self.log.info(
            "batch.start",
            &format!(
                "creating principal `{}` and {} specialist(s) against {} existing agent(s)",
                report.principal.desired_name,
                report.specialists.len(),
                existing.len()
            ),
        );

        let mut demoted = true;
        for previous in existing.iter().filter(|a| a.is_principal) {
            let update = AgentUpdate {
                is_principal: Some(false),
                ..AgentUpdate::default()
            };
            match self.registry.update_agent(previous.id, &update) {
                Ok(()) => self.log.info(
                    "batch.demote_principal",
                    &format!("demoted `{}` (id {})", previous.name, previous.id),
                ),
                Err(err) => {
                    let message =
                        format!("could not demote current principal `{}`: {err}", previous.name);
                    self.log.error("batch.item_failed", &message);
                    report.principal.fail(message);
                    demoted = false;
                    break;
                }
            }
        }
        if demoted {
            self.create_one(&mut report.principal, &mut taken);
        }
        for status in &mut report.specialists {
            self.create_one(status, &mut taken);
        }

        self.resolve_final_ids(&mut report);
        report
    }

    fn create_one(&self, status: &mut AgentCreationStatus, taken: &mut NameSet) {
        status.state = CreationState::Creating;
        let name = resolve_unique_name(&status.desired_name, taken);
        status.resolved_name = Some(name.clone());

        let created = match self
            .registry
            .create_agent(&NewAgent::named(&name, status.is_principal()))
        {
            Ok(created) => created,
            Err(err) => {
                let message = format!("could not create `{name}`: {err}");
                self.log.error("batch.item_failed", &message);
                status.fail(message);
                return;
            }
        };
        // The POST went through, so the name is in use from here on even if
        // the id cannot be resolved.
        taken.insert(&name);

        match resolve_created_id(
            self.registry,
            &created,
            &name,
            self.options.resolve_delay,
            self.log,
        ) {
            Ok(id) => {
                self.log.info(
                    "batch.item_created",
                    &format!("created `{name}` (id {id}) from template `{}`", status.template_id),
                );
                status.succeed(id);
            }
            Err(message) => {
                self.log.error("batch.item_failed", &message);
                status.fail(message);
            }
        }
    }

    /// Per-item ids may be stale by the end of the run; the final listing
    /// is authoritative. When it fails the per-item ids are kept.
    fn resolve_final_ids(&self, report: &mut BatchReport) {
        if !report.any_success() {
            return;
        }
        let agents = match self.registry.list_agents() {
            Ok(agents) => agents,
            Err(err) => {
                self.log.warn(
                    "batch.final_resolution",
                    &format!("final agent listing failed, keeping per-item ids: {err}"),
                );
                return;
            }
        };
        let mut resolved = 0usize;
        let statuses =
            std::iter::once(&mut report.principal).chain(report.specialists.iter_mut());
        for status in statuses.filter(|s| s.state == CreationState::Success) {
            if let Some(agent) = newest_agent_named(&agents, status.display_name()) {
                status.agent_id = Some(agent.id);
                resolved += 1;
            }
        }
        self.log.info(
            "batch.final_resolution",
            &format!("resolved {resolved} agent id(s) from the final listing"),
        );
    }
}
