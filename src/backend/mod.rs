use crate::content::{AgentContent, FaqItem, ScriptStep};
use crate::decision::codec::TokenCodec;
use serde::{Deserialize, Serialize};

pub mod client;

pub use client::CrmApiClient;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("backend responded with error `{0}`")]
    Response(String),
    #[error("backend is not configured: {0}")]
    NotConfigured(String),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An agent as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, rename = "isPrincipal")]
    pub is_principal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAgent {
    pub name: String,
    pub active: bool,
    #[serde(rename = "isPrincipal")]
    pub is_principal: bool,
    #[serde(rename = "triggerEnabled")]
    pub trigger_enabled: bool,
    #[serde(rename = "triggerText")]
    pub trigger_text: String,
}

impl NewAgent {
    pub fn named(name: &str, is_principal: bool) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            is_principal,
            trigger_enabled: false,
            trigger_text: String::new(),
        }
    }
}

/// Creation response. The backend does not always echo the new id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CreatedAgent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AgentUpdate {
    #[serde(rename = "isPrincipal", skip_serializing_if = "Option::is_none")]
    pub is_principal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesPayload {
    #[serde(rename = "agentId")]
    pub agent_id: i64,
    #[serde(rename = "rulesHtml")]
    pub rules_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepPayload {
    pub order: u32,
    pub name: String,
    #[serde(rename = "bodyHtml")]
    pub body_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepsPayload {
    #[serde(rename = "agentId")]
    pub agent_id: i64,
    pub steps: Vec<StepPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqEntryPayload {
    pub order: u32,
    pub question: Option<String>,
    #[serde(rename = "answerHtml")]
    pub answer_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqPayload {
    #[serde(rename = "agentId")]
    pub agent_id: i64,
    pub faq: Vec<FaqEntryPayload>,
}

impl RulesPayload {
    pub fn build(agent_id: i64, content: &AgentContent, codec: &TokenCodec) -> Self {
        Self {
            agent_id,
            rules_html: crate::content::to_html(&content.rules, codec),
        }
    }
}

impl StepsPayload {
    pub fn build(agent_id: i64, steps: &[ScriptStep], codec: &TokenCodec) -> Self {
        Self {
            agent_id,
            steps: steps
                .iter()
                .map(|step| StepPayload {
                    order: step.order,
                    name: step.name.clone(),
                    body_html: crate::content::to_html(&step.body, codec),
                })
                .collect(),
        }
    }
}

impl FaqPayload {
    pub fn build(agent_id: i64, faq: &[FaqItem], codec: &TokenCodec) -> Self {
        Self {
            agent_id,
            faq: faq
                .iter()
                .map(|item| FaqEntryPayload {
                    order: item.order,
                    question: item.question.clone(),
                    answer_html: crate::content::to_html(&item.answer, codec),
                })
                .collect(),
        }
    }
}

/// A selectable row from a reference-data listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReferenceItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Funnel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<ReferenceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
}

pub trait AgentRegistry {
    fn list_agents(&self) -> Result<Vec<AgentRecord>, BackendError>;
    fn create_agent(&self, agent: &NewAgent) -> Result<CreatedAgent, BackendError>;
    fn update_agent(&self, agent_id: i64, update: &AgentUpdate) -> Result<(), BackendError>;
}

pub trait ContentStore {
    fn save_rules(&self, payload: &RulesPayload) -> Result<(), BackendError>;
    fn save_steps(&self, payload: &StepsPayload) -> Result<(), BackendError>;
    fn save_faq(&self, payload: &FaqPayload) -> Result<(), BackendError>;
}

/// Read-only listings the palette and template screens pick from.
pub trait ReferenceData {
    fn tags(&self) -> Result<Vec<ReferenceItem>, BackendError>;
    fn agents(&self) -> Result<Vec<ReferenceItem>, BackendError>;
    fn users(&self) -> Result<Vec<ReferenceItem>, BackendError>;
    fn sources(&self) -> Result<Vec<ReferenceItem>, BackendError>;
    fn funnels(&self) -> Result<Vec<Funnel>, BackendError>;
    fn notification_functions(&self) -> Result<Vec<ReferenceItem>, BackendError>;
    fn products(&self) -> Result<Vec<ReferenceItem>, BackendError>;
}

pub trait MediaStore {
    fn upload(&self, file_name: &str, mime_type: &str, bytes: &[u8])
        -> Result<UploadedMedia, BackendError>;
}

/// Case-insensitive exact match, preferring the numerically largest id
/// when several agents share the name.
pub fn newest_agent_named<'a>(agents: &'a [AgentRecord], name: &str) -> Option<&'a AgentRecord> {
    let wanted = name.trim().to_lowercase();
    agents
        .iter()
        .filter(|agent| agent.name.trim().to_lowercase() == wanted)
        .max_by_key(|agent| agent.id)
}
