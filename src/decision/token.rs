use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    AddTag,
    TransferAgent,
    TransferUser,
    SetSource,
    AddProduct,
    TransferStage,
    Notify,
    StopAgent,
}

pub const ALL_DECISION_KINDS: [DecisionKind; 8] = [
    DecisionKind::AddTag,
    DecisionKind::TransferAgent,
    DecisionKind::TransferUser,
    DecisionKind::SetSource,
    DecisionKind::AddProduct,
    DecisionKind::TransferStage,
    DecisionKind::Notify,
    DecisionKind::StopAgent,
];

/// Where the palette loads candidates for a kind from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Tags,
    Agents,
    Users,
    Sources,
    Products,
    Funnels,
    NotificationFunctions,
    None,
}

impl DecisionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddTag => "add_tag",
            Self::TransferAgent => "transfer_agent",
            Self::TransferUser => "transfer_user",
            Self::SetSource => "set_source",
            Self::AddProduct => "add_product",
            Self::TransferStage => "transfer_stage",
            Self::Notify => "notify",
            Self::StopAgent => "stop_agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ALL_DECISION_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == raw.trim())
    }

    pub fn action_verb(self) -> &'static str {
        match self {
            Self::AddTag => "Add tag",
            Self::TransferAgent => "Transfer to agent",
            Self::TransferUser => "Assign to user",
            Self::SetSource => "Set source",
            Self::AddProduct => "Add product",
            Self::TransferStage => "Move to stage",
            Self::Notify => "Notify",
            Self::StopAgent => "Stop agent",
        }
    }

    /// Style hook for renderers. Never consulted when decoding.
    pub fn css_class(self) -> String {
        format!("decision-token--{}", self.as_str().replace('_', "-"))
    }

    pub fn requires_target(self) -> bool {
        !matches!(self, Self::StopAgent)
    }

    pub fn candidate_source(self) -> CandidateSource {
        match self {
            Self::AddTag => CandidateSource::Tags,
            Self::TransferAgent => CandidateSource::Agents,
            Self::TransferUser => CandidateSource::Users,
            Self::SetSource => CandidateSource::Sources,
            Self::AddProduct => CandidateSource::Products,
            Self::TransferStage => CandidateSource::Funnels,
            Self::Notify => CandidateSource::NotificationFunctions,
            Self::StopAgent => CandidateSource::None,
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured action reference embedded in script text.
///
/// Tokens are values: editing one means building a new token and replacing
/// the embed that carried the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DecisionToken {
    kind: DecisionKind,
    target_id: Option<i64>,
    label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionTokenError {
    #[error("decision `{0}` requires a target id")]
    MissingTarget(DecisionKind),
    #[error("decision `{0}` does not take a target id")]
    UnexpectedTarget(DecisionKind),
}

impl DecisionToken {
    pub fn new(
        kind: DecisionKind,
        target_id: Option<i64>,
        label: impl Into<String>,
    ) -> Result<Self, DecisionTokenError> {
        match (kind.requires_target(), target_id) {
            (true, None) => return Err(DecisionTokenError::MissingTarget(kind)),
            (false, Some(_)) => return Err(DecisionTokenError::UnexpectedTarget(kind)),
            _ => {}
        }
        Ok(Self {
            kind,
            target_id,
            label: label.into(),
        })
    }

    pub fn stop_agent() -> Self {
        Self {
            kind: DecisionKind::StopAgent,
            target_id: None,
            label: String::new(),
        }
    }

    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    pub fn target_id(&self) -> Option<i64> {
        self.target_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn render_label(&self) -> String {
        if !self.kind.requires_target() {
            return self.kind.action_verb().to_string();
        }
        format!("{}: {}", self.kind.action_verb(), self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_back_from_their_wire_names() {
        for kind in ALL_DECISION_KINDS {
            assert_eq!(DecisionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DecisionKind::parse("delete_lead"), None);
    }

    #[test]
    fn only_stop_agent_is_parameterless() {
        let parameterless = ALL_DECISION_KINDS
            .iter()
            .filter(|kind| !kind.requires_target())
            .collect::<Vec<_>>();
        assert_eq!(parameterless, vec![&DecisionKind::StopAgent]);
    }

    #[test]
    fn constructor_enforces_target_presence() {
        assert_eq!(
            DecisionToken::new(DecisionKind::AddTag, None, "VIP"),
            Err(DecisionTokenError::MissingTarget(DecisionKind::AddTag))
        );
        assert_eq!(
            DecisionToken::new(DecisionKind::StopAgent, Some(3), ""),
            Err(DecisionTokenError::UnexpectedTarget(DecisionKind::StopAgent))
        );
    }

    #[test]
    fn render_label_uses_verb_and_label() {
        let token = DecisionToken::new(DecisionKind::AddTag, Some(4), "VIP").expect("token");
        assert_eq!(token.render_label(), "Add tag: VIP");
        assert_eq!(DecisionToken::stop_agent().render_label(), "Stop agent");
    }
}
