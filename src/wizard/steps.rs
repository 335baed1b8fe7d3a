use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    SelectMode,
    SelectCreationType,
    SelectTemplate,
    DefineName,
    EditRules,
    EditSteps,
    EditFaq,
    SelectTemplates,
    ConfigureNames,
    CreateAgents,
    EditMultiAgent,
    FinalConfirmation,
}

pub const ALL_STEP_IDS: [StepId; 12] = [
    StepId::SelectMode,
    StepId::SelectCreationType,
    StepId::SelectTemplate,
    StepId::DefineName,
    StepId::EditRules,
    StepId::EditSteps,
    StepId::EditFaq,
    StepId::SelectTemplates,
    StepId::ConfigureNames,
    StepId::CreateAgents,
    StepId::EditMultiAgent,
    StepId::FinalConfirmation,
];

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::SelectMode => "select-mode",
            StepId::SelectCreationType => "select-creation-type",
            StepId::SelectTemplate => "select-template",
            StepId::DefineName => "define-name",
            StepId::EditRules => "edit-rules",
            StepId::EditSteps => "edit-steps",
            StepId::EditFaq => "edit-faq",
            StepId::SelectTemplates => "select-templates",
            StepId::ConfigureNames => "configure-names",
            StepId::CreateAgents => "create-agents",
            StepId::EditMultiAgent => "edit-multi-agent",
            StepId::FinalConfirmation => "final-confirmation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ALL_STEP_IDS
            .into_iter()
            .find(|step| step.as_str() == raw.trim())
    }

    /// Which spine the step belongs to. `None` for the shared steps.
    pub fn branch(self) -> Option<WizardMode> {
        match self {
            StepId::SelectMode | StepId::FinalConfirmation => None,
            StepId::SelectCreationType
            | StepId::SelectTemplate
            | StepId::DefineName
            | StepId::EditRules
            | StepId::EditSteps
            | StepId::EditFaq => Some(WizardMode::Single),
            StepId::SelectTemplates
            | StepId::ConfigureNames
            | StepId::CreateAgents
            | StepId::EditMultiAgent => Some(WizardMode::Multi),
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Single,
    Multi,
}

impl WizardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardMode::Single => "single",
            WizardMode::Multi => "multi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationType {
    Scratch,
    Template,
}

impl CreationType {
    pub fn as_str(self) -> &'static str {
        match self {
            CreationType::Scratch => "scratch",
            CreationType::Template => "template",
        }
    }
}

/// Canonical predecessor of `step`, independent of how the wizard actually
/// got there. `None` only for `select-mode`.
///
/// A step reached under the wrong mode (or with no mode chosen) has no
/// meaningful predecessor on its own spine and falls back to `select-mode`.
pub fn previous_step(
    mode: Option<WizardMode>,
    step: StepId,
    creation_type: Option<CreationType>,
) -> Option<StepId> {
    use StepId::*;
    use WizardMode::*;

    let previous = match (mode, step) {
        (_, SelectMode) => return None,

        (Some(Single), SelectCreationType) => SelectMode,
        (Some(Single), SelectTemplate) => SelectCreationType,
        (Some(Single), DefineName) => match creation_type {
            Some(CreationType::Template) => SelectTemplate,
            Some(CreationType::Scratch) | None => SelectCreationType,
        },
        (Some(Single), EditRules) => DefineName,
        (Some(Single), EditSteps) => EditRules,
        (Some(Single), EditFaq) => EditSteps,
        (Some(Single), FinalConfirmation) => EditFaq,

        (Some(Multi), SelectTemplates) => SelectMode,
        (Some(Multi), ConfigureNames) => SelectTemplates,
        (Some(Multi), CreateAgents) => ConfigureNames,
        (Some(Multi), EditMultiAgent) => CreateAgents,
        (Some(Multi), FinalConfirmation) => EditMultiAgent,

        (Some(Single), SelectTemplates | ConfigureNames | CreateAgents | EditMultiAgent)
        | (
            Some(Multi),
            SelectCreationType | SelectTemplate | DefineName | EditRules | EditSteps | EditFaq,
        )
        | (None, _) => SelectMode,
    };
    Some(previous)
}
