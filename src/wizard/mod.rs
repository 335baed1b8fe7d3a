pub mod flow;
pub mod screens;
pub mod state;
pub mod steps;

pub use flow::{Wizard, WizardContext, WizardError};
pub use screens::{screen_for, ChoiceRow, ScreenKind, ScreenView, StatusRow, MODE_OPTIONS};
pub use state::{
    MultiAgentPatch, MultiAgentState, SingleAgentPatch, SingleAgentState, WizardPatch, WizardState,
};
pub use steps::{previous_step, CreationType, StepId, WizardMode, ALL_STEP_IDS};
