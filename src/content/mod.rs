pub mod html;
pub mod markup;
pub mod ordering;
pub mod rich_text;

pub use html::{from_html, to_html};
pub use ordering::{is_dense, normalize_order, OrderError, Ordered};
pub use rich_text::{EditError, Embed, MediaRef, RichText, Run, TextStyle};

use ordering::{insert_item, move_item, push_item, remove_item, sort_and_normalize};

/// One ordered stage of a conversation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub order: u32,
    pub name: String,
    pub body: RichText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqItem {
    pub order: u32,
    pub question: Option<String>,
    pub answer: RichText,
}

impl Ordered for ScriptStep {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl Ordered for FaqItem {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Which of the three content parts is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ContentPhase {
    #[default]
    Rules,
    Steps,
    Faq,
}

impl ContentPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Steps => "steps",
            Self::Faq => "faq",
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Rules => Some(Self::Steps),
            Self::Steps => Some(Self::Faq),
            Self::Faq => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Rules => None,
            Self::Steps => Some(Self::Rules),
            Self::Faq => Some(Self::Steps),
        }
    }
}

/// Rules, script steps, and FAQ for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentContent {
    pub rules: RichText,
    pub steps: Vec<ScriptStep>,
    pub faq: Vec<FaqItem>,
}

impl AgentContent {
    pub fn new(rules: RichText, mut steps: Vec<ScriptStep>, mut faq: Vec<FaqItem>) -> Self {
        sort_and_normalize(&mut steps);
        sort_and_normalize(&mut faq);
        Self { rules, steps, faq }
    }

    pub fn add_step(&mut self, name: &str, body: RichText) {
        push_item(
            &mut self.steps,
            ScriptStep {
                order: 0,
                name: name.trim().to_string(),
                body,
            },
        );
    }

    pub fn insert_step(&mut self, index: usize, name: &str, body: RichText) -> Result<(), OrderError> {
        insert_item(
            &mut self.steps,
            index,
            ScriptStep {
                order: 0,
                name: name.trim().to_string(),
                body,
            },
        )
    }

    pub fn remove_step(&mut self, index: usize) -> Result<ScriptStep, OrderError> {
        remove_item(&mut self.steps, index)
    }

    pub fn move_step(&mut self, from: usize, to: usize) -> Result<(), OrderError> {
        move_item(&mut self.steps, from, to)
    }

    pub fn add_faq(&mut self, question: Option<&str>, answer: RichText) {
        push_item(
            &mut self.faq,
            FaqItem {
                order: 0,
                question: question
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .map(str::to_string),
                answer,
            },
        );
    }

    pub fn remove_faq(&mut self, index: usize) -> Result<FaqItem, OrderError> {
        remove_item(&mut self.faq, index)
    }

    pub fn move_faq(&mut self, from: usize, to: usize) -> Result<(), OrderError> {
        move_item(&mut self.faq, from, to)
    }
}
