use super::token::{CandidateSource, DecisionKind, DecisionToken, ALL_DECISION_KINDS};
use crate::backend::{BackendError, Funnel, ReferenceData, ReferenceItem};
use crate::content::{EditError, Embed, RichText};

/// How the palette was opened, which decides what a commit does to the
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteOrigin {
    /// Opened by typing the trigger char at `trigger_offset`.
    Trigger { trigger_offset: usize },
    /// Opened by clicking an existing decision located at `offset`.
    Edit { offset: usize },
    /// Plain insertion at `offset`, used when an edit target went missing.
    Insert { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEdit {
    ReplaceTrigger { offset: usize },
    ReplaceEmbed { offset: usize },
    Insert { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteCommit {
    pub token: DecisionToken,
    pub edit: DocumentEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteEvent {
    Pending,
    Committed(PaletteCommit),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteInput {
    Type(char),
    Erase,
    Up,
    Down,
    Enter,
    Escape,
    Back,
    Pick(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectionLevel {
    Items(Vec<ReferenceItem>),
    Funnels(Vec<Funnel>),
    Stages { funnels: Vec<Funnel>, funnel: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Commands,
    Selection {
        kind: DecisionKind,
        level: SelectionLevel,
        load_error: Option<String>,
    },
    Closed,
}

/// One visible palette row after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteRow {
    pub label: String,
    /// Index into the unfiltered list of the current page.
    pub source_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalettePageKind {
    Commands,
    Items(DecisionKind),
    Funnels,
    Stages,
    Closed,
}

/// Two-page command palette: pick a decision kind, then the thing it acts
/// on. Stage transfer adds a funnel level in between.
#[derive(Debug, Clone)]
pub struct CommandPalette {
    origin: PaletteOrigin,
    page: Page,
    query: String,
    highlighted: usize,
}

impl CommandPalette {
    pub fn open(origin: PaletteOrigin) -> Self {
        Self {
            origin,
            page: Page::Commands,
            query: String::new(),
            highlighted: 0,
        }
    }

    pub fn open_at_trigger(trigger_offset: usize) -> Self {
        Self::open(PaletteOrigin::Trigger { trigger_offset })
    }

    /// Reopens for an existing decision, skipping the command page. A
    /// parameterless decision has nothing to select and lands on the
    /// command page instead.
    pub fn open_for_edit(offset: usize, kind: DecisionKind, data: &dyn ReferenceData) -> Self {
        let mut palette = Self::open(PaletteOrigin::Edit { offset });
        if kind.requires_target() {
            palette.enter_selection(kind, data);
        }
        palette
    }

    pub fn origin(&self) -> PaletteOrigin {
        self.origin
    }

    pub fn is_open(&self) -> bool {
        self.page != Page::Closed
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.page {
            Page::Selection { load_error, .. } => load_error.as_deref(),
            _ => None,
        }
    }

    pub fn page_kind(&self) -> PalettePageKind {
        match &self.page {
            Page::Commands => PalettePageKind::Commands,
            Page::Selection { kind, level, .. } => match level {
                SelectionLevel::Items(_) => PalettePageKind::Items(*kind),
                SelectionLevel::Funnels(_) => PalettePageKind::Funnels,
                SelectionLevel::Stages { .. } => PalettePageKind::Stages,
            },
            Page::Closed => PalettePageKind::Closed,
        }
    }

    pub fn title(&self) -> String {
        match &self.page {
            Page::Commands => "Decisions".to_string(),
            Page::Selection { kind, level, .. } => match level {
                SelectionLevel::Stages { funnels, funnel } => format!(
                    "{} > {}",
                    kind.action_verb(),
                    funnels.get(*funnel).map(|f| f.name.as_str()).unwrap_or_default()
                ),
                _ => kind.action_verb().to_string(),
            },
            Page::Closed => String::new(),
        }
    }

    pub fn rows(&self) -> Vec<PaletteRow> {
        let labels: Vec<&str> = match &self.page {
            Page::Commands => ALL_DECISION_KINDS
                .iter()
                .map(|kind| kind.action_verb())
                .collect(),
            Page::Selection { level, .. } => match level {
                SelectionLevel::Items(items) => items.iter().map(|i| i.name.as_str()).collect(),
                SelectionLevel::Funnels(funnels) => {
                    funnels.iter().map(|f| f.name.as_str()).collect()
                }
                SelectionLevel::Stages { funnels, funnel } => funnels
                    .get(*funnel)
                    .map(|f| f.stages.iter().map(|s| s.name.as_str()).collect())
                    .unwrap_or_default(),
            },
            Page::Closed => Vec::new(),
        };
        let needle = self.query.trim().to_lowercase();
        labels
            .into_iter()
            .enumerate()
            .filter(|(_, label)| needle.is_empty() || label.to_lowercase().contains(&needle))
            .map(|(source_index, label)| PaletteRow {
                label: label.to_string(),
                source_index,
            })
            .collect()
    }

    pub fn handle(&mut self, input: PaletteInput, data: &dyn ReferenceData) -> PaletteEvent {
        if self.page == Page::Closed {
            return PaletteEvent::Closed;
        }
        match input {
            PaletteInput::Type(ch) => {
                self.query.push(ch);
                self.highlighted = 0;
                PaletteEvent::Pending
            }
            PaletteInput::Erase => {
                self.query.pop();
                self.highlighted = 0;
                PaletteEvent::Pending
            }
            PaletteInput::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
                PaletteEvent::Pending
            }
            PaletteInput::Down => {
                let max_index = self.rows().len().saturating_sub(1);
                self.highlighted = std::cmp::min(self.highlighted + 1, max_index);
                PaletteEvent::Pending
            }
            PaletteInput::Pick(row) => {
                self.highlighted = row;
                self.activate(data)
            }
            PaletteInput::Enter => self.activate(data),
            PaletteInput::Escape | PaletteInput::Back => self.step_back(),
        }
    }

    fn activate(&mut self, data: &dyn ReferenceData) -> PaletteEvent {
        let Some(row) = self.rows().get(self.highlighted).cloned() else {
            return PaletteEvent::Pending;
        };
        let page = std::mem::replace(&mut self.page, Page::Closed);
        match page {
            Page::Commands => {
                let kind = ALL_DECISION_KINDS[row.source_index];
                if !kind.requires_target() {
                    return self.commit(DecisionToken::stop_agent());
                }
                self.page = Page::Commands;
                self.enter_selection(kind, data);
                PaletteEvent::Pending
            }
            Page::Selection {
                kind,
                level,
                load_error,
            } => match level {
                SelectionLevel::Items(items) => {
                    let item = &items[row.source_index];
                    match DecisionToken::new(kind, Some(item.id), item.name.clone()) {
                        Ok(token) => self.commit(token),
                        Err(_) => {
                            self.page = Page::Selection {
                                kind,
                                level: SelectionLevel::Items(items),
                                load_error,
                            };
                            PaletteEvent::Pending
                        }
                    }
                }
                SelectionLevel::Funnels(funnels) => {
                    self.page = Page::Selection {
                        kind,
                        level: SelectionLevel::Stages {
                            funnels,
                            funnel: row.source_index,
                        },
                        load_error: None,
                    };
                    self.reset_search();
                    PaletteEvent::Pending
                }
                SelectionLevel::Stages { funnels, funnel } => {
                    let stage = funnels
                        .get(funnel)
                        .and_then(|f| f.stages.get(row.source_index))
                        .cloned();
                    match stage.and_then(|s| DecisionToken::new(kind, Some(s.id), s.name).ok()) {
                        Some(token) => self.commit(token),
                        None => {
                            self.page = Page::Selection {
                                kind,
                                level: SelectionLevel::Stages { funnels, funnel },
                                load_error,
                            };
                            PaletteEvent::Pending
                        }
                    }
                }
            },
            Page::Closed => PaletteEvent::Closed,
        }
    }

    fn step_back(&mut self) -> PaletteEvent {
        let page = std::mem::replace(&mut self.page, Page::Closed);
        match page {
            Page::Commands | Page::Closed => PaletteEvent::Closed,
            Page::Selection {
                kind,
                level: SelectionLevel::Stages { funnels, .. },
                ..
            } => {
                self.page = Page::Selection {
                    kind,
                    level: SelectionLevel::Funnels(funnels),
                    load_error: None,
                };
                self.reset_search();
                PaletteEvent::Pending
            }
            Page::Selection { .. } => {
                self.page = Page::Commands;
                self.reset_search();
                PaletteEvent::Pending
            }
        }
    }

    /// Every entry into the selection page fetches exactly once.
    fn enter_selection(&mut self, kind: DecisionKind, data: &dyn ReferenceData) {
        let (level, load_error) = match fetch_level(kind, data) {
            Ok(level) => (level, None),
            Err(err) => (empty_level(kind), Some(err.to_string())),
        };
        self.page = Page::Selection {
            kind,
            level,
            load_error,
        };
        self.reset_search();
    }

    fn reset_search(&mut self) {
        self.query.clear();
        self.highlighted = 0;
    }

    fn commit(&mut self, token: DecisionToken) -> PaletteEvent {
        self.page = Page::Closed;
        let edit = match self.origin {
            PaletteOrigin::Trigger { trigger_offset } => DocumentEdit::ReplaceTrigger {
                offset: trigger_offset,
            },
            PaletteOrigin::Edit { offset } => DocumentEdit::ReplaceEmbed { offset },
            PaletteOrigin::Insert { offset } => DocumentEdit::Insert { offset },
        };
        PaletteEvent::Committed(PaletteCommit { token, edit })
    }
}

fn empty_level(kind: DecisionKind) -> SelectionLevel {
    if kind.candidate_source() == CandidateSource::Funnels {
        SelectionLevel::Funnels(Vec::new())
    } else {
        SelectionLevel::Items(Vec::new())
    }
}

fn fetch_level(kind: DecisionKind, data: &dyn ReferenceData) -> Result<SelectionLevel, BackendError> {
    let items = match kind.candidate_source() {
        CandidateSource::Funnels => return data.funnels().map(SelectionLevel::Funnels),
        CandidateSource::Tags => data.tags()?,
        CandidateSource::Agents => data.agents()?,
        CandidateSource::Users => data.users()?,
        CandidateSource::Sources => data.sources()?,
        CandidateSource::Products => data.products()?,
        CandidateSource::NotificationFunctions => data.notification_functions()?,
        CandidateSource::None => Vec::new(),
    };
    Ok(SelectionLevel::Items(items))
}

/// Splices a committed decision into the document and returns the cursor
/// offset just after it.
pub fn apply_commit(
    document: &mut RichText,
    commit: &PaletteCommit,
    trigger: char,
) -> Result<usize, EditError> {
    let embed = Embed::Decision(commit.token.clone());
    match commit.edit {
        DocumentEdit::ReplaceTrigger { offset } => {
            if document.char_before(offset + 1) != Some(trigger) {
                return Err(EditError::MissingTrigger {
                    expected: trigger,
                    offset,
                });
            }
            document.delete(offset, 1)?;
            document.insert_embed(offset, embed)?;
            Ok(offset + 1)
        }
        DocumentEdit::ReplaceEmbed { offset } => {
            document.replace_embed(offset, embed)?;
            Ok(offset + 1)
        }
        DocumentEdit::Insert { offset } => {
            document.insert_embed(offset, embed)?;
            Ok(offset + 1)
        }
    }
}
