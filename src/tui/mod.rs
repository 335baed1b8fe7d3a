pub mod editor;
pub mod keys;
pub mod render;

pub use editor::{embed_display, EditorOptions, EditorOutcome, PhaseEditor};
pub use keys::{
    editor_action_from_key, palette_input_from_key, wizard_action_from_key, EditorAction,
    WizardAction,
};

use crate::backend::{BackendError, MediaStore, ReferenceData};
use crate::content::{ContentPhase, MediaRef};
use crate::wizard::{
    screen_for, ChoiceRow, CreationType, ScreenKind, ScreenView, StepId, Wizard, WizardContext,
    MODE_OPTIONS,
};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use render::{draw_editor, draw_list_screen, prompt_line_tui, WizardTerminal};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::Duration;

const LIST_HINT: &str = "Up/Down move | Enter select | Esc back | q quit";
const MULTI_HINT: &str = "Up/Down move | Space toggle | Enter continue | Esc back | q quit";
const NAMES_HINT: &str = "Up/Down move | Enter rename / continue | Esc back | q quit";
const EDITOR_HINT: &str =
    "Ctrl-S save+next | / decisions | Ctrl-E edit decision | Ctrl-N add | Ctrl-D remove | Ctrl-R rename | Ctrl-O media | Tab next item | Esc back";
const CONTINUE_ROW: &str = "Continue";

/// Collaborators the interactive wizard drives.
pub struct TuiDeps<'a> {
    pub ctx: WizardContext<'a>,
    pub reference: &'a dyn ReferenceData,
    pub media: &'a dyn MediaStore,
    pub editor: EditorOptions,
}

pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

pub fn run_wizard_tui(deps: &TuiDeps<'_>) -> Result<String, String> {
    if !is_interactive() {
        return Err("the wizard needs an interactive terminal".to_string());
    }
    let mut stdout = io::stdout();
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    execute!(stdout, EnterAlternateScreen, Hide)
        .map_err(|e| format!("failed to enter wizard screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create wizard terminal: {e}"))?;
    let result = WizardSession::new().run(deps, &mut terminal);
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), Show, LeaveAlternateScreen)
        .map_err(|e| format!("failed to leave wizard screen: {e}"))?;
    result
}

/// Identifies which editor is open, so a fresh one is built whenever the
/// wizard moves to another phase or agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EditorKey {
    step: StepId,
    agent: usize,
    phase: ContentPhase,
}

struct WizardSession {
    wizard: Wizard,
    selected: usize,
    status: String,
    editor: Option<(EditorKey, PhaseEditor)>,
}

enum Flow {
    Continue,
    Exit(String),
}

impl WizardSession {
    fn new() -> Self {
        Self {
            wizard: Wizard::new(),
            selected: 0,
            status: "ready".to_string(),
            editor: None,
        }
    }

    fn run(&mut self, deps: &TuiDeps<'_>, terminal: &mut WizardTerminal) -> Result<String, String> {
        loop {
            let view = screen_for(
                self.wizard.state(),
                deps.ctx.catalog,
                &deps.ctx.principal_name,
            );
            let flow = match &view.kind {
                ScreenKind::ContentEditor { agent_name, phase } => {
                    self.editor_tick(deps, terminal, &view, agent_name, *phase)?
                }
                ScreenKind::NameEntry { current } => self.name_entry(deps, terminal, current)?,
                _ => self.list_tick(deps, terminal, &view)?,
            };
            if let Flow::Exit(message) = flow {
                return Ok(message);
            }
        }
    }

    fn set_result<E: std::fmt::Display>(&mut self, result: Result<(), E>, ok: &str) {
        match result {
            Ok(()) => {
                self.selected = 0;
                self.status = ok.to_string();
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn back(&mut self, deps: &TuiDeps<'_>) {
        self.wizard.go_back(deps.ctx.log);
        self.selected = 0;
        self.status = format!("back to {}", self.wizard.step());
    }

    fn name_entry(
        &mut self,
        deps: &TuiDeps<'_>,
        terminal: &mut WizardTerminal,
        current: &str,
    ) -> Result<Flow, String> {
        let prompt = format!("Name for the new agent ({})", self.status);
        match prompt_line_tui(terminal, "Agent name", &prompt, current)? {
            Some(name) => {
                let result = self.wizard.submit_single_name(&deps.ctx, &name);
                self.set_result(result, "agent created");
            }
            None => self.back(deps),
        }
        Ok(Flow::Continue)
    }

    fn list_rows(view: &ScreenView) -> (Vec<ChoiceRow>, Vec<String>, &'static str) {
        match &view.kind {
            ScreenKind::Choice { rows } => {
                let labels = rows
                    .iter()
                    .map(|row| match row.checked {
                        Some(true) => format!("[x] {}", row.label),
                        Some(false) => format!("[ ] {}", row.label),
                        None => row.label.clone(),
                    })
                    .collect();
                let hint = if view.step == StepId::SelectTemplates {
                    MULTI_HINT
                } else {
                    LIST_HINT
                };
                (rows.clone(), labels, hint)
            }
            ScreenKind::NameTable { rows } => {
                let mut labels: Vec<String> = rows
                    .iter()
                    .map(|row| format!("{:<12} {}", row.key, row.label))
                    .collect();
                labels.push(CONTINUE_ROW.to_string());
                (rows.clone(), labels, NAMES_HINT)
            }
            ScreenKind::BatchStatus { rows, can_continue } => {
                let mut labels: Vec<String> = rows
                    .iter()
                    .map(|row| format!("{:<24} {:<9} {}", row.name, row.state, row.detail))
                    .collect();
                labels.push(match (rows.is_empty(), can_continue) {
                    (true, _) => "Create agents now".to_string(),
                    (false, true) => "Continue to content editing".to_string(),
                    (false, false) => "Retry".to_string(),
                });
                (Vec::new(), labels, LIST_HINT)
            }
            ScreenKind::Summary { lines } => {
                let mut labels = lines.clone();
                labels.push("Close".to_string());
                (Vec::new(), labels, "Enter close")
            }
            ScreenKind::NotImplemented { step } => (
                Vec::new(),
                vec![format!("Step `{step}` is not implemented.")],
                "Esc back",
            ),
            ScreenKind::NameEntry { .. } | ScreenKind::ContentEditor { .. } => {
                (Vec::new(), Vec::new(), LIST_HINT)
            }
        }
    }

    fn list_tick(
        &mut self,
        deps: &TuiDeps<'_>,
        terminal: &mut WizardTerminal,
        view: &ScreenView,
    ) -> Result<Flow, String> {
        let (rows, labels, hint) = Self::list_rows(view);
        self.selected = self.selected.min(labels.len().saturating_sub(1));
        draw_list_screen(terminal, &view.title, &labels, self.selected, &self.status, hint)?;
        if !event::poll(Duration::from_millis(250))
            .map_err(|e| format!("failed to poll wizard input: {e}"))?
        {
            return Ok(Flow::Continue);
        }
        let ev = event::read().map_err(|e| format!("failed to read wizard input: {e}"))?;
        let Event::Key(key) = ev else {
            return Ok(Flow::Continue);
        };
        let Some(action) = wizard_action_from_key(key) else {
            return Ok(Flow::Continue);
        };
        match action {
            WizardAction::MovePrev => self.selected = self.selected.saturating_sub(1),
            WizardAction::MoveNext => {
                self.selected = (self.selected + 1).min(labels.len().saturating_sub(1))
            }
            WizardAction::Back => self.back(deps),
            WizardAction::Cancel => return Ok(Flow::Exit("wizard canceled".to_string())),
            WizardAction::Toggle if view.step == StepId::SelectTemplates => {
                if let Some(row) = rows.get(self.selected) {
                    let result = self.wizard.toggle_template(&deps.ctx, &row.key);
                    if let Err(err) = result {
                        self.status = err.to_string();
                    }
                }
            }
            WizardAction::Toggle => {}
            WizardAction::Enter | WizardAction::Edit => {
                return self.activate(deps, terminal, view, &rows);
            }
        }
        Ok(Flow::Continue)
    }

    fn activate(
        &mut self,
        deps: &TuiDeps<'_>,
        terminal: &mut WizardTerminal,
        view: &ScreenView,
        rows: &[ChoiceRow],
    ) -> Result<Flow, String> {
        let ctx = &deps.ctx;
        let row = rows.get(self.selected);
        match (&view.kind, view.step) {
            (ScreenKind::Choice { .. }, StepId::SelectMode) => {
                if let Some((mode, _)) = MODE_OPTIONS.get(self.selected) {
                    let result = self.wizard.choose_mode(ctx, *mode);
                    self.set_result(result, mode.as_str());
                }
            }
            (ScreenKind::Choice { .. }, StepId::SelectCreationType) => {
                let creation = match row.map(|r| r.key.as_str()) {
                    Some("template") => CreationType::Template,
                    _ => CreationType::Scratch,
                };
                let result = self.wizard.choose_creation_type(ctx, creation);
                self.set_result(result, creation.as_str());
            }
            (ScreenKind::Choice { .. }, StepId::SelectTemplate) => {
                if let Some(row) = row {
                    let result = self.wizard.choose_template(ctx, &row.key);
                    self.set_result(result, &row.label);
                }
            }
            (ScreenKind::Choice { .. }, StepId::SelectTemplates) => {
                let result = self.wizard.confirm_templates(ctx);
                self.set_result(result, "templates selected");
            }
            (ScreenKind::NameTable { .. }, _) => match row {
                Some(row) => {
                    let prompt = format!("Name for `{}`", row.key);
                    if let Some(name) = prompt_line_tui(terminal, "Agent name", &prompt, &row.label)?
                    {
                        let result = self.wizard.set_agent_name(&row.key, &name);
                        if let Err(err) = result {
                            self.status = err.to_string();
                        }
                    }
                }
                None => {
                    let result = self.wizard.confirm_names(ctx);
                    self.set_result(result, "names confirmed");
                }
            },
            (ScreenKind::BatchStatus { can_continue, .. }, _) => {
                if *can_continue {
                    let result = self.wizard.begin_multi_edit(ctx);
                    self.set_result(result, "editing content");
                } else {
                    self.status = "creating agents...".to_string();
                    let report = self
                        .wizard
                        .create_agents(ctx)
                        .map(|report| {
                            format!(
                                "{} created, {} failed",
                                report.success_count(),
                                report.error_count()
                            )
                        })
                        .map_err(|err| err.to_string());
                    self.status = match report {
                        Ok(summary) | Err(summary) => summary,
                    };
                }
            }
            (ScreenKind::Summary { lines }, _) => return Ok(Flow::Exit(lines.join("\n"))),
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn editor_tick(
        &mut self,
        deps: &TuiDeps<'_>,
        terminal: &mut WizardTerminal,
        view: &ScreenView,
        agent_name: &str,
        phase: ContentPhase,
    ) -> Result<Flow, String> {
        let key = EditorKey {
            step: view.step,
            agent: self.wizard.state().multi.current_agent_index,
            phase,
        };
        if self.editor.as_ref().map(|(k, _)| *k) != Some(key) {
            let content = self.wizard.editing_content().clone();
            self.editor = Some((key, PhaseEditor::new(phase, content, deps.editor)));
        }
        let Some((_, editor)) = self.editor.as_mut() else {
            return Ok(Flow::Continue);
        };
        let title = format!("{} - {agent_name}", view.title);
        let frame = draw_editor(terminal, &title, editor, EDITOR_HINT)?;
        editor.set_frame(frame);

        if !event::poll(Duration::from_millis(250))
            .map_err(|e| format!("failed to poll editor input: {e}"))?
        {
            return Ok(Flow::Continue);
        }
        let ev = event::read().map_err(|e| format!("failed to read editor input: {e}"))?;
        let Event::Key(key_event) = ev else {
            return Ok(Flow::Continue);
        };

        let outcome = if editor.palette().is_some() {
            match palette_input_from_key(key_event) {
                Some(input) => editor.handle_palette(input, deps.reference, deps.ctx.log),
                None => EditorOutcome::Continue,
            }
        } else {
            match editor_action_from_key(key_event) {
                Some(action) => editor.handle(action, deps.reference, deps.ctx.codec, deps.ctx.log),
                None => EditorOutcome::Continue,
            }
        };

        match outcome {
            EditorOutcome::Continue => {}
            EditorOutcome::Save(content) => {
                if let Err(err) = self.wizard.save_content(&deps.ctx, content) {
                    editor.set_status(err.to_string());
                } else {
                    self.status = format!("{} saved", phase.as_str());
                }
            }
            EditorOutcome::Back => {
                self.editor = None;
                self.back(deps);
            }
            EditorOutcome::Cancel => return Ok(Flow::Exit("wizard canceled".to_string())),
            EditorOutcome::RequestRename { current } => {
                if let Some(value) = prompt_line_tui(terminal, "Rename", "New title", &current)? {
                    editor.rename_current(&value);
                }
            }
            EditorOutcome::RequestMedia => {
                if let Some(path) = prompt_line_tui(terminal, "Attach media", "File path", "")? {
                    match upload_media(deps.media, Path::new(path.trim())) {
                        Ok(media) => editor.insert_media(media),
                        Err(err) => editor.set_status(err.to_string()),
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Reads `path`, uploads it, and returns the embed to insert.
pub fn upload_media(store: &dyn MediaStore, path: &Path) -> Result<MediaRef, BackendError> {
    let bytes = fs::read(path).map_err(|source| BackendError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let mime_type = guess_mime_type(path);
    let uploaded = store.upload(&name, mime_type, &bytes)?;
    Ok(MediaRef {
        url: uploaded.url,
        mime_type: mime_type.to_string(),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(guess_mime_type(Path::new("a/Foto.JPG")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("intro.mp4")), "video/mp4");
        assert_eq!(guess_mime_type(Path::new("README")), "application/octet-stream");
    }
}
