use super::keys::EditorAction;
use crate::backend::ReferenceData;
use crate::content::{AgentContent, ContentPhase, Embed, MediaRef, RichText, Run, TextStyle};
use crate::decision::{
    apply_commit, locate, CommandPalette, CursorBounds, EditorFrame, LocateError, PaletteAnchor,
    PaletteEvent, PaletteInput, PaletteOrigin, TokenCodec, TriggerDetector,
};
use crate::shared::SessionLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Continue,
    Save(AgentContent),
    Back,
    Cancel,
    /// The driver should prompt for a new step name or FAQ question.
    RequestRename { current: String },
    /// The driver should prompt for a file, upload it, and call
    /// [`PhaseEditor::insert_media`].
    RequestMedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    pub trigger: char,
    pub palette_height: i32,
    pub min_top_margin: i32,
}

/// Editing state for one content phase of one agent. The detector is only
/// attached while script steps are being edited, and follows the selected
/// step.
#[derive(Debug, Clone)]
pub struct PhaseEditor {
    phase: ContentPhase,
    content: AgentContent,
    item: usize,
    cursor: usize,
    style: TextStyle,
    detector: TriggerDetector,
    frame: EditorFrame,
    palette: Option<CommandPalette>,
    anchor: Option<PaletteAnchor>,
    status: Option<String>,
}

impl PhaseEditor {
    pub fn new(phase: ContentPhase, content: AgentContent, options: EditorOptions) -> Self {
        let mut editor = Self {
            phase,
            content,
            item: 0,
            cursor: 0,
            style: TextStyle::PLAIN,
            detector: TriggerDetector::new(
                options.trigger,
                options.palette_height,
                options.min_top_margin,
            ),
            frame: EditorFrame {
                origin_left: 0,
                origin_top: 0,
                viewport_height: 24,
            },
            palette: None,
            anchor: None,
            status: None,
        };
        editor.focus_item(0);
        editor
    }

    pub fn phase(&self) -> ContentPhase {
        self.phase
    }

    pub fn content(&self) -> &AgentContent {
        &self.content
    }

    pub fn item(&self) -> usize {
        self.item
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn palette(&self) -> Option<&CommandPalette> {
        self.palette.as_ref()
    }

    pub fn palette_height(&self) -> i32 {
        self.detector.palette_height()
    }

    pub fn anchor(&self) -> Option<PaletteAnchor> {
        self.anchor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_frame(&mut self, frame: EditorFrame) {
        self.frame = frame;
    }

    pub fn item_count(&self) -> usize {
        match self.phase {
            ContentPhase::Rules => 1,
            ContentPhase::Steps => self.content.steps.len(),
            ContentPhase::Faq => self.content.faq.len(),
        }
    }

    pub fn document(&self) -> Option<&RichText> {
        match self.phase {
            ContentPhase::Rules => Some(&self.content.rules),
            ContentPhase::Steps => self.content.steps.get(self.item).map(|s| &s.body),
            ContentPhase::Faq => self.content.faq.get(self.item).map(|f| &f.answer),
        }
    }

    fn document_mut(&mut self) -> Option<&mut RichText> {
        match self.phase {
            ContentPhase::Rules => Some(&mut self.content.rules),
            ContentPhase::Steps => self.content.steps.get_mut(self.item).map(|s| &mut s.body),
            ContentPhase::Faq => self.content.faq.get_mut(self.item).map(|f| &mut f.answer),
        }
    }

    fn focus_item(&mut self, item: usize) {
        self.item = item.min(self.item_count().saturating_sub(1));
        self.cursor = self.document().map(RichText::len).unwrap_or(0);
        if self.phase == ContentPhase::Steps && !self.content.steps.is_empty() {
            self.detector.attach(self.item);
        } else {
            self.detector.detach();
        }
    }

    /// Terminal cell of the cursor relative to the document's origin.
    pub fn cursor_bounds(&self) -> CursorBounds {
        let mut row = 0i32;
        let mut col = 0i32;
        let mut remaining = self.cursor;
        if let Some(document) = self.document() {
            for run in document.runs() {
                if remaining == 0 {
                    break;
                }
                match run {
                    Run::Text { text, .. } => {
                        for ch in text.chars().take(remaining) {
                            if ch == '\n' {
                                row += 1;
                                col = 0;
                            } else {
                                col += 1;
                            }
                        }
                        remaining = remaining.saturating_sub(run.width());
                    }
                    Run::Embed(embed) => {
                        col += embed_display(embed).chars().count() as i32;
                        remaining -= 1;
                    }
                }
            }
        }
        CursorBounds {
            left: col,
            top: row,
            height: 1,
        }
    }

    pub fn rename_current(&mut self, value: &str) {
        let value = value.trim();
        match self.phase {
            ContentPhase::Rules => {}
            ContentPhase::Steps => {
                if let Some(step) = self.content.steps.get_mut(self.item) {
                    if !value.is_empty() {
                        step.name = value.to_string();
                    }
                }
            }
            ContentPhase::Faq => {
                if let Some(item) = self.content.faq.get_mut(self.item) {
                    item.question = (!value.is_empty()).then(|| value.to_string());
                }
            }
        }
    }

    pub fn insert_media(&mut self, media: MediaRef) {
        self.ensure_item();
        let cursor = self.cursor;
        let Some(document) = self.document_mut() else {
            return;
        };
        match document.insert_embed(cursor, Embed::Media(media)) {
            Ok(()) => self.cursor += 1,
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Typing into an empty step or FAQ list starts its first item.
    fn ensure_item(&mut self) {
        if self.document().is_some() {
            return;
        }
        self.add_item();
    }

    fn add_item(&mut self) {
        match self.phase {
            ContentPhase::Rules => return,
            ContentPhase::Steps => {
                let name = format!("Step {}", self.content.steps.len() + 1);
                self.content.add_step(&name, RichText::new());
            }
            ContentPhase::Faq => self.content.add_faq(None, RichText::new()),
        }
        self.focus_item(self.item_count().saturating_sub(1));
    }

    fn current_label(&self) -> String {
        match self.phase {
            ContentPhase::Rules => String::new(),
            ContentPhase::Steps => self
                .content
                .steps
                .get(self.item)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            ContentPhase::Faq => self
                .content
                .faq
                .get(self.item)
                .and_then(|f| f.question.clone())
                .unwrap_or_default(),
        }
    }

    pub fn handle(
        &mut self,
        action: EditorAction,
        data: &dyn ReferenceData,
        codec: &TokenCodec,
        log: &SessionLog,
    ) -> EditorOutcome {
        self.status = None;
        match action {
            EditorAction::Insert(ch) => self.type_text(&ch.to_string(), log),
            EditorAction::NewLine => self.type_text("\n", log),
            EditorAction::Backspace => {
                if self.cursor > 0 {
                    let at = self.cursor - 1;
                    if let Some(document) = self.document_mut() {
                        if document.delete(at, 1).is_ok() {
                            self.cursor = at;
                        }
                    }
                }
            }
            EditorAction::Delete => {
                let at = self.cursor;
                if let Some(document) = self.document_mut() {
                    if at < document.len() {
                        let _ = document.delete(at, 1);
                    }
                }
            }
            EditorAction::Left => self.cursor = self.cursor.saturating_sub(1),
            EditorAction::Right => {
                let len = self.document().map(RichText::len).unwrap_or(0);
                self.cursor = (self.cursor + 1).min(len);
            }
            EditorAction::Home => self.cursor = 0,
            EditorAction::End => self.cursor = self.document().map(RichText::len).unwrap_or(0),
            EditorAction::NextItem => {
                if self.item + 1 < self.item_count() {
                    self.focus_item(self.item + 1);
                }
            }
            EditorAction::PrevItem => {
                if self.item > 0 {
                    self.focus_item(self.item - 1);
                }
            }
            EditorAction::AddItem => self.add_item(),
            EditorAction::RemoveItem => {
                let removed = match self.phase {
                    ContentPhase::Rules => Ok(()),
                    ContentPhase::Steps => self.content.remove_step(self.item).map(|_| ()),
                    ContentPhase::Faq => self.content.remove_faq(self.item).map(|_| ()),
                };
                match removed {
                    Ok(()) => self.focus_item(self.item),
                    Err(err) => self.status = Some(err.to_string()),
                }
            }
            EditorAction::MoveItemUp | EditorAction::MoveItemDown => {
                let target = if action == EditorAction::MoveItemUp {
                    self.item.checked_sub(1)
                } else {
                    Some(self.item + 1).filter(|t| *t < self.item_count())
                };
                if let Some(target) = target {
                    let moved = match self.phase {
                        ContentPhase::Rules => Ok(()),
                        ContentPhase::Steps => self.content.move_step(self.item, target),
                        ContentPhase::Faq => self.content.move_faq(self.item, target),
                    };
                    match moved {
                        Ok(()) => self.focus_item(target),
                        Err(err) => self.status = Some(err.to_string()),
                    }
                }
            }
            EditorAction::Rename => {
                if self.phase != ContentPhase::Rules && self.document().is_some() {
                    return EditorOutcome::RequestRename {
                        current: self.current_label(),
                    };
                }
            }
            EditorAction::EditDecision => self.edit_decision_at_cursor(data, codec, log),
            EditorAction::AttachMedia => return EditorOutcome::RequestMedia,
            EditorAction::ToggleBold => self.style.bold = !self.style.bold,
            EditorAction::ToggleItalic => self.style.italic = !self.style.italic,
            EditorAction::Save => return EditorOutcome::Save(self.content.clone()),
            EditorAction::Back => return EditorOutcome::Back,
            EditorAction::Cancel => return EditorOutcome::Cancel,
        }
        EditorOutcome::Continue
    }

    fn type_text(&mut self, text: &str, log: &SessionLog) {
        self.ensure_item();
        let (cursor, style) = (self.cursor, self.style);
        let Some(document) = self.document_mut() else {
            return;
        };
        if let Err(err) = document.insert_text(cursor, text, style) {
            self.status = Some(err.to_string());
            return;
        }
        self.cursor += text.chars().count();

        let bounds = self.cursor_bounds();
        let Some(document) = self.document() else {
            return;
        };
        if let Some(hit) = self
            .detector
            .on_change(self.item, document, self.cursor, bounds, self.frame)
        {
            self.anchor = Some(hit.anchor);
            self.open_palette(CommandPalette::open_at_trigger(hit.trigger_offset), log);
        }
    }

    /// Reopens the palette for the decision under (or just before) the
    /// cursor. An undecodable embed is ignored; one that can no longer be
    /// located falls back to inserting at the cursor.
    fn edit_decision_at_cursor(
        &mut self,
        data: &dyn ReferenceData,
        codec: &TokenCodec,
        log: &SessionLog,
    ) {
        if self.detector.attached() != Some(self.item) {
            return;
        }
        let located = {
            let Some(document) = self.document() else {
                return;
            };
            [Some(self.cursor), self.cursor.checked_sub(1)]
                .into_iter()
                .flatten()
                .find_map(|offset| match document.embed_at(offset) {
                    Some(Embed::Decision(token)) => Some(codec.encode(token)),
                    _ => None,
                })
                .map(|fragment| locate(document, &fragment, codec))
        };
        let palette = match located {
            None => {
                self.status = Some("no decision at the cursor".to_string());
                return;
            }
            Some(Ok((offset, token))) => CommandPalette::open_for_edit(offset, token.kind(), data),
            Some(Err(LocateError::NotFound)) => CommandPalette::open(PaletteOrigin::Insert {
                offset: self.cursor,
            }),
            Some(Err(LocateError::Decode(_))) => return,
        };
        self.anchor = Some(self.detector.anchor_for(self.cursor_bounds(), self.frame));
        self.open_palette(palette, log);
    }

    fn open_palette(&mut self, palette: CommandPalette, log: &SessionLog) {
        if let Some(err) = palette.load_error() {
            log.warn("palette.fetch_failed", err);
            self.status = Some(format!("could not load options: {err}"));
        }
        self.palette = Some(palette);
    }

    pub fn handle_palette(
        &mut self,
        input: PaletteInput,
        data: &dyn ReferenceData,
        log: &SessionLog,
    ) -> EditorOutcome {
        let Some(palette) = self.palette.as_mut() else {
            return EditorOutcome::Continue;
        };
        let error_before = palette.load_error().map(str::to_string);
        let event = palette.handle(input, data);
        let error_after = palette.load_error().map(str::to_string);
        if let Some(err) = error_after.filter(|err| Some(err) != error_before.as_ref()) {
            log.warn("palette.fetch_failed", &err);
            self.status = Some(format!("could not load options: {err}"));
        }
        match event {
            PaletteEvent::Pending => {}
            PaletteEvent::Closed => {
                self.palette = None;
                self.anchor = None;
            }
            PaletteEvent::Committed(commit) => {
                self.palette = None;
                self.anchor = None;
                let trigger = self.detector.trigger();
                if let Some(document) = self.document_mut() {
                    match apply_commit(document, &commit, trigger) {
                        Ok(cursor) => self.cursor = cursor,
                        Err(err) => self.status = Some(err.to_string()),
                    }
                }
            }
        }
        EditorOutcome::Continue
    }
}

/// How an embed is shown inline in the terminal.
pub fn embed_display(embed: &Embed) -> String {
    match embed {
        Embed::Decision(token) => format!("[{}]", token.render_label()),
        Embed::Media(media) => format!("[{}]", media.name),
    }
}
