use crate::decision::PaletteInput;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Actions on the list, name, and status screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    MovePrev,
    MoveNext,
    Enter,
    Toggle,
    Edit,
    Back,
    Cancel,
}

/// Actions inside the content editor while no palette is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Insert(char),
    NewLine,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    NextItem,
    PrevItem,
    AddItem,
    RemoveItem,
    MoveItemUp,
    MoveItemDown,
    Rename,
    EditDecision,
    AttachMedia,
    ToggleBold,
    ToggleItalic,
    Save,
    Back,
    Cancel,
}

fn is_release(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Release
}

fn ctrl(key: &KeyEvent, ch: char) -> bool {
    key.code == KeyCode::Char(ch) && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn wizard_action_from_key(key: KeyEvent) -> Option<WizardAction> {
    if is_release(&key) {
        return None;
    }
    if ctrl(&key, 'c') {
        return Some(WizardAction::Cancel);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(WizardAction::MovePrev),
        KeyCode::Down | KeyCode::Char('j') => Some(WizardAction::MoveNext),
        KeyCode::Enter | KeyCode::Char('\n') | KeyCode::Char('\r') => Some(WizardAction::Enter),
        KeyCode::Char(' ') => Some(WizardAction::Toggle),
        KeyCode::Char('e') => Some(WizardAction::Edit),
        KeyCode::Esc | KeyCode::Backspace => Some(WizardAction::Back),
        KeyCode::Char('q') => Some(WizardAction::Cancel),
        _ => None,
    }
}

pub fn palette_input_from_key(key: KeyEvent) -> Option<PaletteInput> {
    if is_release(&key) {
        return None;
    }
    match key.code {
        KeyCode::Up => Some(PaletteInput::Up),
        KeyCode::Down => Some(PaletteInput::Down),
        KeyCode::Enter | KeyCode::Char('\n') | KeyCode::Char('\r') => Some(PaletteInput::Enter),
        KeyCode::Esc => Some(PaletteInput::Escape),
        KeyCode::Left => Some(PaletteInput::Back),
        KeyCode::Backspace => Some(PaletteInput::Erase),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(PaletteInput::Type(ch))
        }
        _ => None,
    }
}

pub fn editor_action_from_key(key: KeyEvent) -> Option<EditorAction> {
    if is_release(&key) {
        return None;
    }
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    if control {
        return match key.code {
            KeyCode::Char('c') => Some(EditorAction::Cancel),
            KeyCode::Char('s') => Some(EditorAction::Save),
            KeyCode::Char('e') => Some(EditorAction::EditDecision),
            KeyCode::Char('n') => Some(EditorAction::AddItem),
            KeyCode::Char('d') => Some(EditorAction::RemoveItem),
            KeyCode::Char('r') => Some(EditorAction::Rename),
            KeyCode::Char('o') => Some(EditorAction::AttachMedia),
            KeyCode::Char('b') => Some(EditorAction::ToggleBold),
            KeyCode::Char('i') => Some(EditorAction::ToggleItalic),
            KeyCode::Up => Some(EditorAction::MoveItemUp),
            KeyCode::Down => Some(EditorAction::MoveItemDown),
            _ => None,
        };
    }
    if alt {
        return match key.code {
            KeyCode::Up => Some(EditorAction::MoveItemUp),
            KeyCode::Down => Some(EditorAction::MoveItemDown),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(ch) => Some(EditorAction::Insert(ch)),
        KeyCode::Enter => Some(EditorAction::NewLine),
        KeyCode::Backspace => Some(EditorAction::Backspace),
        KeyCode::Delete => Some(EditorAction::Delete),
        KeyCode::Left => Some(EditorAction::Left),
        KeyCode::Right => Some(EditorAction::Right),
        KeyCode::Home => Some(EditorAction::Home),
        KeyCode::End => Some(EditorAction::End),
        KeyCode::Tab | KeyCode::Down => Some(EditorAction::NextItem),
        KeyCode::BackTab | KeyCode::Up => Some(EditorAction::PrevItem),
        KeyCode::Esc => Some(EditorAction::Back),
        _ => None,
    }
}
