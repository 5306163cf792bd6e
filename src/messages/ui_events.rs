//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::messages::RenderState;

/// Tabs of the main (non-admin) area
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MainTab {
    #[default]
    Generate,
    Gallery,
    Account,
}

impl MainTab {
    pub fn index(&self) -> usize {
        match self {
            MainTab::Generate => 0,
            MainTab::Gallery => 1,
            MainTab::Account => 2,
        }
    }
}

/// Top-level screen
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Screen {
    #[default]
    Login,
    Signup,
    Main(MainTab),
    Queue,
    Admin,
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Navigation
    SwitchTab(MainTab),
    OpenSignup,
    OpenQueue,
    Back,

    // List selection
    SelectNext,
    SelectPrev,
    Activate,

    // Form editing
    StartEditing,
    StopEditing,
    NextField,
    PrevField,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,
    Submit,

    // Actions
    Refresh,
    CancelItem,
    RemoveItem,
    ClearQueue,
    DeleteUser,
    DeleteImage,
    Logout,

    // Dialogs
    Confirm,
    Dismiss,

    // System
    Quit,
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Convert a key event to a UiEvent based on what is on screen
pub fn key_to_ui_event(key: KeyEvent, state: &RenderState) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('n') if state.screen == Screen::Login => {
                return Some(UiEvent::OpenSignup)
            }
            _ => {}
        }
    }

    // Dialogs swallow input until answered
    if state.notice.is_some() {
        return Some(UiEvent::Dismiss);
    }

    if state.confirm.is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(UiEvent::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(UiEvent::Dismiss),
            _ => None,
        };
    }

    match state.screen {
        Screen::Login | Screen::Signup => handle_form_keys(key, state.screen),
        Screen::Main(tab) => handle_main_keys(key, tab, state.input_mode),
        Screen::Queue => handle_queue_keys(key),
        Screen::Admin => handle_admin_keys(key),
    }
}

/// Login and signup are always in editing mode
fn handle_form_keys(key: KeyEvent, screen: Screen) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc if screen == Screen::Signup => Some(UiEvent::Back),
        KeyCode::Esc => Some(UiEvent::Quit),
        KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(UiEvent::PrevField),
        KeyCode::Enter => Some(UiEvent::Submit),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn handle_main_keys(key: KeyEvent, tab: MainTab, input_mode: InputMode) -> Option<UiEvent> {
    if input_mode == InputMode::Editing {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(UiEvent::StopEditing),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::BackTab => Some(UiEvent::PrevField),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => return Some(UiEvent::Quit),
        KeyCode::Char('1') => return Some(UiEvent::SwitchTab(MainTab::Generate)),
        KeyCode::Char('2') => return Some(UiEvent::SwitchTab(MainTab::Gallery)),
        KeyCode::Char('3') => return Some(UiEvent::SwitchTab(MainTab::Account)),
        _ => {}
    }

    match tab {
        MainTab::Generate => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
            KeyCode::BackTab | KeyCode::Up => Some(UiEvent::PrevField),
            KeyCode::Char('s') => Some(UiEvent::Submit),
            KeyCode::Char('p') => Some(UiEvent::OpenQueue),
            _ => None,
        },
        MainTab::Gallery => match key.code {
            KeyCode::Up => Some(UiEvent::SelectPrev),
            KeyCode::Down => Some(UiEvent::SelectNext),
            KeyCode::Char('r') => Some(UiEvent::Refresh),
            _ => None,
        },
        MainTab::Account => match key.code {
            KeyCode::Char('r') => Some(UiEvent::Refresh),
            KeyCode::Char('l') => Some(UiEvent::Logout),
            _ => None,
        },
    }
}

fn handle_queue_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Esc | KeyCode::Char('b') => Some(UiEvent::Back),
        KeyCode::Up => Some(UiEvent::SelectPrev),
        KeyCode::Down => Some(UiEvent::SelectNext),
        KeyCode::Char('r') => Some(UiEvent::Refresh),
        KeyCode::Char('x') => Some(UiEvent::CancelItem),
        KeyCode::Char('d') => Some(UiEvent::RemoveItem),
        KeyCode::Char('c') => Some(UiEvent::ClearQueue),
        _ => None,
    }
}

fn handle_admin_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Esc => Some(UiEvent::Back),
        KeyCode::Up => Some(UiEvent::SelectPrev),
        KeyCode::Down => Some(UiEvent::SelectNext),
        KeyCode::Enter => Some(UiEvent::Activate),
        KeyCode::Char('r') => Some(UiEvent::Refresh),
        KeyCode::Char('d') => Some(UiEvent::DeleteUser),
        KeyCode::Char('x') => Some(UiEvent::DeleteImage),
        KeyCode::Char('l') => Some(UiEvent::Logout),
        _ => None,
    }
}
