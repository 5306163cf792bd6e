//! App state - pure data structure with no I/O logic

use std::collections::HashMap;

use crate::app::form::Form;
use crate::messages::ui_events::{InputMode, MainTab, Screen};
use crate::messages::RenderState;
use crate::models::{GalleryImage, Id, ProgressSample, QueueItem, Session, User};

/// One-shot notification, dismissed by any key
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Destructive action awaiting an explicit yes/no
#[derive(Clone, Debug, PartialEq)]
pub enum Confirm {
    ClearQueue,
    DeleteUser(Id),
    DeleteImage(Id),
}

impl Confirm {
    pub fn title(&self) -> &'static str {
        match self {
            Confirm::ClearQueue => "Clear Queue",
            Confirm::DeleteUser(_) => "Delete User",
            Confirm::DeleteImage(_) => "Delete Image",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            Confirm::ClearQueue => "Are you sure you want to clear your entire queue?",
            Confirm::DeleteUser(_) | Confirm::DeleteImage(_) => "Are you sure?",
        }
    }
}

/// Queue screen: last fetched list plus the latest progress map
#[derive(Clone, Debug, Default)]
pub struct QueueView {
    pub items: Vec<QueueItem>,
    pub progress: HashMap<Id, ProgressSample>,
    pub selected: usize,
    pub loading: bool,
    pub refreshing: bool,
}

impl QueueView {
    pub fn selected_item(&self) -> Option<&QueueItem> {
        self.items.get(self.selected)
    }
}

#[derive(Clone, Debug, Default)]
pub struct GalleryView {
    pub images: Vec<GalleryImage>,
    pub selected: usize,
    pub loading: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AccountView {
    pub info: Option<User>,
}

/// A user opened from the admin list
#[derive(Clone, Debug)]
pub struct UserDetail {
    pub user_id: Id,
    pub info: User,
    pub images: Vec<GalleryImage>,
    pub selected_image: usize,
}

#[derive(Clone, Debug, Default)]
pub struct AdminView {
    pub users: Vec<User>,
    pub selected_user: usize,
    pub detail: Option<UserDetail>,
    pub loading: bool,
}

/// Main application state - pure data, no I/O
pub struct AppState {
    /// Used to resolve image file names into URLs
    pub base_url: String,

    // Navigation
    pub screen: Screen,
    pub input_mode: InputMode,
    /// Bumped on every navigation; responses from older epochs are dropped
    pub epoch: u64,

    // Session (in memory only)
    pub session: Option<Session>,
    /// A login, signup or submit is in flight
    pub busy: bool,

    // Forms
    pub login: Form,
    pub signup: Form,
    pub prompt: Form,

    // Views
    pub queue: QueueView,
    pub gallery: GalleryView,
    pub account: AccountView,
    pub admin: AdminView,

    // Dialogs
    pub notice: Option<Notice>,
    pub confirm: Option<Confirm>,
}

impl AppState {
    pub fn new(base_url: impl Into<String>) -> Self {
        AppState {
            base_url: base_url.into(),
            screen: Screen::Login,
            input_mode: InputMode::Editing,
            epoch: 0,
            session: None,
            busy: false,
            login: Form::login(),
            signup: Form::signup(),
            prompt: Form::prompt(),
            queue: QueueView::default(),
            gallery: GalleryView::default(),
            account: AccountView::default(),
            admin: AdminView::default(),
            notice: None,
            confirm: None,
        }
    }

    pub fn user_id(&self) -> Option<&Id> {
        self.session.as_ref().and_then(|s| s.user_id.as_ref())
    }

    /// The form that receives typed characters on the current screen
    pub fn active_form_mut(&mut self) -> Option<&mut Form> {
        match self.screen {
            Screen::Login => Some(&mut self.login),
            Screen::Signup => Some(&mut self.signup),
            Screen::Main(MainTab::Generate) => Some(&mut self.prompt),
            _ => None,
        }
    }

    /// Epoch the queue poller should run under, if it should run at all
    pub fn poll_epoch(&self) -> Option<u64> {
        if self.screen == Screen::Queue && self.user_id().is_some() {
            Some(self.epoch)
        } else {
            None
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            base_url: self.base_url.clone(),
            screen: self.screen,
            input_mode: self.input_mode,
            session: self.session.clone(),
            busy: self.busy,
            login: self.login.clone(),
            signup: self.signup.clone(),
            prompt: self.prompt.clone(),
            queue: self.queue.clone(),
            gallery: self.gallery.clone(),
            account: self.account.clone(),
            admin: self.admin.clone(),
            notice: self.notice.clone(),
            confirm: self.confirm.clone(),
        }
    }
}
