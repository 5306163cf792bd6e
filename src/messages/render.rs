//! Render state - data structure sent from App layer to UI for rendering

use crate::app::form::Form;
use crate::app::state::{AccountView, AdminView, Confirm, GalleryView, Notice, QueueView};
use crate::messages::ui_events::{InputMode, Screen};
use crate::models::Session;

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    pub base_url: String,

    pub screen: Screen,
    pub input_mode: InputMode,
    pub session: Option<Session>,
    pub busy: bool,

    pub login: Form,
    pub signup: Form,
    pub prompt: Form,

    pub queue: QueueView,
    pub gallery: GalleryView,
    pub account: AccountView,
    pub admin: AdminView,

    pub notice: Option<Notice>,
    pub confirm: Option<Confirm>,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            base_url: String::new(),
            screen: Screen::Login,
            input_mode: InputMode::Editing,
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
}
