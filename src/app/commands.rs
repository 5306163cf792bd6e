//! Command handlers - business logic for processing UI events,
//! poll ticks and network responses

use std::path::PathBuf;

use crate::app::form::Form;
use crate::app::poller::{PollKind, PollTick};
use crate::app::state::{AdminView, Confirm, Notice, QueueView, UserDetail};
use crate::app::AppState;
use crate::error::ApiError;
use crate::messages::network::{Mutation, PromptDraft, Query};
use crate::messages::ui_events::{InputMode, MainTab, Screen};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{QueueStatus, RegisterResponse, Role, Session};

impl AppState {
    // ========================
    // Navigation
    // ========================

    /// Enter a screen. Starts a new view epoch and issues its on-focus fetch.
    pub fn navigate(&mut self, screen: Screen) -> Vec<NetworkCommand> {
        tracing::debug!(from = ?self.screen, to = ?screen, "navigate");
        self.screen = screen;
        self.epoch += 1;
        self.busy = false;
        self.confirm = None;
        self.input_mode = match screen {
            Screen::Login | Screen::Signup => InputMode::Editing,
            _ => InputMode::Normal,
        };

        match screen {
            Screen::Login => {
                self.session = None;
                self.login.clear_secrets();
                Vec::new()
            }
            Screen::Signup | Screen::Main(MainTab::Generate) => Vec::new(),
            Screen::Main(MainTab::Gallery) => {
                let cmd = self.fetch_gallery();
                self.gallery.loading = cmd.is_some();
                cmd.into_iter().collect()
            }
            Screen::Main(MainTab::Account) => self.fetch_account().into_iter().collect(),
            Screen::Queue => {
                let cmd = self.fetch_queue();
                self.queue = QueueView {
                    loading: cmd.is_some(),
                    ..QueueView::default()
                };
                cmd.into_iter().collect()
            }
            Screen::Admin => {
                self.admin = AdminView {
                    loading: true,
                    ..AdminView::default()
                };
                vec![self.fetch_users()]
            }
        }
    }

    pub fn switch_tab(&mut self, tab: MainTab) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::Main(current) if current != tab => self.navigate(Screen::Main(tab)),
            _ => Vec::new(),
        }
    }

    pub fn open_signup(&mut self) -> Vec<NetworkCommand> {
        if self.screen == Screen::Login {
            self.navigate(Screen::Signup)
        } else {
            Vec::new()
        }
    }

    pub fn open_queue(&mut self) -> Vec<NetworkCommand> {
        if self.screen == Screen::Main(MainTab::Generate) {
            self.navigate(Screen::Queue)
        } else {
            Vec::new()
        }
    }

    pub fn back(&mut self) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::Signup => self.navigate(Screen::Login),
            Screen::Queue => self.navigate(Screen::Main(MainTab::Generate)),
            Screen::Admin if self.admin.detail.is_some() => {
                self.admin.detail = None;
                Vec::new()
            }
            Screen::Admin => self.navigate(Screen::Login),
            Screen::Main(_) | Screen::Login => Vec::new(),
        }
    }

    // ========================
    // List selection
    // ========================

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Queue => wrap_next(&mut self.queue.selected, self.queue.items.len()),
            Screen::Main(MainTab::Gallery) => {
                wrap_next(&mut self.gallery.selected, self.gallery.images.len())
            }
            Screen::Admin => match &mut self.admin.detail {
                Some(detail) => wrap_next(&mut detail.selected_image, detail.images.len()),
                None => wrap_next(&mut self.admin.selected_user, self.admin.users.len()),
            },
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Queue => wrap_prev(&mut self.queue.selected, self.queue.items.len()),
            Screen::Main(MainTab::Gallery) => {
                wrap_prev(&mut self.gallery.selected, self.gallery.images.len())
            }
            Screen::Admin => match &mut self.admin.detail {
                Some(detail) => wrap_prev(&mut detail.selected_image, detail.images.len()),
                None => wrap_prev(&mut self.admin.selected_user, self.admin.users.len()),
            },
            _ => {}
        }
    }

    /// Enter on a list row. Only the admin user list reacts.
    pub fn activate(&mut self) -> Option<NetworkCommand> {
        if self.screen != Screen::Admin || self.admin.detail.is_some() {
            return None;
        }
        let user_id = self
            .admin
            .users
            .get(self.admin.selected_user)
            .and_then(|u| u.id.clone())?;
        self.admin.loading = true;
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::UserDetails(user_id),
        })
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if self.screen == Screen::Main(MainTab::Generate) {
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn stop_editing(&mut self) {
        if matches!(self.screen, Screen::Main(_)) {
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn next_field(&mut self) {
        if let Some(form) = self.active_form_mut() {
            form.next_field();
        }
    }

    pub fn prev_field(&mut self) {
        if let Some(form) = self.active_form_mut() {
            form.prev_field();
        }
    }

    pub fn enter_char(&mut self, c: char) {
        if let Some(form) = self.editable_form() {
            form.focused_mut().insert(c);
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(form) = self.editable_form() {
            form.focused_mut().backspace();
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(form) = self.editable_form() {
            form.focused_mut().left();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(form) = self.editable_form() {
            form.focused_mut().right();
        }
    }

    fn editable_form(&mut self) -> Option<&mut Form> {
        if self.input_mode == InputMode::Editing {
            self.active_form_mut()
        } else {
            None
        }
    }

    // ========================
    // Session hand-off and prompt submission
    // ========================

    pub fn submit(&mut self) -> Option<NetworkCommand> {
        match self.screen {
            Screen::Login => self.submit_login(),
            Screen::Signup => self.submit_signup(),
            Screen::Main(MainTab::Generate) => self.submit_prompt(),
            _ => None,
        }
    }

    fn submit_login(&mut self) -> Option<NetworkCommand> {
        if self.busy {
            return None;
        }
        self.busy = true;
        Some(NetworkCommand::Login {
            epoch: self.epoch,
            identifier: self.login.value(Form::LOGIN_IDENTIFIER).to_string(),
            password: self.login.value(Form::LOGIN_PASSWORD).to_string(),
        })
    }

    fn submit_signup(&mut self) -> Option<NetworkCommand> {
        if self.busy {
            return None;
        }
        let password = self.signup.value(Form::SIGNUP_PASSWORD);
        if password != self.signup.value(Form::SIGNUP_CONFIRM) {
            self.notice = Some(Notice::new("Signup", "Passwords do not match"));
            return None;
        }
        self.busy = true;
        Some(NetworkCommand::Register {
            epoch: self.epoch,
            username: self.signup.value(Form::SIGNUP_USERNAME).to_string(),
            email: self.signup.value(Form::SIGNUP_EMAIL).to_string(),
            password: password.to_string(),
        })
    }

    fn submit_prompt(&mut self) -> Option<NetworkCommand> {
        if self.busy {
            return None;
        }
        let prompt = self.prompt.value(Form::PROMPT_TEXT);
        if prompt.trim().is_empty() {
            self.notice = Some(Notice::new("Prompt required", "Please enter a prompt."));
            return None;
        }
        let Some(user_id) = self.user_id().cloned() else {
            self.notice = Some(Notice::new("Error", "No user ID found. Please log in again."));
            return None;
        };

        let image_path = self.prompt.value(Form::PROMPT_IMAGE).trim();
        let draft = PromptDraft {
            user_id,
            prompt: prompt.to_string(),
            negative_prompt: self.prompt.value(Form::PROMPT_NEGATIVE).to_string(),
            image_path: (!image_path.is_empty()).then(|| PathBuf::from(image_path)),
        };

        self.busy = true;
        self.input_mode = InputMode::Normal;
        Some(NetworkCommand::Mutate {
            epoch: self.epoch,
            mutation: Mutation::SubmitPrompt(draft),
        })
    }

    fn start_session(&mut self, session: Session) -> Vec<NetworkCommand> {
        if session.role == Role::Regular && session.user_id.is_none() {
            tracing::warn!("login response carried no user id");
        }
        tracing::info!(role = ?session.role, user = ?session.user_id, "session started");
        let role = session.role;
        self.session = Some(session);
        self.login.clear();
        self.signup.clear();
        match role {
            Role::Admin => self.navigate(Screen::Admin),
            Role::Regular => self.navigate(Screen::Main(MainTab::Generate)),
        }
    }

    // ========================
    // Fetch paths
    // ========================

    pub fn fetch_queue(&self) -> Option<NetworkCommand> {
        let user_id = self.user_id()?.clone();
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::Queue(user_id),
        })
    }

    /// One progress request per processing item. With none processing,
    /// the map is cleared and nothing is sent.
    pub fn fetch_progress(&mut self) -> Option<NetworkCommand> {
        let ids: Vec<_> = self
            .queue
            .items
            .iter()
            .filter(|item| item.status == QueueStatus::Processing)
            .map(|item| item.id.clone())
            .collect();
        if ids.is_empty() {
            self.queue.progress.clear();
            return None;
        }
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::Progress(ids),
        })
    }

    fn fetch_gallery(&self) -> Option<NetworkCommand> {
        let user_id = self.user_id()?.clone();
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::UserImages(user_id),
        })
    }

    fn fetch_account(&self) -> Option<NetworkCommand> {
        let user_id = self.user_id()?.clone();
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::UserInfo(user_id),
        })
    }

    fn fetch_users(&self) -> NetworkCommand {
        NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::Users,
        }
    }

    fn reload_user_details(&self) -> Option<NetworkCommand> {
        let detail = self.admin.detail.as_ref()?;
        Some(NetworkCommand::Fetch {
            epoch: self.epoch,
            query: Query::UserDetails(detail.user_id.clone()),
        })
    }

    /// Timer-driven fetch. Ticks from a stopped poller are ignored.
    pub fn handle_poll_tick(&mut self, tick: PollTick) -> Option<NetworkCommand> {
        if tick.epoch != self.epoch || self.screen != Screen::Queue {
            return None;
        }
        match tick.kind {
            PollKind::Queue => self.fetch_queue(),
            PollKind::Progress if self.queue.items.is_empty() => None,
            PollKind::Progress => self.fetch_progress(),
        }
    }

    /// User-triggered refresh of whatever the current screen shows
    pub fn refresh(&mut self) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::Queue => {
                let queue = self.fetch_queue();
                let progress = self.fetch_progress();
                self.queue.refreshing = queue.is_some();
                queue.into_iter().chain(progress).collect()
            }
            Screen::Main(MainTab::Gallery) => self.fetch_gallery().into_iter().collect(),
            Screen::Main(MainTab::Account) => self.fetch_account().into_iter().collect(),
            Screen::Admin => match self.reload_user_details() {
                Some(cmd) => vec![cmd],
                None => vec![self.fetch_users()],
            },
            _ => Vec::new(),
        }
    }

    // ========================
    // Mutations
    // ========================

    fn mutate(&self, mutation: Mutation) -> NetworkCommand {
        NetworkCommand::Mutate {
            epoch: self.epoch,
            mutation,
        }
    }

    pub fn cancel_item(&mut self) -> Option<NetworkCommand> {
        if self.screen != Screen::Queue {
            return None;
        }
        let item = self.queue.selected_item()?;
        if !item.status.is_cancellable() {
            return None;
        }
        Some(self.mutate(Mutation::CancelItem(item.id.clone())))
    }

    pub fn remove_item(&mut self) -> Option<NetworkCommand> {
        if self.screen != Screen::Queue {
            return None;
        }
        let item = self.queue.selected_item()?;
        if !item.status.is_removable() {
            return None;
        }
        Some(self.mutate(Mutation::RemoveItem(item.id.clone())))
    }

    pub fn clear_queue(&mut self) {
        if self.screen == Screen::Queue && self.user_id().is_some() {
            self.confirm = Some(Confirm::ClearQueue);
        }
    }

    pub fn delete_user(&mut self) {
        if self.screen != Screen::Admin {
            return;
        }
        if let Some(detail) = &self.admin.detail {
            self.confirm = Some(Confirm::DeleteUser(detail.user_id.clone()));
        }
    }

    pub fn delete_image(&mut self) {
        if self.screen != Screen::Admin {
            return;
        }
        let image_id = self
            .admin
            .detail
            .as_ref()
            .and_then(|d| d.images.get(d.selected_image))
            .map(|img| img.id.clone());
        if let Some(id) = image_id {
            self.confirm = Some(Confirm::DeleteImage(id));
        }
    }

    pub fn logout(&mut self) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::Main(MainTab::Account) => match self.user_id().cloned() {
                Some(user_id) => vec![self.mutate(Mutation::Logout(user_id))],
                None => self.navigate(Screen::Login),
            },
            Screen::Admin => self.navigate(Screen::Login),
            _ => Vec::new(),
        }
    }

    // ========================
    // Dialogs
    // ========================

    /// The pending destructive action was acknowledged
    pub fn confirm_dialog(&mut self) -> Option<NetworkCommand> {
        let mutation = match self.confirm.take()? {
            Confirm::ClearQueue => Mutation::ClearQueue(self.user_id()?.clone()),
            Confirm::DeleteUser(id) => Mutation::DeleteUser(id),
            Confirm::DeleteImage(id) => Mutation::DeleteImage(id),
        };
        Some(self.mutate(mutation))
    }

    pub fn dismiss(&mut self) {
        if self.notice.take().is_none() {
            self.confirm = None;
        }
    }

    // ========================
    // Response handling
    // ========================

    /// Apply a network response. Returns any follow-up fetches.
    ///
    /// Mutation outcomes are always reported, even when the view that
    /// issued them is gone; only their re-fetch is tied to the epoch.
    pub fn handle_response(&mut self, response: NetworkResponse) -> Vec<NetworkCommand> {
        if let NetworkResponse::Mutated {
            epoch,
            mutation,
            result,
        } = response
        {
            return self.handle_mutated(mutation, result, epoch == self.epoch);
        }

        if response.epoch() != self.epoch {
            tracing::debug!(
                epoch = response.epoch(),
                current = self.epoch,
                "discarding response for a closed view"
            );
            return Vec::new();
        }

        match response {
            NetworkResponse::LoggedIn { result, .. } => {
                self.busy = false;
                match result {
                    Ok(session) => return self.start_session(session),
                    Err(e) => {
                        tracing::warn!("login failed: {}", e);
                        self.notice = Some(match e {
                            ApiError::Transport(_) => {
                                Notice::new("Network Error", "Could not connect to server.")
                            }
                            ApiError::Server { .. } => {
                                Notice::new("Login Failed", "Invalid email or password")
                            }
                            _ => Notice::new("Login Failed", "Unexpected response from server."),
                        });
                    }
                }
            }
            NetworkResponse::Registered { result, .. } => {
                self.busy = false;
                return self.handle_registered(result);
            }
            NetworkResponse::UsersLoaded { result, .. } => {
                self.admin.loading = false;
                match result {
                    Ok(users) => {
                        self.admin.users = users;
                        clamp(&mut self.admin.selected_user, self.admin.users.len());
                    }
                    Err(e) => tracing::warn!("user list fetch failed: {}", e),
                }
            }
            NetworkResponse::UserInfoLoaded { result, .. } => match result {
                Ok(info) => self.account.info = Some(info),
                Err(e) => tracing::warn!("user info fetch failed: {}", e),
            },
            NetworkResponse::ImagesLoaded { result, .. } => {
                self.gallery.loading = false;
                match result {
                    Ok(images) => {
                        self.gallery.images = images;
                        clamp(&mut self.gallery.selected, self.gallery.images.len());
                    }
                    Err(e) => {
                        tracing::warn!("gallery fetch failed: {}", e);
                        self.notice = Some(Notice::new("Error", "Failed to fetch user images."));
                    }
                }
            }
            NetworkResponse::UserDetailsLoaded {
                user_id, result, ..
            } => {
                self.admin.loading = false;
                match result {
                    Ok((info, images)) => {
                        let mut selected_image = self
                            .admin
                            .detail
                            .as_ref()
                            .filter(|d| d.user_id == user_id)
                            .map(|d| d.selected_image)
                            .unwrap_or(0);
                        clamp(&mut selected_image, images.len());
                        self.admin.detail = Some(UserDetail {
                            user_id,
                            info,
                            images,
                            selected_image,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(user = %user_id, "user details fetch failed: {}", e);
                        self.notice = Some(Notice::new("Error", "Failed to load user details."));
                    }
                }
            }
            NetworkResponse::QueueLoaded { result, .. } => {
                self.queue.loading = false;
                self.queue.refreshing = false;
                match result {
                    Ok(items) => {
                        self.queue.items = items;
                        clamp(&mut self.queue.selected, self.queue.items.len());
                    }
                    // keep showing the last good list
                    Err(e) => tracing::warn!("queue poll failed: {}", e),
                }
            }
            NetworkResponse::ProgressLoaded { samples, .. } => {
                self.queue.progress = samples;
            }
            NetworkResponse::Mutated { .. } => {}
        }

        Vec::new()
    }

    fn handle_registered(
        &mut self,
        result: Result<RegisterResponse, ApiError>,
    ) -> Vec<NetworkCommand> {
        match result {
            Ok(resp) if resp.is_success() => {
                self.notice = Some(Notice::new("Welcome", "Signup successful!"));
                self.start_session(Session {
                    role: Role::Regular,
                    user_id: resp.user_id,
                })
            }
            Ok(resp) => {
                let message = resp
                    .detail
                    .or(resp.message)
                    .unwrap_or_else(|| String::from("Signup failed"));
                self.notice = Some(Notice::new("Signup Failed", message));
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("signup failed: {}", e);
                self.notice = Some(Notice::new(
                    "Signup Failed",
                    "Something went wrong during signup.",
                ));
                Vec::new()
            }
        }
    }

    fn handle_mutated(
        &mut self,
        mutation: Mutation,
        result: Result<(), ApiError>,
        current_view: bool,
    ) -> Vec<NetworkCommand> {
        if matches!(mutation, Mutation::SubmitPrompt(_)) {
            self.busy = false;
        }

        if let Err(e) = result {
            tracing::warn!(?mutation, "mutation failed: {}", e);
            self.notice = Some(Notice::new("Error", mutation.failure_message(&e)));
            return Vec::new();
        }

        let (title, message) = mutation.success_notice();
        self.notice = Some(Notice::new(title, message));

        match mutation {
            Mutation::SubmitPrompt(_) => {
                self.prompt.clear();
                Vec::new()
            }
            Mutation::Logout(_) => self.navigate(Screen::Login),
            _ if !current_view => {
                tracing::debug!(?mutation, "view closed, skipping re-fetch");
                Vec::new()
            }
            Mutation::CancelItem(_) | Mutation::RemoveItem(_) | Mutation::ClearQueue(_) => {
                self.fetch_queue().into_iter().collect()
            }
            Mutation::DeleteUser(_) => {
                self.admin.detail = None;
                vec![self.fetch_users()]
            }
            Mutation::DeleteImage(_) => self.reload_user_details().into_iter().collect(),
        }
    }
}

fn wrap_next(selected: &mut usize, len: usize) {
    if len > 0 {
        *selected = (*selected + 1) % len;
    }
}

fn wrap_prev(selected: &mut usize, len: usize) {
    if len > 0 {
        *selected = selected.checked_sub(1).unwrap_or(len - 1);
    }
}

fn clamp(selected: &mut usize, len: usize) {
    if *selected >= len {
        *selected = len.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GalleryImage, Id, ProgressSample, QueueItem, User};
    use std::collections::HashMap;

    fn item(id: i64, status: QueueStatus) -> QueueItem {
        QueueItem {
            id: Id::Num(id),
            user_id: Some(Id::Num(1)),
            prompt: format!("prompt {}", id),
            status,
            image_url: None,
            timestamp: None,
        }
    }

    fn logged_in() -> AppState {
        let mut state = AppState::new("http://gen.local:8000");
        state.session = Some(Session {
            role: Role::Regular,
            user_id: Some(Id::Num(1)),
        });
        state.navigate(Screen::Main(MainTab::Generate));
        state
    }

    fn on_queue(items: Vec<QueueItem>) -> AppState {
        let mut state = logged_in();
        state.navigate(Screen::Queue);
        let epoch = state.epoch;
        state.handle_response(NetworkResponse::QueueLoaded {
            epoch,
            result: Ok(items),
        });
        state
    }

    fn type_into(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    #[test]
    fn test_admin_login_routes_to_dashboard() {
        let mut state = AppState::new("http://gen.local:8000");
        type_into(&mut state, "root");
        let cmd = state.submit().unwrap();
        assert!(matches!(cmd, NetworkCommand::Login { ref identifier, .. } if identifier == "root"));

        let epoch = state.epoch;
        let follow_up = state.handle_response(NetworkResponse::LoggedIn {
            epoch,
            result: Ok(Session {
                role: Role::Admin,
                user_id: None,
            }),
        });

        assert_eq!(state.screen, Screen::Admin);
        assert_eq!(
            follow_up,
            vec![NetworkCommand::Fetch {
                epoch: state.epoch,
                query: Query::Users
            }]
        );
    }

    #[test]
    fn test_regular_login_carries_user_id() {
        let mut state = AppState::new("http://gen.local:8000");
        state.submit();
        let epoch = state.epoch;
        state.handle_response(NetworkResponse::LoggedIn {
            epoch,
            result: Ok(Session {
                role: Role::Regular,
                user_id: Some(Id::Num(5)),
            }),
        });

        assert_eq!(state.screen, Screen::Main(MainTab::Generate));
        assert_eq!(state.user_id(), Some(&Id::Num(5)));
    }

    #[test]
    fn test_login_rejection_message() {
        let mut state = AppState::new("http://gen.local:8000");
        state.submit();
        let epoch = state.epoch;
        state.handle_response(NetworkResponse::LoggedIn {
            epoch,
            result: Err(ApiError::Server {
                status: 401,
                detail: Some("bad password".into()),
            }),
        });
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(
            state.notice,
            Some(Notice::new("Login Failed", "Invalid email or password"))
        );
        assert!(!state.busy);
    }

    #[test]
    fn test_signup_password_mismatch_sends_nothing() {
        let mut state = AppState::new("http://gen.local:8000");
        state.open_signup();
        state.signup.fields[Form::SIGNUP_PASSWORD].value = "hunter2".into();
        state.signup.fields[Form::SIGNUP_CONFIRM].value = "hunter3".into();

        assert_eq!(state.submit(), None);
        assert_eq!(
            state.notice,
            Some(Notice::new("Signup", "Passwords do not match"))
        );
        assert!(!state.busy);
    }

    #[test]
    fn test_signup_success_enters_main_area() {
        let mut state = AppState::new("http://gen.local:8000");
        state.open_signup();
        assert!(state.submit().is_some());

        let epoch = state.epoch;
        state.handle_response(NetworkResponse::Registered {
            epoch,
            result: Ok(RegisterResponse {
                message: Some("User registered successfully".into()),
                detail: None,
                user_id: Some(Id::Num(9)),
            }),
        });
        assert_eq!(state.screen, Screen::Main(MainTab::Generate));
        assert_eq!(state.user_id(), Some(&Id::Num(9)));
    }

    #[test]
    fn test_signup_rejection_shows_server_message() {
        let mut state = AppState::new("http://gen.local:8000");
        state.open_signup();
        assert!(state.submit().is_some());

        let epoch = state.epoch;
        state.handle_response(NetworkResponse::Registered {
            epoch,
            result: Ok(RegisterResponse {
                message: Some("Username already exists".into()),
                detail: None,
                user_id: None,
            }),
        });
        assert_eq!(state.screen, Screen::Signup);
        assert_eq!(
            state.notice,
            Some(Notice::new("Signup Failed", "Username already exists"))
        );
        assert!(!state.busy);

        assert!(state.submit().is_some());
        state.handle_response(NetworkResponse::Registered {
            epoch,
            result: Err(ApiError::Decode("expected value at line 1".into())),
        });
        assert_eq!(
            state.notice,
            Some(Notice::new("Signup Failed", "Something went wrong during signup."))
        );
    }

    #[test]
    fn test_blank_prompt_sends_nothing() {
        let mut state = logged_in();
        state.start_editing();
        type_into(&mut state, "   ");

        assert_eq!(state.submit(), None);
        assert_eq!(
            state.notice,
            Some(Notice::new("Prompt required", "Please enter a prompt."))
        );
    }

    #[test]
    fn test_prompt_submission_clears_form_on_success() {
        let mut state = logged_in();
        state.start_editing();
        type_into(&mut state, "a red fox");
        state.next_field();
        type_into(&mut state, "blurry");

        let cmd = state.submit().unwrap();
        let NetworkCommand::Mutate { epoch, mutation } = cmd else {
            panic!("expected a mutation");
        };
        let Mutation::SubmitPrompt(draft) = &mutation else {
            panic!("expected a prompt submission");
        };
        assert_eq!(draft.prompt, "a red fox");
        assert_eq!(draft.negative_prompt, "blurry");
        assert_eq!(draft.image_path, None);
        assert!(state.busy);
        assert_eq!(state.submit(), None);

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert!(follow_up.is_empty());
        assert_eq!(state.prompt.value(Form::PROMPT_TEXT), "");
        assert!(!state.busy);
    }

    #[test]
    fn test_failed_queue_fetch_keeps_list() {
        let mut state = on_queue(vec![item(1, QueueStatus::Queued), item(2, QueueStatus::Done)]);
        let epoch = state.epoch;

        state.handle_response(NetworkResponse::QueueLoaded {
            epoch,
            result: Err(ApiError::Transport("Connection failed".into())),
        });

        assert_eq!(state.queue.items.len(), 2);
        assert_eq!(state.notice, None);
    }

    #[test]
    fn test_progress_only_for_processing_items() {
        let mut state = on_queue(vec![
            item(1, QueueStatus::Queued),
            item(2, QueueStatus::Processing),
            item(3, QueueStatus::Done),
            item(4, QueueStatus::Cancelled),
            item(5, QueueStatus::Processing),
        ]);

        let cmd = state.handle_poll_tick(PollTick {
            epoch: state.epoch,
            kind: PollKind::Progress,
        });
        assert_eq!(
            cmd,
            Some(NetworkCommand::Fetch {
                epoch: state.epoch,
                query: Query::Progress(vec![Id::Num(2), Id::Num(5)]),
            })
        );
    }

    #[test]
    fn test_progress_map_replaced_each_cycle() {
        let mut state = on_queue(vec![item(2, QueueStatus::Processing)]);
        let epoch = state.epoch;

        let mut first = HashMap::new();
        first.insert(Id::Num(2), ProgressSample::new(10.0, Some(30.0), Some(3.0)));
        first.insert(Id::Num(7), ProgressSample::new(80.0, None, None));
        state.handle_response(NetworkResponse::ProgressLoaded {
            epoch,
            samples: first,
        });

        let mut second = HashMap::new();
        second.insert(Id::Num(2), ProgressSample::new(55.0, Some(12.0), Some(15.0)));
        state.handle_response(NetworkResponse::ProgressLoaded {
            epoch,
            samples: second,
        });

        assert_eq!(state.queue.progress.len(), 1);
        assert_eq!(state.queue.progress[&Id::Num(2)].percent(), 55.0);
    }

    #[test]
    fn test_progress_tick_with_nothing_processing() {
        let mut state = on_queue(vec![]);
        let tick = PollTick {
            epoch: state.epoch,
            kind: PollKind::Progress,
        };
        assert_eq!(state.handle_poll_tick(tick), None);

        let mut state = on_queue(vec![item(1, QueueStatus::Done)]);
        state
            .queue
            .progress
            .insert(Id::Num(1), ProgressSample::new(100.0, None, None));
        let tick = PollTick {
            epoch: state.epoch,
            kind: PollKind::Progress,
        };
        assert_eq!(state.handle_poll_tick(tick), None);
        assert!(state.queue.progress.is_empty());
    }

    #[test]
    fn test_stale_ticks_and_responses_ignored() {
        let mut state = on_queue(vec![item(1, QueueStatus::Queued)]);
        let old_epoch = state.epoch;
        state.back();

        let tick = PollTick {
            epoch: old_epoch,
            kind: PollKind::Queue,
        };
        assert_eq!(state.handle_poll_tick(tick), None);

        let follow_up = state.handle_response(NetworkResponse::QueueLoaded {
            epoch: old_epoch,
            result: Ok(vec![]),
        });
        assert!(follow_up.is_empty());
        assert_eq!(state.queue.items.len(), 1);
    }

    #[test]
    fn test_mutation_outcome_reported_after_leaving_view() {
        let mut state = on_queue(vec![item(1, QueueStatus::Queued)]);
        let old_epoch = state.epoch;
        state.back();

        // the notice still shows, but the closed queue is not re-fetched
        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch: old_epoch,
            mutation: Mutation::RemoveItem(Id::Num(1)),
            result: Ok(()),
        });
        assert!(follow_up.is_empty());
        assert_eq!(
            state.notice,
            Some(Notice::new("Removed", "Prompt removed from queue"))
        );
    }

    #[test]
    fn test_submit_failure_shown_after_tab_switch() {
        let mut state = logged_in();
        state.start_editing();
        type_into(&mut state, "a fox");
        let Some(NetworkCommand::Mutate { epoch, mutation }) = state.submit() else {
            panic!("expected a mutation");
        };

        state.switch_tab(MainTab::Gallery);
        assert_ne!(state.epoch, epoch);

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation: mutation.clone(),
            result: Err(ApiError::Server {
                status: 500,
                detail: Some("GPU out of memory".into()),
            }),
        });
        assert!(follow_up.is_empty());
        assert_eq!(state.notice, Some(Notice::new("Error", "GPU out of memory")));
        assert_eq!(state.prompt.value(Form::PROMPT_TEXT), "a fox");

        state.dismiss();
        state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(state.notice.as_ref().map(|n| n.title.as_str()), Some("Queued"));
        assert_eq!(state.prompt.value(Form::PROMPT_TEXT), "");
        assert_eq!(state.screen, Screen::Main(MainTab::Gallery));
    }

    #[test]
    fn test_logout_completes_after_tab_switch() {
        let mut state = logged_in();
        state.switch_tab(MainTab::Account);
        let epoch = state.epoch;
        state.logout();
        state.switch_tab(MainTab::Generate);

        state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation: Mutation::Logout(Id::Num(1)),
            result: Ok(()),
        });
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.session, None);
    }

    #[test]
    fn test_remove_and_clear_refetch_once() {
        let mut state = on_queue(vec![item(1, QueueStatus::Queued), item(2, QueueStatus::Cancelled)]);
        let epoch = state.epoch;
        let queue_fetch = vec![NetworkCommand::Fetch {
            epoch,
            query: Query::Queue(Id::Num(1)),
        }];

        let Some(NetworkCommand::Mutate { mutation, .. }) = state.remove_item() else {
            panic!("expected a mutation");
        };
        assert_eq!(mutation, Mutation::RemoveItem(Id::Num(1)));
        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(follow_up, queue_fetch);

        state.dismiss();
        state.clear_queue();
        let Some(NetworkCommand::Mutate { mutation, .. }) = state.confirm_dialog() else {
            panic!("expected a mutation");
        };
        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(follow_up, queue_fetch);
        assert_eq!(
            state.notice,
            Some(Notice::new("Cleared", "Your queue has been cleared."))
        );

        state.handle_response(NetworkResponse::QueueLoaded {
            epoch,
            result: Ok(vec![]),
        });
        assert!(state.queue.items.is_empty());
    }

    #[test]
    fn test_cancel_success_refetches_once_and_replaces() {
        let mut state = on_queue(vec![item(1, QueueStatus::Processing), item(2, QueueStatus::Queued)]);
        let epoch = state.epoch;

        assert_eq!(state.remove_item(), None);
        let cmd = state.cancel_item().unwrap();
        let NetworkCommand::Mutate { mutation, .. } = cmd else {
            panic!("expected a mutation");
        };
        assert_eq!(mutation, Mutation::CancelItem(Id::Num(1)));

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(
            follow_up,
            vec![NetworkCommand::Fetch {
                epoch,
                query: Query::Queue(Id::Num(1)),
            }]
        );
        assert_eq!(state.notice.as_ref().map(|n| n.title.as_str()), Some("Cancelled"));

        state.handle_response(NetworkResponse::QueueLoaded {
            epoch,
            result: Ok(vec![item(2, QueueStatus::Queued)]),
        });
        assert_eq!(state.queue.items, vec![item(2, QueueStatus::Queued)]);
    }

    #[test]
    fn test_mutation_failure_prefers_server_detail() {
        let mut state = on_queue(vec![item(2, QueueStatus::Queued)]);
        let epoch = state.epoch;

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation: Mutation::RemoveItem(Id::Num(2)),
            result: Err(ApiError::Server {
                status: 409,
                detail: Some("Item is already processing".into()),
            }),
        });
        assert!(follow_up.is_empty());
        assert_eq!(
            state.notice,
            Some(Notice::new("Error", "Item is already processing"))
        );
        assert_eq!(state.queue.items.len(), 1);

        state.dismiss();
        state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation: Mutation::RemoveItem(Id::Num(2)),
            result: Err(ApiError::Transport("reset".into())),
        });
        assert_eq!(
            state.notice,
            Some(Notice::new("Error", "Failed to remove prompt"))
        );
    }

    #[test]
    fn test_clear_queue_needs_confirmation() {
        let mut state = on_queue(vec![item(1, QueueStatus::Queued)]);

        state.clear_queue();
        assert_eq!(state.confirm, Some(Confirm::ClearQueue));
        state.dismiss();
        assert_eq!(state.confirm, None);
        assert_eq!(state.confirm_dialog(), None);

        state.clear_queue();
        let cmd = state.confirm_dialog();
        assert_eq!(
            cmd,
            Some(NetworkCommand::Mutate {
                epoch: state.epoch,
                mutation: Mutation::ClearQueue(Id::Num(1)),
            })
        );
        assert_eq!(state.confirm, None);
    }

    #[test]
    fn test_manual_refresh_runs_both_paths() {
        let mut state = on_queue(vec![item(3, QueueStatus::Processing)]);
        let cmds = state.refresh();
        assert_eq!(cmds.len(), 2);
        assert!(state.queue.refreshing);
        assert!(matches!(cmds[0], NetworkCommand::Fetch { query: Query::Queue(_), .. }));
        assert!(matches!(cmds[1], NetworkCommand::Fetch { query: Query::Progress(_), .. }));
    }

    #[test]
    fn test_poller_only_runs_on_queue_with_user() {
        let mut state = logged_in();
        assert_eq!(state.poll_epoch(), None);
        state.open_queue();
        assert_eq!(state.poll_epoch(), Some(state.epoch));

        let mut anonymous = AppState::new("http://gen.local:8000");
        anonymous.session = Some(Session {
            role: Role::Regular,
            user_id: None,
        });
        let cmds = anonymous.navigate(Screen::Queue);
        assert!(cmds.is_empty());
        assert_eq!(anonymous.poll_epoch(), None);
        assert!(!anonymous.queue.loading);
    }

    #[test]
    fn test_admin_delete_image_reloads_details() {
        let mut state = AppState::new("http://gen.local:8000");
        state.session = Some(Session {
            role: Role::Admin,
            user_id: None,
        });
        state.navigate(Screen::Admin);
        let epoch = state.epoch;
        state.handle_response(NetworkResponse::UsersLoaded {
            epoch,
            result: Ok(vec![User {
                id: Some(Id::Num(4)),
                username: "maya".into(),
                ..User::default()
            }]),
        });

        let open = state.activate();
        assert_eq!(
            open,
            Some(NetworkCommand::Fetch {
                epoch,
                query: Query::UserDetails(Id::Num(4)),
            })
        );
        state.handle_response(NetworkResponse::UserDetailsLoaded {
            epoch,
            user_id: Id::Num(4),
            result: Ok((
                User::default(),
                vec![GalleryImage {
                    id: Id::Num(40),
                    prompt: "moon".into(),
                    image_url: "moon.png".into(),
                    timestamp: None,
                }],
            )),
        });

        state.delete_image();
        assert_eq!(state.confirm, Some(Confirm::DeleteImage(Id::Num(40))));
        let cmd = state.confirm_dialog().unwrap();
        let NetworkCommand::Mutate { mutation, .. } = cmd else {
            panic!("expected a mutation");
        };

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(
            follow_up,
            vec![NetworkCommand::Fetch {
                epoch,
                query: Query::UserDetails(Id::Num(4)),
            }]
        );
    }

    #[test]
    fn test_admin_delete_user_closes_detail_and_reloads_list() {
        let mut state = AppState::new("http://gen.local:8000");
        state.session = Some(Session {
            role: Role::Admin,
            user_id: None,
        });
        state.navigate(Screen::Admin);
        let epoch = state.epoch;
        state.handle_response(NetworkResponse::UserDetailsLoaded {
            epoch,
            user_id: Id::Num(4),
            result: Ok((User::default(), vec![])),
        });

        state.delete_user();
        assert_eq!(state.confirm, Some(Confirm::DeleteUser(Id::Num(4))));
        let Some(NetworkCommand::Mutate { mutation, .. }) = state.confirm_dialog() else {
            panic!("expected a mutation");
        };
        assert_eq!(mutation, Mutation::DeleteUser(Id::Num(4)));

        let follow_up = state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation,
            result: Ok(()),
        });
        assert_eq!(
            follow_up,
            vec![NetworkCommand::Fetch {
                epoch,
                query: Query::Users,
            }]
        );
        assert!(state.admin.detail.is_none());
        assert_eq!(state.notice, Some(Notice::new("Deleted", "User removed.")));
    }

    #[test]
    fn test_logout_returns_to_login() {
        let mut state = logged_in();
        state.switch_tab(MainTab::Account);
        let cmds = state.logout();
        assert_eq!(
            cmds,
            vec![NetworkCommand::Mutate {
                epoch: state.epoch,
                mutation: Mutation::Logout(Id::Num(1)),
            }]
        );

        let epoch = state.epoch;
        state.handle_response(NetworkResponse::Mutated {
            epoch,
            mutation: Mutation::Logout(Id::Num(1)),
            result: Ok(()),
        });
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.session, None);
        assert_eq!(
            state.notice.as_ref().map(|n| n.message.as_str()),
            Some("Your session has been cleared.")
        );
    }
}
