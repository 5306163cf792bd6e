//! App actor - message loop processing UI events, poll ticks and network responses

use std::time::Duration;
use tokio::sync::mpsc;

use crate::app::poller::{PollTick, Poller};
use crate::app::state::AppState;
use crate::config::Config;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    queue_period: Duration,
    progress_period: Duration,
    /// Running only while the queue screen is open
    poller: Option<Poller>,
}

impl AppActor {
    pub fn new(
        config: &Config,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(config.base_url()),
            network_tx,
            render_tx,
            queue_period: config.queue_period(),
            progress_period: config.progress_period(),
            poller: None,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<PollTick>();

        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        self.stop_poller();
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                }
                Some(response) = net_rx.recv() => {
                    let follow_up = self.state.handle_response(response);
                    self.send_all(follow_up);
                }
                Some(tick) = tick_rx.recv() => {
                    if let Some(cmd) = self.state.handle_poll_tick(tick) {
                        self.send(cmd);
                    }
                }
                else => break,
            }

            self.sync_poller(&tick_tx);
            let _ = self.render_tx.send(self.state.to_render_state());
        }
    }

    /// Start or stop the poller so it runs exactly while the state wants it
    fn sync_poller(&mut self, tick_tx: &mpsc::UnboundedSender<PollTick>) {
        let wanted = self.state.poll_epoch();
        let running = self.poller.as_ref().map(Poller::epoch);
        if wanted == running {
            return;
        }

        self.stop_poller();
        if let Some(epoch) = wanted {
            self.poller = Some(Poller::start(
                epoch,
                tick_tx.clone(),
                self.queue_period,
                self.progress_period,
            ));
        }
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }

    fn send(&self, cmd: NetworkCommand) {
        let _ = self.network_tx.send(cmd);
    }

    fn send_all(&self, cmds: Vec<NetworkCommand>) {
        for cmd in cmds {
            self.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Navigation
            UiEvent::SwitchTab(tab) => {
                let cmds = self.state.switch_tab(tab);
                self.send_all(cmds);
            }
            UiEvent::OpenSignup => {
                let cmds = self.state.open_signup();
                self.send_all(cmds);
            }
            UiEvent::OpenQueue => {
                let cmds = self.state.open_queue();
                self.send_all(cmds);
            }
            UiEvent::Back => {
                let cmds = self.state.back();
                self.send_all(cmds);
            }

            // List selection
            UiEvent::SelectNext => self.state.select_next(),
            UiEvent::SelectPrev => self.state.select_prev(),
            UiEvent::Activate => {
                if let Some(cmd) = self.state.activate() {
                    self.send(cmd);
                }
            }

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),
            UiEvent::Submit => {
                if let Some(cmd) = self.state.submit() {
                    self.send(cmd);
                }
            }

            // Actions
            UiEvent::Refresh => {
                let cmds = self.state.refresh();
                self.send_all(cmds);
            }
            UiEvent::CancelItem => {
                if let Some(cmd) = self.state.cancel_item() {
                    self.send(cmd);
                }
            }
            UiEvent::RemoveItem => {
                if let Some(cmd) = self.state.remove_item() {
                    self.send(cmd);
                }
            }
            UiEvent::ClearQueue => self.state.clear_queue(),
            UiEvent::DeleteUser => self.state.delete_user(),
            UiEvent::DeleteImage => self.state.delete_image(),
            UiEvent::Logout => {
                let cmds = self.state.logout();
                self.send_all(cmds);
            }

            // Dialogs
            UiEvent::Confirm => {
                if let Some(cmd) = self.state.confirm_dialog() {
                    self.send(cmd);
                }
            }
            UiEvent::Dismiss => self.state.dismiss(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::network::Query;
    use crate::messages::ui_events::Screen;
    use crate::models::{Id, Role, Session};

    fn config() -> Config {
        Config {
            queue_poll_ms: 2_000,
            progress_poll_ms: 1_000,
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_screen_drives_poller() {
        let (network_tx, mut network_rx) = mpsc::unbounded_channel();
        let (render_tx, _render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();

        let mut actor = AppActor::new(&config(), network_tx, render_tx);
        actor.state.session = Some(Session {
            role: Role::Regular,
            user_id: Some(Id::Num(7)),
        });
        actor.state.navigate(Screen::Main(Default::default()));
        let task = tokio::spawn(actor.run(ui_rx, net_rx));

        ui_tx.send(UiEvent::OpenQueue).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // immediate fetch on entering the screen
        let first = network_rx.try_recv().unwrap();
        assert!(matches!(
            first,
            NetworkCommand::Fetch { query: Query::Queue(Id::Num(7)), .. }
        ));

        tokio::time::sleep(Duration::from_millis(2_050)).await;
        let mut queue_polls = 0;
        while let Ok(cmd) = network_rx.try_recv() {
            if matches!(cmd, NetworkCommand::Fetch { query: Query::Queue(_), .. }) {
                queue_polls += 1;
            }
        }
        assert_eq!(queue_polls, 1);

        // leaving the screen stops polling
        ui_tx.send(UiEvent::Back).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(network_rx.try_recv().is_err());

        ui_tx.send(UiEvent::Quit).unwrap();
        task.await.unwrap();
        assert_eq!(network_rx.try_recv().ok(), Some(NetworkCommand::Shutdown));
    }
}
