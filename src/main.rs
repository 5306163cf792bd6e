//! Imagine TUI - terminal client for an image-generation backend
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution

use std::io;
use std::time::Duration;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use tokio::sync::mpsc;

use imagine_tui::app::form::Form;
use imagine_tui::app::AppActor;
use imagine_tui::config::Config;
use imagine_tui::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use imagine_tui::messages::ui_events::{key_to_ui_event, InputMode, MainTab, Screen};
use imagine_tui::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use imagine_tui::models::{format_timestamp, resolve_image_url, GalleryImage, QueueStatus};
use imagine_tui::network::{ApiClient, NetworkActor};
use imagine_tui::ui::{centered_rect, progress_label, render_input, render_tabs, status_color};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging to file
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(base_url = %config.base_url(), "{} {} starting", APP_NAME, APP_VERSION);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(ApiClient::new(&config), net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(&config, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("shutting down");
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(key, &current_state) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Title / tab bar
            Constraint::Min(0),     // Content
            Constraint::Length(1),  // Status bar
        ])
        .split(area);

    draw_title_bar(f, state, main_chunks[0]);

    match state.screen {
        Screen::Login => draw_form_screen(f, state, &state.login, " Sign In ", main_chunks[1]),
        Screen::Signup => draw_form_screen(f, state, &state.signup, " Create Account ", main_chunks[1]),
        Screen::Main(MainTab::Generate) => draw_generate_tab(f, state, main_chunks[1]),
        Screen::Main(MainTab::Gallery) => draw_gallery_tab(f, state, main_chunks[1]),
        Screen::Main(MainTab::Account) => draw_account_tab(f, state, main_chunks[1]),
        Screen::Queue => draw_queue(f, state, main_chunks[1]),
        Screen::Admin => draw_admin(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    // Popups
    if let Some(confirm) = &state.confirm {
        draw_popup(
            f,
            area,
            confirm.title(),
            &format!("{}\n\n[y] Yes   [n] No", confirm.question()),
            Color::Red,
        );
    }

    if let Some(notice) = &state.notice {
        draw_popup(
            f,
            area,
            &notice.title,
            &format!("{}\n\nPress any key to close", notice.message),
            Color::Cyan,
        );
    }
}

fn draw_title_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    match state.screen {
        Screen::Main(tab) => {
            let tabs = render_tabs(&[" 1:Generate ", " 2:Gallery ", " 3:Account "], tab.index());
            f.render_widget(tabs, area);
        }
        screen => {
            let title = match screen {
                Screen::Queue => "Generation Queue",
                Screen::Admin => "Admin Dashboard",
                _ => APP_NAME,
            };
            let line = Line::from(vec![
                Span::styled(format!(" {} ", title), Style::default().fg(Color::Black).bg(Color::Cyan).bold()),
                Span::styled(format!(" {}", state.base_url), Style::default().fg(Color::DarkGray)),
            ]);
            f.render_widget(Paragraph::new(line), area);
        }
    }
}

/// Render each field of a form stacked vertically, placing the cursor in
/// the focused one while editing
fn draw_fields(f: &mut Frame, form: &Form, editing: bool, area: Rect) {
    let mut constraints: Vec<Constraint> = form.fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        f.render_widget(render_input(field, focused, editing), chunks[i]);

        if focused && editing {
            let max_x = chunks[i].x + chunks[i].width.saturating_sub(2);
            let cursor_x = (chunks[i].x + field.cursor_column() as u16 + 1).min(max_x);
            f.set_cursor_position(Position::new(cursor_x, chunks[i].y + 1));
        }
    }
}

fn draw_form_screen(f: &mut Frame, state: &RenderState, form: &Form, title: &str, area: Rect) {
    let height = form.fields.len() as u16 * 3 + 4;
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let box_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(outer[1])[1];

    let title = if state.busy { format!("{}[...] ", title) } else { title.to_string() };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(box_area);
    f.render_widget(block, box_area);

    draw_fields(f, form, true, inner);
}

fn draw_generate_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let editing = state.input_mode == InputMode::Editing;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    draw_fields(f, &state.prompt, editing, chunks[0]);

    let status = if state.busy {
        Span::styled(" Queuing...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" s: generate   p: view queue", Style::default().fg(Color::DarkGray))
    };
    f.render_widget(Paragraph::new(Line::from(status)), chunks[1]);
}

fn image_lines<'a>(image: &'a GalleryImage, base_url: &str) -> Vec<Line<'a>> {
    let when = image.timestamp.as_deref().map(format_timestamp).unwrap_or_default();
    vec![
        Line::from(vec![
            Span::styled(image.prompt.as_str(), Style::default().bold()),
            Span::styled(format!("  {}", when), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            format!("  {}", resolve_image_url(base_url, &image.image_url)),
            Style::default().fg(Color::Blue),
        )),
    ]
}

fn draw_image_list(f: &mut Frame, images: &[GalleryImage], selected: usize, base_url: &str, title: String, area: Rect) {
    let items: Vec<ListItem> = images
        .iter()
        .map(|img| ListItem::new(image_lines(img, base_url)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !images.is_empty() {
        list_state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_gallery_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let gallery = &state.gallery;
    if gallery.loading && gallery.images.is_empty() {
        let p = Paragraph::new("Loading images...")
            .block(Block::default().borders(Borders::ALL).title(" Gallery "));
        f.render_widget(p, area);
        return;
    }
    if gallery.images.is_empty() {
        let p = Paragraph::new("No images yet. Generate something first.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Gallery "));
        f.render_widget(p, area);
        return;
    }

    let title = format!(" Gallery ({}) ", gallery.images.len());
    draw_image_list(f, &gallery.images, gallery.selected, &state.base_url, title, area);
}

fn draw_account_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Account ");

    let lines = match &state.account.info {
        Some(user) => vec![
            Line::from(Span::styled(
                format!("Welcome, {}!", user.username),
                Style::default().fg(Color::Cyan).bold(),
            )),
            Line::from(""),
            Line::from(format!("Email:        {}", user.email.as_deref().unwrap_or("-"))),
            Line::from(format!("Joined:       {}", user.joined_date())),
            Line::from(format!("Generations:  {}", user.total_images.unwrap_or(0))),
        ],
        None => vec![Line::from(Span::styled(
            "Loading account...",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn draw_queue(f: &mut Frame, state: &RenderState, area: Rect) {
    let queue = &state.queue;
    let title = if queue.refreshing { " Queue [refreshing] " } else { " Queue " };
    let block = Block::default().borders(Borders::ALL).title(title);

    if queue.loading && queue.items.is_empty() {
        f.render_widget(Paragraph::new("Loading queue...").block(block), area);
        return;
    }
    if queue.items.is_empty() {
        let p = Paragraph::new("Your queue is empty.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = queue
        .items
        .iter()
        .map(|item| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{:<11}", item.status.as_str()),
                    Style::default().fg(status_color(item.status)).bold(),
                ),
                Span::raw(item.prompt.as_str()),
            ])];
            if item.status == QueueStatus::Processing {
                if let Some(sample) = queue.progress.get(&item.id) {
                    lines.push(Line::from(Span::styled(
                        format!("           {}", progress_label(sample)),
                        Style::default().fg(Color::Cyan),
                    )));
                }
            }
            if let Some(url) = &item.image_url {
                lines.push(Line::from(Span::styled(
                    format!("           {}", resolve_image_url(&state.base_url, url)),
                    Style::default().fg(Color::Blue),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(queue.selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_admin(f: &mut Frame, state: &RenderState, area: Rect) {
    let admin = &state.admin;

    if let Some(detail) = &admin.detail {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);

        let info = &detail.info;
        let lines = vec![
            Line::from(Span::styled(info.username.as_str(), Style::default().bold())),
            Line::from(format!("Email: {}", info.email.as_deref().unwrap_or("-"))),
            Line::from(format!("Joined: {}", info.joined_date())),
        ];
        let header = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(format!(" User {} ", detail.user_id)));
        f.render_widget(header, chunks[0]);

        let title = format!(" Images ({}) ", detail.images.len());
        draw_image_list(f, &detail.images, detail.selected_image, &state.base_url, title, chunks[1]);
        return;
    }

    let title = if admin.loading { " Users [...] " } else { " Users " };
    let items: Vec<ListItem> = admin
        .users
        .iter()
        .map(|user| {
            let id = user.id.as_ref().map(|i| i.to_string()).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>5}  ", id), Style::default().fg(Color::DarkGray)),
                Span::styled(user.username.as_str(), Style::default().bold()),
                Span::raw(format!("  {}", user.email.as_deref().unwrap_or(""))),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !admin.users.is_empty() {
        list_state.select(Some(admin.selected_user));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = match state.screen {
        Screen::Login => " Enter:sign in | Tab:next field | Ctrl+N:create account | Esc:quit ",
        Screen::Signup => " Enter:sign up | Tab:next field | Esc:back ",
        Screen::Main(_) if state.input_mode == InputMode::Editing => {
            " ESC:stop editing | arrows:move | Tab:next field "
        }
        Screen::Main(MainTab::Generate) => " 1-3:tab | e:edit | s:generate | p:queue | q:quit ",
        Screen::Main(MainTab::Gallery) => " 1-3:tab | ↑/↓:select | r:refresh | q:quit ",
        Screen::Main(MainTab::Account) => " 1-3:tab | r:refresh | l:logout | q:quit ",
        Screen::Queue => " ↑/↓:select | x:cancel | d:remove | c:clear | r:refresh | Esc:back ",
        Screen::Admin if state.admin.detail.is_some() => {
            " ↑/↓:select | x:delete image | d:delete user | r:refresh | Esc:users "
        }
        Screen::Admin => " ↑/↓:select | Enter:open | r:refresh | l/Esc:logout | q:quit ",
    };

    let bar = Paragraph::new(status)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_popup(f: &mut Frame, area: Rect, title: &str, body: &str, color: Color) {
    let popup_area = centered_rect(50, 25, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title))
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}
