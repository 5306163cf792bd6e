use ratatui::{prelude::*, widgets::*};

use crate::app::form::TextField;
use crate::models::{format_seconds, ProgressSample, QueueStatus};

/// Renders a text input field, highlighted while focused
pub fn render_input<'a>(field: &'a TextField, is_focused: bool, editing: bool) -> Paragraph<'a> {
    let style = if is_focused && editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(format!(" {} ", field.label));

    Paragraph::new(field.display()).block(block)
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Queue status color
pub fn status_color(status: QueueStatus) -> Color {
    match status {
        QueueStatus::Queued => Color::Yellow,
        QueueStatus::Processing => Color::Cyan,
        QueueStatus::Done => Color::Green,
        QueueStatus::Cancelled => Color::Red,
        QueueStatus::Unknown => Color::DarkGray,
    }
}

/// Text bar of `width` cells, e.g. `[=====     ]`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "=".repeat(filled), " ".repeat(width - filled))
}

/// One-line readout shown under a processing item
pub fn progress_label(sample: &ProgressSample) -> String {
    format!(
        "{} {:.0}% | ETA: {} | Time: {}",
        progress_bar(sample.percent(), 20),
        sample.percent(),
        format_seconds(sample.eta),
        format_seconds(sample.time_taken)
    )
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 4), "[    ]");
        assert_eq!(progress_bar(50.0, 4), "[==  ]");
        assert_eq!(progress_bar(250.0, 4), "[====]");
    }

    #[test]
    fn test_progress_label() {
        let sample = ProgressSample::new(42.4, Some(125.0), None);
        let label = progress_label(&sample);
        assert!(label.ends_with("42% | ETA: 2:05 | Time: ..."));
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 20, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 10);
        assert!(inner.x >= outer.x && inner.y >= outer.y);
    }
}
