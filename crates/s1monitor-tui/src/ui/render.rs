use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Log pane
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_log_pane(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_log_pane(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.scroll > 0 {
        format!(" Log (+{}) ", app.scroll)
    } else {
        " Log ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .title(Span::styled(title, styles::title_style()));

    let height = block.inner(area).height as usize;
    let lines: Vec<Line> = app
        .visible_logs(height)
        .into_iter()
        .map(|l| Line::styled(l, styles::log_line_style()))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let indicator = app.login_indicator();
    let hint = " [q]uit ";

    let spans = vec![
        Span::raw(" Status: "),
        Span::styled(app.status.label(), styles::title_style()),
        Span::styled(" | ", styles::muted_style()),
        Span::raw("Login: "),
        Span::styled(indicator.label(), styles::login_style(indicator)),
        Span::styled(" | ", styles::muted_style()),
        Span::raw(format!("User: {}", app.username)),
        Span::styled(" | ", styles::muted_style()),
        Span::raw(app.status_time()),
    ];

    let used: usize = spans.iter().map(|s| s.width()).sum();
    let padding = (area.width as usize).saturating_sub(used + hint.len());

    let mut spans = spans;
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(hint, styles::muted_style()));

    let paragraph = Paragraph::new(Line::from(spans)).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}
