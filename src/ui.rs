use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::leaderboard::truncate_prompt;
use crate::session::{Label, Phase, Position};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, warning_area, prompt_area, responses_area, board_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(app.warnings.len() as u16),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(12),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area);
    render_warnings(app, frame, warning_area);
    render_prompt(app, frame, prompt_area);
    render_responses(app, frame, responses_area);
    render_leaderboard(app, frame, board_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" >A/B ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "compare responses, vote blind, crown a winner ",
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_warnings(app: &App, frame: &mut Frame, area: Rect) {
    if app.warnings.is_empty() {
        return;
    }
    let lines: Vec<Line> = app
        .warnings
        .iter()
        .map(|warning| {
            Line::from(Span::styled(
                format!(" ! {warning}"),
                Style::default().fg(Color::Yellow),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let border_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Cyan),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Prompt ");

    let text = if app.prompt_input.is_empty() && app.input_mode == InputMode::Normal {
        Line::from(Span::styled(
            "Press e to enter a prompt",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(app.prompt_input.as_str())
    };

    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(text).block(block), area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = app
            .prompt_input
            .chars()
            .take(app.prompt_cursor)
            .count() as u16;
        frame.set_cursor_position((inner.x + cursor_x.min(inner.width.saturating_sub(1)), inner.y));
    }
}

fn render_responses(app: &App, frame: &mut Frame, area: Rect) {
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    render_response_panel(app, frame, left_area, Position::Left);
    render_response_panel(app, frame, right_area, Position::Right);
}

fn render_response_panel(app: &App, frame: &mut Frame, area: Rect, position: Position) {
    let (title, vote_key) = match position {
        Position::Left => (" Response Left ", "1"),
        Position::Right => (" Response Right ", "2"),
    };

    let mut block = Block::default().borders(Borders::ALL).title(title);
    if app.session.can_vote() {
        block = block.title_bottom(
            Line::from(vec![
                Span::styled(format!(" {vote_key} "), Style::default().fg(Color::Black).bg(Color::Yellow)),
                Span::raw(" vote for this one "),
            ])
            .right_aligned(),
        );
    }

    let label = app.session.resolve(position);
    let paragraph = match app.session.phase() {
        Phase::Idle => Paragraph::new(Span::styled(
            "Waiting for a prompt...",
            Style::default().fg(Color::DarkGray),
        )),
        Phase::AwaitingResponses => {
            let dots = ".".repeat(app.animation_frame as usize + 1);
            Paragraph::new(Span::styled(
                format!("Thinking{dots}"),
                Style::default().fg(Color::Magenta),
            ))
        }
        Phase::AwaitingVote | Phase::Voted => {
            Paragraph::new(response_lines(app.session.response(label).unwrap_or_default()))
                .wrap(Wrap { trim: false })
                .scroll((app.response_scroll, 0))
        }
    };

    frame.render_widget(paragraph.block(block), area);
}

/// Responses render verbatim; the only concession is painting inline error
/// strings red so a failed slot is obvious next to a real answer.
fn response_lines(text: &str) -> Vec<Line<'_>> {
    let style = if text.starts_with("Error:") {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    text.lines().map(|line| Line::styled(line, style)).collect()
}

fn render_leaderboard(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Leaderboard ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.store.is_none() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Leaderboard disabled: vote store is not configured",
                Style::default().fg(Color::DarkGray),
            )),
            inner,
        );
        return;
    }

    if app.leaderboard.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No votes recorded yet. Be the first to compare and vote!",
                Style::default().fg(Color::DarkGray),
            )),
            inner,
        );
        return;
    }

    let [table_area, gauge_a_area, gauge_b_area, recent_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    render_stats_table(app, frame, table_area);
    render_win_gauge(app, frame, gauge_a_area, Label::A);
    render_win_gauge(app, frame, gauge_b_area, Label::B);
    render_recent_votes(app, frame, recent_area);
}

fn render_stats_table(app: &App, frame: &mut Frame, area: Rect) {
    let header = Line::from(Span::styled(
        format!(
            "{:<32} {:>6} {:>6} {:>9}",
            "Model", "Wins", "Total", "Win Rate"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let mut lines = vec![header];
    for label in [Label::A, Label::B] {
        let stats = app.leaderboard.stats.get(label);
        let model = app.models.get(label);
        lines.push(Line::from(format!(
            "{:<32} {:>6} {:>6} {:>8.1}%",
            model.id,
            stats.wins,
            stats.total,
            stats.win_rate(),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_win_gauge(app: &App, frame: &mut Frame, area: Rect, label: Label) {
    let stats = app.leaderboard.stats.get(label);
    let color = match label {
        Label::A => Color::Red,
        Label::B => Color::Cyan,
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio((stats.win_rate() / 100.0).clamp(0.0, 1.0))
        .label(format!(
            "{} {:.1}%",
            app.models.get(label).display_name,
            stats.win_rate()
        ));
    frame.render_widget(gauge, area);
}

fn render_recent_votes(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        "Recent votes",
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    for vote in &app.leaderboard.recent {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {} ", vote.row_tag(), vote.created_date()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                truncate_prompt(&vote.prompt),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  ->  "),
            Span::styled(vote.outcome_line(), Style::default().fg(Color::Green)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
        InputMode::Normal => {
            let mut spans = vec![
                Span::styled(" e ", key_style),
                Span::styled(" prompt ", label_style),
            ];
            if app.session.can_vote() {
                spans.push(Span::styled(" 1/2 ", key_style));
                spans.push(Span::styled(" vote ", label_style));
            }
            if matches!(app.session.phase(), Phase::AwaitingVote | Phase::Voted) {
                spans.push(Span::styled(" n ", key_style));
                spans.push(Span::styled(" new test ", label_style));
            }
            spans.extend([
                Span::styled(" r ", key_style),
                Span::styled(" refresh ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            spans
        }
    };

    if let Some(status) = &app.status {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(status.text.clone(), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
