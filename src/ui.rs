use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::{App, Mode, SetupField};
use crate::dates;
use crate::models::Snapshot;
use crate::render::DAY_LABELS;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let theme = theme_from(app.dark_mode);
    draw_background(frame, size, &theme);
    draw_dashboard(frame, app, size, &theme);

    match app.mode {
        Mode::Loading => draw_overlay(
            frame,
            size,
            "Fetching contributions from GitHub...",
            &theme,
        ),
        Mode::Error => draw_overlay(
            frame,
            size,
            app.status.as_deref().unwrap_or("Unknown error"),
            &theme,
        ),
        Mode::Setup => draw_setup(frame, app, size, &theme),
        Mode::Dashboard => {}
    }

    if matches!(app.mode, Mode::Dashboard) && !app.show_help {
        if let Some(toast) = app.active_toast() {
            draw_toast(frame, size, &toast.message, toast.is_error, &theme);
        }
    }

    if app.show_help {
        draw_help(frame, size, &theme);
    }
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let content = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .split(content);

    let header = header_line(app, theme);
    let header_block = Paragraph::new(header)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(header_block, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    let stats = Paragraph::new(stat_lines(app, theme))
        .alignment(Alignment::Left)
        .block(panel_block("Streaks", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(stats, body[0]);

    let heatmap_width = body[1].width.saturating_sub(2) as usize;
    let heatmap = Paragraph::new(heatmap_lines(app.snapshot.as_ref(), heatmap_width, theme))
        .alignment(Alignment::Left)
        .block(panel_block("Contributions", theme));
    frame.render_widget(heatmap, body[1]);

    let footer = footer_line(app, theme);
    let footer_block = Paragraph::new(footer)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(footer_block, chunks[2]);
}

fn header_line(app: &App, theme: &Theme) -> Line<'static> {
    let login = app
        .snapshot
        .as_ref()
        .map(|snapshot| snapshot.login.clone())
        .unwrap_or_else(|| "Not set".to_string());
    let last_refresh = app
        .last_refresh
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string());
    let mut spans = vec![
        Span::styled("Streakwall", theme.title_style()),
        Span::raw("  "),
        Span::styled("User", theme.muted_style()),
        Span::raw(": "),
        Span::styled(login, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("Last refresh", theme.muted_style()),
        Span::raw(": "),
        Span::raw(last_refresh),
    ];
    if app.stale {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "(cached)",
            Style::default().fg(theme.highlight),
        ));
    }
    Line::from(spans)
}

fn stat_lines(app: &App, theme: &Theme) -> Vec<Line<'static>> {
    let snapshot = match app.snapshot.as_ref() {
        Some(snapshot) => snapshot,
        None => {
            return vec![
                Line::from("No contribution data."),
                Line::from(""),
                Line::from(Span::styled("Press r to fetch.", theme.muted_style())),
            ];
        }
    };

    let streak_style = if snapshot.current_streak > 0 {
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);

    vec![
        stat_line("Current streak", days_label(snapshot.current_streak), streak_style, theme),
        stat_line("Longest streak", days_label(snapshot.longest_streak), bold, theme),
        stat_line("Today", snapshot.today_count.to_string(), bold, theme),
        stat_line("Last year", snapshot.total.to_string(), bold, theme),
    ]
}

fn stat_line(label: &str, value: String, value_style: Style, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<16}", label), theme.muted_style()),
        Span::styled(value, value_style),
    ])
}

fn days_label(count: u32) -> String {
    if count == 1 {
        "1 day".to_string()
    } else {
        format!("{count} days")
    }
}

fn heatmap_lines(snapshot: Option<&Snapshot>, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let weeks = match snapshot {
        Some(snapshot) if !snapshot.weeks.is_empty() => &snapshot.weeks,
        _ => return vec![Line::from("No contribution data")],
    };

    let gutter = 4;
    let per_week = 3;
    let max_weeks = (width.saturating_sub(gutter) / per_week).max(1);
    let start = weeks.len().saturating_sub(max_weeks);
    let visible = &weeks[start..];
    let today = dates::today_key();

    let mut lines = Vec::new();

    let mut month_spans = vec![Span::raw(" ".repeat(gutter))];
    let mut last_month = "";
    for week in visible {
        let label = week
            .days
            .first()
            .and_then(|day| dates::month_of_key(&day.date))
            .map(dates::month_label)
            .unwrap_or("");
        if !label.is_empty() && label != last_month {
            month_spans.push(Span::styled(
                format!("{:<width$}", label, width = per_week),
                theme.muted_style(),
            ));
            last_month = label;
        } else {
            month_spans.push(Span::raw(" ".repeat(per_week)));
        }
    }
    lines.push(Line::from(month_spans));

    for row in 0..7 {
        let label = match row {
            1 | 3 | 5 => DAY_LABELS[row],
            _ => "",
        };
        let mut spans = vec![Span::styled(
            format!("{:<width$}", label, width = gutter),
            theme.muted_style(),
        )];
        for week in visible {
            let span = match week.days.get(row) {
                Some(day) => {
                    let color = if day.date == today {
                        theme.highlight
                    } else {
                        theme.levels[day.level.min(4) as usize]
                    };
                    Span::styled("██ ", Style::default().fg(color))
                }
                None => Span::raw("   "),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    lines
}

fn footer_line(app: &App, theme: &Theme) -> Line<'static> {
    let status = app.status.clone().unwrap_or_default();
    Line::from(vec![
        Span::styled("r refresh", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("w wallpaper", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("m theme", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("c copy", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("e setup", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("h help", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("q quit", theme.muted_style()),
        if status.is_empty() {
            Span::raw("")
        } else {
            Span::raw(format!("   |   {}", status))
        },
    ])
}

fn draw_overlay(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let block = centered_rect(60, 20, area);
    frame.render_widget(Clear, block);
    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(panel_block("Status", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_setup(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = centered_rect(70, 45, area);
    frame.render_widget(Clear, block);

    let login_value = if matches!(app.setup_field, SetupField::Login) {
        Span::styled(app.login_input.clone(), Style::default().fg(theme.accent))
    } else {
        Span::raw(app.login_input.clone())
    };
    let token_value = if matches!(app.setup_field, SetupField::Token) {
        Span::styled(app.token_input.clone(), Style::default().fg(theme.accent))
    } else {
        Span::raw(mask_token(&app.token_input))
    };

    let mut lines = vec![
        Line::from("Connect your GitHub account"),
        Line::from("Create a token at https://github.com/settings/tokens (read:user scope)"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", Style::default().add_modifier(Modifier::BOLD)),
            login_value,
        ]),
        Line::from(vec![
            Span::styled("Token:    ", Style::default().add_modifier(Modifier::BOLD)),
            token_value,
        ]),
        Line::from(""),
        Line::from("Tab to switch field • Enter save • Esc cancel"),
    ];

    if let Some(status) = &app.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(theme.error),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(panel_block("Setup", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    vertical[1]
}

fn toast_rect(message: &str, area: Rect) -> Option<Rect> {
    let max_width = area.width.saturating_sub(2);
    if max_width < 20 || area.height < 3 {
        return None;
    }
    let width = (message.len() as u16 + 6).clamp(20, max_width);
    let height = 3;
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + area.height.saturating_sub(height + 4);
    Some(Rect::new(x, y, width, height))
}

fn draw_toast(frame: &mut Frame, area: Rect, message: &str, is_error: bool, theme: &Theme) {
    let rect = match toast_rect(message, area) {
        Some(rect) => rect,
        None => return,
    };

    frame.render_widget(Clear, rect);
    let style = if is_error {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message, style)))
        .alignment(Alignment::Center)
        .block(panel_block("Notice", theme));
    frame.render_widget(paragraph, rect);
}

fn draw_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = centered_rect(60, 55, area);
    frame.render_widget(Clear, block);

    let header_style = Style::default().add_modifier(Modifier::BOLD).fg(theme.accent);
    let key_style = Style::default().fg(theme.highlight);

    let rows = vec![
        Row::new(vec![
            Cell::from(Span::styled("Dashboard", header_style)),
            Cell::from(""),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("r", key_style)),
            Cell::from("Refresh contributions"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("w", key_style)),
            Cell::from("Write the wallpaper image"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("m", key_style)),
            Cell::from("Toggle light/dark theme"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("c", key_style)),
            Cell::from("Copy stats to clipboard"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("e", key_style)),
            Cell::from("Edit username and token"),
        ]),
        Row::new(vec![Cell::from(""), Cell::from("")]),
        Row::new(vec![
            Cell::from(Span::styled("Setup", header_style)),
            Cell::from(""),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("Tab", key_style)),
            Cell::from("Switch field"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("Enter", key_style)),
            Cell::from("Save and refresh"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("Esc", key_style)),
            Cell::from("Back to dashboard"),
        ]),
        Row::new(vec![Cell::from(""), Cell::from("")]),
        Row::new(vec![
            Cell::from(Span::styled("General", header_style)),
            Cell::from(""),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("h / Esc", key_style)),
            Cell::from("Close help"),
        ]),
        Row::new(vec![
            Cell::from(Span::styled("q", key_style)),
            Cell::from("Quit"),
        ]),
    ];

    let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
        .block(panel_block("Help", theme))
        .column_spacing(2);

    frame.render_widget(table, block);
}

fn draw_background(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default().style(Style::default().bg(theme.bg).fg(theme.text));
    frame.render_widget(block, area);
}

fn panel_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
        .style(theme.panel_style())
        .title(Line::from(Span::styled(
            format!(" {} ", title),
            theme.title_style(),
        )))
}

fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "Not set".to_string();
    }
    let len = token.chars().count();
    if len <= 4 {
        return "••••".to_string();
    }
    let tail: String = token.chars().skip(len - 4).collect();
    format!("••••{tail}")
}

#[derive(Clone, Copy)]
struct Theme {
    bg: Color,
    panel: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    highlight: Color,
    success: Color,
    error: Color,
    levels: [Color; 5],
}

impl Theme {
    fn panel_style(&self) -> Style {
        Style::default().bg(self.panel).fg(self.text)
    }

    fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

fn theme_from(dark_mode: bool) -> Theme {
    if dark_mode {
        Theme {
            bg: Color::Rgb(13, 17, 23),
            panel: Color::Rgb(22, 27, 34),
            border: Color::Rgb(48, 54, 61),
            text: Color::Rgb(201, 209, 217),
            muted: Color::Rgb(139, 148, 158),
            accent: Color::Rgb(57, 211, 83),
            highlight: Color::Rgb(255, 107, 53),
            success: Color::Rgb(63, 185, 80),
            error: Color::Rgb(248, 81, 73),
            levels: [
                Color::Rgb(22, 27, 34),
                Color::Rgb(14, 68, 41),
                Color::Rgb(0, 109, 50),
                Color::Rgb(38, 166, 65),
                Color::Rgb(57, 211, 83),
            ],
        }
    } else {
        Theme {
            bg: Color::Rgb(255, 255, 255),
            panel: Color::Rgb(246, 248, 250),
            border: Color::Rgb(208, 215, 222),
            text: Color::Rgb(36, 41, 47),
            muted: Color::Rgb(87, 96, 106),
            accent: Color::Rgb(26, 127, 55),
            highlight: Color::Rgb(255, 107, 53),
            success: Color::Rgb(26, 127, 55),
            error: Color::Rgb(207, 34, 46),
            levels: [
                Color::Rgb(235, 237, 240),
                Color::Rgb(155, 233, 168),
                Color::Rgb(64, 196, 99),
                Color::Rgb(48, 161, 78),
                Color::Rgb(33, 110, 57),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_sits_bottom_right() {
        let rect = toast_rect("Saved.", Rect::new(0, 0, 80, 24)).unwrap();
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 3);
        assert_eq!(rect.x, 59);
        assert_eq!(rect.y, 17);
    }

    #[test]
    fn long_toast_is_clamped_inside_the_area() {
        let area = Rect::new(0, 0, 40, 24);
        let rect = toast_rect(&"x".repeat(100), area).unwrap();
        assert_eq!(rect.width, 38);
        assert_eq!(rect.x, 1);
    }

    #[test]
    fn cramped_terminal_skips_the_toast() {
        assert_eq!(toast_rect("Saved.", Rect::new(0, 0, 21, 24)), None);
        assert_eq!(toast_rect("Saved.", Rect::new(0, 0, 80, 2)), None);
        assert!(toast_rect("Saved.", Rect::new(0, 0, 22, 24)).is_some());
    }
}
