use rand::Rng;

use crate::dates;
use crate::models::{ContributionDay, Snapshot, Week};

pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const QUOTES: [&str; 8] = [
    "Commit to excellence every day",
    "Small commits lead to big changes",
    "Consistency is the key to mastery",
    "Build your legacy, one commit at a time",
    "Your code tells your story",
    "Progress over perfection",
    "Every day is a chance to improve",
    "Code with passion, ship with pride",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// One drawing command. The rasterizer replays these in order onto a
/// pixel canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear {
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Color,
        align: Align,
        weight: Weight,
    },
    RoundRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    StrokeRoundRect {
        rect: Rect,
        radius: f32,
        stroke: f32,
        color: Color,
    },
    Glow {
        rect: Rect,
        radius: f32,
        spread: f32,
        color: Color,
    },
}

/// GitHub's heatmap palette.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub accent: Color,
    pub highlight: Color,
    pub levels: [Color; 5],
}

const ACCENT: Color = Color::rgb(0x39, 0xD3, 0x53);
const TODAY_HIGHLIGHT: Color = Color::rgb(0xFF, 0x6B, 0x35);

const LIGHT: Palette = Palette {
    background: Color::rgb(0xFF, 0xFF, 0xFF),
    text: Color::rgb(0x24, 0x29, 0x2F),
    accent: ACCENT,
    highlight: TODAY_HIGHLIGHT,
    levels: [
        Color::rgb(0xEB, 0xED, 0xF0),
        Color::rgb(0x9B, 0xE9, 0xA8),
        Color::rgb(0x40, 0xC4, 0x63),
        Color::rgb(0x30, 0xA1, 0x4E),
        Color::rgb(0x21, 0x6E, 0x39),
    ],
};

const DARK: Palette = Palette {
    background: Color::rgb(0x0D, 0x11, 0x17),
    text: Color::rgb(0xC9, 0xD1, 0xD9),
    accent: ACCENT,
    highlight: TODAY_HIGHLIGHT,
    levels: [
        Color::rgb(0x16, 0x1B, 0x22),
        Color::rgb(0x0E, 0x44, 0x29),
        Color::rgb(0x00, 0x6D, 0x32),
        Color::rgb(0x26, 0xA6, 0x41),
        Color::rgb(0x39, 0xD3, 0x53),
    ],
};

pub fn palette(dark_mode: bool) -> Palette {
    if dark_mode { DARK } else { LIGHT }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub dark_mode: bool,
    pub year: i32,
    pub today: String,
}

impl RenderConfig {
    /// Config anchored to the local clock: current year, current day.
    pub fn new(width: u32, height: u32, dark_mode: bool) -> Self {
        Self {
            width,
            height,
            dark_mode,
            year: dates::current_year(),
            today: dates::today_key(),
        }
    }
}

/// Lays out the whole wallpaper as drawing commands. All positions are
/// fractions of the canvas so any resolution produces the same design.
pub fn render_ops(config: &RenderConfig, snapshot: Option<&Snapshot>) -> Vec<DrawOp> {
    let palette = palette(config.dark_mode);
    let mut ops = vec![DrawOp::Clear {
        color: palette.background,
    }];

    let width = config.width as f32;
    let height = config.height as f32;

    let weeks = match snapshot {
        Some(snapshot) => weeks_in_year(&snapshot.weeks, config.year),
        None => Vec::new(),
    };

    if weeks.is_empty() {
        ops.push(text_op(
            "No contribution data".to_string(),
            width / 2.0,
            height / 2.0,
            width * 0.05,
            palette.text,
            Align::Center,
            Weight::Bold,
        ));
        return ops;
    }

    let center_x = width / 2.0;
    let mut y_pos = height * 0.22;

    let year_total: u32 = weeks
        .iter()
        .flat_map(|week| week.days.iter())
        .map(|day| day.count)
        .sum();
    ops.push(text_op(
        format!("{} contributions in {}", year_total, config.year),
        center_x,
        y_pos,
        width * 0.06,
        palette.accent,
        Align::Center,
        Weight::Bold,
    ));
    y_pos += height * 0.05;

    let quote = QUOTES[rand::thread_rng().gen_range(0..QUOTES.len())];
    let quote_size = width * 0.045;
    match wrap_quote(quote) {
        (line, None) => {
            ops.push(text_op(
                format!("\"{line}\""),
                center_x,
                y_pos,
                quote_size,
                palette.text,
                Align::Center,
                Weight::Regular,
            ));
        }
        (first, Some(second)) => {
            ops.push(text_op(
                format!("\"{first}"),
                center_x,
                y_pos,
                quote_size,
                palette.text,
                Align::Center,
                Weight::Regular,
            ));
            ops.push(text_op(
                format!("{second}\""),
                center_x,
                y_pos + quote_size * 1.2,
                quote_size,
                palette.text,
                Align::Center,
                Weight::Regular,
            ));
        }
    }

    push_grid(&mut ops, config, &palette, &weeks, height * 0.36);
    ops
}

fn push_grid(
    ops: &mut Vec<DrawOp>,
    config: &RenderConfig,
    palette: &Palette,
    weeks: &[Week],
    grid_top: f32,
) {
    let width = config.width as f32;
    let height = config.height as f32;

    let box_padding = width * 0.08;
    let available_width = width - 2.0 * box_padding;
    let available_height = height * 0.45;

    let num_weeks = weeks.len() as f32;
    let cell = (available_width / (num_weeks + 1.0)).min(available_height / 7.0) * 0.85;
    let gap = cell * 0.15;

    let grid_width = num_weeks * cell + (num_weeks - 1.0) * gap;
    let grid_height = 7.0 * cell + 6.0 * gap;

    let day_label_width = cell * 1.2;
    let start_x = (width - grid_width - day_label_width) / 2.0 + day_label_width;

    for (index, label) in DAY_LABELS.iter().enumerate() {
        ops.push(text_op(
            label.to_string(),
            start_x - cell * 1.5,
            grid_top + index as f32 * (cell + gap) + cell * 0.65,
            cell * 0.4,
            palette.text,
            Align::Right,
            Weight::Regular,
        ));
    }

    for (week_index, week) in weeks.iter().enumerate() {
        for (day_index, day) in week.days.iter().enumerate() {
            let rect = Rect {
                x: start_x + week_index as f32 * (cell + gap),
                y: grid_top + day_index as f32 * (cell + gap),
                w: cell,
                h: cell,
            };
            let radius = cell * 0.2;
            let color = palette.levels[day.level.min(4) as usize];

            if day.date == config.today {
                ops.push(DrawOp::Glow {
                    rect,
                    radius,
                    spread: cell * 0.5,
                    color: palette.highlight,
                });
                ops.push(DrawOp::RoundRect { rect, radius, color });
                ops.push(DrawOp::StrokeRoundRect {
                    rect,
                    radius,
                    stroke: cell * 0.12,
                    color: palette.highlight,
                });
            } else {
                ops.push(DrawOp::RoundRect { rect, radius, color });
            }
        }
    }

    let label_y = grid_top + grid_height + cell * 0.8;
    let mut last_month = None;
    for (index, week) in weeks.iter().enumerate() {
        let Some(first) = week.days.first() else {
            continue;
        };
        let Some(month) = dates::month_of_key(&first.date) else {
            continue;
        };
        if last_month != Some(month) {
            ops.push(text_op(
                dates::month_label(month).to_string(),
                start_x + index as f32 * (cell + gap) + cell / 2.0,
                label_y,
                cell * 0.55,
                palette.text,
                Align::Center,
                Weight::Bold,
            ));
            last_month = Some(month);
        }
    }
}

/// Keeps only the weeks and days that fall inside `year`, dropping
/// weeks the filter empties out.
pub fn weeks_in_year(weeks: &[Week], year: i32) -> Vec<Week> {
    let prefix = format!("{year}-");
    weeks
        .iter()
        .filter_map(|week| {
            let days: Vec<ContributionDay> = week
                .days
                .iter()
                .filter(|day| day.date.starts_with(&prefix))
                .cloned()
                .collect();
            if days.is_empty() { None } else { Some(Week { days }) }
        })
        .collect()
}

/// Splits long quotes at the word midpoint so they fit on two lines.
pub fn wrap_quote(quote: &str) -> (String, Option<String>) {
    if quote.len() <= 30 {
        return (quote.to_string(), None);
    }
    let words: Vec<&str> = quote.split_whitespace().collect();
    if words.len() < 2 {
        return (quote.to_string(), None);
    }
    let mid = words.len() / 2;
    (words[..mid].join(" "), Some(words[mid..].join(" ")))
}

fn text_op(
    text: String,
    x: f32,
    y: f32,
    size: f32,
    color: Color,
    align: Align,
    weight: Weight,
) -> DrawOp {
    DrawOp::Text {
        text,
        x,
        y,
        size,
        color,
        align,
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, count: u32, level: u8) -> ContributionDay {
        ContributionDay {
            date: date.to_string(),
            count,
            level,
        }
    }

    fn snapshot(weeks: Vec<Week>) -> Snapshot {
        Snapshot {
            login: "octocat".to_string(),
            total: 999,
            weeks,
            current_streak: 0,
            longest_streak: 0,
            today_count: 0,
            fetched_at: 0,
        }
    }

    fn config() -> RenderConfig {
        RenderConfig {
            width: 1920,
            height: 1080,
            dark_mode: true,
            year: 2026,
            today: "2026-08-22".to_string(),
        }
    }

    fn texts(ops: &[DrawOp]) -> Vec<&str> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn no_snapshot_paints_placeholder() {
        let ops = render_ops(&config(), None);
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], DrawOp::Clear { color } if color == DARK.background));
        assert!(texts(&ops).contains(&"No contribution data"));
    }

    #[test]
    fn other_year_data_paints_placeholder() {
        let weeks = vec![Week {
            days: vec![day("2025-12-31", 5, 3)],
        }];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        assert!(texts(&ops).contains(&"No contribution data"));
    }

    #[test]
    fn header_counts_only_the_render_year() {
        let weeks = vec![
            Week {
                days: vec![day("2025-12-31", 50, 4)],
            },
            Week {
                days: vec![day("2026-08-20", 3, 2), day("2026-08-21", 4, 2)],
            },
        ];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        assert!(texts(&ops).contains(&"7 contributions in 2026"));
    }

    #[test]
    fn one_cell_per_day_in_year() {
        let weeks = vec![
            Week {
                days: vec![day("2026-08-16", 0, 0), day("2026-08-17", 1, 1)],
            },
            Week {
                days: vec![day("2026-08-23", 2, 1)],
            },
        ];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        let cells = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RoundRect { .. }))
            .count();
        assert_eq!(cells, 3);
    }

    #[test]
    fn cells_are_square_and_grid_fits_its_band() {
        let days: Vec<ContributionDay> = (10..=16)
            .map(|d| day(&format!("2026-08-{d}"), 1, 1))
            .collect();
        let weeks = vec![Week { days: days.clone() }, Week { days }];
        let cfg = config();
        let ops = render_ops(&cfg, Some(&snapshot(weeks)));

        let rects: Vec<Rect> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::RoundRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 14);
        let cell = rects[0].w;
        for rect in &rects {
            assert_eq!(rect.w, rect.h);
            assert_eq!(rect.w, cell);
        }

        let grid_height = 7.0 * cell + 6.0 * (cell * 0.15);
        assert!(grid_height <= cfg.height as f32 * 0.45 + 0.001);
    }

    #[test]
    fn today_gets_glow_and_outline() {
        let weeks = vec![Week {
            days: vec![day("2026-08-21", 1, 1), day("2026-08-22", 2, 2)],
        }];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        let glows = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Glow { .. }))
            .count();
        let strokes = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRoundRect { .. }))
            .count();
        assert_eq!(glows, 1);
        assert_eq!(strokes, 1);
        let highlighted = ops.iter().any(
            |op| matches!(op, DrawOp::StrokeRoundRect { color, .. } if *color == TODAY_HIGHLIGHT),
        );
        assert!(highlighted);
    }

    #[test]
    fn month_labels_appear_once_per_month_run() {
        let weeks = vec![
            Week {
                days: vec![day("2026-07-26", 1, 1)],
            },
            Week {
                days: vec![day("2026-08-02", 1, 1)],
            },
            Week {
                days: vec![day("2026-08-09", 1, 1)],
            },
        ];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        let labels: Vec<&str> = texts(&ops)
            .into_iter()
            .filter(|text| ["Jul", "Aug"].contains(text))
            .collect();
        assert_eq!(labels, vec!["Jul", "Aug"]);
    }

    #[test]
    fn seven_day_labels_flank_the_grid() {
        let weeks = vec![Week {
            days: vec![day("2026-08-22", 1, 1)],
        }];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        let right_aligned = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { align: Align::Right, .. }))
            .count();
        assert_eq!(right_aligned, 7);
    }

    #[test]
    fn quote_is_drawn_in_quotation_marks() {
        let weeks = vec![Week {
            days: vec![day("2026-08-22", 1, 1)],
        }];
        let ops = render_ops(&config(), Some(&snapshot(weeks)));
        assert!(texts(&ops).iter().any(|text| text.starts_with('"')));
        assert!(texts(&ops).iter().any(|text| text.ends_with('"')));
    }

    #[test]
    fn short_quote_stays_on_one_line() {
        assert_eq!(wrap_quote("Progress over perfection"), (
            "Progress over perfection".to_string(),
            None,
        ));
    }

    #[test]
    fn long_quote_splits_at_word_midpoint() {
        assert_eq!(wrap_quote("Small commits lead to big changes"), (
            "Small commits lead".to_string(),
            Some("to big changes".to_string()),
        ));
    }

    #[test]
    fn weeks_in_year_drops_foreign_days() {
        let weeks = vec![Week {
            days: vec![day("2025-12-28", 1, 1), day("2026-01-01", 2, 1)],
        }];
        let filtered = weeks_in_year(&weeks, 2026);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].days.len(), 1);
        assert_eq!(filtered[0].days[0].date, "2026-01-01");
    }

    #[test]
    fn palettes_match_github() {
        let light = palette(false);
        let dark = palette(true);
        assert_eq!(light.background, Color::rgb(0xFF, 0xFF, 0xFF));
        assert_eq!(light.levels[0], Color::rgb(0xEB, 0xED, 0xF0));
        assert_eq!(dark.background, Color::rgb(0x0D, 0x11, 0x17));
        assert_eq!(dark.levels[4], Color::rgb(0x39, 0xD3, 0x53));
        assert_eq!(light.accent, dark.accent);
        assert_eq!(dark.highlight, Color::rgb(0xFF, 0x6B, 0x35));
    }
}
