//! Dashboard loop and frame rendering

use crate::bar::{render_bar, BarCell};
use crate::fetch::FetchState;
use crate::glide::{format_reset_time, format_updated_ago, glide_slope};
use crate::input::{self, FocusParser, Step};
use crate::sched::{refresh_due, RefreshPolicy};
use crate::theme::{Theme, ThemeColors};
use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;
use std::io;
use std::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Sole suspension point of the loop: wait this long for one byte
const POLL_TIMEOUT: Duration = Duration::from_secs(1);

const MARGIN: u16 = 2;
const MARKER_CHAR: &str = "|";
const CTRL_C: u8 = 0x03;

pub struct App {
    theme: Theme,
    fetch: FetchState,
    parser: FocusParser,
    policy: RefreshPolicy,
    has_focus: bool,
    exit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            theme: Theme,
            fetch: FetchState::new(),
            parser: FocusParser::new(),
            policy: RefreshPolicy::default(),
            // Assume focused until the terminal reports otherwise
            has_focus: true,
            exit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> io::Result<()> {
        // Initial fetch before the first frame
        self.fetch.refresh();

        while !self.exit {
            terminal.draw(|frame| self.render(frame))?;

            let now = Instant::now();
            match input::poll_byte(POLL_TIMEOUT)? {
                Some(byte) => match self.parser.feed(byte, now) {
                    Step::Focus(focused) => self.has_focus = focused,
                    Step::Key(key) => self.handle_key(key),
                    Step::None => {}
                },
                None => self.parser.expire(now),
            }
            if self.exit {
                break;
            }

            if refresh_due(&self.fetch, self.has_focus, Instant::now(), &self.policy) {
                self.fetch.refresh();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: u8) {
        match key {
            b'q' | b'Q' | CTRL_C => self.exit = true,
            b'r' | b'R' => self.fetch.refresh(),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let colors = self.theme.colors();
        let area = frame.area();

        if area.height < 3 || area.width < 20 {
            frame.render_widget(
                Paragraph::new("Terminal too small").style(Style::default().fg(colors.text_primary)),
                area,
            );
            return;
        }

        let content_width = area.width - MARGIN * 2;
        let mut row: u16 = 0;

        // Header
        let title = "Claude Usage Monitor";
        draw_text(
            frame,
            area,
            MARGIN,
            row,
            title,
            Style::default().fg(colors.title).add_modifier(Modifier::BOLD),
        );
        let updated = format_updated_ago(self.fetch.last_success);
        if (updated.len() as u16) < content_width.saturating_sub(title.len() as u16 + 2) {
            draw_text(
                frame,
                area,
                area.width - MARGIN - updated.len() as u16,
                row,
                &updated,
                Style::default().fg(colors.text_primary),
            );
        }
        row += 2;

        // Error message from the most recent attempt
        if let Some(err) = &self.fetch.error {
            let message = err.to_string();
            let display = truncate_to_width(&message, content_width as usize);
            draw_text(
                frame,
                area,
                MARGIN,
                row,
                &display,
                Style::default().fg(colors.error),
            );
            row += 2;
        }

        if self.fetch.categories.is_empty() && self.fetch.error.is_none() {
            draw_text(
                frame,
                area,
                MARGIN,
                row,
                "No usage data available",
                Style::default().fg(colors.text_primary),
            );
            row += 1;
        }

        let now = Utc::now();
        for cat in &self.fetch.categories {
            if row + 3 >= area.height.saturating_sub(2) {
                break;
            }

            let usage = cat.utilization;
            let glide = glide_slope(cat.resets_at, cat.window_seconds, now);

            // Line 1: name and usage %
            draw_text(
                frame,
                area,
                MARGIN,
                row,
                &cat.name,
                Style::default()
                    .fg(colors.text_primary)
                    .add_modifier(Modifier::BOLD),
            );
            let usage_str = format!("{:.0}% used", usage);
            if (usage_str.len() as u16) < content_width.saturating_sub(cat.name.width() as u16) {
                draw_text(
                    frame,
                    area,
                    area.width - MARGIN - usage_str.len() as u16,
                    row,
                    &usage_str,
                    Style::default().fg(colors.text_primary),
                );
            }
            row += 1;

            // Line 2: reset time
            if let Some(reset_str) = format_reset_time(cat.resets_at, now) {
                draw_text(
                    frame,
                    area,
                    MARGIN,
                    row,
                    &reset_str,
                    Style::default().fg(colors.text_muted),
                );
            }
            row += 1;

            // Line 3: bar
            let cells = render_bar(content_width, usage, glide);
            if !cells.is_empty() {
                frame.render_widget(
                    Paragraph::new(bar_line(&cells, &colors)),
                    Rect::new(MARGIN, row, content_width, 1),
                );
            }
            row += 2;
        }

        // Footer
        let footer = "q: quit  r: refresh";
        let footer_row = area.height - 1;
        if footer_row > row {
            let footer_x = area.width.saturating_sub(MARGIN + footer.len() as u16);
            if footer_x >= MARGIN {
                draw_text(
                    frame,
                    area,
                    footer_x,
                    footer_row,
                    footer,
                    Style::default().fg(colors.text_muted),
                );
            }
        }
    }
}

/// Draw one run of text at a cell position, clipped to the grid.
/// Out-of-bounds writes are dropped rather than wrapped or crashed.
fn draw_text(frame: &mut Frame, area: Rect, x: u16, y: u16, text: &str, style: Style) {
    if y >= area.height || x >= area.width {
        return;
    }
    let width = (text.width() as u16).min(area.width - x);
    if width == 0 {
        return;
    }
    frame.render_widget(
        Paragraph::new(Span::styled(text.to_string(), style)),
        Rect::new(x, y, width, 1),
    );
}

/// Map bar cells to styled spans, grouping runs of identical cells
fn bar_line(cells: &[BarCell], colors: &ThemeColors) -> Line<'static> {
    let style_for = |cell: BarCell| match cell {
        BarCell::Fill => Style::default().fg(colors.bar_fill_fg).bg(colors.bar_fill_bg),
        BarCell::OverFill => Style::default().fg(colors.bar_over_fg).bg(colors.bar_over_bg),
        BarCell::Empty => Style::default().bg(colors.bar_empty_bg),
        BarCell::MarkerOnFill => Style::default()
            .fg(colors.marker_fg)
            .bg(colors.bar_fill_bg)
            .add_modifier(Modifier::BOLD),
        BarCell::MarkerOnEmpty => Style::default()
            .fg(colors.marker_fg)
            .bg(colors.bar_empty_bg)
            .add_modifier(Modifier::BOLD),
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        let cell = cells[i];
        let mut run = 1;
        while i + run < cells.len() && cells[i + run] == cell {
            run += 1;
        }
        let text = if cell.is_marker() {
            MARKER_CHAR.to_string()
        } else {
            " ".repeat(run)
        };
        spans.push(Span::styled(text, style_for(cell)));
        i += run;
    }
    Line::from(spans)
}

/// Truncate to a display width without breaking UTF-8.
/// Returns Cow to avoid allocation when no truncation is needed.
fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    let mut width = 0;
    for (idx, ch) in s.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            return Cow::Owned(s[..idx].to_string());
        }
        width += w;
    }
    Cow::Borrowed(s)
}
