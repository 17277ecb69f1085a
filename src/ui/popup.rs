//! Popup overlays: the settings menu and the key-binding editor.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::settings::SETTINGS_ITEMS;
use crate::app::state::AppState;
use crate::config::{Action, AppConfig};

const SETTINGS_WIDTH: u16 = 44;
const CONTROLS_WIDTH: u16 = 52;

/// Settings menu overlay.  Values are read live from `state`.
pub struct SettingsPopup<'a> {
    pub state: &'a AppState,
}

impl Widget for SettingsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(SETTINGS_WIDTH, SETTINGS_ITEMS.len() as u16 + 5, area);
        let inner = open_frame(" Settings ", popup, buf);
        let selected = self.state.settings_selected;

        let mut lines = vec![Line::raw("")];
        lines.extend(SETTINGS_ITEMS.iter().enumerate().map(|(i, item)| {
            let value = item.value_text(self.state);
            let value_style = match value.as_str() {
                "[ON]" => Style::default().fg(Color::Green),
                "[OFF]" => Style::default().fg(Color::DarkGray),
                _ => Style::default().fg(Color::Yellow),
            };
            menu_row(item.label(), &value, inner.width, i == selected, value_style)
        }));
        lines.push(hint("  Enter/Space: change  Esc: close"));

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Key-binding editor overlay.  The row after the last action resets all
/// bindings.
pub struct ControlsPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
}

impl Widget for ControlsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(CONTROLS_WIDTH, Action::ALL.len() as u16 + 7, area);
        let inner = open_frame(" Controls ", popup, buf);

        let mut lines = vec![Line::raw("")];
        for (i, &action) in Action::ALL.iter().enumerate() {
            let selected = i == self.selected;
            let keys = if selected && self.awaiting_rebind {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };
            let mut key_style = Style::default().fg(Color::Yellow);
            if selected && self.awaiting_rebind {
                key_style = key_style.add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK);
            }
            lines.push(menu_row(action.label(), &keys, inner.width, selected, key_style));
        }
        lines.push(Line::raw(""));
        lines.push(menu_row(
            "⟳ Reset to defaults",
            "",
            inner.width,
            self.selected == Action::ALL.len(),
            Style::default(),
        ));
        lines.push(hint("  Enter: add key  Del: clear  Esc: back"));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ── helpers ─────────────────────────────────────────────────────

/// Clear `popup`, draw its border and return the inside.
fn open_frame(title: &'static str, popup: Rect, buf: &mut Buffer) -> Rect {
    Clear.render(popup, buf);
    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(popup);
    block.render(popup, buf);
    inner
}

/// `label` on the left, `value` flush right, highlighted when selected.
fn menu_row<'a>(label: &str, value: &str, width: u16, selected: bool, value_style: Style) -> Line<'a> {
    let (marker, base) = if selected {
        (
            " ▸ ",
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("   ", Style::default().fg(Color::White))
    };
    let left = format!("{marker}{label}");
    let room = usize::from(width).saturating_sub(left.chars().count() + 1);
    let right = format!("{value:>room$} ");
    let value_style = if selected { value_style.bg(Color::DarkGray) } else { value_style };
    Line::from(vec![Span::styled(left, base), Span::styled(right, value_style)])
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

/// A `width × height` rectangle centred in `area`, shrunk to fit.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
