//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and UI renderers consume the same source of truth without cross-importing.

use std::time::Duration;

use ideo_stack::core::stack::TransitionMode;

use super::state::{ActiveView, AppState};

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle, read and written through `AppState`.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }

    /// Current value as shown in the menu.
    pub fn value_text(&self, state: &AppState) -> String {
        match self {
            Self::Submenu { .. } => "›".to_string(),
            Self::Toggle { get, .. } => if get(state) { "[ON]" } else { "[OFF]" }.to_string(),
            Self::Cycle { value, .. } => value(state),
        }
    }
}

/// Step to the entry after `current` in `values`, wrapping; unknown values
/// restart at `fallback`.
fn next_in<T: PartialEq + Copy>(values: &[T], current: T, fallback: usize) -> T {
    let idx = values.iter().position(|v| *v == current).unwrap_or(fallback);
    values[(idx + 1) % values.len()]
}

fn commit(s: &mut AppState, message: String) {
    s.apply_config();
    s.save_config();
    s.status_message = Some(message);
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Toggle {
        label: "Autoplay",
        get: |s| s.config.stack.autoplay,
        set: |s, v| {
            s.config.set_autoplay(v);
            commit(s, format!("Autoplay {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Cycle {
        label: "Autoplay Delay",
        value: |s| format!("{:.1}s", s.config.stack.autoplay_delay.as_secs_f64()),
        cycle: |s| {
            const DELAYS_MS: &[u64] = &[1000, 2000, 3000, 5000, 8000];
            let current = s.config.stack.autoplay_delay.as_millis() as u64;
            let next = Duration::from_millis(next_in(DELAYS_MS, current, 2));
            s.config.stack.autoplay_delay = next;
            s.config.circular.autoplay_delay = next;
            commit(s, format!("Autoplay delay: {:.1}s", next.as_secs_f64()));
        },
    },
    SettingsItem::Toggle {
        label: "Pause on Hover",
        get: |s| s.config.stack.pause_on_hover,
        set: |s, v| {
            s.config.set_pause_on_hover(v);
            commit(s, format!("Pause on hover {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Cycle {
        label: "Transition",
        value: |s| s.config.stack.transition_mode.label().to_string(),
        cycle: |s| {
            let next = next_in(TransitionMode::ALL, s.config.stack.transition_mode, 0);
            s.config.stack.transition_mode = next;
            commit(s, format!("Transition: {}", next.label()));
        },
    },
    SettingsItem::Toggle {
        label: "Random Rotation",
        get: |s| s.config.stack.random_rotation,
        set: |s, v| {
            s.config.stack.random_rotation = v;
            commit(s, format!("Random rotation {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Click to Send Back",
        get: |s| s.config.stack.send_to_back_on_click,
        set: |s, v| {
            s.config.stack.send_to_back_on_click = v;
            commit(s, format!("Click to send back {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Narrow: Click Only",
        get: |s| s.config.stack.mobile_click_only,
        set: |s, v| {
            s.config.stack.mobile_click_only = v;
            commit(s, format!("Click-only on narrow screens {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Spread Horizontally",
        get: |s| s.config.stack.spread_horizontal,
        set: |s, v| {
            s.config.stack.spread_horizontal = v;
            commit(s, format!("Horizontal spread {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Cycle {
        label: "Back Spread",
        value: |s| format!("{}px", s.config.stack.back_spread_px),
        cycle: |s| {
            const SPREADS: &[f64] = &[0.0, 8.0, 16.0, 24.0];
            let next = next_in(SPREADS, s.config.stack.back_spread_px, 0);
            s.config.stack.back_spread_px = next;
            commit(s, format!("Back spread: {next}px"));
        },
    },
    SettingsItem::Cycle {
        label: "Bend",
        value: |s| format!("{}", s.config.circular.bend),
        cycle: |s| {
            const BENDS: &[f64] = &[0.0, 1.0, 40.0, 80.0, -40.0, -80.0];
            let next = next_in(BENDS, s.config.circular.bend, 1);
            s.config.circular.bend = next;
            commit(s, format!("Bend: {next}"));
        },
    },
    SettingsItem::Cycle {
        label: "Scroll Speed",
        value: |s| format!("{}", s.config.circular.scroll_speed),
        cycle: |s| {
            const SPEEDS: &[f64] = &[1.0, 2.0, 4.0];
            let next = next_in(SPEEDS, s.config.circular.scroll_speed, 1);
            s.config.circular.scroll_speed = next;
            commit(s, format!("Scroll speed: {next}"));
        },
    },
];
