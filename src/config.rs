//! User configuration: engine options, terminal metrics, keybindings and
//! persistence.
//!
//! Everything is stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/ideo-stack/config.toml` (default
//! `~/.config/ideo-stack/config.toml`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use ideo_stack::core::circular::CircularConfig;
use ideo_stack::core::stack::StackConfig;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the gallery views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Advance,
    SwitchView,
    ToggleAutoplay,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::Advance,
        Action::SwitchView,
        Action::ToggleAutoplay,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::Advance => "Next Card",
            Action::SwitchView => "Switch View",
            Action::ToggleAutoplay => "Toggle Autoplay",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::Advance => "advance",
            Action::SwitchView => "switch_view",
            Action::ToggleAutoplay => "toggle_autoplay",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// One key plus the Ctrl/Alt/Shift modifiers that must accompany it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT);

/// Modifier prefixes in the order they are written.
const MODIFIER_NAMES: &[(KeyModifiers, &str)] = &[
    (KeyModifiers::CONTROL, "Ctrl"),
    (KeyModifiers::ALT, "Alt"),
    (KeyModifiers::SHIFT, "Shift"),
];

/// Keys with a written name: canonical spelling first, then aliases
/// accepted when reading the config file.
const NAMED_KEYS: &[(KeyCode, &str, &[&str])] = &[
    (KeyCode::Char(' '), "Space", &[]),
    (KeyCode::Up, "Up", &[]),
    (KeyCode::Down, "Down", &[]),
    (KeyCode::Left, "Left", &[]),
    (KeyCode::Right, "Right", &[]),
    (KeyCode::Enter, "Enter", &["return"]),
    (KeyCode::Esc, "Esc", &["escape"]),
    (KeyCode::Tab, "Tab", &[]),
    (KeyCode::BackTab, "BackTab", &[]),
    (KeyCode::Backspace, "Backspace", &["bksp"]),
    (KeyCode::Delete, "Delete", &["del"]),
    (KeyCode::Home, "Home", &[]),
    (KeyCode::End, "End", &[]),
    (KeyCode::PageUp, "PageUp", &["pgup"]),
    (KeyCode::PageDown, "PageDown", &["pgdn"]),
];

fn key_name(code: KeyCode) -> String {
    if let Some((_, name, _)) = NAMED_KEYS.iter().find(|(c, ..)| *c == code) {
        return (*name).to_string();
    }
    match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

fn key_from_name(name: &str) -> Option<KeyCode> {
    let lower = name.to_ascii_lowercase();
    let named = NAMED_KEYS
        .iter()
        .find(|(_, canonical, aliases)| canonical.eq_ignore_ascii_case(name) || aliases.contains(&lower.as_str()));
    if let Some((code, ..)) = named {
        return Some(*code);
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        // Single characters keep their case so `A` and `a` stay distinct.
        (Some(c), None) => Some(KeyCode::Char(c)),
        _ => lower.strip_prefix('f')?.parse().ok().map(KeyCode::F),
    }
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only Ctrl, Alt and Shift take part in matching.
    pub fn matches(&self, event: KeyEvent) -> bool {
        self.code == event.code && self.modifiers & MODIFIER_MASK == event.modifiers & MODIFIER_MASK
    }

    /// The binding a key press would create when rebinding.
    pub fn from_key_event(event: KeyEvent) -> Self {
        Self::new(event.code, event.modifiers & MODIFIER_MASK)
    }

    fn with_modifiers(&self, key: &str) -> String {
        MODIFIER_NAMES
            .iter()
            .filter(|(m, _)| self.modifiers.contains(*m))
            .map(|(_, name)| format!("{name}+"))
            .chain(std::iter::once(key.to_string()))
            .collect()
    }

    /// Short form for the UI, with arrows drawn as glyphs.
    pub fn display(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            code => key_name(code),
        };
        self.with_modifiers(&key)
    }

    fn to_config_string(&self) -> String {
        self.with_modifiers(&key_name(self.code))
    }

    /// Read `Ctrl+Shift+Right`, `Space`, `F5`, `q` and the like.
    fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('+').rev();
        let code = key_from_name(parts.next()?)?;
        let modifiers = parts.try_fold(KeyModifiers::NONE, |acc, part| {
            MODIFIER_NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .map(|(m, _)| acc | *m)
        })?;
        Some(Self::new(code, modifiers))
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: engine options and keybindings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stack: StackConfig,
    pub circular: CircularConfig,
    /// Pixel size of one terminal cell, used to map mouse cells to the
    /// engines' pixel space.
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    /// Animation frames per second.
    pub frame_rate: u32,
    pub bindings: HashMap<Action, Vec<KeyBind>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stack: StackConfig::default(),
            circular: CircularConfig::default(),
            cell_width_px: 8.0,
            cell_height_px: 16.0,
            frame_rate: 60,
            bindings: Self::default_bindings(),
        }
    }
}

impl AppConfig {
    /// Hard-coded default bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(Advance, vec![KeyBind::new(Char(' '), n), KeyBind::new(Right, n)]);
        m.insert(SwitchView, vec![KeyBind::new(Tab, n)]);
        m.insert(ToggleAutoplay, vec![KeyBind::new(Char('a'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// The action bound to `event`.  A binding with more modifiers beats
    /// a plainer one for the same key.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .flat_map(|(&action, binds)| {
                binds
                    .iter()
                    .filter(move |b| b.matches(event))
                    .map(move |b| (b.modifiers.bits().count_ones(), action))
            })
            .max_by_key(|(modifier_count, _)| *modifier_count)
            .map(|(_, action)| action)
    }

    /// Bind `bind` to `action`, releasing it from whatever held it before.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| *b != bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    fn binds(&self, action: Action) -> &[KeyBind] {
        self.bindings.get(&action).map_or(&[], Vec::as_slice)
    }

    /// All keys for `action`, e.g. `Space/→`.
    pub fn display_bindings(&self, action: Action) -> String {
        let binds = self.binds(action);
        if binds.is_empty() {
            return "unbound".into();
        }
        binds.iter().map(KeyBind::display).collect::<Vec<_>>().join("/")
    }

    /// One-line key summary for the status bar.
    pub fn status_bar_hint(&self) -> String {
        const HINTS: &[(Action, &str)] = &[
            (Action::Advance, "next"),
            (Action::SwitchView, "view"),
            (Action::ToggleAutoplay, "autoplay"),
            (Action::OpenSettings, "settings"),
            (Action::Quit, "quit"),
        ];
        HINTS
            .iter()
            .map(|&(action, what)| {
                let key = self.binds(action).first().map_or("?".into(), KeyBind::display);
                format!("{key}: {what}")
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Set autoplay on both engines.
    pub fn set_autoplay(&mut self, on: bool) {
        self.stack.autoplay = on;
        self.circular.autoplay = on;
    }

    pub fn set_pause_on_hover(&mut self, on: bool) {
        self.stack.pause_on_hover = on;
        self.circular.pause_on_hover = on;
    }

    /// Frame period derived from `frame_rate`.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&path, self.serialise())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Parse the config-file text.  Unknown keys and bad values are logged
    /// and otherwise ignored.
    pub fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line, "ignoring config line without `=`");
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if config.apply_setting(key, value) {
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::warn!(key, "ignoring unknown config key");
                continue;
            };

            let binds: Vec<KeyBind> = value
                .split(',')
                .map(|part| part.trim().trim_matches('"'))
                .filter(|part| !part.is_empty())
                .filter_map(|part| {
                    let bind = KeyBind::parse(part);
                    if bind.is_none() {
                        tracing::warn!(key, part, "ignoring unparseable key binding");
                    }
                    bind
                })
                .collect();
            if !binds.is_empty() {
                config.bindings.insert(action, binds);
            }
        }

        config.clamp();
        config
    }

    /// Apply one non-binding setting.  Returns `false` if `key` is not a
    /// setting.
    fn apply_setting(&mut self, key: &str, value: &str) -> bool {
        let stack = &mut self.stack;
        let circular = &mut self.circular;
        match key {
            // shared
            "autoplay" => {
                parse_into(key, value, &mut stack.autoplay);
                circular.autoplay = stack.autoplay;
            }
            "autoplay_delay_ms" => {
                let mut ms = stack.autoplay_delay.as_millis() as u64;
                parse_into(key, value, &mut ms);
                stack.autoplay_delay = Duration::from_millis(ms);
                circular.autoplay_delay = Duration::from_millis(ms);
            }
            "pause_on_hover" => {
                parse_into(key, value, &mut stack.pause_on_hover);
                circular.pause_on_hover = stack.pause_on_hover;
            }
            "card_width" => {
                parse_into(key, value, &mut stack.card_width);
                circular.card_width = stack.card_width;
            }
            "card_height" => {
                parse_into(key, value, &mut stack.card_height);
                circular.card_height = stack.card_height;
            }
            // stack
            "random_rotation" => parse_into(key, value, &mut stack.random_rotation),
            "sensitivity" => parse_into(key, value, &mut stack.sensitivity),
            "send_to_back_on_click" => parse_into(key, value, &mut stack.send_to_back_on_click),
            "mobile_click_only" => parse_into(key, value, &mut stack.mobile_click_only),
            "mobile_breakpoint" => parse_into(key, value, &mut stack.mobile_breakpoint),
            "spread_horizontal" => parse_into(key, value, &mut stack.spread_horizontal),
            "spread_gap" => parse_into(key, value, &mut stack.spread_gap),
            "spread_card_width" => parse_into(key, value, &mut stack.spread_card_width),
            "back_spread_px" => parse_into(key, value, &mut stack.back_spread_px),
            "transition_mode" => parse_into(key, value, &mut stack.transition_mode),
            "spring_stiffness" => parse_into(key, value, &mut stack.animation.stiffness),
            "spring_damping" => parse_into(key, value, &mut stack.animation.damping),
            "spring_mass" => parse_into(key, value, &mut stack.animation.mass),
            // circular
            "bend" => parse_into(key, value, &mut circular.bend),
            "scroll_speed" => parse_into(key, value, &mut circular.scroll_speed),
            "scroll_ease" => parse_into(key, value, &mut circular.scroll_ease),
            "focus_margin" => parse_into(key, value, &mut circular.focus_margin),
            "drag_factor" => parse_into(key, value, &mut circular.drag_factor),
            // terminal
            "cell_width_px" => parse_into(key, value, &mut self.cell_width_px),
            "cell_height_px" => parse_into(key, value, &mut self.cell_height_px),
            "frame_rate" => parse_into(key, value, &mut self.frame_rate),
            _ => return false,
        }
        true
    }

    /// Pull values that would stall or invert the engines back into range.
    fn clamp(&mut self) {
        let defaults = Self::default();
        if !(self.circular.scroll_ease > 0.0 && self.circular.scroll_ease <= 1.0) {
            tracing::warn!(value = self.circular.scroll_ease, "scroll_ease must be in (0, 1]");
            self.circular.scroll_ease = defaults.circular.scroll_ease;
        }
        if !(self.cell_width_px > 0.0) {
            self.cell_width_px = defaults.cell_width_px;
        }
        if !(self.cell_height_px > 0.0) {
            self.cell_height_px = defaults.cell_height_px;
        }
        if !(self.stack.animation.mass > 0.0) {
            tracing::warn!(value = self.stack.animation.mass, "spring_mass must be positive");
            self.stack.animation.mass = defaults.stack.animation.mass;
        }
        self.frame_rate = self.frame_rate.clamp(10, 240);
        let delay = self.stack.autoplay_delay.max(Duration::from_millis(100));
        self.stack.autoplay_delay = delay;
        self.circular.autoplay_delay = delay;
    }

    fn serialise(&self) -> String {
        let s = &self.stack;
        let c = &self.circular;
        let mut lines = vec![
            "# ideo-stack configuration".to_string(),
            String::new(),
            "# Shared".to_string(),
            format!("autoplay = {}", s.autoplay),
            format!("autoplay_delay_ms = {}", s.autoplay_delay.as_millis()),
            format!("pause_on_hover = {}", s.pause_on_hover),
            format!("card_width = {}", s.card_width),
            format!("card_height = {}", s.card_height),
            String::new(),
            "# Stack view".to_string(),
            format!("transition_mode = {}", s.transition_mode),
            format!("random_rotation = {}", s.random_rotation),
            format!("sensitivity = {}", s.sensitivity),
            format!("send_to_back_on_click = {}", s.send_to_back_on_click),
            format!("mobile_click_only = {}", s.mobile_click_only),
            format!("mobile_breakpoint = {}", s.mobile_breakpoint),
            format!("spread_horizontal = {}", s.spread_horizontal),
            format!("spread_gap = {}", s.spread_gap),
            format!("spread_card_width = {}", s.spread_card_width),
            format!("back_spread_px = {}", s.back_spread_px),
            format!("spring_stiffness = {}", s.animation.stiffness),
            format!("spring_damping = {}", s.animation.damping),
            format!("spring_mass = {}", s.animation.mass),
            String::new(),
            "# Circular view".to_string(),
            format!("bend = {}", c.bend),
            format!("scroll_speed = {}", c.scroll_speed),
            format!("scroll_ease = {}", c.scroll_ease),
            format!("focus_margin = {}", c.focus_margin),
            format!("drag_factor = {}", c.drag_factor),
            String::new(),
            "# Terminal".to_string(),
            format!("cell_width_px = {}", self.cell_width_px),
            format!("cell_height_px = {}", self.cell_height_px),
            format!("frame_rate = {}", self.frame_rate),
            String::new(),
            "# Key bindings: action = Key, Ctrl+Key, ...".to_string(),
            "# Named keys: Space Up Down Left Right Enter Esc Tab BackTab".to_string(),
            "#   Backspace Delete Home End PageUp PageDown F1..F12".to_string(),
        ];
        lines.extend(Action::ALL.iter().filter_map(|&action| {
            let binds = self.bindings.get(&action)?;
            let keys: Vec<String> = binds.iter().map(KeyBind::to_config_string).collect();
            Some(format!("{} = {}", action.config_key(), keys.join(", ")))
        }));
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Parse `value` into `slot`, keeping the old value and warning on failure.
fn parse_into<T: FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value, "ignoring unparseable config value"),
    }
}

/// `$XDG_CONFIG_HOME/ideo-stack/config.toml`, else under `~/.config`.
fn config_path() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(env!("CARGO_PKG_NAME"))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use ideo_stack::core::stack::TransitionMode;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut ev = KeyEvent::new(code, modifiers);
        ev.kind = KeyEventKind::Press;
        ev
    }

    #[test]
    fn defaults_match_documented_keys() {
        let c = AppConfig::default();
        let n = KeyModifiers::NONE;
        assert_eq!(c.match_key(key(KeyCode::Char(' '), n)), Some(Action::Advance));
        assert_eq!(c.match_key(key(KeyCode::Right, n)), Some(Action::Advance));
        assert_eq!(c.match_key(key(KeyCode::Tab, n)), Some(Action::SwitchView));
        assert_eq!(c.match_key(key(KeyCode::Char('a'), n)), Some(Action::ToggleAutoplay));
        assert_eq!(c.match_key(key(KeyCode::Char('?'), n)), Some(Action::OpenSettings));
        assert_eq!(c.match_key(key(KeyCode::Char('q'), n)), Some(Action::Quit));
        assert_eq!(c.match_key(key(KeyCode::Char('x'), n)), None);
    }

    #[test]
    fn parses_engine_options() {
        let c = AppConfig::parse(
            "[gallery]\n\
             autoplay = true\n\
             autoplay_delay_ms = 1500\n\
             transition_mode = horizontalScroll\n\
             bend = -40\n\
             back_spread_px = 12.5\n\
             frame_rate = 30\n",
        );
        assert!(c.stack.autoplay && c.circular.autoplay);
        assert_eq!(c.stack.autoplay_delay, Duration::from_millis(1500));
        assert_eq!(c.circular.autoplay_delay, Duration::from_millis(1500));
        assert_eq!(c.stack.transition_mode, TransitionMode::HorizontalScroll);
        assert_eq!(c.circular.bend, -40.0);
        assert_eq!(c.stack.back_spread_px, 12.5);
        assert_eq!(c.frame_rate, 30);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let c = AppConfig::parse(
            "sensitivity = lots\n\
             transition_mode = sideways\n\
             scroll_ease = 3\n\
             frame_rate = 5000\n\
             no_such_key = 1\n\
             garbage line\n",
        );
        let d = AppConfig::default();
        assert_eq!(c.stack.sensitivity, d.stack.sensitivity);
        assert_eq!(c.stack.transition_mode, TransitionMode::Stack);
        assert_eq!(c.circular.scroll_ease, d.circular.scroll_ease);
        assert_eq!(c.frame_rate, 240);
    }

    #[test]
    fn serialised_config_reloads() {
        let mut c = AppConfig::default();
        c.stack.random_rotation = true;
        c.stack.transition_mode = TransitionMode::HorizontalScroll;
        c.circular.drag_factor = 0.1;
        c.set_pause_on_hover(true);
        c.add_binding(Action::Advance, KeyBind::new(KeyCode::Char('n'), KeyModifiers::CONTROL));

        let back = AppConfig::parse(&c.serialise());
        assert_eq!(back.stack, c.stack);
        assert_eq!(back.circular, c.circular);
        assert_eq!(back.bindings, c.bindings);
    }

    #[test]
    fn key_parsing() {
        let b = KeyBind::parse("Ctrl+Shift+Right").unwrap();
        assert_eq!(b.code, KeyCode::Right);
        assert_eq!(b.modifiers, KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(KeyBind::parse("space").unwrap().code, KeyCode::Char(' '));
        assert_eq!(KeyBind::parse("F5").unwrap().code, KeyCode::F(5));
        assert_eq!(KeyBind::parse("A").unwrap().code, KeyCode::Char('A'));
        assert!(KeyBind::parse("Hyper+x").is_none());
        assert!(KeyBind::parse("nonsense").is_none());
    }

    #[test]
    fn rebinding_steals_key_from_other_action() {
        let mut c = AppConfig::default();
        c.add_binding(Action::Quit, KeyBind::new(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(c.match_key(key(KeyCode::Tab, KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(c.display_bindings(Action::SwitchView), "unbound");
    }
}
