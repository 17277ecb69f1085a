//! Input handling: maps key and mouse events to state mutations.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Instant;

use crate::config::{Action, KeyBind};
use crate::ui::layout::point_in_rect;
use crate::ui::stack_view::{card_at, stack_frames};

use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{ActiveView, AppState, GalleryView, Press};

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }
    if key.kind == KeyEventKind::Release {
        return;
    }

    match state.active_view {
        ActiveView::Gallery => handle_gallery_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
    }
}

// ── Gallery (configurable bindings) ─────────────────────────────

fn handle_gallery_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;
    match action {
        Action::Advance => advance(state),
        Action::SwitchView => state.switch_view(),
        Action::ToggleAutoplay => state.toggle_autoplay(),
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::Quit => state.should_quit = true,
    }
}

fn advance(state: &mut AppState) {
    match state.view {
        GalleryView::Stack => state.stack.advance(),
        GalleryView::Circular => state.circular.wheel(1.0),
    }
}

// ── Settings menu ───────────────────────────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Gallery;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected + 1 < SETTINGS_ITEMS.len() {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            match SETTINGS_ITEMS.get(state.settings_selected) {
                Some(SettingsItem::Submenu { view, .. }) => {
                    state.active_view = *view;
                    state.controls_selected = 0;
                }
                Some(SettingsItem::Toggle { get, set, .. }) => {
                    let current = get(state);
                    set(state, !current);
                }
                Some(SettingsItem::Cycle { cycle, .. }) => cycle(state),
                None => {}
            }
        }
        _ => {}
    }
}

// ── Controls submenu ────────────────────────────────────────────

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let selected_action = Action::ALL.get(state.controls_selected).copied();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Gallery;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected + 1 < controls_item_count() {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => match selected_action {
            Some(_) => state.awaiting_rebind = true,
            None => {
                state.config.reset_defaults();
                state.save_config();
                state.status_message = Some("Key bindings reset".into());
            }
        },
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(action) = selected_action {
                state.config.bindings.insert(action, Vec::new());
                state.save_config();
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }
    let Some(&action) = Action::ALL.get(state.controls_selected) else {
        state.awaiting_rebind = false;
        return;
    };
    state.config.add_binding(action, KeyBind::from_key_event(key));
    state.save_config();
    state.awaiting_rebind = false;
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.  `now` stamps clicks for the post-drag guard.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant) {
    if state.active_view != ActiveView::Gallery {
        return;
    }
    let area = state.layout().gallery_area;
    let metrics = state.metrics();
    let (col, row) = (mouse.column, mouse.row);
    let inside = point_in_rect(area, col, row);
    let (x, y) = metrics.cell_to_px(area, col, row);

    match mouse.kind {
        MouseEventKind::Moved => update_hover(state, inside),
        MouseEventKind::Down(MouseButton::Left) if inside => {
            update_hover(state, true);
            let press = match state.view {
                GalleryView::Stack => {
                    let card = card_at(&stack_frames(&state.stack, area, metrics, None), col, row, metrics);
                    let dragging = card.is_some_and(|id| state.stack.pointer_down(id, x, y));
                    Press { card, dragging }
                }
                GalleryView::Circular => {
                    state.circular.pointer_down(x, y);
                    Press {
                        card: None,
                        dragging: true,
                    }
                }
            };
            state.press = Some(press);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            update_hover(state, inside);
            if state.press.is_some_and(|p| p.dragging) {
                match state.view {
                    GalleryView::Stack => state.stack.pointer_move(x, y),
                    GalleryView::Circular => state.circular.pointer_move(x, y),
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let Some(press) = state.press.take() else {
                return;
            };
            match state.view {
                GalleryView::Stack => {
                    // Hit-test before the release moves anything.
                    let released_on = inside
                        .then(|| card_at(&stack_frames(&state.stack, area, metrics, None), col, row, metrics))
                        .flatten();
                    if press.dragging {
                        state.stack.pointer_up(now);
                    }
                    if let Some(id) = press.card.filter(|id| released_on == Some(*id)) {
                        state.stack.click(id, now);
                    }
                }
                GalleryView::Circular => state.circular.pointer_up(),
            }
        }
        MouseEventKind::ScrollDown if inside => match state.view {
            GalleryView::Stack => state.stack.advance(),
            GalleryView::Circular => state.circular.wheel(1.0),
        },
        MouseEventKind::ScrollUp if inside => {
            if state.view == GalleryView::Circular {
                state.circular.wheel(-1.0);
            }
        }
        _ => {}
    }
}

/// The terminal lost focus: no further pointer events will arrive, so end
/// hover and abandon any gesture in progress.  A cancelled drag never
/// dismisses a card.
pub fn handle_focus_lost(state: &mut AppState) {
    update_hover(state, false);
    if state.press.take().is_some() {
        match state.view {
            GalleryView::Stack => state.stack.pointer_cancel(),
            GalleryView::Circular => state.circular.pointer_up(),
        }
    }
}

fn update_hover(state: &mut AppState, inside: bool) {
    if inside == state.hovering {
        return;
    }
    state.hovering = inside;
    if inside {
        state.pointer_enter();
    } else {
        state.pointer_leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gallery::placeholder_cards;
    use crate::config::AppConfig;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn state(config: AppConfig) -> AppState {
        let mut s = AppState::new(placeholder_cards(4), config, GalleryView::Stack, Instant::now());
        s.persist = false;
        s.set_terminal_area(Rect::new(0, 0, 120, 31));
        s
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Centre cell of the current front card.
    fn front_cell(s: &AppState) -> (u16, u16) {
        let area = s.layout().gallery_area;
        let frames = stack_frames(&s.stack, area, s.metrics(), None);
        let front = frames.last().unwrap();
        (
            (front.rect.x + i32::from(front.rect.width) / 2) as u16,
            (front.rect.y + i32::from(front.rect.height) / 2) as u16,
        )
    }

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut s = state(AppConfig::default());
        s.active_view = ActiveView::ControlsSubmenu;
        s.awaiting_rebind = true;
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(s.should_quit);
    }

    #[test]
    fn bound_keys_drive_the_gallery() {
        let mut s = state(AppConfig::default());
        let front = s.stack.front();
        handle_key(&mut s, key(KeyCode::Char(' ')));
        assert_ne!(s.stack.front(), front);

        handle_key(&mut s, key(KeyCode::Tab));
        assert_eq!(s.view, GalleryView::Circular);

        handle_key(&mut s, key(KeyCode::Char('?')));
        assert_eq!(s.active_view, ActiveView::SettingsMenu);
        handle_key(&mut s, key(KeyCode::Esc));
        assert_eq!(s.active_view, ActiveView::Gallery);
    }

    #[test]
    fn rebinding_moves_a_key() {
        let mut s = state(AppConfig::default());
        s.active_view = ActiveView::ControlsSubmenu;
        s.controls_selected = Action::ALL.iter().position(|a| *a == Action::Quit).unwrap();
        handle_key(&mut s, key(KeyCode::Enter));
        assert!(s.awaiting_rebind);
        handle_key(&mut s, key(KeyCode::Char('x')));
        assert!(!s.awaiting_rebind);
        assert_eq!(s.config.match_key(key(KeyCode::Char('x'))), Some(Action::Quit));
    }

    #[test]
    fn click_sends_front_card_back() {
        let mut config = AppConfig::default();
        config.stack.send_to_back_on_click = true;
        let mut s = state(config);
        let front = s.stack.front();
        let (col, row) = front_cell(&s);
        let t = Instant::now();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), col, row), t);
        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), col, row), t);
        assert_ne!(s.stack.front(), front);
    }

    #[test]
    fn long_drag_dismisses_once() {
        let mut config = AppConfig::default();
        config.stack.send_to_back_on_click = true;
        let mut s = state(config);
        let order = s.stack.order_ids();
        let (col, row) = front_cell(&s);
        let t = Instant::now();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), col, row), t);
        // 30 columns at 8 px is past the 200 px threshold.
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), col + 30, row), t);
        handle_mouse(
            &mut s,
            mouse(MouseEventKind::Up(MouseButton::Left), col + 30, row),
            t + Duration::from_millis(10),
        );
        let after = s.stack.order_ids();
        assert_ne!(after, order);
        // Exactly one card moved: the old front is now at the back.
        assert_eq!(after.first(), order.last());
        assert_eq!(after.len(), order.len());
    }

    #[test]
    fn hover_follows_pointer() {
        let mut s = state(AppConfig::default());
        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 10, 10), Instant::now());
        assert!(s.hovering);
        assert!(s.stack.is_hovered());
        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 10, 30), Instant::now());
        assert!(!s.hovering);
        assert!(!s.stack.is_hovered());
    }

    #[test]
    fn focus_loss_ends_hover_and_gesture() {
        let mut s = state(AppConfig::default());
        let (col, row) = front_cell(&s);
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), col, row), Instant::now());
        assert!(s.stack.is_hovered());
        handle_focus_lost(&mut s);
        assert!(s.press.is_none());
        assert!(!s.stack.is_hovered());
    }

    #[test]
    fn focus_loss_mid_drag_keeps_the_front_card() {
        let mut s = state(AppConfig::default());
        let order = s.stack.order_ids();
        let (col, row) = front_cell(&s);
        let t = Instant::now();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), col, row), t);
        // 30 columns is already past the dismiss threshold.
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), col + 30, row), t);
        handle_focus_lost(&mut s);
        assert_eq!(s.stack.order_ids(), order);

        // The release that follows focus coming back finds no gesture.
        handle_mouse(
            &mut s,
            mouse(MouseEventKind::Up(MouseButton::Left), col + 30, row),
            t + Duration::from_millis(10),
        );
        assert_eq!(s.stack.order_ids(), order);
    }

    #[test]
    fn wheel_scrolls_the_strip() {
        let mut s = state(AppConfig::default());
        s.switch_view();
        let before = s.circular.scroll().target;
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollDown, 10, 10), Instant::now());
        assert!(s.circular.scroll().target > before);
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollUp, 10, 10), Instant::now());
        assert_eq!(s.circular.scroll().target, before);
    }
}
