//! Stack view widget and the geometry shared with hit-testing.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
};

use ideo_stack::core::item::CardId;
use ideo_stack::core::stack::StackEngine;

use crate::app::gallery::GalleryCard;
use crate::ui::card::{tilted_size, CardFrame, ImageCache};
use crate::ui::layout::{CellMetrics, CellRect};
use crate::ui::theme::Theme;

/// Card frames back to front.
pub fn stack_frames<'a>(
    engine: &'a StackEngine<GalleryCard>,
    area: Rect,
    metrics: CellMetrics,
    held: Option<CardId>,
) -> Vec<CardFrame<'a>> {
    let config = engine.config();
    let (vw, vh) = metrics.viewport_px(area);
    let base_w = if config.spread_horizontal {
        config.spread_card_width
    } else {
        config.card_width
    };

    engine
        .cards()
        .into_iter()
        .map(|view| {
            let origin = view.placement.origin;
            let (dx, dy) = view.drag_offset;
            // Upright, unscaled box centred in the viewport.
            let left = vw / 2.0 + view.pose.x + dx - base_w / 2.0;
            let top = vh / 2.0 + dy - config.card_height / 2.0;
            // Scale about the pivot so it stays put.
            let pivot_x = left + origin.x * base_w;
            let pivot_y = top + origin.y * config.card_height;
            let scale = view.pose.scale.max(0.0);
            let (w, h) = tilted_size(base_w * scale, config.card_height * scale, view.tilt);
            CardFrame {
                card: &view.item.content,
                id: Some(view.item.id),
                rect: CellRect::from_px(area, metrics, pivot_x - origin.x * w, pivot_y - origin.y * h, w, h),
                rotate_deg: view.pose.rotate_z,
                pivot: (origin.x, origin.y),
                focused: view.placement.focused,
                held: held == Some(view.item.id),
                show_image: view.placement.load_image,
            }
        })
        .collect()
}

/// Topmost card under cell `(col, row)`.
pub fn card_at(frames: &[CardFrame<'_>], col: u16, row: u16, metrics: CellMetrics) -> Option<CardId> {
    frames
        .iter()
        .rev()
        .find(|f| f.contains(col, row, metrics))
        .and_then(|f| f.id)
}

pub struct StackView<'a> {
    pub engine: &'a StackEngine<GalleryCard>,
    pub images: &'a ImageCache,
    pub metrics: CellMetrics,
    pub held: Option<CardId>,
}

impl Widget for StackView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.engine.is_empty() {
            Paragraph::new(Line::styled("No cards", Theme::empty_style()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }
        for frame in stack_frames(self.engine, area, self.metrics, self.held) {
            frame.render(self.images, self.metrics, area, buf);
        }
    }
}
