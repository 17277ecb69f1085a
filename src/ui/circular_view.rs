//! Circular strip widget.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
};

use ideo_stack::core::circular::CircularScrollEngine;

use crate::app::gallery::GalleryCard;
use crate::ui::card::{tilted_size, CardFrame, ImageCache};
use crate::ui::layout::{CellMetrics, CellRect};
use crate::ui::theme::Theme;

/// Frames of the slots that intersect `area`, painted far-to-near so the
/// focused card ends up on top.
pub fn circular_frames<'a>(
    engine: &'a CircularScrollEngine<GalleryCard>,
    area: Rect,
    metrics: CellMetrics,
) -> Vec<CardFrame<'a>> {
    let config = engine.config();
    let (_, vh) = metrics.viewport_px(area);
    let (cw, ch) = (config.card_width, config.card_height);
    let held = engine.is_dragging();

    let mut slots: Vec<_> = engine
        .slots()
        .into_iter()
        .filter_map(|slot| {
            let (w, h) = tilted_size(cw, ch, slot.tilt);
            let left = slot.screen_left + slot.drag_offset.0 + (cw - w) / 2.0;
            let top = (vh - ch) / 2.0 + slot.bend.y + slot.drag_offset.1 + (ch - h) / 2.0;
            let rect = CellRect::from_px(area, metrics, left, top, w, h);
            let visible = rect.x < i32::from(area.right())
                && rect.x + i32::from(rect.width) > i32::from(area.x)
                && rect.y < i32::from(area.bottom())
                && rect.y + i32::from(rect.height) > i32::from(area.y);
            visible.then(|| {
                let frame = CardFrame {
                    card: slot.item,
                    id: None,
                    rect,
                    rotate_deg: slot.bend.rotation_z,
                    pivot: (0.5, 0.5),
                    focused: slot.focused,
                    held: held && slot.focused,
                    show_image: true,
                };
                (slot.x_from_center.abs(), frame)
            })
        })
        .collect();

    slots.sort_by(|(a, fa), (b, fb)| fa.focused.cmp(&fb.focused).then(b.total_cmp(a)));
    slots.into_iter().map(|(_, frame)| frame).collect()
}

pub struct CircularView<'a> {
    pub engine: &'a CircularScrollEngine<GalleryCard>,
    pub images: &'a ImageCache,
    pub metrics: CellMetrics,
}

impl Widget for CircularView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.engine.is_empty() {
            Paragraph::new(Line::styled("No cards", Theme::empty_style()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }
        for frame in circular_frames(self.engine, area, self.metrics) {
            frame.render(self.images, self.metrics, area, buf);
        }
    }
}
