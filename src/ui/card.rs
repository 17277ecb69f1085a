//! A single card drawn with its pose: position, scale, z-rotation and tilt.
//!
//! Terminals cannot rotate text, so rotation is approximated by shearing:
//! each row of the card is shifted sideways by the distance a rotation about
//! the pivot would move it.  The card is first drawn upright into a scratch
//! buffer and then copied row by row into the frame.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Position, Rect},
    style::Color,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use ideo_stack::core::drag::Tilt;
use ideo_stack::core::item::CardId;

use crate::app::gallery::GalleryCard;
use crate::ui::layout::{CellMetrics, CellRect};
use crate::ui::theme::Theme;

pub type ImageCache = HashMap<PathBuf, Arc<image::RgbaImage>>;

/// Narrowest a tilted card gets, as a fraction of its width or height.
const MIN_TILT_FACTOR: f64 = 0.35;

/// Everything needed to draw and hit-test one card.
#[derive(Debug, Clone)]
pub struct CardFrame<'a> {
    pub card: &'a GalleryCard,
    /// Stack card id; `None` for circular slots.
    pub id: Option<CardId>,
    pub rect: CellRect,
    /// Clockwise rotation in degrees.
    pub rotate_deg: f64,
    /// Rotation pivot as a fraction of the card size.
    pub pivot: (f64, f64),
    pub focused: bool,
    pub held: bool,
    pub show_image: bool,
}

impl CardFrame<'_> {
    /// Horizontal shift, in columns, of card row `row`.
    pub fn row_shift(&self, row: u16, metrics: CellMetrics) -> i32 {
        let theta = self.rotate_deg.to_radians();
        if theta == 0.0 {
            return 0;
        }
        let pivot_row = self.pivot.1 * f64::from(self.rect.height);
        let dy_px = (f64::from(row) + 0.5 - pivot_row) * metrics.height_px;
        metrics.cols(-dy_px * theta.sin())
    }

    /// Does the sheared card cover cell `(col, row)`?
    pub fn contains(&self, col: u16, row: u16, metrics: CellMetrics) -> bool {
        let r = i32::from(row) - self.rect.y;
        if r < 0 || r >= i32::from(self.rect.height) {
            return false;
        }
        let left = self.rect.x + self.row_shift(r as u16, metrics);
        let c = i32::from(col);
        c >= left && c < left + i32::from(self.rect.width)
    }

    /// Draw into `buf`, clipped to `clip`.
    pub fn render(&self, images: &ImageCache, metrics: CellMetrics, clip: Rect, buf: &mut Buffer) {
        let CellRect { width, height, .. } = self.rect;
        if width < 4 || height < 3 {
            return;
        }
        let mut scratch = Buffer::empty(Rect::new(0, 0, width, height));
        self.render_upright(images, scratch.area, &mut scratch);

        for row in 0..height {
            let y = self.rect.y + i32::from(row);
            let x0 = self.rect.x + self.row_shift(row, metrics);
            for col in 0..width {
                let x = x0 + i32::from(col);
                let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
                    continue;
                };
                if !clip.contains(Position::new(x, y)) {
                    continue;
                }
                if let (Some(src), Some(dst)) = (
                    scratch.cell(Position::new(col, row)),
                    buf.cell_mut(Position::new(x, y)),
                ) {
                    *dst = src.clone();
                }
            }
        }
    }

    fn render_upright(&self, images: &ImageCache, area: Rect, buf: &mut Buffer) {
        let border_style = if self.held {
            Theme::held_border_style()
        } else if self.focused {
            Theme::focused_border_style()
        } else {
            Theme::card_border_style()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .style(Theme::card_body_style())
            .title(Span::styled(
                format!(" {} ", self.card.title),
                Theme::card_title_style(),
            ));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let image = self
            .card
            .image
            .as_ref()
            .filter(|_| self.show_image)
            .and_then(|p| images.get(p));

        match image {
            Some(img) if inner.height > 1 => {
                let img_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
                render_image_cover(img, img_area, buf);
                let caption = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
                Paragraph::new(Span::styled(&self.card.caption, Theme::card_caption_style()))
                    .alignment(Alignment::Center)
                    .render(caption, buf);
            }
            _ => {
                let pad = inner.height.saturating_sub(2) / 2;
                let mut lines = vec![Line::raw(""); pad as usize];
                lines.push(Line::from(Span::styled(
                    self.card.title.clone(),
                    Theme::card_title_style(),
                )));
                lines.push(Line::from(Span::styled(
                    self.card.caption.clone(),
                    Theme::card_caption_style(),
                )));
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(inner, buf);
            }
        }
    }
}

/// Scale factor a tilt of `deg` applies to the tilted dimension.
pub fn tilt_factor(deg: f64) -> f64 {
    deg.to_radians().cos().abs().max(MIN_TILT_FACTOR)
}

/// Pixel width and height of a `w × h` card after `tilt`.
pub fn tilted_size(w: f64, h: f64, tilt: Tilt) -> (f64, f64) {
    (w * tilt_factor(tilt.rotate_y), h * tilt_factor(tilt.rotate_x))
}

// ─── image (halfblock renderer) ─────────────────────────────────

/// Fill `area` with `img` using `▀` half-blocks (two pixel rows per cell),
/// scaled to cover the whole area and cropped around the centre.
fn render_image_cover(img: &image::RgbaImage, area: Rect, buf: &mut Buffer) {
    use image::imageops::{self, FilterType};

    if area.width == 0 || area.height == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }
    let target_w = u32::from(area.width);
    let target_h = u32::from(area.height) * 2;

    let scale = (f64::from(target_w) / f64::from(img.width()))
        .max(f64::from(target_h) / f64::from(img.height()));
    let fit_w = ((f64::from(img.width()) * scale).ceil() as u32).max(target_w);
    let fit_h = ((f64::from(img.height()) * scale).ceil() as u32).max(target_h);
    let resized = imageops::resize(img, fit_w, fit_h, FilterType::Triangle);
    let cropped = imageops::crop_imm(
        &resized,
        (fit_w - target_w) / 2,
        (fit_h - target_h) / 2,
        target_w,
        target_h,
    )
    .to_image();

    let rgb = |p: &image::Rgba<u8>| Color::Rgb(p[0], p[1], p[2]);
    for row in 0..area.height {
        for col in 0..area.width {
            let (x, y) = (u32::from(col), u32::from(row) * 2);
            let (Some(t), Some(b)) = (cropped.get_pixel_checked(x, y), cropped.get_pixel_checked(x, y + 1))
            else {
                continue;
            };
            if let Some(cell) = buf.cell_mut(Position::new(area.x + col, area.y + row)) {
                cell.set_char('▀').set_fg(rgb(t)).set_bg(rgb(b));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: CellMetrics = CellMetrics {
        width_px: 8.0,
        height_px: 16.0,
    };

    fn frame(card: &GalleryCard, rotate_deg: f64) -> CardFrame<'_> {
        CardFrame {
            card,
            id: Some(1),
            rect: CellRect {
                x: 10,
                y: 2,
                width: 20,
                height: 10,
            },
            rotate_deg,
            pivot: (0.5, 0.5),
            focused: true,
            held: false,
            show_image: false,
        }
    }

    #[test]
    fn upright_card_has_no_shear() {
        let card = GalleryCard::text("t", "c");
        let f = frame(&card, 0.0);
        assert!((0..10).all(|r| f.row_shift(r, METRICS) == 0));
        assert!(f.contains(10, 2, METRICS));
        assert!(!f.contains(30, 2, METRICS));
    }

    #[test]
    fn clockwise_rotation_pushes_top_right() {
        let card = GalleryCard::text("t", "c");
        let f = frame(&card, 10.0);
        assert!(f.row_shift(0, METRICS) > 0);
        assert!(f.row_shift(9, METRICS) < 0);
        assert_eq!(f.row_shift(0, METRICS), -f.row_shift(9, METRICS));
    }

    #[test]
    fn tilt_narrows_but_never_vanishes() {
        let (w, h) = tilted_size(100.0, 100.0, Tilt { rotate_x: 0.0, rotate_y: 60.0 });
        assert!((w - 50.0).abs() < 1e-9);
        assert_eq!(h, 100.0);
        assert_eq!(tilt_factor(90.0), MIN_TILT_FACTOR);
    }

    #[test]
    fn renders_title_into_buffer() {
        let card = GalleryCard::text("Hello", "world");
        let f = frame(&card, 0.0);
        let area = Rect::new(0, 0, 40, 14);
        let mut buf = Buffer::empty(area);
        f.render(&ImageCache::new(), METRICS, area, &mut buf);
        let row: String = (10..30)
            .filter_map(|x| buf.cell(Position::new(x, 2)).map(|c| c.symbol().to_string()))
            .collect();
        assert!(row.contains("Hello"));
        // Outside the card untouched.
        assert_eq!(buf.cell(Position::new(0, 0)).map(|c| c.symbol()), Some(" "));
    }

    #[test]
    fn rendering_clips_to_area() {
        let card = GalleryCard::text("x", "y");
        let mut f = frame(&card, 0.0);
        f.rect.x = -5;
        let area = Rect::new(0, 0, 12, 12);
        let mut buf = Buffer::empty(area);
        // Must not panic on cells left of or beyond the buffer.
        f.render(&ImageCache::new(), METRICS, area, &mut buf);
        assert_eq!(buf.area, area);
    }

    #[test]
    fn image_cover_fills_area() {
        let img = image::RgbaImage::from_pixel(7, 3, image::Rgba([255, 0, 0, 255]));
        let area = Rect::new(1, 1, 6, 4);
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 10));
        render_image_cover(&img, area, &mut buf);
        for y in 1..5 {
            for x in 1..7 {
                let cell = buf.cell(Position::new(x, y)).unwrap();
                assert_eq!(cell.symbol(), "▀");
                assert!(matches!(cell.fg, Color::Rgb(r, 0..=8, 0..=8) if r > 240));
            }
        }
        assert_eq!(buf.cell(Position::new(0, 0)).unwrap().symbol(), " ");
    }
}
