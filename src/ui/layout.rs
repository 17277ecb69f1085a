//! Layout helpers: split the terminal area into regions and map between
//! terminal cells and the engines' pixel space.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Primary screen layout with the gallery and a bottom status bar.
pub struct AppLayout {
    pub gallery_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // gallery (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            gallery_area: chunks[0],
            status_area: chunks[1],
        }
    }
}

/// Size of one terminal cell in engine pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width_px: f64,
    pub height_px: f64,
}

impl CellMetrics {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self { width_px, height_px }
    }

    /// Pixel size of `area`.
    pub fn viewport_px(&self, area: Rect) -> (f64, f64) {
        (
            f64::from(area.width) * self.width_px,
            f64::from(area.height) * self.height_px,
        )
    }

    /// Centre of cell `(col, row)` in pixels relative to `area`'s top-left.
    pub fn cell_to_px(&self, area: Rect, col: u16, row: u16) -> (f64, f64) {
        let dx = f64::from(col) - f64::from(area.x) + 0.5;
        let dy = f64::from(row) - f64::from(area.y) + 0.5;
        (dx * self.width_px, dy * self.height_px)
    }

    /// Whole columns spanned by `px`, rounded to nearest.
    pub fn cols(&self, px: f64) -> i32 {
        (px / self.width_px).round() as i32
    }

    pub fn rows(&self, px: f64) -> i32 {
        (px / self.height_px).round() as i32
    }
}

/// A rectangle in signed cell coordinates; may lie partly off screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    /// Place a `w × h` pixel box whose top-left is at `(left, top)` pixels
    /// inside `area`.
    pub fn from_px(area: Rect, metrics: CellMetrics, left: f64, top: f64, w: f64, h: f64) -> Self {
        let width = metrics.cols(w).clamp(0, i32::from(u16::MAX)) as u16;
        let height = metrics.rows(h).clamp(0, i32::from(u16::MAX)) as u16;
        Self {
            x: i32::from(area.x) + metrics.cols(left),
            y: i32::from(area.y) + metrics.rows(top),
            width,
            height,
        }
    }
}

pub fn point_in_rect(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x
        && col < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: CellMetrics = CellMetrics {
        width_px: 8.0,
        height_px: 16.0,
    };

    #[test]
    fn status_bar_takes_last_row() {
        let l = AppLayout::from_area(Rect::new(0, 0, 80, 24));
        assert_eq!(l.gallery_area, Rect::new(0, 0, 80, 23));
        assert_eq!(l.status_area, Rect::new(0, 23, 80, 1));
    }

    #[test]
    fn cells_map_to_pixel_centres() {
        let area = Rect::new(2, 1, 10, 5);
        assert_eq!(METRICS.viewport_px(area), (80.0, 80.0));
        assert_eq!(METRICS.cell_to_px(area, 2, 1), (4.0, 8.0));
        assert_eq!(METRICS.cell_to_px(area, 11, 5), (76.0, 72.0));
    }

    #[test]
    fn pixel_boxes_round_to_cells() {
        let area = Rect::new(0, 0, 100, 40);
        let r = CellRect::from_px(area, METRICS, -20.0, 40.0, 208.0, 208.0);
        assert_eq!(r, CellRect { x: -3, y: 3, width: 26, height: 13 });
    }
}
