//! Screen regions shared by drawing and mouse handling.

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

/// Width of the property inspector column
const INSPECTOR_WIDTH: u16 = 34;
pub const REVERSE_LABEL: &str = "[◀ Reverse]";
pub const SKIP_LABEL: &str = "[Skip ▶]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Map including its border
    pub map: Rect,
    /// Drawable map cells
    pub map_inner: Rect,
    pub inspector: Option<Rect>,
    /// Sequence panel including its border
    pub controls: Rect,
    pub slider: SliderLayout,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect, show_inspector: bool) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Map
                Constraint::Length(3), // Sequence controls
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let (map, inspector) = if show_inspector {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(10), Constraint::Length(INSPECTOR_WIDTH)])
                .split(rows[0]);
            (cols[0], Some(cols[1]))
        } else {
            (rows[0], None)
        };

        Self {
            map,
            map_inner: inset(map),
            inspector,
            controls: rows[1],
            slider: SliderLayout::new(inset(rows[1])),
            status: rows[2],
        }
    }

    /// Braille dot under a terminal cell (cell center), if on the map
    pub fn map_dot(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        if !self.map_inner.contains(Position::new(col, row)) {
            return None;
        }
        let x = (col - self.map_inner.x) as f64 * 2.0 + 1.0;
        let y = (row - self.map_inner.y) as f64 * 4.0 + 2.0;
        Some((x, y))
    }

    /// Map size in braille dots
    pub fn map_dots(&self) -> (usize, usize) {
        (self.map_inner.width as usize * 2, self.map_inner.height as usize * 4)
    }
}

/// Region inside a one-cell border
fn inset(area: Rect) -> Rect {
    Rect::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

/// What a click on the control row means
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlHit {
    Reverse,
    Skip,
    /// Column offset into the track
    Track(u16),
}

/// `[◀ Reverse] ━━━━●━━━━ [Skip ▶]` laid out on one row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderLayout {
    pub reverse: Rect,
    pub track: Rect,
    pub skip: Rect,
}

impl SliderLayout {
    pub fn new(row: Rect) -> Self {
        let reverse_w = label_width(REVERSE_LABEL).min(row.width);
        let skip_w = label_width(SKIP_LABEL).min(row.width.saturating_sub(reverse_w));
        let row = Rect { height: row.height.min(1), ..row };

        let reverse = Rect { width: reverse_w, ..row };
        let skip = Rect {
            x: row.x + row.width - skip_w,
            width: skip_w,
            ..row
        };
        // One cell gap on either side of the track
        let track_x = reverse.x + reverse_w + 1;
        let track = Rect {
            x: track_x,
            width: skip.x.saturating_sub(track_x + 1),
            ..row
        };
        Self { reverse, track, skip }
    }

    pub fn hit(&self, col: u16, row: u16) -> Option<ControlHit> {
        let pos = Position::new(col, row);
        if self.reverse.contains(pos) {
            Some(ControlHit::Reverse)
        } else if self.skip.contains(pos) {
            Some(ControlHit::Skip)
        } else if self.track.contains(pos) {
            Some(ControlHit::Track(col - self.track.x))
        } else {
            None
        }
    }

    /// Track column of the thumb for `index` out of `len` positions
    pub fn thumb_offset(&self, index: usize, len: usize) -> u16 {
        let last = self.track.width.saturating_sub(1) as usize;
        if len <= 1 || last == 0 {
            return 0;
        }
        ((index.min(len - 1) * last + (len - 1) / 2) / (len - 1)) as u16
    }

    /// Slider index nearest to a track column
    pub fn index_at(&self, offset: u16, len: usize) -> usize {
        let last = self.track.width.saturating_sub(1) as usize;
        if len <= 1 || last == 0 {
            return 0;
        }
        let offset = (offset as usize).min(last);
        (offset * (len - 1) + last / 2) / last
    }
}

fn label_width(label: &str) -> u16 {
    label.chars().count() as u16
}
