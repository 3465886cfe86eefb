// Screen zones, top to bottom:
//
//   header     league name and view tabs, 3 rows
//   banner     3 rows while an error is showing, otherwise collapsed
//   main       the active view, takes the remaining height
//   help bar   key hints, 1 row

use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

/// Areas produced by [`build_layout`].
#[derive(Debug, Clone)]
pub struct AppLayout {
    pub header: Rect,
    /// Zero height when no error is showing.
    pub banner: Rect,
    /// Content of the active view.
    pub main_panel: Rect,
    pub help_bar: Rect,
}

const HEADER_HEIGHT: u16 = 3;
const BANNER_HEIGHT: u16 = 3;

pub fn build_layout(area: Rect, show_banner: bool) -> AppLayout {
    let banner_height = if show_banner { BANNER_HEIGHT } else { 0 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(banner_height),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    AppLayout {
        header: vertical[0],
        banner: vertical[1],
        main_panel: vertical[2],
        help_bar: vertical[3],
    }
}

/// Split a panel into two side-by-side columns by percentage.
pub fn split_columns(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent.min(100)),
        ])
        .split(area);
    (cols[0], cols[1])
}

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .split(area);
    let horizontal = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0]);
    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
