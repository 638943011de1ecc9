use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    /// Viewport of the viewed page
    pub page: Rect,
    pub footer: Rect,
    pub status_line: Rect,
    pub hint_line: Rect,
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[2]);

    UiAreas {
        size,
        header: vertical[0],
        page: vertical[1],
        footer: vertical[2],
        status_line: footer_chunks[0],
        hint_line: footer_chunks[1],
    }
}

/// Page coordinates of a terminal cell, if it lies on the page
pub fn to_page(areas: &UiAreas, column: u16, row: u16) -> Option<(i32, i32)> {
    let page = areas.page;
    let inside = column >= page.x
        && row >= page.y
        && column < page.x + page.width
        && row < page.y + page.height;
    inside.then(|| ((column - page.x) as i32, (row - page.y) as i32))
}
