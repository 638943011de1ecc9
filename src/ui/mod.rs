use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

pub mod layout;

use crate::app::{flow_elements, App, StatusMessage};
use crate::core::{NoticePosition, NotifyLevel};
use crate::page::{Document, ElementRef, Page, Rect as PageRect, Tag, Theme};

struct Palette {
    base: Style,
    heading: Style,
    link: Style,
    image: Style,
    field: Style,
    placeholder: Style,
    button: Style,
    selection: Style,
}

fn palette(theme: Theme) -> Palette {
    let (fg, bg, field_bg) = match theme {
        Theme::Light => (Color::Black, Color::White, Color::Gray),
        Theme::Dark => (Color::Gray, Color::Black, Color::DarkGray),
    };
    let base = Style::default().fg(fg).bg(bg);
    Palette {
        base,
        heading: base.add_modifier(Modifier::BOLD),
        link: base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        image: base.fg(Color::Magenta),
        field: Style::default().fg(fg).bg(field_bg),
        placeholder: Style::default()
            .fg(Color::DarkGray)
            .bg(field_bg)
            .add_modifier(Modifier::ITALIC),
        button: base.add_modifier(Modifier::REVERSED),
        selection: Style::default().fg(Color::White).bg(Color::LightBlue),
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_page(f, areas.page, app);
    draw_menu(f, areas.page, app);
    draw_status_line(f, areas.status_line, app);
    draw_hint_line(f, areas.hint_line, app);

    if let Some(status) = app.status() {
        if status.position != NoticePosition::BottomLeft {
            draw_notice_popup(f, areas.page, status);
        }
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            "rightmenu",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(app.document.title().to_string()),
        Span::raw("  "),
        Span::styled(
            app.document.location().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let mode = if app.capabilities().supports_long_press {
        "touch"
    } else {
        "pointer"
    };
    let mut right_spans = vec![
        Span::styled("Theme ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.theme().name())),
        Span::styled("Input ", Style::default().fg(Color::DarkGray)),
        Span::raw(mode),
    ];
    if app.in_read_mode() {
        right_spans.push(Span::styled(
            "  Reading",
            Style::default().fg(Color::LightYellow),
        ));
    }
    let right = Paragraph::new(Line::from(right_spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_page(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme());
    f.render_widget(Block::default().style(colors.base), area);

    let doc = &app.document;
    for el in flow_elements(doc) {
        let Some(rect) = doc.bounding_box(el) else {
            continue;
        };
        for (row, line) in element_lines(doc, el, rect, &colors).into_iter().enumerate() {
            let y = rect.y + row as i32;
            if y < 0 || y >= area.height as i32 {
                continue;
            }
            let row_area = Rect::new(area.x, area.y + y as u16, area.width, 1);
            f.render_widget(Paragraph::new(line), row_area);
        }
    }
}

/// Rendered rows of one flow element, wrapped at its box width
fn element_lines(
    doc: &Document,
    el: ElementRef,
    rect: PageRect,
    colors: &Palette,
) -> Vec<Line<'static>> {
    let width = rect.width.max(1) as usize;
    let rows = rect.height as usize;
    match doc.tag(el) {
        Some(Tag::TextArea | Tag::Input) => field_lines(doc, el, width, rows, colors),
        Some(Tag::Button) => {
            vec![Line::from(Span::styled(
                format!(" {} ", doc.text(el)),
                colors.button,
            ))]
        }
        Some(Tag::Anchor) => {
            // an image inside a link renders as the image, underlined
            match doc
                .children(el)
                .into_iter()
                .find(|child| doc.tag(*child) == Some(Tag::Image))
            {
                Some(image) => text_lines(doc, image, width, colors.link.fg(Color::Magenta), colors),
                None => text_lines(doc, el, width, colors.link, colors),
            }
        }
        Some(Tag::Heading) => text_lines(doc, el, width, colors.heading, colors),
        Some(Tag::Image) => text_lines(doc, el, width, colors.image, colors),
        _ => text_lines(doc, el, width, colors.base, colors),
    }
}

fn text_lines(
    doc: &Document,
    el: ElementRef,
    width: usize,
    style: Style,
    colors: &Palette,
) -> Vec<Line<'static>> {
    let selected = doc
        .selection()
        .filter(|sel| sel.element == el)
        .map(|sel| sel.start..sel.end);
    let chars: Vec<char> = doc.text(el).chars().collect();
    chars
        .chunks(width)
        .enumerate()
        .map(|(row, chunk)| {
            let offset = row * width;
            let spans: Vec<Span<'static>> = chunk
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let style = match &selected {
                        Some(range) if range.contains(&(offset + i)) => colors.selection,
                        _ => style,
                    };
                    Span::styled(c.to_string(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn field_lines(
    doc: &Document,
    el: ElementRef,
    width: usize,
    rows: usize,
    colors: &Palette,
) -> Vec<Line<'static>> {
    let field = doc.field(el).unwrap_or_default();
    let (text, style) = if field.value.is_empty() {
        (
            doc.attribute(el, "placeholder").unwrap_or_default(),
            colors.placeholder,
        )
    } else {
        (field.value.clone(), colors.field)
    };
    let style = if doc.focused() == Some(el) {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    };

    let mut lines: Vec<String> = text
        .split('\n')
        .flat_map(|line| {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                return vec![String::new()];
            }
            chars
                .chunks(width)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect()
        })
        .skip(field.scroll_top as usize)
        .take(rows)
        .collect();
    lines.resize(rows, String::new());
    lines
        .into_iter()
        .map(|line| Line::from(Span::styled(format!("{line:<width$}"), style)))
        .collect()
}

fn draw_menu(f: &mut Frame, area: Rect, app: &App) {
    let Some(menu) = app.menu.as_ref().filter(|menu| menu.is_visible()) else {
        return;
    };
    let doc = &app.document;
    let menu_el = menu.presenter().menu();
    let Some(bounds) = doc.bounding_box(menu_el) else {
        return;
    };
    let Some(menu_area) = clip(area, bounds) else {
        return;
    };

    let colors = palette(app.theme());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightCyan))
        .style(colors.base);
    f.render_widget(Clear, menu_area);
    f.render_widget(block, menu_area);

    let rows = doc.menu_rows(menu_el);
    let last_row = rows.last().map(|(_, row)| *row).unwrap_or(0);
    let inner_width = bounds.width.saturating_sub(2);
    for row in 1..=last_row {
        let y = bounds.y + row;
        let line = match rows.iter().find(|(_, r)| *r == row) {
            Some((item, _)) => {
                let hovered = app
                    .hover
                    .zip(doc.bounding_box(*item))
                    .is_some_and(|((x, y), rect)| rect.contains(x, y));
                let style = if hovered {
                    colors.base.add_modifier(Modifier::REVERSED)
                } else {
                    colors.base
                };
                let label = format!(" {}", doc.text(*item));
                Line::from(Span::styled(
                    format!("{label:<width$}", width = inner_width as usize),
                    style,
                ))
            }
            None => Line::from(Span::styled(
                "─".repeat(inner_width as usize),
                Style::default().fg(Color::DarkGray),
            )),
        };
        if let Some(row_area) = clip(area, PageRect::new(bounds.x + 1, y, inner_width, 1)) {
            f.render_widget(Paragraph::new(line), row_area);
        }
    }
}

/// Terminal area of a page rectangle, clipped to the page viewport
fn clip(area: Rect, rect: PageRect) -> Option<Rect> {
    let left = rect.x.max(0);
    let top = rect.y.max(0);
    let right = (rect.x + rect.width as i32).min(area.width as i32);
    let bottom = (rect.y + rect.height as i32).min(area.height as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        area.x + left as u16,
        area.y + top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

fn level_color(level: NotifyLevel) -> Color {
    match level {
        NotifyLevel::Info => Color::LightGreen,
        NotifyLevel::Warn => Color::LightYellow,
        NotifyLevel::Error => Color::LightRed,
    }
}

fn draw_notice_popup(f: &mut Frame, area: Rect, status: &StatusMessage) {
    let width = (status.text.chars().count() as u16 + 4).min(area.width);
    let x = match status.position {
        NoticePosition::TopRight => area.x + area.width - width,
        _ => area.x + (area.width - width) / 2,
    };
    let popup = Rect::new(x, area.y, width, 3.min(area.height));
    let paragraph = Paragraph::new(Span::styled(
        status.text.clone(),
        Style::default().fg(level_color(status.level)),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let line = match app
        .status()
        .filter(|status| status.position == NoticePosition::BottomLeft)
    {
        Some(status) => Line::from(vec![
            Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                status.text.clone(),
                Style::default().fg(level_color(status.level)),
            ),
        ]),
        None => {
            let doc = &app.document;
            let mut spans = vec![
                Span::styled("Scroll ", Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{}/{}  ", doc.scroll_top(), doc.content_height())),
            ];
            let selection = doc.selection_text();
            if !selection.is_empty() {
                spans.push(Span::styled(
                    "Selected ",
                    Style::default().fg(Color::DarkGray),
                ));
                spans.push(Span::raw(format!("{} chars  ", selection.chars().count())));
            }
            if let Some(visit) = app.hooks.visits().last() {
                spans.push(Span::styled("Last ", Style::default().fg(Color::DarkGray)));
                spans.push(Span::raw(visit.url.clone()));
            }
            Line::from(spans)
        }
    };
    f.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::White)),
        area,
    );
}

fn draw_hint_line(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::LightCyan);
    let mut spans = if app.capabilities().supports_long_press {
        vec![Span::styled("Hold", key), Span::raw(" Menu  ")]
    } else {
        vec![
            Span::styled("Right click", key),
            Span::raw(" Menu  "),
            Span::styled("Ctrl+Right", key),
            Span::raw(" Native  "),
        ]
    };
    spans.extend([
        Span::styled("Drag", key),
        Span::raw(" Select  "),
        Span::styled("Wheel", key),
        Span::raw(" Scroll  "),
    ]);
    if app.menu_visible() {
        spans.extend([Span::styled("Esc", key), Span::raw(" Close  ")]);
    }
    spans.extend([
        Span::styled("t", key),
        Span::raw(" Theme  "),
        Span::styled("q", key),
        Span::raw(" Quit"),
    ]);
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_keeps_rect_inside_page() {
        let page = Rect::new(0, 3, 80, 19);
        assert_eq!(
            clip(page, PageRect::new(70, 10, 20, 5)),
            Some(Rect::new(70, 13, 10, 5))
        );
        assert_eq!(
            clip(page, PageRect::new(-4, -2, 10, 4)),
            Some(Rect::new(0, 3, 6, 2))
        );
        assert_eq!(clip(page, PageRect::new(90, 0, 5, 5)), None);
    }
}
