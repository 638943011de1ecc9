//! Terminal viewer state: the loaded page, its context menu and the host
//! collaborators the menu talks to.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{Config, DomConfig, Messages};
use crate::core::{Notice, NoticePosition, NotifyLevel, Task};
use crate::infrastructure::runtime::{RuntimeEvent, TaskEvent};
use crate::menu::registry::apply_paste;
use crate::menu::resolver::resolve_url;
use crate::menu::{ClickDecision, ContextMenu, DeviceCapabilities};
use crate::page::{Document, ElementRef, Hooks, ListenerHandle, Page, Tag, Theme, Viewport};

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: NotifyLevel,
    pub position: NoticePosition,
    pub since: Instant,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    Navigate,
    Route,
    NewWindow,
}

/// Navigation requested by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub kind: VisitKind,
    pub url: String,
}

/// Global collaborators of the viewed page: router, theme store, snackbar
#[derive(Debug, Default)]
pub struct HostHooks {
    router: bool,
    theme_file: Option<PathBuf>,
    visits: Vec<Visit>,
    status: Option<StatusMessage>,
}

impl HostHooks {
    pub fn new(router: bool, theme_file: Option<PathBuf>) -> Self {
        Self {
            router,
            theme_file,
            ..Self::default()
        }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    fn show(&mut self, notice: &Notice) {
        self.status = Some(StatusMessage {
            text: notice.text.clone(),
            level: notice.level,
            position: notice.position,
            since: Instant::now(),
            duration: Duration::from_millis(notice.duration_ms),
        });
    }

    fn expire_status(&mut self, now: Instant) {
        if let Some(status) = self.status.as_ref() {
            if now.saturating_duration_since(status.since) > status.duration {
                self.status = None;
            }
        }
    }

    fn visit(&mut self, kind: VisitKind, url: &str) {
        log::info!("{kind:?} {url}");
        let label = match kind {
            VisitKind::Navigate => "Navigating to",
            VisitKind::Route => "Routed to",
            VisitKind::NewWindow => "Opened in a new tab:",
        };
        self.show(&Notice::info(format!("{label} {url}")));
        self.visits.push(Visit {
            kind,
            url: url.to_string(),
        });
    }
}

impl Hooks for HostHooks {
    fn navigate(&mut self, url: &str) {
        self.visit(VisitKind::Navigate, url);
    }

    fn open_window(&mut self, url: &str) {
        self.visit(VisitKind::NewWindow, url);
    }

    fn route(&mut self, href: &str) -> bool {
        if self.router {
            self.visit(VisitKind::Route, href);
        }
        self.router
    }

    fn persist_theme(&mut self, theme: Theme) {
        let Some(path) = self.theme_file.as_ref() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(path, theme.name()) {
            log::warn!("could not persist theme to {}: {err}", path.display());
        }
    }

    fn notify(&mut self, notice: &Notice) -> bool {
        self.show(notice);
        true
    }

    fn reset_comment_widgets(&mut self) {
        log::debug!("comment widgets re-themed");
    }
}

/// Theme saved by an earlier session
pub fn persisted_theme(path: &Path) -> Option<Theme> {
    let name = fs::read_to_string(path).ok()?;
    Theme::from_name(name.trim())
}

/// Text selection being dragged out with the primary button
#[derive(Debug, Clone, Copy)]
struct Drag {
    element: ElementRef,
    anchor: usize,
    moved: bool,
}

pub struct App {
    pub document: Document,
    pub menu: Option<ContextMenu>,
    pub hooks: HostHooks,
    pub should_quit: bool,
    /// Last pointer position in page coordinates
    pub hover: Option<(i32, i32)>,
    dom: DomConfig,
    messages: Messages,
    capabilities: DeviceCapabilities,
    drag: Option<Drag>,
    /// The current press already opened the menu; its release is not a click
    long_pressed: bool,
    tasks: Vec<Task>,
}

impl App {
    pub fn new(
        config: &Config,
        document: Document,
        capabilities: DeviceCapabilities,
        theme_file: Option<PathBuf>,
    ) -> Self {
        let menu = ContextMenu::attach(&document, config, capabilities);
        let mut app = Self {
            document,
            menu,
            hooks: HostHooks::new(config.router.enabled, theme_file),
            should_quit: false,
            hover: None,
            dom: config.dom.clone(),
            messages: config.messages.clone(),
            capabilities,
            drag: None,
            long_pressed: false,
            tasks: Vec::new(),
        };
        if app.menu.is_none() {
            app.set_status("This page has no menu container", NotifyLevel::Warn);
        }
        app
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: NotifyLevel) {
        let notice = match level {
            NotifyLevel::Info => Notice::info(text),
            NotifyLevel::Warn => Notice::warn(text),
            NotifyLevel::Error => Notice::error(text),
        };
        self.hooks.show(&notice);
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.hooks.status()
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    pub fn theme(&self) -> Theme {
        self.document
            .attribute(self.document.root(), &self.dom.theme_attribute)
            .and_then(|name| Theme::from_name(&name))
            .unwrap_or_default()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let root = self.document.root();
        self.document
            .set_attribute(root, &self.dom.theme_attribute, theme.name());
    }

    pub fn in_read_mode(&self) -> bool {
        self.document
            .has_class(self.document.body(), &self.dom.read_mode_class)
    }

    pub fn menu_visible(&self) -> bool {
        self.menu.as_ref().is_some_and(ContextMenu::is_visible)
    }

    /// Tasks queued for the runtime since the last call
    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks)
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.hooks.expire_status(now);
        if let Some(menu) = self.menu.as_mut() {
            if menu.tick(&mut self.document, now) {
                self.long_pressed = true;
                self.drag = None;
                self.document.layout();
            }
        }
    }

    // === Pointer input (page coordinates) ===

    pub fn secondary_click(&mut self, x: i32, y: i32, bypass: bool) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };
        self.drag = None;
        if menu.secondary_click(&mut self.document, x, y, bypass) == ClickDecision::Yield {
            self.set_status("Native context menu (Ctrl held)", NotifyLevel::Info);
        }
        self.document.layout();
    }

    pub fn pointer_down(&mut self, x: i32, y: i32, at: Instant) {
        if let Some(menu) = self.menu.as_mut() {
            menu.touch_start(&self.document, x, y, at);
        }
        self.drag = None;
        self.long_pressed = false;
        if self.menu_visible() {
            return;
        }
        let Some(element) = self.document.element_at(x, y) else {
            return;
        };
        if !matches!(
            self.document.tag(element),
            Some(Tag::Paragraph | Tag::Heading | Tag::Anchor)
        ) {
            return;
        }
        if let Some(anchor) = self.char_offset(element, x, y) {
            self.drag = Some(Drag {
                element,
                anchor,
                moved: false,
            });
        }
    }

    pub fn pointer_drag(&mut self, x: i32, y: i32) {
        if let Some(menu) = self.menu.as_mut() {
            menu.touch_move();
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let element = drag.element;
        let anchor = drag.anchor;
        drag.moved = true;
        if let Some(offset) = self.char_offset(element, x, y) {
            let (start, end) = if offset >= anchor {
                (anchor, offset + 1)
            } else {
                (offset, anchor + 1)
            };
            self.document.select(element, start, end);
        }
    }

    pub fn pointer_up(&mut self, x: i32, y: i32) {
        if let Some(menu) = self.menu.as_mut() {
            menu.touch_end();
        }
        if std::mem::take(&mut self.long_pressed) {
            return;
        }
        match self.drag.take() {
            Some(drag) if drag.moved => {
                let text = self.document.selection_text();
                log::debug!("selected {} chars", text.chars().count());
            }
            _ => self.click(x, y),
        }
    }

    /// Primary click: one-shot listeners first, then the page's own behavior
    pub fn click(&mut self, x: i32, y: i32) {
        let Some(target) = self.document.element_at(x, y) else {
            return;
        };
        let fired = self.document.dispatch_click(target);
        if !fired.is_empty() {
            self.route_fired(&fired, Some(target));
            return;
        }

        self.document.clear_selection();
        match self.document.tag(target) {
            Some(Tag::TextArea | Tag::Input) => self.document.focus(target),
            Some(Tag::Image) if self.document.enclosing_link(target).is_none() => {
                self.view_image(target)
            }
            _ => {
                if let Some(link) = self.document.enclosing_link(target) {
                    self.follow(link);
                }
            }
        }
        self.process_page_events();
    }

    pub fn scroll(&mut self, delta: i32) {
        let fired = self.document.dispatch_scroll(delta);
        self.route_fired(&fired, None);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let fired = self
            .document
            .dispatch_resize(Viewport { width, height });
        self.route_fired(&fired, None);
    }

    pub fn dismiss_menu(&mut self) {
        if let Some(menu) = self.menu.as_mut() {
            menu.dismiss(&mut self.document);
        }
    }

    pub fn toggle_theme(&mut self) {
        let next = self.theme().toggled();
        self.set_theme(next);
        self.hooks.persist_theme(next);
    }

    fn route_fired(&mut self, fired: &[ListenerHandle], clicked: Option<ElementRef>) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };
        if let Some(task) = menu.on_fired(&mut self.document, &mut self.hooks, fired, clicked) {
            self.tasks.push(task);
        }
        self.process_page_events();
    }

    /// React to clicks and input events the menu's actions dispatched
    fn process_page_events(&mut self) {
        for el in self.document.take_clicks() {
            match self.document.tag(el) {
                Some(Tag::Image) => self.view_image(el),
                Some(Tag::Button) if self.document.has_class(el, &self.dom.search_button_class) => {
                    self.run_search()
                }
                Some(Tag::Anchor) => self.follow(el),
                _ => {
                    let fired = self.document.dispatch_click(el);
                    if !fired.is_empty() {
                        self.route_fired(&fired, Some(el));
                    }
                }
            }
        }
        for el in self.document.take_inputs() {
            log::debug!("input event on {el:?}");
        }
        self.document.layout();
    }

    fn follow(&mut self, link: ElementRef) {
        if self.document.get_by_id(&self.dom.translate_link_id) == Some(link) {
            self.set_status("Translating page", NotifyLevel::Info);
            return;
        }
        let Some(href) = self.document.attribute(link, "href") else {
            return;
        };
        let url = resolve_url(self.document.location(), &href);
        self.hooks.navigate(&url);
    }

    fn view_image(&mut self, image: ElementRef) {
        let src = self.document.attribute(image, "src").unwrap_or_default();
        let url = resolve_url(self.document.location(), &src);
        self.set_status(format!("Viewing image {url}"), NotifyLevel::Info);
    }

    fn run_search(&mut self) {
        let query = self
            .document
            .get_by_class(&self.dom.search_input_class)
            .first()
            .and_then(|input| self.document.field(*input))
            .map(|field| field.value)
            .unwrap_or_default();
        if query.is_empty() {
            return;
        }
        let lower = query.to_lowercase();
        let hit = flow_elements(&self.document)
            .into_iter()
            .find(|el| self.document.text(*el).to_lowercase().contains(&lower));
        match hit.and_then(|el| self.document.bounding_box(el)) {
            Some(rect) => {
                let top = rect.y + self.document.scroll_top();
                self.document.scroll_to(top);
                self.set_status(format!("Found \"{query}\""), NotifyLevel::Info);
            }
            None => self.set_status(format!("No match for \"{query}\""), NotifyLevel::Warn),
        }
    }

    /// Character offset under a point inside a wrapped text element
    fn char_offset(&self, el: ElementRef, x: i32, y: i32) -> Option<usize> {
        let rect = self.document.bounding_box(el)?;
        if !rect.contains(x, y) {
            return None;
        }
        let offset = (y - rect.y) as usize * rect.width as usize + (x - rect.x) as usize;
        let len = self.document.text(el).chars().count();
        Some(offset.min(len.saturating_sub(1)))
    }

    // === Runtime results ===

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Task(TaskEvent::Notify(notice)) => self.hooks.show(&notice),
            RuntimeEvent::Task(TaskEvent::InsertText { field, text }) => {
                if apply_paste(&mut self.document, field, &text) {
                    let text = self.messages.pasted.clone();
                    self.set_status(text, NotifyLevel::Info);
                } else {
                    let text = self.messages.paste_failed.clone();
                    self.set_status(text, NotifyLevel::Warn);
                }
                self.document.layout();
            }
            RuntimeEvent::Error { message } => {
                log::error!("runtime: {message}");
                self.set_status(message, NotifyLevel::Error);
            }
        }
    }
}

/// Displayed flow elements in document order
pub fn flow_elements(doc: &Document) -> Vec<ElementRef> {
    fn walk(doc: &Document, el: ElementRef, out: &mut Vec<ElementRef>) {
        for child in doc.children(el) {
            if doc.is_fixed(child) || !doc.is_displayed(child) {
                continue;
            }
            match doc.tag(child) {
                Some(Tag::Div | Tag::Body) => walk(doc, child, out),
                Some(Tag::Menu | Tag::Overlay) | None => {}
                Some(_) => out.push(child),
            }
        }
    }
    let mut out = Vec::new();
    walk(doc, doc.body(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::loader::{build_document, parse_page};

    const PAGE: &str = r#"
url = "https://blog.example.com/posts/a/"
post = true

[[blocks]]
kind = "paragraph"
text = "Visit https://example.org today"

[[blocks]]
kind = "link"
text = "Next post"
href = "/posts/b/"

[[blocks]]
kind = "textarea"
class = "el-textarea__inner"
"#;

    fn app() -> App {
        let config = Config::default();
        let spec = parse_page(PAGE).unwrap();
        let doc = build_document(
            &spec,
            Viewport {
                width: 40,
                height: 12,
            },
            &config.dom,
        );
        App::new(&config, doc, DeviceCapabilities::pointer(), None)
    }

    #[test]
    fn test_drag_selects_text() {
        let mut app = app();
        let now = Instant::now();
        app.pointer_down(6, 0, now);
        app.pointer_drag(24, 0);
        app.pointer_up(24, 0);
        assert_eq!(app.document.selection_text(), "https://example.org");
    }

    #[test]
    fn test_right_click_then_outside_click_dismisses() {
        let mut app = app();
        app.secondary_click(2, 0, false);
        assert!(app.menu_visible());

        app.click(39, 11);
        assert!(!app.menu_visible());
        assert!(app.hooks.visits().is_empty());
    }

    #[test]
    fn test_bypass_leaves_menu_hidden() {
        let mut app = app();
        app.secondary_click(2, 0, true);
        assert!(!app.menu_visible());
        assert!(app.status().is_some());
    }

    #[test]
    fn test_open_menu_item_routes_same_origin_link() {
        let mut app = app();
        app.secondary_click(2, 1, false);
        let menu = app.menu.as_ref().unwrap();
        let rows = app.document.menu_rows(menu.presenter().menu());
        let open = rows
            .iter()
            .map(|(item, _)| *item)
            .find(|item| app.document.attribute(*item, "data-action").as_deref() == Some("open"))
            .unwrap();
        let rect = app.document.bounding_box(open).unwrap();

        app.click(rect.x, rect.y);
        assert!(!app.menu_visible());
        assert_eq!(
            app.hooks.visits(),
            &[Visit {
                kind: VisitKind::Route,
                url: "https://blog.example.com/posts/b/".into()
            }]
        );
    }

    #[test]
    fn test_long_press_release_keeps_menu_open() {
        let config = Config::default();
        let spec = parse_page(PAGE).unwrap();
        let doc = build_document(&spec, Viewport { width: 40, height: 12 }, &config.dom);
        let mut app = App::new(&config, doc, DeviceCapabilities::touch(), None);

        let start = Instant::now();
        app.pointer_down(2, 1, start);
        app.on_tick(start + Duration::from_millis(100));
        assert!(!app.menu_visible());
        app.on_tick(start + Duration::from_millis(400));
        assert!(app.menu_visible());

        app.pointer_up(2, 1);
        assert!(app.menu_visible());
        assert!(app.hooks.visits().is_empty());
    }

    #[test]
    fn test_paste_result_lands_in_field() {
        let mut app = app();
        let textarea = app.document.get_by_class("el-textarea__inner")[0];
        app.apply_runtime_event(RuntimeEvent::Task(TaskEvent::InsertText {
            field: textarea,
            text: "hi".into(),
        }));
        assert_eq!(app.document.field(textarea).unwrap().value, "hi");
        assert_eq!(app.document.focused(), Some(textarea));
        assert_eq!(app.status().unwrap().text, app.messages.pasted);
    }

    #[test]
    fn test_paste_into_removed_field_reports_failure() {
        let mut app = app();
        let textarea = app.document.get_by_class("el-textarea__inner")[0];
        app.document.remove(textarea);
        app.apply_runtime_event(RuntimeEvent::Task(TaskEvent::InsertText {
            field: textarea,
            text: "hi".into(),
        }));
        let status = app.status().unwrap();
        assert_eq!(status.text, app.messages.paste_failed);
        assert_eq!(status.level, NotifyLevel::Warn);
    }

    #[test]
    fn test_status_expires_after_its_duration() {
        let mut app = app();
        app.set_status("hello", NotifyLevel::Info);
        let since = app.status().unwrap().since;
        app.on_tick(since + Duration::from_millis(500));
        assert!(app.status().is_some());
        app.on_tick(since + Duration::from_secs(5));
        assert!(app.status().is_none());
    }

    #[test]
    fn test_theme_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme");
        let config = Config::default();
        let spec = parse_page(PAGE).unwrap();
        let doc = build_document(&spec, Viewport { width: 40, height: 12 }, &config.dom);
        let mut app = App::new(&config, doc, DeviceCapabilities::pointer(), Some(path.clone()));

        app.toggle_theme();
        assert_eq!(app.theme(), Theme::Dark);
        assert_eq!(persisted_theme(&path), Some(Theme::Dark));
    }
}
