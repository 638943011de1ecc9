//! Menu presenter: positioning, overlay and dismissal listeners

use crate::config::DomConfig;
use crate::core::{ActionGroup, ActionId};
use crate::page::{ElementRef, ListenerHandle, ListenerKind, Page, Tag, Viewport};

pub const OVERLAY_Z_INDEX: i32 = 998;
pub const MENU_Z_INDEX: i32 = 19198;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenterState {
    #[default]
    Hidden,
    Positioning,
    Visible,
}

/// Transient state of the visible menu, emptied on every dismissal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub overlay: Option<ElementRef>,
    pub current_target: Option<ElementRef>,
}

/// What closed the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Click on the overlay
    Outside,
    Scroll,
    Resize,
    /// Click inside the menu; `None` when it missed every item
    Item(Option<ElementRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Outside,
    Menu,
    Scroll,
    Resize,
}

/// Top-left corner that keeps a `size` menu opened at `pointer` inside the viewport
pub fn compute_position(
    pointer: (i32, i32),
    size: (u32, u32),
    viewport: Viewport,
    offset: i32,
) -> (i32, i32) {
    let (width, height) = (size.0 as i32, size.1 as i32);
    let (max_x, max_y) = (viewport.width as i32, viewport.height as i32);

    let mut x = pointer.0 + offset;
    let mut y = pointer.1;
    if x + width > max_x {
        // flip to the left of the pointer
        x -= width + offset;
    }
    if y + height > max_y {
        y = max_y - height;
    }
    (
        x.clamp(0, (max_x - width).max(0)),
        y.clamp(0, (max_y - height).max(0)),
    )
}

#[derive(Debug)]
pub struct MenuPresenter {
    dom: DomConfig,
    menu: ElementRef,
    offset: i32,
    state: PresenterState,
    menu_state: MenuState,
    listeners: Vec<(ListenerHandle, Slot)>,
}

impl MenuPresenter {
    pub fn new(menu: ElementRef, dom: DomConfig, offset: i32) -> Self {
        Self {
            dom,
            menu,
            offset,
            state: PresenterState::Hidden,
            menu_state: MenuState::default(),
            listeners: Vec::new(),
        }
    }

    pub fn menu(&self) -> ElementRef {
        self.menu
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn menu_state(&self) -> MenuState {
        self.menu_state
    }

    pub fn is_visible(&self) -> bool {
        self.state == PresenterState::Visible
    }

    /// Position and reveal the menu for `target`. A visible menu is torn down
    /// first, so a new activation supersedes the previous one.
    pub fn show(&mut self, page: &mut dyn Page, target: ElementRef, x: i32, y: i32) {
        if self.state != PresenterState::Hidden {
            self.dismiss(page);
        }

        self.state = PresenterState::Positioning;
        page.set_displayed(self.menu, true);
        page.set_position(self.menu, x, y);
        let size = page
            .bounding_box(self.menu)
            .map(|rect| (rect.width, rect.height))
            .unwrap_or_default();
        let (left, top) = compute_position((x, y), size, page.viewport(), self.offset);
        page.set_position(self.menu, left, top);

        let overlay = self.ensure_overlay(page);
        self.listeners = vec![
            (page.add_listener(ListenerKind::Click(overlay)), Slot::Outside),
            (page.add_listener(ListenerKind::Click(self.menu)), Slot::Menu),
            (page.add_listener(ListenerKind::Scroll), Slot::Scroll),
            (page.add_listener(ListenerKind::Resize), Slot::Resize),
        ];
        self.menu_state = MenuState {
            overlay: Some(overlay),
            current_target: Some(target),
        };
        self.state = PresenterState::Visible;
        log::debug!("menu shown at ({left}, {top}) size {size:?}");
    }

    /// Reuse the existing overlay or create one above the page and below the menu
    fn ensure_overlay(&mut self, page: &mut dyn Page) -> ElementRef {
        let overlay = match page.get_by_class(&self.dom.overlay_class).first() {
            Some(existing) => *existing,
            None => {
                let overlay = page.create_element(Tag::Overlay, &self.dom.overlay_class);
                let body = page.body();
                page.append_child(body, overlay);
                page.set_position(overlay, 0, 0);
                page.set_z_index(overlay, OVERLAY_Z_INDEX);
                overlay
            }
        };
        page.set_z_index(self.menu, MENU_Z_INDEX);
        overlay
    }

    /// Route a fired listener. Returns how the menu closed when the handle
    /// belonged to it; `clicked` is the element that received a click.
    pub fn handle_fired(
        &mut self,
        page: &mut dyn Page,
        handle: ListenerHandle,
        clicked: Option<ElementRef>,
    ) -> Option<Dismissal> {
        let slot = self
            .listeners
            .iter()
            .find(|(registered, _)| *registered == handle)
            .map(|(_, slot)| *slot)?;

        let dismissal = match slot {
            Slot::Outside => Dismissal::Outside,
            Slot::Scroll => Dismissal::Scroll,
            Slot::Resize => Dismissal::Resize,
            Slot::Menu => Dismissal::Item(clicked.and_then(|el| self.enclosing_item(page, el))),
        };
        self.dismiss(page);
        log::debug!("menu dismissed by {dismissal:?}");
        Some(dismissal)
    }

    /// Hide the menu, remove every overlay and unregister all listeners.
    /// Safe to call in any state.
    pub fn dismiss(&mut self, page: &mut dyn Page) {
        for (handle, _) in self.listeners.drain(..) {
            page.remove_listener(handle);
        }
        for overlay in page.get_by_class(&self.dom.overlay_class) {
            page.remove(overlay);
        }
        page.set_displayed(self.menu, false);
        self.menu_state = MenuState::default();
        self.state = PresenterState::Hidden;
    }

    fn enclosing_item(&self, page: &dyn Page, el: ElementRef) -> Option<ElementRef> {
        let mut current = Some(el);
        while let Some(e) = current {
            if e == self.menu {
                return None;
            }
            if page.has_class(e, &self.dom.item_class) {
                return Some(e);
            }
            current = page.parent(e);
        }
        None
    }

    /// Group and action a menu item stands for
    pub fn item_action(&self, page: &dyn Page, item: ElementRef) -> Option<(ActionGroup, ActionId)> {
        let action = page
            .attribute(item, &self.dom.action_attribute)
            .and_then(|name| ActionId::from_name(&name))?;
        let group = page
            .parent(item)
            .and_then(|parent| page.attribute(parent, "id"))
            .and_then(|id| self.dom.group_for_id(&id))?;
        Some((group, action))
    }

    #[cfg(test)]
    pub(crate) fn listener_handles(&self) -> Vec<ListenerHandle> {
        self.listeners.iter().map(|(handle, _)| *handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{markup, Document};

    fn setup() -> (Document, MenuPresenter, ElementRef) {
        let dom = DomConfig::default();
        let mut doc = Document::new(
            "https://blog.example.com/",
            Viewport {
                width: 80,
                height: 24,
            },
        );
        let body = doc.body();
        let para = doc.append_text_element(body, Tag::Paragraph, "hello");
        let menu = markup::install_menu(&mut doc, &dom);
        doc.layout();
        (doc, MenuPresenter::new(menu, dom, 10), para)
    }

    #[test]
    fn test_position_flips_and_pins() {
        let viewport = Viewport {
            width: 100,
            height: 40,
        };
        assert_eq!(compute_position((5, 5), (20, 10), viewport, 10), (15, 5));
        // right edge: flip left of the pointer
        assert_eq!(compute_position((90, 5), (20, 10), viewport, 10), (70, 5));
        // bottom edge: pin to the bottom
        assert_eq!(compute_position((5, 35), (20, 10), viewport, 10), (15, 30));
        // larger than the viewport
        assert_eq!(compute_position((50, 20), (200, 80), viewport, 10), (0, 0));
    }

    #[test]
    fn test_position_stays_inside_viewport() {
        let viewport = Viewport {
            width: 60,
            height: 30,
        };
        for width in [1u32, 12, 30, 60] {
            for height in [1u32, 8, 30] {
                for x in (-5..70).step_by(3) {
                    for y in (-5..40).step_by(3) {
                        let (left, top) =
                            compute_position((x, y), (width, height), viewport, 10);
                        assert!(left >= 0 && left + width as i32 <= 60, "x={x} w={width}");
                        assert!(top >= 0 && top + height as i32 <= 30, "y={y} h={height}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_show_installs_overlay_and_listeners() {
        let (mut doc, mut presenter, para) = setup();
        presenter.show(&mut doc, para, 3, 2);

        assert!(presenter.is_visible());
        let overlays = doc.get_by_class("rmMask");
        assert_eq!(overlays.len(), 1);
        assert_eq!(doc.z_index(overlays[0]), OVERLAY_Z_INDEX);
        assert_eq!(doc.z_index(presenter.menu()), MENU_Z_INDEX);
        assert_eq!(doc.listener_count(), 4);
        assert_eq!(
            presenter.menu_state(),
            MenuState {
                overlay: Some(overlays[0]),
                current_target: Some(para)
            }
        );
        let rect = doc.bounding_box(presenter.menu()).unwrap();
        assert_eq!((rect.x, rect.y), (13, 2));
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let (mut doc, mut presenter, para) = setup();
        presenter.dismiss(&mut doc);
        presenter.show(&mut doc, para, 3, 2);
        presenter.dismiss(&mut doc);
        presenter.dismiss(&mut doc);

        assert_eq!(presenter.state(), PresenterState::Hidden);
        assert!(doc.get_by_class("rmMask").is_empty());
        assert!(!doc.is_displayed(presenter.menu()));
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(presenter.menu_state(), MenuState::default());
    }

    #[test]
    fn test_reactivation_keeps_one_overlay() {
        let (mut doc, mut presenter, para) = setup();
        for x in 0..5 {
            presenter.show(&mut doc, para, x, x);
            assert_eq!(doc.get_by_class("rmMask").len(), 1);
            assert_eq!(doc.listener_count(), 4);
        }
    }

    #[test]
    fn test_scroll_tears_everything_down() {
        let (mut doc, mut presenter, para) = setup();
        presenter.show(&mut doc, para, 3, 2);
        let fired = doc.dispatch_scroll(1);
        assert_eq!(fired.len(), 1);

        let dismissal = presenter.handle_fired(&mut doc, fired[0], None);
        assert_eq!(dismissal, Some(Dismissal::Scroll));
        assert_eq!(doc.listener_count(), 0);
        assert!(doc.get_by_class("rmMask").is_empty());
        // a stale handle no longer belongs to the menu
        assert_eq!(presenter.handle_fired(&mut doc, fired[0], None), None);
    }

    #[test]
    fn test_item_click_reports_group_and_action() {
        let (mut doc, mut presenter, para) = setup();
        presenter.show(&mut doc, para, 3, 2);
        let rect = doc.bounding_box(presenter.menu()).unwrap();
        // first visible item is the first entry of the page group
        let item = doc.element_at(rect.x + 2, rect.y + 1).unwrap();
        let fired = doc.dispatch_click(item);
        assert_eq!(fired.len(), 1);

        let dismissal = presenter.handle_fired(&mut doc, fired[0], Some(item));
        assert_eq!(dismissal, Some(Dismissal::Item(Some(item))));
        assert_eq!(
            presenter.item_action(&doc, item),
            Some((ActionGroup::Page, ActionId::ScrollToTop))
        );
        assert!(presenter.listener_handles().is_empty());
    }
}
