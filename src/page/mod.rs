//! Host page contract
//!
//! The menu never talks to a concrete DOM. It consumes the [`Page`] trait for
//! element queries and mutations and the [`Hooks`] trait for the page's global
//! collaborators (router, theme switcher, snackbar, ...). [`Document`] is the
//! in-memory implementation used by the terminal viewer and the tests.

pub mod document;
pub mod loader;
pub mod markup;

pub use document::Document;

use crate::core::Notice;

/// Opaque element handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementRef(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Html,
    Body,
    Div,
    Heading,
    Paragraph,
    Anchor,
    Image,
    TextArea,
    Input,
    Button,
    Menu,
    MenuGroup,
    MenuItem,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Value and caret of an editable field. Offsets count characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldState {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
    pub scroll_top: u32,
}

/// One-shot event listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Click on the element or any descendant
    Click(ElementRef),
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_name(name: &str) -> Option<Theme> {
        match name {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// DOM operations the menu relies on
pub trait Page {
    /// Absolute URL of the current page
    fn location(&self) -> &str;
    fn viewport(&self) -> Viewport;
    /// Document element (`<html>`)
    fn root(&self) -> ElementRef;
    fn body(&self) -> ElementRef;
    /// Currently selected text, empty when nothing is selected
    fn selection_text(&self) -> String;
    /// Topmost displayed element at viewport coordinates
    fn element_at(&self, x: i32, y: i32) -> Option<ElementRef>;

    /// `None` once the element is detached
    fn tag(&self, el: ElementRef) -> Option<Tag>;
    fn parent(&self, el: ElementRef) -> Option<ElementRef>;
    fn attribute(&self, el: ElementRef, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementRef, name: &str, value: &str);
    fn text(&self, el: ElementRef) -> String;
    fn set_text(&mut self, el: ElementRef, text: &str);

    fn get_by_id(&self, id: &str) -> Option<ElementRef>;
    fn get_by_class(&self, class: &str) -> Vec<ElementRef>;
    fn has_class(&self, el: ElementRef, class: &str) -> bool;
    fn add_class(&mut self, el: ElementRef, class: &str);
    fn remove_class(&mut self, el: ElementRef, class: &str);

    fn set_displayed(&mut self, el: ElementRef, displayed: bool);
    fn is_displayed(&self, el: ElementRef) -> bool;
    fn bounding_box(&self, el: ElementRef) -> Option<Rect>;
    /// Fix the element at viewport coordinates
    fn set_position(&mut self, el: ElementRef, x: i32, y: i32);
    fn set_z_index(&mut self, el: ElementRef, z: i32);

    fn create_element(&mut self, tag: Tag, class: &str) -> ElementRef;
    fn append_child(&mut self, parent: ElementRef, child: ElementRef);
    fn remove(&mut self, el: ElementRef);
    fn is_attached(&self, el: ElementRef) -> bool {
        self.tag(el).is_some()
    }

    fn field(&self, el: ElementRef) -> Option<FieldState>;
    fn set_field(&mut self, el: ElementRef, state: FieldState);
    fn focus(&mut self, el: ElementRef);
    fn click(&mut self, el: ElementRef);
    fn dispatch_input(&mut self, el: ElementRef);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle;
    fn remove_listener(&mut self, handle: ListenerHandle);

    fn scroll_top(&self) -> i32;
    fn scroll_to(&mut self, top: i32);
}

/// Global collaborators of the host page.
///
/// Only full navigation and opening a new tab are mandatory. Every other hook
/// answers whether it was available; callers fall back when it was not.
pub trait Hooks {
    fn navigate(&mut self, url: &str);
    fn open_window(&mut self, url: &str);

    /// Client-side router navigation
    fn route(&mut self, _href: &str) -> bool {
        false
    }

    fn activate_theme(&mut self, _theme: Theme) -> bool {
        false
    }

    fn persist_theme(&mut self, _theme: Theme) {}

    /// Snackbar display
    fn notify(&mut self, _notice: &Notice) -> bool {
        false
    }

    fn smooth_scroll(&mut self, _top: i32) -> bool {
        false
    }

    /// Re-theme third-party comment widgets
    fn reset_comment_widgets(&mut self) {}
}

/// Show a notice through the snackbar hook, logging it when none is installed
pub fn notify(hooks: &mut dyn Hooks, notice: Notice) {
    if !hooks.notify(&notice) {
        log::info!("notice: {}", notice.text);
    }
}
