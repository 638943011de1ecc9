//! In-memory document implementing the page contract

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use super::{
    ElementRef, FieldState, ListenerHandle, ListenerKind, Page, Rect, Tag, Viewport,
};

/// Rows a menu spends on its top and bottom border
const MENU_BORDER: u32 = 1;
const MENU_MIN_WIDTH: u32 = 12;

#[derive(Debug, Clone)]
struct Node {
    tag: Tag,
    parent: Option<ElementRef>,
    children: Vec<ElementRef>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    displayed: bool,
    /// Viewport position for fixed elements
    fixed: Option<(i32, i32)>,
    z_index: i32,
    /// Flow layout in document coordinates
    rect: Rect,
    field: Option<FieldState>,
    removed: bool,
}

impl Node {
    fn new(tag: Tag) -> Self {
        let field = matches!(tag, Tag::TextArea | Tag::Input).then(FieldState::default);
        Self {
            tag,
            parent: None,
            children: Vec::new(),
            classes: BTreeSet::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            displayed: true,
            fixed: None,
            z_index: 0,
            rect: Rect::default(),
            field,
            removed: false,
        }
    }
}

/// Character range selected inside one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub element: ElementRef,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    title: String,
    viewport: Viewport,
    nodes: Vec<Node>,
    root: ElementRef,
    body: ElementRef,
    scroll_top: i32,
    content_height: u32,
    selection: Option<TextSelection>,
    /// Slots of removed nodes, reused by later allocations
    free: Vec<ElementRef>,
    listeners: BTreeMap<ListenerHandle, ListenerKind>,
    next_listener: u64,
    focused: Option<ElementRef>,
    clicks: Vec<ElementRef>,
    inputs: Vec<ElementRef>,
}

impl Document {
    pub fn new(url: impl Into<String>, viewport: Viewport) -> Self {
        let mut doc = Self {
            url: url.into(),
            title: String::new(),
            viewport,
            nodes: Vec::new(),
            root: ElementRef(0),
            body: ElementRef(1),
            scroll_top: 0,
            content_height: 0,
            selection: None,
            free: Vec::new(),
            listeners: BTreeMap::new(),
            next_listener: 1,
            focused: None,
            clicks: Vec::new(),
            inputs: Vec::new(),
        };
        let root = doc.alloc(Tag::Html);
        let body = doc.alloc(Tag::Body);
        doc.nodes[body.0].parent = Some(root);
        doc.nodes[root.0].children.push(body);
        doc.root = root;
        doc.body = body;
        doc
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_location(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    fn alloc(&mut self, tag: Tag) -> ElementRef {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot.0] = Node::new(tag);
            return slot;
        }
        self.nodes.push(Node::new(tag));
        ElementRef(self.nodes.len() - 1)
    }

    fn node(&self, el: ElementRef) -> Option<&Node> {
        self.nodes.get(el.0).filter(|n| !n.removed)
    }

    fn node_mut(&mut self, el: ElementRef) -> Option<&mut Node> {
        self.nodes.get_mut(el.0).filter(|n| !n.removed)
    }

    /// Whether the element hangs off the document root
    fn is_connected(&self, el: ElementRef) -> bool {
        let mut current = Some(el);
        while let Some(e) = current {
            if e == self.root {
                return true;
            }
            current = self.node(e).and_then(|n| n.parent);
        }
        false
    }

    fn live_elements(&self) -> impl Iterator<Item = ElementRef> + '_ {
        (0..self.nodes.len())
            .map(ElementRef)
            .filter(|el| self.is_connected(*el))
    }

    /// Create an element with text and append it to `parent`
    pub fn append_text_element(&mut self, parent: ElementRef, tag: Tag, text: &str) -> ElementRef {
        let el = self.create_element(tag, "");
        self.set_text(el, text);
        self.append_child(parent, el);
        el
    }

    pub fn children(&self, el: ElementRef) -> Vec<ElementRef> {
        self.node(el).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn z_index(&self, el: ElementRef) -> i32 {
        self.node(el).map(|n| n.z_index).unwrap_or_default()
    }

    pub fn is_fixed(&self, el: ElementRef) -> bool {
        self.node(el).is_some_and(|n| n.fixed.is_some())
    }

    // === Layout ===

    /// Lay out the body's flow content top to bottom at the viewport width
    pub fn layout(&mut self) {
        let width = self.viewport.width.max(1);
        let body = self.body;
        let end = self.layout_children(body, 0, width);
        self.content_height = end.max(0) as u32;
        if let Some(node) = self.node_mut(body) {
            node.rect = Rect::new(0, 0, width, end.max(0) as u32);
        }
        self.scroll_top = self.scroll_top.clamp(0, self.max_scroll());
    }

    fn layout_children(&mut self, parent: ElementRef, mut y: i32, width: u32) -> i32 {
        for child in self.children(parent) {
            let Some(node) = self.node(child) else {
                continue;
            };
            if node.fixed.is_some() || !node.displayed {
                continue;
            }
            let tag = node.tag;
            let has_children = !node.children.is_empty();
            let height = match tag {
                Tag::Div | Tag::Body if has_children => {
                    let end = self.layout_children(child, y, width);
                    (end - y).max(0) as u32
                }
                _ => self.content_rows(child, width),
            };
            let rect = Rect::new(0, y, width, height);
            if let Some(node) = self.node_mut(child) {
                node.rect = rect;
            }
            // Inline content (an image inside a link) shares the parent's box
            if !matches!(tag, Tag::Div | Tag::Body) {
                for inner in self.children(child) {
                    if let Some(node) = self.node_mut(inner) {
                        node.rect = rect;
                    }
                }
            }
            y += height as i32;
        }
        y
    }

    fn content_rows(&self, el: ElementRef, width: u32) -> u32 {
        let Some(node) = self.node(el) else {
            return 0;
        };
        let explicit = node
            .attributes
            .get("rows")
            .and_then(|rows| rows.parse::<u32>().ok());
        match node.tag {
            Tag::TextArea => explicit.unwrap_or(3),
            Tag::Input | Tag::Image | Tag::Button => explicit.unwrap_or(1),
            _ => {
                let chars = node.text.chars().count() as u32;
                explicit.unwrap_or_else(|| chars.div_ceil(width).max(1))
            }
        }
    }

    pub fn content_height(&self) -> u32 {
        self.content_height
    }

    fn max_scroll(&self) -> i32 {
        (self.content_height as i32 - self.viewport.height as i32).max(0)
    }

    /// Visible items of a menu with their row offsets inside the menu box
    pub fn menu_rows(&self, menu: ElementRef) -> Vec<(ElementRef, i32)> {
        let mut rows = Vec::new();
        let mut row = MENU_BORDER as i32;
        for group in self.children(menu) {
            if !self.node(group).is_some_and(|n| n.displayed) {
                continue;
            }
            let items: Vec<ElementRef> = self
                .children(group)
                .into_iter()
                .filter(|item| self.node(*item).is_some_and(|n| n.displayed))
                .collect();
            if items.is_empty() {
                continue;
            }
            if !rows.is_empty() {
                // separator between groups
                row += 1;
            }
            for item in items {
                rows.push((item, row));
                row += 1;
            }
        }
        rows
    }

    fn menu_size(&self, menu: ElementRef) -> (u32, u32) {
        let rows = self.menu_rows(menu);
        let label_width = rows
            .iter()
            .map(|(item, _)| self.text(*item).chars().count() as u32)
            .max()
            .unwrap_or(0);
        let width = (label_width + 4).max(MENU_MIN_WIDTH);
        let height = rows.last().map(|(_, row)| *row as u32 + 1).unwrap_or(0) + MENU_BORDER;
        (width, height)
    }

    /// Nearest ancestor (or self) with the given tag
    fn ancestor_with_tag(&self, el: ElementRef, tag: Tag) -> Option<ElementRef> {
        let mut current = Some(el);
        while let Some(e) = current {
            if self.tag(e) == Some(tag) {
                return Some(e);
            }
            current = self.parent(e);
        }
        None
    }

    fn deepest_at(&self, el: ElementRef, x: i32, y: i32) -> ElementRef {
        for child in self.children(el).into_iter().rev() {
            if self.node(child).is_some_and(|n| n.fixed.is_some()) || !self.is_displayed(child) {
                continue;
            }
            if self.bounding_box(child).is_some_and(|r| r.contains(x, y)) {
                return self.deepest_at(child, x, y);
            }
        }
        el
    }

    // === Selection ===

    pub fn select(&mut self, element: ElementRef, start: usize, end: usize) {
        let len = self.text(element).chars().count();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.selection = (start < end).then_some(TextSelection {
            element,
            start,
            end,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<TextSelection> {
        self.selection
    }

    // === Events ===

    fn fire(&mut self, matches: impl Fn(&ListenerKind) -> bool) -> Vec<ListenerHandle> {
        let fired: Vec<ListenerHandle> = self
            .listeners
            .iter()
            .filter(|(_, kind)| matches(kind))
            .map(|(handle, _)| *handle)
            .collect();
        for handle in &fired {
            self.listeners.remove(handle);
        }
        fired
    }

    /// Deliver a click to the target and its ancestors, consuming one-shot listeners
    pub fn dispatch_click(&mut self, target: ElementRef) -> Vec<ListenerHandle> {
        let mut path = BTreeSet::new();
        let mut current = Some(target);
        while let Some(e) = current {
            path.insert(e);
            current = self.parent(e);
        }
        self.fire(|kind| matches!(kind, ListenerKind::Click(el) if path.contains(el)))
    }

    /// Scroll by `delta` rows and deliver the scroll event
    pub fn dispatch_scroll(&mut self, delta: i32) -> Vec<ListenerHandle> {
        let top = self.scroll_top + delta;
        self.scroll_to(top);
        self.fire(|kind| matches!(kind, ListenerKind::Scroll))
    }

    pub fn dispatch_resize(&mut self, viewport: Viewport) -> Vec<ListenerHandle> {
        self.viewport = viewport;
        self.layout();
        self.fire(|kind| matches!(kind, ListenerKind::Resize))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Elements clicked programmatically since the last call
    pub fn take_clicks(&mut self) -> Vec<ElementRef> {
        std::mem::take(&mut self.clicks)
    }

    /// Elements that received an input event since the last call
    pub fn take_inputs(&mut self) -> Vec<ElementRef> {
        std::mem::take(&mut self.inputs)
    }

    pub fn focused(&self) -> Option<ElementRef> {
        self.focused
    }

    /// Nearest enclosing link, if any
    pub fn enclosing_link(&self, el: ElementRef) -> Option<ElementRef> {
        self.ancestor_with_tag(el, Tag::Anchor)
    }
}

impl Page for Document {
    fn location(&self) -> &str {
        &self.url
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn root(&self) -> ElementRef {
        self.root
    }

    fn body(&self) -> ElementRef {
        self.body
    }

    fn selection_text(&self) -> String {
        let Some(sel) = self.selection else {
            return String::new();
        };
        if !self.is_connected(sel.element) {
            return String::new();
        }
        self.text(sel.element)
            .chars()
            .skip(sel.start)
            .take(sel.end - sel.start)
            .collect()
    }

    fn element_at(&self, x: i32, y: i32) -> Option<ElementRef> {
        if x < 0 || y < 0 || x >= self.viewport.width as i32 || y >= self.viewport.height as i32 {
            return None;
        }
        let mut layers: Vec<ElementRef> = self
            .live_elements()
            .filter(|el| self.is_fixed(*el) && self.is_displayed(*el))
            .collect();
        layers.sort_by_key(|el| Reverse(self.z_index(*el)));
        for layer in layers {
            if self.bounding_box(layer).is_some_and(|r| r.contains(x, y)) {
                if self.tag(layer) == Some(Tag::Menu) {
                    let item = self
                        .menu_rows(layer)
                        .into_iter()
                        .map(|(item, _)| item)
                        .find(|item| self.bounding_box(*item).is_some_and(|r| r.contains(x, y)));
                    return Some(item.unwrap_or(layer));
                }
                return Some(self.deepest_at(layer, x, y));
            }
        }
        Some(self.deepest_at(self.body, x, y))
    }

    fn tag(&self, el: ElementRef) -> Option<Tag> {
        self.node(el).map(|n| n.tag)
    }

    fn parent(&self, el: ElementRef) -> Option<ElementRef> {
        self.node(el).and_then(|n| n.parent)
    }

    fn attribute(&self, el: ElementRef, name: &str) -> Option<String> {
        self.node(el).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, el: ElementRef, name: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn text(&self, el: ElementRef) -> String {
        self.node(el).map(|n| n.text.clone()).unwrap_or_default()
    }

    fn set_text(&mut self, el: ElementRef, text: &str) {
        if let Some(node) = self.node_mut(el) {
            node.text = text.to_string();
        }
    }

    fn get_by_id(&self, id: &str) -> Option<ElementRef> {
        self.live_elements()
            .find(|el| self.attribute(*el, "id").as_deref() == Some(id))
    }

    fn get_by_class(&self, class: &str) -> Vec<ElementRef> {
        self.live_elements()
            .filter(|el| self.has_class(*el, class))
            .collect()
    }

    fn has_class(&self, el: ElementRef, class: &str) -> bool {
        self.node(el).is_some_and(|n| n.classes.contains(class))
    }

    fn add_class(&mut self, el: ElementRef, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, el: ElementRef, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.remove(class);
        }
    }

    fn set_displayed(&mut self, el: ElementRef, displayed: bool) {
        if let Some(node) = self.node_mut(el) {
            node.displayed = displayed;
        }
    }

    fn is_displayed(&self, el: ElementRef) -> bool {
        let mut current = Some(el);
        while let Some(e) = current {
            match self.node(e) {
                Some(node) if node.displayed => current = node.parent,
                _ => return false,
            }
        }
        self.is_connected(el)
    }

    fn bounding_box(&self, el: ElementRef) -> Option<Rect> {
        if !self.is_displayed(el) {
            return None;
        }
        let node = self.node(el)?;
        if let Some((x, y)) = node.fixed {
            return Some(match node.tag {
                Tag::Menu => {
                    let (width, height) = self.menu_size(el);
                    Rect::new(x, y, width, height)
                }
                Tag::Overlay => Rect::new(x, y, self.viewport.width, self.viewport.height),
                _ => Rect::new(x, y, node.rect.width, node.rect.height),
            });
        }
        if node.tag == Tag::MenuItem || node.tag == Tag::MenuGroup {
            let menu = self.ancestor_with_tag(el, Tag::Menu)?;
            let menu_box = self.bounding_box(menu)?;
            let rows: Vec<i32> = self
                .menu_rows(menu)
                .into_iter()
                .filter(|(item, _)| *item == el || self.parent(*item) == Some(el))
                .map(|(_, row)| row)
                .collect();
            let first = *rows.first()?;
            let last = *rows.last()?;
            return Some(Rect::new(
                menu_box.x + 1,
                menu_box.y + first,
                menu_box.width.saturating_sub(2),
                (last - first + 1) as u32,
            ));
        }
        Some(Rect::new(
            node.rect.x,
            node.rect.y - self.scroll_top,
            node.rect.width,
            node.rect.height,
        ))
    }

    fn set_position(&mut self, el: ElementRef, x: i32, y: i32) {
        if let Some(node) = self.node_mut(el) {
            node.fixed = Some((x, y));
        }
    }

    fn set_z_index(&mut self, el: ElementRef, z: i32) {
        if let Some(node) = self.node_mut(el) {
            node.z_index = z;
        }
    }

    fn create_element(&mut self, tag: Tag, class: &str) -> ElementRef {
        let el = self.alloc(tag);
        for class in class.split_whitespace() {
            self.nodes[el.0].classes.insert(class.to_string());
        }
        el
    }

    fn append_child(&mut self, parent: ElementRef, child: ElementRef) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn remove(&mut self, el: ElementRef) {
        if el == self.root || el == self.body || self.node(el).is_none() {
            return;
        }
        if let Some(parent) = self.nodes[el.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != el);
        }
        let mut stack = vec![el];
        while let Some(e) = stack.pop() {
            stack.extend(self.nodes[e.0].children.iter().copied());
            self.nodes[e.0].removed = true;
            self.free.push(e);
            self.listeners
                .retain(|_, kind| !matches!(kind, ListenerKind::Click(target) if *target == e));
            if self.focused == Some(e) {
                self.focused = None;
            }
            if self.selection.is_some_and(|s| s.element == e) {
                self.selection = None;
            }
        }
    }

    fn field(&self, el: ElementRef) -> Option<FieldState> {
        self.node(el).and_then(|n| n.field.clone())
    }

    fn set_field(&mut self, el: ElementRef, state: FieldState) {
        if let Some(node) = self.node_mut(el) {
            if node.field.is_some() {
                node.field = Some(state);
            }
        }
    }

    fn focus(&mut self, el: ElementRef) {
        if self.node(el).is_some() {
            self.focused = Some(el);
        }
    }

    fn click(&mut self, el: ElementRef) {
        if self.node(el).is_some() {
            self.clicks.push(el);
        }
    }

    fn dispatch_input(&mut self, el: ElementRef) {
        if self.node(el).is_some() {
            self.inputs.push(el);
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
        let handle = ListenerHandle(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(handle, kind);
        handle
    }

    fn remove_listener(&mut self, handle: ListenerHandle) {
        self.listeners.remove(&handle);
    }

    fn scroll_top(&self) -> i32 {
        self.scroll_top
    }

    fn scroll_to(&mut self, top: i32) {
        self.scroll_top = top.clamp(0, self.max_scroll());
    }
}
