//! Action registry: executes bound invocations against the page

use crate::config::{DomConfig, Messages};
use crate::core::{Invocation, Notice, NoticePosition, Task};
use crate::page::{self, ElementRef, FieldState, Hooks, ListenerHandle, ListenerKind, Page, Tag, Theme};

/// Label of the button that leaves reading mode
const EXIT_READ_MODE_LABEL: &str = "Exit reading mode";
/// The download notice stays up until the task reports back
const DOWNLOADING_NOTICE_MS: u64 = 10_000;

/// Result of executing an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Finished synchronously
    Done,
    /// Continue on the runtime worker
    Spawn(Task),
    /// Reading mode is on; the listener fires when its exit button is clicked
    ReadMode(ListenerHandle),
}

/// Best-effort same-origin test. Relative hrefs and hrefs on the page's host
/// are internal. Not a security boundary.
pub fn is_same_origin(location: &str, href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return true;
    }
    match (url::Url::parse(location), url::Url::parse(href)) {
        (Ok(page_url), Ok(target)) => {
            page_url.host_str().is_some() && page_url.host_str() == target.host_str()
        }
        _ => false,
    }
}

/// Replace the field's selected range with `text` and collapse the caret after it.
/// Offsets are characters; the scroll offset is kept.
pub fn insert_at_cursor(field: &mut FieldState, text: &str) {
    let len = field.value.chars().count();
    let start = field.selection_start.min(len);
    let end = field.selection_end.clamp(start, len);
    let head: String = field.value.chars().take(start).collect();
    let tail: String = field.value.chars().skip(end).collect();
    field.value = format!("{head}{text}{tail}");

    let caret = start + text.chars().count();
    field.selection_start = caret;
    field.selection_end = caret;
}

/// Insert pasted text into a field that may have been detached meanwhile
pub fn apply_paste(page: &mut dyn Page, field: ElementRef, text: &str) -> bool {
    let Some(mut state) = page.field(field) else {
        return false;
    };
    insert_at_cursor(&mut state, text);
    page.set_field(field, state);
    page.focus(field);
    true
}

#[derive(Debug, Clone)]
pub struct ActionRegistry {
    dom: DomConfig,
    messages: Messages,
    router: bool,
}

impl ActionRegistry {
    pub fn new(dom: DomConfig, messages: Messages, router: bool) -> Self {
        Self {
            dom,
            messages,
            router,
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn execute(
        &self,
        invocation: &Invocation,
        page: &mut dyn Page,
        hooks: &mut dyn Hooks,
    ) -> Outcome {
        log::info!("action {}", invocation.id().name());
        match invocation {
            Invocation::Open { href } => {
                self.open(page.location(), href, hooks);
                Outcome::Done
            }
            Invocation::OpenInNewTab { url } => {
                hooks.open_window(url);
                Outcome::Done
            }
            Invocation::CopyLink { url } => Outcome::Spawn(Task::CopyText {
                text: url.clone(),
                success: self.messages.link_copied.clone(),
            }),
            Invocation::CopyPageLink { url } => Outcome::Spawn(Task::CopyText {
                text: url.clone(),
                success: self.messages.page_link_copied.clone(),
            }),
            Invocation::CopySelection { text } => {
                if text.is_empty() {
                    return Outcome::Done;
                }
                Outcome::Spawn(Task::CopyText {
                    text: text.clone(),
                    success: self.messages.selection_copied.clone(),
                })
            }
            Invocation::SaveImageAs { src, file_name } => {
                page::notify(
                    hooks,
                    Notice::info(&self.messages.downloading).lasting(DOWNLOADING_NOTICE_MS),
                );
                Outcome::Spawn(Task::DownloadImage {
                    src: src.clone(),
                    file_name: file_name.clone(),
                })
            }
            Invocation::ClickImage { element } => {
                page.click(*element);
                Outcome::Done
            }
            Invocation::Paste { field } => {
                if !page.is_attached(*field) {
                    log::debug!("paste target is gone");
                    page::notify(hooks, Notice::warn(&self.messages.paste_failed));
                    return Outcome::Done;
                }
                Outcome::Spawn(Task::Paste { field: *field })
            }
            Invocation::SearchInPage { query } => {
                self.search_in_page(page, hooks, query);
                Outcome::Done
            }
            Invocation::QuoteSelection { text } => {
                self.quote_selection(page, hooks, text);
                Outcome::Done
            }
            Invocation::ReadMode => Outcome::ReadMode(self.enter_read_mode(page)),
            Invocation::ScrollToTop => {
                if !hooks.smooth_scroll(0) {
                    page.scroll_to(0);
                }
                Outcome::Done
            }
            Invocation::SwitchTheme => {
                self.switch_theme(page, hooks);
                Outcome::Done
            }
            Invocation::Translate => {
                match page.get_by_id(&self.dom.translate_link_id) {
                    Some(link) => page.click(link),
                    None => page::notify(hooks, Notice::warn(&self.messages.translate_unavailable)),
                }
                Outcome::Done
            }
        }
    }

    fn open(&self, location: &str, href: &str, hooks: &mut dyn Hooks) {
        if href.is_empty() {
            return;
        }
        if is_same_origin(location, href) && self.router && hooks.route(href) {
            log::debug!("routed {href}");
            return;
        }
        hooks.navigate(href);
    }

    fn search_in_page(&self, page: &mut dyn Page, hooks: &mut dyn Hooks, query: &str) {
        let input = page.get_by_class(&self.dom.search_input_class).first().copied();
        let button = page.get_by_class(&self.dom.search_button_class).first().copied();
        let (Some(input), Some(button)) = (input, button) else {
            page::notify(hooks, Notice::warn(&self.messages.search_unavailable));
            return;
        };
        let caret = query.chars().count();
        page.set_field(
            input,
            FieldState {
                value: query.to_string(),
                selection_start: caret,
                selection_end: caret,
                scroll_top: 0,
            },
        );
        page.click(button);
        page.dispatch_input(input);
    }

    fn quote_selection(&self, page: &mut dyn Page, hooks: &mut dyn Hooks, text: &str) {
        let Some(textarea) = page.get_by_class(&self.dom.comment_textarea_class).first().copied()
        else {
            log::debug!("no comment box to quote into");
            return;
        };
        let quoted = format!("> {text}\n\n");
        let caret = quoted.chars().count();
        page.set_field(
            textarea,
            FieldState {
                value: quoted,
                selection_start: caret,
                selection_end: caret,
                scroll_top: 0,
            },
        );
        page.dispatch_input(textarea);
        page::notify(
            hooks,
            Notice::info(&self.messages.quote_hint).at(NoticePosition::TopCenter),
        );
    }

    fn enter_read_mode(&self, page: &mut dyn Page) -> ListenerHandle {
        let body = page.body();
        page.add_class(body, &self.dom.read_mode_class);
        let button = page.create_element(Tag::Button, &self.dom.exit_read_mode_class);
        page.set_text(button, EXIT_READ_MODE_LABEL);
        page.append_child(body, button);
        page.add_listener(ListenerKind::Click(button))
    }

    /// Leave reading mode and drop its exit button
    pub fn exit_read_mode(&self, page: &mut dyn Page) {
        let body = page.body();
        page.remove_class(body, &self.dom.read_mode_class);
        for button in page.get_by_class(&self.dom.exit_read_mode_class) {
            page.remove(button);
        }
    }

    pub fn current_theme(&self, page: &dyn Page) -> Theme {
        page.attribute(page.root(), &self.dom.theme_attribute)
            .and_then(|name| Theme::from_name(&name))
            .unwrap_or_default()
    }

    fn switch_theme(&self, page: &mut dyn Page, hooks: &mut dyn Hooks) {
        let next = self.current_theme(page).toggled();
        if !hooks.activate_theme(next) {
            let root = page.root();
            page.set_attribute(root, &self.dom.theme_attribute, next.name());
        }
        hooks.persist_theme(next);
        let text = match next {
            Theme::Dark => &self.messages.day_to_night,
            Theme::Light => &self.messages.night_to_day,
        };
        page::notify(hooks, Notice::info(text));
        hooks.reset_comment_widgets();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Document, Viewport};

    #[derive(Default)]
    struct RecordingHooks {
        router: bool,
        navigated: Vec<String>,
        routed: Vec<String>,
        windows: Vec<String>,
        notices: Vec<Notice>,
        persisted: Vec<Theme>,
        widget_resets: usize,
    }

    impl Hooks for RecordingHooks {
        fn navigate(&mut self, url: &str) {
            self.navigated.push(url.to_string());
        }

        fn open_window(&mut self, url: &str) {
            self.windows.push(url.to_string());
        }

        fn route(&mut self, href: &str) -> bool {
            if self.router {
                self.routed.push(href.to_string());
            }
            self.router
        }

        fn persist_theme(&mut self, theme: Theme) {
            self.persisted.push(theme);
        }

        fn notify(&mut self, notice: &Notice) -> bool {
            self.notices.push(notice.clone());
            true
        }

        fn reset_comment_widgets(&mut self) {
            self.widget_resets += 1;
        }
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::new(DomConfig::default(), Messages::default(), true)
    }

    fn document() -> Document {
        Document::new(
            "https://blog.example.com/posts/hello/",
            Viewport {
                width: 60,
                height: 20,
            },
        )
    }

    #[test]
    fn test_same_origin_classification() {
        let page = "https://blog.example.com/posts/";
        assert!(is_same_origin(page, "/about/"));
        assert!(is_same_origin(page, "https://blog.example.com/a"));
        assert!(!is_same_origin(page, "https://example.org/a"));
        assert!(!is_same_origin(page, "http://evil.test/?blog.example.com"));
    }

    #[test]
    fn test_open_routes_internal_and_navigates_external() {
        let mut doc = document();
        let mut hooks = RecordingHooks {
            router: true,
            ..Default::default()
        };
        let registry = registry();

        let internal = Invocation::Open {
            href: "https://blog.example.com/about/".into(),
        };
        let external = Invocation::Open {
            href: "https://example.org/".into(),
        };
        assert_eq!(registry.execute(&internal, &mut doc, &mut hooks), Outcome::Done);
        registry.execute(&external, &mut doc, &mut hooks);
        assert_eq!(hooks.routed, vec!["https://blog.example.com/about/"]);
        assert_eq!(hooks.navigated, vec!["https://example.org/"]);

        // without a router internal links navigate fully
        let mut hooks = RecordingHooks::default();
        registry.execute(&internal, &mut doc, &mut hooks);
        assert_eq!(hooks.navigated, vec!["https://blog.example.com/about/"]);
    }

    #[test]
    fn test_open_in_new_tab_always_opens_window() {
        let mut doc = document();
        let mut hooks = RecordingHooks {
            router: true,
            ..Default::default()
        };
        let invocation = Invocation::OpenInNewTab {
            url: "https://blog.example.com/a".into(),
        };
        registry().execute(&invocation, &mut doc, &mut hooks);
        assert_eq!(hooks.windows, vec!["https://blog.example.com/a"]);
        assert!(hooks.routed.is_empty());
    }

    #[test]
    fn test_copy_actions_spawn_tasks() {
        let mut doc = document();
        let mut hooks = RecordingHooks::default();
        let registry = registry();
        let outcome = registry.execute(
            &Invocation::CopyLink {
                url: "https://example.com/a".into(),
            },
            &mut doc,
            &mut hooks,
        );
        assert_eq!(
            outcome,
            Outcome::Spawn(Task::CopyText {
                text: "https://example.com/a".into(),
                success: Messages::default().link_copied
            })
        );
        let empty = Invocation::CopySelection {
            text: String::new(),
        };
        assert_eq!(registry.execute(&empty, &mut doc, &mut hooks), Outcome::Done);
    }

    #[test]
    fn test_save_image_notifies_before_download() {
        let mut doc = document();
        let mut hooks = RecordingHooks::default();
        let outcome = registry().execute(
            &Invocation::SaveImageAs {
                src: "https://blog.example.com/img/x.png".into(),
                file_name: "x.png".into(),
            },
            &mut doc,
            &mut hooks,
        );
        assert!(matches!(outcome, Outcome::Spawn(Task::DownloadImage { .. })));
        assert_eq!(hooks.notices[0].text, Messages::default().downloading);
    }

    #[test]
    fn test_insert_at_cursor_replaces_selection() {
        let mut field = FieldState {
            value: "héllo world".into(),
            selection_start: 6,
            selection_end: 11,
            scroll_top: 4,
        };
        insert_at_cursor(&mut field, "rust");
        assert_eq!(field.value, "héllo rust");
        assert_eq!((field.selection_start, field.selection_end), (10, 10));
        assert_eq!(field.scroll_top, 4);
    }

    #[test]
    fn test_apply_paste_focuses_field() {
        let mut doc = document();
        let body = doc.body();
        let textarea = doc.create_element(Tag::TextArea, "");
        doc.append_child(body, textarea);
        doc.set_field(
            textarea,
            FieldState {
                value: "ab".into(),
                selection_start: 1,
                selection_end: 1,
                scroll_top: 0,
            },
        );
        assert!(apply_paste(&mut doc, textarea, "X"));
        assert_eq!(doc.field(textarea).unwrap().value, "aXb");
        assert_eq!(doc.focused(), Some(textarea));

        doc.remove(textarea);
        assert!(!apply_paste(&mut doc, textarea, "Y"));
    }

    #[test]
    fn test_quote_and_search_fill_fields() {
        let mut doc = document();
        let body = doc.body();
        let comment = doc.create_element(Tag::TextArea, "el-textarea__inner");
        let search = doc.create_element(Tag::Input, "local-search-box--input");
        let button = doc.append_text_element(body, Tag::Button, "Search");
        doc.add_class(button, "search");
        doc.append_child(body, comment);
        doc.append_child(body, search);
        let mut hooks = RecordingHooks::default();
        let registry = registry();

        registry.execute(
            &Invocation::QuoteSelection {
                text: "words".into(),
            },
            &mut doc,
            &mut hooks,
        );
        assert_eq!(doc.field(comment).unwrap().value, "> words\n\n");
        assert_eq!(hooks.notices[0].position, NoticePosition::TopCenter);

        registry.execute(
            &Invocation::SearchInPage {
                query: "rust".into(),
            },
            &mut doc,
            &mut hooks,
        );
        assert_eq!(doc.field(search).unwrap().value, "rust");
        assert_eq!(doc.take_clicks(), vec![button]);
        assert_eq!(doc.take_inputs(), vec![comment, search]);
    }

    #[test]
    fn test_read_mode_round_trip() {
        let mut doc = document();
        let mut hooks = RecordingHooks::default();
        let registry = registry();
        let Outcome::ReadMode(handle) = registry.execute(&Invocation::ReadMode, &mut doc, &mut hooks)
        else {
            panic!("read mode should register its exit listener");
        };
        let body = doc.body();
        assert!(doc.has_class(body, "read-mode"));
        let button = doc.get_by_class("exit-readmode")[0];
        assert_eq!(doc.dispatch_click(button), vec![handle]);

        registry.exit_read_mode(&mut doc);
        assert!(!doc.has_class(body, "read-mode"));
        assert!(doc.get_by_class("exit-readmode").is_empty());
    }

    #[test]
    fn test_switch_theme_toggles_and_persists() {
        let mut doc = document();
        let mut hooks = RecordingHooks::default();
        let registry = registry();

        registry.execute(&Invocation::SwitchTheme, &mut doc, &mut hooks);
        assert_eq!(registry.current_theme(&doc), Theme::Dark);
        registry.execute(&Invocation::SwitchTheme, &mut doc, &mut hooks);
        assert_eq!(registry.current_theme(&doc), Theme::Light);

        assert_eq!(hooks.persisted, vec![Theme::Dark, Theme::Light]);
        assert_eq!(hooks.widget_resets, 2);
        let messages = Messages::default();
        assert_eq!(hooks.notices[0].text, messages.day_to_night);
        assert_eq!(hooks.notices[1].text, messages.night_to_day);
    }

    #[test]
    fn test_scroll_to_top_and_translate_fallbacks() {
        let mut doc = document();
        let body = doc.body();
        for _ in 0..40 {
            doc.append_text_element(body, Tag::Paragraph, "line");
        }
        doc.layout();
        doc.scroll_to(10);
        let mut hooks = RecordingHooks::default();
        let registry = registry();

        registry.execute(&Invocation::ScrollToTop, &mut doc, &mut hooks);
        assert_eq!(doc.scroll_top(), 0);

        registry.execute(&Invocation::Translate, &mut doc, &mut hooks);
        assert_eq!(hooks.notices[0].text, Messages::default().translate_unavailable);

        let link = doc.append_text_element(body, Tag::Anchor, "Translate");
        doc.set_attribute(link, "id", "translateLink");
        registry.execute(&Invocation::Translate, &mut doc, &mut hooks);
        assert_eq!(doc.take_clicks(), vec![link]);
    }
}
