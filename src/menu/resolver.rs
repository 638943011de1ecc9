//! Capability resolver: which groups apply to a target, and what they bind to

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::DomConfig;
use crate::core::{file_name_from_url, ActionBinding, ActionGroup, Invocation, TargetContext};
use crate::page::{ElementRef, Page, Tag};

/// Input types that accept free text
const TEXT_INPUT_TYPES: [&str; 7] = ["text", "search", "url", "email", "tel", "password", ""];

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?:https?://)?[A-Za-z0-9_.-]+(?:\.[A-Za-z0-9_.-]+)+[A-Za-z0-9_\-._~:/?#\[\]@!$&'*+,;=.]+$")
            .expect("Failed to compile URL regex")
    })
}

/// Best-effort test for selections that look like a URL
pub fn is_url_like(text: &str) -> bool {
    url_regex().is_match(text)
}

/// Resolve `raw` against the page location the way a browser resolves `href`
pub fn resolve_url(location: &str, raw: &str) -> String {
    url::Url::parse(location)
        .and_then(|base| base.join(raw))
        .map(String::from)
        .unwrap_or_else(|_| raw.to_string())
}

/// Outcome of one activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Element the menu operates on; the body when nothing was under the pointer
    pub target: ElementRef,
    pub contexts: Vec<TargetContext>,
    pub groups: BTreeSet<ActionGroup>,
    pub binding: ActionBinding,
}

impl Resolution {
    pub fn is_visible(&self, group: ActionGroup) -> bool {
        self.groups.contains(&group)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    dom: DomConfig,
}

impl CapabilityResolver {
    pub fn new(dom: DomConfig) -> Self {
        Self { dom }
    }

    /// Classify the target and build fresh bindings. Every rule is evaluated
    /// independently; all matching groups show together.
    pub fn resolve(&self, page: &dyn Page, target: Option<ElementRef>) -> Resolution {
        let location = page.location().to_string();
        let selection = page.selection_text();
        let mut groups = BTreeSet::from([ActionGroup::Page]);
        let mut binding = ActionBinding::new();
        let mut contexts = Vec::new();

        let is_post = self
            .dom
            .post_markers
            .iter()
            .any(|id| page.get_by_id(id).is_some());
        if is_post {
            groups.insert(ActionGroup::PostContext);
        }

        let Some(target) = target.filter(|el| page.is_attached(*el)) else {
            self.bind_static(&mut binding, &groups, &location, &selection);
            return Resolution {
                target: page.body(),
                contexts: vec![TargetContext::None],
                groups,
                binding,
            };
        };

        if !selection.is_empty() {
            groups.insert(ActionGroup::Text);
        }

        let link = nearest_link(page, target);
        if let Some(href) = link.and_then(|el| page.attribute(el, "href")) {
            contexts.push(TargetContext::Link {
                href: resolve_url(&location, &href),
            });
        }
        if page.tag(target) == Some(Tag::Image) {
            if let Some(src) = page.attribute(target, "src") {
                contexts.push(TargetContext::Image {
                    src: resolve_url(&location, &src),
                });
            }
        }
        if is_editable(page, target) {
            contexts.push(TargetContext::Field { element: target });
        }
        if contexts.is_empty() {
            contexts.push(TargetContext::None);
        }

        self.bind_static(&mut binding, &groups, &location, &selection);

        if link.is_none() && is_url_like(&selection) {
            groups.insert(ActionGroup::UrlLikeSelection);
            bind_url(&mut binding, ActionGroup::UrlLikeSelection, &selection);
        }
        for context in &contexts {
            match context {
                TargetContext::Link { href } => {
                    groups.insert(ActionGroup::Link);
                    bind_url(&mut binding, ActionGroup::Link, href);
                }
                TargetContext::Image { src } => {
                    groups.insert(ActionGroup::Image);
                    bind_image(&mut binding, src, target);
                }
                TargetContext::Field { element } => {
                    groups.insert(ActionGroup::Paste);
                    binding.bind(ActionGroup::Paste, Invocation::Paste { field: *element });
                }
                TargetContext::None => {}
            }
        }

        log::debug!(
            "resolved {:?}: groups {:?}",
            page.tag(target),
            groups.iter().map(ActionGroup::name).collect::<Vec<_>>()
        );
        Resolution {
            target,
            contexts,
            groups,
            binding,
        }
    }

    /// Show matched groups and hide every other conditional group
    pub fn apply(&self, page: &mut dyn Page, resolution: &Resolution) {
        for group in ActionGroup::ALL {
            let Some(el) = page.get_by_id(self.dom.group_id(group)) else {
                continue;
            };
            let visible = resolution.is_visible(group);
            if group.is_conditional() {
                page.set_displayed(el, visible);
            }
        }
    }

    /// Selection, page and post entries that do not depend on the target element
    fn bind_static(
        &self,
        binding: &mut ActionBinding,
        groups: &BTreeSet<ActionGroup>,
        location: &str,
        selection: &str,
    ) {
        if groups.contains(&ActionGroup::Text) {
            binding.bind(
                ActionGroup::Text,
                Invocation::CopySelection {
                    text: selection.to_string(),
                },
            );
            binding.bind(
                ActionGroup::Text,
                Invocation::SearchInPage {
                    query: selection.to_string(),
                },
            );
        }
        if groups.contains(&ActionGroup::PostContext) {
            binding.bind(
                ActionGroup::PostContext,
                Invocation::QuoteSelection {
                    text: selection.to_string(),
                },
            );
            binding.bind(
                ActionGroup::PostContext,
                Invocation::CopyPageLink {
                    url: location.to_string(),
                },
            );
            binding.bind(ActionGroup::PostContext, Invocation::ReadMode);
        }
        binding.bind(ActionGroup::Page, Invocation::ScrollToTop);
        binding.bind(ActionGroup::Page, Invocation::SwitchTheme);
        binding.bind(ActionGroup::Page, Invocation::Translate);
    }
}

fn bind_url(binding: &mut ActionBinding, group: ActionGroup, url: &str) {
    binding.bind(
        group,
        Invocation::Open {
            href: url.to_string(),
        },
    );
    binding.bind(
        group,
        Invocation::OpenInNewTab {
            url: url.to_string(),
        },
    );
    binding.bind(
        group,
        Invocation::CopyLink {
            url: url.to_string(),
        },
    );
}

fn bind_image(binding: &mut ActionBinding, src: &str, element: ElementRef) {
    binding.bind(
        ActionGroup::Image,
        Invocation::OpenInNewTab {
            url: src.to_string(),
        },
    );
    binding.bind(
        ActionGroup::Image,
        Invocation::CopyLink {
            url: src.to_string(),
        },
    );
    binding.bind(
        ActionGroup::Image,
        Invocation::SaveImageAs {
            src: src.to_string(),
            file_name: file_name_from_url(src),
        },
    );
    binding.bind(ActionGroup::Image, Invocation::ClickImage { element });
}

fn nearest_link(page: &dyn Page, el: ElementRef) -> Option<ElementRef> {
    let mut current = Some(el);
    while let Some(e) = current {
        if page.tag(e) == Some(Tag::Anchor) {
            return Some(e);
        }
        current = page.parent(e);
    }
    None
}

fn is_editable(page: &dyn Page, el: ElementRef) -> bool {
    match page.tag(el) {
        Some(Tag::TextArea) => true,
        Some(Tag::Input) => {
            let input_type = page
                .attribute(el, "type")
                .unwrap_or_default()
                .to_lowercase();
            TEXT_INPUT_TYPES.contains(&input_type.as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActionId;
    use crate::page::{markup, Document, Viewport};

    fn document() -> (Document, DomConfig) {
        let dom = DomConfig::default();
        let mut doc = Document::new(
            "https://blog.example.com/posts/hello/",
            Viewport {
                width: 60,
                height: 20,
            },
        );
        markup::install_menu(&mut doc, &dom);
        (doc, dom)
    }

    fn append(doc: &mut Document, tag: Tag, text: &str) -> ElementRef {
        let body = doc.body();
        doc.append_text_element(body, tag, text)
    }

    #[test]
    fn test_link_target_binds_resolved_href() {
        let (mut doc, dom) = document();
        let link = append(&mut doc, Tag::Anchor, "a");
        doc.set_attribute(link, "href", "https://example.com/a");
        doc.layout();

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(link));
        assert!(resolution.is_visible(ActionGroup::Link));
        assert!(!resolution.is_visible(ActionGroup::Image));
        assert_eq!(
            resolution.binding.get(ActionGroup::Link, ActionId::CopyLink),
            Some(&Invocation::CopyLink {
                url: "https://example.com/a".into()
            })
        );
    }

    #[test]
    fn test_image_target_derives_file_name() {
        let (mut doc, dom) = document();
        let image = append(&mut doc, Tag::Image, "");
        doc.set_attribute(image, "src", "/img/x.png");

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(image));
        assert!(resolution.is_visible(ActionGroup::Image));
        assert_eq!(
            resolution.binding.lookup(ActionId::SaveImageAs),
            Some(&Invocation::SaveImageAs {
                src: "https://blog.example.com/img/x.png".into(),
                file_name: "x.png".into()
            })
        );
        assert_eq!(
            resolution.binding.lookup(ActionId::ClickImage),
            Some(&Invocation::ClickImage { element: image })
        );
    }

    #[test]
    fn test_image_inside_link_shows_both_groups() {
        let (mut doc, dom) = document();
        let link = append(&mut doc, Tag::Anchor, "");
        doc.set_attribute(link, "href", "/gallery/");
        let image = doc.create_element(Tag::Image, "");
        doc.set_attribute(image, "src", "https://cdn.example.com/x.png");
        doc.append_child(link, image);

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(image));
        assert!(resolution.is_visible(ActionGroup::Link));
        assert!(resolution.is_visible(ActionGroup::Image));
        assert_eq!(
            resolution.binding.get(ActionGroup::Link, ActionId::CopyLink),
            Some(&Invocation::CopyLink {
                url: "https://blog.example.com/gallery/".into()
            })
        );
        assert_eq!(
            resolution.binding.lookup(ActionId::CopyLink),
            Some(&Invocation::CopyLink {
                url: "https://cdn.example.com/x.png".into()
            })
        );
    }

    #[test]
    fn test_plain_sentence_selection_is_not_url_like() {
        let (mut doc, dom) = document();
        let para = append(&mut doc, Tag::Paragraph, "this is a sentence");
        doc.select(para, 0, 18);

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(para));
        assert!(resolution.is_visible(ActionGroup::Text));
        assert!(!resolution.is_visible(ActionGroup::UrlLikeSelection));
    }

    #[test]
    fn test_url_selection_on_non_link_binds_open() {
        let (mut doc, dom) = document();
        let para = append(&mut doc, Tag::Paragraph, "http://example.com");
        doc.select(para, 0, 18);

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(para));
        assert!(resolution.is_visible(ActionGroup::UrlLikeSelection));
        assert_eq!(
            resolution
                .binding
                .get(ActionGroup::UrlLikeSelection, ActionId::Open),
            Some(&Invocation::Open {
                href: "http://example.com".into()
            })
        );
    }

    #[test]
    fn test_url_selection_on_link_stays_hidden() {
        let (mut doc, dom) = document();
        let link = append(&mut doc, Tag::Anchor, "example.com/docs");
        doc.set_attribute(link, "href", "https://example.com/docs");
        doc.select(link, 0, 16);

        let resolution = CapabilityResolver::new(dom).resolve(&doc, Some(link));
        assert!(resolution.is_visible(ActionGroup::Link));
        assert!(!resolution.is_visible(ActionGroup::UrlLikeSelection));
    }

    #[test]
    fn test_text_like_fields_reveal_paste() {
        let (mut doc, dom) = document();
        let textarea = append(&mut doc, Tag::TextArea, "");
        let search = append(&mut doc, Tag::Input, "");
        doc.set_attribute(search, "type", "search");
        let checkbox = append(&mut doc, Tag::Input, "");
        doc.set_attribute(checkbox, "type", "checkbox");
        let resolver = CapabilityResolver::new(dom);

        for field in [textarea, search] {
            let resolution = resolver.resolve(&doc, Some(field));
            assert!(resolution.is_visible(ActionGroup::Paste));
            assert_eq!(
                resolution.binding.lookup(ActionId::Paste),
                Some(&Invocation::Paste { field })
            );
        }
        assert!(!resolver
            .resolve(&doc, Some(checkbox))
            .is_visible(ActionGroup::Paste));
    }

    #[test]
    fn test_missing_target_falls_back_to_body() {
        let (mut doc, dom) = document();
        let post = append(&mut doc, Tag::Div, "");
        doc.set_attribute(post, "id", "post");
        let para = doc.append_text_element(post, Tag::Paragraph, "words");
        doc.select(para, 0, 5);

        let resolution = CapabilityResolver::new(dom).resolve(&doc, None);
        assert_eq!(resolution.target, doc.body());
        assert_eq!(
            resolution.groups,
            BTreeSet::from([ActionGroup::PostContext, ActionGroup::Page])
        );
        assert_eq!(
            resolution.binding.lookup(ActionId::CopyPageLink),
            Some(&Invocation::CopyPageLink {
                url: "https://blog.example.com/posts/hello/".into()
            })
        );
    }

    #[test]
    fn test_apply_hides_stale_groups() {
        let (mut doc, dom) = document();
        let link = append(&mut doc, Tag::Anchor, "a");
        doc.set_attribute(link, "href", "/a");
        let para = append(&mut doc, Tag::Paragraph, "p");
        let menu = doc.get_by_id(&dom.menu_id).unwrap();
        doc.set_displayed(menu, true);
        let link_group = doc.get_by_id(&dom.link_group_id).unwrap();
        let general = doc.get_by_id(&dom.page_group_id).unwrap();
        let resolver = CapabilityResolver::new(dom);

        let first = resolver.resolve(&doc, Some(link));
        resolver.apply(&mut doc, &first);
        assert!(doc.is_displayed(link_group));

        let second = resolver.resolve(&doc, Some(para));
        resolver.apply(&mut doc, &second);
        assert!(!doc.is_displayed(link_group));
        assert!(doc.is_displayed(general));
    }

    #[test]
    fn test_url_heuristic() {
        assert!(is_url_like("example.com/path?q=1"));
        assert!(is_url_like("https://doc.rust-lang.org/std/"));
        assert!(!is_url_like("localhost"));
        assert!(!is_url_like("two words.com"));
        // Word characters are ASCII only
        assert!(!is_url_like("例子.中国"));
        assert!(!is_url_like("пример.рф/путь"));
    }
}
