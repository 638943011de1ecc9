//! Action groups: independently visible clusters of menu entries

use super::ActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionGroup {
    /// Non-empty text selection
    Text,
    /// Current page is a post or article
    PostContext,
    /// Selection looks like a URL and the target is not a link
    UrlLikeSelection,
    /// Target is (inside) a hyperlink
    Link,
    /// Target is an image
    Image,
    /// Target is an editable text field
    Paste,
    /// Default entries, always shown
    Page,
}

impl ActionGroup {
    pub const ALL: [ActionGroup; 7] = [
        ActionGroup::Text,
        ActionGroup::PostContext,
        ActionGroup::UrlLikeSelection,
        ActionGroup::Link,
        ActionGroup::Image,
        ActionGroup::Paste,
        ActionGroup::Page,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionGroup::Text => "text",
            ActionGroup::PostContext => "post-context",
            ActionGroup::UrlLikeSelection => "url-like-selection",
            ActionGroup::Link => "link",
            ActionGroup::Image => "image",
            ActionGroup::Paste => "paste",
            ActionGroup::Page => "page",
        }
    }

    /// Whether visibility depends on the target. The page group never hides.
    pub fn is_conditional(&self) -> bool {
        !matches!(self, ActionGroup::Page)
    }

    /// Menu entries of this group, in display order
    pub fn actions(&self) -> &'static [ActionId] {
        match self {
            ActionGroup::Text => &[ActionId::CopySelection, ActionId::SearchInPage],
            ActionGroup::PostContext => &[
                ActionId::QuoteSelection,
                ActionId::CopyPageLink,
                ActionId::ReadMode,
            ],
            ActionGroup::UrlLikeSelection | ActionGroup::Link => &[
                ActionId::Open,
                ActionId::OpenInNewTab,
                ActionId::CopyLink,
            ],
            ActionGroup::Image => &[
                ActionId::OpenInNewTab,
                ActionId::CopyLink,
                ActionId::SaveImageAs,
                ActionId::ClickImage,
            ],
            ActionGroup::Paste => &[ActionId::Paste],
            ActionGroup::Page => &[
                ActionId::ScrollToTop,
                ActionId::SwitchTheme,
                ActionId::Translate,
            ],
        }
    }
}
