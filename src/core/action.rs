//! Actions the menu can run, and the notices they report back

use crate::page::ElementRef;

/// Named entries of the action catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionId {
    Open,
    OpenInNewTab,
    CopyLink,
    SaveImageAs,
    ClickImage,
    Paste,
    CopySelection,
    SearchInPage,
    QuoteSelection,
    CopyPageLink,
    ReadMode,
    ScrollToTop,
    SwitchTheme,
    Translate,
}

impl ActionId {
    pub const ALL: [ActionId; 14] = [
        ActionId::Open,
        ActionId::OpenInNewTab,
        ActionId::CopyLink,
        ActionId::SaveImageAs,
        ActionId::ClickImage,
        ActionId::Paste,
        ActionId::CopySelection,
        ActionId::SearchInPage,
        ActionId::QuoteSelection,
        ActionId::CopyPageLink,
        ActionId::ReadMode,
        ActionId::ScrollToTop,
        ActionId::SwitchTheme,
        ActionId::Translate,
    ];

    /// Stable name, used as the `data-action` attribute of menu items
    pub fn name(&self) -> &'static str {
        match self {
            ActionId::Open => "open",
            ActionId::OpenInNewTab => "open-in-new-tab",
            ActionId::CopyLink => "copy-link",
            ActionId::SaveImageAs => "save-image-as",
            ActionId::ClickImage => "click-image",
            ActionId::Paste => "paste",
            ActionId::CopySelection => "copy-selection",
            ActionId::SearchInPage => "search-in-page",
            ActionId::QuoteSelection => "quote-selection",
            ActionId::CopyPageLink => "copy-page-link",
            ActionId::ReadMode => "read-mode",
            ActionId::ScrollToTop => "scroll-to-top",
            ActionId::SwitchTheme => "switch-theme",
            ActionId::Translate => "translate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionId::Open => "Open link",
            ActionId::OpenInNewTab => "Open in new tab",
            ActionId::CopyLink => "Copy link",
            ActionId::SaveImageAs => "Save image as",
            ActionId::ClickImage => "View image",
            ActionId::Paste => "Paste",
            ActionId::CopySelection => "Copy",
            ActionId::SearchInPage => "Search in page",
            ActionId::QuoteSelection => "Quote in comment",
            ActionId::CopyPageLink => "Copy page link",
            ActionId::ReadMode => "Reading mode",
            ActionId::ScrollToTop => "Back to top",
            ActionId::SwitchTheme => "Toggle dark mode",
            ActionId::Translate => "Translate",
        }
    }

    pub fn from_name(name: &str) -> Option<ActionId> {
        ActionId::ALL.into_iter().find(|id| id.name() == name)
    }
}

/// An action together with the context it closed over at activation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Navigate to a link or URL-shaped selection
    Open { href: String },
    /// Open a URL in a new browsing context
    OpenInNewTab { url: String },
    /// Write a URL to the clipboard
    CopyLink { url: String },
    /// Download an image as a file
    SaveImageAs { src: String, file_name: String },
    /// Forward a click to the element (image lightbox)
    ClickImage { element: ElementRef },
    /// Insert clipboard text into an editable field
    Paste { field: ElementRef },
    CopySelection { text: String },
    SearchInPage { query: String },
    QuoteSelection { text: String },
    CopyPageLink { url: String },
    ReadMode,
    ScrollToTop,
    SwitchTheme,
    Translate,
}

impl Invocation {
    pub fn id(&self) -> ActionId {
        match self {
            Invocation::Open { .. } => ActionId::Open,
            Invocation::OpenInNewTab { .. } => ActionId::OpenInNewTab,
            Invocation::CopyLink { .. } => ActionId::CopyLink,
            Invocation::SaveImageAs { .. } => ActionId::SaveImageAs,
            Invocation::ClickImage { .. } => ActionId::ClickImage,
            Invocation::Paste { .. } => ActionId::Paste,
            Invocation::CopySelection { .. } => ActionId::CopySelection,
            Invocation::SearchInPage { .. } => ActionId::SearchInPage,
            Invocation::QuoteSelection { .. } => ActionId::QuoteSelection,
            Invocation::CopyPageLink { .. } => ActionId::CopyPageLink,
            Invocation::ReadMode => ActionId::ReadMode,
            Invocation::ScrollToTop => ActionId::ScrollToTop,
            Invocation::SwitchTheme => ActionId::SwitchTheme,
            Invocation::Translate => ActionId::Translate,
        }
    }

    /// The element this invocation refers to, if any
    pub fn element(&self) -> Option<ElementRef> {
        match self {
            Invocation::ClickImage { element } => Some(*element),
            Invocation::Paste { field } => Some(*field),
            _ => None,
        }
    }
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

/// Where a transient notification should appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticePosition {
    #[default]
    BottomLeft,
    TopCenter,
    TopRight,
}

/// Transient notification (snackbar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NotifyLevel,
    pub position: NoticePosition,
    /// How long the host should keep it on screen, in milliseconds
    pub duration_ms: u64,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotifyLevel::Info,
            position: NoticePosition::default(),
            duration_ms: 2000,
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Warn,
            ..Self::info(text)
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Error,
            duration_ms: 3000,
            ..Self::info(text)
        }
    }

    pub fn at(mut self, position: NoticePosition) -> Self {
        self.position = position;
        self
    }

    pub fn lasting(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
