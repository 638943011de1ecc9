//! What the menu was opened on

use crate::page::ElementRef;

/// Target classification resolved once per activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetContext {
    /// Hyperlink, with its resolved href
    Link { href: String },
    /// Image, with its resolved source URL
    Image { src: String },
    /// Editable text field
    Field { element: ElementRef },
    None,
}

impl TargetContext {
    pub fn is_link(&self) -> bool {
        matches!(self, TargetContext::Link { .. })
    }

    /// URL carried by link and image contexts
    pub fn url(&self) -> Option<&str> {
        match self {
            TargetContext::Link { href } => Some(href),
            TargetContext::Image { src } => Some(src),
            _ => None,
        }
    }
}

/// Last non-empty path segment of a URL, without query or fragment
pub fn file_name_from_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_absolute_url() {
        assert_eq!(file_name_from_url("https://blog.example.com/img/x.png"), "x.png");
        assert_eq!(
            file_name_from_url("https://cdn.example.com/a/b/photo.jpg?w=300#top"),
            "photo.jpg"
        );
    }

    #[test]
    fn test_file_name_from_relative_and_empty_paths() {
        assert_eq!(file_name_from_url("/img/x.png"), "x.png");
        assert_eq!(file_name_from_url("https://example.com/"), "image");
        assert_eq!(file_name_from_url(""), "image");
        assert_eq!(file_name_from_url("/gallery/"), "gallery");
    }

    #[test]
    fn test_context_url() {
        let link = TargetContext::Link {
            href: "https://example.com/a".into(),
        };
        assert!(link.is_link());
        assert_eq!(link.url(), Some("https://example.com/a"));
        assert_eq!(TargetContext::None.url(), None);
    }
}
