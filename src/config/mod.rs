use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::ActionGroup;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub menu: MenuConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub dom: DomConfig,

    #[serde(default)]
    pub messages: Messages,

    #[serde(default)]
    pub downloads: DownloadConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Hold time before a touch turns into an activation
    pub long_press_ms: u64,
    /// Horizontal gap between the pointer and the menu
    pub pointer_offset: i32,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 380,
            pointer_offset: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Auto,
    Pointer,
    Touch,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub mode: DeviceMode,
    pub user_agent: Option<String>,
}

/// Element ids and classes the menu expects in the host page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DomConfig {
    pub menu_id: String,
    pub group_class: String,
    pub hidden_group_class: String,
    pub item_class: String,
    pub action_attribute: String,
    pub overlay_class: String,
    pub text_group_id: String,
    pub post_group_id: String,
    pub url_selection_group_id: String,
    pub link_group_id: String,
    pub image_group_id: String,
    pub paste_group_id: String,
    pub page_group_id: String,
    /// Ids whose presence marks a post or article page
    pub post_markers: Vec<String>,
    pub comment_textarea_class: String,
    pub search_input_class: String,
    pub search_button_class: String,
    pub translate_link_id: String,
    pub read_mode_class: String,
    pub exit_read_mode_class: String,
    pub theme_attribute: String,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            menu_id: "rightMenu".into(),
            group_class: "rightMenu-group".into(),
            hidden_group_class: "hide".into(),
            item_class: "rightMenu-item".into(),
            action_attribute: "data-action".into(),
            overlay_class: "rmMask".into(),
            text_group_id: "menu-text".into(),
            post_group_id: "menu-post".into(),
            url_selection_group_id: "menu-too".into(),
            link_group_id: "menu-to".into(),
            image_group_id: "menu-img".into(),
            paste_group_id: "menu-paste".into(),
            page_group_id: "menu-general".into(),
            post_markers: vec!["post".into(), "page".into()],
            comment_textarea_class: "el-textarea__inner".into(),
            search_input_class: "local-search-box--input".into(),
            search_button_class: "search".into(),
            translate_link_id: "translateLink".into(),
            read_mode_class: "read-mode".into(),
            exit_read_mode_class: "exit-readmode".into(),
            theme_attribute: "data-theme".into(),
        }
    }
}

impl DomConfig {
    pub fn group_id(&self, group: ActionGroup) -> &str {
        match group {
            ActionGroup::Text => &self.text_group_id,
            ActionGroup::PostContext => &self.post_group_id,
            ActionGroup::UrlLikeSelection => &self.url_selection_group_id,
            ActionGroup::Link => &self.link_group_id,
            ActionGroup::Image => &self.image_group_id,
            ActionGroup::Paste => &self.paste_group_id,
            ActionGroup::Page => &self.page_group_id,
        }
    }

    pub fn group_for_id(&self, id: &str) -> Option<ActionGroup> {
        ActionGroup::ALL
            .into_iter()
            .find(|group| self.group_id(*group) == id)
    }
}

/// Notification texts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub link_copied: String,
    pub page_link_copied: String,
    pub selection_copied: String,
    pub copy_failed: String,
    pub paste_permission: String,
    pub paste_failed: String,
    pub pasted: String,
    pub nothing_to_paste: String,
    pub downloading: String,
    pub download_done: String,
    pub download_failed: String,
    pub quote_hint: String,
    pub day_to_night: String,
    pub night_to_day: String,
    pub search_unavailable: String,
    pub translate_unavailable: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            link_copied: "Link copied. Go share it!".into(),
            page_link_copied: "Page link copied!".into(),
            selection_copied: "Copied to clipboard".into(),
            copy_failed: "Copy failed".into(),
            paste_permission: "Please allow reading the clipboard!".into(),
            paste_failed: "Paste failed".into(),
            pasted: "Pasted from clipboard".into(),
            nothing_to_paste: "Clipboard is empty".into(),
            downloading: "Downloading, please wait".into(),
            download_done: "Image saved with a blind watermark, please respect the license".into(),
            download_failed: "Image download failed".into(),
            quote_hint: "Keep the blank line for the best reading experience".into(),
            day_to_night: "Switched to dark mode".into(),
            night_to_day: "Switched to light mode".into(),
            search_unavailable: "Search is not available on this page".into(),
            translate_unavailable: "Translation is not available on this page".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Whether the host offers client-side routing for same-origin links
    pub enabled: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_from(&path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring config {}: {err:#}", path.display());
            Config::default()
        }
    }
}

pub fn load_from(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    toml::from_str::<Config>(&content).with_context(|| format!("parse config {}", path.display()))
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("RIGHTMENU_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("rightmenu").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("rightmenu").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "rightmenu", "rightmenu")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("rightmenu"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("rightmenu"));
    }
    directories::ProjectDirs::from("io", "rightmenu", "rightmenu")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("rightmenu.log"))
}

/// Where saved images go when no directory is configured
pub fn default_download_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_markup() {
        let config = Config::default();
        assert_eq!(config.menu.long_press_ms, 380);
        assert_eq!(config.menu.pointer_offset, 10);
        assert_eq!(config.dom.group_id(ActionGroup::Link), "menu-to");
        assert_eq!(
            config.dom.group_for_id("menu-too"),
            Some(ActionGroup::UrlLikeSelection)
        );
        assert!(config.router.enabled);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[menu]\nlong_press_ms = 500\n\n[device]\nmode = \"touch\"\n\n[messages]\nlink_copied = \"ok\""
        )
        .unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.menu.long_press_ms, 500);
        assert_eq!(config.menu.pointer_offset, 10);
        assert_eq!(config.device.mode, DeviceMode::Touch);
        assert_eq!(config.messages.link_copied, "ok");
        assert_eq!(config.messages.copy_failed, "Copy failed");
        assert_eq!(config.dom.menu_id, "rightMenu");
    }

    #[test]
    fn test_invalid_file_reports_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[menu]\nlong_press_ms = \"soon\"").unwrap();
        assert!(load_from(file.path()).is_err());
    }
}
