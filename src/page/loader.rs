//! Page descriptions loaded from TOML

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{markup, Document, ElementRef, FieldState, Page, Tag, Viewport};
use crate::config::DomConfig;

const DEMO_PAGE: &str = include_str!("../../assets/demo_page.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Wrap the content in an article root (`#post`)
    #[serde(default)]
    pub post: bool,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockSpec {
    Heading {
        text: String,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Paragraph {
        text: String,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Link {
        text: String,
        href: String,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        /// Wrap the image in a link
        #[serde(default)]
        href: Option<String>,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Textarea {
        #[serde(default)]
        value: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        rows: Option<u32>,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Input {
        #[serde(default)]
        value: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default, rename = "type")]
        input_type: Option<String>,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
    Button {
        text: String,
        #[serde(flatten)]
        attrs: BlockAttrs,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockAttrs {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

pub fn parse_page(source: &str) -> Result<PageSpec> {
    toml::from_str(source).context("parse page description")
}

pub fn load_page(path: &Path) -> Result<PageSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read page {}", path.display()))?;
    parse_page(&content).with_context(|| format!("load page {}", path.display()))
}

pub fn demo_page() -> Result<PageSpec> {
    parse_page(DEMO_PAGE)
}

/// Build a laid-out document with the menu markup installed
pub fn build_document(spec: &PageSpec, viewport: Viewport, dom: &DomConfig) -> Document {
    let mut doc = Document::new(spec.url.clone(), viewport);
    doc.set_title(spec.title.clone());
    let root = doc.root();
    let theme = spec.theme.as_deref().unwrap_or("light");
    doc.set_attribute(root, &dom.theme_attribute, theme);

    let container = if spec.post {
        let body = doc.body();
        let post = doc.create_element(Tag::Div, "");
        doc.set_attribute(post, "id", "post");
        doc.append_child(body, post);
        post
    } else {
        doc.body()
    };

    for block in &spec.blocks {
        append_block(&mut doc, container, block);
    }
    markup::install_menu(&mut doc, dom);
    doc.layout();
    doc
}

fn append_block(doc: &mut Document, parent: ElementRef, block: &BlockSpec) {
    let (el, attrs) = match block {
        BlockSpec::Heading { text, attrs } => {
            (doc.append_text_element(parent, Tag::Heading, text), attrs)
        }
        BlockSpec::Paragraph { text, attrs } => {
            (doc.append_text_element(parent, Tag::Paragraph, text), attrs)
        }
        BlockSpec::Link { text, href, attrs } => {
            let el = doc.append_text_element(parent, Tag::Anchor, text);
            doc.set_attribute(el, "href", href);
            (el, attrs)
        }
        BlockSpec::Image {
            src,
            alt,
            href,
            attrs,
        } => {
            let holder = match href {
                Some(href) => {
                    let link = doc.create_element(Tag::Anchor, "");
                    doc.set_attribute(link, "href", href);
                    doc.set_text(link, alt);
                    doc.append_child(parent, link);
                    link
                }
                None => parent,
            };
            let el = doc.create_element(Tag::Image, "");
            doc.set_attribute(el, "src", src);
            doc.set_attribute(el, "alt", alt);
            doc.set_text(el, &format!("[image: {alt}]"));
            doc.append_child(holder, el);
            (el, attrs)
        }
        BlockSpec::Textarea {
            value,
            placeholder,
            rows,
            attrs,
        } => {
            let el = doc.create_element(Tag::TextArea, "");
            doc.set_attribute(el, "placeholder", placeholder);
            if let Some(rows) = rows {
                doc.set_attribute(el, "rows", &rows.to_string());
            }
            doc.set_field(el, field_with(value));
            doc.append_child(parent, el);
            (el, attrs)
        }
        BlockSpec::Input {
            value,
            placeholder,
            input_type,
            attrs,
        } => {
            let el = doc.create_element(Tag::Input, "");
            doc.set_attribute(el, "placeholder", placeholder);
            if let Some(input_type) = input_type {
                doc.set_attribute(el, "type", input_type);
            }
            doc.set_field(el, field_with(value));
            doc.append_child(parent, el);
            (el, attrs)
        }
        BlockSpec::Button { text, attrs } => {
            (doc.append_text_element(parent, Tag::Button, text), attrs)
        }
    };

    if let Some(id) = &attrs.id {
        doc.set_attribute(el, "id", id);
    }
    if let Some(class) = &attrs.class {
        for class in class.split_whitespace() {
            doc.add_class(el, class);
        }
    }
}

fn field_with(value: &str) -> FieldState {
    let end = value.chars().count();
    FieldState {
        value: value.to_string(),
        selection_start: end,
        selection_end: end,
        scroll_top: 0,
    }
}
