//! Contextual action menu for content pages.
//!
//! The [`menu`] module is the library proper and runs against any host that
//! implements the [`page::Page`] and [`page::Hooks`] contracts. The rest of
//! the crate is a terminal page viewer hosting it.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod menu;
pub mod page;
pub mod ui;
