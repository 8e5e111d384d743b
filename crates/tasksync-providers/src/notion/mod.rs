//! Notion database mirror.
//!
//! Each mirrored task is a page in one database with three properties:
//!
//! | Property     | Type      | Holds                     |
//! |--------------|-----------|---------------------------|
//! | `Task ID`    | rich text | source task id            |
//! | `Title`      | title     | task title                |
//! | `Created at` | date      | task's last update time   |
//!
//! The names are configurable through [`PropertyNames`].

mod client;
mod config;
mod mirror;

pub use client::{NotionClient, NotionPage, create_page_body, pages_to_items};
pub use config::{NotionConfig, PropertyNames};
pub use mirror::NotionMirror;
