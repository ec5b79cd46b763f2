//! Markdown page parser with frontmatter and table of contents extraction.
//!
//! This crate turns a documentation page into rendered HTML plus the metadata the
//! site builder needs: YAML frontmatter, heading anchors, and a title.

pub mod frontmatter;
pub mod parser;
pub mod slug;

pub use frontmatter::{Frontmatter, FrontmatterError};
pub use parser::{parse_page, ParseError, ParsedPage, TocEntry};
pub use slug::slugify;
