//! Markdown page parser.

use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
use crate::slug::slugify;

/// A parsed markdown page.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Markdown content (without frontmatter)
    pub content: String,

    /// Rendered HTML body, headings carry `id` anchors matching the TOC
    pub html: String,

    /// Plain text of the page, code blocks excluded
    pub text: String,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,
}

impl ParsedPage {
    /// Title from frontmatter, else the first level-one heading.
    pub fn title(&self) -> Option<&str> {
        self.frontmatter
            .as_ref()
            .and_then(|f| f.title.as_deref())
            .or_else(|| {
                self.toc
                    .iter()
                    .find(|e| e.level == 1)
                    .map(|e| e.title.as_str())
            })
    }

    /// Frontmatter, or defaults when the page has none.
    pub fn meta(&self) -> Frontmatter {
        self.frontmatter.clone().unwrap_or_default()
    }
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing a page.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Parse a markdown page.
///
/// Extracts frontmatter, renders the body, and generates a table of contents whose
/// anchors are unique within the page.
pub fn parse_page(source: &str) -> Result<ParsedPage, ParseError> {
    let (frontmatter, content) = extract_frontmatter(source)?;

    let mut events: Vec<Event> = Parser::new_ext(content, markdown_options()).collect();

    let mut toc = Vec::new();
    let mut anchors: Vec<(usize, String)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut text = String::new();

    let mut current_heading: Option<(usize, String)> = None; // (event index, text)
    let mut in_code_block = false;

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current_heading = Some((index, String::new()));
            }

            Event::End(TagEnd::Heading(level)) => {
                if let Some((start, title)) = current_heading.take() {
                    let id = unique_anchor(&mut seen, &title);
                    anchors.push((start, id.clone()));
                    toc.push(TocEntry {
                        title,
                        id,
                        level: *level as u8,
                    });
                }
            }

            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,

            Event::Text(t) | Event::Code(t) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(t);
                }
                if !in_code_block {
                    push_words(&mut text, t);
                }
            }

            _ => {}
        }
    }

    for (index, anchor) in anchors {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[index] {
            *id = Some(CowStr::from(anchor));
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    Ok(ParsedPage {
        frontmatter,
        content: content.to_string(),
        html: html_output,
        text,
        toc,
    })
}

/// Slug a heading, suffixing `-1`, `-2`, ... on repeats.
fn unique_anchor(seen: &mut HashMap<String, usize>, title: &str) -> String {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "section".to_string();
    }

    let count = seen.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}

fn push_words(buf: &mut String, fragment: &str) {
    for word in fragment.split_whitespace() {
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_complete_page() {
        let source = r#"---
title: Option Pricing
description: Notes on Black-Scholes
---

# Option Pricing

The classic closed form.

```python
d1 = (log(s / k) + (r + v * v / 2) * t) / (v * sqrt(t))
```

## Greeks

Sensitivities of the price.
"#;

        let page = parse_page(source).unwrap();

        let fm = page.frontmatter.as_ref().unwrap();
        assert_eq!(fm.title.as_deref(), Some("Option Pricing"));
        assert_eq!(fm.description.as_deref(), Some("Notes on Black-Scholes"));

        assert_eq!(
            page.toc,
            vec![
                TocEntry {
                    title: "Option Pricing".to_string(),
                    id: "option-pricing".to_string(),
                    level: 1,
                },
                TocEntry {
                    title: "Greeks".to_string(),
                    id: "greeks".to_string(),
                    level: 2,
                },
            ]
        );

        assert!(page.html.contains(r#"<h1 id="option-pricing">"#));
        assert!(page.html.contains(r#"<h2 id="greeks">"#));
        assert!(page.html.contains("language-python"));
    }

    #[test]
    fn parses_without_frontmatter() {
        let page = parse_page("# Just Markdown\n\nNo frontmatter.").unwrap();

        assert!(page.frontmatter.is_none());
        assert_eq!(page.title(), Some("Just Markdown"));
        assert!(page.meta().nav);
    }

    #[test]
    fn frontmatter_title_wins_over_heading() {
        let page = parse_page("---\ntitle: Home\n---\n# Welcome").unwrap();

        assert_eq!(page.title(), Some("Home"));
    }

    #[test]
    fn repeated_headings_get_unique_anchors() {
        let page = parse_page("## Notes\n\n## Notes\n\n## Notes").unwrap();

        let ids: Vec<_> = page.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["notes", "notes-1", "notes-2"]);
    }

    #[test]
    fn heading_with_inline_code_keeps_text() {
        let page = parse_page("## The `norm.cdf` helper").unwrap();

        assert_eq!(page.toc[0].title, "The norm.cdf helper");
        assert_eq!(page.toc[0].id, "the-normcdf-helper");
    }

    #[test]
    fn plain_text_skips_code_blocks() {
        let page = parse_page("Intro   text.\n\n```\nhidden()\n```\n\nOutro.").unwrap();

        assert_eq!(page.text, "Intro text. Outro.");
    }

    #[test]
    fn invalid_frontmatter_is_an_error() {
        let result = parse_page("---\ntitle: [oops\n---\n# Body");

        assert!(matches!(result, Err(ParseError::Frontmatter(_))));
    }
}
