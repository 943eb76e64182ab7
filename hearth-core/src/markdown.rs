use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter;

/// One rendered markdown document: the HTML fragment plus the raw
/// front-matter fields that were split off before parsing.
///
/// The fragment is the sanitization boundary. Templates embed it without
/// further escaping, so nothing downstream should touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub html: String,
    pub fields: HashMap<String, String>,
}

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Utf8(std::string::FromUtf8Error),
}

impl RenderError {
    /// True when the underlying source file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RenderError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for RenderError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RenderError::Utf8(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "IO error: {}", e),
            RenderError::Utf8(e) => write!(f, "source is not valid UTF-8: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Render a markdown source to HTML.
///
/// Front matter is split off first and returned as fields, never as markup.
/// Headings without an explicit `{#id}` get one derived from their text;
/// a repeated slug gets `-1`, `-2`, ... appended in document order.
/// Parsing itself is best-effort and cannot fail.
pub fn render(source: &str) -> RenderResult {
    let (fields, body) = frontmatter::split(source);

    let events: Vec<Event> = Parser::new_ext(body, parser_options()).collect();
    let events = assign_heading_ids(events);

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());

    RenderResult { html: out, fields }
}

pub fn render_bytes(source: &[u8]) -> Result<RenderResult, RenderError> {
    let text = String::from_utf8(source.to_vec())?;
    Ok(render(&text))
}

pub fn render_file<P: AsRef<Path>>(path: P) -> Result<RenderResult, RenderError> {
    let source = std::fs::read(path)?;
    render_bytes(&source)
}

fn assign_heading_ids(mut events: Vec<Event>) -> Vec<Event> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    for i in 0..events.len() {
        let Event::Start(Tag::Heading { id, .. }) = &events[i] else {
            continue;
        };

        let explicit = id.is_some();
        let slug = match id {
            Some(id) => id.to_string(),
            None => slugify(&heading_text(&events[i + 1..])),
        };

        let count = seen.entry(slug.clone()).or_insert(0);
        let unique = if *count == 0 {
            slug
        } else {
            format!("{}-{}", slug, count)
        };
        *count += 1;

        if !explicit {
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                *id = Some(CowStr::from(unique));
            }
        }
    }

    events
}

/// Collects the visible text of a heading, up to its end tag.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}
