use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser};
use serde::Deserialize;
use thiserror::Error;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("missing front matter block")]
    MissingFrontMatter,

    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Splits `---\n<yaml>\n---\n<markdown>` into parsed front matter and body.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), PostError> {
    let source = source.trim_start_matches('\u{feff}');
    let rest = source
        .strip_prefix("---")
        .ok_or(PostError::MissingFrontMatter)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == "---" {
            let front_matter = serde_yaml::from_str(&rest[..offset])?;
            let body = &rest[offset + line.len()..];
            return Ok((front_matter, body));
        }
        offset += line.len();
    }

    Err(PostError::MissingFrontMatter)
}

pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

pub fn reading_time_minutes(markdown: &str) -> usize {
    (markdown.split_whitespace().count() / WORDS_PER_MINUTE).max(1)
}
