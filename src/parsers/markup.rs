//! Pattern-based signal extraction over raw markup.
//!
//! Used when no rendering engine is available, and by the crawl frontier to
//! find anchors cheaply. It tolerates broken markup by never building a tree:
//! every field is found by scanning start tags and a few element bodies.

use crate::parsers::{collapse_whitespace, resolve_url};
use crate::results::{Headings, ImageRecord, PageSignals};
use html_escape::decode_html_entities;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
// Tag bodies skip over quoted values, so `>` inside an attribute does not end the tag
static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9:-]*)(\s(?:[^>"']|"[^"]*"|'[^']*')*)?>"#).unwrap()
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .unwrap()
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2\s*>").unwrap());
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</script\s*>"#).unwrap()
});
static SCRIPT_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(<script\b(?:[^>"']|"[^"]*"|'[^']*')*>).*?</script\s*>"#).unwrap()
});
static STYLE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(<style\b(?:[^>"']|"[^"]*"|'[^']*')*>).*?</style\s*>"#).unwrap()
});
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap());
static CRAWL_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["']([^"'#?]+)["']"#).unwrap());

/// A start tag with lowercased name and attribute names
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    attrs: HashMap<String, String>,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// Extracts page signals from raw markup
pub fn extract(source: &str, base: &Url) -> PageSignals {
    let source = COMMENT.replace_all(source, "");
    let markup = without_raw_text(&source);
    let tags = start_tags(&markup);

    let metas = named(&tags, "meta");
    let links = named(&tags, "link");

    let meta_by = |attr: &str, key: &str| -> String {
        metas
            .iter()
            .find(|t| t.attr(attr) == Some(key))
            .and_then(|t| t.attr("content"))
            .unwrap_or_default()
            .to_string()
    };

    let title = TITLE
        .captures(&markup)
        .map(|c| collapse_whitespace(&decode_html_entities(&c[1])))
        .unwrap_or_default();

    let canonical = links
        .iter()
        .find(|t| t.attr("rel") == Some("canonical"))
        .and_then(|t| t.attr("href"))
        .map(|href| resolve_url(base, href))
        .unwrap_or_default();

    let images = named(&tags, "img")
        .into_iter()
        .map(|t| ImageRecord {
            src: t.attr("src").map(|s| resolve_url(base, s)).unwrap_or_default(),
            alt: t.attr("alt").unwrap_or_default().to_string(),
            lazy: t
                .attr("loading")
                .is_some_and(|l| l.trim().eq_ignore_ascii_case("lazy")),
        })
        .collect();

    let anchors = named(&tags, "a")
        .into_iter()
        .filter_map(|t| t.attr("href"))
        .map(|href| resolve_url(base, href))
        .collect();

    PageSignals {
        title,
        description: meta_by("name", "description"),
        keywords: meta_by("name", "keywords"),
        viewport: meta_by("name", "viewport"),
        canonical,
        og_title: meta_by("property", "og:title"),
        og_description: meta_by("property", "og:description"),
        twitter_card: meta_by("name", "twitter:card"),
        headings: Headings {
            h1: element_texts(&H1, &markup),
            h2: element_texts(&H2, &markup),
        },
        images,
        links: anchors,
        hreflang: links
            .iter()
            .filter(|t| t.attr("rel") == Some("alternate"))
            .filter_map(|t| t.attr("hreflang"))
            .map(str::to_string)
            .collect(),
        structured_data: SCRIPT
            .captures_iter(&source)
            .filter(|c| {
                parse_attributes(c.get(1).map_or("", |m| m.as_str()))
                    .get("type")
                    .map(String::as_str)
                    == Some("application/ld+json")
            })
            .map(|c| c[2].trim().to_string())
            .collect(),
        amp: links.iter().any(|t| t.attr("rel") == Some("amphtml")),
        breadcrumbs: tags.iter().any(|t| t.has_class("breadcrumb")),
        video: tags.iter().any(|t| t.name == "video"),
        status_code: 0,
    }
}

/// Anchor targets the crawl frontier may follow.
///
/// Matches every `href="..."` whose value contains no `#` or `?`, so
/// fragment and query links are dropped here rather than later.
pub fn crawl_hrefs(source: &str) -> Vec<String> {
    CRAWL_HREF
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect()
}

/// All start tags in document order
pub fn start_tags(source: &str) -> Vec<Tag> {
    START_TAG
        .captures_iter(source)
        .map(|c| Tag {
            name: c[1].to_ascii_lowercase(),
            attrs: parse_attributes(c.get(2).map_or("", |m| m.as_str())),
        })
        .collect()
}

/// Empties `<script>` and `<style>` bodies, whose text is never markup
fn without_raw_text(source: &str) -> String {
    let source = SCRIPT_BODY.replace_all(source, "${1}</script>");
    STYLE_BODY.replace_all(&source, "${1}</style>").into_owned()
}

fn named<'a>(tags: &'a [Tag], name: &str) -> Vec<&'a Tag> {
    tags.iter().filter(|t| t.name == name).collect()
}

/// Parses `name="value"` pairs; the first occurrence of a name wins
fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for c in ATTRIBUTE.captures_iter(raw) {
        let value = c
            .get(2)
            .or_else(|| c.get(3))
            .or_else(|| c.get(4))
            .map_or("", |m| m.as_str());
        attrs
            .entry(c[1].to_ascii_lowercase())
            .or_insert_with(|| decode_html_entities(value).into_owned());
    }
    attrs
}

fn element_texts(pattern: &Regex, source: &str) -> Vec<String> {
    pattern
        .captures_iter(source)
        .map(|c| {
            let inner = ANY_TAG.replace_all(&c[1], "");
            decode_html_entities(&inner).trim().to_string()
        })
        .collect()
}
