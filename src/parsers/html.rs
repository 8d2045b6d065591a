use crate::parsers::{collapse_whitespace, resolve_url};
use crate::results::{Headings, ImageRecord, PageSignals};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should be valid")
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_NAME: LazyLock<Selector> = LazyLock::new(|| selector("meta[name]"));
static META_PROPERTY: LazyLock<Selector> = LazyLock::new(|| selector("meta[property]"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='canonical']"));
static HREFLANG: LazyLock<Selector> =
    LazyLock::new(|| selector("link[rel='alternate'][hreflang]"));
static AMP: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='amphtml']"));
static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| selector("script[type='application/ld+json']"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static BREADCRUMB: LazyLock<Selector> = LazyLock::new(|| selector("nav.breadcrumb, .breadcrumb"));
static VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("video"));

/// Extracts page signals from a parsed (rendered) HTML document
pub fn extract(source: &str, base: &Url) -> PageSignals {
    let doc = Html::parse_document(source);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    let canonical = doc
        .select(&CANONICAL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| resolve_url(base, href))
        .unwrap_or_default();

    let images = doc
        .select(&IMG)
        .map(|el| {
            let attrs = el.value();
            ImageRecord {
                src: attrs.attr("src").map(|s| resolve_url(base, s)).unwrap_or_default(),
                alt: attrs.attr("alt").unwrap_or_default().to_string(),
                lazy: attrs
                    .attr("loading")
                    .is_some_and(|l| l.trim().eq_ignore_ascii_case("lazy")),
            }
        })
        .collect();

    let links = doc
        .select(&ANCHOR)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| resolve_url(base, href))
        .collect();

    PageSignals {
        title,
        description: meta_content(&doc, &META_NAME, "name", "description"),
        keywords: meta_content(&doc, &META_NAME, "name", "keywords"),
        viewport: meta_content(&doc, &META_NAME, "name", "viewport"),
        canonical,
        og_title: meta_content(&doc, &META_PROPERTY, "property", "og:title"),
        og_description: meta_content(&doc, &META_PROPERTY, "property", "og:description"),
        twitter_card: meta_content(&doc, &META_NAME, "name", "twitter:card"),
        headings: Headings {
            h1: heading_texts(&doc, &H1),
            h2: heading_texts(&doc, &H2),
        },
        images,
        links,
        hreflang: doc
            .select(&HREFLANG)
            .filter_map(|el| el.value().attr("hreflang"))
            .map(str::to_string)
            .collect(),
        structured_data: doc
            .select(&LD_JSON)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect(),
        amp: doc.select(&AMP).next().is_some(),
        breadcrumbs: doc.select(&BREADCRUMB).next().is_some(),
        video: doc.select(&VIDEO).next().is_some(),
        status_code: 0,
    }
}

/// Content of the first meta element whose `attr` equals `key`
fn meta_content(doc: &Html, sel: &Selector, attr: &str, key: &str) -> String {
    doc.select(sel)
        .find(|el| el.value().attr(attr) == Some(key))
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

fn heading_texts(doc: &Html, sel: &Selector) -> Vec<String> {
    doc.select(sel).map(text_content).collect()
}

fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
