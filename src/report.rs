use crate::links::LinkClassification;
use crate::results::PageSignals;
use serde::{Deserialize, Serialize};

/// Longest title search engines display in full
pub const TITLE_MAX_CHARS: usize = 60;

/// Longest meta description search engines display in full
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Per-page audit record as it appears in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAudit {
    pub url: String,
    pub status_code: u16,
    pub title: String,
    pub meta_description: String,
    pub keywords: String,
    pub viewport: String,
    pub h1: String,
    pub h2: Vec<String>,
    pub internal_links: usize,
    pub external_links: usize,
    pub images: usize,
    pub images_missing_alt: usize,
    pub images_not_lazy: usize,
    pub og_title: String,
    pub og_description: String,
    pub twitter_card: String,
    pub structured_data: bool,
    pub mobile_friendly: bool,
    pub amp: bool,
    pub breadcrumbs: bool,
    pub video: bool,
    pub hreflang: Vec<String>,
    pub indexable: bool,
    pub canonical: String,
    pub social_tags: bool,
    pub broken_links: usize,
    pub page_audit: PageSummary,
}

/// Nested summary kept for consumers of the grouped report layout.
///
/// `page_speed` and `backlinks` are not measured and always serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub h1: String,
    pub content: String,
    pub internal_links: usize,
    pub external_links: usize,
    pub images: usize,
    pub images_with_alt: usize,
    pub structured_data: bool,
    pub mobile_friendly: bool,
    pub page_speed: Option<u32>,
    pub backlinks: Option<u32>,
    pub indexable: bool,
    pub canonical: String,
    pub social_tags: bool,
}

impl PageAudit {
    pub fn new(url: &str, signals: &PageSignals, links: &LinkClassification) -> Self {
        let images = signals.images.len();
        let images_missing_alt = signals.images_missing_alt();

        let page_audit = PageSummary {
            url: url.to_string(),
            title: signals.title.clone(),
            meta_description: signals.description.clone(),
            h1: signals.first_h1().to_string(),
            content: String::new(),
            internal_links: links.internal,
            external_links: links.external,
            images,
            images_with_alt: images - images_missing_alt,
            structured_data: signals.has_structured_data(),
            mobile_friendly: signals.is_mobile_friendly(),
            page_speed: None,
            backlinks: None,
            indexable: signals.is_indexable(),
            canonical: signals.canonical.clone(),
            social_tags: signals.has_social_tags(),
        };

        Self {
            url: url.to_string(),
            status_code: signals.status_code,
            title: signals.title.clone(),
            meta_description: signals.description.clone(),
            keywords: signals.keywords.clone(),
            viewport: signals.viewport.clone(),
            h1: signals.first_h1().to_string(),
            h2: signals.headings.h2.clone(),
            internal_links: links.internal,
            external_links: links.external,
            images,
            images_missing_alt,
            images_not_lazy: signals.images_not_lazy(),
            og_title: signals.og_title.clone(),
            og_description: signals.og_description.clone(),
            twitter_card: signals.twitter_card.clone(),
            structured_data: signals.has_structured_data(),
            mobile_friendly: signals.is_mobile_friendly(),
            amp: signals.amp,
            breadcrumbs: signals.breadcrumbs,
            video: signals.video,
            hreflang: signals.hreflang.clone(),
            indexable: signals.is_indexable(),
            canonical: signals.canonical.clone(),
            social_tags: signals.has_social_tags(),
            broken_links: links.broken,
            page_audit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingCategory {
    BestPractice,
    Improvement,
}

/// One threshold check over a page
pub struct Rule {
    pub category: FindingCategory,
    pub message: &'static str,
    pub applies: fn(&PageAudit) -> bool,
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

/// Evaluated in order; every rule is independent of the others
pub static RULES: &[Rule] = &[
    Rule {
        category: FindingCategory::Improvement,
        message: "Title is missing",
        applies: |p| p.title.is_empty(),
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Title is longer than 60 characters",
        applies: |p| chars(&p.title) > TITLE_MAX_CHARS,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Title length is within 60 characters",
        applies: |p| !p.title.is_empty() && chars(&p.title) <= TITLE_MAX_CHARS,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Meta description is missing",
        applies: |p| p.meta_description.is_empty(),
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Meta description is longer than 160 characters",
        applies: |p| chars(&p.meta_description) > DESCRIPTION_MAX_CHARS,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Meta description length is within 160 characters",
        applies: |p| {
            !p.meta_description.is_empty() && chars(&p.meta_description) <= DESCRIPTION_MAX_CHARS
        },
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Page has an H1 heading",
        applies: |p| !p.h1.is_empty(),
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Add an H1 heading",
        applies: |p| p.h1.is_empty(),
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Some images are missing alt text",
        applies: |p| p.images_missing_alt > 0,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "All images have alt text",
        applies: |p| p.images > 0 && p.images_missing_alt == 0,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Some images are not lazy loaded",
        applies: |p| p.images_not_lazy > 0,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Viewport meta tag is set for mobile devices",
        applies: |p| p.mobile_friendly,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Add a viewport meta tag for mobile devices",
        applies: |p| !p.mobile_friendly,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Canonical URL is specified",
        applies: |p| !p.canonical.is_empty(),
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Specify a canonical URL",
        applies: |p| p.canonical.is_empty(),
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Structured data is present",
        applies: |p| p.structured_data,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Add structured data (JSON-LD)",
        applies: |p| !p.structured_data,
    },
    Rule {
        category: FindingCategory::BestPractice,
        message: "Social sharing tags are present",
        applies: |p| p.social_tags,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Add Open Graph or Twitter Card tags",
        applies: |p| !p.social_tags,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Fix broken links",
        applies: |p| p.broken_links > 0,
    },
    Rule {
        category: FindingCategory::Improvement,
        message: "Page does not return status 200 and may not be indexed",
        applies: |p| !p.indexable,
    },
];

/// Messages of the rules that apply to a page, split by category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Findings {
    pub best_practices: Vec<String>,
    pub improvements: Vec<String>,
}

/// Run every rule over `page` in order
pub fn evaluate(page: &PageAudit) -> Findings {
    let mut findings = Findings::default();

    for rule in RULES.iter().filter(|rule| (rule.applies)(page)) {
        match rule.category {
            FindingCategory::BestPractice => findings.best_practices.push(rule.message.to_string()),
            FindingCategory::Improvement => findings.improvements.push(rule.message.to_string()),
        }
    }

    findings
}

/// Site-level report returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReport {
    pub total_pages: usize,
    pub pages: Vec<PageAudit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_practices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
}

/// Fold analyzed pages into a report, keeping their order.
///
/// In single-page mode the primary (first) page's findings are attached.
pub fn aggregate(pages: Vec<PageAudit>, single_page: bool) -> SiteReport {
    let findings = match pages.first() {
        Some(primary) if single_page => Some(evaluate(primary)),
        _ => None,
    };

    SiteReport {
        total_pages: pages.len(),
        pages,
        best_practices: findings.as_ref().map(|f| f.best_practices.clone()),
        improvements: findings.map(|f| f.improvements),
    }
}
