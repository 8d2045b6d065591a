use serde::{Deserialize, Serialize};

/// An `<img>` element as seen on a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImageRecord {
    /// Absolute image URL (empty if the element had no src)
    pub src: String,

    /// Alt text (empty if missing)
    pub alt: String,

    /// Whether the image is lazy loaded
    pub lazy: bool,
}

/// Heading texts in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
}

/// Raw SEO facts extracted from one rendered page.
///
/// Every field defaults to an empty value when the page does not carry
/// the corresponding element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub viewport: String,

    /// Absolute canonical URL
    pub canonical: String,

    pub og_title: String,
    pub og_description: String,
    pub twitter_card: String,

    pub headings: Headings,
    pub images: Vec<ImageRecord>,

    /// Outbound anchor targets, resolved against the page URL, in document order
    pub links: Vec<String>,

    /// Language codes of `<link rel="alternate" hreflang>` elements
    pub hreflang: Vec<String>,

    /// Contents of `application/ld+json` script blocks
    pub structured_data: Vec<String>,

    pub amp: bool,
    pub breadcrumbs: bool,
    pub video: bool,

    /// Status of the navigation response, 0 if none was observed
    pub status_code: u16,
}

impl PageSignals {
    /// Attach the status code observed while loading the page
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Images without alt text
    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|img| img.alt.is_empty()).count()
    }

    /// Images that are not lazy loaded
    pub fn images_not_lazy(&self) -> usize {
        self.images.iter().filter(|img| !img.lazy).count()
    }

    pub fn first_h1(&self) -> &str {
        self.headings.h1.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_structured_data(&self) -> bool {
        !self.structured_data.is_empty()
    }

    /// A viewport meta value is taken as the mobile-friendliness signal
    pub fn is_mobile_friendly(&self) -> bool {
        !self.viewport.is_empty()
    }

    pub fn has_social_tags(&self) -> bool {
        !self.og_title.is_empty() || !self.og_description.is_empty() || !self.twitter_card.is_empty()
    }

    pub fn is_indexable(&self) -> bool {
        self.status_code == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(alt: &str, lazy: bool) -> ImageRecord {
        ImageRecord {
            src: "https://example.com/a.png".to_string(),
            alt: alt.to_string(),
            lazy,
        }
    }

    #[test]
    fn test_empty_signals_are_falsy() {
        let signals = PageSignals::default();
        assert_eq!(signals.first_h1(), "");
        assert!(!signals.has_structured_data());
        assert!(!signals.is_mobile_friendly());
        assert!(!signals.has_social_tags());
        assert!(!signals.is_indexable());
        assert_eq!(signals.status_code, 0);
    }

    #[test]
    fn test_image_counts() {
        let signals = PageSignals {
            images: vec![image("", false), image("logo", true), image("", true)],
            ..PageSignals::default()
        };
        assert_eq!(signals.images_missing_alt(), 2);
        assert_eq!(signals.images_not_lazy(), 1);
    }

    #[test]
    fn test_social_tags_from_any_source() {
        let twitter_only = PageSignals {
            twitter_card: "summary".to_string(),
            ..PageSignals::default()
        };
        assert!(twitter_only.has_social_tags());

        let og_only = PageSignals {
            og_description: "Widgets".to_string(),
            ..PageSignals::default()
        };
        assert!(og_only.has_social_tags());
    }

    #[test]
    fn test_indexable_only_on_200() {
        assert!(PageSignals::default().with_status(200).is_indexable());
        assert!(!PageSignals::default().with_status(301).is_indexable());
        assert!(!PageSignals::default().with_status(404).is_indexable());
    }
}
