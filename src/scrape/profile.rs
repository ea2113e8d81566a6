//! RateMyProfessors page scanning: search-result listings and profile metrics.
//!
//! Every visited page is run through both scans, so a page that happens to
//! contain listings and metrics yields both. The class names below are tied
//! to the site's generated CSS and break whenever the site is rebuilt.

use html_scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

use crate::data::names::{NameKey, parse_listing_name};
use crate::data::rating::{RatingValue, labels};

static LISTING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".main").unwrap());
static QUALITY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".RatingValue__Numerator-qw8sqy-2").unwrap());
static FEEDBACK_NUMBER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".FeedbackItem__FeedbackNumber-uof32n-1").unwrap());

const LISTING_SUBTEXT_CLASS: &str = "sub";
const FEEDBACK_DESCRIPTION_CLASS: &str = "FeedbackItem__FeedbackDescription-uof32n-2";

const DIFFICULTY_DESCRIPTION: &str = "Level of Difficulty";
const WOULD_TAKE_AGAIN_DESCRIPTION: &str = "Would take again";

/// What a single page contributed to a lookup.
#[derive(Debug, Default)]
pub struct PageScan {
    /// Profile pages of matching listings, in document order.
    pub profile_links: Vec<Url>,
    /// Metrics found on the page, in extraction order.
    pub values: Vec<RatingValue>,
}

/// Scan a fetched page for matching listings and rating metrics.
///
/// `target` must already be normalized; `city` is matched case-sensitively
/// against each listing's subtext.
pub fn scan_page(body: &str, page_url: &Url, target: &NameKey, city: &str) -> PageScan {
    let html = Html::parse_document(body);
    let profile_links = matching_profile_links(&html, page_url, target, city);
    let mut values = quality_values(&html);
    values.extend(feedback_values(&html));
    PageScan {
        profile_links,
        values,
    }
}

fn matching_profile_links(html: &Html, page_url: &Url, target: &NameKey, city: &str) -> Vec<Url> {
    let mut links = Vec::new();

    for listing in html.select(&LISTING_SEL) {
        let text = element_text(listing);
        let Some(name) = parse_listing_name(&text) else {
            trace!(listing = text.trim(), "Listing without a comma, skipping");
            continue;
        };
        if name != *target {
            continue;
        }

        let Some(parent) = parent_element(listing) else {
            continue;
        };
        let school = child_text_with_class(parent, LISTING_SUBTEXT_CLASS);
        if !school.contains(city) {
            debug!(school = school.trim(), city, "Name matched at another school");
            continue;
        }

        let Some(href) = parent_element(parent).and_then(|anchor| anchor.value().attr("href"))
        else {
            continue;
        };
        match page_url.join(href) {
            Ok(link) => links.push(link),
            Err(e) => debug!(href, error = %e, "Unresolvable listing link"),
        }
    }

    links
}

fn quality_values(html: &Html) -> Vec<RatingValue> {
    html.select(&QUALITY_SEL)
        .map(|el| RatingValue::new(labels::QUALITY, element_text(el).trim()))
        .collect()
}

fn feedback_values(html: &Html) -> Vec<RatingValue> {
    let mut values = Vec::new();
    for number in html.select(&FEEDBACK_NUMBER_SEL) {
        let Some(parent) = parent_element(number) else {
            continue;
        };
        let label = match child_text_with_class(parent, FEEDBACK_DESCRIPTION_CLASS).as_str() {
            DIFFICULTY_DESCRIPTION => labels::DIFFICULTY,
            WOULD_TAKE_AGAIN_DESCRIPTION => labels::WOULD_TAKE_AGAIN,
            _ => continue,
        };
        values.push(RatingValue::new(label, element_text(number).trim()));
    }
    values
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Concatenated text of the direct children of `parent` carrying `class`.
fn child_text_with_class(parent: ElementRef<'_>, class: &str) -> String {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().classes().any(|c| c == class))
        .flat_map(|child| child.text())
        .collect()
}
