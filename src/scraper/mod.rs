//! Web scraper module for boatrace.jp
//!
//! Provides the page fetcher, the race folder store, the crawl that fills it,
//! and the HTML parsers used by both the crawl and the extraction.

pub mod collector;
pub mod fetcher;
pub mod html_store;
pub mod parsers;
pub mod rate_limiter;

pub use collector::{CollectOptions, Collector};
pub use fetcher::Fetcher;
pub use html_store::{HtmlStore, PageKind};
pub use rate_limiter::RateLimiter;

/// Path fragment that distinguishes a race card URL from its odds URL
const RACE_CARD_PAGE: &str = "racelist";
/// Win/place odds page
const ODDS_PAGE: &str = "oddstf";

/// Resolve a link found on a page against the site root.
///
/// Absolute links are returned unchanged.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

/// Build the win odds URL of a race from its race card URL
pub fn odds_url(race_card_url: &str) -> String {
    race_card_url.replace(RACE_CARD_PAGE, ODDS_PAGE)
}
