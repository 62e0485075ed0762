//! Date tab and per-race link discovery for boatrace.jp tournament pages
//!
//! A tournament page links each meeting day through `a.tab2_inner` tabs.
//! A day page links each race twice: a `出走表` anchor on the race list and an
//! `NR` anchor on the result list.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use scraper::{Html, Selector};

use super::table::cell_text;
use crate::scraper::absolute_url;

static DATE_TAB: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.tab2_inner[href]").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static RACE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+R$").unwrap());

/// Visible text of race card anchors
pub const RACE_CARD_TEXT: &str = "出走表";
/// Path fragment of race card URLs
pub const RACE_CARD_PATH: &str = "/race/racelist";
/// Path fragment of result URLs
pub const RESULT_PATH: &str = "raceresult";

/// Parser for tournament day pages
pub struct RaceListParser;

impl RaceListParser {
    /// Absolute URLs of every date tab, in page order.
    pub fn parse_date_tabs(html: &str, base_url: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);

        Ok(document
            .select(&DATE_TAB)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| absolute_url(base_url, href))
            .collect())
    }

    /// Race card links: `出走表` anchors pointing at a race list page.
    pub fn parse_race_card_links(html: &str, base_url: &str) -> Result<Vec<String>> {
        Ok(Self::links_where(html, base_url, |text, url| {
            text == RACE_CARD_TEXT && url.contains(RACE_CARD_PATH)
        }))
    }

    /// Result links: `NR` anchors pointing at a race result page.
    pub fn parse_result_links(html: &str, base_url: &str) -> Result<Vec<String>> {
        Ok(Self::links_where(html, base_url, |text, url| {
            RACE_NUMBER_RE.is_match(text) && url.contains(RESULT_PATH)
        }))
    }

    fn links_where<F>(html: &str, base_url: &str, keep: F) -> Vec<String>
    where
        F: Fn(&str, &str) -> bool,
    {
        let document = Html::parse_document(html);
        let mut links = Vec::new();

        for a in document.select(&LINK) {
            let Some(href) = a.value().attr("href") else {
                continue;
            };
            let url = absolute_url(base_url, href);
            let text = cell_text(&a);
            if keep(&text, &url) {
                links.push(url);
            }
        }

        links
    }
}
