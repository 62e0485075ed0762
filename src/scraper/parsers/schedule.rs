//! Grade schedule (tournament list) parser for boatrace.jp
//!
//! URL: https://www.boatrace.jp/owpc/pc/race/gradesch?year=YYYY&hcd=NN
//!
//! The first table inside `<main>` lists one tournament per `<tbody>`; the
//! 6th cell links to its race list and the 8th to its results.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use scraper::{Html, Selector};

use super::table::{cells, TBODY};
use crate::scraper::absolute_url;

static MAIN_TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("main table").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Cell holding the race list link
const LIST_CELL: usize = 5;
/// Cell holding the race result link
const RESULT_CELL: usize = 7;

/// Race list and result entry points of one tournament
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentLinks {
    pub race_list_url: String,
    pub result_list_url: String,
}

/// Parser for grade schedule pages
pub struct ScheduleParser;

impl ScheduleParser {
    /// Parse tournament links.
    ///
    /// `Ok(None)` when the page has no table under `<main>` (e.g. an empty
    /// season); a listed tournament without its two links is an error.
    pub fn parse(html: &str, base_url: &str) -> Result<Option<Vec<TournamentLinks>>> {
        let document = Html::parse_document(html);

        let Some(table) = document.select(&MAIN_TABLE).next() else {
            return Ok(None);
        };

        let mut tournaments = Vec::new();

        for (idx, group) in table.select(&TBODY).enumerate() {
            let cols = cells(&group);

            let link_at = |col: usize| -> Result<String> {
                let href = cols
                    .get(col)
                    .and_then(|cell| cell.select(&LINK).next())
                    .and_then(|a| a.value().attr("href"))
                    .with_context(|| format!("tournament {}: no link in cell {}", idx + 1, col))?;
                Ok(absolute_url(base_url, href))
            };

            tournaments.push(TournamentLinks {
                race_list_url: link_at(LIST_CELL)?,
                result_list_url: link_at(RESULT_CELL)?,
            });
        }

        Ok(Some(tournaments))
    }
}
