//! Race card (出走表) parser for boatrace.jp
//!
//! URL: https://www.boatrace.jp/owpc/pc/race/racelist?rno=..&jcd=..&hd=..
//!
//! Each racer is one `<tbody>` of about four rows; the first row carries the
//! statistics, one multi-line cell per block:
//! 枠 | 写真 | 登番・氏名・支部・年齢/体重 | F数 L数 平均ST | 全国 | 当地 | モーター | ボート | ...

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::table::{cell_lines, cell_text, cells, find_table, joined_text, TBODY, TR};
use crate::types::{RaceCardEntry, RateTriple};

/// Text that identifies the race card table
pub const RACE_CARD_MARKERS: [&str; 2] = ["枠", "ボートレーサー"];

static LANE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='is-boatColor']").unwrap());
static HEADER_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("thead tr").unwrap());
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

static AGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{2})歳").unwrap());
static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{2,3}\.\d)kg").unwrap());

/// Column positions of the statistics cells in a lane group's first row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub st: usize,
    pub national: usize,
    pub local: usize,
    pub motor: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            st: 3,
            national: 4,
            local: 5,
            motor: 6,
        }
    }
}

impl ColumnLayout {
    /// Locate the statistics columns from the table header.
    ///
    /// Header cells may span several body columns (`colspan`). A block whose
    /// marker is not found in the header keeps its default position.
    pub fn resolve(table: &ElementRef) -> Self {
        let mut layout = Self::default();

        let Some(header) = table.select(&HEADER_ROW).next() else {
            return layout;
        };

        let mut found = [false; 4];
        let mut column = 0usize;

        for cell in header.select(&HEADER_CELL) {
            let text = cell_text(&cell);
            let span = cell
                .value()
                .attr("colspan")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);

            let slots = [
                ("ST", &mut layout.st),
                ("全国", &mut layout.national),
                ("当地", &mut layout.local),
                ("モーター", &mut layout.motor),
            ];
            for (i, (marker, slot)) in slots.into_iter().enumerate() {
                if !found[i] && text.contains(marker) {
                    *slot = column;
                    found[i] = true;
                }
            }

            column += span;
        }

        layout
    }
}

/// Parser for race card pages
pub struct RaceCardParser;

impl RaceCardParser {
    /// Parse every lane group of a race card.
    ///
    /// Any lane group missing an expected cell or line fails the whole page.
    pub fn parse(html: &str) -> Result<Vec<RaceCardEntry>> {
        let document = Html::parse_document(html);

        let table = find_table(&document, &RACE_CARD_MARKERS)
            .context("race card table (枠 / ボートレーサー) not found")?;

        let layout = ColumnLayout::resolve(&table);

        table
            .select(&TBODY)
            .enumerate()
            .map(|(idx, group)| {
                Self::parse_lane_group(&group, &layout)
                    .with_context(|| format!("race card lane group {}", idx + 1))
            })
            .collect()
    }

    fn parse_lane_group(group: &ElementRef, layout: &ColumnLayout) -> Result<RaceCardEntry> {
        let first_row = group.select(&TR).next().context("lane group has no rows")?;
        let cols = cells(&first_row);

        let lane_cell = first_row
            .select(&LANE_CELL)
            .next()
            .context("lane cell (is-boatColor) not found")?;
        let lane = cell_text(&lane_cell);

        // 年齢 / 体重 may sit in any row of the group: "佐賀/佐賀 39歳/52.0kg"
        let full_text = joined_text(group, " ");
        let age = AGE_RE.captures(&full_text).map(|caps| caps[1].to_string());
        let weight = WEIGHT_RE.captures(&full_text).map(|caps| caps[1].to_string());

        // F数, L数, 平均ST
        let avg_st = Self::line(&cols, layout.st, 2, "average ST")?;

        let national = Self::rate_triple(&cols, layout.national, "national")?;
        let local = Self::rate_triple(&cols, layout.local, "local")?;

        // No, 2連率, 3連率
        let motor_place2 = Self::line(&cols, layout.motor, 1, "motor 2-place rate")?;
        let motor_place3 = Self::line(&cols, layout.motor, 2, "motor 3-place rate")?;

        Ok(RaceCardEntry {
            lane,
            age,
            weight,
            avg_st,
            national,
            local,
            motor_place2,
            motor_place3,
        })
    }

    fn rate_triple(cols: &[ElementRef], col: usize, what: &str) -> Result<RateTriple> {
        Ok(RateTriple {
            win: Self::line(cols, col, 0, what)?,
            place2: Self::line(cols, col, 1, what)?,
            place3: Self::line(cols, col, 2, what)?,
        })
    }

    /// Line `line` of cell `col`, or an error naming both positions.
    fn line(cols: &[ElementRef], col: usize, line: usize, what: &str) -> Result<String> {
        let cell = cols
            .get(col)
            .with_context(|| format!("{}: cell {} missing ({} cells)", what, col, cols.len()))?;
        let lines = cell_lines(cell);
        lines
            .get(line)
            .cloned()
            .with_context(|| format!("{}: line {} of cell {} missing ({:?})", what, line, col, lines))
    }
}
