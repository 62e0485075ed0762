//! Per-lane dataset: join the three pages of each race folder on lane number
//! and write every race's rows to one CSV.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use crate::normalize::{opt_integer, opt_number, to_integer, to_number};
use crate::scraper::parsers::{OddsParser, RaceCardParser, RaceResultParser};
use crate::scraper::{HtmlStore, PageKind};
use crate::types::{LaneRow, OddsEntry, RaceCardEntry, RaceKey, ResultEntry};

/// Output columns, in file order
pub const COLUMNS: [&str; 19] = [
    "race_key",
    "race_date",
    "venue",
    "race_number",
    "racer_id",
    "lane",
    "rank",
    "age",
    "weight",
    "avg_st",
    "national_win_rate",
    "national_2_rate",
    "national_3_rate",
    "local_win_rate",
    "local_2_rate",
    "local_3_rate",
    "motor_2_rate",
    "motor_3_rate",
    "win_odds",
];

/// Progress is logged every this many race folders
const PROGRESS_EVERY: usize = 50;

/// Counters reported at the end of an extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub races: usize,
    pub rows: usize,
    pub failed: usize,
}

/// Parse the three pages of one race folder and join them.
pub fn extract_race(race_dir: &Path) -> Result<Vec<LaneRow>> {
    let folder = race_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("race folder without a name: {}", race_dir.display()))?;
    let key = RaceKey::parse(&folder);

    let cards = RaceCardParser::parse(&HtmlStore::read(race_dir, PageKind::RaceCard)?)
        .with_context(|| format!("{}: race card", folder))?;
    let odds = OddsParser::parse(&HtmlStore::read(race_dir, PageKind::Odds)?)
        .with_context(|| format!("{}: odds", folder))?;
    let results = RaceResultParser::parse(&HtmlStore::read(race_dir, PageKind::Result)?)
        .with_context(|| format!("{}: result", folder))?;

    Ok(merge_race(&key, &cards, &odds, &results))
}

/// Inner join of race card, odds and result rows on normalized lane number.
///
/// Rows come out in lane order. A lane missing from any page, or whose lane
/// text is not a number, is dropped with a warning.
pub fn merge_race(
    key: &RaceKey,
    cards: &[RaceCardEntry],
    odds: &[OddsEntry],
    results: &[ResultEntry],
) -> Vec<LaneRow> {
    let odds_by_lane = index_by_lane(odds, |o| &o.lane, &key.raw, "odds");
    let results_by_lane = index_by_lane(results, |r| &r.lane, &key.raw, "result");
    let cards_by_lane = index_by_lane(cards, |c| &c.lane, &key.raw, "race card");

    let mut rows = Vec::with_capacity(cards_by_lane.len());

    for (&lane, card) in &cards_by_lane {
        let (Some(odds), Some(result)) = (odds_by_lane.get(&lane), results_by_lane.get(&lane)) else {
            warn!("{}: lane {} missing from odds or result page", key.raw, lane);
            continue;
        };

        rows.push(LaneRow {
            race_key: key.raw.clone(),
            race_date: key.date,
            venue: key.venue.clone(),
            race_number: key.race_number,
            racer_id: to_integer(&result.racer_id),
            lane,
            rank: to_integer(&result.rank),
            age: opt_integer(card.age.as_deref()),
            weight: opt_number(card.weight.as_deref()),
            avg_st: to_number(&card.avg_st),
            national_win_rate: to_number(&card.national.win),
            national_2_rate: to_number(&card.national.place2),
            national_3_rate: to_number(&card.national.place3),
            local_win_rate: to_number(&card.local.win),
            local_2_rate: to_number(&card.local.place2),
            local_3_rate: to_number(&card.local.place3),
            motor_2_rate: to_number(&card.motor_place2),
            motor_3_rate: to_number(&card.motor_place3),
            win_odds: to_number(&odds.win_odds),
        });
    }

    for lane in lanes_without_card(&cards_by_lane, &odds_by_lane, &results_by_lane) {
        warn!("{}: lane {} has no race card row", key.raw, lane);
    }

    rows
}

/// Lanes listed on the odds or result page but absent from the race card
fn lanes_without_card<A, B, C>(
    cards: &BTreeMap<i64, A>,
    odds: &BTreeMap<i64, B>,
    results: &BTreeMap<i64, C>,
) -> BTreeSet<i64> {
    odds.keys()
        .chain(results.keys())
        .filter(|lane| !cards.contains_key(lane))
        .copied()
        .collect()
}

/// Key rows by normalized lane; the first row for a lane wins.
fn index_by_lane<'a, T, F>(items: &'a [T], lane_of: F, race: &str, page: &str) -> BTreeMap<i64, &'a T>
where
    F: Fn(&T) -> &String,
{
    let mut by_lane = BTreeMap::new();
    for item in items {
        let raw = lane_of(item);
        match to_integer(raw) {
            Some(lane) => {
                by_lane.entry(lane).or_insert(item);
            }
            None => warn!("{}: {} row with unreadable lane {:?}", race, page, raw),
        }
    }
    by_lane
}

/// Extract every race folder under the store, in folder-name order.
///
/// With `skip_malformed`, a folder that fails to parse is logged and left out;
/// otherwise the first failure ends the run.
pub fn build_dataset(store: &HtmlStore, skip_malformed: bool) -> Result<(Vec<LaneRow>, ExtractSummary)> {
    let race_dirs = store.race_dirs()?;
    let total = race_dirs.len();
    info!("Extracting {} race folders from {}", total, store.base_dir().display());

    let mut rows = Vec::new();
    let mut summary = ExtractSummary::default();

    for (i, race_dir) in race_dirs.iter().enumerate() {
        match extract_race(race_dir) {
            Ok(race_rows) => {
                summary.races += 1;
                rows.extend(race_rows);
            }
            Err(e) if skip_malformed => {
                summary.failed += 1;
                warn!("Skipping {}: {:#}", race_dir.display(), e);
            }
            Err(e) => return Err(e),
        }

        if i % PROGRESS_EVERY == 0 {
            info!("{}/{}", i, total);
        }
    }

    summary.rows = rows.len();
    Ok((rows, summary))
}

fn column<T, P: ?Sized>(name: &str, values: T) -> Column
where
    Series: NamedFrom<T, P>,
{
    Series::new(name.into(), values).into()
}

/// Build the output table
pub fn to_dataframe(rows: &[LaneRow]) -> Result<DataFrame> {
    let floats = |f: fn(&LaneRow) -> Option<f64>| rows.iter().map(f).collect::<Vec<_>>();
    let ints = |f: fn(&LaneRow) -> Option<i64>| rows.iter().map(f).collect::<Vec<_>>();

    let columns = vec![
        column(COLUMNS[0], rows.iter().map(|r| r.race_key.clone()).collect::<Vec<_>>()),
        column(
            COLUMNS[1],
            rows.iter()
                .map(|r| r.race_date.map(|d| d.format("%Y-%m-%d").to_string()))
                .collect::<Vec<_>>(),
        ),
        column(COLUMNS[2], rows.iter().map(|r| r.venue.clone()).collect::<Vec<_>>()),
        column(COLUMNS[3], ints(|r| r.race_number.map(i64::from))),
        column(COLUMNS[4], ints(|r| r.racer_id)),
        column(COLUMNS[5], rows.iter().map(|r| r.lane).collect::<Vec<_>>()),
        column(COLUMNS[6], ints(|r| r.rank)),
        column(COLUMNS[7], ints(|r| r.age)),
        column(COLUMNS[8], floats(|r| r.weight)),
        column(COLUMNS[9], floats(|r| r.avg_st)),
        column(COLUMNS[10], floats(|r| r.national_win_rate)),
        column(COLUMNS[11], floats(|r| r.national_2_rate)),
        column(COLUMNS[12], floats(|r| r.national_3_rate)),
        column(COLUMNS[13], floats(|r| r.local_win_rate)),
        column(COLUMNS[14], floats(|r| r.local_2_rate)),
        column(COLUMNS[15], floats(|r| r.local_3_rate)),
        column(COLUMNS[16], floats(|r| r.motor_2_rate)),
        column(COLUMNS[17], floats(|r| r.motor_3_rate)),
        column(COLUMNS[18], floats(|r| r.win_odds)),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Write rows as CSV with a header line, creating parent directories.
pub fn write_csv(rows: &[LaneRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut df = to_dataframe(rows)?;
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
