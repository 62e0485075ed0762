//! Crawl from grade schedule pages down to individual races and download
//! each race's card, result and odds pages.
//!
//! schedule → tournament (list + result pages) → meeting days → races

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use super::fetcher::{Fetcher, PageSource};
use super::html_store::{HtmlStore, PageKind};
use super::odds_url;
use super::parsers::{RaceListParser, ScheduleParser};
use super::rate_limiter::RateLimiter;
use crate::types::RaceKey;

/// The three pages of one race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceLinks {
    pub key: RaceKey,
    pub race_card_url: String,
    pub result_url: String,
    pub odds_url: String,
}

/// Collector switches
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Leave races whose three pages are already on disk alone
    pub skip_existing: bool,
    /// Discover races without downloading them
    pub dry_run: bool,
}

/// Counters reported at the end of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub tournaments: usize,
    pub races: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

/// Sequential crawler
pub struct Collector<S = Fetcher> {
    fetcher: S,
    limiter: RateLimiter,
    store: HtmlStore,
    base_url: String,
}

impl<S: PageSource> Collector<S> {
    pub fn new(fetcher: S, limiter: RateLimiter, store: HtmlStore, base_url: &str) -> Self {
        Self {
            fetcher,
            limiter,
            store,
            base_url: base_url.to_string(),
        }
    }

    /// Crawl every seed page. The first network or page error ends the run.
    pub async fn run(&self, seed_urls: &[String], options: CollectOptions) -> Result<CollectSummary> {
        let mut summary = CollectSummary::default();

        for seed in seed_urls {
            let html = self.fetcher.fetch_page(seed).await?;
            let tournaments = ScheduleParser::parse(&html, &self.base_url)
                .with_context(|| format!("schedule page {}", seed))?;

            let Some(tournaments) = tournaments else {
                warn!("No tournament table found on {}", seed);
                continue;
            };

            for tournament in tournaments {
                summary.tournaments += 1;

                let race_cards = self.race_card_links(&tournament.race_list_url).await?;
                let results = self.result_links(&tournament.result_list_url).await?;
                self.limiter.wait().await;

                for race in pair_races(&race_cards, &results) {
                    summary.races += 1;

                    if options.dry_run {
                        info!("found {}", race.key.raw);
                        continue;
                    }
                    if options.skip_existing && self.store.is_complete(&race.key.raw) {
                        summary.skipped += 1;
                        continue;
                    }

                    self.download(&race).await?;
                    summary.downloaded += 1;
                    info!("downloaded {}", race.key.raw);
                }
            }
        }

        Ok(summary)
    }

    /// Fetch the three pages of a race into its folder
    pub async fn download(&self, race: &RaceLinks) -> Result<()> {
        let pages = [
            (PageKind::RaceCard, &race.race_card_url),
            (PageKind::Result, &race.result_url),
            (PageKind::Odds, &race.odds_url),
        ];

        for (kind, url) in pages {
            let html = self.fetcher.fetch_page(url).await?;
            self.store.write(&race.key.raw, kind, &html)?;
        }

        Ok(())
    }

    async fn race_card_links(&self, tournament_url: &str) -> Result<Vec<String>> {
        let mut links = Vec::new();
        for day_url in self.day_urls(tournament_url).await? {
            let html = self.fetcher.fetch_page(&day_url).await?;
            links.extend(RaceListParser::parse_race_card_links(&html, &self.base_url)?);
        }
        Ok(links)
    }

    async fn result_links(&self, tournament_url: &str) -> Result<Vec<String>> {
        let mut links = Vec::new();
        for day_url in self.day_urls(tournament_url).await? {
            let html = self.fetcher.fetch_page(&day_url).await?;
            links.extend(RaceListParser::parse_result_links(&html, &self.base_url)?);
        }
        Ok(links)
    }

    /// Meeting day pages of a tournament; the page itself when it has no tabs
    async fn day_urls(&self, tournament_url: &str) -> Result<Vec<String>> {
        let html = self.fetcher.fetch_page(tournament_url).await?;
        let tabs = RaceListParser::parse_date_tabs(&html, &self.base_url)?;
        if tabs.is_empty() {
            return Ok(vec![tournament_url.to_string()]);
        }
        Ok(tabs)
    }
}

/// Match race card links with result links by race key.
///
/// Output follows race card order, one entry per key. Unmatched links on
/// either side are logged and dropped.
pub fn pair_races(race_card_urls: &[String], result_urls: &[String]) -> Vec<RaceLinks> {
    let mut results_by_key: HashMap<String, &String> = HashMap::new();
    for url in result_urls {
        match RaceKey::from_url(url) {
            Some(key) => {
                results_by_key.entry(key.raw).or_insert(url);
            }
            None => warn!("result link without race key: {}", url),
        }
    }

    let mut seen = HashSet::new();
    let mut races = Vec::new();

    for url in race_card_urls {
        let Some(key) = RaceKey::from_url(url) else {
            warn!("race card link without race key: {}", url);
            continue;
        };
        if !seen.insert(key.raw.clone()) {
            continue;
        }
        let Some(result_url) = results_by_key.get(&key.raw) else {
            warn!("race and result do not match: no result for {}", url);
            continue;
        };
        races.push(RaceLinks {
            odds_url: odds_url(url),
            result_url: (*result_url).clone(),
            race_card_url: url.clone(),
            key,
        });
    }

    for (key, url) in &results_by_key {
        if !seen.contains(key) {
            warn!("race and result do not match: no race card for {}", url);
        }
    }

    races
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const BASE: &str = "https://www.boatrace.jp";
    const SEED: &str = "https://www.boatrace.jp/owpc/pc/race/gradesch?year=2024&hcd=01";
    const EMPTY_SEED: &str = "https://www.boatrace.jp/owpc/pc/race/gradesch?year=2024&hcd=02";
    const RACE_INDEX: &str = "https://www.boatrace.jp/owpc/pc/race/raceindex?jcd=01&hd=20240101";
    const RACE_INDEX_DAY2: &str = "https://www.boatrace.jp/owpc/pc/race/raceindex?jcd=01&hd=20240102";
    const RESULT_LIST: &str = "https://www.boatrace.jp/owpc/pc/race/resultlist?jcd=01&hd=20240101";

    const DAY1_KEY: &str = "rno=1&jcd=01&hd=20240101";
    const DAY2_KEY: &str = "rno=1&jcd=01&hd=20240102";

    const SCHEDULE_HTML: &str = r#"<html><body><main><table>
  <tbody>
    <tr>
      <td>01/01-01/02</td><td>桐生</td><td>G1</td><td>開設記念</td><td></td>
      <td><a href="/owpc/pc/race/raceindex?jcd=01&amp;hd=20240101">出走表</a></td>
      <td>-</td>
      <td><a href="/owpc/pc/race/resultlist?jcd=01&amp;hd=20240101">結果</a></td>
    </tr>
  </tbody>
</table></main></body></html>"#;

    const EMPTY_SCHEDULE_HTML: &str =
        "<html><body><main><p>該当データはありません</p></main></body></html>";

    fn day_html(hd: &str) -> String {
        format!(
            r#"<html><body>
<ul class="tab2_tabs">
  <li><a class="tab2_inner" href="/owpc/pc/race/raceindex?jcd=01&amp;hd=20240101">1日目</a></li>
  <li><a class="tab2_inner" href="/owpc/pc/race/raceindex?jcd=01&amp;hd=20240102">2日目</a></li>
</ul>
<table><tbody><tr>
  <td><a href="/owpc/pc/race/racelist?rno=1&amp;jcd=01&amp;hd={hd}">出走表</a></td>
</tr></tbody></table>
</body></html>"#
        )
    }

    // no date tabs: the result list is its own day page
    const RESULT_LIST_HTML: &str = r#"<html><body><table><tbody>
  <tr><td><a href="/owpc/pc/race/raceresult?rno=1&amp;jcd=01&amp;hd=20240101">1R</a></td></tr>
  <tr><td><a href="/owpc/pc/race/raceresult?rno=1&amp;jcd=01&amp;hd=20240102">1R</a></td></tr>
</tbody></table></body></html>"#;

    /// In-memory site keyed by URL, recording every request
    struct CannedSite {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedSite {
        fn new() -> Self {
            let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("testdata/html")
                .join(DAY1_KEY);
            let page = |kind: PageKind| HtmlStore::read(&fixture, kind).unwrap();

            let mut pages = HashMap::new();
            pages.insert(SEED.to_string(), SCHEDULE_HTML.to_string());
            pages.insert(EMPTY_SEED.to_string(), EMPTY_SCHEDULE_HTML.to_string());
            pages.insert(RACE_INDEX.to_string(), day_html("20240101"));
            pages.insert(RACE_INDEX_DAY2.to_string(), day_html("20240102"));
            pages.insert(RESULT_LIST.to_string(), RESULT_LIST_HTML.to_string());

            for key in [DAY1_KEY, DAY2_KEY] {
                pages.insert(card(key), page(PageKind::RaceCard));
                pages.insert(result(key), page(PageKind::Result));
                pages.insert(odds_url(&card(key)), page(PageKind::Odds));
            }

            Self {
                pages,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests_for(&self, url: &str) -> usize {
            self.requests.lock().unwrap().iter().filter(|r| *r == url).count()
        }
    }

    impl PageSource for &CannedSite {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .with_context(|| format!("404 Not Found: {}", url))
        }
    }

    fn collector<'a>(site: &'a CannedSite, dir: &std::path::Path) -> Collector<&'a CannedSite> {
        Collector::new(site, RateLimiter::new(0, 0), HtmlStore::new(dir), BASE)
    }

    fn seeds() -> Vec<String> {
        vec![EMPTY_SEED.to_string(), SEED.to_string()]
    }

    #[tokio::test]
    async fn test_run_downloads_three_pages_per_race() {
        let tmp = tempfile::tempdir().unwrap();
        let site = CannedSite::new();

        let summary = collector(&site, tmp.path())
            .run(&seeds(), CollectOptions::default())
            .await
            .unwrap();

        assert_eq!(
            summary,
            CollectSummary {
                tournaments: 1,
                races: 2,
                downloaded: 2,
                skipped: 0,
            }
        );

        let store = HtmlStore::new(tmp.path());
        for key in [DAY1_KEY, DAY2_KEY] {
            assert!(store.is_complete(key));
            let odds = HtmlStore::read(&store.race_dir(key), PageKind::Odds).unwrap();
            assert!(odds.contains("単勝"));
        }
        assert_eq!(site.requests_for(&odds_url(&card(DAY2_KEY))), 1);
        assert_eq!(store.race_dirs().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_page_without_date_tabs_is_its_own_day() {
        let tmp = tempfile::tempdir().unwrap();
        let site = CannedSite::new();

        collector(&site, tmp.path())
            .run(&[SEED.to_string()], CollectOptions { dry_run: true, ..Default::default() })
            .await
            .unwrap();

        // once for the tabs, once as the day page
        assert_eq!(site.requests_for(RESULT_LIST), 2);
        // both day tabs were visited for race cards
        assert!(site.requests_for(RACE_INDEX_DAY2) >= 1);
    }

    #[tokio::test]
    async fn test_dry_run_downloads_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let site = CannedSite::new();

        let summary = collector(&site, tmp.path())
            .run(&seeds(), CollectOptions { dry_run: true, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(summary.races, 2);
        assert_eq!(summary.downloaded, 0);
        assert!(!tmp.path().join(DAY1_KEY).exists());
        assert_eq!(site.requests_for(&card(DAY1_KEY)), 0);
    }

    #[tokio::test]
    async fn test_skip_existing_keeps_complete_folders() {
        let tmp = tempfile::tempdir().unwrap();
        let site = CannedSite::new();

        let store = HtmlStore::new(tmp.path());
        for kind in PageKind::ALL {
            store.write(DAY1_KEY, kind, "<html>earlier</html>").unwrap();
        }

        let summary = collector(&site, tmp.path())
            .run(&seeds(), CollectOptions { skip_existing: true, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(site.requests_for(&card(DAY1_KEY)), 0);
        assert_eq!(
            HtmlStore::read(&store.race_dir(DAY1_KEY), PageKind::RaceCard).unwrap(),
            "<html>earlier</html>"
        );
        assert!(store.is_complete(DAY2_KEY));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let site = CannedSite::new();

        let store = HtmlStore::new(tmp.path());
        store.write(DAY1_KEY, PageKind::RaceCard, "<html>earlier</html>").unwrap();

        let summary = collector(&site, tmp.path())
            .run(&seeds(), CollectOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 2);
        let html = HtmlStore::read(&store.race_dir(DAY1_KEY), PageKind::RaceCard).unwrap();
        assert!(html.contains("ボートレーサー"));
    }

    #[tokio::test]
    async fn test_missing_page_aborts_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut site = CannedSite::new();
        site.pages.remove(&odds_url(&card(DAY2_KEY)));

        let err = collector(&site, tmp.path())
            .run(&seeds(), CollectOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("oddstf"));
        assert!(HtmlStore::new(tmp.path()).is_complete(DAY1_KEY));
    }

    fn card(q: &str) -> String {
        format!("https://www.boatrace.jp/owpc/pc/race/racelist?{}", q)
    }

    fn result(q: &str) -> String {
        format!("https://www.boatrace.jp/owpc/pc/race/raceresult?{}", q)
    }

    #[test]
    fn test_pair_races() {
        let cards = vec![card("rno=1&jcd=01&hd=20240101"), card("rno=2&jcd=01&hd=20240101")];
        let results = vec![result("rno=2&jcd=01&hd=20240101"), result("rno=1&jcd=01&hd=20240101")];

        let races = pair_races(&cards, &results);
        assert_eq!(races.len(), 2);

        assert_eq!(races[0].key.raw, "rno=1&jcd=01&hd=20240101");
        assert_eq!(races[0].race_card_url, cards[0]);
        assert_eq!(races[0].result_url, results[1]);
        assert_eq!(
            races[0].odds_url,
            "https://www.boatrace.jp/owpc/pc/race/oddstf?rno=1&jcd=01&hd=20240101"
        );
        assert_eq!(races[1].key.race_number, Some(2));
    }

    #[test]
    fn test_unmatched_links_are_dropped() {
        let cards = vec![card("rno=1&jcd=01&hd=20240101"), card("rno=3&jcd=01&hd=20240101")];
        let results = vec![result("rno=1&jcd=01&hd=20240101"), result("rno=2&jcd=01&hd=20240101")];

        let races = pair_races(&cards, &results);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].key.raw, "rno=1&jcd=01&hd=20240101");
    }

    #[test]
    fn test_duplicate_race_cards() {
        let cards = vec![card("rno=1&jcd=01&hd=20240101"), card("rno=1&jcd=01&hd=20240101")];
        let results = vec![result("rno=1&jcd=01&hd=20240101")];

        assert_eq!(pair_races(&cards, &results).len(), 1);
    }

    #[test]
    fn test_links_without_query() {
        let cards = vec!["https://www.boatrace.jp/owpc/pc/race/racelist".to_string()];
        let results = vec!["https://www.boatrace.jp/owpc/pc/race/raceresult".to_string()];

        assert!(pair_races(&cards, &results).is_empty());
    }
}
