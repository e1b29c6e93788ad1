//! HTML scrape with a prioritized CSS-selector list. Grounded on
//! `examples/original_source/engines/musictoscrape.py`'s XPath selector
//! chain and the backend's `web_scraper.rs` (`SiteSelectors` per-site
//! table), translated to `scraper`'s CSS-selector API since this crate
//! has no XPath engine in its stack. Tries selectors in order, breaks on
//! the first one that actually matches anything, and falls back to a
//! generic container selector if none of the specific ones do.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

const SEARCH_URL: &str = "https://musictoscrape.example/search";
const MAX_RESULTS: usize = 20;

const CANDIDATE_SELECTORS: &[&str] = &[
    "div.track-item",
    "#results div[class]",
    "main article, main div[class]",
];

pub struct MusicToScrapeEngine {
    descriptor: EngineDescriptor,
}

impl MusicToScrapeEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }
}

fn text_of(el: ElementRef, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    el.select(&sel).next().map(|n| n.text().collect::<String>().trim().to_string())
}

fn attr_of(el: ElementRef, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    el.select(&sel).next().and_then(|n| n.value().attr(attr)).map(str::to_string)
}

fn parse_items(html: &str) -> Vec<RawResult> {
    let document = Html::parse_document(html);
    for candidate in CANDIDATE_SELECTORS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let items: Vec<_> = document.select(&selector).take(MAX_RESULTS).collect();
        if items.is_empty() {
            continue;
        }
        return items
            .into_iter()
            .filter_map(|item| {
                let title = text_of(item, ".title, h2, h3")?;
                let url = attr_of(item, "a", "href")?;
                Some(RawResult {
                    title,
                    url,
                    artist: text_of(item, ".artist"),
                    album: text_of(item, ".album"),
                    duration: text_of(item, ".duration"),
                    ..Default::default()
                })
            })
            .collect();
    }
    Vec::new()
}

#[async_trait]
impl MusicEngine for MusicToScrapeEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let url = format!("{SEARCH_URL}?q={}", urlencoding::encode(query));
        let response = client.get(&url).send().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        match check_status(response.status(), &self.descriptor.id)? {
            StatusOutcome::Proceed => {}
            StatusOutcome::EmptyResults => return Ok(Vec::new()),
        }

        let html = response.text().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        let mut items = parse_items(&html);
        for item in &mut items {
            item.engine = self.descriptor.id.clone();
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_generic_container_when_specific_selector_absent() {
        let html = r#"
            <html><body>
              <div id="results">
                <div class="item">
                  <h2 class="title">Around the World</h2>
                  <a class="artist" href="/track/1">Daft Punk</a>
                </div>
              </div>
            </body></html>
        "#;
        let items = parse_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Around the World");
    }
}
