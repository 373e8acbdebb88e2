use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use super::{ProviderError, ProviderPage, SearchProvider, check_status, request_error};
use crate::config::ProviderConfig;
use crate::models::{ContinuationToken, EnrichedResult, Platform};

/// Boards stop paging well before this; it guards against a site that keeps echoing page 1.
const MAX_PAGES: u32 = 50;

/// HTML sites searched by scraping their listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSite {
    Theqoo,
    Instiz,
    Kpopping,
}

impl BoardSite {
    pub const ALL: [Self; 3] = [Self::Theqoo, Self::Instiz, Self::Kpopping];

    #[must_use]
    pub const fn platform(self) -> Platform {
        match self {
            Self::Theqoo => Platform::Theqoo,
            Self::Instiz => Platform::Instiz,
            Self::Kpopping => Platform::Kpopping,
        }
    }

    const fn default_base(self) -> &'static str {
        match self {
            Self::Theqoo => "https://theqoo.net",
            Self::Instiz => "https://www.instiz.net",
            Self::Kpopping => "https://kpopping.com",
        }
    }

    const fn page_size(self) -> u32 {
        match self {
            Self::Theqoo | Self::Instiz => 20,
            Self::Kpopping => 24,
        }
    }

    fn search_url(self, base: &str, query: &str, page: u32) -> Result<Url, url::ParseError> {
        let page = page.to_string();
        match self {
            Self::Theqoo => {
                let mut url = Url::parse(&format!("{base}/kpop"))?;
                url.query_pairs_mut()
                    .append_pair("filter_mode", "normal")
                    .append_pair("search_target", "title_content")
                    .append_pair("search_keyword", query)
                    .append_pair("page", &page);
                Ok(url)
            }
            Self::Instiz => {
                let mut url = Url::parse(&format!("{base}/name"))?;
                url.query_pairs_mut()
                    .append_pair("k", query)
                    .append_pair("stype", "9")
                    .append_pair("page", &page);
                Ok(url)
            }
            Self::Kpopping => {
                let mut url = Url::parse(&format!("{base}/kpics/search"))?;
                url.query_pairs_mut()
                    .append_pair("keyword", query)
                    .append_pair("page", &page);
                Ok(url)
            }
        }
    }

    fn row_regex(self) -> Option<&'static Regex> {
        let re = BoardRegex::get()?;
        Some(match self {
            Self::Theqoo => &re.theqoo_row,
            Self::Instiz => &re.instiz_row,
            Self::Kpopping => &re.kpopping_row,
        })
    }
}

struct BoardRegex {
    theqoo_row: Regex,
    instiz_row: Regex,
    kpopping_row: Regex,
    tags: Regex,
}

impl BoardRegex {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<BoardRegex>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    theqoo_row: Regex::new(
                        r#"(?s)<td class="title">\s*<a href="(?P<href>/kpop/\d+)[^"]*"[^>]*>(?P<title>.*?)</a>"#,
                    )
                    .ok()?,
                    instiz_row: Regex::new(
                        r#"(?s)<td class="listsubject">\s*<a href="(?P<href>[^"]+)"[^>]*>(?P<title>.*?)</a>"#,
                    )
                    .ok()?,
                    kpopping_row: Regex::new(
                        r#"(?s)<a href="(?P<href>/kpics/[^"]+)"[^>]*>\s*<img[^>]*src="(?P<thumb>[^"]+)"[^>]*alt="(?P<title>[^"]*)""#,
                    )
                    .ok()?,
                    tags: Regex::new(r"<[^>]*>").ok()?,
                })
            })
            .as_ref()
    }
}

fn clean_text(raw: &str) -> String {
    let stripped = BoardRegex::get()
        .map_or_else(|| raw.to_string(), |re| re.tags.replace_all(raw, "").to_string());
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts listing rows from a board search page.
#[must_use]
pub fn parse_listing(site: BoardSite, base: &str, html: &str) -> Vec<EnrichedResult> {
    let Some(row) = site.row_regex() else {
        return Vec::new();
    };
    let Ok(base_url) = Url::parse(base) else {
        return Vec::new();
    };

    let mut seen = std::collections::HashSet::new();
    row.captures_iter(html)
        .filter_map(|caps| {
            let href = caps.name("href")?.as_str();
            let url = base_url.join(href).ok()?.to_string();
            if !seen.insert(url.clone()) {
                return None;
            }

            let title = caps
                .name("title")
                .map(|m| clean_text(m.as_str()))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| url.clone());
            let thumbnail = caps
                .name("thumb")
                .and_then(|m| base_url.join(m.as_str()).ok())
                .map(|u| u.to_string());

            Some(EnrichedResult::new(site.platform(), url, title).with_thumbnail(thumbnail))
        })
        .collect()
}

#[derive(Clone)]
pub struct BoardClient {
    client: Client,
    site: BoardSite,
    config: ProviderConfig,
}

impl BoardClient {
    #[must_use]
    pub const fn new(client: Client, site: BoardSite, config: ProviderConfig) -> Self {
        Self {
            client,
            site,
            config,
        }
    }

    fn base(&self) -> &str {
        self.config.base_url_or(self.site.default_base())
    }
}

#[async_trait]
impl SearchProvider for BoardClient {
    fn platform(&self) -> Platform {
        self.site.platform()
    }

    /// Public pages, so only the enable flag matters.
    fn is_configured(&self) -> bool {
        self.config.enabled
    }

    fn max_page_size(&self) -> u32 {
        self.site.page_size()
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn request_page(
        &self,
        query: &str,
        continuation: Option<&ContinuationToken>,
        _page_size: u32,
    ) -> Result<ProviderPage, ProviderError> {
        let platform = self.platform();
        let page = continuation
            .and_then(ContinuationToken::as_number)
            .unwrap_or(1)
            .max(1);

        let url = self
            .site
            .search_url(self.base(), query, page)
            .map_err(|e| ProviderError::permanent(platform, e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(platform, &e))?;
        let response = check_status(platform, response).await?;
        let html = response
            .text()
            .await
            .map_err(|e| request_error(platform, &e))?;

        let items = parse_listing(self.site, self.base(), &html);
        let has_more = !items.is_empty() && page < MAX_PAGES;

        Ok(ProviderPage {
            items,
            next: has_more.then_some(ContinuationToken::Page(page + 1)),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_theqoo_listing() {
        let html = r#"
            <tr><td class="title">
                <a href="/kpop/3112345678?filter_mode=normal">아이브 &amp; 직캠 <span class="new">N</span></a>
            </td></tr>
            <tr><td class="title"><a href="/kpop/3112345679">에스파 무대</a></td></tr>
        "#;

        let items = parse_listing(BoardSite::Theqoo, "https://theqoo.net", html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://theqoo.net/kpop/3112345678");
        assert_eq!(items[0].title, "아이브 & 직캠 N");
        assert_eq!(items[0].platform, Platform::Theqoo);
        assert!(items[0].author.is_none());
    }

    #[test]
    fn test_parse_kpopping_listing_with_thumbnails() {
        let html = r#"
            <a href="/kpics/240501-ive-wonyoung" class="cell">
                <img class="lazy" src="/documents/ab/wonyoung.jpeg" alt="240501 IVE Wonyoung">
            </a>
            <a href="/kpics/240501-ive-wonyoung" class="cell">
                <img src="/documents/ab/dupe.jpeg" alt="duplicate">
            </a>
        "#;

        let items = parse_listing(BoardSite::Kpopping, "https://kpopping.com", html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "240501 IVE Wonyoung");
        assert_eq!(
            items[0].thumbnail.as_deref(),
            Some("https://kpopping.com/documents/ab/wonyoung.jpeg")
        );
    }

    #[test]
    fn test_empty_page_has_no_rows() {
        assert!(parse_listing(BoardSite::Instiz, "https://www.instiz.net", "<html></html>").is_empty());
    }

    #[test]
    fn test_search_url_pages() {
        let url = BoardSite::Theqoo
            .search_url("https://theqoo.net", "아이브", 3)
            .unwrap();
        assert!(url.as_str().starts_with("https://theqoo.net/kpop?"));
        assert!(url.as_str().contains("page=3"));
    }

    #[test]
    fn test_boards_need_no_credential() {
        let client = BoardClient::new(Client::new(), BoardSite::Instiz, ProviderConfig::default());
        assert!(client.is_configured());

        let disabled = ProviderConfig {
            enabled: false,
            ..Default::default()
        };
        let client = BoardClient::new(Client::new(), BoardSite::Instiz, disabled);
        assert!(!client.is_configured());
    }
}
