use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// What the crawler keeps from a fetched HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub title: Option<String>,
    pub links: Vec<Url>,
}

/// Collects absolute http(s) anchors from `body`, resolved against `base`,
/// with fragments removed and duplicates dropped in document order.
pub fn extract_links(base: &Url, body: &str) -> PageLinks {
    let document = Html::parse_document(body);

    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(anchor) = Selector::parse("a[href]") {
        for element in document.select(&anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(mut url) = base.join(href.trim()) else {
                continue;
            };
            if !matches!(url.scheme(), "http" | "https") {
                continue;
            }
            url.set_fragment(None);
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    }

    PageLinks { title, links }
}
