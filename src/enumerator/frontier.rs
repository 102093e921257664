use std::collections::{HashSet, VecDeque};
use url::Url;

use super::links::extract_links;
use super::{PageInfo, Target, base_headers};
use crate::config::ScanConfig;
use crate::http::ProbeRequest;
use crate::models::ProbeResponse;

/// Breadth-first crawl frontier restricted to the start URL's host.
pub struct Frontier {
    start: Url,
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_depth: Option<usize>,
    max_pages: Option<usize>,
    pages_probed: usize,
    request_template: ProbeRequest,
}

impl Frontier {
    pub fn new(mut start: Url, config: &ScanConfig) -> Self {
        start.set_fragment(None);
        let seed = start.to_string();
        let mut request_template = ProbeRequest::get(seed.clone());
        request_template.headers = base_headers(config);

        Self {
            start,
            queue: VecDeque::from([seed.clone()]),
            queued: HashSet::from([seed]),
            visited: HashSet::new(),
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            pages_probed: 0,
            request_template,
        }
    }

    /// Path depth counted as the number of `/` in the URL's own path.
    pub fn depth_of(url: &str) -> usize {
        Url::parse(url)
            .map(|u| u.path().matches('/').count())
            .unwrap_or(0)
    }

    pub fn next_target(&mut self) -> Option<Target> {
        if self.quota_reached() {
            return None;
        }

        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);

            if self.visited.contains(&url) {
                continue;
            }

            if let Some(bound) = self.max_depth {
                if url != self.start.as_str() && Self::depth_of(&url) > bound {
                    tracing::debug!(%url, bound, "skipping URL beyond depth bound");
                    self.visited.insert(url);
                    continue;
                }
            }

            self.visited.insert(url.clone());
            self.pages_probed += 1;

            let mut request = self.request_template.clone();
            request.url = url.clone();
            return Some(Target {
                payload: url,
                request,
            });
        }

        None
    }

    /// Records the page behind a probed target and queues its same-host links.
    pub fn observe(&mut self, target: &Target, response: &ProbeResponse) -> PageInfo {
        if !response.is_success() {
            return PageInfo::default();
        }

        let Ok(base) = Url::parse(&target.request.url) else {
            return PageInfo::default();
        };

        let page = extract_links(&base, &response.body);
        let mut link_count = 0;

        for link in page.links {
            if link.host_str() != self.start.host_str() || link.port_or_known_default() != self.start.port_or_known_default() {
                continue;
            }
            let link = link.to_string();
            if self.visited.contains(&link) {
                continue;
            }
            link_count += 1;
            if self.queued.insert(link.clone()) {
                self.queue.push_back(link);
            }
        }

        PageInfo {
            title: page.title,
            link_count,
        }
    }

    pub fn quota_reached(&self) -> bool {
        self.max_pages.is_some_and(|max| self.pages_probed >= max)
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanKind;

    fn frontier(start: &str, depth: Option<usize>, pages: Option<usize>) -> Frontier {
        let mut config = ScanConfig::new(ScanKind::Crawler, start);
        config.max_depth = depth;
        config.max_pages = pages;
        Frontier::new(Url::parse(start).unwrap(), &config)
    }

    fn html(links: &[&str]) -> ProbeResponse {
        let anchors: String = links.iter().map(|l| format!("<a href=\"{}\">x</a>", l)).collect();
        ProbeResponse::new(200, format!("<html><body>{}</body></html>", anchors))
    }

    #[test]
    fn test_depth_counts_path_separators() {
        assert_eq!(Frontier::depth_of("http://example.test/"), 1);
        assert_eq!(Frontier::depth_of("http://example.test/a/b"), 2);
        assert_eq!(Frontier::depth_of("http://example.test/a/b/"), 3);
    }

    #[test]
    fn test_bfs_order_and_no_revisits() {
        let mut f = frontier("http://example.test/", None, None);

        let root = f.next_target().unwrap();
        assert_eq!(root.request.url, "http://example.test/");
        let info = f.observe(&root, &html(&["/a", "/b", "/", "http://elsewhere.test/c"]));
        assert_eq!(info.link_count, 2);

        let a = f.next_target().unwrap();
        assert_eq!(a.payload, "http://example.test/a");
        f.observe(&a, &html(&["/b", "/a", "/c"]));

        let b = f.next_target().unwrap();
        assert_eq!(b.payload, "http://example.test/b");
        let c = f.next_target().unwrap();
        assert_eq!(c.payload, "http://example.test/c");
        assert!(f.next_target().is_none());
        assert_eq!(f.visited().len(), 4);
    }

    #[test]
    fn test_links_only_followed_from_success() {
        let mut f = frontier("http://example.test/", None, None);
        let root = f.next_target().unwrap();
        let info = f.observe(&root, &ProbeResponse::new(404, "<a href=\"/a\">a</a>"));
        assert_eq!(info, PageInfo::default());
        assert!(f.next_target().is_none());
    }

    #[test]
    fn test_depth_bound_skips_deep_urls() {
        let mut f = frontier("http://example.test/", Some(1), None);
        let root = f.next_target().unwrap();
        f.observe(&root, &html(&["/shallow", "/deep/page"]));

        let next = f.next_target().unwrap();
        assert_eq!(next.payload, "http://example.test/shallow");
        assert!(f.next_target().is_none());
        assert!(f.visited().contains("http://example.test/deep/page"));
    }

    #[test]
    fn test_start_url_ignores_depth_bound() {
        let mut f = frontier("http://example.test/a/b/c", Some(1), None);
        assert!(f.next_target().is_some());
    }

    #[test]
    fn test_page_quota() {
        let mut f = frontier("http://example.test/", None, Some(2));
        let root = f.next_target().unwrap();
        f.observe(&root, &html(&["/a", "/b"]));
        assert!(f.next_target().is_some());
        assert!(f.quota_reached());
        assert!(f.next_target().is_none());
        assert_eq!(f.pending(), 1);
    }

    #[test]
    fn test_start_fragment_not_fetched_twice() {
        let mut f = frontier("http://example.test/#top", None, None);
        let root = f.next_target().unwrap();
        assert_eq!(root.request.url, "http://example.test/");

        let info = f.observe(&root, &html(&["/", "/#top", "/a"]));
        assert_eq!(info.link_count, 1);
        assert_eq!(f.next_target().unwrap().payload, "http://example.test/a");
        assert!(f.next_target().is_none());
    }
}
