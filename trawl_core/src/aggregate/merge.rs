//! Merge pipeline: username filter, blacklist, dedup and ranking.

use crate::link::Link;
use std::collections::HashSet;

/// URL fragments of pages that are never profiles (book search, result pages).
pub const LINKS_BLACKLIST: &[&str] = &["books.google.ru", "/search?q="];

/// Reduce raw links to the unique, ranked set.
///
/// With `filter_by_url`, links whose URL lacks the username are flagged in place, so
/// the flag is visible in the raw set as well. Blacklisted links are dropped from the
/// output only. Duplicates under scheme-insensitive equality keep their first
/// occurrence.
pub fn merge_links(links: &mut [Link], username: &str, filter_by_url: bool) -> Vec<Link> {
    let name = username.to_lowercase();

    if filter_by_url {
        for link in links.iter_mut() {
            if !link.url().contains(&name) {
                link.mark_filtered();
            }
        }
    }

    let mut seen: HashSet<Link> = HashSet::with_capacity(links.len());
    let mut unique: Vec<Link> = links
        .iter()
        .filter(|l| !is_blacklisted(l.url()))
        .filter(|l| seen.insert((*l).clone()))
        .cloned()
        .collect();

    rank_links(&mut unique);
    unique
}

/// Stable ascending sort by junk score.
pub fn rank_links(links: &mut [Link]) {
    links.sort_by_cached_key(Link::junk_score);
}

fn is_blacklisted(url: &str) -> bool {
    LINKS_BLACKLIST.iter().any(|b| url.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str) -> Link {
        Link::new(url, "title", "john", "test")
    }

    #[test]
    fn test_dedup_is_scheme_insensitive() {
        let mut links = vec![
            link("http://github.com/john"),
            link("https://github.com/john/"),
            link("https://GitHub.com/John?ref_src=twsrc"),
            link("https://gitlab.com/john"),
        ];
        let unique = merge_links(&mut links, "john", true);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].url(), "http://github.com/john");
    }

    #[test]
    fn test_blacklist_removes_from_unique_only() {
        let mut links = vec![
            link("https://books.google.ru/books?id=john"),
            link("https://example.com/search?q=john"),
            link("https://site.com/john"),
        ];
        let unique = merge_links(&mut links, "john", false);
        assert_eq!(links.len(), 3);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].url(), "https://site.com/john");
    }

    #[test]
    fn test_filter_flags_links_without_username() {
        let mut links = vec![link("https://site.com/about"), link("https://site.com/john")];
        let unique = merge_links(&mut links, "John", true);

        assert!(links[0].is_filtered());
        assert!(!links[1].is_filtered());
        assert_eq!(unique.len(), 2);
        assert!(unique.iter().any(|l| l.is_filtered()));
    }

    #[test]
    fn test_filter_disabled_flags_nothing() {
        let mut links = vec![link("https://site.com/about")];
        let unique = merge_links(&mut links, "john", false);
        assert!(!links[0].is_filtered());
        assert!(!unique[0].is_filtered());
    }

    #[test]
    fn test_ranking_is_monotonic() {
        let mut links = vec![
            link("https://blog.example.com/2020/05/interview-with-john"),
            link("https://site.com/user?name=john"),
            link("https://github.com/john"),
            link("https://john.dev"),
        ];
        let unique = merge_links(&mut links, "john", true);
        assert_eq!(unique.len(), 4);
        for pair in unique.windows(2) {
            assert!(pair[0].junk_score() <= pair[1].junk_score());
        }
        assert_eq!(unique[0].url(), "https://john.dev");
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_links(&mut [], "john", true).is_empty());
    }
}
