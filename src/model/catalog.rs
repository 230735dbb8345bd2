//! Discovery, deduplication and ordering of switchable tabs.
//!
//! No single host enumeration mechanism can be trusted to be complete, so the
//! catalog asks all of them and merges the answers by view identity. Nothing is
//! cached: every call reflects the host as it is right now.

use std::cmp::Ordering;

use tracing::{debug, instrument, trace};

use crate::common::collections::{HashMap, HashSet};
use crate::model::classify::{
    ClassifyContext, DOCUMENT_VIEW_TYPES, QUERIED_WEB_VIEW_TYPES, classify,
};
use crate::model::tab::{TabDescriptor, TabKind};
use crate::sys::host::{Host, TabHeader, ViewHandle};

pub struct TabCatalog<'a, H: ?Sized> {
    host: &'a H,
}

impl<'a, H: Host + ?Sized> TabCatalog<'a, H> {
    pub fn new(host: &'a H) -> Self { Self { host } }

    /// Switchable tabs, deduplicated and ordered most-relevant first.
    #[instrument(name = "catalog::list_switchable_tabs", skip(self))]
    pub fn list_switchable_tabs(&self, exclude_active: bool) -> Vec<TabDescriptor> {
        let active = self.host.active_view();
        let candidates: Vec<ViewHandle> = self
            .candidates()
            .into_iter()
            .filter(|handle| !(exclude_active && active == Some(*handle)))
            .collect();

        let tabs: Vec<TabDescriptor> = self
            .classify_all(&candidates)
            .into_iter()
            .filter(|tab| tab.kind.is_switchable())
            .collect();

        let mut tabs = dedup(tabs);
        let recent = self.host.recent_files().unwrap_or_default();
        apply_recency(&mut tabs, &recent);
        order(&mut tabs);
        debug!(count = tabs.len(), "listed switchable tabs");
        tabs
    }

    /// Every view the host reports, classified, including the ones that are
    /// never offered for switching.
    pub fn discover(&self) -> Vec<TabDescriptor> {
        let mut tabs = self.classify_all(&self.candidates());
        let recent = self.host.recent_files().unwrap_or_default();
        apply_recency(&mut tabs, &recent);
        tabs
    }

    /// Handles from every enumeration mechanism, first-seen order, no repeats.
    pub fn candidates(&self) -> Vec<ViewHandle> {
        let typed: Vec<ViewHandle> = DOCUMENT_VIEW_TYPES
            .iter()
            .chain(QUERIED_WEB_VIEW_TYPES)
            .flat_map(|view_type| self.host.views_of_type(view_type))
            .collect();

        let mut walked = self.host.walk_views();
        if walked.is_empty() {
            trace!("primary walk found nothing; using the secondary walk");
            walked = self.host.walk_all_views().unwrap_or_default();
        }

        let from_headers = self.resolve_headers(&self.host.tab_headers());
        merge_candidates([typed, from_headers, walked])
    }

    /// Ties rendered tab headers back to views. Headers the host could not
    /// resolve are matched by title against every view it knows about.
    fn resolve_headers(&self, headers: &[TabHeader]) -> Vec<ViewHandle> {
        let everything = match self.host.walk_all_views() {
            Some(all) => all,
            None => self.host.walk_views(),
        };
        headers
            .iter()
            .filter_map(|header| {
                let resolved = header.owner.or_else(|| {
                    everything.iter().copied().find(|handle| {
                        self.host
                            .view(*handle)
                            .and_then(|view| view.display_text().ok().flatten())
                            .is_some_and(|text| text == header.title)
                    })
                });
                if resolved.is_none() {
                    trace!(title = %header.title, "no view found for tab header");
                }
                resolved
            })
            .filter(|handle| self.host.is_open(*handle))
            .collect()
    }

    fn classify_all(&self, handles: &[ViewHandle]) -> Vec<TabDescriptor> {
        let active = self.host.active_view();
        let active_file = self.host.active_file();
        let ctx = ClassifyContext { active, active_file: active_file.as_ref() };
        handles
            .iter()
            .filter_map(|handle| {
                let Some(view) = self.host.view(*handle) else {
                    trace!(?handle, "view vanished before classification");
                    return None;
                };
                match classify(*handle, view, &ctx) {
                    Ok(tab) => Some(tab),
                    Err(err) => {
                        debug!(?handle, %err, "skipping view that could not be classified");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Concatenates candidate lists in order, keeping the first sighting of each view.
pub fn merge_candidates<I>(sources: I) -> Vec<ViewHandle>
where
    I: IntoIterator<Item = Vec<ViewHandle>>,
{
    let mut seen: HashSet<ViewHandle> = HashSet::default();
    sources.into_iter().flatten().filter(|handle| seen.insert(*handle)).collect()
}

/// Drops repeated views, then settles title collisions in favour of the more
/// useful kind. A replacement takes over the position of the entry it beats.
pub fn dedup(tabs: Vec<TabDescriptor>) -> Vec<TabDescriptor> {
    let mut seen_handles = HashSet::default();
    let mut by_title: HashMap<String, usize> = HashMap::default();
    let mut unique: Vec<TabDescriptor> = Vec::with_capacity(tabs.len());

    for tab in tabs {
        if !seen_handles.insert(tab.handle) {
            trace!(title = %tab.title, "dropping repeated view");
            continue;
        }
        match by_title.get(&tab.title).copied() {
            Some(idx) => {
                if tab.kind.preference() > unique[idx].kind.preference() {
                    trace!(title = %tab.title, kind = ?tab.kind, "replacing same-titled tab");
                    unique[idx] = tab;
                } else {
                    trace!(title = %tab.title, "keeping first same-titled tab");
                }
            }
            None => {
                by_title.insert(tab.title.clone(), unique.len());
                unique.push(tab);
            }
        }
    }
    unique
}

pub fn apply_recency(tabs: &mut [TabDescriptor], recent: &[String]) {
    for tab in tabs {
        tab.recency_rank = recent.iter().position(|path| *path == tab.locator);
    }
}

/// Recently used first, then newest files, then titles.
///
/// The comparison is not transitive once files and web resources mix outside
/// the recency list, so this uses an insertion sort, which is stable and
/// tolerates any comparator. Catalogs are small.
pub fn order(tabs: &mut [TabDescriptor]) {
    for i in 1..tabs.len() {
        let mut j = i;
        while j > 0 && compare(&tabs[j - 1], &tabs[j]) == Ordering::Greater {
            tabs.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn compare(a: &TabDescriptor, b: &TabDescriptor) -> Ordering {
    match (a.recency_rank, b.recency_rank) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            if a.kind == TabKind::File && b.kind == TabKind::File {
                b.modified_at.unwrap_or(0).cmp(&a.modified_at.unwrap_or(0))
            } else {
                locale_cmp(&a.title, &b.title)
            }
        }
    }
}

/// Case-insensitive first, lowercase before uppercase on ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::host::FileInfo;
    use crate::sys::memory_host::{MemoryHost, MemoryView};

    fn titles(tabs: &[TabDescriptor]) -> Vec<&str> { tabs.iter().map(|t| t.title.as_str()).collect() }

    fn locators(tabs: &[TabDescriptor]) -> Vec<&str> {
        tabs.iter().map(|t| t.locator.as_str()).collect()
    }

    #[test]
    fn each_view_appears_once_across_sources() {
        let mut host = MemoryHost::new();
        let a = host.add_view(MemoryView::file("a", "a.md"));
        let b = host.add_view(MemoryView::file("b", "b.md"));
        host.add_header("a", Some(a));
        host.add_header("b", None);

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        let handles: Vec<ViewHandle> = tabs.iter().map(|t| t.handle).collect();
        assert_eq!(handles.len(), 2);
        assert!(handles.contains(&a));
        assert!(handles.contains(&b));
    }

    #[test]
    fn dedup_drops_repeated_handles() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("a", "a.md"));
        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        let doubled = vec![tabs[0].clone(), tabs[0].clone(), tabs[0].clone()];
        assert_eq!(dedup(doubled).len(), 1);
    }

    #[test]
    fn file_wins_title_collision_with_web() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::web("w", "https://notes.example/plan", "plan"));
        host.add_view(MemoryView::file("f", "plan.md"));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].kind, TabKind::File);
        assert_eq!(tabs[0].locator, "plan.md");
    }

    #[test]
    fn replacement_keeps_original_position() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::web("w", "https://x", "x"));
        host.add_view(MemoryView::web("y", "https://y", "y"));
        host.add_view(MemoryView::file("f", "x.md"));

        let mut tabs = TabCatalog::new(&host).discover();
        // Put the web tabs ahead of the file so the file has to take over.
        tabs.rotate_left(1);
        assert_eq!(tabs[2].kind, TabKind::File);

        let tabs = dedup(tabs);
        assert_eq!(titles(&tabs), vec!["x", "y"]);
        assert_eq!(tabs[0].kind, TabKind::File);
        assert_eq!(tabs[0].locator, "x.md");
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("a", "a.md"));
        host.add_view(MemoryView::web("w", "https://a", "a"));
        host.add_view(MemoryView::web("b", "https://b", "b"));
        let once = dedup(TabCatalog::new(&host).discover());
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn web_beats_other_and_equal_kinds_keep_first() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::other("o", "graph").titled("Same"));
        host.add_view(MemoryView::web("w1", "https://one", "Same"));
        host.add_view(MemoryView::web("w2", "https://two", "Same"));

        let tabs = dedup(TabCatalog::new(&host).discover());
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].locator, "https://one");
    }

    #[test]
    fn recency_then_modification_time() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("p1", "p1.md").modified(100));
        host.add_view(MemoryView::file("p2", "p2.md").modified(50));
        host.add_view(MemoryView::file("p3", "p3.md").modified(900));
        host.set_recent_files(Some(vec!["p2.md".into(), "p1.md".into()]));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(locators(&tabs), vec!["p2.md", "p1.md", "p3.md"]);
        assert_eq!(tabs[0].recency_rank, Some(0));
        assert_eq!(tabs[2].recency_rank, None);
    }

    #[test]
    fn untracked_files_sort_newest_first_missing_time_last() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("old", "old.md").modified(10));
        host.add_view(MemoryView::file("none", "none.md"));
        host.add_view(MemoryView::file("new", "new.md").modified(20));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(titles(&tabs), vec!["new", "old", "none"]);
    }

    #[test]
    fn web_tabs_sort_by_title() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::web("b", "https://b", "beta"));
        host.add_view(MemoryView::web("a", "https://a", "Alpha"));
        host.add_view(MemoryView::web("c", "https://c", "alpha"));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(titles(&tabs), vec!["alpha", "Alpha", "beta"]);
    }

    #[test]
    fn active_view_is_excluded_on_request() {
        let mut host = MemoryHost::new();
        let a = host.add_view(MemoryView::file("a", "a.md"));
        host.add_view(MemoryView::file("b", "b.md"));
        host.set_active(Some(a));

        let without = TabCatalog::new(&host).list_switchable_tabs(true);
        assert!(without.iter().all(|t| t.handle != a));
        assert_eq!(without.len(), 1);

        let with = TabCatalog::new(&host).list_switchable_tabs(false);
        assert!(with.iter().any(|t| t.handle == a));
    }

    #[test]
    fn other_views_are_discovered_but_not_switchable() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("a", "a.md"));
        host.add_view(MemoryView::other("g", "graph"));

        let catalog = TabCatalog::new(&host);
        assert_eq!(catalog.discover().len(), 2);
        assert_eq!(catalog.list_switchable_tabs(false).len(), 1);
    }

    #[test]
    fn broken_views_are_skipped() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("a", "a.md").failing("file"));
        host.add_view(MemoryView::file("b", "b.md"));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(titles(&tabs), vec!["b"]);
    }

    #[test]
    fn secondary_walk_covers_empty_primary_walk() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::other("r", "reader").titled("Reader"));
        let mut reader = MemoryView::other("w", "reader").titled("Docs");
        reader.src = Some("https://docs.example".into());
        host.add_view(reader);
        host.set_primary_walk(false);

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(locators(&tabs), vec!["https://docs.example"]);
    }

    #[test]
    fn headers_resolve_views_missing_from_walks() {
        let mut host = MemoryHost::new();
        let hidden = MemoryView::web("h", "https://hidden", "Hidden")
            .with_type("hover-reader")
            .outside_tree();
        let hidden = host.add_view(hidden);
        host.add_view(MemoryView::file("n", "n.md"));
        host.add_header("Hidden", None);
        host.add_header("Nobody", None);

        let catalog = TabCatalog::new(&host);
        assert_eq!(catalog.resolve_headers(&host.tab_headers()), vec![hidden]);
        assert_eq!(catalog.list_switchable_tabs(false).len(), 2);
    }

    #[test]
    fn active_markdown_view_borrows_the_active_file() {
        let mut host = MemoryHost::new();
        let today = host.add_view(MemoryView::other("t", "markdown"));
        host.set_active(Some(today));
        host.set_active_file(Some(FileInfo::new("daily/today.md").modified(7)));

        let tabs = TabCatalog::new(&host).list_switchable_tabs(false);
        assert_eq!(locators(&tabs), vec!["daily/today.md"]);
        assert_eq!(tabs[0].kind, TabKind::File);
        assert_eq!(tabs[0].modified_at, Some(7));

        assert!(TabCatalog::new(&host).list_switchable_tabs(true).is_empty());
    }

    #[test]
    fn empty_host_yields_empty_catalog() {
        let host = MemoryHost::new();
        assert!(TabCatalog::new(&host).list_switchable_tabs(true).is_empty());
    }

    #[test]
    fn merge_keeps_first_sighting_order() {
        let mut host = MemoryHost::new();
        let a = host.add_view(MemoryView::file("a", "a.md"));
        let b = host.add_view(MemoryView::file("b", "b.md"));
        let c = host.add_view(MemoryView::file("c", "c.md"));
        let merged = merge_candidates([vec![b, a], vec![a, c, b]]);
        assert_eq!(merged, vec![b, a, c]);
    }

    #[test]
    fn order_tolerates_mixed_kinds() {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("z", "z.md").modified(10));
        host.add_view(MemoryView::file("a", "a.md").modified(5));
        host.add_view(MemoryView::web("m", "https://m", "m"));
        let mut tabs = TabCatalog::new(&host).discover();
        order(&mut tabs);
        assert_eq!(tabs.len(), 3);
    }

    #[test]
    fn demo_workspace() {
        let fixture = ron::from_str(include_str!("../../demos/workspace.ron")).unwrap();
        let host = MemoryHost::from_fixture(fixture).unwrap();

        let tabs = TabCatalog::new(&host).list_switchable_tabs(true);
        assert_eq!(
            titles(&tabs),
            vec!["plan", "2024-01-01", "Article", "HashMap in std::collections", "raft"]
        );
        assert_eq!(tabs[2].locator, "https://example.com/article");
        assert_eq!(TabCatalog::new(&host).discover().len(), 7);
    }

    #[test]
    fn locale_comparison_folds_case() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }
}
