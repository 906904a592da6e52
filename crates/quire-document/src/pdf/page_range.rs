// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page range resolver: turns a page selection into ordered groups of
// validated 1-based page numbers, one group per output document.
//
// Out-of-bounds input is dropped, never clamped into range.

use quire_core::error::{QuireError, Result};
use quire_core::{PageRange, SplitMode};
use tracing::debug;

/// The pages that make up one output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    /// 1-based page numbers in output order.
    pub pages: Vec<u32>,
    pub title: String,
}

impl PageGroup {
    fn single(page: u32) -> Self {
        Self {
            pages: vec![page],
            title: format!("Page {page}"),
        }
    }

    fn range(range: PageRange) -> Self {
        let title = if range.from == range.to {
            format!("Page {}", range.from)
        } else {
            format!("Pages {}-{}", range.from, range.to)
        };
        Self {
            pages: range.pages().collect(),
            title,
        }
    }
}

/// Resolve any split mode against a document of `page_count` pages.
pub fn resolve(mode: &SplitMode, page_count: u32) -> Result<Vec<PageGroup>> {
    match mode {
        SplitMode::Pages(pages) => resolve_pages(pages, page_count),
        SplitMode::Ranges(ranges) => resolve_ranges(ranges, page_count),
        SplitMode::EqualParts(parts) => resolve_equal_parts(*parts, page_count),
        SplitMode::EveryPage => {
            if page_count == 0 {
                return Err(QuireError::NoValidPages { page_count });
            }
            Ok((1..=page_count).map(PageGroup::single).collect())
        }
    }
}

/// Explicit page list: filter to `1..=page_count`, sort ascending, dedup.
/// One group per surviving page.
pub fn resolve_pages(pages: &[u32], page_count: u32) -> Result<Vec<PageGroup>> {
    if pages.is_empty() {
        return Err(QuireError::NoPagesSelected);
    }

    let mut valid: Vec<u32> = pages
        .iter()
        .copied()
        .filter(|&p| p >= 1 && p <= page_count)
        .collect();
    valid.sort_unstable();
    valid.dedup();

    if valid.is_empty() {
        return Err(QuireError::NoValidPages { page_count });
    }

    debug!(requested = pages.len(), valid = valid.len(), "explicit pages resolved");
    Ok(valid.into_iter().map(PageGroup::single).collect())
}

/// Range list: each range kept only if it lies inside the document.
/// Output order follows input order.
pub fn resolve_ranges(ranges: &[PageRange], page_count: u32) -> Result<Vec<PageGroup>> {
    if ranges.is_empty() {
        return Err(QuireError::NoPagesSelected);
    }

    let groups: Vec<PageGroup> = ranges
        .iter()
        .filter(|r| r.is_valid_for(page_count))
        .map(|r| PageGroup::range(*r))
        .collect();

    if groups.is_empty() {
        return Err(QuireError::NoValidPages { page_count });
    }

    debug!(requested = ranges.len(), valid = groups.len(), "page ranges resolved");
    Ok(groups)
}

/// Equal parts: `ceil(page_count / k)` pages per part, contiguous, the last
/// part possibly shorter. `k` is reduced to `page_count` when larger.
pub fn resolve_equal_parts(parts: u32, page_count: u32) -> Result<Vec<PageGroup>> {
    if parts == 0 {
        return Err(QuireError::NoPagesSelected);
    }
    if page_count == 0 {
        return Err(QuireError::NoValidPages { page_count });
    }

    let parts = parts.min(page_count);
    let per_part = page_count.div_ceil(parts);

    let mut groups = Vec::with_capacity(parts as usize);
    let mut start = 1;
    while start <= page_count && (groups.len() as u32) < parts {
        let end = (start + per_part - 1).min(page_count);
        let index = groups.len() + 1;
        groups.push(PageGroup {
            pages: (start..=end).collect(),
            title: format!("Part {index} (Pages {start}-{end})"),
        });
        start = end + 1;
    }

    debug!(parts, per_part, produced = groups.len(), "equal parts resolved");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_pages_sorted_and_deduplicated() {
        let groups = resolve_pages(&[4, 2, 4, 9, 0], 5).unwrap();
        let pages: Vec<u32> = groups.iter().map(|g| g.pages[0]).collect();
        assert_eq!(pages, vec![2, 4]);
        assert_eq!(groups[0].title, "Page 2");
        assert_eq!(groups[1].title, "Page 4");
    }

    #[test]
    fn explicit_pages_all_out_of_range() {
        let err = resolve_pages(&[6, 7], 5).unwrap_err();
        assert!(matches!(err, QuireError::NoValidPages { page_count: 5 }));
    }

    #[test]
    fn empty_selection() {
        assert!(matches!(resolve_pages(&[], 5), Err(QuireError::NoPagesSelected)));
        assert!(matches!(resolve_ranges(&[], 5), Err(QuireError::NoPagesSelected)));
        assert!(matches!(resolve_equal_parts(0, 5), Err(QuireError::NoPagesSelected)));
    }

    #[test]
    fn invalid_ranges_are_dropped_not_clamped() {
        let ranges = [
            PageRange::new(0, 2), // from < 1
            PageRange::new(3, 2), // from > to
            PageRange::new(2, 9), // to > page_count
            PageRange::new(2, 3),
        ];
        let groups = resolve_ranges(&ranges, 5).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pages, vec![2, 3]);
        assert_eq!(groups[0].title, "Pages 2-3");
    }

    #[test]
    fn range_beyond_document_rejected() {
        let err = resolve_ranges(&[PageRange::new(2, 5)], 3).unwrap_err();
        assert!(matches!(err, QuireError::NoValidPages { page_count: 3 }));
    }

    #[test]
    fn single_page_range_title() {
        let groups = resolve_ranges(&[PageRange::new(3, 3)], 3).unwrap();
        assert_eq!(groups[0].title, "Page 3");
    }

    #[test]
    fn equal_parts_cover_every_page_in_order() {
        for page_count in 1..=23u32 {
            for parts in 1..=page_count {
                let groups = resolve_equal_parts(parts, page_count).unwrap();
                assert!(groups.len() as u32 <= parts);
                assert!(groups.iter().all(|g| !g.pages.is_empty()));
                let flattened: Vec<u32> = groups.iter().flat_map(|g| g.pages.clone()).collect();
                assert_eq!(flattened, (1..=page_count).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn equal_parts_titles_and_short_last_part() {
        let groups = resolve_equal_parts(4, 10).unwrap();
        let sizes: Vec<usize> = groups.iter().map(|g| g.pages.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(groups[0].title, "Part 1 (Pages 1-3)");
        assert_eq!(groups[3].title, "Part 4 (Pages 10-10)");
    }

    #[test]
    fn too_many_parts_reduced_to_page_count() {
        let groups = resolve_equal_parts(10, 3).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.pages.len() == 1));
    }

    #[test]
    fn every_page_mode() {
        let groups = resolve(&SplitMode::EveryPage, 3).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].title, "Page 3");
    }
}
