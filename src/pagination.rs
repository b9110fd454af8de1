//! Page/limit windowing over a matched record set.
//!
//! The window applies after match/sort and before any enrichment lookup,
//! so only the requested page of records is ever enriched.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Raw `?page=&limit=` query parameters, kept as strings so junk input
/// degrades to defaults instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> u32 {
    match raw.map(str::trim) {
        None | Some("") => default,
        // Fractional or non-numeric values fall back to the default.
        Some(s) => match s.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => default,
        },
    }
}

impl PageRequest {
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page, DEFAULT_PAGE),
            limit: parse_positive(limit, DEFAULT_LIMIT),
        }
    }

    pub fn from_params(params: &PageParams) -> Self {
        Self::from_raw(params.page.as_deref(), params.limit.as_deref())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the totals computed over the whole match set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn assemble(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        let total_pages = total_items.div_ceil(u64::from(request.limit));
        Self {
            items,
            total_items,
            total_pages,
            current_page: request.page,
            has_next_page: u64::from(request.page) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let req = PageRequest::from_raw(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
    }

    #[test]
    fn junk_input_degrades_to_defaults() {
        for bad in ["0", "-3", "2.5", "ten", "", "  "] {
            let req = PageRequest::from_raw(Some(bad), Some(bad));
            assert_eq!(req, PageRequest::default(), "input {:?}", bad);
        }
    }

    #[test]
    fn parses_valid_numbers() {
        let req = PageRequest::from_raw(Some("3"), Some(" 25 "));
        assert_eq!(req.page, 3);
        assert_eq!(req.limit, 25);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn totals_are_ceiling_of_count_over_limit() {
        let req = PageRequest::from_raw(Some("2"), Some("10"));
        let page = Page::assemble(vec![(); 10], 21, req);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);

        let last = Page::assemble(vec![(); 1], 21, PageRequest::from_raw(Some("3"), Some("10")));
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn empty_match_set_has_zero_pages() {
        let page: Page<()> = Page::assemble(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }
}
