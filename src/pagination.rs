//! Pagination helpers shared by every listing operation

use serde::{Deserialize, Serialize};

use crate::error::{DailyMedError, Result};

/// Largest page size accepted from callers
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 200;
/// Largest page size the DailyMed API serves
pub const UPSTREAM_MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total_results: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_results.div_ceil(u64::from(page_size))
        };
        Self {
            page,
            page_size,
            total_results,
            total_pages,
            has_next_page: u64::from(page) < total_pages,
            has_previous_page: page > 1,
        }
    }

    /// Pagination block for an empty result set
    pub fn empty(page_size: u32) -> Self {
        Self::new(1, page_size, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn empty(page_size: u32) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::empty(page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Slice a fully collected result set down to one page
pub fn paginate_results<T>(items: Vec<T>, page: u32, page_size: u32) -> PaginatedResponse<T> {
    let total = items.len() as u64;
    let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
    let data = items.into_iter().skip(start).take(page_size as usize).collect();

    PaginatedResponse {
        data,
        pagination: Pagination::new(page, page_size, total),
    }
}

pub fn validate_pagination_params(page: u32, page_size: u32, max_page_size: u32) -> Result<()> {
    if page < 1 {
        return Err(DailyMedError::validation("Page number must be 1 or greater"));
    }
    if page_size < 1 || page_size > max_page_size {
        return Err(DailyMedError::validation(format!(
            "Page size must be between 1 and {}",
            max_page_size
        )));
    }
    Ok(())
}
