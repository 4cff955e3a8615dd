//! Page/pageSize/order semantics shared by every listing operation.

use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    #[serde(rename = "orderBy", default)]
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            order: SortOrder::Asc,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize, order: SortOrder) -> Self {
        Self {
            page,
            page_size,
            order,
        }
    }

    /// # Errors
    /// `AgendaError::Validation` unless `page >= 1` and `1 <= page_size <= 100`.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(AgendaError::Validation("page must be at least 1".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AgendaError::Validation(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Slice an already ordered collection. Pages past the end come back empty.
    ///
    /// # Errors
    /// Propagates [`PageRequest::validate`].
    pub fn from_sorted(items: Vec<T>, request: &PageRequest) -> Result<Self> {
        request.validate()?;

        let total_items = items.len();
        let total_pages = total_items.div_ceil(request.page_size);
        let data: Vec<T> = items
            .into_iter()
            .skip(request.offset())
            .take(request.page_size)
            .collect();

        Ok(Self {
            data,
            pagination: Pagination {
                page: request.page,
                page_size: request.page_size,
                total_items,
                total_pages,
            },
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
