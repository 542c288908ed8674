//! Common API utilities and shared query types

use serde::Deserialize;

use crate::models::{BookFilter, ListParams, OrderBy, PostQuery, DEFAULT_PAGE_SIZE};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl From<PaginationQuery> for ListParams {
    fn from(query: PaginationQuery) -> Self {
        ListParams::new(query.page, query.page_size)
    }
}

/// `?search=&ordering=&page=&page_size=` for post and comment lists
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl From<ListQuery> for PostQuery {
    fn from(query: ListQuery) -> Self {
        PostQuery {
            ordering: query
                .ordering
                .as_deref()
                .map(OrderBy::parse_list)
                .unwrap_or_default(),
            search: query.search,
            params: ListParams::new(query.page, query.page_size),
        }
    }
}

/// Book list query: exact filters, `search` and `ordering`
#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl From<BookListQuery> for BookFilter {
    fn from(query: BookListQuery) -> Self {
        BookFilter {
            title: query.title,
            publication_year: query.publication_year,
            author_id: query.author,
            search: query.search,
            ordering: query
                .ordering
                .as_deref()
                .map(OrderBy::parse_list)
                .unwrap_or_default(),
        }
    }
}
