use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: i64 = 25;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateBootcampRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageLink {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

#[derive(Debug, Serialize)]
pub struct BootcampPage<T> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}
