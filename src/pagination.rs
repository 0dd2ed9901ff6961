use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Query-string params shared by plain list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub first_page: u64,
    pub first_page_url: String,
    pub last_page_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,
    pub previous_page_url: Option<String>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: u64, per_page: u64, base_path: &str) -> Self {
        let last_page = if total <= 0 {
            1
        } else {
            ((total as u64) + per_page - 1) / per_page
        };
        let url = |p: u64| format!("{}?page={}", base_path, p);
        let meta = PageMeta {
            total,
            per_page,
            current_page: page,
            last_page,
            first_page: 1,
            first_page_url: url(1),
            last_page_url: url(last_page),
            next_page_url: (page < last_page).then(|| url(page + 1)),
            previous_page_url: (page > 1).then(|| url(page - 1)),
        };
        Page { meta, data }
    }
}

/// Normalizes raw query values into a page number, page size and
/// SQL offset. Page floors at 1, size is clamped to 1..=100.
pub fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = ((page - 1) * per_page) as i64;
    (page, per_page, offset)
}
