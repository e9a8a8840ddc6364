//! Shared API types: pagination

use serde::{Deserialize, Serialize};

/// 列表接口通用分页参数 `?page=1&limit=20`
#[derive(Debug, Clone, Deserialize)]
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
    20
}

impl PageQuery {
    /// Clamp page/limit into sane bounds (page ≥ 1, 1 ≤ limit ≤ 100).
    pub fn clamped(&self) -> (i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, 100);
        (page, limit)
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.clamped();
        (page - 1) * limit
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// 分页响应元数据
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let (page, limit) = query.clamped();
        Self {
            current: page,
            pages: (total + limit - 1) / limit.max(1),
            total,
        }
    }
}
