//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_first_page() {
        let page = PageRequest { page: 1, limit: 50 };
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 50);
    }

    #[test]
    fn test_offset_later_page() {
        let page = PageRequest { page: 3, limit: 25 };
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn test_offset_page_zero_saturates() {
        let page = PageRequest { page: 0, limit: 50 };
        assert_eq!(page.offset(), 0);
    }
}
