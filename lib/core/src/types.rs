use serde::Serialize;

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Page navigation metadata for page-numbered listings.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageMeta {
    /// Derive page metadata from a total row count and page size.
    pub fn new(current_page: usize, total: usize, per_page: usize) -> Self {
        let total_pages = total.div_ceil(per_page.max(1));
        Self {
            current_page,
            total_pages,
            has_prev: current_page > 1,
            has_next: current_page < total_pages,
        }
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_now_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T'));
    }

    #[test]
    fn page_meta_rounding() {
        let meta = PageMeta::new(1, 21, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_prev);
        assert!(meta.has_next);

        let last = PageMeta::new(3, 21, 10);
        assert!(last.has_prev);
        assert!(!last.has_next);
    }

    #[test]
    fn page_meta_empty() {
        let meta = PageMeta::new(1, 0, 10);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
    }
}
