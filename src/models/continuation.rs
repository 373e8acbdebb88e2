use serde::{Deserialize, Serialize};

use super::platform::{PaginationScheme, Platform};

/// Provider-specific position in a paginated search.
///
/// Stores and the coordinator persist this value untouched; only the adapter
/// for the platform that produced it reads the inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContinuationToken {
    Cursor(String),
    PageToken(String),
    MaxTimeId(String),
    Page(u32),
    Offset(u32),
}

impl ContinuationToken {
    #[must_use]
    pub const fn scheme(&self) -> PaginationScheme {
        match self {
            Self::Cursor(_) => PaginationScheme::Cursor,
            Self::PageToken(_) => PaginationScheme::PageToken,
            Self::MaxTimeId(_) => PaginationScheme::MaxTimeId,
            Self::Page(_) => PaginationScheme::Page,
            Self::Offset(_) => PaginationScheme::Offset,
        }
    }

    #[must_use]
    pub fn belongs_to(&self, platform: Platform) -> bool {
        self.scheme() == platform.pagination()
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Cursor(v) | Self::PageToken(v) | Self::MaxTimeId(v) => Some(v),
            Self::Page(_) | Self::Offset(_) => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<u32> {
        match self {
            Self::Page(n) | Self::Offset(n) => Some(*n),
            Self::Cursor(_) | Self::PageToken(_) | Self::MaxTimeId(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_serializes_as_tagged_union() {
        let token = ContinuationToken::PageToken("abc".to_string());
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "page_token", "value": "abc"}));

        let page: ContinuationToken =
            serde_json::from_value(serde_json::json!({"kind": "page", "value": 3})).unwrap();
        assert_eq!(page, ContinuationToken::Page(3));
    }

    #[test]
    fn test_token_only_belongs_to_matching_platform() {
        let token = ContinuationToken::PageToken("abc".to_string());
        assert!(token.belongs_to(Platform::Youtube));
        assert!(!token.belongs_to(Platform::Twitter));
        assert!(ContinuationToken::Page(2).belongs_to(Platform::Kpopping));
        assert!(!ContinuationToken::Offset(2).belongs_to(Platform::Kpopping));
    }
}
