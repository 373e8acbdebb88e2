use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External content sources the archive can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Twitter,
    Instagram,
    Tiktok,
    Theqoo,
    Instiz,
    Kpopping,
}

/// How a platform resumes a paginated result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationScheme {
    Cursor,
    PageToken,
    MaxTimeId,
    Page,
    Offset,
}

impl Platform {
    pub const ALL: [Self; 7] = [
        Self::Youtube,
        Self::Twitter,
        Self::Instagram,
        Self::Tiktok,
        Self::Theqoo,
        Self::Instiz,
        Self::Kpopping,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Theqoo => "theqoo",
            Self::Instiz => "instiz",
            Self::Kpopping => "kpopping",
        }
    }

    #[must_use]
    pub const fn pagination(self) -> PaginationScheme {
        match self {
            Self::Youtube => PaginationScheme::PageToken,
            Self::Twitter => PaginationScheme::Cursor,
            Self::Instagram => PaginationScheme::MaxTimeId,
            Self::Tiktok => PaginationScheme::Offset,
            Self::Theqoo | Self::Instiz | Self::Kpopping => PaginationScheme::Page,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trips_through_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert_eq!(" YouTube ".parse::<Platform>().unwrap(), Platform::Youtube);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_boards_paginate_by_page_number() {
        assert_eq!(Platform::Theqoo.pagination(), PaginationScheme::Page);
        assert_eq!(Platform::Instiz.pagination(), PaginationScheme::Page);
        assert_eq!(Platform::Tiktok.pagination(), PaginationScheme::Offset);
    }
}
