//! Video delivery providers.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The closed set of providers a content item can be delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Primary international embed-based streaming CDN.
    EmbeddedCdnA,
    /// Second embed-based streaming CDN, addressed by library and video id.
    EmbeddedCdnB,
    /// In-country CDN reachable from the restricted region.
    RegionCdn,
    /// Short-form social embed.
    SocialEmbed,
    /// Self-hosted storage or object URL played directly.
    DirectFile,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::EmbeddedCdnA,
        Provider::EmbeddedCdnB,
        Provider::RegionCdn,
        Provider::SocialEmbed,
        Provider::DirectFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmbeddedCdnA => "embedded-cdn-a",
            Self::EmbeddedCdnB => "embedded-cdn-b",
            Self::RegionCdn => "region-cdn",
            Self::SocialEmbed => "social-embed",
            Self::DirectFile => "direct-file",
        }
    }

    /// Parse a provider name as stored in content records.
    ///
    /// Matching ignores case and surrounding whitespace, and accepts
    /// snake_case as well as kebab-case.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == normalized)
    }

    /// Parse a provider name, failing with [`Error::UnknownProvider`].
    pub fn try_parse(name: &str) -> Result<Self> {
        Self::parse(name).ok_or_else(|| Error::UnknownProvider(name.trim().to_string()))
    }

    /// Whether the provider renders through a third-party embed surface
    /// rather than a plain media element.
    pub fn is_embedded(&self) -> bool {
        !matches!(self, Self::DirectFile)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
