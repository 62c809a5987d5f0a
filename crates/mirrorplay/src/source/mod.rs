//! Source registry: the immutable set of candidate sources for one content item.

mod normalize;
mod provider;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use provider::Provider;

use crate::{Error, Result};

/// One deliverable video endpoint.
///
/// A value of this type is always fully specified; an absent source is
/// represented by `Option::None` in [`SourceSet`]. Deserialization goes
/// through [`ContentSource::new`], so the locator is always normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawContentSource")]
pub struct ContentSource {
    provider: Provider,
    locator: String,
}

#[derive(Deserialize)]
struct RawContentSource {
    provider: Provider,
    locator: String,
}

impl TryFrom<RawContentSource> for ContentSource {
    type Error = Error;

    fn try_from(raw: RawContentSource) -> Result<Self> {
        Self::new(raw.provider, &raw.locator)
    }
}

impl ContentSource {
    /// Build a source, normalizing the locator to the form `provider` expects.
    pub fn new(provider: Provider, locator: &str) -> Result<Self> {
        let locator = normalize::normalize_locator(provider, locator)?;
        Ok(Self { provider, locator })
    }

    /// Build the source of `slot` from raw record fields.
    ///
    /// Both fields missing or blank is a valid absent slot (`Ok(None)`); only one
    /// of them present is [`Error::PartialSource`] for `slot`.
    pub fn parse(slot: Slot, provider: Option<&str>, locator: Option<&str>) -> Result<Option<Self>> {
        let provider = provider.map(str::trim).filter(|p| !p.is_empty());
        let locator = locator.map(str::trim).filter(|l| !l.is_empty());

        match (provider, locator) {
            (None, None) => Ok(None),
            (Some(provider), Some(locator)) => {
                let provider = Provider::try_parse(provider)?;
                Self::new(provider, locator).map(Some)
            }
            _ => Err(Error::PartialSource { slot }),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.locator)
    }
}

/// Which of the two candidate slots a source occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two candidate sources for one content item.
///
/// Built once per content item and never mutated; a new item gets a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    primary: Option<ContentSource>,
    secondary: Option<ContentSource>,
}

impl SourceSet {
    pub fn new(primary: Option<ContentSource>, secondary: Option<ContentSource>) -> Self {
        Self { primary, secondary }
    }

    /// Set with no playable source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from a raw record, treating malformed slots as absent.
    pub fn from_record(record: &ContentRecord) -> Self {
        let slot = |slot: Slot, provider: &Option<String>, locator: &Option<String>| {
            ContentSource::parse(slot, provider.as_deref(), locator.as_deref())
                .unwrap_or_else(|e| {
                    warn!(slot = %slot, title = %record.title, error = %e, "Ignoring malformed video source");
                    None
                })
        };

        Self {
            primary: slot(Slot::Primary, &record.primary_provider, &record.primary_locator),
            secondary: slot(
                Slot::Secondary,
                &record.secondary_provider,
                &record.secondary_locator,
            ),
        }
    }

    /// Build a set from a raw record, failing on the first malformed slot.
    pub fn try_from_record(record: &ContentRecord) -> Result<Self> {
        Ok(Self {
            primary: ContentSource::parse(
                Slot::Primary,
                record.primary_provider.as_deref(),
                record.primary_locator.as_deref(),
            )?,
            secondary: ContentSource::parse(
                Slot::Secondary,
                record.secondary_provider.as_deref(),
                record.secondary_locator.as_deref(),
            )?,
        })
    }

    pub fn get(&self, slot: Slot) -> Option<&ContentSource> {
        match slot {
            Slot::Primary => self.primary.as_ref(),
            Slot::Secondary => self.secondary.as_ref(),
        }
    }

    pub fn primary(&self) -> Option<&ContentSource> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&ContentSource> {
        self.secondary.as_ref()
    }

    pub fn is_present(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }

    pub fn has_both(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }

    pub fn present_count(&self) -> usize {
        usize::from(self.primary.is_some()) + usize::from(self.secondary.is_some())
    }
}

/// Raw per-item record handed over by the content catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentRecord {
    /// Display only.
    pub title: String,
    pub primary_provider: Option<String>,
    pub primary_locator: Option<String>,
    pub secondary_provider: Option<String>,
    pub secondary_locator: Option<String>,
}

/// A content item ready for playback: its title and resolved sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,
    pub sources: SourceSet,
}

impl Content {
    pub fn new(title: impl Into<String>, sources: SourceSet) -> Self {
        Self {
            title: title.into(),
            sources,
        }
    }

    pub fn from_record(record: &ContentRecord) -> Self {
        Self {
            title: record.title.clone(),
            sources: SourceSet::from_record(record),
        }
    }
}

impl From<&ContentRecord> for Content {
    fn from(record: &ContentRecord) -> Self {
        Self::from_record(record)
    }
}
