//! Coarse viewer-region hints.
//!
//! The hint only biases the initial source choice. It is never authoritative
//! and nothing waits for it: an unknown hint selects like an unrestricted one.

use serde::{Deserialize, Serialize};

/// Whether the viewer is plausibly inside the restricted network region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionHint {
    /// No signal available yet.
    #[default]
    Unknown,
    /// The viewer is probably outside the restricted region.
    Unrestricted,
    /// The viewer is probably inside the restricted region.
    Restricted,
}

impl RegionHint {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Restricted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unrestricted => "unrestricted",
            Self::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for RegionHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rules for turning ambient runtime settings into a [`RegionHint`].
///
/// The caller supplies whatever it can observe (an IANA timezone name, a
/// BCP 47 locale tag); this type never probes the environment itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPolicy {
    /// IANA timezone names in the restricted region, e.g. `Asia/Example`.
    pub restricted_timezones: Vec<String>,
    /// Locale tags (or tag prefixes) in the restricted region, e.g. `xx-YY`.
    pub restricted_locales: Vec<String>,
}

impl RegionPolicy {
    /// Whether any rule is configured.
    pub fn is_configured(&self) -> bool {
        !self.restricted_timezones.is_empty() || !self.restricted_locales.is_empty()
    }

    /// Derive a hint from the observed timezone and locale.
    ///
    /// Either signal matching is enough for `Restricted`. With no signal at all,
    /// or no rules, the hint is `Unknown`.
    pub fn hint_for(&self, timezone: Option<&str>, locale: Option<&str>) -> RegionHint {
        let timezone = timezone.map(str::trim).filter(|t| !t.is_empty());
        let locale = locale.map(str::trim).filter(|l| !l.is_empty());

        if !self.is_configured() || (timezone.is_none() && locale.is_none()) {
            return RegionHint::Unknown;
        }

        let tz_match = timezone.is_some_and(|tz| {
            self.restricted_timezones
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(tz))
        });
        let locale_match = locale.is_some_and(|tag| {
            self.restricted_locales
                .iter()
                .any(|candidate| locale_matches(candidate, tag))
        });

        if tz_match || locale_match {
            RegionHint::Restricted
        } else {
            RegionHint::Unrestricted
        }
    }
}

/// `candidate` matches `tag` exactly or as a subtag prefix (`xx` matches `xx-YY`).
fn locale_matches(candidate: &str, tag: &str) -> bool {
    let candidate = candidate.replace('_', "-").to_ascii_lowercase();
    let tag = tag.replace('_', "-").to_ascii_lowercase();
    tag == candidate || tag.starts_with(&format!("{candidate}-"))
}
