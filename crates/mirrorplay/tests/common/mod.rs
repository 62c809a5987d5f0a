#![allow(dead_code)]

use mirrorplay_engine::{Content, ContentSource, Provider, SourceSet};

/// Initialize tracing for tests with appropriate settings
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn cdn_a(id: &str) -> ContentSource {
    ContentSource::new(Provider::EmbeddedCdnA, id).unwrap()
}

pub fn region_cdn(id: &str) -> ContentSource {
    ContentSource::new(Provider::RegionCdn, id).unwrap()
}

/// primary=(embedded-cdn-a,"v1"), secondary=(region-cdn,"r1")
pub fn mirrored() -> Content {
    Content::new(
        "Mirrored lesson",
        SourceSet::new(Some(cdn_a("v1")), Some(region_cdn("r1"))),
    )
}

pub fn primary_only() -> Content {
    Content::new("Primary only", SourceSet::new(Some(cdn_a("v1")), None))
}

pub fn no_video() -> Content {
    Content::new("No video", SourceSet::empty())
}
