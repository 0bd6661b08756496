//! Mapping from classified buckets to the visual attributes the calendar
//! cells render. Pure lookup tables; no computation happens here.

use serde::{Deserialize, Serialize};

use crate::seasonality::bucket::Direction;
use crate::seasonality::classify::{ClassifiedBucket, Tier};

/// Cell background class, keyed by volatility tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorClass {
    LowVol,
    MidVol,
    HighVol,
}

impl ColorClass {
    pub fn hex(&self) -> &'static str {
        match self {
            ColorClass::LowVol => "#d0f0c0",
            ColorClass::MidVol => "#ffe699",
            ColorClass::HighVol => "#ffc1c1",
        }
    }
}

/// Direction marker drawn inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerGlyph {
    Up,
    Down,
    Neutral,
}

impl MarkerGlyph {
    pub fn symbol(&self) -> &'static str {
        match self {
            MarkerGlyph::Up => "\u{25b2}",
            MarkerGlyph::Down => "\u{25bc}",
            MarkerGlyph::Neutral => "\u{2022}",
        }
    }
}

/// Volume bar size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeTier {
    Low,
    Mid,
    High,
}

impl SizeTier {
    /// Bar height in pixels.
    pub fn bar_height(&self) -> u32 {
        match self {
            SizeTier::Low => 6,
            SizeTier::Mid => 12,
            SizeTier::High => 18,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            SizeTier::Low => "#90caf9",
            SizeTier::Mid => "#2196f3",
            SizeTier::High => "#0d47a1",
        }
    }
}

/// Visual attributes of one calendar cell. `None` means "no classification"
/// and renders as the theme default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualAttributes {
    pub color_class: Option<ColorClass>,
    pub marker_glyph: MarkerGlyph,
    pub size_tier: Option<SizeTier>,
}

fn color_for(tier: Tier) -> ColorClass {
    match tier {
        Tier::Low => ColorClass::LowVol,
        Tier::Mid => ColorClass::MidVol,
        Tier::High => ColorClass::HighVol,
    }
}

fn size_for(tier: Tier) -> SizeTier {
    match tier {
        Tier::Low => SizeTier::Low,
        Tier::Mid => SizeTier::Mid,
        Tier::High => SizeTier::High,
    }
}

/// Map one classified bucket to its render attributes.
pub fn to_visual_attributes(bucket: &ClassifiedBucket) -> VisualAttributes {
    let marker_glyph = match bucket.metrics.direction {
        Direction::Up => MarkerGlyph::Up,
        Direction::Down => MarkerGlyph::Down,
        Direction::Neutral => MarkerGlyph::Neutral,
    };

    VisualAttributes {
        color_class: bucket.volatility_tier.map(color_for),
        marker_glyph,
        size_tier: bucket.volume_tier.map(size_for),
    }
}
