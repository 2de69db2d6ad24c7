//! Color tokens and per-axis model color maps.

use cmx_core::{BestModelRecord, ModelAxis};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Hue step between consecutive models.
pub const HUE_STEP: usize = 137;
pub const SATURATION: u8 = 70;
pub const LIGHTNESS: u8 = 50;

/// HSL color with integer components, formatted as CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    /// Color of the `index`-th distinct model on an axis.
    pub fn for_index(index: usize) -> Self {
        Self {
            hue: ((index % 360) * HUE_STEP % 360) as u16,
            saturation: SATURATION,
            lightness: LIGHTNESS,
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Any color a marker or legend entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// CSS color keyword
    Named(&'static str),
    Hsl(Hsl),
}

impl Color {
    pub const GRAY: Color = Color::Named("gray");
    pub const LIGHT_GRAY: Color = Color::Named("lightgray");
    pub const HIGHLIGHT: Color = Color::Named("orange");
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(name) => f.write_str(name),
            Color::Hsl(hsl) => hsl.fmt(f),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Hsl> for Color {
    fn from(hsl: Hsl) -> Self {
        Color::Hsl(hsl)
    }
}

/// Model name → color for one axis, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorMap {
    entries: Vec<(String, Hsl)>,
    index: HashMap<String, usize>,
}

impl ColorMap {
    /// Deduplicate `names` keeping first appearance; the i-th distinct name
    /// gets `Hsl::for_index(i)`. Blank names are skipped.
    pub fn assign<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = ColorMap::default();
        for name in names {
            let name = name.trim();
            if name.is_empty() || map.index.contains_key(name) {
                continue;
            }
            let color = Hsl::for_index(map.entries.len());
            map.index.insert(name.to_string(), map.entries.len());
            map.entries.push((name.to_string(), color));
        }
        map
    }

    /// Color map of the best model on `axis` across a best-models result.
    /// Records without a model on that axis do not take a slot.
    pub fn from_records(records: &[BestModelRecord], axis: ModelAxis) -> Self {
        Self::assign(records.iter().filter_map(|r| r.best(axis)))
    }

    pub fn get(&self, model: &str) -> Option<Hsl> {
        self.index.get(model).map(|&i| self.entries[i].1)
    }

    /// Marker color for a model, gray when absent or unknown.
    pub fn color_or_gray(&self, model: Option<&str>) -> Color {
        model
            .and_then(|m| self.get(m))
            .map(Color::Hsl)
            .unwrap_or(Color::GRAY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Hsl)> {
        self.entries.iter().map(|(name, hsl)| (name.as_str(), *hsl))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
