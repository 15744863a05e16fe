use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};
use tracing::error;

use crate::placement::FitMode;

/// Background mode as parsed from configuration text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    Stretch,
    Fill,
    Fit,
    Center,
    Tile,
    SolidColor,
    /// Sentinel for unrecognized tokens; the caller decides fallback policy.
    Invalid,
}

impl BackgroundMode {
    const ALL: &'static [Self] = &[
        Self::Stretch,
        Self::Fill,
        Self::Fit,
        Self::Center,
        Self::Tile,
        Self::SolidColor,
    ];
    const NAMES: &'static [&'static str] =
        &["stretch", "fill", "fit", "center", "tile", "solid_color"];

    /// Parses a raw mode token. Unrecognized tokens log one error and map to
    /// [`BackgroundMode::Invalid`] rather than failing.
    pub fn parse(text: &str) -> Self {
        for mode in Self::ALL {
            if text == mode.as_str() {
                return *mode;
            }
        }
        error!("unsupported background mode: {text}");
        Self::Invalid
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Fill => "fill",
            Self::Fit => "fit",
            Self::Center => "center",
            Self::Tile => "tile",
            Self::SolidColor => "solid_color",
            Self::Invalid => "invalid",
        }
    }

    /// The compositor-facing variant, when one exists. `SolidColor` and
    /// `Invalid` take the solid-fill path instead.
    pub fn fit(self) -> Option<FitMode> {
        match self {
            Self::Stretch => Some(FitMode::Stretch),
            Self::Fill => Some(FitMode::Fill),
            Self::Fit => Some(FitMode::Fit),
            Self::Center => Some(FitMode::Center),
            Self::Tile => Some(FitMode::Tile),
            Self::SolidColor | Self::Invalid => None,
        }
    }
}

impl Default for BackgroundMode {
    fn default() -> Self {
        Self::Fill
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BackgroundMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        for mode in Self::ALL {
            if raw == mode.as_str() {
                return Ok(*mode);
            }
        }
        Err(de::Error::unknown_variant(&raw, Self::NAMES))
    }
}

/// RGBA color parsed from `#RRGGBB` or `#RRGGBBAA` hex text. The leading `#`
/// is optional; alpha defaults to opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 0xff,
        g: 0xff,
        b: 0xff,
        a: 0xff,
    };

    pub fn to_paint_color(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        ensure!(
            hex.len() == 6 || hex.len() == 8,
            "invalid color {s}: expected 6 or 8 hex digits"
        );
        let parsed = u32::from_str_radix(hex, 16)
            .map_err(|_| anyhow!("invalid color {s}: expected 6 or 8 hex digits"))?;
        let rgba = if hex.len() == 6 {
            (parsed << 8) | 0xff
        } else {
            parsed
        };
        Ok(Self {
            r: (rgba >> 24) as u8,
            g: (rgba >> 16) as u8,
            b: (rgba >> 8) as u8,
            a: rgba as u8,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Top-level background configuration: defaults plus per-output overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub mode: BackgroundMode,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub blur_sigma: f32,
    #[serde(default)]
    pub opacity_percent: f32,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputOverride>,
}

/// Per-output overrides; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputOverride {
    pub image: Option<PathBuf>,
    pub mode: Option<BackgroundMode>,
    pub color: Option<Color>,
    pub blur_sigma: Option<f32>,
    pub opacity_percent: Option<f32>,
}

/// The merged settings one load+render invocation consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundSettings {
    pub image: Option<PathBuf>,
    pub mode: BackgroundMode,
    pub color: Color,
    pub blur_sigma: f32,
    pub opacity_percent: f32,
}

impl BackgroundSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.mode != BackgroundMode::Invalid,
            "background mode must be one of {:?}",
            BackgroundMode::NAMES
        );
        ensure!(
            self.blur_sigma.is_finite() && self.blur_sigma >= 0.0,
            "blur-sigma must be non-negative, got {}",
            self.blur_sigma
        );
        ensure!(
            self.opacity_percent.is_finite()
                && (0.0..=100.0).contains(&self.opacity_percent),
            "opacity-percent must be within 0-100, got {}",
            self.opacity_percent
        );
        Ok(())
    }
}

impl BackgroundConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn validated(self) -> Result<Self> {
        self.settings_for(None)
            .validate()
            .context("default background")?;
        for name in self.outputs.keys() {
            self.settings_for(Some(name))
                .validate()
                .with_context(|| format!("background for output {name}"))?;
        }
        Ok(self)
    }

    /// Merges the defaults with the named output's overrides, field-wise.
    pub fn settings_for(&self, output: Option<&str>) -> BackgroundSettings {
        let over = output.and_then(|name| self.outputs.get(name));
        BackgroundSettings {
            image: over
                .and_then(|o| o.image.clone())
                .or_else(|| self.image.clone()),
            mode: over.and_then(|o| o.mode).unwrap_or(self.mode),
            color: over.and_then(|o| o.color).unwrap_or(self.color),
            blur_sigma: over.and_then(|o| o.blur_sigma).unwrap_or(self.blur_sigma),
            opacity_percent: over
                .and_then(|o| o.opacity_percent)
                .unwrap_or(self.opacity_percent),
        }
    }
}
