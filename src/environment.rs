// MIT License

// Copyright (c) 2022 AnonmousDapper

use std::{fmt, fs, io, path::Path};

use serde::Deserialize;

/// Safari-style engine strings (`Version/<n.n> ... Safari`) get the reduced
/// bubble count and a viewport-high surface.
pub fn detect_reduced_mode(engine: &str) -> bool {
    const MARKER: &str = "Version/";

    engine.match_indices(MARKER).any(|(idx, _)| {
        let rest = &engine[idx + MARKER.len()..];
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());

        digits > 0 && rest[digits..].contains("Safari")
    })
}

#[derive(Debug)]
pub enum SettingsError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "unable to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "invalid settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for SettingsError {
    fn from(e: io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(e: toml::de::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Host-side settings. Simulation tunables are not configurable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rendering engine identifier, used to pick reduced mode.
    #[serde(alias = "user_agent")]
    pub engine: Option<String>,

    /// Forces reduced mode on or off regardless of `engine`.
    #[serde(alias = "reduced")]
    pub reduced_mode: Option<bool>,

    /// Seed for a reproducible bubble field.
    pub seed: Option<u64>,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let src = fs::read_to_string(path)?;
        Self::from_toml(&src)
    }

    pub fn from_toml(src: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(src)?)
    }

    pub fn reduced_mode(&self) -> bool {
        self.reduced_mode.unwrap_or_else(|| {
            self.engine
                .as_deref()
                .map(detect_reduced_mode)
                .unwrap_or(false)
        })
    }
}
