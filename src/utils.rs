use gloo_storage::{LocalStorage, Storage};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{EXPOSURE_MAX_SECS, EXPOSURE_MIN_SECS};

// Compiled regexes for exposure entry parsing
static EXPOSURE_SECS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*s?$").unwrap());
static EXPOSURE_MILLIS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*ms$").unwrap());
static EXPOSURE_MICROS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*us$").unwrap());
static EXPOSURE_FRACTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1\s*/\s*(\d+(?:\.\d+)?)$").unwrap());

/// Parse an exposure entry into seconds.
///
/// Supported formats:
/// - Shutter fraction: "1/250"
/// - Seconds: "0.01" or "2s"
/// - Milliseconds: "10ms"
/// - Microseconds: "1200us"
pub fn parse_exposure_secs(input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Exposure cannot be empty".to_string());
    }

    let secs = if let Some(captures) = EXPOSURE_FRACTION_REGEX.captures(trimmed) {
        let denom: f64 = captures[1]
            .parse()
            .map_err(|_| "Invalid shutter fraction".to_string())?;
        if denom <= 0.0 {
            return Err("Shutter fraction denominator must be positive".to_string());
        }
        1.0 / denom
    } else if let Some(captures) = EXPOSURE_MILLIS_REGEX.captures(trimmed) {
        let ms: f64 = captures[1]
            .parse()
            .map_err(|_| "Invalid milliseconds value".to_string())?;
        ms / 1000.0
    } else if let Some(captures) = EXPOSURE_MICROS_REGEX.captures(trimmed) {
        let us: f64 = captures[1]
            .parse()
            .map_err(|_| "Invalid microseconds value".to_string())?;
        us / 1_000_000.0
    } else if let Some(captures) = EXPOSURE_SECS_REGEX.captures(trimmed) {
        captures[1]
            .parse()
            .map_err(|_| "Invalid seconds value".to_string())?
    } else {
        return Err("Invalid exposure. Use: 1/250, 0.01, 10ms or 2s".to_string());
    };

    if !(EXPOSURE_MIN_SECS..=EXPOSURE_MAX_SECS).contains(&secs) {
        return Err(format!(
            "Exposure must be between {EXPOSURE_MIN_SECS} and {EXPOSURE_MAX_SECS} seconds"
        ));
    }
    Ok(secs)
}

/// Seconds → whole microseconds, the unit the camera's `exposure_time`
/// endpoint expects.
pub fn secs_to_micros(secs: f64) -> u32 {
    (secs * 1_000_000.0).round().max(0.0) as u32
}

pub fn micros_to_secs(micros: u32) -> f64 {
    f64::from(micros) / 1_000_000.0
}

/// Page colour theme, persisted across visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

/// Local-storage key holding the saved theme.
pub const THEME_STORAGE_KEY: &str = "theme";

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Body class carrying the theme styling.
    pub fn body_class(self) -> &'static str {
        match self {
            Theme::Light => "light-theme",
            Theme::Dark => "dark-theme",
        }
    }

    /// Anything other than a stored "light" means dark, including a
    /// missing or corrupted value.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Read the saved theme, defaulting to dark.
///
/// Raw storage access keeps the stored value a bare `light`/`dark`
/// string, compatible with what earlier panel revisions wrote.
pub fn load_theme() -> Theme {
    let stored = LocalStorage::raw().get_item(THEME_STORAGE_KEY).ok().flatten();
    Theme::from_stored(stored.as_deref())
}

pub fn store_theme(theme: Theme) {
    if let Err(err) = LocalStorage::raw().set_item(THEME_STORAGE_KEY, theme.as_str()) {
        log::warn!("Failed to persist theme: {err:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shutter_fractions() {
        assert_eq!(parse_exposure_secs("1/250"), Ok(0.004));
        assert_eq!(parse_exposure_secs("1 / 8000"), Ok(0.000125));
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!(parse_exposure_secs("10ms"), Ok(0.01));
        assert_eq!(parse_exposure_secs("1200us"), Ok(0.0012));
        assert_eq!(parse_exposure_secs("2s"), Ok(2.0));
        assert_eq!(parse_exposure_secs("0.5"), Ok(0.5));
    }

    #[test]
    fn rejects_junk_and_out_of_range() {
        assert!(parse_exposure_secs("").is_err());
        assert!(parse_exposure_secs("fast").is_err());
        assert!(parse_exposure_secs("1/0").is_err());
        assert!(parse_exposure_secs("64s").is_err()); // above 32 s
        assert!(parse_exposure_secs("1us").is_err()); // below 1/8000 s
    }

    #[test]
    fn micros_round_trip() {
        assert_eq!(secs_to_micros(0.004), 4_000);
        assert_eq!(secs_to_micros(0.5), 500_000);
        assert_eq!(secs_to_micros(2.0), 2_000_000);
        assert!((micros_to_secs(4_000) - 0.004).abs() < 1e-12);
    }

    #[test]
    fn theme_defaults_to_dark() {
        assert_eq!(Theme::from_stored(None), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("blue")), Theme::Dark);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.body_class(), "dark-theme");
    }
}
