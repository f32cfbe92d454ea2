use lidtrace_core::lids::TableError;
use lidtrace_core::symmetry::SymmetryTable;
use lidtrace_core::{LidTable, OverlayRenderer, StrokeStyle};
use std::path::PathBuf;

/// Pipeline configuration, loaded from environment variables.
pub struct Config {
    /// Edge length of the square working buffer handed to the detector.
    pub output_size: u32,
    /// Overlay stroke width in pixels.
    pub stroke_width: f32,
    /// Overlay stroke color as `0xAARRGGBB`.
    pub stroke_color: u32,
    /// Optional replacement for the embedded eyelid control table.
    pub lid_table: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `LIDTRACE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = StrokeStyle::default();
        Self {
            output_size: env_u32("LIDTRACE_OUTPUT_SIZE", 600),
            stroke_width: env_f32("LIDTRACE_STROKE_WIDTH", defaults.width),
            stroke_color: std::env::var("LIDTRACE_STROKE_COLOR")
                .ok()
                .and_then(|v| parse_color(&v))
                .unwrap_or(defaults.color),
            lid_table: std::env::var("LIDTRACE_LID_TABLE").ok().map(PathBuf::from),
        }
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.stroke_color,
            width: self.stroke_width,
        }
    }

    /// Control table from `LIDTRACE_LID_TABLE`, or the embedded default.
    pub fn lid_table(&self) -> Result<LidTable, TableError> {
        match &self.lid_table {
            Some(path) => LidTable::load(path, &SymmetryTable::ibug68()),
            None => LidTable::embedded(),
        }
    }

    pub fn renderer(&self) -> Result<OverlayRenderer, TableError> {
        Ok(OverlayRenderer::new(self.lid_table()?, self.stroke_style()))
    }
}

/// Parse `#RRGGBB` (opaque) or `#AARRGGBB`; the `#` is optional.
pub fn parse_color(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        6 => Some(0xFF00_0000 | value),
        8 => Some(value),
        _ => None,
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#00FF00"), Some(0xFF00_FF00));
        assert_eq!(parse_color("80ff0000"), Some(0x80FF_0000));
        assert_eq!(parse_color(" #123456 "), Some(0xFF12_3456));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("green"), None);
    }

    #[test]
    fn test_env_defaults() {
        assert_eq!(env_u32("LIDTRACE_TEST_UNSET_SIZE", 600), 600);
        assert_eq!(env_f32("LIDTRACE_TEST_UNSET_WIDTH", 2.0), 2.0);
    }

    #[test]
    fn test_default_renderer() {
        let config = Config {
            output_size: 600,
            stroke_width: 2.0,
            stroke_color: 0xFF00_FF00,
            lid_table: None,
        };
        let renderer = config.renderer().unwrap();
        assert_eq!(renderer.table().direct().len(), 10);
        assert_eq!(*renderer.style(), StrokeStyle::default());
    }

    #[test]
    fn test_missing_table_file() {
        let config = Config {
            output_size: 600,
            stroke_width: 2.0,
            stroke_color: 0xFF00_FF00,
            lid_table: Some(PathBuf::from("/nonexistent/eyelid.toml")),
        };
        assert!(matches!(config.lid_table(), Err(TableError::Io { .. })));
    }
}
