//! Output format selection.

use clap::ValueEnum;
use searoute_lib::RouteRenderMode;

/// Format used for everything printed to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// GeoJSON feature (route output only; other commands print JSON).
    Geojson,
}

impl OutputFormat {
    pub fn render_mode(self) -> RouteRenderMode {
        match self {
            OutputFormat::Text => RouteRenderMode::PlainText,
            OutputFormat::Json => RouteRenderMode::Json,
            OutputFormat::Geojson => RouteRenderMode::GeoJson,
        }
    }

    pub fn is_text(self) -> bool {
        self == OutputFormat::Text
    }
}
