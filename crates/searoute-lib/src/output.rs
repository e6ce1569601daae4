use std::fmt::Write;

use geojson::{Feature, JsonObject};
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::router::{RouteResult, SeaRouter, DEFAULT_PROFILE};
use crate::rules::PassageRuleConfig;

/// Presentation style for route and profile output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRenderMode {
    PlainText,
    Json,
    /// GeoJSON `Feature` whose geometry is the route path.
    GeoJson,
}

impl RouteResult {
    /// GeoJSON feature carrying the path (if requested) and distances.
    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("profile".to_string(), json!(self.profile));
        properties.insert("distance".to_string(), json!(self.distance_km));
        properties.insert("distance_nm".to_string(), json!(self.distance_nm));
        properties.insert("length".to_string(), json!(self.length_km));
        properties.insert("units".to_string(), json!("km"));

        Feature {
            bbox: None,
            geometry: self.path.as_ref().map(|path| path.to_geometry()),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Render the result using the requested mode.
    pub fn render(&self, mode: RouteRenderMode) -> Result<String> {
        match mode {
            RouteRenderMode::PlainText => Ok(self.render_plain()),
            RouteRenderMode::Json => Ok(serde_json::to_string_pretty(self)?),
            RouteRenderMode::GeoJson => Ok(serde_json::to_string_pretty(&self.to_feature())?),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route ({}): {} -> {}",
            self.profile, self.from, self.to
        );
        let _ = writeln!(
            buffer,
            "Distance: {:.3} km ({:.2} NM)",
            self.distance_km, self.distance_nm
        );
        if self.length_km != self.distance_km {
            let _ = writeln!(buffer, "Sailed length: {:.3} km", self.length_km);
        }
        match &self.path {
            Some(path) if path.is_multi_part() => {
                let _ = writeln!(
                    buffer,
                    "Path: {} vertices, split at the antimeridian",
                    self.vertex_count
                );
            }
            Some(path) => {
                let joined = path
                    .coordinates()
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                let _ = writeln!(buffer, "Path: {joined}");
            }
            None => {}
        }
        buffer
    }
}

/// Routing profile with its rule counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub forbidden: usize,
    pub restricted: usize,
}

impl ProfileSummary {
    /// Summarize every profile of `router`, taking descriptions from `rules`.
    pub fn collect(router: &SeaRouter, rules: Option<&PassageRuleConfig>) -> Result<Vec<Self>> {
        let mut summaries = Vec::new();
        for name in router.profiles() {
            let edge_rules = router.profile_rules(name)?;
            let description = match (rules, router.profile_class(name)?) {
                (Some(config), Some(class)) => config.class_description(class).map(String::from),
                _ if name == DEFAULT_PROFILE => Some("shortest distance, no passage rules".into()),
                _ => None,
            };
            summaries.push(Self {
                name: name.to_string(),
                description,
                forbidden: edge_rules.map_or(0, |r| r.forbidden.len()),
                restricted: edge_rules.map_or(0, |r| r.restricted.len()),
            });
        }
        Ok(summaries)
    }
}

/// Render a profile listing.
pub fn render_profiles(profiles: &[ProfileSummary], mode: RouteRenderMode) -> Result<String> {
    match mode {
        RouteRenderMode::PlainText => {
            let mut buffer = String::new();
            for profile in profiles {
                let _ = write!(buffer, "{}", profile.name);
                if let Some(description) = profile.description.as_deref().filter(|d| !d.is_empty())
                {
                    let _ = write!(buffer, ": {description}");
                }
                let _ = writeln!(
                    buffer,
                    " ({} forbidden, {} restricted)",
                    profile.forbidden, profile.restricted
                );
            }
            Ok(buffer)
        }
        RouteRenderMode::Json | RouteRenderMode::GeoJson => {
            Ok(serde_json::to_string_pretty(profiles)?)
        }
    }
}
