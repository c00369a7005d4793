use serde::Deserialize;

/// Route name written when the caller does not supply one.
pub const DEFAULT_EXPORT_NAME: &str = "Ride";

/// Value of the `creator` attribute on exported documents.
pub const DEFAULT_CREATOR: &str = "gpx-route-wasm";

/// Options for GPX parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Reject malformed numbers, point elements without lat/lon and
    /// tokenizer errors instead of tolerating them (default: false)
    #[serde(default)]
    pub strict: bool,
}

/// Options for GPX export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Route name for <metadata> and <trk> (default: "Ride")
    #[serde(default = "default_export_name")]
    pub name: String,

    /// `creator` attribute of the root element
    #[serde(default = "default_creator")]
    pub creator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            name: default_export_name(),
            creator: default_creator(),
        }
    }
}

impl ExportOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Options for GeoJSON conversion of a parsed route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Include elevation as the 3rd coordinate value (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Include name/type in properties (default: true)
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Add distanceM/elevationGainM to the track feature (default: false)
    #[serde(default)]
    pub include_stats: bool,

    /// Which element types to convert (default: all)
    #[serde(default)]
    pub types: Option<Vec<GpxElementType>>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_elevation: true,
            include_metadata: true,
            include_stats: false,
            types: None,
        }
    }
}

impl ConvertOptions {
    pub fn should_include(&self, element_type: GpxElementType) -> bool {
        match &self.types {
            None => true,
            Some(types) => types.contains(&element_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpxElementType {
    Waypoint,
    Track,
}

fn default_true() -> bool {
    true
}

fn default_export_name() -> String {
    DEFAULT_EXPORT_NAME.to_string()
}

fn default_creator() -> String {
    DEFAULT_CREATOR.to_string()
}
