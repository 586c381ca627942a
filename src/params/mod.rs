//! Parameter stores used to resolve the default waypoint

use crate::common::Waypoint;
use crate::error::{ParamsError, WaypointError};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info};

/// Parameter holding the default target x coordinate
pub const DEFAULT_X_PARAM: &str = "default_x";

/// Parameter holding the default target y coordinate
pub const DEFAULT_Y_PARAM: &str = "default_y";

/// Read-only key-value parameter source
pub trait ParameterStore {
    /// Numeric value of a parameter, if present
    fn get_f64(&self, key: &str) -> Option<f64>;

    fn has(&self, key: &str) -> bool {
        self.get_f64(key).is_some()
    }
}

// Parameter names may be given ROS-style with a leading slash
fn normalize_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

/// In-memory parameters, used for command line overrides and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryParameters {
    values: HashMap<String, f64>,
}

impl MemoryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.set(key, value);
        }
        params
    }

    /// Parse `key=value` overrides
    pub fn from_overrides(overrides: &[String]) -> Result<Self, ParamsError> {
        let mut params = Self::new();
        for item in overrides {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| ParamsError::InvalidOverride(item.clone()))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| ParamsError::InvalidOverride(item.clone()))?;
            params.set(key.trim(), value);
        }
        Ok(params)
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.values.insert(normalize_key(key).to_string(), value);
    }
}

impl ParameterStore for MemoryParameters {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(normalize_key(key)).copied()
    }
}

/// Flat YAML parameter file. Non-numeric entries are kept but never match a lookup.
#[derive(Debug, Clone, Default)]
pub struct ParamsFile {
    values: HashMap<String, Value>,
}

impl ParamsFile {
    /// Load a parameter file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let params = Self::parse(&text).map_err(|source| ParamsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), entries = params.values.len(), "Loaded params file");
        Ok(params)
    }

    /// Parse parameters from YAML text. An empty document yields no parameters.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        let values: Option<HashMap<String, Value>> = serde_yaml::from_str(text)?;
        let values = values
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (normalize_key(&key).to_string(), value))
            .collect();
        Ok(ParamsFile { values })
    }
}

impl ParameterStore for ParamsFile {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(normalize_key(key)).and_then(Value::as_f64)
    }
}

/// Stack of stores; the first store holding a key wins
#[derive(Default)]
pub struct LayeredParameters {
    layers: Vec<Box<dyn ParameterStore + Send + Sync>>,
}

impl LayeredParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store below the existing ones
    pub fn with_layer<S: ParameterStore + Send + Sync + 'static>(mut self, store: S) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl ParameterStore for LayeredParameters {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.layers.iter().find_map(|layer| layer.get_f64(key))
    }
}

/// Pick the waypoint from an explicit target or from the default parameters.
pub fn resolve_waypoint(
    target: Option<(f64, f64)>,
    params: &dyn ParameterStore,
) -> Result<Waypoint, WaypointError> {
    if let Some((x, y)) = target {
        return Ok(Waypoint::new(x, y));
    }

    match (params.get_f64(DEFAULT_X_PARAM), params.get_f64(DEFAULT_Y_PARAM)) {
        (Some(x), Some(y)) => {
            info!("Waypoints - Param Server");
            Ok(Waypoint::new(x, y))
        }
        _ => {
            error!("No waypoint found in param server");
            Err(WaypointError::MissingWaypointConfiguration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_parameters() {
        let params = MemoryParameters::from_pairs([("/default_x", 1.5), ("default_y", -2.0)]);
        assert_eq!(params.get_f64("default_x"), Some(1.5));
        assert_eq!(params.get_f64("/default_y"), Some(-2.0));
        assert!(!params.has("missing"));
    }

    #[test]
    fn test_overrides() {
        let overrides = vec!["default_x=3".to_string(), " default_y = 4.5 ".to_string()];
        let params = MemoryParameters::from_overrides(&overrides).unwrap();
        assert_eq!(params.get_f64("default_x"), Some(3.0));
        assert_eq!(params.get_f64("default_y"), Some(4.5));

        assert!(matches!(
            MemoryParameters::from_overrides(&["default_x".to_string()]),
            Err(ParamsError::InvalidOverride(_))
        ));
        assert!(matches!(
            MemoryParameters::from_overrides(&["default_x=east".to_string()]),
            Err(ParamsError::InvalidOverride(_))
        ));
    }

    #[test]
    fn test_params_file_parse() {
        let params = ParamsFile::parse("default_x: 2\n/default_y: 8.5\nname: turtle\n").unwrap();
        assert_eq!(params.get_f64("default_x"), Some(2.0));
        assert_eq!(params.get_f64("default_y"), Some(8.5));
        assert_eq!(params.get_f64("name"), None);

        let empty = ParamsFile::parse("").unwrap();
        assert!(!empty.has("default_x"));
    }

    #[test]
    fn test_params_file_missing() {
        let err = ParamsFile::load("/nonexistent/waypoint_params.yaml").unwrap_err();
        assert!(matches!(err, ParamsError::Read { .. }));
    }

    #[test]
    fn test_layered_lookup_order() {
        let params = LayeredParameters::new()
            .with_layer(MemoryParameters::from_pairs([("default_x", 1.0)]))
            .with_layer(MemoryParameters::from_pairs([("default_x", 9.0), ("default_y", 2.0)]));
        assert_eq!(params.get_f64("default_x"), Some(1.0));
        assert_eq!(params.get_f64("default_y"), Some(2.0));
    }

    #[test]
    fn test_resolve_explicit_target() {
        let waypoint = resolve_waypoint(Some((1.0, 2.0)), &MemoryParameters::new()).unwrap();
        assert_eq!(waypoint, Waypoint::new(1.0, 2.0));
    }

    #[test]
    fn test_resolve_from_params() {
        let params = MemoryParameters::from_pairs([("default_x", 7.0), ("default_y", 3.0)]);
        assert_eq!(resolve_waypoint(None, &params).unwrap(), Waypoint::new(7.0, 3.0));
    }

    #[test]
    fn test_resolve_requires_both_coordinates() {
        let params = MemoryParameters::from_pairs([("default_x", 7.0)]);
        assert!(matches!(
            resolve_waypoint(None, &params),
            Err(WaypointError::MissingWaypointConfiguration)
        ));
        assert!(matches!(
            resolve_waypoint(None, &MemoryParameters::new()),
            Err(WaypointError::MissingWaypointConfiguration)
        ));
    }
}
