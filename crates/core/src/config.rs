//! Immutable configuration snapshot for the image-metaball contour system.
//!
//! A [`MetaballConfig`] is a plain `Copy` value handed to every call that needs
//! it. Changing a setting means building a new value and swapping it in;
//! nothing reads a shared mutable parameter block. Only the three
//! [`FieldParams`] inputs require the scalar fields to be rebuilt; every other
//! setting applies from the next rendered frame.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::params::{param_f64, param_str};

const DEFAULT_GRID_RESOLUTION: f64 = 2.0;
const DEFAULT_INFLUENCE_RADIUS: f64 = 5.0;
const DEFAULT_FALLOFF_POWER: f64 = 3.5;
const DEFAULT_LINE_WIDTH: f64 = 1.5;
const DEFAULT_THRESHOLD_SPEED: f64 = 0.01;
const DEFAULT_NOISE_SPEED: f64 = 0.005;
const DEFAULT_THRESHOLD_MIN: f64 = 0.2;
const DEFAULT_THRESHOLD_MAX: f64 = 0.8;
const DEFAULT_NOISE_SCALE: f64 = 0.003;
const DEFAULT_NOISE_STRENGTH: f64 = 0.5;
const DEFAULT_POINTER_RADIUS: f64 = 115.0;
const DEFAULT_POINTER_STRENGTH: f64 = 0.5;
const DEFAULT_TRANSITION_DURATION_MS: f64 = 1500.0;

/// Smallest pixel stride used when sampling a source image.
const MIN_SAMPLE_SPACING: f64 = 2.0;

/// How marching squares resolves the two checkerboard cell codes (5 and 10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaddleResolution {
    /// Emit two segments through all four edge crossings, exactly as the fixed
    /// edge table lists them.
    #[default]
    Midpoints,
    /// Compare the mean of the four corners with the threshold and connect the
    /// diagonal that the mean says is inside.
    CenterAverage,
}

impl SaddleResolution {
    pub fn name(self) -> &'static str {
        match self {
            SaddleResolution::Midpoints => "midpoints",
            SaddleResolution::CenterAverage => "center_average",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        match name {
            "midpoints" => Ok(SaddleResolution::Midpoints),
            "center_average" => Ok(SaddleResolution::CenterAverage),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown saddle resolution '{other}' (expected midpoints or center_average)"
            ))),
        }
    }
}

/// The inputs of field construction. A change in any of them invalidates
/// every built field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Cell size in viewport pixels.
    pub grid_resolution: f64,
    /// Radius, in pixels, over which one sampled pixel spreads its mass.
    pub influence_radius: f64,
    /// Exponent of the `(1 - d/r)^p` falloff kernel.
    pub falloff_power: f64,
}

impl FieldParams {
    /// Pixel stride between sampled source pixels, `max(2, grid_resolution)`.
    pub fn sample_spacing(&self) -> f64 {
        self.grid_resolution.max(MIN_SAMPLE_SPACING)
    }

    /// Half-width, in cells, of the square neighbourhood a pixel can reach.
    pub fn influence_cells(&self) -> isize {
        (self.influence_radius / self.grid_resolution).ceil() as isize
    }
}

/// Every tunable of the system with its default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaballConfig {
    pub grid_resolution: f64,
    pub influence_radius: f64,
    pub falloff_power: f64,
    pub line_width: f64,
    pub threshold_speed: f64,
    pub noise_speed: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    pub noise_scale: f64,
    pub noise_strength: f64,
    pub pointer_radius: f64,
    pub pointer_strength: f64,
    pub transition_duration_ms: f64,
    pub saddle_resolution: SaddleResolution,
}

impl Default for MetaballConfig {
    fn default() -> Self {
        Self {
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            influence_radius: DEFAULT_INFLUENCE_RADIUS,
            falloff_power: DEFAULT_FALLOFF_POWER,
            line_width: DEFAULT_LINE_WIDTH,
            threshold_speed: DEFAULT_THRESHOLD_SPEED,
            noise_speed: DEFAULT_NOISE_SPEED,
            threshold_min: DEFAULT_THRESHOLD_MIN,
            threshold_max: DEFAULT_THRESHOLD_MAX,
            noise_scale: DEFAULT_NOISE_SCALE,
            noise_strength: DEFAULT_NOISE_STRENGTH,
            pointer_radius: DEFAULT_POINTER_RADIUS,
            pointer_strength: DEFAULT_POINTER_STRENGTH,
            transition_duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            saddle_resolution: SaddleResolution::Midpoints,
        }
    }
}

impl MetaballConfig {
    /// Reads overrides from a JSON object, keeping defaults for missing or
    /// mistyped keys. An unrecognized `saddle_resolution` name also keeps the default.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            grid_resolution: param_f64(params, "grid_resolution", d.grid_resolution),
            influence_radius: param_f64(params, "influence_radius", d.influence_radius),
            falloff_power: param_f64(params, "falloff_power", d.falloff_power),
            line_width: param_f64(params, "line_width", d.line_width),
            threshold_speed: param_f64(params, "threshold_speed", d.threshold_speed),
            noise_speed: param_f64(params, "noise_speed", d.noise_speed),
            threshold_min: param_f64(params, "threshold_min", d.threshold_min),
            threshold_max: param_f64(params, "threshold_max", d.threshold_max),
            noise_scale: param_f64(params, "noise_scale", d.noise_scale),
            noise_strength: param_f64(params, "noise_strength", d.noise_strength),
            pointer_radius: param_f64(params, "pointer_radius", d.pointer_radius),
            pointer_strength: param_f64(params, "pointer_strength", d.pointer_strength),
            transition_duration_ms: param_f64(
                params,
                "transition_duration_ms",
                d.transition_duration_ms,
            ),
            saddle_resolution: SaddleResolution::from_name(param_str(
                params,
                "saddle_resolution",
                d.saddle_resolution.name(),
            ))
            .unwrap_or(d.saddle_resolution),
        }
    }

    /// Current values as a flat JSON object.
    pub fn to_json(&self) -> Value {
        json!({
            "grid_resolution": self.grid_resolution,
            "influence_radius": self.influence_radius,
            "falloff_power": self.falloff_power,
            "line_width": self.line_width,
            "threshold_speed": self.threshold_speed,
            "noise_speed": self.noise_speed,
            "threshold_min": self.threshold_min,
            "threshold_max": self.threshold_max,
            "noise_scale": self.noise_scale,
            "noise_strength": self.noise_strength,
            "pointer_radius": self.pointer_radius,
            "pointer_strength": self.pointer_strength,
            "transition_duration_ms": self.transition_duration_ms,
            "saddle_resolution": self.saddle_resolution.name(),
        })
    }

    /// Schema describing each parameter: type, default, range and whether a
    /// change rebuilds the fields.
    pub fn param_schema() -> Value {
        let number = |default: f64, min: f64, max: f64, rebuild: bool, description: &str| {
            json!({
                "type": "number",
                "default": default,
                "min": min,
                "max": max,
                "rebuilds_field": rebuild,
                "description": description,
            })
        };
        json!({
            "grid_resolution": number(DEFAULT_GRID_RESOLUTION, 1.0, 10.0, true,
                "Grid cell size in pixels"),
            "influence_radius": number(DEFAULT_INFLUENCE_RADIUS, 1.0, 50.0, true,
                "Radius in pixels over which each sampled pixel spreads its brightness"),
            "falloff_power": number(DEFAULT_FALLOFF_POWER, 0.5, 8.0, true,
                "Exponent of the (1 - d/r)^p falloff kernel"),
            "line_width": number(DEFAULT_LINE_WIDTH, 0.5, 5.0, false,
                "Stroke width of contour segments in pixels"),
            "threshold_speed": number(DEFAULT_THRESHOLD_SPEED, 0.0, 0.1, false,
                "Speed of the base threshold's noise walk per frame"),
            "noise_speed": number(DEFAULT_NOISE_SPEED, 0.0, 0.05, false,
                "Temporal speed of per-cell threshold noise per frame"),
            "threshold_min": number(DEFAULT_THRESHOLD_MIN, 0.0, 1.0, false,
                "Lower bound of the oscillating base threshold"),
            "threshold_max": number(DEFAULT_THRESHOLD_MAX, 0.0, 1.0, false,
                "Upper bound of the oscillating base threshold"),
            "noise_scale": number(DEFAULT_NOISE_SCALE, 0.0, 0.05, false,
                "Spatial frequency of per-cell threshold noise, per grid cell"),
            "noise_strength": number(DEFAULT_NOISE_STRENGTH, 0.0, 2.0, false,
                "Amplitude of per-cell threshold noise"),
            "pointer_radius": number(DEFAULT_POINTER_RADIUS, 0.0, 500.0, false,
                "Radius in pixels of the pointer's threshold bias"),
            "pointer_strength": number(DEFAULT_POINTER_STRENGTH, -2.0, 2.0, false,
                "Threshold bias added at the pointer position"),
            "transition_duration_ms": number(DEFAULT_TRANSITION_DURATION_MS, 0.0, 10000.0, false,
                "Duration of the crossfade between two images in milliseconds"),
            "saddle_resolution": {
                "type": "string",
                "default": SaddleResolution::Midpoints.name(),
                "options": [
                    SaddleResolution::Midpoints.name(),
                    SaddleResolution::CenterAverage.name(),
                ],
                "rebuilds_field": false,
                "description": "How the two checkerboard marching-squares cases are connected"
            }
        })
    }

    /// Checks the values the core relies on. The core never calls this
    /// itself; callers validate before constructing an engine.
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("grid_resolution", self.grid_resolution),
            ("influence_radius", self.influence_radius),
            ("falloff_power", self.falloff_power),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if self.threshold_min > self.threshold_max {
            return Err(EngineError::InvalidConfig(format!(
                "threshold_min ({}) exceeds threshold_max ({})",
                self.threshold_min, self.threshold_max
            )));
        }
        let non_negative = [
            ("line_width", self.line_width),
            ("pointer_radius", self.pointer_radius),
            ("transition_duration_ms", self.transition_duration_ms),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            grid_resolution: self.grid_resolution,
            influence_radius: self.influence_radius,
            falloff_power: self.falloff_power,
        }
    }

    /// True if swapping `self` for `next` requires rebuilding the fields.
    pub fn requires_rebuild(&self, next: &MetaballConfig) -> bool {
        self.field_params() != next.field_params()
    }

    /// Midpoint of the base threshold's oscillation.
    pub fn threshold_center(&self) -> f64 {
        (self.threshold_min + self.threshold_max) / 2.0
    }

    /// Half the width of the base threshold's oscillation.
    pub fn threshold_amplitude(&self) -> f64 {
        (self.threshold_max - self.threshold_min) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let c = MetaballConfig::default();
        assert_eq!(c.grid_resolution, 2.0);
        assert_eq!(c.influence_radius, 5.0);
        assert_eq!(c.falloff_power, 3.5);
        assert_eq!(c.pointer_radius, 115.0);
        assert_eq!(c.transition_duration_ms, 1500.0);
        assert_eq!(c.saddle_resolution, SaddleResolution::Midpoints);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn from_json_empty_object_is_default() {
        assert_eq!(
            MetaballConfig::from_json(&json!({})),
            MetaballConfig::default()
        );
    }

    #[test]
    fn from_json_applies_overrides() {
        let c = MetaballConfig::from_json(&json!({
            "grid_resolution": 4,
            "noise_strength": 0.1,
            "saddle_resolution": "center_average",
        }));
        assert_eq!(c.grid_resolution, 4.0);
        assert_eq!(c.noise_strength, 0.1);
        assert_eq!(c.saddle_resolution, SaddleResolution::CenterAverage);
        assert_eq!(c.falloff_power, DEFAULT_FALLOFF_POWER);
    }

    #[test]
    fn from_json_ignores_unknown_saddle_name() {
        let c = MetaballConfig::from_json(&json!({"saddle_resolution": "diagonal"}));
        assert_eq!(c.saddle_resolution, SaddleResolution::Midpoints);
    }

    #[test]
    fn to_json_round_trips_through_from_json() {
        let mut c = MetaballConfig::default();
        c.line_width = 3.0;
        c.saddle_resolution = SaddleResolution::CenterAverage;
        assert_eq!(MetaballConfig::from_json(&c.to_json()), c);
    }

    #[test]
    fn serde_fills_missing_fields_with_defaults() {
        let c: MetaballConfig = serde_json::from_str(r#"{"line_width": 2.0}"#).unwrap();
        assert_eq!(c.line_width, 2.0);
        assert_eq!(c.grid_resolution, DEFAULT_GRID_RESOLUTION);
    }

    #[test]
    fn schema_lists_every_json_key() {
        let schema = MetaballConfig::param_schema();
        let values = MetaballConfig::default().to_json();
        for key in values.as_object().unwrap().keys() {
            let entry = &schema[key];
            assert!(entry.get("type").is_some(), "{key} missing 'type'");
            assert!(entry.get("default").is_some(), "{key} missing 'default'");
            assert!(entry.get("description").is_some(), "{key} missing 'description'");
        }
    }

    #[test]
    fn validate_rejects_non_positive_field_params() {
        for key in ["grid_resolution", "influence_radius", "falloff_power"] {
            let c = MetaballConfig::from_json(&json!({ key: 0.0 }));
            assert!(
                matches!(c.validate(), Err(EngineError::InvalidConfig(ref m)) if m.contains(key)),
                "{key} = 0 should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_inverted_threshold_range() {
        let c = MetaballConfig::from_json(&json!({"threshold_min": 0.9, "threshold_max": 0.1}));
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_duration() {
        let c = MetaballConfig::from_json(&json!({"transition_duration_ms": -1.0}));
        assert!(c.validate().is_err());
    }

    #[test]
    fn only_field_params_require_rebuild() {
        let base = MetaballConfig::default();
        let render_only = MetaballConfig {
            noise_strength: 1.0,
            line_width: 4.0,
            ..base
        };
        let field_change = MetaballConfig {
            falloff_power: 2.0,
            ..base
        };
        assert!(!base.requires_rebuild(&render_only));
        assert!(base.requires_rebuild(&field_change));
    }

    #[test]
    fn sample_spacing_has_floor_of_two() {
        let mut p = MetaballConfig::default().field_params();
        p.grid_resolution = 1.0;
        assert_eq!(p.sample_spacing(), 2.0);
        p.grid_resolution = 3.5;
        assert_eq!(p.sample_spacing(), 3.5);
    }

    #[test]
    fn influence_cells_rounds_up() {
        let p = MetaballConfig::default().field_params();
        assert_eq!(p.influence_cells(), 3);
    }

    #[test]
    fn threshold_center_and_amplitude() {
        let c = MetaballConfig::default();
        assert!((c.threshold_center() - 0.5).abs() < 1e-12);
        assert!((c.threshold_amplitude() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn saddle_names_round_trip() {
        for mode in [SaddleResolution::Midpoints, SaddleResolution::CenterAverage] {
            assert_eq!(SaddleResolution::from_name(mode.name()).unwrap(), mode);
        }
        assert!(SaddleResolution::from_name("x").is_err());
    }
}
