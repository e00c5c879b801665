//! Lenient extraction of typed parameters from a `serde_json::Value` object.
//!
//! Each helper takes a JSON value, a key name, and a default. If the key is
//! missing or holds the wrong type, the default is returned, so a partial
//! override object always yields a complete configuration.

use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// JSON integers are accepted and widened.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a string slice from `params[name]`, returning `default` if missing or wrong type.
pub fn param_str<'a>(params: &'a Value, name: &str, default: &'a str) -> &'a str {
    params.get(name).and_then(Value::as_str).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_f64_extracts_existing_float() {
        let params = json!({"falloff_power": 2.5});
        assert_eq!(param_f64(&params, "falloff_power", 1.0), 2.5);
    }

    #[test]
    fn param_f64_widens_integers() {
        let params = json!({"pointer_radius": 80});
        assert_eq!(param_f64(&params, "pointer_radius", 0.0), 80.0);
    }

    #[test]
    fn param_f64_falls_back_when_missing_null_or_mistyped() {
        let params = json!({"noise_scale": null, "noise_strength": "strong"});
        assert_eq!(param_f64(&params, "noise_scale", 0.003), 0.003);
        assert_eq!(param_f64(&params, "noise_strength", 0.5), 0.5);
        assert_eq!(param_f64(&params, "line_width", 1.5), 1.5);
    }

    #[test]
    fn param_f64_falls_back_for_non_object() {
        assert_eq!(param_f64(&json!([1, 2]), "line_width", 7.0), 7.0);
    }

    #[test]
    fn param_str_extracts_existing_string() {
        let params = json!({"saddle_resolution": "center_average"});
        assert_eq!(
            param_str(&params, "saddle_resolution", "midpoints"),
            "center_average"
        );
    }

    #[test]
    fn param_str_falls_back_for_wrong_type() {
        let params = json!({"saddle_resolution": 3});
        assert_eq!(param_str(&params, "saddle_resolution", "midpoints"), "midpoints");
    }
}
