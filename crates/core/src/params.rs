//! Never-failing parameter extraction and clamping.
//!
//! Parameters arrive from live UI sliders or hand-written JSON, so nothing
//! here returns an error. Extractors fall back to the caller's current value
//! when a key is missing or mistyped; clamps pull out-of-range values back to
//! the nearest usable one and note it at `debug` level.

use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or wrong type.
///
/// Only non-negative JSON integers are accepted.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Extracts a `bool` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

/// Extracts a `String` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

/// Returns `value` if finite, otherwise `fallback`.
pub fn finite_or(name: &str, value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::debug!("{name}: non-finite value {value} replaced by {fallback}");
        fallback
    }
}

/// Clamps `value` to `[min, max]`, treating non-finite input as `min`.
pub fn clamp_f64(name: &str, value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        log::debug!("{name}: non-finite value {value} clamped to {min}");
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::debug!("{name}: {value} clamped to {clamped}");
    }
    clamped
}

/// Clamps a count to `[min, max]`.
pub fn clamp_usize(name: &str, value: usize, min: usize, max: usize) -> usize {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::debug!("{name}: {value} clamped to {clamped}");
    }
    clamped
}

/// Normalizes an angle in degrees to `[0, 360)`. Non-finite angles become 0.
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
