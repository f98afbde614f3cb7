/// Converts engine milliseconds to the media primitive's seconds.
///
/// # Example
/// ```
/// use engine::millis_to_seconds;
///
/// assert_eq!(millis_to_seconds(1_500), 1.5);
/// ```
pub fn millis_to_seconds(t_ms: i64) -> f64 {
    t_ms as f64 / 1_000.0
}

/// Converts media-primitive seconds to engine milliseconds with nearest
/// rounding.
///
/// # Example
/// ```
/// use engine::seconds_to_millis;
///
/// assert_eq!(seconds_to_millis(1.2345), 1_235);
/// ```
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1_000.0).round() as i64
}
