/// Control surface of the media playback primitive.
///
/// The real implementation wraps whatever element plays the stream; the
/// engine only issues commands and learns the position from tick events.
/// Times cross this seam in seconds because that is the unit the media
/// primitive exposes; `time.rs` converts from engine milliseconds at the
/// call sites.
pub trait MediaTransport {
    /// Moves the playback position.
    fn seek_to(&self, seconds: f64);

    /// Starts or resumes playback.
    fn play(&self);

    /// Pauses playback at the current position.
    fn pause(&self);

    /// Sets the playback rate multiplier.
    fn set_rate(&self, rate: f64);
}
