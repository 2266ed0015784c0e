/// Runs `$block` and logs how long it took at debug level.
#[macro_export]
macro_rules! timer_debug {
    ($msg:literal, $block:expr) => {{
        let started_at = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(started_at);

        tracing::debug!(elapsed = %elapsed, "{} took {:#}", $msg, elapsed);

        result
    }};
}

pub(crate) fn minutes(duration: jiff::SignedDuration) -> f64 {
    duration.as_secs_f64() / 60.0
}

pub(crate) fn from_minutes(minutes: f64) -> jiff::SignedDuration {
    jiff::SignedDuration::from_secs_f64(minutes * 60.0)
}
