use std::{
    env,
    fmt::Display,
    future::Future,
    sync::OnceLock,
    time::{Duration, Instant},
};

use tracing::{Instrument, Span};

const DEBUG_DELAY_ENV: &str = "MENTORBOARD_DEBUG_FETCH_DELAY_MS";

/// Runs a store request inside `span`, logging how long it took and how it
/// ended. `describe` renders the error for the log line only.
pub async fn send_store_request<F, Fut, T, E, D>(span: Span, send: F, describe: D) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(&E) -> String,
{
    async move {
        debug_fetch_delay().await;
        let started = Instant::now();
        let result = send().await;
        let elapsed_ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => tracing::debug!(elapsed_ms, "store_request_ok"),
            Err(err) => tracing::warn!(elapsed_ms, error = %describe(err), "store_request_failed"),
        }
        result
    }
    .instrument(span)
    .await
}

async fn debug_fetch_delay() {
    if let Some(delay) = debug_fetch_delay_duration() {
        tracing::trace!(delay_ms = delay.as_millis(), "Applying debug fetch delay");
        tokio::time::sleep(delay).await;
    }
}

fn debug_fetch_delay_duration() -> Option<Duration> {
    static DELAY: OnceLock<Option<Duration>> = OnceLock::new();
    *DELAY.get_or_init(|| {
        let raw = env::var(DEBUG_DELAY_ENV).ok()?;
        parse_delay(&raw)
    })
}

fn parse_delay(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(err) => {
            warn_invalid_delay(raw, err);
            None
        }
    }
}

fn warn_invalid_delay(raw: &str, err: impl Display) {
    tracing::warn!(
        env = DEBUG_DELAY_ENV,
        value = %raw,
        error = %err,
        "Invalid debug fetch delay"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_parsing() {
        assert_eq!(parse_delay(""), None);
        assert_eq!(parse_delay("0"), None);
        assert_eq!(parse_delay(" 250 "), Some(Duration::from_millis(250)));
        assert_eq!(parse_delay("soon"), None);
    }

    #[tokio::test]
    async fn passes_through_the_result() {
        let ok: Result<u8, String> = send_store_request(
            tracing::trace_span!("test"),
            || async { Ok(7) },
            |e: &String| e.clone(),
        )
        .await;
        assert_eq!(ok, Ok(7));

        let err: Result<u8, String> = send_store_request(
            tracing::trace_span!("test"),
            || async { Err("boom".to_string()) },
            |e: &String| e.clone(),
        )
        .await;
        assert_eq!(err, Err("boom".to_string()));
    }
}
