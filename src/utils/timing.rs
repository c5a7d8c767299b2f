use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::utils::logging::TIMING_TARGET;

#[derive(Debug)]
pub struct PhotoTimer {
    style: String,
    photo: usize,
    source: String,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl PhotoTimer {
    pub fn new(style: &str, photo: usize, source: &str) -> Self {
        PhotoTimer {
            style: style.to_string(),
            photo,
            source: source.to_string(),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_started(&self) {
        info!(
            target: TIMING_TARGET,
            "event=photo_started style={} photo={} source={:?} started_at={}",
            self.style,
            self.photo,
            self.source,
            self.started_at.to_rfc3339()
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=photo_completed style={} photo={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.style,
            self.photo,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_photo_timer(style: &str, photo: usize, source: &str) -> PhotoTimer {
    let timer = PhotoTimer::new(style, photo, source);
    timer.log_started();
    timer
}

pub fn complete_photo_timer(timer: &mut PhotoTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::*;

    struct TargetRecorder(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for TargetRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0
                .lock()
                .unwrap()
                .push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn photo_events_use_the_timing_target() {
        let targets = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(TargetRecorder(targets.clone()));
        tracing::subscriber::with_default(subscriber, || {
            let mut timer = start_photo_timer("newyork", 2, "b.png");
            complete_photo_timer(&mut timer, "success", None);
        });

        let targets = targets.lock().unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|target| target == TIMING_TARGET));
    }

    #[tokio::test]
    async fn timing_wrapper_passes_result_through() {
        let ok: Result<u8, String> = log_llm_timing("gemini", "m", "op", None, || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<u8, String> =
            log_llm_timing("gemini", "m", "op", None, || async { Err("boom".to_string()) }).await;
        assert_eq!(err, Err("boom".to_string()));
    }

    #[test]
    fn photo_timer_completes_once() {
        let mut timer = PhotoTimer::new("japanese", 1, "a.jpg");
        complete_photo_timer(&mut timer, "error", Some("no image".to_string()));
        assert!(timer.completed);
        assert_eq!(timer.status, "error");
        timer.log_completed();
        assert!(timer.completed);
    }
}
