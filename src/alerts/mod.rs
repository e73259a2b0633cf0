//! Alert feed and intel requests.
//!
//! Every request runs as a task on the tokio runtime and reports back through
//! the application event channel; the UI never waits on the network.

pub mod parse;
pub mod prompts;

use crate::event::{AppEvent, EventSender, IntelResult};
use crate::genai::{GenerateRequest, GenerativeModel};
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Hand a result to the UI loop; false once the UI is gone
fn report(events: &EventSender, event: AppEvent) -> bool {
    if events.send(event).is_err() {
        debug!("event channel closed, dropping result");
        return false;
    }
    true
}

/// Fetch the recent alert history once
pub async fn fetch_history(model: &dyn GenerativeModel, events: &EventSender) {
    if !report(events, AppEvent::HistoryStarted) {
        return;
    }

    let request = GenerateRequest::new(prompts::history(Utc::now()))
        .with_search()
        .with_schema(prompts::history_schema());

    let result = match model.generate(request).await {
        Ok(resp) => {
            let alerts = parse::parse_history(&resp.text, resp.first_source(), Local::now());
            if let Some(alerts) = &alerts {
                info!("history: {} alerts", alerts.len());
            }
            alerts
        }
        Err(e) => {
            error!("history fetch failed: {e}");
            None
        }
    };
    report(events, AppEvent::History(result));
}

/// Ask once for live sirens; reports only when one is active
pub async fn poll_realtime(model: &dyn GenerativeModel, events: &EventSender) {
    let request = GenerateRequest::new(prompts::realtime())
        .with_search()
        .with_schema(prompts::realtime_schema());

    match model.generate(request).await {
        Ok(resp) => {
            if let Some(alert) = parse::parse_realtime(&resp.text, resp.first_source(), Local::now())
            {
                warn!("live alert: {} / {}", alert.area, alert.alert_type);
                report(events, AppEvent::RealTimeAlert(alert));
            } else {
                debug!("no live alerts");
            }
        }
        Err(e) => warn!("real-time poll error: {e}"),
    }
}

/// Sitrep for one sector
pub async fn fetch_intel(
    model: &dyn GenerativeModel,
    events: &EventSender,
    threat_id: String,
    sector: String,
) {
    let request = GenerateRequest::new(prompts::intel(&sector)).with_search();

    let result = match model.generate(request).await {
        Ok(resp) => {
            let text = if resp.text.trim().is_empty() {
                "NO RECENT DATA.".to_string()
            } else {
                resp.text
            };
            Some(IntelResult {
                text,
                sources: resp.sources,
            })
        }
        Err(e) => {
            error!("intel for {sector} failed: {e}");
            None
        }
    };
    report(
        events,
        AppEvent::Intel {
            threat_id,
            report: result,
        },
    );
}

/// Hebrew rendition of a threat's report
pub async fn translate(
    model: &dyn GenerativeModel,
    events: &EventSender,
    threat_id: String,
    text: String,
) {
    let result = match model.generate(GenerateRequest::new(prompts::translate(&text))).await {
        Ok(resp) => Some(resp.text),
        Err(e) => {
            warn!("translation failed: {e}");
            None
        }
    };
    report(
        events,
        AppEvent::Translation {
            threat_id,
            text: result,
        },
    );
}

/// Spawns alert work onto the runtime
#[derive(Clone)]
pub struct AlertService {
    model: Arc<dyn GenerativeModel>,
    events: EventSender,
    poll_every: Duration,
    runtime: Handle,
}

impl AlertService {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        events: EventSender,
        poll_every: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            model,
            events,
            poll_every,
            runtime,
        }
    }

    pub fn fetch_history(&self) -> JoinHandle<()> {
        let model = self.model.clone();
        let events = self.events.clone();
        self.runtime
            .spawn(async move { fetch_history(model.as_ref(), &events).await })
    }

    /// Poll for live sirens every interval; the first poll is one interval in
    pub fn start_polling(&self) -> JoinHandle<()> {
        let model = self.model.clone();
        let events = self.events.clone();
        let period = self.poll_every;
        self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.is_closed() {
                    break;
                }
                poll_realtime(model.as_ref(), &events).await;
            }
        })
    }

    pub fn request_intel(&self, threat_id: &str, sector: &str) -> JoinHandle<()> {
        let model = self.model.clone();
        let events = self.events.clone();
        let (threat_id, sector) = (threat_id.to_string(), sector.to_string());
        self.runtime.spawn(async move {
            fetch_intel(model.as_ref(), &events, threat_id, sector).await
        })
    }

    pub fn request_translation(&self, threat_id: &str, text: &str) -> JoinHandle<()> {
        let model = self.model.clone();
        let events = self.events.clone();
        let (threat_id, text) = (threat_id.to_string(), text.to_string());
        self.runtime.spawn(async move {
            translate(model.as_ref(), &events, threat_id, text).await
        })
    }
}
