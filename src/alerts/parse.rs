//! Turning model output into alerts.
//!
//! The model is asked for schema-constrained JSON but the text is still
//! untrusted: anything that does not parse is logged and dropped.

use crate::model::HfcAlert;
use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct HistoryItem {
    area: String,
    time: String,
    date: String,
    #[serde(rename = "type")]
    alert_type: String,
}

#[derive(Debug, Deserialize)]
struct RealtimeItem {
    area: String,
    #[serde(rename = "type")]
    alert_type: String,
}

/// Strip a Markdown code fence if the model wrapped its JSON in one
fn json_body(text: &str) -> &str {
    let t = text.trim();
    match (t.find('['), t.rfind(']')) {
        (Some(start), Some(end)) if start < end => &t[start..=end],
        _ => t,
    }
}

/// Parse the history answer. Ids are `hist-<idx>-<millis>`, all items share
/// the first grounding source. `None` when the answer is not an alert list.
pub fn parse_history<Tz: chrono::TimeZone>(
    text: &str,
    source_url: Option<&str>,
    now: DateTime<Tz>,
) -> Option<Vec<HfcAlert>> {
    let items: Vec<HistoryItem> = match serde_json::from_str(json_body(text)) {
        Ok(items) => items,
        Err(e) => {
            warn!("history answer is not an alert list: {e}");
            return None;
        }
    };
    let stamp = now.timestamp_millis();

    let alerts = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| HfcAlert {
            id: format!("hist-{idx}-{stamp}"),
            area: item.area,
            alert_type: item.alert_type,
            time: item.time,
            date: item.date,
            is_new: false,
            source_url: source_url.map(String::from),
        })
        .collect();
    Some(alerts)
}

/// Parse the real-time answer; only the first reported siren matters.
/// Time and date are stamped locally as `HH:MM` and `DD/MM/YYYY`.
pub fn parse_realtime(
    text: &str,
    source_url: Option<&str>,
    now: DateTime<Local>,
) -> Option<HfcAlert> {
    let items: Vec<RealtimeItem> = match serde_json::from_str(json_body(text)) {
        Ok(items) => items,
        Err(e) => {
            warn!("real-time answer is not an alert list: {e}");
            return None;
        }
    };
    let first = items.into_iter().next()?;

    Some(HfcAlert {
        id: format!("rt-{}", now.timestamp_millis()),
        area: first.area,
        alert_type: first.alert_type,
        time: now.format("%H:%M").to_string(),
        date: now.format("%d/%m/%Y").to_string(),
        is_new: true,
        source_url: source_url.map(String::from),
    })
}
