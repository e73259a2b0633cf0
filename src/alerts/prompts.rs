use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// Last 48 hours of Home Front Command alerts
pub fn history(now: DateTime<Utc>) -> String {
    format!(
        "Search for official Home Front Command (Pikud HaOref) alert history in Israel from the last 48 hours.\n\
         Only include REAL, verified alerts. Extract the last 15.\n\
         Return JSON list. Each item MUST have 'area', 'time', 'date', 'type'.\n\
         Current System Time: {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Sirens active right now
pub fn realtime() -> String {
    "Check Home Front Command (Pikud HaOref) or official Israeli news for ANY active rocket sirens or security events in the last 10 minutes.\n\
     If NO sirens are active, return an empty JSON array [].\n\
     Do NOT hallucinate or return old alerts.\n\
     Return ONLY valid JSON for current alerts."
        .to_string()
}

/// Short sitrep for a sector
pub fn intel(sector: &str) -> String {
    format!(
        "Provide a factual, military sitrep for the {sector} border sector from the last 24 hours. \
         Cite specific events if they occurred. Under 80 words."
    )
}

pub fn translate(report: &str) -> String {
    format!(
        "Translate the following military report to Hebrew. Ensure professional terminology:\n\n{report}"
    )
}

fn alert_array_schema(required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = required
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        }
    })
}

pub fn history_schema() -> Value {
    alert_array_schema(&["area", "time", "date", "type"])
}

pub fn realtime_schema() -> Value {
    alert_array_schema(&["area", "type"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_prompt_carries_time() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();
        let p = history(now);
        assert!(p.contains("last 48 hours"));
        assert!(p.contains("2026-10-17T08:30:00.000Z"));
    }

    #[test]
    fn test_intel_prompt() {
        assert!(intel("Gaza").contains("the Gaza border sector"));
    }

    #[test]
    fn test_schemas() {
        let h = history_schema();
        assert_eq!(h["type"], "ARRAY");
        assert_eq!(h["items"]["required"], json!(["area", "time", "date", "type"]));
        assert_eq!(h["items"]["properties"]["date"]["type"], "STRING");

        let r = realtime_schema();
        assert_eq!(r["items"]["required"], json!(["area", "type"]));
        assert!(r["items"]["properties"].get("time").is_none());
    }
}
