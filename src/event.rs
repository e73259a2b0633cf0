use crate::genai::GroundingSource;
use crate::geo::Coordinate;
use crate::model::HfcAlert;
use tokio::sync::mpsc;

/// Everything background tasks report back to the UI loop
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// New position fix, accuracy radius in meters when known
    Position {
        coord: Coordinate,
        accuracy_m: Option<f64>,
    },
    /// Normalized compass heading
    Heading(f64),
    /// Sensor failure, shown on the error line
    SensorError(String),
    /// A history fetch started
    HistoryStarted,
    /// A history fetch finished; `None` when it failed
    History(Option<Vec<HfcAlert>>),
    /// A live siren was reported
    RealTimeAlert(HfcAlert),
    /// Intel report for a threat; `None` when the request failed
    Intel {
        threat_id: String,
        report: Option<IntelResult>,
    },
    /// Translation of a threat's report; `None` when it failed
    Translation {
        threat_id: String,
        text: Option<String>,
    },
}

/// Payload of a successful intel request
#[derive(Clone, Debug, PartialEq)]
pub struct IntelResult {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
