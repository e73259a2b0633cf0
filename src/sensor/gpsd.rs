//! gpsd client.
//!
//! gpsd speaks newline-delimited JSON over TCP. After `?WATCH` it streams
//! `TPV` (time/position/velocity) and, when a compass is attached, `ATT`
//! (attitude) reports. Everything else is ignored.

use super::SensorReading;
use crate::error::SensorError;
use crate::event::EventSender;
use crate::geo::Coordinate;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

const WATCH: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum Report {
    #[serde(rename = "TPV")]
    Tpv {
        #[serde(default)]
        mode: u8,
        lat: Option<f64>,
        lon: Option<f64>,
        eph: Option<f64>,
        epx: Option<f64>,
        epy: Option<f64>,
    },
    #[serde(rename = "ATT")]
    Att {
        heading: Option<f64>,
        yaw: Option<f64>,
    },
    #[serde(other)]
    Other,
}

/// Decode one gpsd line. Reports without a usable fix yield nothing.
pub fn decode(line: &str) -> Result<Vec<SensorReading>, SensorError> {
    let report: Report = serde_json::from_str(line)?;
    let readings = match report {
        // mode 2 = 2D fix, 3 = 3D fix
        Report::Tpv {
            mode,
            lat: Some(lat),
            lon: Some(lon),
            eph,
            epx,
            epy,
        } if mode >= 2 => {
            let accuracy_m = eph.or(match (epx, epy) {
                (Some(x), Some(y)) => Some(x.max(y)),
                (x, y) => x.or(y),
            });
            vec![SensorReading::Position {
                coord: Coordinate::new(lat, lon),
                accuracy_m,
            }]
        }
        Report::Att { heading, yaw } if heading.is_some() || yaw.is_some() => {
            vec![SensorReading::Orientation {
                compass: heading,
                alpha: yaw,
            }]
        }
        _ => Vec::new(),
    };
    Ok(readings)
}

/// Stream one gpsd session until the connection drops
async fn session(addr: &str, events: &EventSender) -> Result<(), SensorError> {
    let mut stream = TcpStream::connect(addr).await?;
    info!("connected to gpsd at {addr}");
    stream.write_all(WATCH).await?;

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        match decode(&line) {
            Ok(readings) => {
                for reading in readings {
                    if events.send(reading.into_event()).is_err() {
                        return Ok(());
                    }
                }
            }
            Err(e) => debug!("skipping gpsd line: {e}"),
        }
    }
    Err(SensorError::Closed(addr.to_string()))
}

/// Keep a gpsd session alive, reconnecting after `retry`
pub async fn run(addr: String, retry: Duration, events: EventSender) {
    loop {
        if let Err(e) = session(&addr, &events).await {
            warn!("{e}");
            if events.send(super::error_event(&e)).is_err() {
                break;
            }
        }
        if events.is_closed() {
            break;
        }
        tokio::time::sleep(retry).await;
    }
}
