use std::path::PathBuf;

use clap::{crate_authors, crate_description, crate_name, crate_version, Parser};
use tactical_hud::config::{Config, SourceKind};

/// CLI options
#[derive(Parser, Debug)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// Configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Position and heading source.
    #[clap(short = 's', long, value_enum)]
    pub source: Option<SourceKind>,
    /// Latitude of the simulated or fixed source.
    #[clap(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude of the simulated or fixed source.
    #[clap(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// gpsd address, selects the gpsd source unless --source is given.
    #[clap(long)]
    pub gpsd: Option<String>,
    /// GeoJSON directory.
    #[clap(short = 'd', long)]
    pub data_dir: Option<PathBuf>,
    /// Log filter, e.g. "debug" or "tactical_hud=trace".
    #[clap(short = 'l', long)]
    pub log_level: Option<String>,
    /// Screen rotation added to the heading, in degrees.
    #[clap(short = 'r', long, allow_negative_numbers = true)]
    pub rotation: Option<f64>,
    /// Skip the standby screen.
    #[clap(short = 'a', long)]
    pub autostart: bool,
}

impl Opts {
    /// Command-line flags win over the configuration file
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(addr) = &self.gpsd {
            cfg.sensor.gpsd = addr.clone();
            cfg.sensor.source = SourceKind::Gpsd;
        }
        if let Some(source) = self.source {
            cfg.sensor.source = source;
        }
        if let Some(lat) = self.lat {
            cfg.sensor.lat = lat;
        }
        if let Some(lng) = self.lng {
            cfg.sensor.lng = lng;
        }
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(rotation) = self.rotation {
            cfg.rotation = rotation;
        }
    }
}
