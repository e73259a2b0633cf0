//! Terminal tactical radar HUD.
//!
//! A braille map rotated to the compass heading, the user's position with
//! range rings, distances to monitored sectors, and a Home Front Command
//! alert feed summarized by a search-grounded generative model.

pub mod alerts;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod event;
pub mod genai;
pub mod geo;
pub mod hash;
pub mod logging;
pub mod map;
pub mod model;
pub mod sensor;
pub mod ui;
