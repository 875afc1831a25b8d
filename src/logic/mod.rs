pub mod action;
pub mod forecast_series;
pub mod notes;
pub mod sequencer;
pub mod service;
pub mod summary;
pub mod weather_summary;

pub use action::{classify_action, ActionStyle};
pub use notes::{parse_notes, NoteKind, ParsedNote};
pub use service::{Dashboard, FetchHandle, IrrigationService, LoadState};
pub use summary::{summarize, FarmSummary};
pub use weather_summary::{parse_weather_summary, ParsedWeatherSummary};
