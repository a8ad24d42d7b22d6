pub mod settings;

pub use settings::{FilterSettings, HistorySettings};
