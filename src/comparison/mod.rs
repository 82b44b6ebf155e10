//! Cross-station comparison of the latest historical windows.

pub mod engine;
