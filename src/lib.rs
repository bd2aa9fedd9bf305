// The binary in main.rs and the criterion benchmarks both build on this
// module tree.

pub mod app;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod event;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
pub mod words;
