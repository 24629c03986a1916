//! Terminal UI: polls the reader and shows the last card read

mod app;
mod card_worker;
mod events;
mod screens;
mod ui;

pub use app::run_tui;
