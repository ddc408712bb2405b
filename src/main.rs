// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod console;
mod engine;
mod gui;
mod logutil;
mod protocol;
mod router;
mod scope;
mod simulator;
mod types;
use anyhow::anyhow;
use eframe::egui;
use log::info;
use crate::config::{MonitorConfig, DEFAULT_CONFIG_PATH};
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = MonitorConfig::load_or_default(&path)?;
    info!("config: {config:?}");
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 520.0])
        .with_min_inner_size([800.0, 420.0])
        .with_title("Serial Scope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Serial Scope",
        options,
        Box::new(move |_cc| Box::new(gui::SerialMonitorApp::new(config))),
    )
    .map_err(|e| anyhow!("GUI failed: {e}"))
}
