// src/gui.rs
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use eframe::egui;
use egui::{Color32, Pos2, Rounding, Stroke, Vec2};
use log::{error, info, warn};
use crate::config::MonitorConfig;
use crate::console::ConsoleLog;
use crate::engine::{self, ReaderHandle};
use crate::protocol::ChannelRegistry;
use crate::router;
use crate::scope::{LineSegment, Oscilloscope, CANVAS_HEIGHT_PX};
use crate::types::*;
/// Width divisor/multiplier per wheel notch.
const ZOOM_STEP: f64 = 1.2;
/// Scroll distance egui reports for one wheel notch.
const WHEEL_NOTCH_POINTS: f64 = 50.0;
const TRACE_COLOR: Color32 = Color32::from_rgb(176, 196, 222);
/// Slack on top of the read timeout for a stopped reader to close its port.
const READER_EXIT_MARGIN: Duration = Duration::from_millis(100);
pub struct SerialMonitorApp {
    config: MonitorConfig,
    connection_mode: ConnectionMode,
    // mode of the running session; the selector only applies to the next connect
    session_mode: Option<ConnectionMode>,
    is_connected: bool,
    channels: ChannelRegistry,
    console: ConsoleLog,
    scope: Oscilloscope,
    // one channel per session, so a stopped reader can't leak into the next one
    rx: Option<Receiver<MonitorEvent>>,
    reader: Option<ReaderHandle>,
    // stopped but possibly still holding the port
    stopping: Option<ReaderHandle>,
    // drawing surface: replaced whenever the scope generation or canvas width changes
    segments: Vec<LineSegment>,
    rendered_for: Option<(u64, f32)>,
}
impl SerialMonitorApp {
    pub fn new(config: MonitorConfig) -> Self {
        let mut app = Self {
            connection_mode: config.mode,
            session_mode: None,
            is_connected: false,
            channels: ChannelRegistry::new(),
            console: ConsoleLog::with_capacity(config.console_lines),
            scope: Oscilloscope::new(config.max_retained_samples),
            rx: None,
            reader: None,
            stopping: None,
            segments: Vec::new(),
            rendered_for: None,
            config,
        };
        app.connect();
        app
    }
    fn connect(&mut self) {
        self.disconnect();
        if let Some(old) = self.stopping.take() {
            let grace = Duration::from_millis(self.config.poll_interval_ms) + READER_EXIT_MARGIN;
            if !old.wait_stopped(grace) {
                warn!("previous reader still running, the port may be busy");
            }
        }
        self.scope = Oscilloscope::new(self.config.max_retained_samples);
        self.rendered_for = None;
        self.channels = ChannelRegistry::new();
        let (tx, rx) = channel();
        match engine::spawn_reader(&self.config, self.connection_mode, tx) {
            Ok(handle) => {
                info!("session started in {:?} mode", self.connection_mode);
                self.reader = Some(handle);
                self.rx = Some(rx);
                self.session_mode = Some(self.connection_mode);
            }
            Err(e) => {
                error!("{e:#}");
                self.console.push(format!("Failed to start reader: {e:#}"));
            }
        }
    }
    fn disconnect(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop();
            self.console.push("Disconnected");
            self.stopping = Some(reader);
        }
        self.session_mode = None;
        self.rx = None;
        self.is_connected = false;
    }
    fn drain_events(&mut self) {
        let Some(rx) = self.rx.take() else {
            return;
        };
        let mut keep = true;
        while let Ok(event) = rx.try_recv() {
            match event {
                MonitorEvent::Log(s) => self.console.push(s),
                MonitorEvent::Status(b) => self.is_connected = b,
                MonitorEvent::Message(message) => {
                    router::route(&message, &mut self.console, &mut self.scope)
                }
                MonitorEvent::Channels(channels) => self.channels = channels,
                MonitorEvent::SessionEnded(reason) => {
                    self.console.push(format!("Connection lost: {reason}"));
                    self.is_connected = false;
                    self.session_mode = None;
                    self.stopping = self.reader.take();
                    keep = false;
                    break;
                }
            }
        }
        if keep {
            self.rx = Some(rx);
        }
    }
    fn refresh_segments(&mut self, width: f32) {
        let key = (self.scope.generation(), width);
        if self.rendered_for != Some(key) {
            self.segments = self.scope.render(f64::from(width)).collect();
            self.rendered_for = Some(key);
        }
    }
    fn draw_oscilloscope(&mut self, ui: &mut egui::Ui) {
        let size = Vec2::new(ui.available_width(), CANVAS_HEIGHT_PX as f32);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let rect = response.rect;
        // 1. input: wheel zooms around the cursor, drag pans
        if let Some(pointer) = response.hover_pos() {
            let scroll = ui.input(|i| i.scroll_delta.y);
            if scroll != 0.0 {
                let ratio = f64::from((pointer.x - rect.left()) / rect.width());
                let factor = ZOOM_STEP.powf(-f64::from(scroll) / WHEEL_NOTCH_POINTS);
                self.scope.zoom_around(ratio, factor);
            }
        }
        let drag = response.drag_delta().x;
        if drag != 0.0 && rect.width() > 0.0 {
            let secs_per_px = self.scope.viewport().width_secs / f64::from(rect.width());
            self.scope.pan_by(-f64::from(drag) * secs_per_px);
        }
        // 2. replace-all redraw of the visible segments
        self.refresh_segments(rect.width());
        painter.rect_filled(rect, Rounding::same(4.0), Color32::from_rgb(10, 10, 15));
        let stroke = Stroke::new(1.0, TRACE_COLOR);
        let to_screen = |x: f64, y: f64| Pos2::new(rect.left() + x as f32, rect.top() + y as f32);
        for seg in &self.segments {
            painter.line_segment([to_screen(seg.x1, seg.y1), to_screen(seg.x2, seg.y2)], stroke);
        }
        let viewport = self.scope.viewport();
        let font = egui::FontId::monospace(11.0);
        painter.text(
            rect.left_bottom() + Vec2::new(4.0, -4.0),
            egui::Align2::LEFT_BOTTOM,
            format!("{:.6}s", viewport.start_secs),
            font.clone(),
            Color32::GRAY,
        );
        painter.text(
            rect.right_bottom() + Vec2::new(-4.0, -4.0),
            egui::Align2::RIGHT_BOTTOM,
            format!("{:.6}s", viewport.end_secs()),
            font,
            Color32::GRAY,
        );
    }
    fn draw_scroll_bar(&mut self, ui: &mut egui::Ui) {
        let (min, max) = (self.scope.min_time(), self.scope.max_time());
        let mut value = self.scope.scroll_value();
        ui.spacing_mut().slider_width = ui.available_width();
        let slider = egui::Slider::new(&mut value, min..=max).show_value(false);
        if ui.add(slider).changed() {
            self.scope.set_scroll_value(value);
        }
    }
}
impl eframe::App for SerialMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. events from the reader, in arrival order
        self.drain_events();
        if self.reader.is_some() {
            ctx.request_repaint_after(Duration::from_millis(30));
        }
        // 2. UI
        egui::SidePanel::left("console").min_width(320.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Serial Scope");
            ui.separator();
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Hardware, "SERIAL");
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulation, "SIM");
            });
            let session_running = self.reader.is_some();
            let btn_txt = if session_running { "DISCONNECT" } else { "CONNECT" };
            if ui.button(btn_txt).clicked() {
                if session_running {
                    self.disconnect();
                } else {
                    self.connect();
                }
            }
            ui.label(status_line(self.is_connected, self.session_mode, &self.config));
            if self.scope.store().is_empty() {
                ui.label("No waveform data yet");
            } else {
                ui.label(format!(
                    "{} sequences, {} samples",
                    self.scope.store().len(),
                    self.scope.store().total_samples()
                ));
            }
            if !self.channels.is_empty() {
                ui.label(format!("Channels ({}):", self.channels.len()));
                for (id, name) in self.channels.iter() {
                    ui.monospace(format!("  {id}: {name}"));
                }
            }
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(format!("Console ({} lines)", self.console.len()));
                if ui.small_button("Copy").clicked() {
                    let text = self.console.text();
                    ui.output_mut(|o| o.copied_text = text);
                }
            });
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if self.console.is_empty() {
                        ui.weak("(no output)");
                    }
                    for line in self.console.lines() {
                        ui.monospace(line);
                    }
                });
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("Oscilloscope (wheel: zoom, drag: pan)");
            self.draw_oscilloscope(ui);
            self.draw_scroll_bar(ui);
        });
    }
}
fn status_line(connected: bool, session_mode: Option<ConnectionMode>, config: &MonitorConfig) -> String {
    match (connected, session_mode) {
        (true, Some(ConnectionMode::Hardware)) => {
            format!("Connected to {} @ {}", config.port_name, config.baud_rate)
        }
        (true, Some(ConnectionMode::Simulation)) => "Connected to simulator".to_owned(),
        (false, Some(_)) => "Connecting...".to_owned(),
        (_, None) => "Not connected".to_owned(),
    }
}
