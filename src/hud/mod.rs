//! Heads-up display
//!
//! Runs on the main thread. Each tick takes a non-blocking snapshot of
//! the shared vision state, paints bounding boxes over the video
//! texture, and drains dialogue events into the status indicator and
//! transcript panel. Producers are never blocked by rendering.

mod theme;

pub use theme::Theme;

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use chrono::{DateTime, Local};
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Vec2};

use crate::dialogue::{DialogueEvent, DialogueStatus, Speaker};
use crate::vision::{Detection, Frame, VisionState};
use crate::{Error, Result};

/// Repaint cadence for the presentation tick
const TICK: Duration = Duration::from_millis(33);

/// One transcript line
struct TranscriptLine {
    sender: Speaker,
    text: String,
    timestamp: DateTime<Local>,
}

/// The HUD application state
pub struct HudApp {
    vision: Arc<VisionState>,
    events: Receiver<DialogueEvent>,
    theme: Theme,
    status: DialogueStatus,
    transcript: Vec<TranscriptLine>,
    texture: Option<egui::TextureHandle>,
}

impl HudApp {
    /// Create the HUD over the shared vision state and dialogue events
    #[must_use]
    pub fn new(vision: Arc<VisionState>, events: Receiver<DialogueEvent>, theme: Theme) -> Self {
        Self {
            vision,
            events,
            theme,
            status: DialogueStatus::Idle,
            transcript: Vec::new(),
            texture: None,
        }
    }

    /// Drain pending dialogue events without blocking
    fn drain_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                DialogueEvent::Status(status) => self.status = status,
                DialogueEvent::Message {
                    sender,
                    text,
                    timestamp,
                } => self.transcript.push(TranscriptLine {
                    sender,
                    text,
                    timestamp,
                }),
                DialogueEvent::ShutdownRequested => {
                    tracing::info!("shutdown requested from dialogue");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    /// Tint for the status indicator background
    fn status_fill(&self) -> Color32 {
        match self.status {
            DialogueStatus::Listening => Color32::from_rgb(0x00, 0x44, 0x00),
            DialogueStatus::Speaking => Color32::from_rgb(0x00, 0x00, 0x44),
            DialogueStatus::Idle | DialogueStatus::Processing => {
                Color32::from_rgb(0x00, 0x33, 0x33)
            }
        }
    }

    /// Paint the latest frame with detection overlays
    fn show_video(&mut self, ui: &mut egui::Ui, frame: &Frame, detections: &[Detection]) {
        let size = [frame.width as usize, frame.height as usize];
        let image = egui::ColorImage::from_rgb(size, &frame.data);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ui.ctx()
                        .load_texture("camera", image, egui::TextureOptions::LINEAR));
            }
        }
        let Some(texture) = &self.texture else {
            return;
        };

        // Fit the frame into the available area, preserving aspect ratio
        let available = ui.available_size();
        let frame_size = Vec2::new(frame.width as f32, frame.height as f32);
        let scale = (available.x / frame_size.x)
            .min(available.y / frame_size.y)
            .max(0.01);
        let draw_size = frame_size * scale;

        let (response, painter) = ui.allocate_painter(draw_size, Sense::hover());
        let origin = response.rect.min;

        painter.image(
            texture.id(),
            response.rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        for detection in detections {
            let bounds = detection.bounds;
            let rect = Rect::from_min_size(
                origin + Vec2::new(bounds.x as f32, bounds.y as f32) * scale,
                Vec2::new(bounds.width as f32, bounds.height as f32) * scale,
            );

            painter.rect_stroke(
                rect,
                egui::CornerRadius::ZERO,
                Stroke::new(2.0, self.theme.accent),
                StrokeKind::Middle,
            );

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percent = (detection.confidence * 100.0).round() as u32;
            painter.text(
                rect.min - Vec2::new(0.0, 2.0),
                Align2::LEFT_BOTTOM,
                format!("{} {}%", detection.label, percent),
                FontId::monospace(12.0),
                self.theme.accent,
            );
        }
    }

    /// One-line summary of current detections below the feed
    fn detection_summary(detections: &[Detection]) -> String {
        if detections.is_empty() {
            return "Scanning area...".to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        for detection in detections {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percent = (detection.confidence * 100.0).round() as u32;
            let part = format!("{} ({percent}%)", detection.label);
            if !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join("  ")
    }
}

impl eframe::App for HudApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        // One paired read per tick so the boxes always match the frame
        let snapshot = self.vision.snapshot();
        let detections = snapshot
            .as_ref()
            .map(|(_, detections)| detections.as_slice())
            .unwrap_or_default();

        egui::SidePanel::right("dialogue")
            .default_width(360.0)
            .frame(egui::Frame::default().fill(self.theme.background))
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(self.status.label())
                            .font(FontId::monospace(16.0))
                            .color(self.theme.text)
                            .background_color(self.status_fill()),
                    );
                });
                ui.add_space(8.0);
                ui.separator();

                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.transcript {
                            let color = match line.sender {
                                Speaker::User => self.theme.text,
                                Speaker::Assistant => self.theme.accent,
                                Speaker::System => Color32::GRAY,
                            };
                            ui.horizontal_wrapped(|ui| {
                                ui.label(
                                    egui::RichText::new(format!(
                                        "[{}]",
                                        line.timestamp.format("%H:%M:%S")
                                    ))
                                    .color(Color32::DARK_GRAY)
                                    .font(FontId::monospace(12.0)),
                                );
                                ui.label(
                                    egui::RichText::new(format!("{}:", line.sender.label()))
                                        .color(color)
                                        .strong(),
                                );
                                ui.label(egui::RichText::new(&line.text).color(self.theme.text));
                            });
                        }
                    });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(self.theme.background))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("VIGIL VISION FEED")
                            .font(FontId::monospace(18.0))
                            .color(self.theme.accent),
                    );
                });
                ui.add_space(4.0);
                match &snapshot {
                    Some((frame, detections)) => self.show_video(ui, frame, detections),
                    None => {
                        ui.centered_and_justified(|ui| {
                            ui.colored_label(self.theme.error, "NO SIGNAL - waiting for camera");
                        });
                    }
                }
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(Self::detection_summary(detections))
                        .font(FontId::monospace(12.0))
                        .color(Color32::GRAY),
                );
            });

        ctx.request_repaint_after(TICK);
    }
}

/// Run the HUD on the calling (main) thread until the window closes
///
/// # Errors
///
/// Returns error if the window cannot be created
pub fn run(
    vision: Arc<VisionState>,
    events: Receiver<DialogueEvent>,
    theme: Theme,
) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Vigil"),
        ..Default::default()
    };

    eframe::run_native(
        "Vigil",
        options,
        Box::new(move |_cc| Ok(Box::new(HudApp::new(vision, events, theme)))),
    )
    .map_err(|e| Error::Hud(e.to_string()))
}
