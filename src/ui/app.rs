use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use eframe::egui;

use crate::backend::Backend;
use crate::ops::timefmt::is_valid_hhmmss;
use crate::ops::urlcheck::is_valid_video_url;
use crate::types::job::{AppEvent, DownloadRequest};
use crate::types::session::{Session, ViewState};
use crate::types::video_info::{FormatType, Quality};
use crate::ui::trim_widget::TrimWidget;

/// Owns the currently installed thumbnail texture, if any. Each install
/// gets a fresh URI so the loader never serves a stale image.
#[derive(Default)]
struct ThumbnailSlot {
    uri: Option<String>,
    seq: usize,
}

impl ThumbnailSlot {
    fn install(&mut self, ctx: &egui::Context, bytes: Vec<u8>) {
        self.clear(ctx);
        self.seq += 1;
        let uri = format!("bytes://thumbnail-{}", self.seq);
        ctx.include_bytes(uri.clone(), bytes);
        self.uri = Some(uri);
    }

    fn clear(&mut self, ctx: &egui::Context) {
        if let Some(uri) = self.uri.take() {
            ctx.forget_image(&uri);
        }
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

/// Routes one worker event. Image bytes become a texture here; the
/// session never touches them. Fresh metadata drops whatever thumbnail
/// the previous video installed, since its own image may never arrive.
fn route_event(
    session: &mut Session,
    thumbnail: &mut ThumbnailSlot,
    ctx: &egui::Context,
    event: AppEvent,
) {
    match event {
        AppEvent::Thumbnail(bytes) => thumbnail.install(ctx, bytes),
        AppEvent::InfoFetched(info) => {
            thumbnail.clear(ctx);
            session.apply_event(AppEvent::InfoFetched(info));
        }
        other => session.apply_event(other),
    }
}

/// The control panel: one session at a time, fed by events from the
/// backend's worker threads.
pub struct SnipdlApp {
    session: Session,
    backend: Arc<dyn Backend>,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    thumbnail: ThumbnailSlot,
}

impl SnipdlApp {
    pub fn new(cc: &eframe::CreationContext<'_>, backend: Arc<dyn Backend>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            session: Session::new(),
            backend,
            events_tx,
            events_rx,
            thumbnail: ThumbnailSlot::default(),
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events_rx.try_recv() {
            route_event(&mut self.session, &mut self.thumbnail, ctx, event);
        }
    }

    fn fetch_info(&mut self) {
        let url = self.session.url.trim().to_string();
        if url.is_empty() {
            self.session.show_error("Please enter a video URL".to_string());
            return;
        }
        if !is_valid_video_url(&url) {
            self.session
                .show_error("Please enter a valid video URL".to_string());
            return;
        }

        self.session.fetching = true;
        self.session.error = None;
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        thread::spawn(move || match backend.fetch_info(&url) {
            Ok(info) => {
                let thumbnail_url = info.thumbnail.clone();
                let _ = events.send(AppEvent::InfoFetched(info));
                if !thumbnail_url.is_empty() {
                    match backend.fetch_thumbnail(&thumbnail_url) {
                        Ok(bytes) => {
                            let _ = events.send(AppEvent::Thumbnail(bytes));
                        }
                        // info still renders fine without the image
                        Err(err) => log::warn!("thumbnail fetch failed: {err}"),
                    }
                }
            }
            Err(err) => {
                let _ = events.send(AppEvent::InfoFailed(err.to_string()));
            }
        });
    }

    fn start_download(&mut self) {
        let start = self.session.start_time_text.trim().to_string();
        let end = self.session.end_time_text.trim().to_string();
        for (label, value) in [("start", &start), ("end", &end)] {
            if !value.is_empty() && !is_valid_hhmmss(value) {
                self.session
                    .show_error(format!("Invalid {label} time, use HH:MM:SS"));
                return;
            }
        }

        let request = DownloadRequest {
            url: self.session.url.trim().to_string(),
            quality: self.session.quality,
            format_type: self.session.format_type,
            start_time: (!start.is_empty()).then_some(start),
            end_time: (!end.is_empty()).then_some(end),
        };
        match self.backend.start_download(request, self.events_tx.clone()) {
            Ok(job) => self.session.begin_download(job),
            Err(err) => self.session.show_error(err.to_string()),
        }
    }

    fn save_artifact(&mut self) {
        let Some(job) = self.session.job_id.clone() else {
            return;
        };
        let Some(source) = self.backend.artifact_path(&job) else {
            self.session
                .show_error("The downloaded file is no longer available".to_string());
            return;
        };
        let file_name = self
            .session
            .finished_file
            .clone()
            .unwrap_or_else(|| "download".to_string());
        if let Some(target) = rfd::FileDialog::new()
            .set_file_name(file_name.as_str())
            .save_file()
        {
            if let Err(err) = std::fs::copy(&source, &target) {
                self.session
                    .show_error(format!("Could not save file: {err}"));
            } else {
                log::info!("saved {} to {}", source.display(), target.display());
            }
        }
    }

    fn url_section(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.session.url)
                    .hint_text("Paste a video URL")
                    .desired_width(ui.available_width() - 130.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
            if ui
                .add_enabled(!self.session.fetching, egui::Button::new("Get Video Info"))
                .clicked()
            {
                submit = true;
            }
        });
        if self.session.fetching {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Fetching video info...");
            });
        }
        if submit && !self.session.fetching {
            self.fetch_info();
        }
    }

    fn info_section(&self, ui: &mut egui::Ui) {
        let Some(info) = &self.session.info else {
            return;
        };
        ui.horizontal(|ui| {
            if let Some(uri) = self.thumbnail.uri() {
                ui.add(egui::Image::from_uri(uri.to_string()).max_width(160.0));
            }
            ui.vertical(|ui| {
                ui.strong(info.title.as_str());
                ui.label(info.uploader.as_str());
                ui.label(format!("Duration: {}", info.duration));
            });
        });
    }

    fn options_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        egui::ComboBox::from_label("Format")
            .selected_text(self.session.format_type.label())
            .show_ui(ui, |ui| {
                for format in [FormatType::Video, FormatType::Audio] {
                    ui.selectable_value(&mut self.session.format_type, format, format.label());
                }
            });
        if self.session.format_type == FormatType::Video {
            egui::ComboBox::from_label("Quality")
                .selected_text(self.session.quality.label())
                .show_ui(ui, |ui| {
                    for quality in Quality::ALL {
                        ui.selectable_value(&mut self.session.quality, quality, quality.label());
                    }
                });
        }

        if self.session.trim.duration_seconds > 0.0 {
            ui.separator();
            ui.label("Trim (optional)");
            TrimWidget::new(
                &mut self.session.trim,
                &mut self.session.start_time_text,
                &mut self.session.end_time_text,
                &mut self.session.show_manual_inputs,
            )
            .show(ui);
        }

        ui.add_space(8.0);
        if ui.button("Download").clicked() {
            self.start_download();
        }
    }

    fn progress_section(&self, ui: &mut egui::Ui) {
        let progress = self.session.progress.clone().unwrap_or_default();
        ui.separator();
        ui.add(
            egui::ProgressBar::new((progress.percent / 100.0) as f32)
                .show_percentage()
                .animate(true),
        );
        ui.label(self.session.status_line.as_str());
        ui.horizontal(|ui| {
            ui.label(format!("Speed: {}", progress.speed));
            ui.separator();
            ui.label(format!("ETA: {}", progress.eta));
        });
    }

    fn complete_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.strong("Download complete");
        if let Some(file) = &self.session.finished_file {
            ui.label(file.as_str());
        }
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Save File").clicked() {
                self.save_artifact();
            }
            if ui.button("Download Another").clicked() {
                let ctx = ui.ctx().clone();
                self.thumbnail.clear(&ctx);
                self.session.reset();
            }
        });
    }

    fn error_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        if let Some(message) = &self.session.error {
            ui.colored_label(egui::Color32::from_rgb(230, 100, 100), message.as_str());
        }
        ui.add_space(8.0);
        if ui.button("Try Again").clicked() {
            self.session.error = None;
            self.session.view = if self.session.info.is_some() {
                ViewState::InfoLoaded
            } else {
                ViewState::Idle
            };
        }
    }
}

impl eframe::App for SnipdlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Video Downloader");
            ui.add_space(8.0);

            match self.session.view {
                ViewState::Idle => self.url_section(ui),
                ViewState::InfoLoaded => {
                    self.url_section(ui);
                    ui.add_space(8.0);
                    self.info_section(ui);
                    self.options_section(ui);
                }
                ViewState::Downloading => {
                    self.info_section(ui);
                    self.progress_section(ui);
                }
                ViewState::Complete => {
                    self.info_section(ui);
                    self.complete_section(ui);
                }
                ViewState::Error => self.error_section(ui),
            }
        });

        // Worker events arrive between frames; keep polling while any
        // background work is outstanding.
        if self.session.fetching || self.session.view == ViewState::Downloading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
