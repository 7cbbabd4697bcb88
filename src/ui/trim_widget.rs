use eframe::egui::{self, StrokeKind};

use crate::ops::timefmt::{format_time, normalize_bare_seconds};
use crate::types::trim::{Handle, TrimSelector};

// Layout constants
const TOOLTIP_HEIGHT: f32 = 18.0;
const TRACK_HEIGHT: f32 = 14.0;
const MARKER_LABEL_HEIGHT: f32 = 16.0;
const HANDLE_RADIUS: f32 = 8.0;

const BAND_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 180, 255);

/// Dual-handle trim selector widget.
///
/// Draws a horizontal track with a highlighted band between two draggable
/// handles and keeps the manual time fields in sync with accepted moves.
pub struct TrimWidget<'a> {
    selector: &'a mut TrimSelector,
    start_text: &'a mut String,
    end_text: &'a mut String,
    show_manual_inputs: &'a mut bool,
}

impl<'a> TrimWidget<'a> {
    pub fn new(
        selector: &'a mut TrimSelector,
        start_text: &'a mut String,
        end_text: &'a mut String,
        show_manual_inputs: &'a mut bool,
    ) -> Self {
        Self {
            selector,
            start_text,
            end_text,
            show_manual_inputs,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("0:00");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format_time(self.selector.duration_seconds));
            });
        });

        let desired = egui::vec2(
            ui.available_width(),
            TOOLTIP_HEIGHT + TRACK_HEIGHT + MARKER_LABEL_HEIGHT,
        );
        let (widget_rect, _) = ui.allocate_exact_size(desired, egui::Sense::hover());
        let track_rect = egui::Rect::from_min_max(
            egui::pos2(
                widget_rect.left() + HANDLE_RADIUS,
                widget_rect.top() + TOOLTIP_HEIGHT,
            ),
            egui::pos2(
                widget_rect.right() - HANDLE_RADIUS,
                widget_rect.top() + TOOLTIP_HEIGHT + TRACK_HEIGHT,
            ),
        );

        self.handle_pointer(ui, track_rect);
        self.draw(ui, widget_rect, track_rect);

        let display = self.selector.display();
        ui.horizontal(|ui| {
            ui.label("Selected:");
            ui.strong(display.summary.as_str());
            ui.separator();
            ui.label("Range:");
            ui.strong(display.range.as_str());
        });

        ui.checkbox(self.show_manual_inputs, "Set start/end manually");
        if *self.show_manual_inputs {
            self.manual_inputs(ui);
        }
    }

    fn fraction_to_x(track_rect: egui::Rect, fraction: f64) -> f32 {
        track_rect.left() + (fraction as f32 / 100.0) * track_rect.width()
    }

    fn x_to_fraction(track_rect: egui::Rect, x: f32) -> f64 {
        (((x - track_rect.left()) / track_rect.width()) * 100.0) as f64
    }

    fn handle_pointer(&mut self, ui: &mut egui::Ui, track_rect: egui::Rect) {
        for handle in [Handle::Start, Handle::End] {
            let fraction = match handle {
                Handle::Start => self.selector.start_fraction,
                Handle::End => self.selector.end_fraction,
            };
            let hit_rect = egui::Rect::from_center_size(
                egui::pos2(
                    Self::fraction_to_x(track_rect, fraction),
                    track_rect.center().y,
                ),
                egui::vec2(HANDLE_RADIUS * 2.5, HANDLE_RADIUS * 2.5),
            );
            let response = ui.allocate_rect(hit_rect, egui::Sense::drag());
            if response.drag_started() {
                self.selector.begin_drag(handle);
            }
            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
            }
        }

        if self.selector.active_drag.is_some() {
            if let Some(pos) = ui.input(|i| i.pointer.latest_pos()) {
                let fraction = Self::x_to_fraction(track_rect, pos.x);
                // rejected moves leave the handle and the fields alone
                if self.selector.update_drag(fraction) {
                    let display = self.selector.display();
                    *self.start_text = display.start_input;
                    *self.end_text = display.end_input;
                }
            }
            if ui.input(|i| i.pointer.any_released()) {
                self.selector.end_drag();
            }
        }
    }

    fn draw(&self, ui: &egui::Ui, widget_rect: egui::Rect, track_rect: egui::Rect) {
        let painter = ui.painter_at(widget_rect);
        let display = self.selector.display();

        painter.rect_filled(track_rect, 4.0, egui::Color32::from_gray(60));

        // Interval ticks with their time labels underneath
        for marker in self.selector.markers() {
            let x = Self::fraction_to_x(track_rect, marker.fraction);
            painter.line_segment(
                [
                    egui::pos2(x, track_rect.top() + 2.0),
                    egui::pos2(x, track_rect.bottom() - 2.0),
                ],
                egui::Stroke::new(1.0, egui::Color32::from_gray(110)),
            );
            painter.text(
                egui::pos2(x, track_rect.bottom() + 2.0),
                egui::Align2::CENTER_TOP,
                &marker.label,
                egui::FontId::proportional(10.0),
                egui::Color32::from_gray(160),
            );
        }

        // Selected band between the handles
        let band_left = Self::fraction_to_x(track_rect, display.band_left_pct);
        let band_right =
            Self::fraction_to_x(track_rect, display.band_left_pct + display.band_width_pct);
        let band_rect = egui::Rect::from_min_max(
            egui::pos2(band_left, track_rect.top()),
            egui::pos2(band_right, track_rect.bottom()),
        );
        painter.rect_filled(band_rect, 4.0, BAND_COLOR.gamma_multiply(0.45));
        painter.rect_stroke(
            band_rect,
            4.0,
            egui::Stroke::new(1.0, BAND_COLOR),
            StrokeKind::Inside,
        );

        for (fraction, tooltip) in [
            (self.selector.start_fraction, &display.tooltip_start),
            (self.selector.end_fraction, &display.tooltip_end),
        ] {
            let x = Self::fraction_to_x(track_rect, fraction);
            let center = egui::pos2(x, track_rect.center().y);
            painter.circle_filled(center, HANDLE_RADIUS, egui::Color32::WHITE);
            painter.circle_stroke(center, HANDLE_RADIUS, egui::Stroke::new(1.5, BAND_COLOR));
            painter.text(
                egui::pos2(x, widget_rect.top()),
                egui::Align2::CENTER_TOP,
                tooltip,
                egui::FontId::proportional(11.0),
                egui::Color32::WHITE,
            );
        }
    }

    fn manual_inputs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Start");
            let start_edit = ui.add(
                egui::TextEdit::singleline(self.start_text)
                    .hint_text("HH:MM:SS")
                    .desired_width(90.0),
            );
            ui.label("End");
            let end_edit = ui.add(
                egui::TextEdit::singleline(self.end_text)
                    .hint_text("HH:MM:SS")
                    .desired_width(90.0),
            );

            let mut dirty = start_edit.changed() || end_edit.changed();
            // Bare second counts get promoted to clock form when focus leaves
            if start_edit.lost_focus() {
                if let Some(normalized) = normalize_bare_seconds(self.start_text) {
                    *self.start_text = normalized;
                    dirty = true;
                }
            }
            if end_edit.lost_focus() {
                if let Some(normalized) = normalize_bare_seconds(self.end_text) {
                    *self.end_text = normalized;
                    dirty = true;
                }
            }

            // Live sync on every edit; the parser is lenient, so "1:30"
            // and bare "90" move the handles as typed. The strict
            // HH:MM:SS check happens once, at download submission.
            if dirty {
                self.selector
                    .sync_from_inputs(self.start_text.trim(), self.end_text.trim());
            }
        });
    }
}
