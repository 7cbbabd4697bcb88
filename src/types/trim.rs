use crate::ops::timefmt::{format_time, format_time_hhmmss, parse_time_to_seconds};

/// Minimum separation between the two handles, in percentage points.
/// Moves that would bring them closer are rejected outright, not clamped.
const MIN_SEPARATION: f64 = 1.0;

/// One of the two draggable endpoints of the trim selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
}

/// An evenly spaced tick on the timeline track.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position along the track as a percentage of total width.
    pub fraction: f64,
    /// Time at the tick in short clock format.
    pub label: String,
}

/// Everything the UI needs to render one state of the selection.
/// Recomputed on demand; nothing here is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimDisplay {
    pub band_left_pct: f64,
    pub band_width_pct: f64,
    pub tooltip_start: String,
    pub tooltip_end: String,
    /// "Full Video" when nothing is trimmed, otherwise the selected span.
    pub summary: String,
    /// "None" when nothing is trimmed, otherwise "start - end".
    pub range: String,
    /// Manual-field text, blank at full range, zero-padded HH:MM:SS otherwise.
    pub start_input: String,
    pub end_input: String,
}

/// Dual-handle trim selector over a continuous duration.
///
/// The selection is a pair of fractions in [0, 100] of the total duration.
/// `(0, 100)` is the degenerate "no trim" selection and is displayed
/// specially. The invariant `start_fraction < end_fraction` holds after
/// every accepted handle move.
#[derive(Debug, Clone)]
pub struct TrimSelector {
    pub duration_seconds: f64,
    pub start_fraction: f64,
    pub end_fraction: f64,
    pub active_drag: Option<Handle>,
    markers: Vec<Marker>,
}

impl Default for TrimSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl TrimSelector {
    pub fn new() -> Self {
        Self {
            duration_seconds: 0.0,
            start_fraction: 0.0,
            end_fraction: 100.0,
            active_drag: None,
            markers: Vec::new(),
        }
    }

    /// Load a new media duration: selection back to full range, drag
    /// session cleared, markers regenerated.
    pub fn initialize(&mut self, duration_seconds: f64) {
        self.duration_seconds = duration_seconds.max(0.0);
        self.start_fraction = 0.0;
        self.end_fraction = 100.0;
        self.active_drag = None;
        self.regenerate_markers();
    }

    /// Up to 10 markers, roughly one per 30 seconds. Durations under a
    /// minute produce none (a single interval has no interior ticks).
    fn regenerate_markers(&mut self) {
        self.markers.clear();
        let num_markers = ((self.duration_seconds / 30.0).floor() as u64).min(10);
        for i in 1..num_markers {
            let fraction = (i as f64 / num_markers as f64) * 100.0;
            let time_seconds = self.duration_seconds * i as f64 / num_markers as f64;
            self.markers.push(Marker {
                fraction,
                label: format_time(time_seconds),
            });
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn begin_drag(&mut self, handle: Handle) {
        self.active_drag = Some(handle);
    }

    pub fn end_drag(&mut self) {
        self.active_drag = None;
    }

    /// Apply a pointer position, given as a fraction of the track width.
    /// Returns whether the active handle actually moved. A move that would
    /// cross or crowd the opposite handle is rejected and the handle stays
    /// where it was.
    pub fn update_drag(&mut self, fraction: f64) -> bool {
        let Some(handle) = self.active_drag else {
            return false;
        };
        let fraction = fraction.clamp(0.0, 100.0);

        match handle {
            Handle::Start => {
                if fraction < self.end_fraction - MIN_SEPARATION {
                    self.start_fraction = fraction;
                    true
                } else {
                    false
                }
            }
            Handle::End => {
                if fraction > self.start_fraction + MIN_SEPARATION {
                    self.end_fraction = fraction;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Apply the manual time fields. Each non-empty field is parsed
    /// leniently and accepted only against the raw duration: start in
    /// [0, duration), end in (0, duration]. The two bounds are not checked
    /// against each other here; that mirrors the drag-path asymmetry of
    /// the original control and is intentional.
    pub fn sync_from_inputs(&mut self, start_text: &str, end_text: &str) {
        if self.duration_seconds == 0.0 {
            return;
        }

        let start_text = start_text.trim();
        if !start_text.is_empty() {
            let start_seconds = parse_time_to_seconds(start_text) as f64;
            if start_seconds < self.duration_seconds {
                self.start_fraction = (start_seconds / self.duration_seconds) * 100.0;
            }
        }

        let end_text = end_text.trim();
        if !end_text.is_empty() {
            let end_seconds = parse_time_to_seconds(end_text) as f64;
            if end_seconds > 0.0 && end_seconds <= self.duration_seconds {
                self.end_fraction = (end_seconds / self.duration_seconds) * 100.0;
            }
        }
    }

    pub fn is_full_range(&self) -> bool {
        self.start_fraction == 0.0 && self.end_fraction == 100.0
    }

    pub fn start_seconds(&self) -> f64 {
        (self.start_fraction / 100.0) * self.duration_seconds
    }

    pub fn end_seconds(&self) -> f64 {
        (self.end_fraction / 100.0) * self.duration_seconds
    }

    pub fn span_seconds(&self) -> f64 {
        self.end_seconds() - self.start_seconds()
    }

    pub fn display(&self) -> TrimDisplay {
        let start = self.start_seconds();
        let end = self.end_seconds();

        let (summary, range, start_input, end_input) = if self.is_full_range() {
            (
                "Full Video".to_string(),
                "None".to_string(),
                String::new(),
                String::new(),
            )
        } else {
            (
                format_time(self.span_seconds()),
                format!("{} - {}", format_time(start), format_time(end)),
                format_time_hhmmss(start),
                format_time_hhmmss(end),
            )
        };

        TrimDisplay {
            band_left_pct: self.start_fraction,
            band_width_pct: self.end_fraction - self.start_fraction,
            tooltip_start: format_time(start),
            tooltip_end: format_time(end),
            summary,
            range,
            start_input,
            end_input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(duration: f64) -> TrimSelector {
        let mut s = TrimSelector::new();
        s.initialize(duration);
        s
    }

    #[test]
    fn initialize_resets_to_full_range() {
        let mut s = selector(300.0);
        s.begin_drag(Handle::Start);
        s.update_drag(40.0);
        s.end_drag();

        s.initialize(600.0);
        assert_eq!(s.start_fraction, 0.0);
        assert_eq!(s.end_fraction, 100.0);
        assert_eq!(s.active_drag, None);
        assert_eq!(s.duration_seconds, 600.0);
    }

    #[test]
    fn drag_moves_active_handle() {
        let mut s = selector(600.0);
        s.begin_drag(Handle::Start);
        assert!(s.update_drag(25.0));
        assert_eq!(s.start_fraction, 25.0);
        s.end_drag();

        s.begin_drag(Handle::End);
        assert!(s.update_drag(75.0));
        assert_eq!(s.end_fraction, 75.0);
    }

    #[test]
    fn drag_without_session_is_ignored() {
        let mut s = selector(600.0);
        assert!(!s.update_drag(50.0));
        assert_eq!(s.start_fraction, 0.0);
        assert_eq!(s.end_fraction, 100.0);
    }

    #[test]
    fn start_cannot_reach_end() {
        let mut s = selector(600.0);
        s.begin_drag(Handle::End);
        s.update_drag(50.0);
        s.end_drag();

        s.begin_drag(Handle::Start);
        // 49.0 is exactly end - 1: rejected, handle frozen
        assert!(!s.update_drag(49.0));
        assert_eq!(s.start_fraction, 0.0);
        assert!(!s.update_drag(80.0));
        assert_eq!(s.start_fraction, 0.0);
        // just inside the limit is fine
        assert!(s.update_drag(48.9));
        assert_eq!(s.start_fraction, 48.9);
    }

    #[test]
    fn end_cannot_reach_start() {
        let mut s = selector(600.0);
        s.begin_drag(Handle::Start);
        s.update_drag(40.0);
        s.end_drag();

        s.begin_drag(Handle::End);
        assert!(!s.update_drag(41.0));
        assert_eq!(s.end_fraction, 100.0);
        assert!(!s.update_drag(10.0));
        assert_eq!(s.end_fraction, 100.0);
    }

    #[test]
    fn ordering_invariant_holds_under_drag_sequences() {
        let mut s = selector(3600.0);
        let moves = [
            (Handle::Start, 90.0),
            (Handle::Start, 30.0),
            (Handle::End, 31.5),
            (Handle::End, 5.0),
            (Handle::Start, 31.0),
            (Handle::End, 100.0),
            (Handle::Start, 0.0),
            (Handle::End, 0.5),
        ];
        for (handle, fraction) in moves {
            s.begin_drag(handle);
            s.update_drag(fraction);
            s.end_drag();
            assert!(
                s.start_fraction < s.end_fraction,
                "handles crossed at {fraction} on {handle:?}"
            );
        }
    }

    #[test]
    fn pointer_fraction_is_clamped() {
        let mut s = selector(600.0);
        s.begin_drag(Handle::End);
        s.update_drag(250.0);
        assert_eq!(s.end_fraction, 100.0);
        s.end_drag();

        s.begin_drag(Handle::Start);
        s.update_drag(-40.0);
        assert_eq!(s.start_fraction, 0.0);
    }

    #[test]
    fn sync_sets_fractions_from_clock_strings() {
        let mut s = selector(600.0);
        s.sync_from_inputs("00:01:00", "00:05:00");
        assert_eq!(s.start_fraction, 10.0);
        assert_eq!(s.end_fraction, 50.0);
    }

    #[test]
    fn sync_checks_bounds_independently() {
        let mut s = selector(600.0);
        // out-of-range values are dropped, in-range ones applied
        s.sync_from_inputs("00:11:00", "00:05:00");
        assert_eq!(s.start_fraction, 0.0);
        assert_eq!(s.end_fraction, 50.0);

        // end of 0 is rejected, end of exactly the duration is accepted
        s.sync_from_inputs("", "00:00:00");
        assert_eq!(s.end_fraction, 50.0);
        s.sync_from_inputs("", "00:10:00");
        assert_eq!(s.end_fraction, 100.0);
    }

    #[test]
    fn sync_allows_crossed_bounds() {
        // Known asymmetry vs. the drag path: each field is only checked
        // against the duration, so a crossed pair goes through.
        let mut s = selector(600.0);
        s.sync_from_inputs("00:08:00", "00:02:00");
        assert_eq!(s.start_fraction, 80.0);
        assert!((s.end_fraction - 20.0).abs() < 1e-9);
    }

    #[test]
    fn sync_with_zero_duration_is_noop() {
        let mut s = TrimSelector::new();
        s.sync_from_inputs("00:01:00", "00:02:00");
        assert_eq!(s.start_fraction, 0.0);
        assert_eq!(s.end_fraction, 100.0);
    }

    #[test]
    fn sync_accepts_short_clock_and_bare_seconds() {
        // the manual fields sync as typed, before any blur normalization
        let mut s = selector(600.0);
        s.sync_from_inputs("1:30", "300");
        assert_eq!(s.start_fraction, 15.0);
        assert_eq!(s.end_fraction, 50.0);
    }

    #[test]
    fn sync_ignores_empty_fields() {
        let mut s = selector(600.0);
        s.sync_from_inputs("00:01:00", "");
        assert_eq!(s.start_fraction, 10.0);
        assert_eq!(s.end_fraction, 100.0);
    }

    #[test]
    fn marker_counts() {
        assert_eq!(selector(29.0).markers().len(), 0);
        // one interval, no interior ticks
        assert_eq!(selector(45.0).markers().len(), 0);
        // 120s -> 4 intervals -> 3 ticks
        assert_eq!(selector(120.0).markers().len(), 3);
        // capped at 10 intervals -> 9 ticks
        assert_eq!(selector(3600.0).markers().len(), 9);
    }

    #[test]
    fn marker_positions_and_labels() {
        let s = selector(120.0);
        let markers = s.markers();
        assert_eq!(markers[0].fraction, 25.0);
        assert_eq!(markers[0].label, "0:30");
        assert_eq!(markers[2].fraction, 75.0);
        assert_eq!(markers[2].label, "1:30");
    }

    #[test]
    fn full_range_display() {
        let s = selector(600.0);
        let d = s.display();
        assert_eq!(d.summary, "Full Video");
        assert_eq!(d.range, "None");
        assert_eq!(d.start_input, "");
        assert_eq!(d.end_input, "");
        assert_eq!(d.band_left_pct, 0.0);
        assert_eq!(d.band_width_pct, 100.0);
    }

    #[test]
    fn trimmed_display() {
        let mut s = selector(600.0);
        s.sync_from_inputs("00:01:00", "00:05:00");
        let d = s.display();
        assert_eq!(d.summary, "4:00");
        assert_eq!(d.range, "1:00 - 5:00");
        assert_eq!(d.start_input, "00:01:00");
        assert_eq!(d.end_input, "00:05:00");
        assert_eq!(d.tooltip_start, "1:00");
        assert_eq!(d.tooltip_end, "5:00");
        assert_eq!(d.band_left_pct, 10.0);
        assert_eq!(d.band_width_pct, 40.0);
    }
}
