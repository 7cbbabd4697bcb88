mod backend;
mod ops;
mod types;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::Backend;
use crate::backend::ytdlp::YtDlpBackend;
use crate::ui::app::SnipdlApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let output_dir = std::env::var_os("SNIPDL_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("downloads"));
    let backend: Arc<dyn Backend> = Arc::new(YtDlpBackend::new("yt-dlp", output_dir));

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([560.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "snipdl",
        native_options,
        Box::new(|cc| Ok(Box::new(SnipdlApp::new(cc, backend)))),
    )?;
    Ok(())
}
