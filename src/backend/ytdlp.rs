use lru::LruCache;
use regex::Regex;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use crate::backend::{Backend, BackendError};
use crate::ops::timefmt::format_time;
use crate::types::job::{AppEvent, DownloadRequest, JobId, Progress};
use crate::types::video_info::{FormatType, VideoInfo};

const INFO_CACHE_CAP: NonZeroUsize = NonZeroUsize::new(32).unwrap();
const THUMBNAIL_LIMIT_BYTES: u64 = 8 * 1024 * 1024;

/// Backend that shells out to yt-dlp: `--dump-json` for metadata and a
/// `--newline` download whose stdout is parsed into progress events.
pub struct YtDlpBackend {
    program: String,
    output_dir: PathBuf,
    cache: Mutex<LruCache<String, VideoInfo>>,
    artifacts: Arc<Mutex<HashMap<JobId, PathBuf>>>,
}

impl YtDlpBackend {
    pub fn new(program: impl Into<String>, output_dir: PathBuf) -> Self {
        if let Err(err) = std::fs::create_dir_all(&output_dir) {
            log::error!("could not create output dir {}: {err}", output_dir.display());
        }
        Self {
            program: program.into(),
            output_dir,
            cache: Mutex::new(LruCache::new(INFO_CACHE_CAP)),
            artifacts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Backend for YtDlpBackend {
    fn fetch_info(&self, url: &str) -> Result<VideoInfo, BackendError> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(info) = cache.get(url) {
                log::debug!("metadata cache hit for {url}");
                return Ok(info.clone());
            }
        }

        let output = Command::new(&self.program)
            .args(["--dump-json", "--no-playlist", url])
            .output()
            .map_err(|source| BackendError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BackendError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = stdout
            .lines()
            .find(|line| line.trim_start().starts_with('{'))
            .ok_or_else(|| BackendError::Metadata("empty yt-dlp output".to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|err| BackendError::Metadata(err.to_string()))?;

        let duration_seconds = value.get("duration").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let info = VideoInfo {
            title: value
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown title")
                .to_string(),
            uploader: value
                .get("uploader")
                .or_else(|| value.get("channel"))
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown")
                .to_string(),
            duration: format_time(duration_seconds),
            duration_seconds,
            thumbnail: value
                .get("thumbnail")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(url.to_string(), info.clone());
        }
        Ok(info)
    }

    fn fetch_thumbnail(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        if url.is_empty() {
            return Err(BackendError::Thumbnail("no thumbnail URL".to_string()));
        }
        let response = ureq::get(url)
            .call()
            .map_err(|err| BackendError::Thumbnail(err.to_string()))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(THUMBNAIL_LIMIT_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|err| BackendError::Thumbnail(err.to_string()))?;
        Ok(bytes)
    }

    fn start_download(
        &self,
        request: DownloadRequest,
        events: Sender<AppEvent>,
    ) -> Result<JobId, BackendError> {
        let job = JobId::new();

        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.output_dir)
            .args(["--newline", "--no-playlist"])
            .arg("-f")
            .arg(request.quality.format_selector(request.format_type))
            .args(["-o", "%(title)s [%(id)s].%(ext)s"]);
        if request.format_type == FormatType::Audio {
            cmd.args(["-x", "--audio-format", "mp3"]);
        }
        if let Some(section) =
            build_section_arg(request.start_time.as_deref(), request.end_time.as_deref())
        {
            cmd.arg("--download-sections")
                .arg(section)
                .arg("--force-keyframes-at-cuts");
        }
        cmd.arg(&request.url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| BackendError::Launch {
            program: self.program.clone(),
            source,
        })?;
        log::info!("job {job}: downloading {}", request.url);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let artifacts = Arc::clone(&self.artifacts);
        let output_dir = self.output_dir.clone();
        let worker_job = job.clone();
        thread::spawn(move || {
            run_job(child, stdout, stderr, worker_job, events, artifacts, output_dir);
        });

        Ok(job)
    }

    fn artifact_path(&self, job: &JobId) -> Option<PathBuf> {
        self.artifacts
            .lock()
            .ok()?
            .get(job)
            .cloned()
            .filter(|path| path.exists())
    }
}

/// Pumps one job's output until the process exits, turning progress lines
/// into events and ending with `Completed` or `Failed`. Send errors are
/// ignored; they only mean the UI went away.
fn run_job(
    mut child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    job: JobId,
    events: Sender<AppEvent>,
    artifacts: Arc<Mutex<HashMap<JobId, PathBuf>>>,
    output_dir: PathBuf,
) {
    let stderr_lines = Arc::new(Mutex::new(Vec::new()));
    if let Some(err) = stderr {
        let sink = Arc::clone(&stderr_lines);
        thread::spawn(move || {
            for line in BufReader::new(err).lines().map_while(Result::ok) {
                log::debug!("yt-dlp: {line}");
                if let Ok(mut lines) = sink.lock() {
                    lines.push(line);
                }
            }
        });
    }

    let mut destination: Option<String> = None;
    if let Some(out) = stdout {
        for line in BufReader::new(out).lines().map_while(Result::ok) {
            if let Some(progress) = parse_progress_line(&line) {
                let _ = events.send(AppEvent::Progress(job.clone(), progress));
            } else if let Some(message) = processing_message(&line) {
                let _ = events.send(AppEvent::Processing(job.clone(), message.to_string()));
            }
            if let Some(path) = parse_destination_line(&line) {
                destination = Some(path);
            }
        }
    }

    match child.wait() {
        Ok(status) if status.success() => match destination {
            Some(path) => {
                let path = resolve_output_path(&output_dir, &path);
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                if let Ok(mut map) = artifacts.lock() {
                    map.insert(job.clone(), path);
                }
                log::info!("job {job}: finished as {filename}");
                let _ = events.send(AppEvent::Completed(job, filename));
            }
            None => {
                let _ = events.send(AppEvent::Failed(
                    job,
                    "yt-dlp did not report an output file".to_string(),
                ));
            }
        },
        Ok(status) => {
            let tail = stderr_lines
                .lock()
                .map(|lines| error_tail(&lines))
                .unwrap_or_default();
            let message = if tail.is_empty() {
                format!("yt-dlp exited with {status}")
            } else {
                tail
            };
            log::warn!("job {job}: {message}");
            let _ = events.send(AppEvent::Failed(job, message));
        }
        Err(err) => {
            let _ = events.send(AppEvent::Failed(
                job,
                format!("failed to wait for yt-dlp: {err}"),
            ));
        }
    }
}

fn progress_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[download\]\s+([0-9.]+)%\s+of\s+~?\s*(\S+)(?:\s+at\s+(\S+))?(?:\s+ETA\s+(\S+))?")
            .expect("valid progress pattern")
    })
}

/// Parses a `--newline` progress line like
/// `[download]  42.3% of 10.00MiB at 1.20MiB/s ETA 00:05`.
fn parse_progress_line(line: &str) -> Option<Progress> {
    let caps = progress_pattern().captures(line.trim_end())?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2)?.as_str().to_string();
    let speed = caps
        .get(3)
        .map(|m| m.as_str().to_string())
        .filter(|s| s != "Unknown")
        .unwrap_or_else(|| "--".to_string());
    let eta = caps
        .get(4)
        .map(|m| m.as_str().to_string())
        .filter(|s| s != "Unknown")
        .unwrap_or_else(|| "--".to_string());
    let downloaded = estimate_downloaded(percent, &total);
    Some(Progress {
        percent,
        speed,
        eta,
        downloaded,
        total,
    })
}

/// yt-dlp reports the total size but not the running byte count; derive
/// it in the total's own unit so the status line can show "x / y".
fn estimate_downloaded(percent: f64, total: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9.]+)([A-Za-z]+)$").expect("valid size pattern")
    });
    let Some(caps) = pattern.captures(total) else {
        return "--".to_string();
    };
    let Ok(value) = caps[1].parse::<f64>() else {
        return "--".to_string();
    };
    format!("{:.2}{}", value * percent / 100.0, &caps[2])
}

/// Output-path lines across the plain, merge, and audio-extraction flows.
fn parse_destination_line(line: &str) -> Option<String> {
    let line = line.trim();

    for prefix in ["[download] Destination:", "[ExtractAudio] Destination:"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            let path = rest.trim();
            if !path.is_empty() {
                return Some(path.to_string());
            }
        }
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        let path = rest.trim_end_matches('"');
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    None
}

fn processing_message(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    if line.starts_with("[Merger]") {
        Some("Merging formats...")
    } else if line.starts_with("[ExtractAudio]") {
        Some("Extracting audio...")
    } else {
        None
    }
}

/// yt-dlp `--download-sections` argument for an optional trim range.
fn build_section_arg(start: Option<&str>, end: Option<&str>) -> Option<String> {
    match (start, end) {
        (None, None) => None,
        (Some(s), Some(e)) => Some(format!("*{s}-{e}")),
        (Some(s), None) => Some(format!("*{s}-inf")),
        (None, Some(e)) => Some(format!("*00:00:00-{e}")),
    }
}

fn resolve_output_path(output_dir: &Path, reported: &str) -> PathBuf {
    let path = Path::new(reported);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        output_dir.join(path)
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    error_tail_str(&lines)
}

fn error_tail(lines: &[String]) -> String {
    let refs: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .collect();
    error_tail_str(&refs)
}

/// Last ERROR line if yt-dlp printed one, otherwise the last line at all.
fn error_tail_str(lines: &[&str]) -> String {
    lines
        .iter()
        .rev()
        .find(|l| l.contains("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_full() {
        let p =
            parse_progress_line("[download]  42.3% of 10.00MiB at 1.20MiB/s ETA 00:05").unwrap();
        assert_eq!(p.percent, 42.3);
        assert_eq!(p.total, "10.00MiB");
        assert_eq!(p.speed, "1.20MiB/s");
        assert_eq!(p.eta, "00:05");
        assert_eq!(p.downloaded, "4.23MiB");
    }

    #[test]
    fn progress_line_estimated_size() {
        let p = parse_progress_line("[download]  12.0% of ~ 5.00MiB at 512.00KiB/s ETA 00:09")
            .unwrap();
        assert_eq!(p.percent, 12.0);
        assert_eq!(p.total, "5.00MiB");
    }

    #[test]
    fn progress_line_without_speed() {
        let p = parse_progress_line("[download] 100% of 10.00MiB in 00:05").unwrap();
        assert_eq!(p.percent, 100.0);
        assert_eq!(p.speed, "--");
        assert_eq!(p.eta, "--");
    }

    #[test]
    fn progress_line_unknown_fields() {
        let p = parse_progress_line("[download]   0.1% of 10.00MiB at Unknown ETA Unknown")
            .unwrap();
        assert_eq!(p.speed, "--");
        assert_eq!(p.eta, "--");
    }

    #[test]
    fn non_progress_lines_are_none() {
        assert!(parse_progress_line("[info] Writing video subtitles").is_none());
        assert!(parse_progress_line("[download] Destination: clip.mp4").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn estimated_downloaded_uses_total_unit() {
        assert_eq!(estimate_downloaded(50.0, "10.00MiB"), "5.00MiB");
        assert_eq!(estimate_downloaded(0.0, "2.50GiB"), "0.00GiB");
        assert_eq!(estimate_downloaded(50.0, "???"), "--");
    }

    #[test]
    fn destination_variants() {
        assert_eq!(
            parse_destination_line("[download] Destination: clip [abc].mp4"),
            Some("clip [abc].mp4".to_string())
        );
        assert_eq!(
            parse_destination_line("[Merger] Merging formats into \"clip [abc].mp4\""),
            Some("clip [abc].mp4".to_string())
        );
        assert_eq!(
            parse_destination_line("[ExtractAudio] Destination: clip [abc].mp3"),
            Some("clip [abc].mp3".to_string())
        );
        assert_eq!(parse_destination_line("[download] 100% of 50.0MiB"), None);
        assert_eq!(parse_destination_line("[download] Destination:"), None);
    }

    #[test]
    fn processing_messages() {
        assert_eq!(
            processing_message("[Merger] Merging formats into \"x.mp4\""),
            Some("Merging formats...")
        );
        assert_eq!(
            processing_message("[ExtractAudio] Destination: x.mp3"),
            Some("Extracting audio...")
        );
        assert_eq!(processing_message("[download] 10% of 1MiB"), None);
    }

    #[test]
    fn section_arg_combinations() {
        assert_eq!(build_section_arg(None, None), None);
        assert_eq!(
            build_section_arg(Some("00:01:00"), Some("00:05:00")),
            Some("*00:01:00-00:05:00".to_string())
        );
        assert_eq!(
            build_section_arg(Some("00:01:00"), None),
            Some("*00:01:00-inf".to_string())
        );
        assert_eq!(
            build_section_arg(None, Some("00:05:00")),
            Some("*00:00:00-00:05:00".to_string())
        );
    }

    #[test]
    fn error_tail_prefers_error_lines() {
        let lines = vec![
            "WARNING: something".to_string(),
            "ERROR: unavailable video".to_string(),
            "cleanup".to_string(),
        ];
        assert_eq!(error_tail(&lines), "ERROR: unavailable video");
        assert_eq!(error_tail(&["just noise".to_string()]), "just noise");
        assert_eq!(error_tail(&[]), "");
    }

    #[test]
    fn artifact_path_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = YtDlpBackend::new("yt-dlp", dir.path().to_path_buf());
        let job = JobId::new();

        assert!(backend.artifact_path(&job).is_none());

        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();
        backend
            .artifacts
            .lock()
            .unwrap()
            .insert(job.clone(), file.clone());
        assert_eq!(backend.artifact_path(&job), Some(file.clone()));

        std::fs::remove_file(&file).unwrap();
        assert!(backend.artifact_path(&job).is_none());
    }

    #[test]
    fn relative_destinations_resolve_into_output_dir() {
        let base = PathBuf::from("/tmp/out");
        assert_eq!(
            resolve_output_path(&base, "clip.mp4"),
            PathBuf::from("/tmp/out/clip.mp4")
        );
        assert_eq!(
            resolve_output_path(&base, "/abs/clip.mp4"),
            PathBuf::from("/abs/clip.mp4")
        );
    }
}
