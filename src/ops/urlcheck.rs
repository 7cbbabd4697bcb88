use regex::Regex;
use std::sync::OnceLock;

fn url_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)[\w-]+")
                .expect("valid watch pattern"),
            Regex::new(r"^(https?://)?(www\.)?youtube\.com/playlist\?list=[\w-]+")
                .expect("valid playlist pattern"),
        ]
    })
}

/// Accepts watch URLs, short-form youtu.be links, and playlist URLs,
/// with or without scheme and "www.".
pub fn is_valid_video_url(url: &str) -> bool {
    url_patterns().iter().any(|p| p.is_match(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_watch_urls() {
        assert!(is_valid_video_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(is_valid_video_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_video_url("http://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn accepts_playlist_urls() {
        assert!(is_valid_video_url(
            "https://www.youtube.com/playlist?list=PL123-abc"
        ));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_valid_video_url(""));
        assert!(!is_valid_video_url("not a url"));
        assert!(!is_valid_video_url("https://example.com/watch?v=abc"));
        assert!(!is_valid_video_url("ftp://youtube.com/watch?v=abc"));
    }
}
