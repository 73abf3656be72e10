use tracing::debug;
use watchbridge_config::ExclusionConfig;

/// Decides whether a playing file is eligible for scrobbling at all.
/// Checked before identification so excluded sources never trigger any
/// remote traffic.
pub struct ExclusionFilter {
    live_tv: bool,
    http: bool,
    plugin: bool,
    paths: Vec<String>,
}

impl ExclusionFilter {
    pub fn new(config: &ExclusionConfig) -> Self {
        Self {
            live_tv: config.live_tv,
            http: config.http,
            plugin: config.plugin,
            paths: config.paths.clone(),
        }
    }

    pub fn is_excluded(&self, file: &str) -> bool {
        if file.is_empty() {
            return false;
        }
        if self.live_tv && file.starts_with("pvr://") {
            debug!(file, "Excluded: live TV source");
            return true;
        }
        if self.http && (file.starts_with("http://") || file.starts_with("https://")) {
            debug!(file, "Excluded: http source");
            return true;
        }
        if self.plugin && file.starts_with("plugin://") {
            debug!(file, "Excluded: plugin source");
            return true;
        }
        for prefix in &self.paths {
            if !prefix.is_empty() && file.starts_with(prefix.as_str()) {
                debug!(file, prefix, "Excluded: configured path");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(paths: &[&str]) -> ExclusionFilter {
        ExclusionFilter {
            live_tv: true,
            http: true,
            plugin: true,
            paths: paths.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn protocol_exclusions() {
        let f = filter(&[]);
        assert!(f.is_excluded("pvr://channels/tv/1"));
        assert!(f.is_excluded("http://example.com/stream.mkv"));
        assert!(f.is_excluded("https://example.com/stream.mkv"));
        assert!(f.is_excluded("plugin://plugin.video.something/"));
        assert!(!f.is_excluded("/media/movies/film.mkv"));
    }

    #[test]
    fn path_prefix_exclusions() {
        let f = filter(&["/media/home-videos/"]);
        assert!(f.is_excluded("/media/home-videos/birthday.mp4"));
        assert!(!f.is_excluded("/media/movies/film.mkv"));
    }

    #[test]
    fn disabled_protocol_passes() {
        let f = ExclusionFilter {
            live_tv: false,
            http: false,
            plugin: false,
            paths: vec![],
        };
        assert!(!f.is_excluded("pvr://channels/tv/1"));
    }
}
