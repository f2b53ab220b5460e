//! Locations of the external executables

use std::path::{Path, PathBuf};

const DOWNLOADER: &str = "yt-dlp";
const PROBE: &str = "ffprobe";
const TRANSCODER: &str = "ffmpeg";
const TONAL_ANALYZER: &str = "key";
const RHYTHM_ANALYZER: &str = "rhythm";

/// The five tools a run shells out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Fetches the source URL and writes `<name>.info.json` beside the audio
    pub downloader: PathBuf,

    /// Reports stream duration
    pub probe: PathBuf,

    /// Cuts the reference clip
    pub transcoder: PathBuf,

    /// Prints tuning frequency and key
    pub tonal_analyzer: PathBuf,

    /// Prints tempo
    pub rhythm_analyzer: PathBuf,
}

impl ToolPaths {
    /// Bare program names, resolved through PATH at spawn time
    pub fn from_path() -> Self {
        Self {
            downloader: PathBuf::from(DOWNLOADER),
            probe: PathBuf::from(PROBE),
            transcoder: PathBuf::from(TRANSCODER),
            tonal_analyzer: PathBuf::from(TONAL_ANALYZER),
            rhythm_analyzer: PathBuf::from(RHYTHM_ANALYZER),
        }
    }

    /// All tools bundled in one directory (e.g. `./bin`)
    pub fn in_dir(dir: &Path) -> Self {
        let exe = |name: &str| dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        Self {
            downloader: exe(DOWNLOADER),
            probe: exe(PROBE),
            transcoder: exe(TRANSCODER),
            tonal_analyzer: exe(TONAL_ANALYZER),
            rhythm_analyzer: exe(RHYTHM_ANALYZER),
        }
    }

    pub fn with_tonal_analyzer(mut self, path: PathBuf) -> Self {
        self.tonal_analyzer = path;
        self
    }

    pub fn with_rhythm_analyzer(mut self, path: PathBuf) -> Self {
        self.rhythm_analyzer = path;
        self
    }
}

/// Turn a user-supplied program into the path to spawn
///
/// `~` is expanded. A bare name (`key`) stays bare so PATH is searched;
/// anything with a directory part is taken relative to `cwd`, because the
/// tool is spawned from inside the session directory.
pub fn resolve_program(cwd: &Path, raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if expanded.components().count() == 1 && !expanded.is_absolute() {
        return expanded;
    }
    cwd.join(expanded)
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::from_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_joins_every_tool() {
        let paths = ToolPaths::in_dir(Path::new("/opt/tracklabel/bin"));
        for tool in [
            &paths.downloader,
            &paths.probe,
            &paths.transcoder,
            &paths.tonal_analyzer,
            &paths.rhythm_analyzer,
        ] {
            assert!(tool.starts_with("/opt/tracklabel/bin"));
        }
        assert_eq!(
            paths.probe.file_name().unwrap().to_string_lossy(),
            format!("ffprobe{}", std::env::consts::EXE_SUFFIX)
        );
    }

    #[test]
    fn test_analyzer_overrides() {
        let paths = ToolPaths::from_path()
            .with_tonal_analyzer(PathBuf::from("/usr/local/bin/essentia_key"))
            .with_rhythm_analyzer(PathBuf::from("/usr/local/bin/essentia_rhythm"));

        assert_eq!(paths.tonal_analyzer, PathBuf::from("/usr/local/bin/essentia_key"));
        assert_eq!(paths.rhythm_analyzer, PathBuf::from("/usr/local/bin/essentia_rhythm"));
        assert_eq!(paths.downloader, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_resolve_program_relative_to_cwd() {
        let cwd = Path::new("/home/dj/music");
        assert_eq!(
            resolve_program(cwd, "./bin/key"),
            PathBuf::from("/home/dj/music/./bin/key")
        );
        assert_eq!(
            resolve_program(cwd, "tools/rhythm"),
            PathBuf::from("/home/dj/music/tools/rhythm")
        );
    }

    #[test]
    fn test_resolve_program_keeps_bare_and_absolute_names() {
        let cwd = Path::new("/home/dj/music");
        assert_eq!(resolve_program(cwd, "key"), PathBuf::from("key"));
        assert_eq!(
            resolve_program(cwd, "/usr/local/bin/rhythm"),
            PathBuf::from("/usr/local/bin/rhythm")
        );
    }
}
