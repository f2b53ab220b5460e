//! Final step of a run: name the audio, drop scratch files, write the report

use crate::analysis::AnalysisOutcome;
use crate::error::{Error, Result};
use crate::session::{Session, TrackResults};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Characters stripped from titles before they become file names
pub const UNSAFE_TITLE_CHARS: &[char] = &['*', '\'', '"', '/', ',', '_', '&', '#', '^', '@'];

/// Extension of the final audio file
const AUDIO_EXTENSION: &str = "mp3";

/// Where the run's outputs ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalArtifacts {
    pub audio: PathBuf,
    pub report: PathBuf,
}

/// Remove filesystem-unsafe characters and surrounding whitespace
///
/// Idempotent: sanitizing an already sanitized title returns it unchanged.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| !UNSAFE_TITLE_CHARS.contains(c))
        .collect();
    kept.trim().to_string()
}

/// Delete the scratch clip; failure is logged, never fatal
///
/// Returns whether the file was removed.
pub fn remove_scratch(clip: &Path) -> bool {
    match fs::remove_file(clip) {
        Ok(()) => {
            log::debug!("Removed scratch clip {:?}", clip);
            true
        }
        Err(e) => {
            log::warn!("Failed to remove scratch clip {:?}: {}", clip, e);
            false
        }
    }
}

/// Rename `source` to `dest` without ever replacing an existing file
fn move_audio(source: &Path, dest: &Path) -> Result<()> {
    if source == dest {
        log::debug!("Audio already named {:?}", dest);
        return Ok(());
    }

    if !source.is_file() {
        return Err(Error::io(
            format!("Downloaded audio {:?} is missing", source),
            std::io::Error::from(ErrorKind::NotFound),
        ));
    }

    if dest.exists() {
        return Err(Error::io(
            format!("Refusing to overwrite {:?}", dest),
            std::io::Error::from(ErrorKind::AlreadyExists),
        ));
    }

    fs::rename(source, dest)
        .map_err(|e| Error::io(format!("Failed to move {:?} to {:?}", source, dest), e))
}

/// Finish a run whose analyzers both succeeded
///
/// Order: sanitize the title, delete the scratch clip, rename the audio to
/// `<title>.mp3`, set the session results and save the report. A title
/// that sanitizes to nothing falls back to the session id.
pub fn finalize(
    session: &mut Session,
    source: &Path,
    clip: &Path,
    title: &str,
    outcome: &AnalysisOutcome,
) -> Result<FinalArtifacts> {
    finalize_with(session, source, clip, title, outcome, remove_scratch)
}

/// [`finalize`] with the scratch removal supplied by the caller
///
/// `remove_clip` is called exactly once, before the audio is renamed and
/// before the report exists. Its return value is only logged.
pub fn finalize_with<F>(
    session: &mut Session,
    source: &Path,
    clip: &Path,
    title: &str,
    outcome: &AnalysisOutcome,
    mut remove_clip: F,
) -> Result<FinalArtifacts>
where
    F: FnMut(&Path) -> bool,
{
    let mut stem = sanitize_title(title);
    if stem.is_empty() {
        log::warn!(
            "Title {:?} is empty after sanitizing, naming the track after session {}",
            title,
            session.id()
        );
        stem = session.id().to_string();
    }

    // Scratch goes first so a track titled like the clip cannot collide with it
    if !remove_clip(clip) {
        log::debug!("Scratch clip {:?} left in place", clip);
    }

    let audio = session.artifact(&format!("{}.{}", stem, AUDIO_EXTENSION));
    move_audio(source, &audio)?;

    session.set_results(TrackResults {
        title: stem,
        tuning_frequency: outcome.tonal.tuning_frequency.clone(),
        tonal_key: outcome.tonal.key.clone(),
        raw_bpm: outcome.tempo.raw_bpm,
        bpm: outcome.tempo.bpm,
    })?;

    let report = session.save()?.unwrap_or_else(|| session.report_path());

    Ok(FinalArtifacts { audio, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{TempoReading, TonalReading};
    use tempfile::TempDir;

    fn outcome() -> AnalysisOutcome {
        AnalysisOutcome {
            tonal: TonalReading {
                tuning_frequency: "439.8".to_string(),
                key: "F# min".to_string(),
            },
            tempo: TempoReading {
                raw_bpm: 121.5,
                bpm: 122,
            },
        }
    }

    fn session_with_files(root: &TempDir) -> (Session, PathBuf, PathBuf) {
        let session = Session::initialize(root.path()).unwrap();
        let source = session.artifact("ref.mp3");
        let clip = session.artifact("data.mp3");
        fs::write(&source, b"full track").unwrap();
        fs::write(&clip, b"clip").unwrap();
        (session, source, clip)
    }

    #[test]
    fn test_sanitize_removes_every_unsafe_char() {
        let title = r#"A*B'C"D/E,F_G&H#I^J@K"#;
        assert_eq!(sanitize_title(title), "ABCDEFGHIJK");

        let sanitized = sanitize_title("*'\"/,_&#^@ mixed @ bag _");
        for c in UNSAFE_TITLE_CHARS {
            assert!(!sanitized.contains(*c), "{:?} left in {:?}", c, sanitized);
        }
        assert_eq!(sanitized, "mixed  bag");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for title in [
            "Daft Punk - Around the World",
            "AC/DC - Back In Black",
            "  __*padded*__  ",
            "Beyoncé & JAY-Z - Crazy In Love",
            "@@@",
            "",
        ] {
            let once = sanitize_title(title);
            assert_eq!(sanitize_title(&once), once, "title {:?}", title);
        }
    }

    #[test]
    fn test_sanitize_keeps_other_characters() {
        assert_eq!(sanitize_title("Sigur Rós - Hoppípolla (Live)"), "Sigur Rós - Hoppípolla (Live)");
    }

    #[test]
    fn test_finalize_renames_and_writes_report() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);

        let artifacts = finalize(&mut session, &source, &clip, "AC/DC - T.N.T.", &outcome()).unwrap();

        assert_eq!(artifacts.audio, session.artifact("ACDC - T.N.T..mp3"));
        assert_eq!(fs::read(&artifacts.audio).unwrap(), b"full track");
        assert!(!source.exists());
        assert!(!clip.exists());

        let report = session.report().unwrap();
        assert_eq!(report.title, "ACDC - T.N.T.");
        assert_eq!(report.tuning_frequency, "439.8");
        assert_eq!(report.tonal_key, "F# min");
        assert_eq!(report.raw_bpm, 121.5);
        assert_eq!(report.bpm, 122);
        assert!(artifacts.report.is_file());
    }

    #[test]
    fn test_scratch_removed_once_before_rename_and_report() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);
        let report_path = session.report_path();

        let mut calls = Vec::new();
        let artifacts = finalize_with(&mut session, &source, &clip, "Song", &outcome(), |path| {
            calls.push((
                path.to_path_buf(),
                path.is_file(),
                source.is_file(),
                report_path.exists(),
            ));
            remove_scratch(path)
        })
        .unwrap();

        assert_eq!(calls, vec![(clip.clone(), true, true, false)]);
        assert!(!clip.exists());
        assert!(artifacts.report.is_file());
    }

    #[test]
    fn test_failed_scratch_removal_still_finishes() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);

        let artifacts =
            finalize_with(&mut session, &source, &clip, "Song", &outcome(), |_| false).unwrap();
        assert!(clip.exists());
        assert!(artifacts.audio.is_file());
        assert!(artifacts.report.is_file());
    }

    #[test]
    fn test_missing_clip_is_not_fatal() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);
        fs::remove_file(&clip).unwrap();

        let artifacts = finalize(&mut session, &source, &clip, "Song", &outcome()).unwrap();
        assert!(artifacts.audio.is_file());
        assert!(artifacts.report.is_file());
    }

    #[test]
    fn test_missing_source_is_fatal_and_writes_no_report() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);
        fs::remove_file(&source).unwrap();

        let result = finalize(&mut session, &source, &clip, "Song", &outcome());
        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(!session.report_path().exists());
        assert!(session.report().is_none());
    }

    #[test]
    fn test_existing_destination_is_not_overwritten() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);
        fs::write(session.artifact("Song.mp3"), b"someone else").unwrap();

        let result = finalize(&mut session, &source, &clip, "Song", &outcome());
        assert!(matches!(result, Err(Error::Io { .. })));
        assert_eq!(fs::read(session.artifact("Song.mp3")).unwrap(), b"someone else");
        assert!(source.exists());
    }

    #[test]
    fn test_title_matching_clip_name_keeps_track() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);

        let artifacts = finalize(&mut session, &source, &clip, "data", &outcome()).unwrap();
        assert_eq!(artifacts.audio, clip);
        assert_eq!(fs::read(&artifacts.audio).unwrap(), b"full track");
    }

    #[test]
    fn test_title_matching_source_name() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);

        let artifacts = finalize(&mut session, &source, &clip, "ref", &outcome()).unwrap();
        assert_eq!(artifacts.audio, source);
        assert!(source.is_file());
    }

    #[test]
    fn test_empty_title_falls_back_to_session_id() {
        let root = TempDir::new().unwrap();
        let (mut session, source, clip) = session_with_files(&root);

        let artifacts = finalize(&mut session, &source, &clip, "_@#_", &outcome()).unwrap();
        let expected = session.artifact(&format!("{}.mp3", session.id()));
        assert_eq!(artifacts.audio, expected);
        assert_eq!(session.report().unwrap().title, session.id());
    }
}
