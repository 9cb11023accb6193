//! JSON-lines landmark recordings.
//!
//! One object per line:
//! `{"timestamp_ms": 33, "width": 1280, "height": 720, "landmarks": [{"x":..,"y":..,"z":..,"visibility":..}, ...]}`
//! with `"landmarks": null` (or the key omitted) for frames without a person.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::Duration;
use thiserror::Error;

use crate::pose::{FrameSize, Landmark, LandmarkCountError, LandmarkFrame};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid frame record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    LandmarkCount {
        line: usize,
        #[source]
        source: LandmarkCountError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
}

impl ReplayFrame {
    pub fn timestamp(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn landmark_frame(&self) -> Result<Option<LandmarkFrame>, LandmarkCountError> {
        self.landmarks
            .clone()
            .map(LandmarkFrame::try_from)
            .transpose()
    }
}

/// A replay frame with its landmarks already validated.
#[derive(Debug, Clone)]
pub struct ReplayEntry {
    pub line: usize,
    pub timestamp: Duration,
    pub size: FrameSize,
    pub frame: Option<LandmarkFrame>,
}

/// Parse a recording. Blank lines are skipped.
///
/// An I/O error is yielded once and ends the iteration; parse errors are
/// per-line and reading continues past them.
pub fn read_replay<R: BufRead>(reader: R) -> impl Iterator<Item = Result<ReplayEntry, ReplayError>> {
    let mut io_failed = false;
    reader
        .lines()
        .enumerate()
        .map_while(move |(i, line)| {
            if io_failed {
                return None;
            }
            let line_no = i + 1;
            Some(match line {
                Err(source) => {
                    io_failed = true;
                    Some(Err(ReplayError::Io { line: line_no, source }))
                }
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(parse_line(line_no, &text)),
            })
        })
        .flatten()
}

fn parse_line(line: usize, text: &str) -> Result<ReplayEntry, ReplayError> {
    let record: ReplayFrame =
        serde_json::from_str(text).map_err(|source| ReplayError::Parse { line, source })?;
    let frame = record
        .landmark_frame()
        .map_err(|source| ReplayError::LandmarkCount { line, source })?;
    Ok(ReplayEntry {
        line,
        timestamp: record.timestamp(),
        size: record.size(),
        frame,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkIndex;
    use std::io::{BufReader, Cursor, Read};

    /// 読み込みが常に失敗するリーダー（ディレクトリを開いた場合など）
    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "Is a directory"))
        }
    }

    fn record_line(timestamp_ms: u64, landmarks: Option<usize>) -> String {
        let record = ReplayFrame {
            timestamp_ms,
            width: 640,
            height: 480,
            landmarks: landmarks.map(|n| vec![Landmark::new(0.5, 0.5, 0.0, 0.9); n]),
        };
        serde_json::to_string(&record).unwrap()
    }

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let input = format!(
            "{}\n\n{}\n",
            record_line(0, Some(LandmarkIndex::COUNT)),
            record_line(33, None)
        );
        let entries: Vec<_> = read_replay(Cursor::new(input)).collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].frame.is_some());
        assert_eq!(entries[0].size, FrameSize::new(640, 480));
        assert!(entries[1].frame.is_none());
        assert_eq!(entries[1].timestamp, Duration::from_millis(33));
        assert_eq!(entries[1].line, 3);
    }

    #[test]
    fn test_missing_landmarks_key_is_no_person() {
        let input = r#"{"timestamp_ms": 10, "width": 100, "height": 100}"#;
        let entries: Vec<_> = read_replay(Cursor::new(input)).collect::<Result<_, _>>().unwrap();
        assert!(entries[0].frame.is_none());
    }

    #[test]
    fn test_z_defaults_to_zero() {
        let point = r#"{"x":0.1,"y":0.2,"visibility":0.9}"#;
        let landmarks = vec![point; LandmarkIndex::COUNT].join(",");
        let input = format!(r#"{{"timestamp_ms":0,"width":10,"height":10,"landmarks":[{}]}}"#, landmarks);
        let entries: Vec<_> = read_replay(Cursor::new(input)).collect::<Result<_, _>>().unwrap();
        let frame = entries[0].frame.as_ref().unwrap();
        assert_eq!(frame.get(LandmarkIndex::Nose).z, 0.0);
        assert_eq!(frame.get(LandmarkIndex::Nose).x, 0.1);
    }

    #[test]
    fn test_wrong_point_count_reports_line() {
        let input = format!("{}\n{}\n", record_line(0, None), record_line(33, Some(17)));
        let results: Vec<_> = read_replay(Cursor::new(input)).collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ReplayError::LandmarkCount { line, source }) => {
                assert_eq!(*line, 2);
                assert_eq!(source.actual, 17);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_ends_iteration() {
        let results: Vec<_> = read_replay(BufReader::new(BrokenReader)).take(10).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ReplayError::Io { line: 1, .. })));
    }

    #[test]
    fn test_bad_json_reports_line() {
        let results: Vec<_> = read_replay(Cursor::new("not json\n")).collect();
        assert!(matches!(results[0], Err(ReplayError::Parse { line: 1, .. })));
        let message = results[0].as_ref().unwrap_err().to_string();
        assert!(message.starts_with("line 1: invalid frame record"));
    }
}
