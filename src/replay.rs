//! Recorded keypoint streams.
//!
//! A recording is JSON Lines, one object per captured frame:
//!
//! ```text
//! {"t": 0.016, "width": 640, "height": 480, "skeletons": [[[x, y, c], ...]]}
//! {"t": 0.032, "frame": false}
//! ```
//!
//! `"frame": false` records a capture failure. Splitting a recording yields a
//! capture source and an estimator that agree on frame order.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capture::{Frame, FrameSource};
use crate::error::{KickrError, Result};
use crate::pose::{PoseEstimator, Skeleton};

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Seconds since the recording started
    pub t: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub frame: bool,
    #[serde(default)]
    pub skeletons: Vec<Skeleton>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| {
            KickrError::source_init(format!("recording {}", path.display()), e.to_string())
        })?;
        let recording = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            frames = recording.frames.len(),
            "recording loaded"
        );
        Ok(recording)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut frames: Vec<RecordedFrame> = Vec::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let frame: RecordedFrame =
                serde_json::from_str(trimmed).map_err(|e| KickrError::Recording {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            if let Some(prev) = frames.last() {
                if frame.t < prev.t {
                    return Err(KickrError::Recording {
                        line: idx + 1,
                        reason: format!("timestamp {} goes backwards from {}", frame.t, prev.t),
                    });
                }
            }
            frames.push(frame);
        }
        if frames.is_empty() {
            return Err(KickrError::Recording {
                line: 0,
                reason: "recording has no frames".to_string(),
            });
        }
        Ok(Self { frames })
    }

    /// Timestamp of the last frame.
    pub fn span(&self) -> f64 {
        self.frames.last().map_or(0.0, |f| f.t)
    }

    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for frame in &self.frames {
            out.push_str(&serde_json::to_string(frame)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn split(self) -> (ReplayCapture, ReplayEstimator) {
        let frames: Rc<[RecordedFrame]> = self.frames.into();
        (
            ReplayCapture {
                frames: Rc::clone(&frames),
                cursor: 0,
            },
            ReplayEstimator { frames },
        )
    }
}

/// Plays back the frame timeline of a recording. Frames carry no pixels.
#[derive(Debug)]
pub struct ReplayCapture {
    frames: Rc<[RecordedFrame]>,
    cursor: usize,
}

impl ReplayCapture {
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Timestamp of the frame the next `read_frame` will return.
    pub fn next_timestamp(&self) -> Option<f64> {
        self.frames.get(self.cursor).map(|f| f.t)
    }
}

impl FrameSource for ReplayCapture {
    fn read_frame(&mut self) -> Option<Frame> {
        let seq = self.cursor;
        let recorded = self.frames.get(seq)?;
        self.cursor += 1;
        recorded
            .frame
            .then(|| Frame::blank(seq as u64, recorded.width, recorded.height))
    }

    fn name(&self) -> &str {
        "replay capture"
    }
}

/// Returns the skeletons recorded for a frame's sequence number.
#[derive(Debug)]
pub struct ReplayEstimator {
    frames: Rc<[RecordedFrame]>,
}

impl PoseEstimator for ReplayEstimator {
    fn infer(&mut self, frame: &Frame) -> Vec<Skeleton> {
        self.frames
            .get(frame.seq as usize)
            .map(|f| f.skeletons.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "replay estimator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use assert_matches::assert_matches;

    fn sample() -> String {
        let s = Skeleton::from_lower_body(
            (Point::new(480.0, 400.0), Point::new(520.0, 400.0)),
            (Point::new(415.0, 398.0), Point::new(530.0, 520.0)),
        );
        let sk = serde_json::to_string(&vec![s]).unwrap();
        format!(
            "# kick sample\n{{\"t\":0.0,\"skeletons\":{sk}}}\n\n{{\"t\":0.1,\"frame\":false}}\n{{\"t\":0.2,\"width\":320,\"height\":240}}\n"
        )
    }

    #[test]
    fn test_parse_recording() {
        let rec = Recording::from_reader(sample().as_bytes()).unwrap();
        assert_eq!(rec.frames.len(), 3);
        assert_eq!(rec.frames[0].width, 640);
        assert_eq!(rec.frames[0].skeletons.len(), 1);
        assert!(!rec.frames[1].frame);
        assert_eq!(rec.frames[2].width, 320);
        assert_eq!(rec.span(), 0.2);
    }

    #[test]
    fn test_split_replays_in_order() {
        let (mut cap, mut est) = Recording::from_reader(sample().as_bytes()).unwrap().split();

        assert_eq!(cap.next_timestamp(), Some(0.0));
        let f0 = cap.read_frame().unwrap();
        assert_eq!(est.infer(&f0).len(), 1);

        assert!(cap.read_frame().is_none(), "dropped frame");

        let f2 = cap.read_frame().unwrap();
        assert_eq!((f2.width, f2.height), (320, 240));
        assert!(est.infer(&f2).is_empty());

        assert!(cap.is_exhausted());
        assert!(cap.read_frame().is_none());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let err = Recording::from_reader("{\"t\":0.0}\nnot json\n".as_bytes()).unwrap_err();
        assert_matches!(err, KickrError::Recording { line: 2, .. });
    }

    #[test]
    fn test_backwards_timestamp_rejected() {
        let err = Recording::from_reader("{\"t\":1.0}\n{\"t\":0.5}\n".as_bytes()).unwrap_err();
        assert_matches!(err, KickrError::Recording { line: 2, .. });
    }

    #[test]
    fn test_empty_recording_rejected() {
        assert!(Recording::from_reader("\n# nothing\n".as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_is_startup_failure() {
        let err = Recording::open("/definitely/not/here.jsonl").unwrap_err();
        assert!(err.is_startup_failure());
    }

    #[test]
    fn test_jsonl_round_trip_keeps_frames() {
        let rec = Recording::from_reader(sample().as_bytes()).unwrap();
        let again = Recording::from_reader(rec.to_jsonl().unwrap().as_bytes()).unwrap();
        assert_eq!(again, rec);
    }
}
