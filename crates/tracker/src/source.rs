//! Pose source: JSON-lines landmark recordings

use pose_geometry::{Joint, LandmarkFrame, Point2};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One line of a landmark recording
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PoseRecord {
    /// Named joints in pixel coordinates
    Pixels {
        timestamp_ms: u64,
        landmarks: HashMap<Joint, [f64; 2]>,
    },
    /// MediaPipe-ordered normalized coordinates plus frame size
    Normalized {
        timestamp_ms: u64,
        width: f64,
        height: f64,
        normalized: Vec<Option<[f64; 2]>>,
    },
}

impl PoseRecord {
    pub fn into_frame(self) -> LandmarkFrame {
        match self {
            PoseRecord::Pixels { timestamp_ms, landmarks } => LandmarkFrame {
                timestamp_ms,
                points: landmarks
                    .into_iter()
                    .map(|(joint, p)| (joint, Point2::from(p)))
                    .collect(),
            },
            PoseRecord::Normalized {
                timestamp_ms,
                width,
                height,
                normalized,
            } => LandmarkFrame::from_normalized(timestamp_ms, width, height, &normalized),
        }
    }
}

/// Parse one recording line into a frame
pub fn parse_line(line: &str) -> Result<LandmarkFrame, serde_json::Error> {
    serde_json::from_str::<PoseRecord>(line).map(PoseRecord::into_frame)
}

/// Counts from one pass over a recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames: u64,
    pub skipped: u64,
}

/// Read frames line by line and forward them until the input ends or the
/// receiver goes away.
///
/// Lines that are not UTF-8 or not a valid record are logged and skipped;
/// only a failing read ends the stream with an error.
pub async fn read_frames<R>(mut reader: R, tx: mpsc::Sender<LandmarkFrame>) -> std::io::Result<SourceStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = SourceStats::default();
    let mut line_no = 0u64;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Skipping line {}: {}", line_no, e);
                stats.skipped += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let frame = match parse_line(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no, e);
                stats.skipped += 1;
                continue;
            }
        };

        if tx.send(frame).await.is_err() {
            debug!("Frame receiver closed after {} frames", stats.frames);
            return Ok(stats);
        }
        stats.frames += 1;
    }

    info!("Pose source finished: {} frames, {} skipped", stats.frames, stats.skipped);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pixel_record() {
        let frame = parse_line(
            r#"{"timestamp_ms": 40, "landmarks": {"left_hip": [320.0, 240.0], "left_knee": [330.5, 400.0]}}"#,
        )
        .unwrap();

        assert_eq!(frame.timestamp_ms, 40);
        assert_eq!(frame.get(Joint::LeftKnee), Some(Point2::new(330.5, 400.0)));
        assert_eq!(frame.get(Joint::LeftAnkle), None);
    }

    #[test]
    fn test_parse_normalized_record() {
        // Indices 0..=26; only nose and the left knee present
        let mut normalized = vec![None; 27];
        normalized[0] = Some([0.5, 0.125]);
        normalized[Joint::LeftKnee.mediapipe_index()] = Some([0.25, 0.75]);
        let line = serde_json::json!({
            "timestamp_ms": 7,
            "width": 640.0,
            "height": 480.0,
            "normalized": normalized,
        })
        .to_string();

        let frame = parse_line(&line).unwrap();
        assert_eq!(frame.get(Joint::LeftKnee), Some(Point2::new(160.0, 360.0)));
        assert_eq!(frame.get(Joint::Nose), Some(Point2::new(320.0, 60.0)));
        assert_eq!(frame.get(Joint::LeftHip), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_line("not json").is_err());
        assert!(parse_line(r#"{"timestamp_ms": 1}"#).is_err());
    }

    #[tokio::test]
    async fn test_read_frames_skips_bad_lines() {
        let input = concat!(
            r#"{"timestamp_ms": 1, "landmarks": {"left_hip": [0.0, 0.0]}}"#,
            "\n\n",
            "{broken\n",
            r#"{"timestamp_ms": 2, "landmarks": {}}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);

        let stats = read_frames(input.as_bytes(), tx).await.unwrap();
        assert_eq!(stats, SourceStats { frames: 2, skipped: 1 });

        assert_eq!(rx.recv().await.map(|f| f.timestamp_ms), Some(1));
        let second = rx.recv().await.unwrap();
        assert!(second.is_empty());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_read_frames_skips_undecodable_line() {
        let mut input = br#"{"timestamp_ms": 1, "landmarks": {}}"#.to_vec();
        input.extend_from_slice(b"\n{\"timestamp_ms\": 2, \xff\xfe}\n");
        input.extend_from_slice(br#"{"timestamp_ms": 3, "landmarks": {}}"#);
        let (tx, mut rx) = mpsc::channel(8);

        let stats = read_frames(input.as_slice(), tx).await.unwrap();
        assert_eq!(stats, SourceStats { frames: 2, skipped: 1 });

        let mut seen = Vec::new();
        while let Some(frame) = rx.recv().await {
            seen.push(frame.timestamp_ms);
        }
        assert_eq!(seen, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_read_frames_stops_when_receiver_dropped() {
        let input = "{\"timestamp_ms\": 1, \"landmarks\": {}}\n";
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let stats = read_frames(input.as_bytes(), tx).await.unwrap();
        assert_eq!(stats.frames, 0);
    }
}
