use serde::Deserialize;
use std::fmt;

/// One tracked detection: `{"track_id": 7, "bbox": [x1, y1, x2, y2]}`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Detection {
    pub track_id: u64,
    pub bbox: [f64; 4],
}

impl Detection {
    /// Bounding-box centre, used as the track sample point
    pub fn centre(&self) -> (f64, f64) {
        let [x1, y1, x2, y2] = self.bbox;
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

/// Detector/tracker output for one processed frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frame {
    pub frame_height: f64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Debug)]
pub enum FrameError {
    Empty,
    Malformed(String),
    InvalidHeight(f64),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Empty => write!(f, "frame line is empty"),
            FrameError::Malformed(e) => write!(f, "malformed frame: {}", e),
            FrameError::InvalidHeight(h) => {
                write!(f, "frame_height must be positive, got {}", h)
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Parse one JSON line of detector output
pub fn parse_frame(line: &str) -> Result<Frame, FrameError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FrameError::Empty);
    }

    let frame: Frame =
        serde_json::from_str(line).map_err(|e| FrameError::Malformed(e.to_string()))?;

    if !(frame.frame_height.is_finite() && frame.frame_height > 0.0) {
        return Err(FrameError::InvalidHeight(frame.frame_height));
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        let frame = parse_frame(
            r#"{"frame_height": 480, "detections": [{"track_id": 3, "bbox": [10, 20, 30, 60]}]}"#,
        )
        .unwrap();

        assert_eq!(frame.frame_height, 480.0);
        assert_eq!(frame.detections.len(), 1);
        assert_eq!(frame.detections[0].track_id, 3);
        assert_eq!(frame.detections[0].centre(), (20.0, 40.0));
    }

    #[test]
    fn test_frame_without_detections() {
        let frame = parse_frame(r#"{"frame_height": 480}"#).unwrap();
        assert!(frame.detections.is_empty());
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(parse_frame("   "), Err(FrameError::Empty)));
        assert!(matches!(
            parse_frame(r#"{"detections": []}"#),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            parse_frame(r#"{"frame_height": 0, "detections": []}"#),
            Err(FrameError::InvalidHeight(_))
        ));
        assert!(matches!(
            parse_frame(r#"{"frame_height": 480, "detections": [{"track_id": 1, "bbox": [1, 2, 3]}]}"#),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = parse_frame(r#"{"frame_height": -5}"#).unwrap_err();
        assert_eq!(err.to_string(), "frame_height must be positive, got -5");
    }
}
