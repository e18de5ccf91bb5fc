use std::path::PathBuf;

/// Properties of an opened source video.
///
/// `total_frames` is the container's frame count, or an estimate derived
/// from duration and frame rate when the container does not record one.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

/// Estimates a frame count from a duration in seconds and a frame rate.
pub fn estimate_frame_count(duration_secs: f64, fps: f64) -> usize {
    if duration_secs <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (duration_secs * fps).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 512,
            height: 512,
            fps: 12.0,
            total_frames: 120,
            codec: "vp9".to_string(),
            source_path: Some(PathBuf::from("/tmp/init.webm")),
        };
        assert_eq!(meta.width, 512);
        assert_eq!(meta.total_frames, 120);
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/init.webm")));
        assert_eq!(meta.clone(), meta);
    }

    #[rstest]
    #[case(10.0, 24.0, 240)]
    #[case(1.5, 25.0, 38)]
    #[case(0.0, 30.0, 0)]
    #[case(5.0, 0.0, 0)]
    #[case(-1.0, 30.0, 0)]
    fn test_estimate_frame_count(#[case] duration: f64, #[case] fps: f64, #[case] expected: usize) {
        assert_eq!(estimate_frame_count(duration, fps), expected);
    }
}
