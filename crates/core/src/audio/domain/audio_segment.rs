/// Decoded audio handed to a dump: interleaved PCM samples normalized to
/// `[-1.0, 1.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        debug_assert!(channels >= 1, "audio needs at least one channel");
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Builds a segment from signed 16-bit PCM, the format most hosts
    /// exchange audio in.
    pub fn from_i16(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        let samples = samples
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect();
        Self::new(samples, sample_rate, channels)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Rejects tracks that cannot be timed or de-interleaved: no channels,
    /// a zero sample rate, or a sample count that is not a whole number of
    /// frames.
    pub fn check_format(&self) -> Result<(), String> {
        if self.channels == 0 {
            return Err("audio has no channels".to_string());
        }
        if self.sample_rate == 0 {
            return Err("audio has a zero sample rate".to_string());
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(format!(
                "{} samples do not divide into {} channels",
                self.samples.len(),
                self.channels
            ));
        }
        Ok(())
    }

    /// Number of sample frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Splits the interleaved samples into one plane per channel.
    pub fn planes(&self) -> Vec<Vec<f32>> {
        let channels = self.channels as usize;
        let mut planes = vec![Vec::with_capacity(self.frame_count()); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (plane, &sample) in planes.iter_mut().zip(frame) {
                plane.push(sample);
            }
        }
        planes
    }

    /// Returns the first `seconds` of audio, cut on a sample-frame boundary.
    pub fn truncated(&self, seconds: f64) -> Self {
        let frames = ((seconds.max(0.0) * self.sample_rate as f64).round() as usize)
            .min(self.frame_count());
        let end = frames * self.channels as usize;
        Self::new(self.samples[..end].to_vec(), self.sample_rate, self.channels)
    }
}
