use ndarray::{s, ArrayView3};

/// A single image in the generation pipeline: float samples in `[0, 1]`,
/// row-major HWC layout.
///
/// Quantisation to 8-bit happens at I/O boundaries only (decode, encode,
/// preview); the accumulator treats frames as opaque values.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<f32>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Builds a frame from tightly packed RGB24 bytes.
    pub fn from_rgb8(pixels: &[u8], width: u32, height: u32, index: usize) -> Self {
        let data = pixels.iter().map(|&b| b as f32 / 255.0).collect();
        Self::new(data, width, height, 3, index)
    }

    /// A frame filled with one value in every channel.
    pub fn filled(width: u32, height: u32, channels: u8, value: f32, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self::new(vec![value; len], width, height, channels, index)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, f32> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Packs the frame into RGB24 bytes.
    ///
    /// Grayscale is replicated across the three channels and alpha is
    /// dropped. Each sample becomes `round(255 * v)` clamped to `[0, 255]`.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let view = self.as_ndarray();
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        match self.channels {
            1 => {
                for &v in view.iter() {
                    let q = quantize(v);
                    out.extend_from_slice(&[q, q, q]);
                }
            }
            _ => {
                let rgb = view.slice(s![.., .., 0..3]);
                out.extend(rgb.iter().map(|&v| quantize(v)));
            }
        }
        out
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Maps a `[0, 1]` float sample onto an 8-bit value.
pub fn quantize(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
