use serde::{Deserialize, Serialize};

use crate::shared::name_conversions::impl_name_conversions;

/// Video encoders offered by the save node, named as ffmpeg names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "libx265")]
    Libx265,
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "libvpx-vp9")]
    LibvpxVp9,
    #[serde(rename = "libaom-av1")]
    LibaomAv1,
    #[serde(rename = "mpeg4")]
    Mpeg4,
    #[serde(rename = "libvpx")]
    Libvpx,
}

impl VideoCodec {
    pub const ALL: &[VideoCodec] = &[
        VideoCodec::Libx265,
        VideoCodec::Libx264,
        VideoCodec::LibvpxVp9,
        VideoCodec::LibaomAv1,
        VideoCodec::Mpeg4,
        VideoCodec::Libvpx,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VideoCodec::Libx265 => "libx265",
            VideoCodec::Libx264 => "libx264",
            VideoCodec::LibvpxVp9 => "libvpx-vp9",
            VideoCodec::LibaomAv1 => "libaom-av1",
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::Libvpx => "libvpx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuvj420p,
    Yuvj422p,
    Yuvj444p,
    Rgb24,
    Rgba,
    Nv12,
    Nv21,
}

impl PixelFormat {
    pub const ALL: &[PixelFormat] = &[
        PixelFormat::Yuv420p,
        PixelFormat::Yuv422p,
        PixelFormat::Yuv444p,
        PixelFormat::Yuvj420p,
        PixelFormat::Yuvj422p,
        PixelFormat::Yuvj444p,
        PixelFormat::Rgb24,
        PixelFormat::Rgba,
        PixelFormat::Nv12,
        PixelFormat::Nv21,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv422p => "yuv422p",
            PixelFormat::Yuv444p => "yuv444p",
            PixelFormat::Yuvj420p => "yuvj420p",
            PixelFormat::Yuvj422p => "yuvj422p",
            PixelFormat::Yuvj444p => "yuvj444p",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Nv21 => "nv21",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Mov,
    Gif,
    Avi,
}

impl ContainerFormat {
    pub const ALL: &[ContainerFormat] = &[
        ContainerFormat::Mp4,
        ContainerFormat::Mov,
        ContainerFormat::Gif,
        ContainerFormat::Avi,
    ];

    /// File extension, which doubles as the ffmpeg muxer name.
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mov => "mov",
            ContainerFormat::Gif => "gif",
            ContainerFormat::Avi => "avi",
        }
    }

    pub fn supports_audio(self) -> bool {
        !matches!(self, ContainerFormat::Gif)
    }
}

impl_name_conversions!(VideoCodec, as_str, "codec");
impl_name_conversions!(PixelFormat, as_str, "pixel format");
impl_name_conversions!(ContainerFormat, extension, "container format");

/// How the 1..=10 quality knob is expressed to a given encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityControl {
    /// Constant rate factor. `constant_quality` also disables the bit-rate
    /// target, which the VP9 and AV1 encoders need for pure CRF mode.
    Crf { crf: u32, constant_quality: bool },
    /// Target bit rate in bits per second.
    BitRate(usize),
}

/// Everything an encoder needs to turn one batch into a file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: VideoCodec,
    pub pixel_format: PixelFormat,
    pub container: ContainerFormat,
    pub quality: u8,
}

impl EncodeSettings {
    pub fn quality_control(&self) -> QualityControl {
        let q = self.quality.clamp(1, 10) as u32;
        match (self.container, self.codec) {
            (ContainerFormat::Gif, _) | (_, VideoCodec::Mpeg4) | (_, VideoCodec::Libvpx) => {
                // 0.02 bits per pixel per quality step
                let pixels_per_sec = self.width as f64 * self.height as f64 * self.fps as f64;
                QualityControl::BitRate((pixels_per_sec * 0.02 * q as f64).round() as usize)
            }
            (_, VideoCodec::Libx264) | (_, VideoCodec::Libx265) => QualityControl::Crf {
                crf: 51 - 4 * q,
                constant_quality: false,
            },
            (_, VideoCodec::LibvpxVp9) | (_, VideoCodec::LibaomAv1) => QualityControl::Crf {
                crf: 63 - 5 * q,
                constant_quality: true,
            },
        }
    }
}
