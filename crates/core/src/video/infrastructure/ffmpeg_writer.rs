use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::encode_settings::{
    ContainerFormat, EncodeSettings, PixelFormat, QualityControl,
};
use crate::video::domain::video_writer::VideoWriter;

/// Encodes video frames via ffmpeg-next using the codec, pixel format and
/// container picked in [`EncodeSettings`].
///
/// GIF containers always use the `gif` encoder with 8-bit RGB pixels, since
/// none of the configurable codecs can be stored in a GIF.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    fps: i32,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            fps: 0,
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(ffmpeg_next::Rational(1, self.fps), ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncodeSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let fps = i32::try_from(settings.fps)?.max(1);
        self.width = settings.width;
        self.height = settings.height;
        self.fps = fps;

        let mut octx = ffmpeg_next::format::output_as(path, settings.container.extension())?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let (codec, pixel) = if settings.container == ContainerFormat::Gif {
            let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::GIF)
                .ok_or("GIF encoder not found")?;
            (codec, ffmpeg_next::format::Pixel::RGB8)
        } else {
            let name = settings.codec.as_str();
            let codec = ffmpeg_next::encoder::find_by_name(name)
                .ok_or_else(|| format!("{name} encoder not found"))?;
            (codec, to_ffmpeg_pixel(settings.pixel_format))
        };

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(settings.width);
        encoder_ctx.set_height(settings.height);
        encoder_ctx.set_format(pixel);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut opts = ffmpeg_next::Dictionary::new();
        match settings.quality_control() {
            QualityControl::Crf {
                crf,
                constant_quality,
            } => {
                opts.set("crf", &crf.to_string());
                if constant_quality {
                    opts.set("b", "0");
                }
            }
            QualityControl::BitRate(bits) => encoder_ctx.set_bit_rate(bits),
        }

        let encoder = encoder_ctx.open_with(opts)?;
        ost.set_parameters(&encoder);

        self.video_stream_index = ost.index();

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            settings.width,
            settings.height,
            pixel,
            settings.width,
            settings.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Encoding {} with {} ({:?}, {}x{} @ {} fps)",
            path.display(),
            codec.name(),
            pixel,
            settings.width,
            settings.height,
            fps
        );

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };

        if frame.width() != self.width || frame.height() != self.height {
            return Err(format!(
                "frame {} is {}x{}, expected {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        let src = frame.to_rgb8();
        let row_len = self.width as usize * 3;

        // Copy pixel data, respecting stride
        for (row, src_row) in src.chunks_exact(row_len).enumerate() {
            let dst_start = row * stride;
            data[dst_start..dst_start + row_len].copy_from_slice(src_row);
        }

        let mut converted = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut converted)?;
        converted.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&converted)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}

fn to_ffmpeg_pixel(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    use ffmpeg_next::format::Pixel;
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Yuvj420p => Pixel::YUVJ420P,
        PixelFormat::Yuvj422p => Pixel::YUVJ422P,
        PixelFormat::Yuvj444p => Pixel::YUVJ444P,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Nv21 => Pixel::NV21,
    }
}
