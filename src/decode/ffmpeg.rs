//! FFmpeg implementation of the decode and conversion capabilities.
//! All unsafe FFmpeg code is isolated in this module.
//!
//! Every FFmpeg object is wrapped in a small owning struct whose `Drop`
//! frees it, so the pipeline's release order is simply the order in which it
//! drops these wrappers.

use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::path::Path;
use std::ptr;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::ffi;
use ffmpeg_next::software::scaling::Flags as ScalingFlags;

use crate::config::ScalingQuality;
use crate::core::geometry::Geometry;
use crate::core::rational::Rational;
use crate::decode::backend::{Backend, Container, Converter, FrameDecoder, Packet, RawFrame, Receive};
use crate::decode::buffer::{ConvertedFrame, PixelBuffer};
use crate::decode::error::{BackendError, DecodeError};
use crate::decode::orientation::{FlippedView, MAX_PLANES};
use crate::decode::stream_info::{CodecParams, MediaKind, SourceFormat, StreamInfo};

fn av_error(what: &str, code: c_int) -> BackendError {
    BackendError::new(format!("{} failed: {}", what, ffmpeg::Error::from(code)))
}

fn rational(r: ffi::AVRational) -> Rational {
    Rational::new(r.num, r.den)
}

/// Decode capability backed by libavformat/libavcodec/libswscale
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

pub struct FfmpegContainer {
    ctx: *mut ffi::AVFormatContext,
}

impl Drop for FfmpegContainer {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe { ffi::avformat_close_input(&mut self.ctx) };
        }
    }
}

impl Container for FfmpegContainer {
    type Packet = FfmpegPacket;

    fn streams(&self) -> Vec<StreamInfo> {
        unsafe {
            let ctx = &*self.ctx;
            (0..ctx.nb_streams as usize)
                .map(|index| {
                    let stream = *ctx.streams.add(index);
                    let codecpar = (*stream).codecpar;
                    let kind = match (*codecpar).codec_type {
                        ffi::AVMediaType::AVMEDIA_TYPE_VIDEO => MediaKind::Video,
                        ffi::AVMediaType::AVMEDIA_TYPE_AUDIO => MediaKind::Audio,
                        ffi::AVMediaType::AVMEDIA_TYPE_SUBTITLE => MediaKind::Subtitle,
                        ffi::AVMediaType::AVMEDIA_TYPE_DATA => MediaKind::Data,
                        _ => MediaKind::Unknown,
                    };
                    let name = ffi::avcodec_get_name((*codecpar).codec_id);
                    let codec_name = if name.is_null() {
                        "unknown".to_string()
                    } else {
                        CStr::from_ptr(name).to_string_lossy().into_owned()
                    };
                    StreamInfo {
                        index,
                        kind,
                        codec_name,
                        time_base: rational((*stream).time_base),
                        avg_frame_rate: rational((*stream).avg_frame_rate),
                    }
                })
                .collect()
        }
    }

    fn read_packet(&mut self) -> Option<FfmpegPacket> {
        let packet = FfmpegPacket::alloc()?;
        let ret = unsafe { ffi::av_read_frame(self.ctx, packet.ptr) };
        if ret < 0 {
            if ret != ffi::AVERROR_EOF {
                log::debug!("{}", av_error("av_read_frame", ret));
            }
            return None;
        }
        Some(packet)
    }
}

pub struct FfmpegPacket {
    ptr: *mut ffi::AVPacket,
}

impl FfmpegPacket {
    fn alloc() -> Option<Self> {
        let ptr = unsafe { ffi::av_packet_alloc() };
        if ptr.is_null() {
            log::error!("cannot allocate packet");
            None
        } else {
            Some(Self { ptr })
        }
    }
}

impl Packet for FfmpegPacket {
    fn stream_index(&self) -> usize {
        unsafe { (*self.ptr).stream_index as usize }
    }
}

impl Drop for FfmpegPacket {
    fn drop(&mut self) {
        unsafe { ffi::av_packet_free(&mut self.ptr) };
    }
}

pub struct FfmpegFrame {
    ptr: *mut ffi::AVFrame,
}

impl FfmpegFrame {
    fn alloc() -> Result<Self, BackendError> {
        let ptr = unsafe { ffi::av_frame_alloc() };
        if ptr.is_null() {
            Err(BackendError::new("av_frame_alloc returned null"))
        } else {
            Ok(Self { ptr })
        }
    }
}

impl RawFrame for FfmpegFrame {
    fn strides(&self) -> [i32; MAX_PLANES] {
        let linesize = unsafe { (*self.ptr).linesize };
        let mut strides = [0; MAX_PLANES];
        strides.copy_from_slice(&linesize[..MAX_PLANES]);
        strides
    }
}

impl Drop for FfmpegFrame {
    fn drop(&mut self) {
        unsafe { ffi::av_frame_free(&mut self.ptr) };
    }
}

pub struct FfmpegDecoder {
    ctx: *mut ffi::AVCodecContext,
    // avcodec_receive_frame clears its output even when no frame is ready,
    // so frames land here first and are moved out on success.
    scratch: FfmpegFrame,
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe { ffi::avcodec_free_context(&mut self.ctx) };
        }
    }
}

impl FfmpegDecoder {
    fn pixel_format(&self) -> ffi::AVPixelFormat {
        unsafe { (*self.ctx).pix_fmt }
    }
}

fn source_format(format: ffi::AVPixelFormat) -> SourceFormat {
    unsafe {
        let desc = ffi::av_pix_fmt_desc_get(format);
        if desc.is_null() {
            return SourceFormat {
                name: "none".to_string(),
                planes: 0,
                chroma_v_shift: 0,
            };
        }
        SourceFormat {
            name: CStr::from_ptr((*desc).name).to_string_lossy().into_owned(),
            planes: ffi::av_pix_fmt_count_planes(format).clamp(0, MAX_PLANES as c_int) as u8,
            chroma_v_shift: (*desc).log2_chroma_h,
        }
    }
}

impl FrameDecoder for FfmpegDecoder {
    type Packet = FfmpegPacket;
    type Frame = FfmpegFrame;

    fn params(&self) -> CodecParams {
        let ctx = unsafe { &*self.ctx };
        let width = ctx.width.max(0) as u32;
        let height = ctx.height.max(0) as u32;
        CodecParams {
            width,
            height,
            buffer_width: width,
            buffer_height: height,
            sample_aspect_ratio: rational(ctx.sample_aspect_ratio),
            time_base: rational(ctx.time_base),
            format: source_format(ctx.pix_fmt),
        }
    }

    fn set_time_base(&mut self, time_base: Rational) {
        unsafe {
            (*self.ctx).time_base = ffi::AVRational {
                num: time_base.num,
                den: time_base.den,
            };
        }
    }

    fn send_packet(&mut self, packet: &FfmpegPacket) -> Result<(), DecodeError> {
        let ret = unsafe { ffi::avcodec_send_packet(self.ctx, packet.ptr) };
        if ret < 0 {
            return Err(av_error("avcodec_send_packet", ret).into());
        }
        Ok(())
    }

    fn send_eof(&mut self) -> Result<(), DecodeError> {
        let ret = unsafe { ffi::avcodec_send_packet(self.ctx, ptr::null()) };
        if ret < 0 && ret != ffi::AVERROR_EOF {
            return Err(av_error("avcodec_send_packet", ret).into());
        }
        Ok(())
    }

    fn receive_frame(&mut self, frame: &mut FfmpegFrame) -> Receive {
        let ret = unsafe { ffi::avcodec_receive_frame(self.ctx, self.scratch.ptr) };
        if ret == 0 {
            unsafe {
                ffi::av_frame_unref(frame.ptr);
                ffi::av_frame_move_ref(frame.ptr, self.scratch.ptr);
            }
            Receive::Frame
        } else if ret == ffi::AVERROR(ffmpeg::error::EAGAIN) {
            Receive::NeedMoreInput
        } else if ret == ffi::AVERROR_EOF {
            Receive::EndOfStream
        } else {
            Receive::Error(av_error("avcodec_receive_frame", ret).into())
        }
    }
}

pub struct FfmpegConverter {
    ctx: *mut ffi::SwsContext,
    width: c_int,
    height: c_int,
    format: ffi::AVPixelFormat,
}

impl Drop for FfmpegConverter {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe { ffi::sws_freeContext(self.ctx) };
        }
    }
}

impl Converter for FfmpegConverter {
    type Frame = FfmpegFrame;

    fn convert(
        &mut self,
        frame: &FfmpegFrame,
        view: &FlippedView,
        height: u32,
        dst: &ConvertedFrame,
        buffer: &mut PixelBuffer,
    ) -> Result<(), BackendError> {
        let src = unsafe { &*frame.ptr };
        if src.data[0].is_null() {
            return Err(BackendError::new("no decoded picture"));
        }
        // The context was built for one size and format; anything else would
        // read past the decoder's planes.
        if src.width != self.width || src.height != self.height || src.format != self.format as c_int {
            return Err(BackendError::new(format!(
                "frame {}x{} format {} does not match converter {}x{}",
                src.width, src.height, src.format, self.width, self.height
            )));
        }
        if height as c_int > self.height {
            return Err(BackendError::new("conversion height exceeds frame height"));
        }

        let mut src_planes: [*const u8; MAX_PLANES] = [ptr::null(); MAX_PLANES];
        for (plane, slot) in src_planes.iter_mut().enumerate() {
            if !src.data[plane].is_null() {
                // Offsets point at the last row of each plane, inside the
                // decoder's allocation.
                *slot = src.data[plane].wrapping_offset(view.offsets[plane]) as *const u8;
            }
        }
        let dst_planes = dst
            .data_pointers(buffer)
            .ok_or_else(|| BackendError::new("pixel buffer smaller than converted frame"))?;
        let dst_strides = dst.strides();

        let ret = unsafe {
            ffi::sws_scale(
                self.ctx,
                src_planes.as_ptr(),
                view.strides.as_ptr(),
                0,
                height as c_int,
                dst_planes.as_ptr(),
                dst_strides.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(av_error("sws_scale", ret));
        }
        Ok(())
    }
}

fn scaling_flags(quality: ScalingQuality) -> c_int {
    match quality {
        ScalingQuality::FastBilinear => ScalingFlags::FAST_BILINEAR.bits(),
        ScalingQuality::Bilinear => ScalingFlags::BILINEAR.bits(),
        ScalingQuality::Bicubic => ScalingFlags::BICUBIC.bits(),
    }
}

impl Backend for FfmpegBackend {
    type Packet = FfmpegPacket;
    type Frame = FfmpegFrame;
    type Container = FfmpegContainer;
    type Decoder = FfmpegDecoder;
    type Converter = FfmpegConverter;

    fn open_container(&self, path: &Path) -> Result<FfmpegContainer, BackendError> {
        ffmpeg::init().map_err(|e| BackendError::new(format!("FFmpeg init failed: {}", e)))?;

        let path_cstr = CString::new(path.to_string_lossy().as_ref())
            .map_err(|e| BackendError::new(format!("invalid path: {}", e)))?;

        let mut ctx: *mut ffi::AVFormatContext = ptr::null_mut();
        let ret = unsafe {
            ffi::avformat_open_input(&mut ctx, path_cstr.as_ptr(), ptr::null(), ptr::null_mut())
        };
        if ret < 0 {
            return Err(av_error("avformat_open_input", ret));
        }
        let container = FfmpegContainer { ctx };

        let ret = unsafe { ffi::avformat_find_stream_info(container.ctx, ptr::null_mut()) };
        if ret < 0 {
            return Err(av_error("avformat_find_stream_info", ret));
        }
        Ok(container)
    }

    fn open_decoder(
        &self,
        container: &FfmpegContainer,
        stream_index: usize,
    ) -> Result<FfmpegDecoder, BackendError> {
        unsafe {
            let format_ctx = &*container.ctx;
            if stream_index >= format_ctx.nb_streams as usize {
                return Err(BackendError::new(format!("no stream #{}", stream_index)));
            }
            let stream = *format_ctx.streams.add(stream_index);
            let codecpar = (*stream).codecpar;

            let codec = ffi::avcodec_find_decoder((*codecpar).codec_id);
            if codec.is_null() {
                return Err(BackendError::new("no decoder for codec"));
            }

            let ctx = ffi::avcodec_alloc_context3(codec);
            if ctx.is_null() {
                return Err(BackendError::new("avcodec_alloc_context3 returned null"));
            }
            let scratch = match FfmpegFrame::alloc() {
                Ok(frame) => frame,
                Err(err) => {
                    let mut ctx = ctx;
                    ffi::avcodec_free_context(&mut ctx);
                    return Err(err);
                }
            };
            let decoder = FfmpegDecoder { ctx, scratch };

            let ret = ffi::avcodec_parameters_to_context(decoder.ctx, codecpar);
            if ret < 0 {
                return Err(av_error("avcodec_parameters_to_context", ret));
            }
            let ret = ffi::avcodec_open2(decoder.ctx, codec, ptr::null_mut());
            if ret < 0 {
                return Err(av_error("avcodec_open2", ret));
            }
            Ok(decoder)
        }
    }

    fn alloc_frame(&self) -> Result<FfmpegFrame, BackendError> {
        FfmpegFrame::alloc()
    }

    fn build_converter(
        &self,
        decoder: &FfmpegDecoder,
        geometry: &Geometry,
        quality: ScalingQuality,
    ) -> Result<FfmpegConverter, BackendError> {
        let width = geometry.buffer_width as c_int;
        let height = geometry.buffer_height as c_int;
        let format = decoder.pixel_format();

        let ctx = unsafe {
            ffi::sws_getContext(
                width,
                height,
                format,
                width,
                height,
                ffi::AVPixelFormat::AV_PIX_FMT_RGB24,
                scaling_flags(quality),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null(),
            )
        };
        if ctx.is_null() {
            return Err(BackendError::new(format!(
                "sws_getContext returned null for {}x{} {}",
                width,
                height,
                source_format(format).name
            )));
        }
        Ok(FfmpegConverter {
            ctx,
            width,
            height,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoConfig;
    use crate::decode::error::OpenError;
    use crate::decode::source::MediaSource;

    #[test]
    fn test_missing_file_is_container_error() {
        let result = MediaSource::open_config("/nonexistent/clip.mp4", VideoConfig::default());
        assert!(matches!(result, Err(OpenError::ContainerOpen { .. })));
    }

    #[test]
    fn test_scaling_flags_are_distinct() {
        let flags = [
            scaling_flags(ScalingQuality::FastBilinear),
            scaling_flags(ScalingQuality::Bilinear),
            scaling_flags(ScalingQuality::Bicubic),
        ];
        assert_ne!(flags[0], flags[1]);
        assert_ne!(flags[1], flags[2]);
    }

    #[test]
    fn test_yuv420p_descriptor() {
        let format = source_format(ffi::AVPixelFormat::AV_PIX_FMT_YUV420P);
        assert_eq!(format, SourceFormat::yuv420p());
        let rgb = source_format(ffi::AVPixelFormat::AV_PIX_FMT_RGB24);
        assert_eq!((rgb.planes, rgb.chroma_v_shift), (1, 0));
    }
}
