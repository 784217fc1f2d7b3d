//! One opened video file's decode session.
//!
//! [`MediaSource`] opens a container, picks its first video stream, and turns
//! packets into bottom-up RGB24 frames in a single reusable pixel buffer.
//! Everything runs on the caller's thread; a frame stays valid until the next
//! call to [`MediaSource::advance`].

use std::path::Path;

use crate::config::VideoConfig;
use crate::core::geometry::Geometry;
use crate::core::rational::{fix_codec_time_base, frame_rate, pixel_aspect_ratio};
use crate::decode::backend::{Backend, Container, Converter, FrameDecoder, Packet, RawFrame, Receive};
use crate::decode::buffer::{ConvertedFrame, PixelBuffer};
use crate::decode::error::{DecodeError, OpenError};
use crate::decode::orientation::{flip_rows, plane_rows};
use crate::decode::stream_info::{first_video_stream, SourceFormat, StreamInfo};
use crate::playback::state::{PlaybackState, Status};
use crate::render::sink::{PresentationSink, SinkError};

/// Decode session over one video stream.
///
/// Every owned resource is optional so a partially opened source can be
/// released safely; [`MediaSource::release`] may be called any number of times.
pub struct MediaSource<B: Backend> {
    container: Option<B::Container>,
    decoder: Option<B::Decoder>,
    raw_frame: Option<B::Frame>,
    converted: Option<ConvertedFrame>,
    converter: Option<B::Converter>,
    buffer: Option<PixelBuffer>,
    streams: Vec<StreamInfo>,
    stream_index: usize,
    format: Option<SourceFormat>,
    geometry: Geometry,
    fps: f64,
    state: PlaybackState,
    draining: bool,
    config: VideoConfig,
}

/// What draining the decoder after one packet produced
enum Drained {
    Frame,
    Empty,
    Failed(DecodeError),
}

impl<B: Backend> MediaSource<B> {
    fn unopened(config: VideoConfig) -> Self {
        Self {
            container: None,
            decoder: None,
            raw_frame: None,
            converted: None,
            converter: None,
            buffer: None,
            streams: Vec::new(),
            stream_index: 0,
            format: None,
            geometry: Geometry::new(0, 0, 0, 0, 1.0),
            fps: 0.0,
            state: PlaybackState::Loaded,
            draining: false,
            config,
        }
    }

    /// Open `path` with `backend`.
    ///
    /// On failure everything allocated so far is released before the error
    /// is returned.
    pub fn open_with<P: AsRef<Path>>(
        backend: &B,
        path: P,
        config: VideoConfig,
    ) -> Result<Self, OpenError> {
        let mut source = Self::unopened(config);
        match source.open_streams(backend, path.as_ref()) {
            Ok(()) => Ok(source),
            Err(err) => {
                log::error!("{}", err);
                source.release();
                Err(err)
            }
        }
    }

    fn open_streams(&mut self, backend: &B, path: &Path) -> Result<(), OpenError> {
        let container = backend
            .open_container(path)
            .map_err(|source| OpenError::ContainerOpen {
                path: path.to_path_buf(),
                source,
            })?;
        let container = self.container.insert(container);

        self.streams = container.streams();
        if self.config.dump_streams {
            log::debug!("{}: {} stream(s)", path.display(), self.streams.len());
            for stream in &self.streams {
                log::debug!(
                    "  #{} {} ({}) time base {} avg rate {}",
                    stream.index,
                    stream.kind,
                    stream.codec_name,
                    stream.time_base,
                    stream.avg_frame_rate
                );
            }
        }

        self.stream_index = first_video_stream(&self.streams).ok_or(OpenError::NoVideoStream)?;
        let stream = self.streams[self.stream_index].clone();

        let decoder = backend
            .open_decoder(container, self.stream_index)
            .map_err(OpenError::CodecOpen)?;
        let decoder = self.decoder.insert(decoder);

        let params = decoder.params();
        let par = pixel_aspect_ratio(params.sample_aspect_ratio);
        self.geometry = Geometry::new(
            params.width,
            params.height,
            params.buffer_width,
            params.buffer_height,
            par,
        );
        log::info!(
            "pixel aspect ratio: {}, size: {}x{} buffer size: {}x{} format: {}",
            params.sample_aspect_ratio,
            self.geometry.width,
            self.geometry.height,
            self.geometry.buffer_width,
            self.geometry.buffer_height,
            params.format.name
        );

        let time_base = fix_codec_time_base(params.time_base);
        if time_base != params.time_base {
            decoder.set_time_base(time_base);
        }

        self.fps = frame_rate(stream.time_base, stream.avg_frame_rate);
        log::info!("fps: {}", self.fps);
        self.format = Some(params.format);

        let raw_frame = backend
            .alloc_frame()
            .map_err(|e| OpenError::Allocation(e.to_string()))?;
        self.raw_frame = Some(raw_frame);

        self.buffer = Some(PixelBuffer::alloc(self.geometry.buffer_len())?);
        self.converted = Some(ConvertedFrame::rgb24(&self.geometry));

        let converter = backend
            .build_converter(decoder, &self.geometry, self.config.scaling)
            .map_err(OpenError::ConversionInit)?;
        self.converter = Some(converter);

        Ok(())
    }

    /// Decode the next video frame into the pixel buffer.
    ///
    /// Returns `false` once the input is exhausted; the source is then
    /// `Finished` and every later call returns `false` as well.
    pub fn advance(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }

        let (
            Some(container),
            Some(decoder),
            Some(raw_frame),
            Some(converter),
            Some(converted),
            Some(buffer),
            Some(format),
        ) = (
            self.container.as_mut(),
            self.decoder.as_mut(),
            self.raw_frame.as_mut(),
            self.converter.as_mut(),
            self.converted.as_ref(),
            self.buffer.as_mut(),
            self.format.as_ref(),
        )
        else {
            log::warn!("advance on a released video source");
            return false;
        };

        let flush = self.config.flush_at_end;
        while decode_next::<B>(
            container,
            decoder,
            raw_frame,
            self.stream_index,
            &mut self.draining,
            flush,
        ) {
            let rows = plane_rows(self.geometry.buffer_height, format);
            let view = flip_rows(raw_frame.strides(), rows);
            match converter.convert(raw_frame, &view, self.geometry.buffer_height, converted, buffer) {
                Ok(()) => return true,
                Err(err) => log::warn!("dropping frame that failed to convert: {}", err),
            }
        }

        log::debug!("no next frame");
        self.state = PlaybackState::Finished;
        false
    }

    /// Upload the current frame's display region into `sink`, then refresh
    /// its mip levels if configured to.
    pub fn present_current_frame<S: PresentationSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        let buffer = self.buffer.as_ref().ok_or(SinkError::NoFrame)?;
        sink.upload(&self.geometry.upload_region(), buffer.as_slice())?;
        if self.config.generate_mipmaps {
            sink.regenerate_mips()?;
        }
        Ok(())
    }

    /// `(width, height / par)`
    pub fn display_size(&self) -> (f64, f64) {
        self.geometry.display_size()
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn state(&self) -> Status {
        let (width, height) = self.display_size();
        Status {
            state: self.state,
            width,
            height,
            fps: self.fps,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// Converted RGB24 pixels at buffer geometry, bottom row first
    pub fn pixel_buffer(&self) -> Option<&[u8]> {
        self.buffer.as_ref().map(PixelBuffer::as_slice)
    }

    pub fn is_released(&self) -> bool {
        self.container.is_none() && self.buffer.is_none()
    }

    /// Release every native resource this source still holds. The source
    /// reports `Finished` from then on.
    ///
    /// Safe on partially opened sources and on repeated calls.
    pub fn release(&mut self) {
        self.state = PlaybackState::Finished;
        if self.is_released()
            && self.decoder.is_none()
            && self.raw_frame.is_none()
            && self.converter.is_none()
        {
            return;
        }
        drop(self.converter.take());
        drop(self.raw_frame.take());
        drop(self.converted.take());
        drop(self.decoder.take());
        drop(self.container.take());
        drop(self.buffer.take());
        log::debug!("released video source");
    }
}

impl<B: Backend> Drop for MediaSource<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Pull packets until one decodes into `frame`. `false` once nothing is left.
fn decode_next<B: Backend>(
    container: &mut B::Container,
    decoder: &mut B::Decoder,
    frame: &mut B::Frame,
    stream_index: usize,
    draining: &mut bool,
    flush: bool,
) -> bool {
    loop {
        if *draining {
            return match decoder.receive_frame(frame) {
                Receive::Frame => true,
                Receive::Error(err) => {
                    log::warn!("while flushing decoder: {}", err);
                    false
                }
                Receive::NeedMoreInput | Receive::EndOfStream => false,
            };
        }

        let Some(packet) = container.read_packet() else {
            if !flush {
                return false;
            }
            *draining = true;
            if let Err(err) = decoder.send_eof() {
                log::debug!("decoder refused end of input: {}", err);
                return false;
            }
            continue;
        };

        if packet.stream_index() != stream_index {
            log::trace!("skipping packet of stream {}", packet.stream_index());
            continue;
        }

        if let Err(err) = decoder.send_packet(&packet) {
            log::warn!("{}", err);
            continue;
        }

        match drain::<B>(decoder, frame) {
            Drained::Frame => return true,
            Drained::Empty => continue,
            Drained::Failed(err) => log::warn!("{}", err),
        }
    }
}

/// Receive every frame the last packet released, keeping the most recent one.
fn drain<B: Backend>(decoder: &mut B::Decoder, frame: &mut B::Frame) -> Drained {
    let mut got_frame = false;
    loop {
        match decoder.receive_frame(frame) {
            Receive::Frame => got_frame = true,
            Receive::NeedMoreInput | Receive::EndOfStream => {
                return if got_frame {
                    Drained::Frame
                } else {
                    Drained::Empty
                };
            }
            Receive::Error(err) if got_frame => {
                log::warn!("keeping frame decoded before error: {}", err);
                return Drained::Frame;
            }
            Receive::Error(err) => return Drained::Failed(err),
        }
    }
}

#[cfg(feature = "ffmpeg")]
impl MediaSource<crate::decode::ffmpeg::FfmpegBackend> {
    /// Open `path` with FFmpeg and the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        Self::open_config(path, VideoConfig::default())
    }

    pub fn open_config<P: AsRef<Path>>(path: P, config: VideoConfig) -> Result<Self, OpenError> {
        Self::open_with(&crate::decode::ffmpeg::FfmpegBackend::new(), path, config)
    }
}
