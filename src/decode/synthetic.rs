//! Scripted in-memory backend and sink used by the pipeline tests.
//!
//! Frames are single-plane gray images at buffer geometry where every byte of
//! row `r` of the `n`-th decoded frame holds `n * 16 + r`. Each native
//! resource records its release so tests can check for leaks and double frees.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use crate::config::ScalingQuality;
use crate::core::geometry::{Geometry, UploadRegion, RGB24_BYTES_PER_PIXEL};
use crate::core::rational::Rational;
use crate::decode::backend::{Backend, Container, Converter, FrameDecoder, Packet, RawFrame, Receive};
use crate::decode::buffer::{ConvertedFrame, PixelBuffer};
use crate::decode::error::{BackendError, DecodeError};
use crate::decode::orientation::{FlippedView, MAX_PLANES};
use crate::decode::stream_info::{CodecParams, MediaKind, SourceFormat, StreamInfo};
use crate::render::sink::{PresentationSink, Rect, SinkError, TextureId};

/// Where opening should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Container,
    Decoder,
    Frame,
    Converter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Pictures(usize),
    CorruptSend,
    CorruptReceive,
    PictureThenError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedPacket {
    stream: usize,
    payload: Payload,
}

impl ScriptedPacket {
    /// A packet holding one picture
    pub fn video(stream: usize) -> Self {
        Self {
            stream,
            payload: Payload::Pictures(1),
        }
    }

    /// A packet of some stream the pipeline should ignore
    pub fn other(stream: usize) -> Self {
        Self::video(stream)
    }

    /// Rejected by the decoder on submission
    pub fn corrupt_send(stream: usize) -> Self {
        Self {
            stream,
            payload: Payload::CorruptSend,
        }
    }

    /// Accepted, but fails when frames are drained
    pub fn corrupt_receive(stream: usize) -> Self {
        Self {
            stream,
            payload: Payload::CorruptReceive,
        }
    }

    /// Yields one picture, then fails on the next receive
    pub fn picture_then_error(stream: usize) -> Self {
        Self {
            stream,
            payload: Payload::PictureThenError,
        }
    }

    pub fn frames(self, count: usize) -> Self {
        Self {
            payload: Payload::Pictures(count),
            ..self
        }
    }
}

impl Packet for ScriptedPacket {
    fn stream_index(&self) -> usize {
        self.stream
    }
}

#[derive(Default)]
struct Ledger {
    live: Cell<usize>,
    released: RefCell<Vec<&'static str>>,
    codec_time_base: Cell<Rational>,
}

/// Counts itself live until dropped
struct Tracked {
    name: &'static str,
    ledger: Rc<Ledger>,
}

impl Tracked {
    fn new(name: &'static str, ledger: &Rc<Ledger>) -> Self {
        ledger.live.set(ledger.live.get() + 1);
        Self {
            name,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.live.set(self.ledger.live.get() - 1);
        self.ledger.released.borrow_mut().push(self.name);
    }
}

pub struct SyntheticBackend {
    width: u32,
    height: u32,
    buffer_width: u32,
    buffer_height: u32,
    streams: Vec<MediaKind>,
    packets: Vec<ScriptedPacket>,
    sample_aspect: Rational,
    time_base: Rational,
    avg_frame_rate: Rational,
    codec_time_base: Rational,
    delay: usize,
    fail_at: Option<FailAt>,
    ledger: Rc<Ledger>,
}

impl SyntheticBackend {
    /// A single video stream of `frames` one-picture packets
    pub fn video(width: u32, height: u32, frames: usize) -> Self {
        Self {
            width,
            height,
            buffer_width: width,
            buffer_height: height,
            streams: vec![MediaKind::Video],
            packets: vec![ScriptedPacket::video(0); frames],
            sample_aspect: Rational::new(1, 1),
            time_base: Rational::new(1, 25),
            avg_frame_rate: Rational::new(25, 1),
            codec_time_base: Rational::new(1, 25),
            delay: 0,
            fail_at: None,
            ledger: Rc::new(Ledger::default()),
        }
    }

    pub fn with_streams(self, streams: Vec<MediaKind>) -> Self {
        Self { streams, ..self }
    }

    pub fn with_packets(self, packets: Vec<ScriptedPacket>) -> Self {
        Self { packets, ..self }
    }

    /// Decoder holds `delay` pictures back until more input or end of input
    pub fn with_delay(self, delay: usize) -> Self {
        Self { delay, ..self }
    }

    pub fn with_sample_aspect(self, sample_aspect: Rational) -> Self {
        Self {
            sample_aspect,
            ..self
        }
    }

    pub fn with_timing(self, time_base: Rational, avg_frame_rate: Rational) -> Self {
        Self {
            time_base,
            avg_frame_rate,
            ..self
        }
    }

    pub fn with_codec_time_base(self, codec_time_base: Rational) -> Self {
        Self {
            codec_time_base,
            ..self
        }
    }

    pub fn with_buffer_size(self, buffer_width: u32, buffer_height: u32) -> Self {
        Self {
            buffer_width,
            buffer_height,
            ..self
        }
    }

    pub fn failing_at(self, fail_at: FailAt) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..self
        }
    }

    /// Native resources currently allocated and not yet released
    pub fn live_resources(&self) -> usize {
        self.ledger.live.get()
    }

    pub fn release_log(&self) -> Vec<&'static str> {
        self.ledger.released.borrow().clone()
    }

    /// Time base as last set on the decoder
    pub fn codec_time_base(&self) -> Rational {
        self.ledger.codec_time_base.get()
    }

    fn fail(&self, stage: FailAt) -> Result<(), BackendError> {
        if self.fail_at == Some(stage) {
            Err(BackendError::new(format!("injected failure at {:?}", stage)))
        } else {
            Ok(())
        }
    }
}

pub struct SyntheticContainer {
    streams: Vec<StreamInfo>,
    packets: VecDeque<ScriptedPacket>,
    _tracked: Tracked,
}

impl Container for SyntheticContainer {
    type Packet = ScriptedPacket;

    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn read_packet(&mut self) -> Option<ScriptedPacket> {
        self.packets.pop_front()
    }
}

pub struct SyntheticFrame {
    data: Vec<u8>,
    stride: i32,
    _tracked: Tracked,
}

impl RawFrame for SyntheticFrame {
    fn strides(&self) -> [i32; MAX_PLANES] {
        [self.stride, 0, 0, 0]
    }
}

pub struct SyntheticDecoder {
    params: CodecParams,
    queued: VecDeque<u32>,
    next_picture: u32,
    delay: usize,
    eof: bool,
    fail_next_receive: bool,
    fail_when_empty: bool,
    ledger: Rc<Ledger>,
    _tracked: Tracked,
}

impl SyntheticDecoder {
    fn fill(&self, frame: &mut SyntheticFrame, picture: u32) {
        // Rows carry two bytes of padding so stride differs from width.
        let stride = self.params.buffer_width as usize + 2;
        let rows = self.params.buffer_height as usize;
        frame.data.clear();
        frame.data.reserve(stride * rows);
        for row in 0..rows {
            let value = (picture as usize * 16 + row) as u8;
            frame.data.extend(std::iter::repeat(value).take(stride));
        }
        frame.stride = stride as i32;
    }
}

impl FrameDecoder for SyntheticDecoder {
    type Packet = ScriptedPacket;
    type Frame = SyntheticFrame;

    fn params(&self) -> CodecParams {
        CodecParams {
            time_base: self.ledger.codec_time_base.get(),
            ..self.params.clone()
        }
    }

    fn set_time_base(&mut self, time_base: Rational) {
        self.ledger.codec_time_base.set(time_base);
    }

    fn send_packet(&mut self, packet: &ScriptedPacket) -> Result<(), DecodeError> {
        match packet.payload {
            Payload::CorruptSend => Err(DecodeError("invalid data in packet".to_string())),
            Payload::CorruptReceive => {
                self.fail_next_receive = true;
                Ok(())
            }
            Payload::PictureThenError => {
                self.queued.push_back(self.next_picture);
                self.next_picture += 1;
                self.fail_when_empty = true;
                Ok(())
            }
            Payload::Pictures(count) => {
                for _ in 0..count {
                    self.queued.push_back(self.next_picture);
                    self.next_picture += 1;
                }
                Ok(())
            }
        }
    }

    fn send_eof(&mut self) -> Result<(), DecodeError> {
        self.eof = true;
        Ok(())
    }

    fn receive_frame(&mut self, frame: &mut SyntheticFrame) -> Receive {
        if self.fail_next_receive {
            self.fail_next_receive = false;
            return Receive::Error(DecodeError("corrupt picture".to_string()));
        }
        let ready = self.queued.len() > self.delay || (self.eof && !self.queued.is_empty());
        match self.queued.front().copied() {
            Some(picture) if ready => {
                self.queued.pop_front();
                self.fill(frame, picture);
                Receive::Frame
            }
            _ if self.fail_when_empty => {
                self.fail_when_empty = false;
                Receive::Error(DecodeError("corrupt trailing picture".to_string()))
            }
            _ if self.eof => Receive::EndOfStream,
            _ => Receive::NeedMoreInput,
        }
    }
}

/// Expands gray to RGB, honoring the flipped view
pub struct SyntheticConverter {
    width: usize,
    _tracked: Tracked,
}

impl Converter for SyntheticConverter {
    type Frame = SyntheticFrame;

    fn convert(
        &mut self,
        frame: &SyntheticFrame,
        view: &FlippedView,
        height: u32,
        dst: &ConvertedFrame,
        buffer: &mut PixelBuffer,
    ) -> Result<(), BackendError> {
        let stride = view.strides[0] as isize;
        for row in 0..height as usize {
            let start = usize::try_from(view.offsets[0] + row as isize * stride)
                .map_err(|_| BackendError::new("row before start of plane"))?;
            let src = frame
                .data
                .get(start..start + self.width)
                .ok_or_else(|| BackendError::new("row past end of plane"))?;
            let out = dst
                .row_mut(buffer, row)
                .ok_or_else(|| BackendError::new("row past end of pixel buffer"))?;
            for (pixel, value) in out.chunks_exact_mut(RGB24_BYTES_PER_PIXEL).zip(src) {
                pixel.fill(*value);
            }
        }
        Ok(())
    }
}

impl Backend for SyntheticBackend {
    type Packet = ScriptedPacket;
    type Frame = SyntheticFrame;
    type Container = SyntheticContainer;
    type Decoder = SyntheticDecoder;
    type Converter = SyntheticConverter;

    fn open_container(&self, _path: &Path) -> Result<SyntheticContainer, BackendError> {
        self.fail(FailAt::Container)?;
        let streams = self
            .streams
            .iter()
            .enumerate()
            .map(|(index, kind)| StreamInfo {
                index,
                kind: *kind,
                codec_name: "synthetic".to_string(),
                time_base: self.time_base,
                avg_frame_rate: self.avg_frame_rate,
            })
            .collect();
        Ok(SyntheticContainer {
            streams,
            packets: self.packets.iter().copied().collect(),
            _tracked: Tracked::new("container", &self.ledger),
        })
    }

    fn open_decoder(
        &self,
        _container: &SyntheticContainer,
        _stream_index: usize,
    ) -> Result<SyntheticDecoder, BackendError> {
        self.fail(FailAt::Decoder)?;
        self.ledger.codec_time_base.set(self.codec_time_base);
        Ok(SyntheticDecoder {
            params: CodecParams {
                width: self.width,
                height: self.height,
                buffer_width: self.buffer_width,
                buffer_height: self.buffer_height,
                sample_aspect_ratio: self.sample_aspect,
                time_base: self.codec_time_base,
                format: SourceFormat {
                    name: "gray".to_string(),
                    planes: 1,
                    chroma_v_shift: 0,
                },
            },
            queued: VecDeque::new(),
            next_picture: 0,
            delay: self.delay,
            eof: false,
            fail_next_receive: false,
            fail_when_empty: false,
            ledger: Rc::clone(&self.ledger),
            _tracked: Tracked::new("decoder", &self.ledger),
        })
    }

    fn alloc_frame(&self) -> Result<SyntheticFrame, BackendError> {
        self.fail(FailAt::Frame)?;
        Ok(SyntheticFrame {
            data: Vec::new(),
            stride: 0,
            _tracked: Tracked::new("frame", &self.ledger),
        })
    }

    fn build_converter(
        &self,
        _decoder: &SyntheticDecoder,
        geometry: &Geometry,
        _quality: ScalingQuality,
    ) -> Result<SyntheticConverter, BackendError> {
        self.fail(FailAt::Converter)?;
        Ok(SyntheticConverter {
            width: geometry.buffer_width as usize,
            _tracked: Tracked::new("converter", &self.ledger),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Upload {
        region: UploadRegion,
        first_row: Vec<u8>,
    },
    RegenerateMips,
    Draw {
        rect: Rect,
        alpha: f32,
    },
}

/// Records what the pipeline asks of its presentation sink
#[derive(Debug, Default)]
pub struct SyntheticSink {
    pub calls: Vec<SinkCall>,
}

impl PresentationSink for SyntheticSink {
    fn texture_id(&self) -> TextureId {
        TextureId(7)
    }

    fn upload(&mut self, region: &UploadRegion, pixels: &[u8]) -> Result<(), SinkError> {
        if pixels.len() < region.required_len() {
            return Err(SinkError::Upload(format!(
                "{} bytes given, {} needed",
                pixels.len(),
                region.required_len()
            )));
        }
        let start = region.byte_offset();
        let end = start + region.width as usize * RGB24_BYTES_PER_PIXEL;
        self.calls.push(SinkCall::Upload {
            region: *region,
            first_row: pixels[start..end].to_vec(),
        });
        Ok(())
    }

    fn regenerate_mips(&mut self) -> Result<(), SinkError> {
        self.calls.push(SinkCall::RegenerateMips);
        Ok(())
    }

    fn draw(&mut self, rect: Rect, alpha: f32) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Draw { rect, alpha });
        Ok(())
    }
}
