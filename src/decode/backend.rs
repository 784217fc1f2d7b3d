//! Capability traits the frame pipeline is written against.
//!
//! A [`Backend`] bundles the demux/decode engine and the pixel format
//! conversion routine. The pipeline owns every value these traits hand out
//! and drops each exactly once.

use std::path::Path;

use crate::config::ScalingQuality;
use crate::core::geometry::Geometry;
use crate::core::rational::Rational;
use crate::decode::buffer::{ConvertedFrame, PixelBuffer};
use crate::decode::error::{BackendError, DecodeError};
use crate::decode::orientation::{FlippedView, MAX_PLANES};
use crate::decode::stream_info::{CodecParams, StreamInfo};

/// A compressed packet read from a container
pub trait Packet {
    fn stream_index(&self) -> usize;
}

/// An opened media container
pub trait Container {
    type Packet: Packet;

    /// Streams in container order
    fn streams(&self) -> Vec<StreamInfo>;

    /// Next packet in file order. `None` once the input is exhausted or can
    /// no longer be read.
    fn read_packet(&mut self) -> Option<Self::Packet>;
}

/// The decoder's native output for one picture, reused across calls
pub trait RawFrame {
    /// Bytes between rows of each plane, top-down; zero for absent planes
    fn strides(&self) -> [i32; MAX_PLANES];
}

/// Outcome of asking the decoder for a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receive {
    /// A frame was written into the caller's frame holder
    Frame,
    /// The decoder wants another packet first
    NeedMoreInput,
    /// The decoder has been flushed and holds nothing more
    EndOfStream,
    /// The packet could not be decoded
    Error(DecodeError),
}

/// A decoder opened for one stream
pub trait FrameDecoder {
    type Packet;
    type Frame: RawFrame;

    fn params(&self) -> CodecParams;

    fn set_time_base(&mut self, time_base: Rational);

    fn send_packet(&mut self, packet: &Self::Packet) -> Result<(), DecodeError>;

    /// Signal end of input so buffered frames can be drained
    fn send_eof(&mut self) -> Result<(), DecodeError>;

    /// Move the next decoded frame into `frame`. `frame` keeps its previous
    /// content unless [`Receive::Frame`] is returned.
    fn receive_frame(&mut self, frame: &mut Self::Frame) -> Receive;
}

/// A pixel format conversion configured for one fixed transform
pub trait Converter {
    type Frame;

    /// Convert `height` rows of `frame`, read through `view`, into the
    /// planes `dst` lays out over `buffer`.
    fn convert(
        &mut self,
        frame: &Self::Frame,
        view: &FlippedView,
        height: u32,
        dst: &ConvertedFrame,
        buffer: &mut PixelBuffer,
    ) -> Result<(), BackendError>;
}

/// Demux, decode and conversion capabilities of one media library
pub trait Backend {
    type Packet: Packet;
    type Frame: RawFrame;
    type Container: Container<Packet = Self::Packet>;
    type Decoder: FrameDecoder<Packet = Self::Packet, Frame = Self::Frame>;
    type Converter: Converter<Frame = Self::Frame>;

    /// Open and probe a container
    fn open_container(&self, path: &Path) -> Result<Self::Container, BackendError>;

    /// Find and initialize a decoder for one of `container`'s streams
    fn open_decoder(
        &self,
        container: &Self::Container,
        stream_index: usize,
    ) -> Result<Self::Decoder, BackendError>;

    /// Allocate an empty frame holder
    fn alloc_frame(&self) -> Result<Self::Frame, BackendError>;

    /// Build a conversion from the decoder's pixel format at buffer geometry
    /// to RGB24 at buffer geometry
    fn build_converter(
        &self,
        decoder: &Self::Decoder,
        geometry: &Geometry,
        quality: ScalingQuality,
    ) -> Result<Self::Converter, BackendError>;
}
