use std::thread;

use tokio::sync::mpsc::Sender;
use tracing::info;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::config::Configuration;
use crate::core::{
    DynFrameProvider, FrameResult, FrameSourceProvider, FrameStream, RgbFrame,
    spawn_stream_from_channel,
};
use prize_watch_types::{FrameError, RGB_CHANNELS};

const BACKEND: &str = "v4l";
const DEFAULT_CHANNEL_CAPACITY: usize = 4;
const BUFFER_COUNT: u32 = 4;

/// Live camera capture over Video4Linux2.
///
/// Asks the driver for packed RGB24 and falls back to YUYV with a software
/// conversion, which covers the webcams this runs against. Device and
/// stream failures are fatal for the run.
pub struct V4lProvider {
    config: Configuration,
}

impl V4lProvider {
    pub fn new(config: &Configuration) -> FrameResult<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }
}

impl FrameSourceProvider for V4lProvider {
    fn into_stream(self: Box<Self>) -> FrameStream {
        let config = self.config;
        let capacity = config
            .channel_capacity
            .map(|n| n.get())
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY)
            .max(1);
        spawn_stream_from_channel(capacity, move |tx| capture_loop(config, tx))
    }
}

pub fn boxed_v4l(config: &Configuration) -> FrameResult<DynFrameProvider> {
    Ok(Box::new(V4lProvider::new(config)?))
}

#[derive(Clone, Copy, PartialEq)]
enum PixelLayout {
    Rgb24,
    Yuyv,
}

fn capture_loop(config: Configuration, tx: Sender<FrameResult<RgbFrame>>) {
    let device = match Device::new(config.camera_index as usize) {
        Ok(device) => device,
        Err(err) => {
            let _ = tx.blocking_send(Err(FrameError::backend_failure(
                BACKEND,
                format!("failed to open /dev/video{}: {err}", config.camera_index),
            )));
            return;
        }
    };

    let format = match negotiate_format(&device, &config) {
        Ok(format) => format,
        Err(err) => {
            let _ = tx.blocking_send(Err(err));
            return;
        }
    };

    let layout = match &format.fourcc.repr {
        b"RGB3" => PixelLayout::Rgb24,
        b"YUYV" => PixelLayout::Yuyv,
        other => {
            let _ = tx.blocking_send(Err(FrameError::backend_failure(
                BACKEND,
                format!(
                    "driver offered unsupported pixel format {}",
                    String::from_utf8_lossy(other)
                ),
            )));
            return;
        }
    };
    info!(
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        "camera stream negotiated"
    );

    let mut stream = match MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(err) => {
            let _ = tx.blocking_send(Err(FrameError::backend_failure(
                BACKEND,
                format!("failed to map capture buffers: {err}"),
            )));
            return;
        }
    };

    let width = format.width;
    let height = format.height;
    let mut index = 0u64;
    loop {
        if tx.is_closed() {
            break;
        }
        let captured = match stream.next() {
            Ok((buffer, _meta)) => decode_buffer(buffer, width, height, layout),
            Err(err) => {
                let _ = tx.blocking_send(Err(FrameError::backend_failure(
                    BACKEND,
                    format!("capture stream failed: {err}"),
                )));
                break;
            }
        };
        let frame = captured.map(|frame| frame.with_frame_index(Some(index)));
        index += 1;
        if tx.blocking_send(frame).is_err() {
            break;
        }
        if !config.frame_interval.is_zero() {
            thread::sleep(config.frame_interval);
        }
    }
}

fn negotiate_format(device: &Device, config: &Configuration) -> FrameResult<v4l::Format> {
    let mut format = device.format().map_err(|err| {
        FrameError::backend_failure(BACKEND, format!("failed to read device format: {err}"))
    })?;
    format.width = config.width;
    format.height = config.height;
    format.fourcc = FourCC::new(b"RGB3");
    let negotiated = device.set_format(&format).map_err(|err| {
        FrameError::backend_failure(BACKEND, format!("failed to set device format: {err}"))
    })?;
    if &negotiated.fourcc.repr == b"RGB3" {
        return Ok(negotiated);
    }

    // Many webcams only speak YUYV; take it and convert in software.
    format.fourcc = FourCC::new(b"YUYV");
    device.set_format(&format).map_err(|err| {
        FrameError::backend_failure(BACKEND, format!("failed to set device format: {err}"))
    })
}

fn decode_buffer(
    buffer: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
) -> FrameResult<RgbFrame> {
    let pixels = width as usize * height as usize;
    match layout {
        PixelLayout::Rgb24 => {
            let expected = pixels * RGB_CHANNELS;
            if buffer.len() < expected {
                return Err(FrameError::invalid_frame(format!(
                    "short RGB24 capture: got {} bytes expected {expected}",
                    buffer.len()
                )));
            }
            RgbFrame::from_owned(
                width,
                height,
                width as usize * RGB_CHANNELS,
                buffer[..expected].to_vec(),
            )
        }
        PixelLayout::Yuyv => {
            let expected = pixels * 2;
            if buffer.len() < expected {
                return Err(FrameError::invalid_frame(format!(
                    "short YUYV capture: got {} bytes expected {expected}",
                    buffer.len()
                )));
            }
            let rgb = yuyv_to_rgb(&buffer[..expected]);
            RgbFrame::from_owned(width, height, width as usize * RGB_CHANNELS, rgb)
        }
    }
}

// BT.601 YCbCr to RGB, two pixels per YUYV macropixel.
fn yuyv_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 2 * RGB_CHANNELS);
    for macropixel in data.chunks_exact(4) {
        let u = macropixel[1] as f32 - 128.0;
        let v = macropixel[3] as f32 - 128.0;
        push_rgb(&mut rgb, macropixel[0] as f32, u, v);
        push_rgb(&mut rgb, macropixel[2] as f32, u, v);
    }
    rgb
}

fn push_rgb(rgb: &mut Vec<u8>, y: f32, u: f32, v: f32) {
    let r = y + 1.402 * v;
    let g = y - 0.344136 * u - 0.714136 * v;
    let b = y + 1.772 * u;
    rgb.push(r.clamp(0.0, 255.0) as u8);
    rgb.push(g.clamp(0.0, 255.0) as u8);
    rgb.push(b.clamp(0.0, 255.0) as u8);
}
