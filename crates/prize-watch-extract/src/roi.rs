use prize_watch_types::{RGB_CHANNELS, RgbFrame, RoiRect};

use crate::error::PipelineError;

/// Tightly packed RGB sub-image cut out of a camera frame.
#[derive(Debug, Clone)]
pub struct RgbCrop {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Cuts the display region out of a frame.
///
/// The rectangle must lie fully inside the frame; a camera that moved or a
/// misconfigured region fails here and the frame is reported as an error
/// result upstream.
pub fn crop_roi(frame: &RgbFrame, roi: &RoiRect) -> Result<RgbCrop, PipelineError> {
    if !roi.fits_within(frame.width(), frame.height()) {
        return Err(PipelineError::RoiOutOfBounds {
            roi: *roi,
            width: frame.width(),
            height: frame.height(),
        });
    }

    let width = roi.width();
    let height = roi.height();
    let mut data = Vec::with_capacity(width as usize * height as usize * RGB_CHANNELS);
    let x_start = roi.x1 as usize * RGB_CHANNELS;
    let x_end = roi.x2 as usize * RGB_CHANNELS;
    for y in roi.y1..roi.y2 {
        let row = frame.row(y);
        data.extend_from_slice(&row[x_start..x_end]);
    }

    Ok(RgbCrop {
        width,
        height,
        data,
    })
}
