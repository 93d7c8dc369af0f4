use std::fmt;
use std::ops::Deref;

use prize_watch_types::LumaImage;

use crate::error::OcrError;

/// Immutable view over a single-channel luminance image.
#[derive(Clone)]
pub struct LumaPlane<'a> {
    width: u32,
    height: u32,
    stride: usize,
    data: &'a [u8],
}

impl<'a> LumaPlane<'a> {
    pub fn from_parts(
        width: u32,
        height: u32,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self, OcrError> {
        if stride < width as usize {
            return Err(OcrError::StrideTooSmall { stride, width });
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or(OcrError::PlaneOverflow { stride, height })?;
        if data.len() < required {
            return Err(OcrError::InsufficientPlaneData {
                provided: data.len(),
                required,
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            data: &data[..required],
        })
    }

    pub fn from_image(image: &'a LumaImage) -> Self {
        // LumaImage guarantees a packed buffer of exactly width * height bytes.
        Self {
            width: image.width(),
            height: image.height(),
            stride: image.width() as usize,
            data: image.data(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// One row of luminance data, trimmed to the packed width.
    pub fn row(&self, y: u32) -> &'a [u8] {
        debug_assert!(y < self.height);
        let start = self.stride * y as usize;
        &self.data[start..start + self.width as usize]
    }
}

impl fmt::Debug for LumaPlane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LumaPlane")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Deref for LumaPlane<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_rejects_short_buffers() {
        let data = vec![0u8; 10];
        let err = LumaPlane::from_parts(4, 4, 4, &data).unwrap_err();
        assert!(matches!(
            err,
            OcrError::InsufficientPlaneData {
                provided: 10,
                required: 16
            }
        ));
    }

    #[test]
    fn from_parts_rejects_strides_below_the_width() {
        let data = vec![0u8; 16];
        let err = LumaPlane::from_parts(4, 2, 2, &data).unwrap_err();
        assert!(matches!(
            err,
            OcrError::StrideTooSmall {
                stride: 2,
                width: 4
            }
        ));
    }

    #[test]
    fn from_parts_trims_padding() {
        let data = vec![7u8; 64];
        let plane = LumaPlane::from_parts(4, 4, 8, &data).expect("valid plane");
        assert_eq!(plane.data().len(), 32);
        assert_eq!(plane.row(3).len(), 4);
    }

    #[test]
    fn from_image_uses_packed_stride() {
        let image = LumaImage::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).expect("valid image");
        let plane = LumaPlane::from_image(&image);
        assert_eq!(plane.stride(), 3);
        assert_eq!(plane.row(1), &[4, 5, 6]);
    }
}
