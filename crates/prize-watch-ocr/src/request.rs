use crate::plane::LumaPlane;

/// Recognizer invocation: one normalized luminance plane.
///
/// The caller has already cropped to the display region, so engines read the
/// whole plane.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    plane: LumaPlane<'a>,
}

impl<'a> OcrRequest<'a> {
    pub fn new(plane: LumaPlane<'a>) -> Self {
        Self { plane }
    }

    pub fn plane(&self) -> &LumaPlane<'a> {
        &self.plane
    }
}
