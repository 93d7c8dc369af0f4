#[cfg(feature = "engine-tesseract")]
pub(crate) mod tesseract;
