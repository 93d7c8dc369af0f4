use std::path::PathBuf;
use std::process::Command;

use image::GrayImage;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::response::{Detection, OcrResponse};

const DEFAULT_BINARY: &str = "tesseract";
const DEFAULT_LANGUAGE: &str = "eng";
/// Page segmentation mode 6: one uniform block of text.
const PAGE_SEGMENTATION_MODE: &str = "6";
/// TSV rows at this level describe single words.
const WORD_LEVEL: i32 = 5;

/// Recognizer backed by the `tesseract` command-line binary.
///
/// Each call writes the plane to a temporary PNG, asks tesseract for TSV
/// output, and folds word rows back into line-level detections. Tesseract
/// reports confidence on a 0-100 scale; detections carry it rescaled to
/// `[0, 1]`.
pub struct TesseractOcrEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractOcrEngine {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for TesseractOcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractOcrEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        match Command::new(&self.binary).arg("--version").output() {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(OcrError::backend(format!(
                "tesseract --version exited with {}",
                output.status
            ))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(OcrError::backend(
                format!("tesseract binary {:?} not found on PATH", self.binary),
            )),
            Err(err) => Err(OcrError::Io(err)),
        }
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let plane = request.plane();
        let mut packed =
            Vec::with_capacity(plane.width() as usize * plane.height() as usize);
        for y in 0..plane.height() {
            packed.extend_from_slice(plane.row(y));
        }
        let image = GrayImage::from_raw(plane.width(), plane.height(), packed)
            .ok_or_else(|| OcrError::backend("plane did not form a valid grayscale image"))?;

        let input = NamedTempFile::with_suffix(".png")?;
        image
            .save(input.path())
            .map_err(|err| OcrError::backend(format!("failed to encode input image: {err}")))?;

        // Tesseract appends .tsv to the output base path.
        let output_base = NamedTempFile::new()?;
        let base = output_base.path().to_string_lossy().into_owned();

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg(&base)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(PAGE_SEGMENTATION_MODE)
            .arg("tsv")
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv_path = format!("{base}.tsv");
        let tsv = std::fs::read_to_string(&tsv_path)?;
        let _ = std::fs::remove_file(&tsv_path);

        let detections = parse_tsv(&tsv);
        debug!(candidates = detections.len(), "tesseract recognition finished");
        Ok(OcrResponse::new(detections))
    }
}

// TSV columns: level, page_num, block_num, par_num, line_num, word_num,
// left, top, width, height, conf, text
fn parse_tsv(tsv: &str) -> Vec<Detection> {
    let mut detections = Vec::new();
    let mut line_key: Option<(i32, i32, i32)> = None;
    let mut words: Vec<&str> = Vec::new();
    let mut conf_sum = 0.0f32;

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != WORD_LEVEL {
            continue;
        }
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        if line_key != Some(key) {
            flush_line(&mut detections, &mut words, &mut conf_sum);
            line_key = Some(key);
        }
        words.push(text);
        conf_sum += conf;
    }
    flush_line(&mut detections, &mut words, &mut conf_sum);
    detections
}

fn flush_line(detections: &mut Vec<Detection>, words: &mut Vec<&str>, conf_sum: &mut f32) {
    if words.is_empty() {
        return;
    }
    let confidence = (*conf_sum / words.len() as f32 / 100.0).clamp(0.0, 1.0);
    detections.push(Detection::new(words.join(" "), confidence));
    words.clear();
    *conf_sum = 0.0;
}
