//! Size-targeted JPEG compression for screenshots.
//!
//! The media host rejects images above a fixed byte limit, so oversized
//! screenshots are re-encoded before upload: first by lowering JPEG quality,
//! then by shrinking the resolution.

use anyhow::{Context, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// First quality tried; each further attempt lowers it by [`QUALITY_STEP`].
pub const START_QUALITY: u8 = 90;
pub const QUALITY_STEP: u8 = 10;
/// Resolution search never produces a side shorter than this.
pub const MIN_DIMENSION: u32 = 512;
pub const SCALE_FACTOR: f64 = 0.8;

/// Result of a compression run.
///
/// `within_target == false` is a soft failure: the buffer is the smallest
/// encoding the search could produce, and callers decide what to do with it.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub data: Bytes,
    pub size_bytes: usize,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub within_target: bool,
}

/// Quality-then-resolution search for an encoding under a byte budget
pub struct ImageCompressor;

impl ImageCompressor {
    /// Decode `data` and compress it. Fails only if the bytes are not a
    /// decodable image or the encoder errors.
    pub fn compress_bytes(
        data: &[u8],
        target_bytes: u64,
        min_quality: u8,
    ) -> Result<CompressionResult> {
        let img = image::load_from_memory(data).context("Failed to decode image")?;
        Self::compress(&img, target_bytes, min_quality)
    }

    /// Compress `img` to JPEG so that the output is at most `target_bytes`.
    ///
    /// Phase 1 encodes at quality 90, 80, ... down to `min_quality`.
    /// Phase 2 (only if phase 1 missed the target) scales both sides by 0.8
    /// with Lanczos resampling and re-encodes at `min_quality`, stopping once
    /// the target is met or the next step would go below 512 px.
    pub fn compress(
        img: &DynamicImage,
        target_bytes: u64,
        min_quality: u8,
    ) -> Result<CompressionResult> {
        let min_quality = min_quality.clamp(1, START_QUALITY);
        // JPEG has no alpha channel.
        let source = img.to_rgb8();
        let (width, height) = source.dimensions();

        let mut best: Option<CompressionResult> = None;

        let mut quality = START_QUALITY;
        loop {
            let data = Self::encode_jpeg(&source, quality)?;
            let attempt = Self::attempt(data, quality, width, height, target_bytes);

            tracing::debug!(
                quality = quality,
                size_bytes = attempt.size_bytes,
                target_bytes = target_bytes,
                "JPEG quality attempt"
            );

            if attempt.within_target {
                return Ok(attempt);
            }
            best = Some(Self::smaller(best, attempt));

            match quality.checked_sub(QUALITY_STEP) {
                Some(next) if next >= min_quality => quality = next,
                _ => break,
            }
        }

        let (mut cur_width, mut cur_height) = (width, height);
        loop {
            let next_width = (cur_width as f64 * SCALE_FACTOR) as u32;
            let next_height = (cur_height as f64 * SCALE_FACTOR) as u32;
            if next_width < MIN_DIMENSION || next_height < MIN_DIMENSION {
                break;
            }
            cur_width = next_width;
            cur_height = next_height;

            // Always resample from the source so quality loss does not compound.
            let resized =
                image::imageops::resize(&source, cur_width, cur_height, FilterType::Lanczos3);
            let data = Self::encode_jpeg(&resized, min_quality)?;
            let attempt = Self::attempt(data, min_quality, cur_width, cur_height, target_bytes);

            tracing::debug!(
                width = cur_width,
                height = cur_height,
                size_bytes = attempt.size_bytes,
                target_bytes = target_bytes,
                "JPEG resize attempt"
            );

            if attempt.within_target {
                return Ok(attempt);
            }
            best = Some(Self::smaller(best, attempt));
        }

        let best = best.context("compression produced no attempt")?;
        tracing::warn!(
            size_bytes = best.size_bytes,
            target_bytes = target_bytes,
            quality = best.quality,
            width = best.width,
            height = best.height,
            "Image still exceeds target after compression"
        );
        Ok(best)
    }

    fn attempt(
        data: Bytes,
        quality: u8,
        width: u32,
        height: u32,
        target_bytes: u64,
    ) -> CompressionResult {
        let size_bytes = data.len();
        CompressionResult {
            data,
            size_bytes,
            quality,
            width,
            height,
            within_target: size_bytes as u64 <= target_bytes,
        }
    }

    fn smaller(best: Option<CompressionResult>, attempt: CompressionResult) -> CompressionResult {
        match best {
            Some(best) if best.size_bytes <= attempt.size_bytes => best,
            _ => attempt,
        }
    }

    /// Encode to baseline JPEG using mozjpeg
    fn encode_jpeg(rgb_img: &RgbImage, quality: u8) -> Result<Bytes> {
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(rgb_img)?;
        let jpeg_data = comp.finish()?;

        Ok(Bytes::from(jpeg_data))
    }
}
