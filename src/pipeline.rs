// THEORY:
// The `pipeline` module is the top-level API for the compression engine. It
// encapsulates the full per-channel stack behind a single entry point: hand
// it a packed RGBA buffer and a component count, get back the reconstructed
// buffer plus the per-channel diagnostics that make the math inspectable.
// Everything in here is purely functional given its inputs — the pipeline
// holds configuration, never image state.

use std::time::Instant;

use crate::core_modules::channel::{Channel, ChannelPlane};
use crate::core_modules::channel_pca::{ChannelReconstruction, reconstruct_channel};
use crate::error::{PcaError, Result};

// Re-export key data structures for the public API.
pub use crate::core_modules::channel_pca::ChannelDiagnostics;

/// Configuration for a compression run, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image_width: u32,
    pub image_height: u32,
    /// How many principal components to keep per channel, in `[1, width]`.
    pub num_components: usize,
}

impl PipelineConfig {
    /// The largest component count this image admits. UI callers bound
    /// their sliders with this.
    pub fn max_components(&self) -> usize {
        (self.image_width.min(self.image_height)) as usize
    }
}

/// Per-channel diagnostics for a whole image, keyed by color plane.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageAnalysis {
    pub red: ChannelDiagnostics,
    pub green: ChannelDiagnostics,
    pub blue: ChannelDiagnostics,
}

/// The primary output of a compression run.
#[derive(Debug, Clone)]
pub struct CompressionReport {
    /// The reconstructed image as a packed RGBA buffer, alpha fully opaque.
    pub pixels: Vec<u8>,
    /// Display-sized excerpts of each channel's PCA internals.
    pub analysis: ImageAnalysis,
    /// Wall time spent on the PCA work, in seconds.
    pub elapsed_secs: f64,
}

/// The main, top-level struct for the compression engine.
pub struct CompressionPipeline {
    config: PipelineConfig,
}

impl CompressionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compresses a packed RGBA buffer via channel-wise PCA.
    pub fn compress(&self, image_data: &[u8]) -> Result<CompressionReport> {
        let width = self.config.image_width;
        let height = self.config.image_height;
        let k = self.config.num_components;

        if width == 0 || height == 0 {
            return Err(PcaError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if image_data.len() != expected {
            return Err(PcaError::BufferSizeMismatch {
                expected,
                actual: image_data.len(),
            });
        }

        let started = Instant::now();

        // Stage 1: De-interleave and reconstruct each channel, in the fixed
        // order Red, Green, Blue.
        let red = self.process_channel(image_data, Channel::Red, k)?;
        let green = self.process_channel(image_data, Channel::Green, k)?;
        let blue = self.process_channel(image_data, Channel::Blue, k)?;

        // Stage 2: Recombine into a packed RGBA buffer. Samples are real
        // numbers; clamp to [0, 255], round to nearest, force alpha opaque.
        let pixel_count = width as usize * height as usize;
        let mut pixels = vec![0u8; pixel_count * 4];
        for i in 0..pixel_count {
            pixels[i * 4] = clamp_to_u8(red.plane.samples[i]);
            pixels[i * 4 + 1] = clamp_to_u8(green.plane.samples[i]);
            pixels[i * 4 + 2] = clamp_to_u8(blue.plane.samples[i]);
            pixels[i * 4 + 3] = 255;
        }

        Ok(CompressionReport {
            pixels,
            analysis: ImageAnalysis {
                red: red.diagnostics,
                green: green.diagnostics,
                blue: blue.diagnostics,
            },
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    fn process_channel(
        &self,
        image_data: &[u8],
        channel: Channel,
        k: usize,
    ) -> Result<ChannelReconstruction> {
        let plane = ChannelPlane::from_rgba(
            image_data,
            self.config.image_width,
            self.config.image_height,
            channel,
        )?;
        reconstruct_channel(&plane, k)
    }
}

#[inline]
fn clamp_to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_rgba(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                buffer.push(((x * 40 + y * 3) % 256) as u8);
                buffer.push(((x * 7 + y * 31) % 256) as u8);
                buffer.push(((x * 13 + y * 17) % 256) as u8);
                buffer.push(128); // input alpha is ignored
            }
        }
        buffer
    }

    #[test]
    fn full_rank_round_trips_the_image() {
        let width = 6;
        let height = 8;
        let buffer = gradient_rgba(width, height);
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: width,
            image_height: height,
            num_components: width as usize,
        });

        let report = pipeline.compress(&buffer).unwrap();
        assert_eq!(report.pixels.len(), buffer.len());
        for i in 0..(width * height) as usize {
            for c in 0..3 {
                assert_eq!(report.pixels[i * 4 + c], buffer[i * 4 + c]);
            }
            assert_eq!(report.pixels[i * 4 + 3], 255);
        }
    }

    #[test]
    fn full_rank_is_idempotent() {
        let width = 5;
        let height = 7;
        let buffer = gradient_rgba(width, height);
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: width,
            image_height: height,
            num_components: width as usize,
        });

        let first = pipeline.compress(&buffer).unwrap();
        let second = pipeline.compress(&first.pixels).unwrap();
        assert_eq!(first.pixels, second.pixels);
    }

    #[test]
    fn rejects_out_of_range_component_counts() {
        let buffer = gradient_rgba(4, 4);
        for bad_k in [0usize, 5] {
            let pipeline = CompressionPipeline::new(PipelineConfig {
                image_width: 4,
                image_height: 4,
                num_components: bad_k,
            });
            assert_eq!(
                pipeline.compress(&buffer).err(),
                Some(PcaError::InvalidComponentCount {
                    requested: bad_k,
                    max: 4
                })
            );
        }
    }

    #[test]
    fn rejects_empty_image() {
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: 0,
            image_height: 4,
            num_components: 1,
        });
        assert_eq!(
            pipeline.compress(&[]).err(),
            Some(PcaError::EmptyImage {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: 4,
            image_height: 4,
            num_components: 2,
        });
        let short = vec![0u8; 10];
        assert_eq!(
            pipeline.compress(&short).err(),
            Some(PcaError::BufferSizeMismatch {
                expected: 64,
                actual: 10
            })
        );
    }

    #[test]
    fn single_row_image_fails_insufficient_samples() {
        let buffer = gradient_rgba(4, 1);
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: 4,
            image_height: 1,
            num_components: 1,
        });
        assert_eq!(
            pipeline.compress(&buffer).err(),
            Some(PcaError::InsufficientSamples { rows: 1 })
        );
    }

    #[test]
    fn max_components_is_min_dimension() {
        let config = PipelineConfig {
            image_width: 640,
            image_height: 480,
            num_components: 10,
        };
        assert_eq!(config.max_components(), 480);
    }

    #[test]
    fn low_rank_output_stays_in_pixel_range() {
        let width = 8;
        let height = 8;
        let buffer = gradient_rgba(width, height);
        let pipeline = CompressionPipeline::new(PipelineConfig {
            image_width: width,
            image_height: height,
            num_components: 2,
        });
        let report = pipeline.compress(&buffer).unwrap();
        assert_eq!(report.pixels.len(), buffer.len());
        for pixel in report.pixels.chunks(4) {
            assert_eq!(pixel[3], 255);
        }
        assert!(report.elapsed_secs >= 0.0);
        assert!(report.analysis.red.eig_vals.len() <= 10);
    }
}
