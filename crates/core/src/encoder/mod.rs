//! Rendition encoder.
//!
//! This module provides the `RenditionEncoder` trait and the FFmpeg-based
//! implementation that turns a source video into one HLS variant: a playlist
//! plus fixed-duration segments under `<output_dir>/v<index>/`.
//!
//! # Features
//!
//! - Scaling to the rendition height, keeping aspect ratio with an even width
//! - H.264 video and AAC audio at the rendition bitrate
//! - HLS segmentation (2-second segments by default)
//! - CPU governor wrapping (`cpulimit`) at a share of host capacity
//! - Live progress streamed into the progress store
//!
//! # Example
//!
//! ```ignore
//! use hlsladder_core::encoder::{EncodeRequest, EncoderConfig, FfmpegEncoder, RenditionEncoder};
//! use hlsladder_core::{Ladder, ProgressStore};
//!
//! let encoder = FfmpegEncoder::new(EncoderConfig::default());
//! encoder.validate().await?;
//!
//! let store = Arc::new(ProgressStore::new());
//! let rendition = Ladder::standard().get(0).unwrap().clone();
//! let tracker = store.tracker("movie.mp4", rendition.height);
//!
//! let output = encoder
//!     .encode(
//!         EncodeRequest {
//!             job_id: "movie.mp4".to_string(),
//!             source_path: PathBuf::from("uploads/movie.mp4"),
//!             output_dir: PathBuf::from("uploads/hls_movie"),
//!             rendition,
//!         },
//!         tracker,
//!     )
//!     .await?;
//! println!("Variant written to {:?}", output.playlist_path);
//! ```

mod config;
mod cpu;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use cpu::CpuBudget;
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::RenditionEncoder;
pub use types::{EncodeOutput, EncodeRequest};
