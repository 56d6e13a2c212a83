#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the Reelforge assembly engine.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeout and kill-on-timeout
//! - The audio duration probe (ffprobe)
//! - Pure filter-string builders for every display mode
//! - Crash-safe file publishing (temp write + atomic rename)
//! - Concat-demuxer joining with master audio muxing

pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, ClipEncoder, FfmpegCommand, FfmpegRunner};
pub use concat::concat_clips;
pub use error::{MediaError, MediaResult};
pub use filters::{
    escape_drawtext, ken_burns_filter, placeholder_filter, static_hold_filter,
    word_highlight_filter,
};
pub use fs_utils::move_file;
pub use probe::{probe_duration, DurationProbe, FfprobeDurationProbe};
