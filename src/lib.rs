#![allow(non_snake_case)]
//! # savedMedia2archive
//!
//! A command-line tool that rebuilds a personal media archive from a
//! "Saved Media" JSON export.
//!
//! Every entry in the export is downloaded, its real file type is detected,
//! videos are remuxed so they are seekable, and the capture time is written
//! back into the file as local time at the place it was taken, together with
//! the GPS position. Photo and video viewers then sort and map the archive
//! correctly.
//!
//! ## Features
//!
//! - Resumable, sequential downloads into zero-padded, numbered files
//! - File type detection independent of the export's labels
//! - Lossless container repair for videos
//! - Longitude-based local time estimation with regional DST rules
//! - EXIF tags for images, QuickTime tags and ISO 6709 locations for videos
//! - Filesystem modification times matching the capture time

pub mod config;
pub mod dst;
pub mod error;
pub mod import;
pub mod inspect;
pub mod localize;
pub mod location;
pub mod manifest;
pub mod media_type;
pub mod metadata;
pub mod repair;
pub mod toolkit;
