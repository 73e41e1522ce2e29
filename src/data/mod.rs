//! Data module for downloading and caching ephemeris kernels
//!
//! Kernels are looked up in a per-user cache directory, then in the working
//! directory, and finally fetched from JPL's planetary kernel archive.

mod downloader;

pub use downloader::{download_ephemeris, ensure_cache_dir, ephemeris_url, get_cache_dir};
