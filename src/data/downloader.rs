//! Downloader module for retrieving ephemeris kernels
//!
//! This module handles downloading and caching of SPK files.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::ApsidesError;
use crate::Result;

// JPL Solar System Dynamics archive of DE planetary kernels
const JPL_BSP_URL: &str = "https://ssd.jpl.nasa.gov/ftp/eph/planets/bsp";

/// Get the cache directory path
pub fn get_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("apsides")
}

/// Ensure that the cache directory exists
pub fn ensure_cache_dir() -> io::Result<PathBuf> {
    let cache_dir = get_cache_dir();
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Download URL of a planetary kernel
pub fn ephemeris_url(name: &str) -> String {
    format!("{}/{}", JPL_BSP_URL, name)
}

/// Check if a file exists and is not empty
fn file_exists_and_not_empty<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Download a file from URL to a local path
///
/// The body goes to a `.tmp` sibling first, which is removed if the download
/// fails.
fn download_file<P: AsRef<Path>>(url: &str, path: P) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.as_ref().with_extension("tmp");
    let total = match fetch_into(url, &temp_path) {
        Ok(total) => total,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    fs::rename(&temp_path, path.as_ref())?;
    info!("Downloaded {} bytes to {}", total, path.as_ref().display());

    Ok(())
}

/// Stream the body at `url` into `temp_path`, returning its size in bytes
fn fetch_into(url: &str, temp_path: &Path) -> Result<usize> {
    let mut file = BufWriter::new(File::create(temp_path)?);

    // DE kernels run to tens of megabytes
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| ApsidesError::DataError(format!("Failed to create HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| ApsidesError::DataError(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(ApsidesError::DataError(format!(
            "Failed to download {}, status: {}",
            url,
            response.status()
        )));
    }

    let mut buffer = [0; 64 * 1024];
    let mut total = 0usize;
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| ApsidesError::DataError(format!("Failed to read response: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])?;
        total += bytes_read;
    }

    file.flush()?;
    Ok(total)
}

/// Locate an ephemeris kernel, downloading it into the cache on a miss
pub fn download_ephemeris(name: &str) -> Result<PathBuf> {
    let cache_dir = ensure_cache_dir()?;
    let cached = cache_dir.join(name);

    if file_exists_and_not_empty(&cached) {
        info!("Using cached ephemeris {}", cached.display());
        return Ok(cached);
    }

    // A copy in the working directory, e.g. one skyfield already fetched
    let local = PathBuf::from(name);
    if file_exists_and_not_empty(&local) {
        info!("Using ephemeris from working directory: {}", local.display());
        return Ok(local);
    }

    let url = ephemeris_url(name);
    info!("Downloading {} from {}", name, url);

    download_file(&url, &cached).map_err(|e| {
        warn!("Failed to download {}: {}", name, e);
        e
    })?;

    Ok(cached)
}
