//! Double Array File format module for reading SPICE DAF files
//!
//! This module provides functionality for reading NAIF's Double Array File (DAF)
//! format, which is the container format underneath SPK ephemeris kernels.
//!
//! The file is memory-mapped once when opened and every subsequent read is a
//! slice of that map, so a `DAF` can be shared freely between readers.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};
use memmap2::{Mmap, MmapOptions};

use crate::jplephem::errors::{io_err, JplephemError, Result};

/// Size of a DAF record (bytes)
const RECORD_SIZE: usize = 1024;
/// Size of a double-precision value (bytes)
const DOUBLE_SIZE: usize = 8;
/// Size of the control area at the start of a summary record (bytes)
const SUMMARY_CONTROL_SIZE: usize = 24;
/// FTP corruption detection string - used to validate files
const FTPSTR: &[u8] = b"FTPSTR:\r:\n:\r\n:\r\x00:\x81:\x10\xce:ENDFTP";

/// DAF file endianness
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endian {
    Big,
    Little,
}

/// Double Array File (DAF) file reader
pub struct DAF {
    /// Path to the DAF file
    pub path: PathBuf,
    /// Memory map of the whole file
    map: Mmap,
    /// File version word
    pub locidw: String,
    /// Number of double-precision components
    pub nd: u32,
    /// Number of integer components
    pub ni: u32,
    /// Forward pointer to first summary record
    pub fward: u32,
    /// Backward pointer to last summary record
    pub bward: u32,
    /// First free address
    pub free: u32,
    /// Internal file name
    pub ifname: String,
    /// Byte order (endianness)
    pub endian: Endian,
    /// Size of each summary entry in bytes
    summary_step: usize,
}

impl DAF {
    /// Open a DAF file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf).map_err(|e| io_err(&path_buf, e))?;

        // The file is treated as read-only for the lifetime of the map
        let map = unsafe { MmapOptions::new().map(&file) }.map_err(|e| io_err(&path_buf, e))?;

        if map.len() < RECORD_SIZE {
            return Err(JplephemError::InvalidFormat(format!(
                "{} is shorter than a single DAF record",
                path_buf.display()
            )));
        }

        let header = &map[..RECORD_SIZE];
        let locidw = String::from_utf8_lossy(&header[0..8])
            .trim_end()
            .to_string();

        if !locidw.starts_with("DAF/") {
            return Err(JplephemError::InvalidFormat(format!(
                "Unrecognized DAF identification word {:?}",
                locidw
            )));
        }

        check_ftp_damage(header)?;
        let endian = detect_endian(header)?;

        let read_u32 = |offset: usize| match endian {
            Endian::Little => LittleEndian::read_u32(&header[offset..offset + 4]),
            Endian::Big => BigEndian::read_u32(&header[offset..offset + 4]),
        };

        let nd = read_u32(8);
        let ni = read_u32(12);
        let ifname = String::from_utf8_lossy(&header[16..76])
            .trim_end()
            .to_string();
        let fward = read_u32(76);
        let bward = read_u32(80);
        let free = read_u32(84);

        // For each summary, we need ND doubles + (NI+1)/2 doubles to fit NI integers
        let summary_step = DOUBLE_SIZE * (nd as usize + (ni as usize + 1) / 2);

        let daf = DAF {
            path: path_buf,
            map,
            locidw,
            nd,
            ni,
            fward,
            bward,
            free,
            ifname,
            endian,
            summary_step,
        };

        debug!(
            "DAF header: locidw={}, nd={}, ni={}, fward={}, bward={}, free={}, ifname={}, endian={:?}",
            daf.locidw, daf.nd, daf.ni, daf.fward, daf.bward, daf.free, daf.ifname, daf.endian
        );

        if !daf.is_valid() {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid DAF header: nd={}, ni={}, fward={}, bward={}, free={}",
                daf.nd, daf.ni, daf.fward, daf.bward, daf.free
            )));
        }

        Ok(daf)
    }

    /// Check if the DAF header is valid
    fn is_valid(&self) -> bool {
        self.nd > 0
            && self.ni > 0
            && self.fward > 0
            && self.bward > 0
            && self.free > 0
            && self.summary_step <= RECORD_SIZE - SUMMARY_CONTROL_SIZE
    }

    fn read_f64(&self, bytes: &[u8]) -> f64 {
        match self.endian {
            Endian::Big => BigEndian::read_f64(bytes),
            Endian::Little => LittleEndian::read_f64(bytes),
        }
    }

    fn read_i32(&self, bytes: &[u8]) -> i32 {
        match self.endian {
            Endian::Big => BigEndian::read_i32(bytes),
            Endian::Little => LittleEndian::read_i32(bytes),
        }
    }

    /// Read a record (1024 bytes) at the given record number (1-indexed)
    pub fn read_record(&self, record_number: usize) -> Result<&[u8]> {
        if record_number < 1 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid record number: {}",
                record_number
            )));
        }

        let offset = (record_number - 1) * RECORD_SIZE;
        self.map.get(offset..offset + RECORD_SIZE).ok_or_else(|| {
            JplephemError::InvalidFormat(format!(
                "Record {} lies beyond the end of {}",
                record_number,
                self.path.display()
            ))
        })
    }

    /// Read the summary records and extract segment information
    ///
    /// Each entry pairs the raw name bytes with the summary values: `nd`
    /// doubles followed by `ni` integers widened to `f64`.
    pub fn summaries(&self) -> Result<Vec<(Vec<u8>, Vec<f64>)>> {
        let mut result = Vec::new();
        let mut visited_records = HashSet::new();
        let max_summaries = (RECORD_SIZE - SUMMARY_CONTROL_SIZE) / self.summary_step;

        let mut record_number = self.fward as usize;

        while record_number > 0 {
            // Avoid cycles
            if !visited_records.insert(record_number) {
                warn!(
                    "Cycle detected in summary records at record {}",
                    record_number
                );
                break;
            }

            let summary_data = self.read_record(record_number)?;
            // The name record immediately follows its summary record
            let name_data = self.read_record(record_number + 1)?;

            // Control values NEXT, PREV, NSUM are stored as doubles
            let next = self.read_f64(&summary_data[0..8]) as usize;
            let n_summaries = self.read_f64(&summary_data[16..24]) as usize;

            debug!(
                "Summary record {}: NEXT={}, NSUM={}",
                record_number, next, n_summaries
            );

            if n_summaries > max_summaries {
                return Err(JplephemError::InvalidFormat(format!(
                    "Summary record {} claims {} summaries, at most {} fit",
                    record_number, n_summaries, max_summaries
                )));
            }

            for i in 0..n_summaries {
                let start = SUMMARY_CONTROL_SIZE + i * self.summary_step;
                let summary = &summary_data[start..start + self.summary_step];
                let name = name_data[i * self.summary_step..(i + 1) * self.summary_step].to_vec();

                let mut values = Vec::with_capacity((self.nd + self.ni) as usize);

                for j in 0..self.nd as usize {
                    let pos = j * DOUBLE_SIZE;
                    values.push(self.read_f64(&summary[pos..pos + DOUBLE_SIZE]));
                }

                // Integers are packed two to a double after the doubles
                let int_start = self.nd as usize * DOUBLE_SIZE;
                for j in 0..self.ni as usize {
                    let pos = int_start + j * 4;
                    values.push(self.read_i32(&summary[pos..pos + 4]) as f64);
                }

                result.push((name, values));
            }

            record_number = next;
        }

        debug!("Total summaries extracted: {}", result.len());

        Ok(result)
    }

    /// Read an array of f64 values from the file
    ///
    /// `start` and `end` are 1-based word addresses, both inclusive, as stored
    /// in segment descriptors.
    pub fn read_array(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start < 1 || end < start {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid array bounds: start={}, end={}",
                start, end
            )));
        }

        let bytes = self
            .map
            .get((start - 1) * DOUBLE_SIZE..end * DOUBLE_SIZE)
            .ok_or_else(|| {
                JplephemError::InvalidFormat(format!(
                    "Array {}..{} lies beyond the end of {}",
                    start,
                    end,
                    self.path.display()
                ))
            })?;

        Ok(bytes
            .chunks_exact(DOUBLE_SIZE)
            .map(|chunk| self.read_f64(chunk))
            .collect())
    }
}

/// Reject files whose binary header was mangled by an ASCII-mode transfer
fn check_ftp_damage(header: &[u8]) -> Result<()> {
    let tail = &header[500..];
    let first = tail.iter().position(|&b| b != 0);
    let last = tail.iter().rposition(|&b| b != 0);

    match (first, last) {
        (Some(first), Some(last)) if &tail[first..=last] != FTPSTR => {
            Err(JplephemError::InvalidFormat(
                "DAF file was damaged by an ASCII-mode FTP transfer".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Determine the byte order from LOCFMT, or guess it from ND/NI
fn detect_endian(header: &[u8]) -> Result<Endian> {
    match &header[88..96] {
        b"LTL-IEEE" => return Ok(Endian::Little),
        b"BIG-IEEE" => return Ok(Endian::Big),
        _ => {}
    }

    // ND and NI are small values (2 and 6 for SPK files)
    let plausible = |nd: u32, ni: u32| (1..10).contains(&nd) && (1..10).contains(&ni);

    if plausible(
        LittleEndian::read_u32(&header[8..12]),
        LittleEndian::read_u32(&header[12..16]),
    ) {
        warn!("DAF file has no LOCFMT; assuming little-endian");
        Ok(Endian::Little)
    } else if plausible(
        BigEndian::read_u32(&header[8..12]),
        BigEndian::read_u32(&header[12..16]),
    ) {
        warn!("DAF file has no LOCFMT; assuming big-endian");
        Ok(Endian::Big)
    } else {
        Err(JplephemError::InvalidFormat(
            "Could not determine DAF byte order".to_string(),
        ))
    }
}
