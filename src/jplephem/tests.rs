//! Tests for the jplephem module
//!
//! These tests write small synthetic SPK kernels to a temporary directory and
//! read them back, so they run without any downloaded ephemeris.

use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use super::daf::{Endian, DAF};
use super::errors::{JplephemError, Result};
use super::spk::SPK;

const RECORD_SIZE: usize = 1024;

/// One segment of a synthetic kernel
pub(crate) struct SyntheticSegment {
    pub center: i32,
    pub target: i32,
    pub data_type: i32,
    /// TDB seconds past J2000 of the first record
    pub init: f64,
    /// Seconds covered by each record
    pub intlen: f64,
    /// Coefficients of each record, midpoint and radius excluded
    pub records: Vec<Vec<f64>>,
}

impl SyntheticSegment {
    /// A type 2 segment whose single record spans `init..init + intlen`
    pub fn linear(center: i32, target: i32, init: f64, intlen: f64, x: [f64; 2], y: [f64; 2], z: [f64; 2]) -> Self {
        SyntheticSegment {
            center,
            target,
            data_type: 2,
            init,
            intlen,
            records: vec![[x, y, z].concat()],
        }
    }

    fn end(&self) -> f64 {
        self.init + self.intlen * self.records.len() as f64
    }

    fn words(&self) -> Vec<f64> {
        let mut words = Vec::new();
        for (k, record) in self.records.iter().enumerate() {
            words.push(self.init + (k as f64 + 0.5) * self.intlen);
            words.push(self.intlen / 2.0);
            words.extend_from_slice(record);
        }
        let rsize = self.records.first().map_or(2, |r| r.len() + 2);
        words.extend_from_slice(&[self.init, self.intlen, rsize as f64, self.records.len() as f64]);
        words
    }
}

fn pad_to_record(buf: &mut Vec<u8>) {
    let len = buf.len().div_ceil(RECORD_SIZE) * RECORD_SIZE;
    buf.resize(len, 0);
}

fn spk_bytes<B: ByteOrder>(segments: &[SyntheticSegment], locfmt: &[u8; 8]) -> Vec<u8> {
    // Records 2 and 3 hold the summaries and names, data starts at record 4
    let mut address = 3 * RECORD_SIZE / 8 + 1;
    let mut descriptors = Vec::new();
    let mut data = Vec::new();

    for segment in segments {
        let words = segment.words();
        descriptors.push((segment, address, address + words.len() - 1));
        address += words.len();
        for w in words {
            data.write_f64::<B>(w).unwrap();
        }
    }

    let mut buf = Vec::new();

    // File record
    buf.extend_from_slice(b"DAF/SPK ");
    buf.write_u32::<B>(2).unwrap();
    buf.write_u32::<B>(6).unwrap();
    buf.extend_from_slice(&format!("{:<60}", "SYNTHETIC TEST KERNEL").into_bytes());
    buf.write_u32::<B>(2).unwrap();
    buf.write_u32::<B>(2).unwrap();
    buf.write_u32::<B>(address as u32).unwrap();
    buf.extend_from_slice(locfmt);
    pad_to_record(&mut buf);

    // Summary record
    buf.write_f64::<B>(0.0).unwrap();
    buf.write_f64::<B>(0.0).unwrap();
    buf.write_f64::<B>(descriptors.len() as f64).unwrap();
    for (segment, start_i, end_i) in &descriptors {
        buf.write_f64::<B>(segment.init).unwrap();
        buf.write_f64::<B>(segment.end()).unwrap();
        for value in [
            segment.target,
            segment.center,
            1,
            segment.data_type,
            *start_i as i32,
            *end_i as i32,
        ] {
            buf.write_i32::<B>(value).unwrap();
        }
    }
    pad_to_record(&mut buf);

    // Name record
    for (segment, _, _) in &descriptors {
        let name = format!("{:<40}", format!("SYNTH {} -> {}", segment.center, segment.target));
        buf.extend_from_slice(name.as_bytes());
    }
    pad_to_record(&mut buf);

    buf.extend_from_slice(&data);
    pad_to_record(&mut buf);
    buf
}

/// Write a little-endian synthetic SPK kernel
pub(crate) fn write_spk(path: &Path, segments: &[SyntheticSegment]) {
    let bytes = spk_bytes::<LittleEndian>(segments, b"LTL-IEEE");
    std::fs::File::create(path)
        .and_then(|mut f| f.write_all(&bytes))
        .unwrap();
}

fn sun_and_earth() -> Vec<SyntheticSegment> {
    vec![
        SyntheticSegment::linear(0, 10, -1000.0, 2000.0, [1000.0, 500.0], [-200.0, 0.0], [0.0, 50.0]),
        SyntheticSegment {
            center: 0,
            target: 3,
            data_type: 2,
            init: -1000.0,
            intlen: 1000.0,
            records: vec![
                vec![1.0, 0.0, 10.0, 0.0, 100.0, 0.0],
                vec![2.0, 0.0, 20.0, 0.0, 200.0, 0.0],
            ],
        },
    ]
}

fn open_synthetic(segments: &[SyntheticSegment]) -> Result<(tempfile::TempDir, SPK)> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synthetic.bsp");
    write_spk(&path, segments);
    let spk = SPK::open(&path)?;
    Ok((dir, spk))
}

#[test]
fn test_daf_header() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("header.bsp");
    write_spk(&path, &sun_and_earth());

    let daf = DAF::open(&path)?;
    assert_eq!(daf.locidw, "DAF/SPK");
    assert_eq!(daf.nd, 2);
    assert_eq!(daf.ni, 6);
    assert_eq!(daf.fward, 2);
    assert_eq!(daf.endian, Endian::Little);
    assert_eq!(daf.ifname, "SYNTHETIC TEST KERNEL");

    let summaries = daf.summaries()?;
    assert_eq!(summaries.len(), 2);

    let (name, values) = &summaries[0];
    assert_eq!(name.len(), 40);
    assert!(String::from_utf8_lossy(name).starts_with("SYNTH 0 -> 10"));
    assert_eq!(&values[..6], &[-1000.0, 1000.0, 10.0, 0.0, 1.0, 2.0]);

    // First data word of the first segment is its record midpoint
    let start = values[6] as usize;
    let array = daf.read_array(start, start + 3)?;
    assert_eq!(array, vec![0.0, 1000.0, 1000.0, 500.0]);

    Ok(())
}

#[test]
fn test_big_endian_kernel() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bsp");
    std::fs::write(&path, spk_bytes::<BigEndian>(&sun_and_earth(), b"BIG-IEEE")).unwrap();

    let spk = SPK::open(&path)?;
    assert_eq!(spk.daf.endian, Endian::Big);
    assert_eq!(spk.segments.len(), 2);

    let position = spk.compute(0, 10, 0.0, 0.0)?;
    assert_relative_eq!(position.x, 1000.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_missing_locfmt_falls_back_to_guess() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.bsp");
    std::fs::write(&path, spk_bytes::<LittleEndian>(&sun_and_earth(), &[0; 8])).unwrap();

    let daf = DAF::open(&path)?;
    assert_eq!(daf.endian, Endian::Little);
    Ok(())
}

#[test]
fn test_rejects_bad_files() {
    let dir = tempfile::tempdir().unwrap();

    let short = dir.path().join("short.bsp");
    std::fs::write(&short, b"DAF/SPK ").unwrap();
    assert!(matches!(DAF::open(&short), Err(JplephemError::InvalidFormat(_))));

    let mut bytes = spk_bytes::<LittleEndian>(&sun_and_earth(), b"LTL-IEEE");
    bytes[700..710].copy_from_slice(b"GARBLED\r\n!");
    let damaged = dir.path().join("damaged.bsp");
    std::fs::write(&damaged, bytes).unwrap();
    assert!(matches!(DAF::open(&damaged), Err(JplephemError::InvalidFormat(_))));

    let missing = dir.path().join("missing.bsp");
    assert!(matches!(DAF::open(&missing), Err(JplephemError::FileError { .. })));
}

#[test]
fn test_segments_are_indexed() -> Result<()> {
    let (_dir, spk) = open_synthetic(&sun_and_earth())?;

    assert_eq!(spk.segments.len(), 2);
    let sun = spk.get_segment(0, 10)?;
    assert_eq!(sun.data_type, 2);
    assert_eq!(sun.source, "SYNTH 0 -> 10");
    assert_eq!(spk.center_of(3), Some(0));
    assert_eq!(spk.center_of(301), None);
    assert!(sun.to_string().contains("Solar System Barycenter (0) -> Sun (10)"));

    assert!(matches!(
        spk.get_segment(3, 301),
        Err(JplephemError::BodyNotFound { center: 3, target: 301 })
    ));
    Ok(())
}

#[test]
fn test_compute_linear_segment() -> Result<()> {
    let (_dir, spk) = open_synthetic(&sun_and_earth())?;

    // Midpoint of the record: s = 0
    let mid = spk.compute(0, 10, 0.0, 0.0)?;
    assert_relative_eq!(mid.x, 1000.0, epsilon = 1e-9);
    assert_relative_eq!(mid.y, -200.0, epsilon = 1e-9);
    assert_relative_eq!(mid.z, 0.0, epsilon = 1e-9);

    // Final epoch: s = 1, split time parts are summed
    let end = spk.compute(0, 10, 900.0, 100.0)?;
    assert_relative_eq!(end.x, 1500.0, epsilon = 1e-9);
    assert_relative_eq!(end.z, 50.0, epsilon = 1e-9);

    let quarter = spk.compute(0, 10, -500.0, 0.0)?;
    assert_relative_eq!(quarter.x, 750.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_compute_selects_record() -> Result<()> {
    let (_dir, spk) = open_synthetic(&sun_and_earth())?;

    let first = spk.compute(0, 3, -1.0, 0.0)?;
    assert_relative_eq!(first.x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(first.y, 10.0, epsilon = 1e-12);
    assert_relative_eq!(first.z, 100.0, epsilon = 1e-12);

    let second = spk.compute(0, 3, 1.0, 0.0)?;
    assert_relative_eq!(second.x, 2.0, epsilon = 1e-12);

    // The very last epoch belongs to the last record
    let last = spk.compute(0, 3, 1000.0, 0.0)?;
    assert_relative_eq!(last.z, 200.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_type3_uses_position_components() -> Result<()> {
    let segment = SyntheticSegment {
        center: 3,
        target: 301,
        data_type: 3,
        init: 0.0,
        intlen: 100.0,
        records: vec![vec![
            5.0, 1.0, // x
            6.0, 0.0, // y
            7.0, 0.0, // z
            -1.0, 0.0, // vx
            -1.0, 0.0, // vy
            -1.0, 0.0, // vz
        ]],
    };
    let (_dir, spk) = open_synthetic(&[segment])?;

    let position = spk.compute(3, 301, 100.0, 0.0)?;
    assert_relative_eq!(position.x, 6.0, epsilon = 1e-12);
    assert_relative_eq!(position.y, 6.0, epsilon = 1e-12);
    assert_relative_eq!(position.z, 7.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_out_of_range_and_unsupported() -> Result<()> {
    let mut segments = sun_and_earth();
    segments.push(SyntheticSegment {
        center: 0,
        target: 4,
        data_type: 5,
        init: 0.0,
        intlen: 10.0,
        records: vec![vec![0.0; 6]],
    });
    let (_dir, spk) = open_synthetic(&segments)?;

    assert!(matches!(
        spk.compute(0, 10, 5000.0, 0.0),
        Err(JplephemError::OutOfRangeError { .. })
    ));
    assert!(matches!(
        spk.compute(0, 4, 5.0, 0.0),
        Err(JplephemError::UnsupportedDataType(5))
    ));
    Ok(())
}
