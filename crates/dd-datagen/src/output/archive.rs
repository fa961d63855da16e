use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use orion_error::StructError;
use orion_error::ErrorOweBase;
use rand::Rng;

use crate::error::{GenReason, GenResult};
use crate::model::CategoryModel;
use crate::synth::{TimeWindow, synthesize};

/// File extension of the compressed container.
pub const ARCHIVE_EXTENSION: &str = "gz";

/// Written between records; never after the last one.
pub const RECORD_SEPARATOR: &[u8] = b"\n";

/// Write `count` newline-separated JSON records to `out`.
///
/// No separator follows the final record, so `count == 0` writes nothing.
/// Returns the number of records written.
pub fn write_records<W, R>(
    out: &mut W,
    count: u64,
    model: &CategoryModel,
    window: &TimeWindow,
    rng: &mut R,
) -> GenResult<u64>
where
    W: Write,
    R: Rng,
{
    for i in 0..count {
        let event = synthesize(model, window, rng).map_err(|e| {
            StructError::from(GenReason::from(&e)).with_detail(e.to_string())
        })?;
        serde_json::to_writer(&mut *out, &event).owe(GenReason::Encode)?;
        if i + 1 < count {
            out.write_all(RECORD_SEPARATOR).owe(GenReason::Io)?;
        }
    }
    Ok(count)
}

/// Create (or truncate) a gzip archive at `path` and fill it with `count`
/// records. The gzip stream is finished before returning, so the file is a
/// complete, independently decompressible member.
pub fn write_archive<R: Rng>(
    path: &Path,
    count: u64,
    model: &CategoryModel,
    window: &TimeWindow,
    level: u32,
    rng: &mut R,
) -> GenResult<u64> {
    let io_err = |action: &str, e: std::io::Error| {
        StructError::from(GenReason::Io).with_detail(format!("{action} {}: {e}", path.display()))
    };

    let file = File::create(path).map_err(|e| io_err("create", e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::new(level));

    let written = write_records(&mut encoder, count, model, window, rng)?;

    let mut inner = encoder.finish().map_err(|e| io_err("finish", e))?;
    inner.flush().map_err(|e| io_err("flush", e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use chrono::{TimeDelta, TimeZone, Utc};
    use flate2::read::GzDecoder;
    use orion_error::ErrorCode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::sampler::SampleError;

    fn window() -> TimeWindow {
        TimeWindow::ending_at(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            TimeDelta::days(10),
        )
    }

    fn decompress(path: &Path) -> String {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn records_without_trailing_separator() {
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut buf = Vec::new();

        let n = write_records(&mut buf, 25, &model, &window(), &mut rng).unwrap();
        assert_eq!(n, 25);

        let text = String::from_utf8(buf).unwrap();
        assert!(!text.ends_with('\n'));
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 25);
        for line in lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(v["messageId"].is_string());
        }
    }

    #[test]
    fn single_record_has_no_separator() {
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut buf = Vec::new();
        write_records(&mut buf, 1, &model, &window(), &mut rng).unwrap();
        assert!(!buf.contains(&b'\n'));
    }

    #[test]
    fn zero_count_archive_is_empty_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archives_00.gz");
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let n = write_archive(&path, 0, &model, &window(), 6, &mut rng).unwrap();
        assert_eq!(n, 0);
        assert!(path.exists());
        assert_eq!(decompress(&path), "");
    }

    #[test]
    fn archive_round_trips_through_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archives_01.gz");
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        write_archive(&path, 500, &model, &window(), 9, &mut rng).unwrap();

        let text = decompress(&path);
        assert_eq!(text.split('\n').count(), 500);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archives_02.gz");
        std::fs::write(&path, vec![0xAB; 4096]).unwrap();
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        write_archive(&path, 3, &model, &window(), 1, &mut rng).unwrap();
        assert_eq!(decompress(&path).split('\n').count(), 3);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/archives_00.gz");
        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let err = write_archive(&path, 10, &model, &window(), 6, &mut rng).unwrap_err();
        let dbg = format!("{err:?}");
        assert!(dbg.contains("Io") && dbg.contains("create"), "{dbg}");
    }

    #[test]
    fn bad_latency_keeps_its_own_reason() {
        let mut model = CategoryModel::builtin().unwrap();
        for app in &mut model.apps {
            for et in &mut app.event_types {
                et.latency.stddev = -1.0;
            }
        }
        let mut rng = StdRng::seed_from_u64(8);
        let err = write_records(&mut Vec::new(), 1, &model, &window(), &mut rng).unwrap_err();
        let dbg = format!("{err:?}");
        assert!(dbg.contains("InvalidLatency"), "{dbg}");
        assert!(!dbg.contains("InvalidDistribution"), "{dbg}");
    }

    #[test]
    fn sample_errors_map_by_variant() {
        let dist = SampleError::InvalidDistribution { len: 0, total: 0.0 };
        let lat = SampleError::InvalidLatency {
            mean: 1.0,
            stddev: -1.0,
        };
        assert_eq!(GenReason::from(&dist), GenReason::InvalidDistribution);
        assert_eq!(GenReason::from(&lat), GenReason::InvalidLatency);
        assert_eq!(GenReason::from(&lat).error_code(), 2106);
    }

    #[test]
    fn failing_writer_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let model = CategoryModel::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(write_records(&mut Broken, 2, &model, &window(), &mut rng).is_err());
    }
}
