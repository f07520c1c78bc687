use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::dot_locations::{DefectDatabase, ParserOptions};
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::RemovalConfig;
use crate::image_pipeline::conversions::{
    collect_input_files, BatchRunner, CancellationFlag, FileOutcome, PinkDotPipeline,
};
use crate::image_pipeline::correction::{CorrectionMode, PixelSink, PixelSource};
use crate::image_pipeline::raw::{RawImageData, RawImageReader};
use crate::image_pipeline::tiff::{TiffCompression, TiffWriter};

const DOT_DATA: &str = "\
N::CAM::100,100
10,-5,5,4,4
";

struct MockReader {
    should_fail: bool,
    mock_data: Option<RawImageData>,
    cancel_on_read: Option<CancellationFlag>,
}

impl MockReader {
    fn frame(image: RawImageData) -> Self {
        Self {
            should_fail: false,
            mock_data: Some(image),
            cancel_on_read: None,
        }
    }
}

impl RawImageReader for MockReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData> {
        if let Some(flag) = &self.cancel_on_read {
            flag.cancel();
        }
        if self.should_fail || data == b"broken" {
            return Err(ConversionError::DecodeError("Mock decode error".to_string()));
        }
        Ok(self.mock_data.clone().unwrap_or_else(|| camera_frame(100, 100)))
    }
}

struct MockWriter {
    should_fail: bool,
    written_data: Arc<Mutex<Vec<RawImageData>>>,
}

impl MockWriter {
    fn new() -> (Self, Arc<Mutex<Vec<RawImageData>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                should_fail: false,
                written_data: written.clone(),
            },
            written,
        )
    }
}

impl TiffWriter for MockWriter {
    fn write_tiff(&self, image: &RawImageData, output: &mut dyn Write, _config: &RemovalConfig) -> Result<()> {
        if self.should_fail {
            return Err(ConversionError::EncodeError("Mock encode error".to_string()));
        }
        self.written_data.lock().unwrap().push(image.clone());
        output.write_all(b"MOCKTIFF")?;
        Ok(())
    }
}

fn camera_frame(width: usize, height: usize) -> RawImageData {
    let mut image = RawImageData::blank(width, height);
    image.make = "Test".to_string();
    image.model = "Test CAM".to_string();
    image
}

fn database() -> Arc<DefectDatabase> {
    let mut db = DefectDatabase::new(ParserOptions::default());
    db.load_str("dots.txt", DOT_DATA);
    Arc::new(db)
}

fn pipeline(reader: MockReader, writer: MockWriter, config: RemovalConfig) -> PinkDotPipeline<MockReader, MockWriter> {
    PinkDotPipeline::with_custom(reader, writer, database(), config)
}

#[test]
fn test_config_builder() {
    let config = RemovalConfig::builder()
        .mode(CorrectionMode::MarkBad)
        .camera_override(Some("650D".to_string()))
        .compression(TiffCompression::Lzw)
        .predictor(Some(2))
        .validate_dimensions(false)
        .output_prefix("fixed_")
        .build();

    assert_eq!(config.mode, CorrectionMode::MarkBad);
    assert_eq!(config.camera_override.as_deref(), Some("650D"));
    assert_eq!(config.compression, TiffCompression::Lzw);
    assert_eq!(config.predictor, Some(2));
    assert!(!config.validate_dimensions);
    assert_eq!(config.output_dir, None);
    assert_eq!(config.output_prefix, "fixed_");
}

#[test]
fn test_successful_conversion() {
    let mut image = camera_frame(100, 100);
    image.data.fill(500);
    image.set_pixel(48, 49, 9000);
    image.set_pixel(0, 49, 9000);

    let (writer, written) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(image), writer, RemovalConfig::default());

    let mut output = Cursor::new(Vec::new());
    let report = pipeline.convert(b"fake raw data", &mut output).unwrap();

    assert_eq!(report.camera, "CAM");
    assert_eq!((report.width, report.height), (100, 100));
    // 26 columns in each of the 3 rows
    assert_eq!(report.stats.requested, 78);
    // x = 0 and x = 100 are too close to the border
    assert_eq!(report.stats.corrected, 72);
    assert_eq!(output.into_inner(), b"MOCKTIFF");

    let written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].get_pixel(48, 49), 500);
    assert_eq!(written[0].get_pixel(0, 49), 9000);
    assert!(report.timings.get_step("decode_raw").is_some());
    assert!(report.timings.get_step("encode_tiff").is_some());
}

#[test]
fn test_mark_bad_mode() {
    let mut image = camera_frame(100, 100);
    image.data.fill(500);

    let (writer, written) = MockWriter::new();
    let config = RemovalConfig::builder().mode(CorrectionMode::MarkBad).build();
    let pipeline = pipeline(MockReader::frame(image), writer, config);

    let report = pipeline.convert(b"fake raw data", &mut Cursor::new(Vec::new())).unwrap();

    // x = 100 is outside of the frame
    assert_eq!(report.stats.corrected, 75);
    let written = written.lock().unwrap();
    assert_eq!(written[0].get_pixel(0, 45), 0);
    assert_eq!(written[0].get_pixel(1, 45), 500);
}

#[test]
fn test_lookup_failure_writes_nothing() {
    let (writer, written) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(64, 64)), writer, RemovalConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", &mut output);

    assert!(matches!(
        result.unwrap_err(),
        ConversionError::LookupNotFound { width: 64, height: 64, .. }
    ));
    assert!(written.lock().unwrap().is_empty());
    assert!(output.into_inner().is_empty());
}

#[test]
fn test_unknown_camera() {
    let mut image = camera_frame(100, 100);
    image.model = "Some Other Camera".to_string();

    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(image), writer, RemovalConfig::default());

    let result = pipeline.convert(b"fake raw data", &mut Cursor::new(Vec::new()));

    assert!(matches!(result.unwrap_err(), ConversionError::UnknownCamera(_)));
}

#[test]
fn test_camera_override() {
    let mut image = camera_frame(100, 100);
    image.model = "Some Other Camera".to_string();

    let (writer, _) = MockWriter::new();
    let config = RemovalConfig::builder()
        .camera_override(Some("cam".to_string()))
        .build();
    let pipeline = pipeline(MockReader::frame(image), writer, config);

    let report = pipeline.convert(b"fake raw data", &mut Cursor::new(Vec::new())).unwrap();

    assert_eq!(report.camera, "CAM");
}

#[test]
fn test_reader_failure() {
    let (writer, _) = MockWriter::new();
    let reader = MockReader {
        should_fail: true,
        mock_data: None,
        cancel_on_read: None,
    };
    let pipeline = pipeline(reader, writer, RemovalConfig::default());

    let result = pipeline.convert(b"fake raw data", &mut Cursor::new(Vec::new()));

    assert!(matches!(result.unwrap_err(), ConversionError::DecodeError(_)));
}

#[test]
fn test_writer_failure() {
    let (mut writer, _) = MockWriter::new();
    writer.should_fail = true;
    let pipeline = pipeline(MockReader::frame(camera_frame(100, 100)), writer, RemovalConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", &mut output);

    assert!(matches!(result.unwrap_err(), ConversionError::EncodeError(_)));
    assert!(output.into_inner().is_empty());
}

#[test]
fn test_dimension_validation() {
    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(0, 0)), writer, RemovalConfig::default());

    let result = pipeline.convert(b"fake raw data", &mut Cursor::new(Vec::new()));

    assert!(matches!(result.unwrap_err(), ConversionError::InvalidDimensions(0, 0)));
}

#[test]
fn test_output_path() {
    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(100, 100)), writer, RemovalConfig::default());

    assert_eq!(
        pipeline.output_path_for(Path::new("/data/clip/M01-0001.dng")),
        PathBuf::from("/data/clip/_M01-0001.tiff")
    );
    assert_eq!(
        pipeline.output_path_for(Path::new("frame.DNG")),
        PathBuf::from("_frame.tiff")
    );

    let (writer, _) = MockWriter::new();
    let config = RemovalConfig::builder()
        .output_dir(Some(PathBuf::from("/out")))
        .build();
    let pipeline = PinkDotPipeline::with_custom(MockReader::frame(camera_frame(100, 100)), writer, database(), config);

    assert_eq!(
        pipeline.output_path_for(Path::new("/data/clip/M01-0001.dng")),
        PathBuf::from("/out/_M01-0001.tiff")
    );
}

#[test]
fn test_convert_file_writes_output_only_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.dng");
    let bad = dir.path().join("bad.dng");
    std::fs::write(&good, b"fake raw data").unwrap();
    std::fs::write(&bad, b"broken").unwrap();

    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(100, 100)), writer, RemovalConfig::default());

    let report = pipeline.convert_file(&good).unwrap();
    let good_out = dir.path().join("_good.tiff");
    assert_eq!(report.output.as_deref(), Some(good_out.as_path()));
    assert_eq!(std::fs::read(&good_out).unwrap(), b"MOCKTIFF");
    assert!(report.timings.get_step("write_output_file").is_some());

    assert!(pipeline.convert_file(&bad).is_err());
    assert!(!dir.path().join("_bad.tiff").exists());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();

    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(100, 100)), writer, RemovalConfig::default());

    let result = pipeline.convert_file(dir.path().join("missing.dng"));

    assert!(matches!(result.unwrap_err(), ConversionError::InputReadError(_)));
}

#[test]
fn test_batch_continues_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for (name, content) in [("a.dng", &b"ok"[..]), ("b.dng", &b"broken"[..]), ("c.dng", &b"ok"[..])] {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        files.push(path);
    }

    let (writer, written) = MockWriter::new();
    let pipeline = pipeline(MockReader::frame(camera_frame(100, 100)), writer, RemovalConfig::default());

    let report = BatchRunner::new(&pipeline)
        .jobs(2)
        .run(&files, &CancellationFlag::new())
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 0);
    assert!(!report.is_success());
    assert_eq!(report.failed_files(), vec![files[1].as_path()]);
    assert_eq!(report.results[0].input, files[0]);
    assert_eq!(written.lock().unwrap().len(), 2);
    assert!(dir.path().join("_a.tiff").exists());
    assert!(!dir.path().join("_b.tiff").exists());
}

#[test]
fn test_batch_cancellation_is_checked_between_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for name in ["a.dng", "b.dng", "c.dng"] {
        let path = dir.path().join(name);
        std::fs::write(&path, b"ok").unwrap();
        files.push(path);
    }

    let cancel = CancellationFlag::new();
    let reader = MockReader {
        should_fail: false,
        mock_data: Some(camera_frame(100, 100)),
        cancel_on_read: Some(cancel.clone()),
    };
    let (writer, _) = MockWriter::new();
    let pipeline = pipeline(reader, writer, RemovalConfig::default());

    let report = BatchRunner::new(&pipeline).jobs(1).run(&files, &cancel).unwrap();

    // the file that triggered the cancellation still completes
    assert!(matches!(report.results[0].outcome, FileOutcome::Converted(_)));
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 2);
}

#[test]
fn test_collect_input_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.dng", "b.DNG", "c.raw", "d.txt", "e.cr2"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("f.dng"), b"x").unwrap();
    let explicit = sub.join("g.dng");
    std::fs::write(&explicit, b"x").unwrap();

    let files = collect_input_files(&[
        dir.path().to_path_buf(),
        explicit.clone(),
        dir.path().join("e.cr2"),
        dir.path().join("missing.dng"),
    ]);

    assert_eq!(
        files,
        vec![
            dir.path().join("a.dng"),
            dir.path().join("b.DNG"),
            dir.path().join("c.raw"),
            explicit,
        ]
    );
}
