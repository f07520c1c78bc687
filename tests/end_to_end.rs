use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use pinkdot_remover_rs::dot_locations::{DefectDatabase, LocationError, ParserOptions, PixelCoord};
use pinkdot_remover_rs::image_pipeline::{
    correction, CorrectionMode, PinkDotPipeline, PixelSink, PixelSource, RawImageData,
    RawImageReader, RemovalConfig, Result, StandardTiffWriter,
};

const MARKER: u16 = 4000;

const DOT_FILE: &str = "\
# test camera, 100x100 crop
N::TESTCAM::100,100
10,-5,5,4,4
";

/// Hands out a fixed frame regardless of the input bytes
struct FixedFrameReader(RawImageData);

impl RawImageReader for FixedFrameReader {
    fn read_raw(&self, _data: &[u8]) -> Result<RawImageData> {
        Ok(self.0.clone())
    }
}

fn load_database() -> (tempfile::TempDir, DefectDatabase) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("testcam.txt"), DOT_FILE).unwrap();
    // not a definition file
    fs::write(dir.path().join("notes.md"), "N::OTHER::10,10\n0,0,0,2,2\n").unwrap();

    let (db, report) = DefectDatabase::open(dir.path(), ParserOptions::default()).unwrap();
    assert!(!report.has_issues());
    (dir, db)
}

fn expected_dots() -> Vec<PixelCoord> {
    let mut dots = Vec::new();
    for y in [45, 49, 53] {
        for x in (0..=100).step_by(4) {
            dots.push(PixelCoord::new(x, y));
        }
    }
    dots
}

/// All dots set to `MARKER` on a black frame. Around (48, 49) the neighbors
/// are seeded so that the horizontal pair has the smallest gradient.
fn marked_frame(dots: &[PixelCoord]) -> RawImageData {
    let mut image = RawImageData::blank(100, 100);
    image.make = "Acme".to_string();
    image.model = "TESTCAM".to_string();
    for dot in dots {
        if dot.x < 100 {
            image.set_pixel(dot.x as usize, dot.y as usize, MARKER);
        }
    }

    // vertical 2000, horizontal 100, diagonal 2000, anti-diagonal 900
    for (x, y, value) in [
        (48, 47, 1000),
        (48, 51, 3000),
        (46, 49, 1200),
        (50, 49, 1300),
        (46, 47, 500),
        (50, 51, 2500),
        (50, 47, 0),
        (46, 51, 900),
    ] {
        image.set_pixel(x, y, value);
    }
    image
}

/// Value expected at (48, 49): the mean of the horizontal pair
const SEEDED_DOT_VALUE: u16 = 1250;

#[test]
fn loads_only_definition_files() {
    let (_dir, db) = load_database();

    assert_eq!(db.len(), 1);
    assert_eq!(db.camera_models(), vec!["TESTCAM"]);
}

#[test]
fn lookup_returns_the_dot_lattice() {
    let (_dir, db) = load_database();

    let dots = db.lookup("TESTCAM", 100, 100).unwrap();

    assert_eq!(dots, expected_dots());
}

#[test]
fn broken_file_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.txt"),
        "N::BROKEN::12\n0,0,0,4,4\nN::CAMA::64,64\n0,0,0,4,4\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.txt"), "N::CAMB::64,64\n0,0,0,4,4\n").unwrap();
    // a directory with a definition file name
    fs::create_dir(dir.path().join("c.txt")).unwrap();

    let mut db = DefectDatabase::new(ParserOptions::default());
    let report = db.load_directory(dir.path()).unwrap();

    assert_eq!(report.files_parsed, 2);
    assert_eq!(report.sets_loaded, 2);
    assert_eq!(db.camera_models(), vec!["CAMA", "CAMB"]);

    assert!(report.has_issues());
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.file, dir.path().join("a.txt"));
    assert_eq!(issue.line_no, Some(1));
    assert!(matches!(issue.error, LocationError::InvalidResolution(_)));
    assert!(issue.to_string().ends_with(&format!("a.txt:1: {}", issue.error)));
}

#[test]
fn later_file_wins_for_duplicate_sets() {
    let dir = tempfile::tempdir().unwrap();
    // written in reverse so creation order differs from name order
    fs::write(dir.path().join("b.txt"), "N::CAM::64,64\n0,2,2,4,4\n").unwrap();
    fs::write(dir.path().join("a.txt"), "N::CAM::64,64\n0,0,0,4,4\n").unwrap();

    let (db, _) = DefectDatabase::open(dir.path(), ParserOptions::default()).unwrap();
    let dots = db.lookup("CAM", 64, 64).unwrap();

    assert_eq!(db.len(), 2);
    assert_eq!(dots.len(), 17);
    assert!(dots.iter().all(|dot| dot.y == 34));
}

#[test]
fn missing_data_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = DefectDatabase::open(dir.path().join("nope"), ParserOptions::default());

    assert!(matches!(result, Err(LocationError::InvalidDataDirectory(_))));
}

#[test]
fn interpolation_uses_the_flattest_axis_away_from_the_border() {
    let (_dir, db) = load_database();
    let dots = db.lookup("TESTCAM", 100, 100).unwrap();
    let source = marked_frame(&dots);
    let mut corrected = source.clone();

    let stats = correction::correct(&source, &mut corrected, &dots, CorrectionMode::Interpolate);

    assert_eq!(stats.requested, 78);
    assert_eq!(stats.corrected, 72);
    for y in [45, 49, 53] {
        for x in (4..=96).step_by(4) {
            if (x, y) != (48, 49) {
                assert_eq!(corrected.get_pixel(x, y), 0, "dot at ({x}, {y})");
            }
        }
        assert_eq!(corrected.get_pixel(0, y), MARKER);
    }
    assert_eq!(corrected.get_pixel(48, 49), SEEDED_DOT_VALUE);
    // neighbors are only read
    assert_eq!(corrected.get_pixel(46, 49), 1200);
}

#[test]
fn pipeline_writes_a_corrected_tiff() {
    let (_dir, db) = load_database();
    let frame = marked_frame(&expected_dots());
    let pipeline = PinkDotPipeline::with_custom(
        FixedFrameReader(frame),
        StandardTiffWriter,
        Arc::new(db),
        RemovalConfig::default(),
    );

    let out_dir = tempfile::tempdir().unwrap();
    let input = out_dir.path().join("M01-0001.dng");
    fs::write(&input, b"raw").unwrap();

    let report = pipeline.convert_file(&input).unwrap();
    let output = out_dir.path().join("_M01-0001.tiff");
    assert_eq!(report.output.as_deref(), Some(output.as_path()));

    let bytes = fs::read(&output).unwrap();
    let mut decoder = tiff::decoder::Decoder::new(Cursor::new(bytes)).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (100, 100));

    match decoder.read_image().unwrap() {
        tiff::decoder::DecodingResult::U16(data) => {
            assert_eq!(data.len(), 100 * 100);
            assert_eq!(data[49 * 100 + 48], SEEDED_DOT_VALUE);
            assert_eq!(data[45 * 100 + 48], 0);
            assert_eq!(data[49 * 100], MARKER);
        }
        other => panic!("unexpected sample type: {:?}", std::mem::discriminant(&other)),
    }
}
