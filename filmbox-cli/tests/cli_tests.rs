use std::fs;
use std::path::Path;
use tempfile::tempdir;

use filmbox_cli::commands::{capacity, decode, encode, inspect};
use filmbox_cli::imageio::{load_gray, save_gray};

const CONFIG: &str = r#"{
  "frame": {"cell": 4, "columns": 32, "rows": 12, "bits_per_symbol": 2},
  "pipeline": {
    "stages": [
      {"codec": "crc64", "properties": {"polynomial": "0x42F0E1EBA9EA3693", "seed": 0}},
      {"codec": "crc32c"}
    ]
  }
}"#;

fn write_file<P: AsRef<Path>>(p: P, s: &[u8]) {
    fs::write(p, s).unwrap();
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn encode_then_decode_simulated() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    let input = td.path().join("payload.bin");
    let image = td.path().join("frame.png");
    let output = td.path().join("out.bin");
    write_file(&config, CONFIG.as_bytes());
    write_file(&input, b"hello from the film");

    encode::execute(path_str(&config), path_str(&input), path_str(&image), 0, 0).unwrap();
    assert!(image.exists());

    decode::execute(
        path_str(&config),
        path_str(&image),
        false,
        Some(path_str(&output)),
    )
    .unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"hello from the film");
}

#[test]
fn encode_with_offset_then_decode_analog() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    let input = td.path().join("payload.bin");
    let image = td.path().join("frame.png");
    let output = td.path().join("out.bin");
    write_file(&config, CONFIG.as_bytes());
    write_file(&input, &[0xAB; 40]);

    encode::execute(path_str(&config), path_str(&input), path_str(&image), 3, 2).unwrap();
    let img = load_gray(path_str(&image)).unwrap();
    assert_eq!(img.width, 34 * 4 + 3);
    assert_eq!(img.height, 22 * 4 + 2);

    decode::execute(path_str(&config), path_str(&image), true, Some(path_str(&output))).unwrap();
    assert_eq!(fs::read(&output).unwrap(), vec![0xAB; 40]);
}

#[test]
fn decode_reports_damaged_frame() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    let input = td.path().join("payload.bin");
    let image = td.path().join("frame.png");
    let output = td.path().join("out.bin");
    write_file(&config, CONFIG.as_bytes());
    write_file(&input, b"scratched");

    encode::execute(path_str(&config), path_str(&input), path_str(&image), 0, 0).unwrap();

    // Scratch across the first content row
    let mut img = load_gray(path_str(&image)).unwrap();
    img.fill_rect(4, 20, 64, 4, 0);
    save_gray(&img, path_str(&image)).unwrap();

    let result = decode::execute(
        path_str(&config),
        path_str(&image),
        false,
        Some(path_str(&output)),
    );
    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn encode_rejects_oversized_payload() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    let input = td.path().join("payload.bin");
    let image = td.path().join("frame.png");
    write_file(&config, CONFIG.as_bytes());
    // 96 content bytes minus 12 bytes of trailers and the 4-byte length prefix
    write_file(&input, &[0u8; 81]);

    let result = encode::execute(path_str(&config), path_str(&input), path_str(&image), 0, 0);
    assert!(result.is_err());
    assert!(!image.exists());
}

#[test]
fn encode_accepts_payload_filling_the_frame() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    let input = td.path().join("payload.bin");
    let image = td.path().join("frame.png");
    let output = td.path().join("out.bin");
    write_file(&config, CONFIG.as_bytes());
    write_file(&input, &[0x5Au8; 80]);

    encode::execute(path_str(&config), path_str(&input), path_str(&image), 0, 0).unwrap();
    decode::execute(path_str(&config), path_str(&image), false, Some(path_str(&output))).unwrap();
    assert_eq!(fs::read(&output).unwrap(), vec![0x5Au8; 80]);
}

#[test]
fn capacity_and_inspect_accept_valid_config() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    write_file(&config, CONFIG.as_bytes());

    capacity::execute(path_str(&config)).unwrap();
    inspect::execute(path_str(&config)).unwrap();
}

#[test]
fn inspect_rejects_overlapping_layout() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    // Too few columns: the bands collapse to nothing
    write_file(
        &config,
        br#"{"frame": {"cell": 4, "columns": 8, "rows": 4, "bits_per_symbol": 1},
            "pipeline": {"stages": []}}"#,
    );

    assert!(inspect::execute(path_str(&config)).is_err());
}

#[test]
fn unknown_codec_is_reported() {
    let td = tempdir().unwrap();
    let config = td.path().join("format.json");
    write_file(
        &config,
        br#"{"frame": {"cell": 4, "columns": 32, "rows": 12, "bits_per_symbol": 2},
            "pipeline": {"stages": [{"codec": "turbo"}]}}"#,
    );

    let err = capacity::execute(path_str(&config)).unwrap_err();
    assert!(format!("{:#}", err).contains("turbo"));
}

#[test]
fn missing_config_file_fails() {
    let td = tempdir().unwrap();
    let missing = td.path().join("nope.json");
    assert!(capacity::execute(path_str(&missing)).is_err());
}
