// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

const RED_SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10">
    <rect width="10" height="10" fill="red"/>
</svg>"#;

fn lumen_svg() -> Command {
    Command::cargo_bin("lumen-svg").unwrap()
}

#[test]
fn test_render_file_to_png() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.svg");
    let output = dir.path().join("output.png");
    fs::write(&input, RED_SQUARE)?;

    lumen_svg().arg(&input).arg(&output).assert().success();

    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.dimensions(), (20, 10));
    assert_eq!(image.get_pixel(5, 5).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(15, 5).0[3], 0);
    Ok(())
}

#[rstest]
#[case(&["--width", "40"], (40, 20))]
#[case(&["--height", "5"], (10, 5))]
#[case(&["--width", "8", "--height", "8"], (8, 8))]
fn test_output_size(
    #[case] flags: &[&str],
    #[case] expected: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.svg");
    let output = dir.path().join("output.png");
    fs::write(&input, RED_SQUARE)?;

    lumen_svg()
        .arg(&input)
        .arg(&output)
        .args(flags)
        .assert()
        .success();

    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.dimensions(), expected);
    Ok(())
}

#[test]
fn test_background() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.svg");
    let output = dir.path().join("output.png");
    fs::write(&input, RED_SQUARE)?;

    lumen_svg()
        .arg(&input)
        .arg(&output)
        .args(["--background", "0x0000ffff"])
        .assert()
        .success();

    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.get_pixel(15, 5).0, [0, 0, 255, 255]);
    Ok(())
}

#[test]
fn test_short_background_is_zero_extended() -> Result<(), Box<dyn std::error::Error>> {
    let assert = lumen_svg()
        .args(["-", "-", "--background", "ff"])
        .write_stdin(RED_SQUARE)
        .assert()
        .success();

    let image = image::load_from_memory(&assert.get_output().stdout)?.to_rgba8();
    assert_eq!(image.get_pixel(15, 5).0, [0, 0, 0, 255]);
    Ok(())
}

#[test]
fn test_stdin_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let assert = lumen_svg()
        .args(["-", "-"])
        .write_stdin(RED_SQUARE)
        .assert()
        .success();

    let png = &assert.get_output().stdout;
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    let image = image::load_from_memory(png)?.to_rgba8();
    assert_eq!(image.dimensions(), (20, 10));
    Ok(())
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();
    lumen_svg()
        .arg(dir.path().join("missing.svg"))
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

#[test]
fn test_malformed_input_fails() {
    lumen_svg()
        .args(["-", "-"])
        .write_stdin("<svg><g></svg>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load SVG document"));
}

#[test]
fn test_zero_size_fails() {
    lumen_svg()
        .args(["-", "-", "--width", "0"])
        .write_stdin(RED_SQUARE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to render"));
}

#[test]
fn test_invalid_background_is_rejected() {
    lumen_svg()
        .args(["-", "-", "--background", "red"])
        .write_stdin(RED_SQUARE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("RRGGBBAA"));
}

#[test]
fn test_bad_font_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let font = dir.path().join("broken.ttf");
    fs::write(&font, b"not a font")?;

    lumen_svg()
        .args(["-", "-", "--font"])
        .arg(format!("Broken:bold={}", font.display()))
        .write_stdin(RED_SQUARE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load font"));
    Ok(())
}
