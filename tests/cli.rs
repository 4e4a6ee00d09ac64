use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const GENOME: &str = r#"{
    "name": "sierpinski",
    "size_x": 32,
    "size_y": 24,
    "samples": 50000,
    "scale_func": "sqrt",
    "xmin": -0.1, "xmax": 1.1, "ymin": -0.1, "ymax": 1.1,
    "xforms": [
        {"weight": 1.0, "variations": [{"name": "linear", "weight": 1.0}],
         "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.0, 0.0],
         "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]},
        {"weight": 1.0, "variations": [{"name": "linear", "weight": 1.0}],
         "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.5, 0.0],
         "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]},
        {"weight": 1.0, "variations": [{"name": "linear", "weight": 0.9},
                                       {"name": "swirl", "weight": 0.1}],
         "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.0, 0.5],
         "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]}
    ]
}"#;

const BUFFER_BYTES: usize = 32 * 24 * 4;

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let genome = dir.path().join("flame.json");
    fs::write(&genome, GENOME).unwrap();
    (dir, genome)
}

fn render(genome: &Path, buffer: &Path, extra: &[&str]) {
    Command::cargo_bin("ffbuf")
        .unwrap()
        .arg(genome)
        .arg(buffer)
        .args(extra)
        .assert()
        .success();
}

#[test]
fn ffbuf_writes_a_buffer_of_the_genome_size() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    render(&genome, &buffer, &["--seed", "7"]);
    assert_eq!(fs::read(&buffer).unwrap().len(), BUFFER_BYTES);
}

#[test]
fn ffbuf_is_reproducible_for_a_seed() {
    let (dir, genome) = workspace();
    let (a, b) = (dir.path().join("a.buf"), dir.path().join("b.buf"));
    render(&genome, &a, &["--seed", "99", "--rng", "java"]);
    render(&genome, &b, &["--seed", "99", "--rng", "java"]);
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());

    let c = dir.path().join("c.buf");
    render(&genome, &c, &["--seed", "99", "--rng", "isaac32"]);
    assert_ne!(fs::read(&a).unwrap(), fs::read(&c).unwrap());
}

#[test]
fn ffbuf_writes_to_stdout_and_logs_to_stderr() {
    let (_dir, genome) = workspace();
    let output = Command::cargo_bin("ffbuf")
        .unwrap()
        .arg(&genome)
        .arg("-")
        .args(&["--seed", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout.len(), BUFFER_BYTES);
    let log = String::from_utf8_lossy(&output.stderr);
    assert!(log.contains("samples in rectangle"), "{}", log);
}

#[test]
fn ffbuf_logs_a_drawn_seed() {
    let (dir, genome) = workspace();
    Command::cargo_bin("ffbuf")
        .unwrap()
        .arg(&genome)
        .arg(dir.path().join("flame.buf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("no seed given"));
}

#[test]
fn ffbuf_reports_the_bad_field() {
    let dir = tempfile::tempdir().unwrap();
    let genome = dir.path().join("bad.json");
    fs::write(&genome, GENOME.replacen("\"weight\": 1.0", "\"weight\": -1.0", 1)).unwrap();
    Command::cargo_bin("ffbuf")
        .unwrap()
        .arg(&genome)
        .arg(dir.path().join("bad.buf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("xforms[0].weight"));
}

#[test]
fn ffbuf_rejects_bad_options() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    for bad in &[
        vec!["--threads", "0"],
        vec!["--rng", "mersenne"],
        vec!["--seed", "minus-one"],
    ] {
        Command::cargo_bin("ffbuf")
            .unwrap()
            .arg(&genome)
            .arg(&buffer)
            .args(bad)
            .assert()
            .failure();
    }
}

#[test]
fn ffbuf_fails_on_a_missing_genome() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("ffbuf")
        .unwrap()
        .arg(dir.path().join("absent.json"))
        .arg(dir.path().join("out.buf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open"));
}

#[test]
fn ffgray_writes_a_pgm() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    let image = dir.path().join("flame.pgm");
    render(&genome, &buffer, &["--seed", "11"]);
    Command::cargo_bin("ffgray")
        .unwrap()
        .arg(&genome)
        .arg(&buffer)
        .arg(&image)
        .assert()
        .success();
    let bytes = fs::read(&image).unwrap();
    assert!(bytes.starts_with(b"P5"));
    // header, then one byte per pixel
    assert!(bytes.len() > 32 * 24);
    assert!(bytes[bytes.len() - 32 * 24..].iter().any(|&b| b == 255));
}

#[test]
fn ffgray_writes_a_sixteen_bit_pgm() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    let image = dir.path().join("flame.pgm");
    render(&genome, &buffer, &["--seed", "11"]);
    Command::cargo_bin("ffgray")
        .unwrap()
        .arg(&genome)
        .arg(&buffer)
        .arg(&image)
        .args(&["--depth", "16"])
        .assert()
        .success();
    let bytes = fs::read(&image).unwrap();
    let header = b"P5\n32 24\n65535\n";
    assert!(bytes.starts_with(header));
    let pixels = &bytes[header.len()..];
    assert_eq!(pixels.len(), 32 * 24 * 2);
    assert!(pixels.chunks(2).any(|s| s == &[0xff, 0xff][..]));
}

#[test]
fn ffgray_picks_png_from_the_extension() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    let image = dir.path().join("flame.png");
    render(&genome, &buffer, &["--seed", "11"]);
    Command::cargo_bin("ffgray")
        .unwrap()
        .arg(&genome)
        .arg(&buffer)
        .arg(&image)
        .args(&["--depth", "16", "--scale", "log", "--scale-zero", "false"])
        .assert()
        .success();
    assert!(fs::read(&image)
        .unwrap()
        .starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn ffgray_rejects_an_unknown_scale_in_the_genome() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("flame.buf");
    render(&genome, &buffer, &["--seed", "11"]);
    fs::write(&genome, GENOME.replace("\"sqrt\"", "\"gamma\"")).unwrap();
    Command::cargo_bin("ffgray")
        .unwrap()
        .arg(&genome)
        .arg(&buffer)
        .arg(dir.path().join("flame.pgm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("gamma"));
}

#[test]
fn ffgray_needs_a_whole_buffer() {
    let (dir, genome) = workspace();
    let buffer = dir.path().join("short.buf");
    fs::write(&buffer, vec![0u8; BUFFER_BYTES - 1]).unwrap();
    Command::cargo_bin("ffgray")
        .unwrap()
        .arg(&genome)
        .arg(&buffer)
        .arg("-")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read"));
}
