//! Integration tests for the initrift binary

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run initrift inside `cwd` with an isolated home directory
fn initrift(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_initrift"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", cwd)
        .env_remove("INITRIFT_COMPRESSION")
        .env_remove("INITRIFT_LEVEL")
        .env_remove("INITRIFT_PRESERVE_MTIME")
        .env_remove("INITRIFT_PRESERVE_OWNER")
        .output()
        .expect("Failed to execute initrift")
}

fn rootfs(parent: &Path) -> std::path::PathBuf {
    let root = parent.join("rootfs");
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::write(root.join("init"), b"#!/bin/sh\nexec /bin/sh\n").unwrap();
    fs::write(root.join("bin/busybox"), b"busybox").unwrap();
    fs::hard_link(root.join("bin/busybox"), root.join("bin/sh")).unwrap();
    root
}

fn names(archive: Vec<u8>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = Cursor::new(archive);
    loop {
        let mut reader = cpio::NewcReader::new(cursor).unwrap();
        if reader.entry().is_trailer() {
            break;
        }
        names.push(reader.entry().name().to_string());
        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).unwrap();
        cursor = reader.finish().unwrap();
    }
    names
}

#[test]
fn test_create_uncompressed() {
    let temp = TempDir::new().unwrap();
    rootfs(temp.path());

    let output = initrift(
        temp.path(),
        &["create", "rootfs", "-o", "initrd.cpio", "--compression", "none"],
    );
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("initrd.cpio"));

    let archive = fs::read(temp.path().join("initrd.cpio")).unwrap();
    assert_eq!(&archive[..6], b"070701");
    assert_eq!(
        names(archive),
        vec![".", "bin", "init", "bin/busybox", "bin/sh"]
    );
}

#[test]
fn test_create_gzip_by_default() {
    let temp = TempDir::new().unwrap();
    rootfs(temp.path());

    let output = initrift(temp.path(), &["create", "rootfs", "-o", "initrd.cpio.gz"]);
    assert!(output.status.success());

    let compressed = fs::read(temp.path().join("initrd.cpio.gz")).unwrap();
    let mut archive = Vec::new();
    flate2::read::GzDecoder::new(&compressed[..])
        .read_to_end(&mut archive)
        .unwrap();
    assert!(names(archive).contains(&"init".to_string()));
}

#[test]
fn test_create_zstd_with_redaction() {
    let temp = TempDir::new().unwrap();
    rootfs(temp.path());

    let output = initrift(
        temp.path(),
        &[
            "create",
            "rootfs",
            "-o",
            "initrd.cpio.zst",
            "--compression",
            "zstd",
            "--no-mtime",
            "--no-owner",
        ],
    );
    assert!(output.status.success());

    let compressed = fs::read(temp.path().join("initrd.cpio.zst")).unwrap();
    let archive = zstd::decode_all(&compressed[..]).unwrap();
    // first record: uid, gid and mtime fields
    assert_eq!(&archive[22..38], b"0000000000000000");
    assert_eq!(&archive[46..54], b"00000001");
}

#[test]
fn test_failed_create_removes_output() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("not-a-dir"), b"x").unwrap();

    let output = initrift(temp.path(), &["create", "not-a-dir", "-o", "out.cpio"]);
    assert!(!output.status.success());
    assert!(!temp.path().join("out.cpio").exists());
}

#[test]
fn test_output_inside_source_is_refused() {
    let temp = TempDir::new().unwrap();
    let root = rootfs(temp.path());

    let output = initrift(
        &root,
        &["create", ".", "-o", "initrd.cpio", "--compression", "none"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("inside source"));
    assert!(!root.join("initrd.cpio").exists());
}

#[test]
fn test_refused_create_keeps_existing_output() {
    let temp = TempDir::new().unwrap();
    let root = rootfs(temp.path());
    fs::write(root.join("initrd.cpio"), b"previous image").unwrap();

    let output = initrift(temp.path(), &["create", "rootfs", "-o", "rootfs/initrd.cpio"]);
    assert!(!output.status.success());
    // never opened, so never removed
    assert_eq!(fs::read(root.join("initrd.cpio")).unwrap(), b"previous image");
}

#[test]
fn test_config_path() {
    let temp = TempDir::new().unwrap();
    let output = initrift(temp.path(), &["config", "path"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Global:"));
    assert!(stdout.contains("Project:"));
    assert!(stdout.contains(".initrift/config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();
    assert!(initrift(temp.path(), &["config", "init"]).status.success());
    assert!(temp.path().join(".initrift/config.toml").exists());

    // second init refuses to clobber
    assert!(!initrift(temp.path(), &["config", "init"]).status.success());

    fs::write(
        temp.path().join(".initrift/config.toml"),
        "[output]\ncompression = \"zstd\"\n",
    )
    .unwrap();
    let output = initrift(temp.path(), &["config", "show"]);
    assert!(output.status.success());
    let shown: initrift_config::Config =
        toml::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(shown.output.compression, initrift_config::Compression::Zstd);
    assert_eq!(shown.output.level, 6);
}
