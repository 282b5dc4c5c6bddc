use std::fs;
use std::path::Path;
use std::process::Command;

use walkdir::WalkDir;

fn jndev(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_jndev"))
        .current_dir(cwd)
        .env("JN_LOG", "warn")
        .args(args)
        .output()
        .unwrap()
}

fn files_under(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    out.sort();
    out
}

#[test]
fn join_list_extract_verify() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("photos");
    fs::create_dir_all(src.join("2023")).unwrap();
    fs::write(src.join("2023/a.raw"), vec![9u8; 4096]).unwrap();
    fs::write(src.join("b.txt"), b"bee").unwrap();
    fs::write(src.join("empty"), b"").unwrap();

    let out = jndev(tmp.path(), &["join", "-c", "photos", "album"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(tmp.path().join("album.jn").is_file());

    let out = jndev(tmp.path(), &["list", "album.jn"]);
    assert!(out.status.success());
    let listing = String::from_utf8_lossy(&out.stdout).into_owned();
    assert!(listing.contains("photos/2023/a.raw  4096 bytes"));
    assert_eq!(listing.lines().count(), 3);

    let out = jndev(tmp.path(), &["verify", "album.jn"]);
    assert!(out.status.success());

    let out = jndev(tmp.path(), &["x", "album.jn", "restored"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        files_under(&tmp.path().join("restored/photos")),
        files_under(&src)
    );

    // second extraction into the same place skips every entry
    let out = jndev(tmp.path(), &["extract", "album.jn", "restored"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn join_refuses_to_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("d")).unwrap();
    fs::write(tmp.path().join("d/f"), b"f").unwrap();
    fs::write(tmp.path().join("taken.jn"), b"x").unwrap();

    let out = jndev(tmp.path(), &["join", "d", "taken.jn"]);
    assert!(!out.status.success());
    assert_eq!(fs::read(tmp.path().join("taken.jn")).unwrap(), b"x");
}

#[test]
fn summaries_go_through_the_log() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("d")).unwrap();
    fs::write(tmp.path().join("d/f"), b"f").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_jndev"))
        .current_dir(tmp.path())
        .env("JN_LOG", "info")
        .args(["join", "d", "out"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("join complete"), "{stderr}");
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "out.jn");
}
