use std::io::Cursor;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tessera_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_keeps_straight_alpha() {
    let img = RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let decoded = decode_rgba8(&png_bytes(&img)).unwrap();
    assert_eq!(decoded.as_raw(), &[100, 50, 200, 128]);
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_rgba8(b"not an image").is_err());
}

#[test]
fn fs_store_decodes_once_and_resolves_relative_paths() {
    let tmp = temp_dir("fs_store_once");
    std::fs::create_dir_all(tmp.join("tex")).unwrap();
    let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
    std::fs::write(tmp.join("tex/a.png"), png_bytes(&img)).unwrap();

    let store = FsSourceStore::new(&tmp);
    let rel = Path::new("tex/a.png");
    let a = store.load(rel).unwrap();
    let b = store.load(rel).unwrap();
    assert_eq!(a.dimensions(), (3, 2));
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(store.decode_count(rel), 1);

    store.invalidate();
    store.load(rel).unwrap();
    assert_eq!(store.decode_count(rel), 2);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fs_store_keeps_only_the_most_recent_decodes() {
    let tmp = temp_dir("fs_store_lru");
    std::fs::create_dir_all(&tmp).unwrap();
    for name in ["a.png", "b.png"] {
        std::fs::write(tmp.join(name), png_bytes(&RgbaImage::new(2, 2))).unwrap();
    }
    let (a, b) = (Path::new("a.png"), Path::new("b.png"));

    let store = FsSourceStore::with_capacity(&tmp, 1).unwrap();
    assert_eq!(store.capacity(), 1);
    store.load(a).unwrap();
    store.load(b).unwrap();
    store.load(a).unwrap();
    assert_eq!(store.decode_count(a), 2);
    assert_eq!(store.decode_count(b), 1);

    assert_eq!(FsSourceStore::new(&tmp).capacity(), DEFAULT_DECODED_SOURCE_CAPACITY);
    assert!(matches!(
        FsSourceStore::with_capacity(&tmp, 0),
        Err(TesseraError::Validation(_))
    ));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fs_store_reports_missing_and_corrupt_sources() {
    let tmp = temp_dir("fs_store_missing");
    std::fs::create_dir_all(&tmp).unwrap();
    std::fs::write(tmp.join("bad.png"), b"garbage").unwrap();

    let store = FsSourceStore::new(&tmp);
    assert!(matches!(
        store.load(Path::new("nope.png")),
        Err(TesseraError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        store.load(Path::new("bad.png")),
        Err(TesseraError::SourceUnavailable { .. })
    ));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn memory_store_lookup() {
    let store = MemorySourceStore::new().with("a.png", RgbaImage::new(4, 4));
    assert_eq!(store.load(Path::new("a.png")).unwrap().dimensions(), (4, 4));
    assert!(matches!(
        store.load(Path::new("b.png")),
        Err(TesseraError::SourceUnavailable { .. })
    ));
}
