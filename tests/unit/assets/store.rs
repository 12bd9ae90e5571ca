use std::io::Cursor;

use super::*;
use crate::codes::tables::CodeTables;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "scenecomp_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn asset_refs_for_descriptor_follow_slot_order() {
    let d = SceneDescriptor::decode("c7.*.a1.f.l", &CodeTables::default());
    assert_eq!(
        AssetRef::for_descriptor(&d),
        vec![
            AssetRef::Background("forest".to_string()),
            AssetRef::Character("girlC_v".to_string()),
            AssetRef::Character("girlA_angry".to_string()),
        ]
    );
    assert!(AssetRef::for_descriptor(&SceneDescriptor::default()).is_empty());
}

#[test]
fn rel_paths_use_kind_directories() {
    assert_eq!(
        AssetRef::Character("girlA_smile".to_string()).rel_path(),
        "characters/girlA_smile.png"
    );
    assert_eq!(
        AssetRef::Background("home".to_string()).rel_path(),
        "backgrounds/home.png"
    );
}

#[test]
fn normalize_path_cross_platform() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/x.png").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn fs_store_reports_missing_as_none() {
    let tmp = temp_dir("fs_store_missing");
    std::fs::create_dir_all(tmp.join("characters")).unwrap();
    std::fs::write(tmp.join("characters/girlA_angry.png"), png_bytes(2, 3)).unwrap();

    let store = FsAssetStore::new(&tmp);
    assert!(
        store
            .fetch(&AssetRef::Character("girlA_angry".to_string()))
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .fetch(&AssetRef::Character("girlB_angry".to_string()))
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .fetch(&AssetRef::Background("../escape".to_string()))
            .is_err()
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fetch_all_skips_missing_and_undecodable_assets() {
    let good = AssetRef::Character("girlA_angry".to_string());
    let corrupt = AssetRef::Character("girlB_smile".to_string());
    let missing = AssetRef::Background("beach".to_string());
    let store = MemoryAssetStore::new()
        .with(good.clone(), png_bytes(4, 8))
        .with(corrupt.clone(), b"not an image".to_vec());

    let prepared = PreparedAssets::fetch_all(&[good.clone(), corrupt.clone(), missing.clone()], &store);
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared.size_of(&good), Some((4, 8)));
    assert_eq!(prepared.size_of(&corrupt), None);
    assert_eq!(prepared.size_of(&missing), None);
}
