use super::*;
use crate::codes::tables::CodeTables;

fn layout_for(raw: &str) -> ResolvedLayout {
    let d = SceneDescriptor::decode(raw, &CodeTables::default());
    resolve_layout(&d, &LayoutConfig::default())
}

#[test]
fn mode_selection_table() {
    assert_eq!(select_layout_mode(false, false, false), LayoutMode::Single);
    assert_eq!(select_layout_mode(true, false, false), LayoutMode::Single);
    assert_eq!(select_layout_mode(false, true, false), LayoutMode::Single);
    assert_eq!(select_layout_mode(false, false, true), LayoutMode::Single);
    assert_eq!(select_layout_mode(true, false, true), LayoutMode::Paired);
    assert_eq!(select_layout_mode(true, true, false), LayoutMode::Triple);
    assert_eq!(select_layout_mode(false, true, true), LayoutMode::Triple);
    assert_eq!(select_layout_mode(true, true, true), LayoutMode::Triple);
}

#[test]
fn paired_and_single_share_large_sizing() {
    let paired = layout_for("a1..c7.h.c");
    let single = layout_for("a1...h.");
    assert_eq!(paired.mode, LayoutMode::Paired);
    assert_eq!(single.mode, LayoutMode::Single);
    assert_eq!(paired.target_height, 840);
    assert_eq!(single.target_height, 840);
    assert_eq!(paired.anchors, single.anchors);
    assert_eq!(paired.crop, single.crop);
    assert_eq!(paired.anchor(Slot::Left), (360, 960));
    assert_eq!(paired.anchor(Slot::Right), (1080, 960));
}

#[test]
fn triple_uses_small_sizing_and_narrow_spread() {
    let l = layout_for("a1.b4.c7.h.c");
    assert_eq!(l.mode, LayoutMode::Triple);
    assert_eq!(l.target_height, 740);
    assert_eq!(l.anchor(Slot::Left), (260, 960));
    assert_eq!(l.anchor(Slot::Center), (720, 960));
    assert_eq!(l.anchor(Slot::Right), (1180, 960));
    assert_eq!(l.crop, CropPolicy::default().small);
}

#[test]
fn all_anchors_share_canvas_baseline() {
    for raw in ["a1...h.", "a1..c7.h.", "a1.b4.c7.h."] {
        let l = layout_for(raw);
        for slot in Slot::ALL {
            assert_eq!(l.anchor(slot).1, 960);
        }
    }
}

#[test]
fn tall_is_never_cropped_in_default_policy() {
    let policy = CropPolicy::default();
    for bucket in [SizeBucket::Large, SizeBucket::Small] {
        assert_eq!(policy.for_bucket(bucket).ratio(HeightClass::Tall), 0.0);
    }
}

#[test]
fn default_config_is_valid() {
    let cfg = LayoutConfig::default();
    cfg.validate().unwrap();
    assert!(cfg.large_height > cfg.small_height);
    assert!(cfg.large_height < cfg.canvas.height);
}

#[test]
fn validate_rejects_broken_constants() {
    let mut cfg = LayoutConfig::default();
    cfg.small_height = cfg.large_height;
    assert!(cfg.validate().is_err());

    let mut cfg = LayoutConfig::default();
    cfg.large_height = cfg.canvas.height;
    assert!(cfg.validate().is_err());

    let mut cfg = LayoutConfig::default();
    cfg.crop.small.tall = 0.01;
    assert!(cfg.validate().is_err());

    let mut cfg = LayoutConfig::default();
    cfg.crop.large.short = 1.0;
    assert!(cfg.validate().is_err());

    let mut cfg = LayoutConfig::default();
    cfg.crop.large.medium = -0.1;
    assert!(cfg.validate().is_err());
}
