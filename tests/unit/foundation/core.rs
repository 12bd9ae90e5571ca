use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert_eq!(Canvas::new(1440, 960).unwrap().pixel_count(), 1440 * 960);
}

#[test]
fn slot_names_and_order() {
    let names = Slot::ALL.map(|s| s.to_string());
    assert_eq!(names, ["left", "center", "right"]);
    assert!(Slot::Left < Slot::Center && Slot::Center < Slot::Right);
}

#[test]
fn rgba8_premul_scales_color_by_alpha() {
    assert_eq!(Rgba8::opaque(10, 20, 30).to_premul(), [10, 20, 30, 255]);
    assert_eq!(Rgba8([200, 100, 0, 128]).to_premul(), [100, 50, 0, 128]);
    assert_eq!(Rgba8([200, 100, 50, 0]).to_premul(), [0, 0, 0, 0]);
}
