use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(2.0), 255);
}

#[test]
fn floor_fraction_floors_and_saturates() {
    assert_eq!(floor_fraction(840, 0.10), 84);
    assert_eq!(floor_fraction(740, 0.025), 18);
    assert_eq!(floor_fraction(741, 0.05), 37);
    assert_eq!(floor_fraction(100, 0.0), 0);
    assert_eq!(floor_fraction(100, f64::NAN), 0);
    assert_eq!(floor_fraction(100, 3.0), 100);
}
