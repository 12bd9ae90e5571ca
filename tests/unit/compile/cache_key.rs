use super::*;
use crate::codes::tables::HeightClass;

fn key(raw: &str, cfg: &EngineConfig) -> CacheKey {
    derive_key(&SceneDescriptor::decode(raw, &cfg.codes), cfg)
}

#[test]
fn equivalent_codes_share_a_key() {
    let cfg = EngineConfig::default();
    let canonical = key("a1.*.c7.f.r", &cfg);
    for variant in [
        "a1..c7.f.r",
        "a1.zz.c7.f.r",
        "a1x.*.c7.f.r.trailing.garbage",
        "a1.q9.c7.f.r",
    ] {
        assert_eq!(key(variant, &cfg), canonical, "variant={variant}");
    }
    assert_eq!(key("a1...", &cfg), key("a1.*.*.*.*", &cfg));
    assert_eq!(key("a1.*.*.zz.", &cfg), key("a1", &cfg));
}

#[test]
fn distinct_scenes_get_distinct_keys() {
    let cfg = EngineConfig::default();
    let codes = [
        "", "a1", "a4", "b1", ".a1", "..a1", "a1..c7", "c7..a1", "a1...f", "a1...b", "a1....l",
        "a1....c", "a1....r", "a1.b4.c7.h.c", "a1.b4.c7.h.l",
    ];
    let keys = codes.iter().map(|c| key(c, &cfg)).collect::<Vec<_>>();
    for i in 0..keys.len() {
        for j in (i + 1)..keys.len() {
            assert_ne!(keys[i], keys[j], "{:?} vs {:?}", codes[i], codes[j]);
        }
    }
}

#[test]
fn version_tag_changes_the_key() {
    let a = EngineConfig::default();
    let b = EngineConfig {
        version: "v15".to_string(),
        ..EngineConfig::default()
    };
    let ka = key("a1.b4.c7.h.c", &a);
    let kb = key("a1.b4.c7.h.c", &b);
    assert_ne!(ka, kb);
    assert!(ka.as_str().starts_with("v14-"));
    assert!(kb.as_str().starts_with("v15-"));
}

#[test]
fn render_affecting_config_changes_the_key() {
    let base = EngineConfig::default();
    let mut cropped = EngineConfig::default();
    cropped.layout.crop.large.short = 0.2;
    let mut reheighted = EngineConfig::default();
    reheighted
        .heights
        .0
        .insert("girlA".to_string(), HeightClass::Medium);

    let k = key("a1..c7.f.r", &base);
    assert_ne!(k, key("a1..c7.f.r", &cropped));
    assert_ne!(k, key("a1..c7.f.r", &reheighted));
}

#[test]
fn key_is_filename_safe_and_stable() {
    let cfg = EngineConfig {
        version: "rel/2 beta".to_string(),
        ..EngineConfig::default()
    };
    let k = key("a1", &cfg);
    assert!(k.as_str().starts_with("rel_2_beta-"));
    assert!(
        k.as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    );
    assert_eq!(k.as_str().len(), "rel_2_beta-".len() + 64);
    assert_eq!(k, key("a1", &cfg));
}
