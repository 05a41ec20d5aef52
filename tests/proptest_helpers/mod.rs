#![allow(dead_code)]

use ocrlabel::geometry::{CanonicalBox, Quad, MAX_COORDINATE};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Coordinates on a 1/4-pixel grid, which f64 addition represents exactly.
pub fn arb_coord(max: u32) -> impl Strategy<Value = f64> {
    (0..=max * 4).prop_map(|quarters| quarters as f64 / 4.0)
}

/// Strictly positive sizes on the same grid.
pub fn arb_size(max: u32) -> impl Strategy<Value = f64> {
    (1..=max * 4).prop_map(|quarters| quarters as f64 / 4.0)
}

/// Boxes that survive any exact geometric round trip.
pub fn arb_box() -> impl Strategy<Value = CanonicalBox> {
    (arb_coord(4000), arb_coord(4000), arb_size(2000), arb_size(2000)).prop_map(
        |(x, y, w, h)| CanonicalBox::new(x, y, w, h).expect("grid box is valid"),
    )
}

/// Any finite f64 within the supported coordinate range.
pub fn arb_any_coord() -> impl Strategy<Value = f64> {
    -MAX_COORDINATE * 2.0..MAX_COORDINATE * 2.0
}

/// Axis-aligned quads whose corners each wobble by up to `jitter` pixels.
pub fn arb_jittered_quad(jitter: f64) -> impl Strategy<Value = Quad> {
    (arb_box(), prop::array::uniform8(0.0..=jitter)).prop_map(move |(bbox, d)| {
        let [p0, p1, p2, p3] = bbox.to_quad();
        [
            [p0[0] + d[0], p0[1] + d[1]],
            [p1[0] - d[2], p1[1] + d[3]],
            [p2[0] - d[4], p2[1] - d[5]],
            [p3[0] + d[6], p3[1] - d[7]],
        ]
    })
}

/// Label text, including the empty string and non-ASCII characters.
pub fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 äöü€]{0,12}"
}
