//! Connected component regression test
//!
//! Thresholds synthetic barcode strips and checks the component counts
//! and the geometry of the largest component.
//!
//! Run with:
//! ```
//! cargo test -p digitread-region --test conncomp_reg
//! ```

use digitread_core::{Box, Pix};
use digitread_region::{
    ConnectivityType, find_connected_components, label_connected_components,
    pix_largest_component,
};
use digitread_test::RegParams;
use digitread_test::synth::{CellStyle, compose_strip, render_cell};

#[test]
fn conncomp_reg() {
    let mut rp = RegParams::new("conncomp");
    let style = CellStyle::default();

    // -----------------------------------------------------------
    // The dark strip is one component; the light glyphs are holes
    // -----------------------------------------------------------
    let strip = compose_strip("012345678901", &style, 20, 255).unwrap();
    let binary = strip.threshold_to_binary(128).unwrap();
    rp.write_pix(&binary).unwrap();

    let comps_8 = find_connected_components(&binary, ConnectivityType::EightWay).unwrap();
    eprintln!("Number of 8 c.c. in strip: {}", comps_8.len());
    rp.compare_values(1.0, comps_8.len() as f64, 0.0);

    let largest = pix_largest_component(&binary, ConnectivityType::EightWay)
        .unwrap()
        .unwrap();
    rp.check(
        largest.bounds == Box::new_unchecked(20, 20, 12 * 40, 64),
        "strip bounding box",
    );
    let ink = binary.count_foreground() as f64;
    let count = largest.pixel_count as f64;
    rp.check(count <= ink && count >= 0.9 * ink, "strip holds nearly all dark pixels");

    // -----------------------------------------------------------
    // Inverting the polarity turns each glyph into components
    // -----------------------------------------------------------
    let cell = render_cell(8, &style).unwrap();
    let glyph = invert(&cell).threshold_to_binary(128).unwrap();
    let n4 = find_connected_components(&glyph, ConnectivityType::FourWay)
        .unwrap()
        .len();
    let n8 = find_connected_components(&glyph, ConnectivityType::EightWay)
        .unwrap()
        .len();
    eprintln!("Glyph 8: 4-cc = {}, 8-cc = {}", n4, n8);
    // The 5x7 "8" touches its corners only diagonally
    rp.check(n8 <= n4, "8-cc count is at most the 4-cc count");
    rp.compare_values(1.0, n8 as f64, 0.0);

    // -----------------------------------------------------------
    // Labeled image agrees with the component list
    // -----------------------------------------------------------
    let labeled = label_connected_components(&glyph, ConnectivityType::FourWay).unwrap();
    let mut max_label = 0;
    for y in 0..labeled.height() {
        for x in 0..labeled.width() {
            max_label = max_label.max(labeled.get_pixel(x, y).unwrap_or(0));
        }
    }
    rp.compare_values(n4 as f64, max_label as f64, 0.0);

    // -----------------------------------------------------------
    // A blank page has no components at all
    // -----------------------------------------------------------
    let blank = Pix::from_gray_bytes(8, 8, &[255; 64])
        .unwrap()
        .threshold_to_binary(128)
        .unwrap();
    let none = pix_largest_component(&blank, ConnectivityType::EightWay).unwrap();
    rp.check(none.is_none(), "blank page has no largest component");

    assert!(rp.cleanup(), "conncomp regression test failed");
}

fn invert(pix: &Pix) -> Pix {
    let mut out = pix.to_mut();
    for y in 0..pix.height() {
        for x in 0..pix.width() {
            let v = pix.get_pixel_unchecked(x, y);
            out.set_pixel_unchecked(x, y, 255 - v);
        }
    }
    out.into()
}
