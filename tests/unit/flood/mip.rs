use super::*;

fn quadrant_image() -> RgbaImage {
    let mut img = RgbaImage::new(4, 4);
    img.put_pixel(0, 0, image::Rgba([200, 0, 0, 255]));
    img.put_pixel(1, 0, image::Rgba([100, 0, 0, 255]));
    img.put_pixel(0, 1, image::Rgba([200, 40, 0, 255]));
    img.put_pixel(1, 1, image::Rgba([100, 40, 0, 255]));
    img
}

#[test]
fn auto_levels_reaches_one_by_one() {
    assert_eq!(auto_levels(1, 1), 0);
    assert_eq!(auto_levels(4, 4), 2);
    assert_eq!(auto_levels(5, 2), 3);
    assert_eq!(auto_levels(2048, 2048), 11);
}

#[test]
fn quadrant_floods_covered_average_everywhere() {
    let src = quadrant_image();
    let out = flood(&src, 1, 2);

    for y in 0..4 {
        for x in 0..4 {
            let s = src.get_pixel(x, y).0;
            let o = out.get_pixel(x, y).0;
            assert_eq!(o[3], s[3], "alpha changed at ({x},{y})");
            if x < 2 && y < 2 {
                assert_eq!(o, s);
            } else {
                assert_eq!(&o[..3], &[150, 20, 0], "color at ({x},{y})");
            }
        }
    }
}

#[test]
fn flood_is_idempotent() {
    let mut src = RgbaImage::new(7, 5);
    src.put_pixel(1, 1, image::Rgba([10, 200, 30, 255]));
    src.put_pixel(5, 3, image::Rgba([250, 10, 90, 180]));
    src.put_pixel(6, 4, image::Rgba([0, 0, 255, 1]));

    for levels in [0, 1, 3] {
        let once = flood(&src, 1, levels);
        let twice = flood(&once, 1, levels);
        assert_eq!(once, twice, "levels={levels}");
    }
}

#[test]
fn threshold_decides_coverage() {
    let mut src = RgbaImage::new(2, 1);
    src.put_pixel(0, 0, image::Rgba([255, 255, 255, 10]));
    src.put_pixel(1, 0, image::Rgba([0, 0, 0, 200]));

    let out = flood(&src, 50, 0);
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 10]);
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0, 200]);
}

#[test]
fn fully_transparent_image_floods_to_zero_color() {
    let src = RgbaImage::from_pixel(3, 3, image::Rgba([9, 9, 9, 0]));
    let out = flood(&src, 0, 0);
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn fully_covered_image_is_unchanged() {
    let src = RgbaImage::from_fn(5, 3, |x, y| image::Rgba([x as u8 * 40, y as u8 * 60, 7, 255]));
    assert_eq!(flood(&src, 0, 0), src);
}
