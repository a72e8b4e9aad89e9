use super::*;

#[test]
fn enclosing_rect_floors_min_and_ceils_max() {
    let r = PixelRect::enclosing(Rect::new(1.2, 3.7, 10.1, 8.0)).unwrap();
    assert_eq!(r, PixelRect::new(1, 3, 10, 5).unwrap());
    assert_eq!(r.right(), 11);
    assert_eq!(r.bottom(), 8);
}

#[test]
fn enclosing_rect_keeps_negative_origin() {
    let r = PixelRect::enclosing(Rect::new(-2.5, -0.5, 3.0, 2.0)).unwrap();
    assert_eq!((r.x, r.y, r.width, r.height), (-3, -1, 6, 3));
}

#[test]
fn zero_area_rect_is_degenerate() {
    assert!(matches!(
        PixelRect::new(0, 0, 0, 4),
        Err(TesseraError::DegenerateGeometry(_))
    ));
}

#[test]
fn bounding_rect_of_points() {
    let pts = [
        Point::new(3.0, 1.0),
        Point::new(-1.0, 4.0),
        Point::new(2.0, -2.0),
    ];
    let r = bounding_rect(&pts).unwrap();
    assert_eq!(r, Rect::new(-1.0, -2.0, 3.0, 4.0));
    assert!(bounding_rect(&[]).is_none());
}

#[test]
fn polygon_path_is_closed() {
    let path = polygon_path(&[
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(0.0, 4.0),
    ]);
    let els = path.elements();
    assert_eq!(els.len(), 4);
    assert!(matches!(els[3], kurbo::PathEl::ClosePath));
}

#[test]
fn rgba_len_check() {
    assert!(expect_rgba_len(16, 2, 2, "t").is_ok());
    assert!(expect_rgba_len(15, 2, 2, "t").is_err());
}
