use super::*;

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn triangle_scales_into_target_space() {
    let g = transform_polygon(&pts(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 2.0).unwrap();
    assert_eq!(g.source_rect.width, 10);
    assert_eq!(g.source_rect.height, 10);
    assert_eq!(
        g.clip_polygon,
        pts(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)])
    );
    assert_eq!(g.target_size(), (20, 20));
}

#[test]
fn offset_polygon_translates_to_rect_origin() {
    let g = transform_polygon(&pts(&[(5.5, 7.0), (15.0, 7.0), (15.0, 12.25)]), 1.0).unwrap();
    assert_eq!(g.source_rect, PixelRect::new(5, 7, 10, 6).unwrap());
    assert_eq!(g.clip_polygon[0], Point::new(0.5, 0.0));
    assert_eq!(g.clip_polygon[2], Point::new(10.0, 5.25));
}

#[test]
fn collinear_polygon_is_degenerate() {
    let err = transform_polygon(&pts(&[(0.0, 0.0), (5.0, 0.0), (9.0, 0.0)]), 1.0).unwrap_err();
    assert!(matches!(err, TesseraError::DegenerateGeometry(_)));
}

#[test]
fn two_points_are_degenerate() {
    let err = transform_polygon(&pts(&[(0.0, 0.0), (5.0, 5.0)]), 1.0).unwrap_err();
    assert!(matches!(err, TesseraError::DegenerateGeometry(_)));
}

#[test]
fn non_positive_scale_is_degenerate() {
    let tri = pts(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    assert!(transform_polygon(&tri, 0.0).is_err());
    assert!(transform_polygon(&tri, -1.0).is_err());
    assert!(transform_polygon(&tri, f64::NAN).is_err());
}

#[test]
fn target_size_rounds_and_clamps_to_one() {
    let g = transform_polygon(&pts(&[(0.0, 0.0), (1000.0, 0.0), (0.0, 10.0)]), 1.024).unwrap();
    assert_eq!(g.target_size(), (1024, 10));

    let tiny = transform_polygon(&pts(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]), 0.01).unwrap();
    assert_eq!(tiny.target_size(), (1, 1));
}

#[test]
fn clip_path_matches_polygon() {
    let g = transform_polygon(&pts(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 0.5).unwrap();
    let path = g.clip_path();
    assert_eq!(path.elements().len(), 4);
}
