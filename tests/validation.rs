use approx::assert_relative_eq;
use vorobox::{compute_2d_voronoi, compute_voronoi, TessellationError, DEFAULT_Z_HEIGHT};

const UNIT: [[f64; 2]; 3] = [[0.0, 1.0]; 3];

#[test]
fn test_duplicate_sites_are_degenerate() {
    let points = vec![[0.2, 0.2, 0.2], [0.5, 0.5, 0.5], [0.5, 0.5, 0.5]];
    let err = compute_voronoi(&points, &UNIT, 0.5, &[], &[]).unwrap_err();
    assert!(matches!(err, TessellationError::DegenerateGeometry { site: 2, .. }));
    assert_eq!(err.site(), Some(2));
}

#[test]
fn test_inverted_domain() {
    let limits = [[0.0, 1.0], [0.0, 1.0], [2.0, 1.0]];
    let err = compute_voronoi(&[[0.5, 0.5, 0.5]], &limits, 0.5, &[], &[]).unwrap_err();
    assert!(matches!(err, TessellationError::InvalidDomain { axis: 2, .. }));
    assert!(matches!(
        compute_voronoi(&[[0.5, 0.5, 0.5]], &UNIT, -1.0, &[], &[]),
        Err(TessellationError::InvalidDomain { .. })
    ));
}

#[test]
fn test_bad_input_shapes() {
    let points = vec![vec![0.5, 0.5, 0.5], vec![0.5, 0.5]];
    assert!(matches!(
        compute_voronoi(&points, &UNIT, 0.5, &[], &[]),
        Err(TessellationError::InvalidInput(_))
    ));
    assert!(matches!(
        compute_voronoi(&[[0.5, 0.5, f64::NAN]], &UNIT, 0.5, &[], &[]),
        Err(TessellationError::InvalidInput(_))
    ));
    assert!(matches!(
        compute_voronoi(&[[0.5, 0.5, 0.5]], &UNIT, 0.5, &[-0.1], &[]),
        Err(TessellationError::InvalidInput(_))
    ));
    assert!(matches!(
        compute_voronoi(&[[0.5, 1.5, 0.5]], &UNIT, 0.5, &[], &[]),
        Err(TessellationError::InvalidInput(_))
    ));
}

#[test]
fn test_empty_input() {
    let points: Vec<[f64; 3]> = Vec::new();
    assert!(compute_voronoi(&points, &UNIT, 0.5, &[], &[]).unwrap().is_empty());
}

#[test]
fn test_dominated_site_has_empty_cell() {
    // The heavy site's power disk covers the light one and the whole box around it.
    let points = vec![[0.3, 0.5, 0.5], [0.5, 0.5, 0.5]];
    let cells = compute_voronoi(&points, &UNIT, 0.5, &[0.0, 0.5], &[]).unwrap();
    assert!(cells[0].is_empty());
    assert_eq!(cells[0].volume, 0.0);
    assert!(cells[0].faces.is_empty());
    assert_relative_eq!(cells[1].volume, 1.0, max_relative = 1e-12);
    assert!(cells[1].neighbors().is_empty());
}

#[test]
fn test_equal_radii_match_plain_voronoi() {
    let points = vec![[0.1, 0.2, 0.3], [0.7, 0.4, 0.6], [0.4, 0.9, 0.2], [0.8, 0.8, 0.9]];
    let plain = compute_voronoi(&points, &UNIT, 0.5, &[], &[]).unwrap();
    let radical = compute_voronoi(&points, &UNIT, 0.5, &[0.3; 4], &[]).unwrap();
    for (a, b) in plain.iter().zip(&radical) {
        assert_relative_eq!(a.volume, b.volume, max_relative = 1e-12);
    }
}

#[test]
fn test_radii_move_the_shared_face() {
    let points = vec![[0.25, 0.5, 0.5], [0.75, 0.5, 0.5]];
    let cells = compute_voronoi(&points, &UNIT, 0.5, &[0.2, 0.0], &[]).unwrap();
    // The plane sits where |x - 0.25|^2 - 0.04 = |x - 0.75|^2, i.e. at x = 0.54
    assert_relative_eq!(cells[0].volume, 0.54, max_relative = 1e-12);
    assert_relative_eq!(cells[1].volume, 0.46, max_relative = 1e-12);
}

#[test]
fn test_2d_radii_move_the_shared_edge() {
    let points = vec![[0.25, 0.5], [0.75, 0.5]];
    let cells = compute_2d_voronoi(&points, &[[0.0, 1.0]; 2], 0.5, &[0.2, 0.0], &[], DEFAULT_Z_HEIGHT).unwrap();
    assert_relative_eq!(cells[0].area, 0.54, max_relative = 1e-12);
    assert_relative_eq!(cells[1].area, 0.46, max_relative = 1e-12);
    for cell in &cells {
        assert_eq!(cell.vertices.len(), 4);
        assert_eq!(cell.faces.len(), 4);
        assert_eq!(cell.neighbors().len(), 1);
    }
    let shared = cells[0].faces.iter().find(|f| f.adjacent_cell == 1).unwrap();
    for &v in &shared.vertices {
        assert_relative_eq!(cells[0].vertices[v][0], 0.54, max_relative = 1e-12);
    }
}

#[test]
fn test_2d_rejects_3d_points() {
    assert!(matches!(
        compute_2d_voronoi(&[[0.5, 0.5, 0.5]], &[[0.0, 1.0]; 2], 0.5, &[], &[], DEFAULT_Z_HEIGHT),
        Err(TessellationError::InvalidInput(_))
    ));
    assert!(matches!(
        compute_2d_voronoi(&[[0.5, 0.5]], &UNIT, 0.5, &[], &[], DEFAULT_Z_HEIGHT),
        Err(TessellationError::InvalidInput(_))
    ));
}

#[test]
fn test_cells_serialize_to_json() {
    let cells = compute_voronoi(&[[0.25, 0.5, 0.5], [0.75, 0.5, 0.5]], &UNIT, 0.5, &[], &[]).unwrap();
    let json = serde_json::to_string(&cells).unwrap();
    let back: Vec<vorobox::VoronoiCell<[f64; 3]>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].faces, cells[0].faces);
    assert_eq!(back[1].original, [0.75, 0.5, 0.5]);
}
