use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vorobox::{compute_voronoi, BoundingBox, Domain, Site, Tessellation};

#[test]
fn test_single_site_in_fully_periodic_box() {
    let cells = compute_voronoi(&[[0.5, 0.5, 0.5]], &[[0.0, 1.0]; 3], 1.0, &[], &[true, true, true]).unwrap();
    let cell = &cells[0];
    assert_relative_eq!(cell.volume, 1.0, max_relative = 1e-12);
    assert_eq!(cell.vertices.len(), 8);
    assert_eq!(cell.faces.len(), 6);
    assert!(cell.faces.iter().all(|f| f.adjacent_cell == 0));
    assert_eq!(cell.neighbors(), vec![0]);
}

#[test]
fn test_mixed_periodicity_keeps_walls() {
    let cells = compute_voronoi(&[[0.5, 0.5, 0.5]], &[[0.0, 1.0]; 3], 1.0, &[], &[true, false, false]).unwrap();
    let cell = &cells[0];
    let mut ids: Vec<i32> = cell.faces.iter().map(|f| f.adjacent_cell).collect();
    ids.sort();
    // No x walls; the x faces come from the site's own images
    assert_eq!(ids, vec![-6, -5, -4, -3, 0, 0]);
}

#[test]
fn test_sites_outside_periodic_axes_are_wrapped() {
    let inside = compute_voronoi(&[[0.25, 0.5, 0.5], [0.75, 0.5, 0.5]], &[[0.0, 1.0]; 3], 0.5, &[], &[true, false, false]).unwrap();
    let shifted = compute_voronoi(&[[1.25, 0.5, 0.5], [-0.25, 0.5, 0.5]], &[[0.0, 1.0]; 3], 0.5, &[], &[true, false, false]).unwrap();
    for (a, b) in inside.iter().zip(&shifted) {
        assert_relative_eq!(a.volume, b.volume, max_relative = 1e-12);
        assert_relative_eq!(a.volume, 0.5, max_relative = 1e-12);
    }
    // Positions of the shifted run are reported in the canonical box
    for v in &shifted[0].vertices {
        assert!(v[0] >= 0.0 - 1e-12 && v[0] <= 0.5 + 1e-12);
    }
    assert_eq!(shifted[0].original, [1.25, 0.5, 0.5]);
}

#[test]
fn test_periodic_matches_replicated_box() {
    let n = 64;
    let mut rng = StdRng::seed_from_u64(99);
    let points: Vec<[f64; 3]> = (0..n)
        .map(|_| [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)])
        .collect();

    let periodic = compute_voronoi(&points, &[[0.0, 1.0]; 3], 0.25, &[], &[true, true, true]).unwrap();
    let total: f64 = periodic.iter().map(|c| c.volume).sum();
    assert_relative_eq!(total, 1.0, max_relative = 1e-9);

    // The same sites tiled 3x3x3 in a walled box; the middle copy sees the same neighborhood.
    let mut tiled = Vec::with_capacity(27 * n);
    for dz in 0..3 {
        for dy in 0..3 {
            for dx in 0..3 {
                for p in &points {
                    tiled.push([p[0] + dx as f64, p[1] + dy as f64, p[2] + dz as f64]);
                }
            }
        }
    }
    let walled = compute_voronoi(&tiled, &[[0.0, 3.0]; 3], 0.25, &[], &[]).unwrap();
    let middle = 13 * n;
    for i in 0..n {
        let a = &periodic[i];
        let b = &walled[middle + i];
        assert_relative_eq!(a.volume, b.volume, max_relative = 1e-9);
        assert!(b.faces.iter().all(|f| !f.is_wall()));

        let mut from_periodic = a.neighbors();
        let mut from_tiles: Vec<usize> = b.neighbors().iter().map(|j| j % n).collect();
        from_periodic.sort();
        from_tiles.sort();
        from_tiles.dedup();
        assert_eq!(from_periodic, from_tiles);
    }
}

#[test]
fn test_radical_periodic_volume_is_conserved() {
    let size = 3.0;
    let mut rng = StdRng::seed_from_u64(5);
    let sites: Vec<Site> = (0..40)
        .map(|i| {
            let p = [rng.gen_range(0.0..size), rng.gen_range(0.0..size), rng.gen_range(0.0..size)];
            Site::new(i, p).with_radius(rng.gen_range(0.0..0.6))
        })
        .collect();
    let domain = Domain::new(BoundingBox::new([0.0; 3], [size; 3]), 0.75)
        .unwrap()
        .with_periodic([true, true, true]);
    let tess = Tessellation::new(domain, sites).unwrap();
    let cells = tess.calculate_all().unwrap();
    let total: f64 = cells.iter().map(|c| c.volume).sum();
    assert_relative_eq!(total, size * size * size, max_relative = 1e-9);
}
