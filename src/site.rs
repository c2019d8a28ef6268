use crate::error::{Result, TessellationError};

/// Read access to the coordinates of a caller-supplied point type.
///
/// Implemented for fixed arrays, vectors and slices so [`crate::compute_voronoi`] can
/// echo the caller's own values back as [`crate::VoronoiCell::original`].
pub trait Coordinates {
    fn coordinates(&self) -> &[f64];
}

impl<const N: usize> Coordinates for [f64; N] {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

impl Coordinates for Vec<f64> {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

impl Coordinates for Box<[f64]> {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

impl Coordinates for &[f64] {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

/// Reads exactly `D` finite coordinates from `point`.
pub(crate) fn read_point<const D: usize, P: Coordinates>(point: &P, index: usize) -> Result<[f64; D]> {
    let coords = point.coordinates();
    if coords.len() != D {
        return Err(TessellationError::InvalidInput(format!(
            "point {} has {} coordinates, expected {}",
            index,
            coords.len(),
            D
        )));
    }
    let mut out = [0.0; D];
    for (k, &c) in coords.iter().enumerate() {
        if !c.is_finite() {
            return Err(TessellationError::InvalidInput(format!(
                "point {} has a non-finite coordinate {}",
                index, c
            )));
        }
        out[k] = c;
    }
    Ok(out)
}

/// Expands an optional radii list to one radius per point.
pub(crate) fn read_radii(radii: &[f64], count: usize) -> Result<Vec<f64>> {
    if radii.is_empty() {
        return Ok(vec![0.0; count]);
    }
    if radii.len() != count {
        return Err(TessellationError::InvalidInput(format!(
            "got {} radii for {} points",
            radii.len(),
            count
        )));
    }
    Ok(radii.to_vec())
}

/// Expands an optional periodicity list to exactly `D` flags.
pub(crate) fn read_periodic<const D: usize>(periodic: &[bool]) -> Result<[bool; D]> {
    if periodic.is_empty() {
        return Ok([false; D]);
    }
    periodic.try_into().map_err(|_| {
        TessellationError::InvalidInput(format!(
            "got {} periodicity flags, expected {}",
            periodic.len(),
            D
        ))
    })
}

/// A generator of the tessellation.
///
/// `radius` turns the ordinary Voronoi distance into the power distance
/// `|x - position|^2 - radius^2`. `payload` is carried through untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Site<T = ()> {
    pub position: [f64; 3],
    pub radius: f64,
    pub index: usize,
    pub payload: T,
}

impl Site<()> {
    pub fn new(index: usize, position: [f64; 3]) -> Self {
        Site {
            position,
            radius: 0.0,
            index,
            payload: (),
        }
    }
}

impl<T> Site<T> {
    pub fn with_payload(index: usize, position: [f64; 3], radius: f64, payload: T) -> Self {
        Site {
            position,
            radius,
            index,
            payload,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Power weight of the site.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_point_checks_dimension() {
        assert_eq!(read_point::<3, _>(&[1.0, 2.0, 3.0], 0).unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(read_point::<2, _>(&vec![1.0, 2.0], 0).unwrap(), [1.0, 2.0]);
        assert!(matches!(
            read_point::<3, _>(&vec![1.0, 2.0], 4),
            Err(TessellationError::InvalidInput(_))
        ));
        assert!(read_point::<3, _>(&[1.0, f64::NAN, 3.0], 0).is_err());
    }

    #[test]
    fn test_optional_lists() {
        assert_eq!(read_radii(&[], 3).unwrap(), vec![0.0; 3]);
        assert!(read_radii(&[1.0], 3).is_err());
        assert_eq!(read_periodic::<3>(&[]).unwrap(), [false; 3]);
        assert_eq!(read_periodic::<2>(&[true, false]).unwrap(), [true, false]);
        assert!(read_periodic::<3>(&[true]).is_err());
    }

    #[test]
    fn test_site_weight() {
        let site = Site::new(0, [0.0; 3]).with_radius(2.0);
        assert_eq!(site.weight(), 4.0);
    }
}
