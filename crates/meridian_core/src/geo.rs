//! Coordinate to hemisphere assignment
//!
//! The entire sharding policy: the equator splits users across the two
//! stores, with latitude 0 belonging to the north. No geocoding, no country
//! lookup.

use crate::error::{CoreError, Result};
use crate::id::Hemisphere;

/// Map a coordinate pair to the partition it belongs to.
///
/// Latitude in `[0, 90]` resolves to [`Hemisphere::North`], latitude in
/// `[-90, 0)` to [`Hemisphere::South`]; longitude must be within
/// `[-180, 180]` in both cases. Anything else (including NaN) fails with
/// [`CoreError::InvalidCoordinate`].
pub fn resolve(latitude: f64, longitude: f64) -> Result<Hemisphere> {
    let longitude_valid = (-180.0..=180.0).contains(&longitude);

    if (0.0..=90.0).contains(&latitude) && longitude_valid {
        Ok(Hemisphere::North)
    } else if (-90.0..0.0).contains(&latitude) && longitude_valid {
        Ok(Hemisphere::South)
    } else {
        Err(CoreError::InvalidCoordinate {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_coordinates() {
        assert_eq!(resolve(40.0, -3.0).unwrap(), Hemisphere::North);
        assert_eq!(resolve(0.0, 0.0).unwrap(), Hemisphere::North);
        assert_eq!(resolve(90.0, 180.0).unwrap(), Hemisphere::North);
        assert_eq!(resolve(90.0, -180.0).unwrap(), Hemisphere::North);
    }

    #[test]
    fn test_southern_coordinates() {
        assert_eq!(resolve(-40.0, -3.0).unwrap(), Hemisphere::South);
        assert_eq!(resolve(-0.0001, 0.0).unwrap(), Hemisphere::South);
        assert_eq!(resolve(-90.0, 180.0).unwrap(), Hemisphere::South);
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert!(matches!(
            resolve(90.5, 0.0),
            Err(CoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            resolve(-90.5, 0.0),
            Err(CoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            resolve(40.0, 180.5),
            Err(CoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            resolve(40.0, -180.5),
            Err(CoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            resolve(f64::NAN, 0.0),
            Err(CoreError::InvalidCoordinate { .. })
        ));
    }
}
