//! Geodesic math on a reference ellipsoid
//!
//! Forward (destination point from bearing and distance) and inverse
//! (distance between two points) problems solved with Vincenty's series.
//! Distances are in meters, coordinates in decimal degrees.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees clockwise from north (0 = north, 90 = east)

use thiserror::Error;

/// Reference ellipsoid parameters.
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-major axis in meters.
    pub semi_major_m: f64,
    /// Inverse flattening (1/f).
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    fn flattening(&self) -> f64 {
        1.0 / self.inverse_flattening
    }

    fn semi_minor_m(&self) -> f64 {
        self.semi_major_m * (1.0 - self.flattening())
    }
}

/// Clarke 1866, the ellipsoid the spot data has always been referenced to.
pub const CLARKE_1866: Ellipsoid = Ellipsoid {
    semi_major_m: 6_378_206.4,
    inverse_flattening: 294.978_698_214,
};

/// Iteration cap for the Vincenty series. The series converges within a few
/// iterations for everything except near-antipodal pairs.
const MAX_ITERATIONS: usize = 100;

/// Convergence threshold in radians.
const CONVERGENCE: f64 = 1e-12;

#[derive(Debug, Error)]
pub enum GeodesicError {
    #[error("not a numeric value: {0:?}")]
    NotANumber(String),

    #[error("input is not finite")]
    NonFinite,

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("distance must be non-negative, got {0}")]
    NegativeDistance(f64),

    #[error("geodesic series failed to converge")]
    NoConvergence,
}

/// Parse a raw query value as a finite number.
///
/// Spatial query values stay strings until they reach the geodesic layer,
/// so a malformed value surfaces here as a computation failure.
pub fn parse_number(raw: &str) -> Result<f64, GeodesicError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| GeodesicError::NotANumber(raw.to_string()))?;
    if !value.is_finite() {
        return Err(GeodesicError::NonFinite);
    }
    Ok(value)
}

fn check_latitude(lat: f64) -> Result<(), GeodesicError> {
    if !lat.is_finite() {
        return Err(GeodesicError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeodesicError::LatitudeOutOfRange(lat));
    }
    Ok(())
}

fn normalize_longitude(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Solve the forward geodesic problem: the point reached by travelling
/// `distance_m` meters from (`lon`, `lat`) on the given bearing.
///
/// Returns `(longitude, latitude)` in degrees.
pub fn forward(
    ellipsoid: &Ellipsoid,
    lon: f64,
    lat: f64,
    bearing_deg: f64,
    distance_m: f64,
) -> Result<(f64, f64), GeodesicError> {
    check_latitude(lat)?;
    if !lon.is_finite() || !bearing_deg.is_finite() || !distance_m.is_finite() {
        return Err(GeodesicError::NonFinite);
    }
    if distance_m < 0.0 {
        return Err(GeodesicError::NegativeDistance(distance_m));
    }
    if distance_m == 0.0 {
        return Ok((lon, lat));
    }

    let a = ellipsoid.semi_major_m;
    let f = ellipsoid.flattening();
    let b = ellipsoid.semi_minor_m();

    let (sin_alpha1, cos_alpha1) = bearing_deg.to_radians().sin_cos();

    let tan_u1 = (1.0 - f) * lat.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let base_sigma = distance_m / (b * big_a);
    let mut sigma = base_sigma;
    let mut iterations = 0;
    loop {
        let cos_two_sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos_two_sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_two_sigma_m * cos_two_sigma_m)
                        - big_b / 6.0
                            * cos_two_sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_two_sigma_m * cos_two_sigma_m)));
        let next = base_sigma + delta_sigma;
        let done = (next - sigma).abs() < CONVERGENCE;
        sigma = next;
        if done {
            break;
        }
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(GeodesicError::NoConvergence);
        }
    }

    let cos_two_sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();

    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());

    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_two_sigma_m
                        + c * cos_sigma * (-1.0 + 2.0 * cos_two_sigma_m * cos_two_sigma_m)));

    Ok((
        normalize_longitude(lon + l.to_degrees()),
        lat2.to_degrees(),
    ))
}

/// Solve the inverse geodesic problem: the distance in meters between two
/// points on the ellipsoid.
pub fn inverse(
    ellipsoid: &Ellipsoid,
    lon1: f64,
    lat1: f64,
    lon2: f64,
    lat2: f64,
) -> Result<f64, GeodesicError> {
    check_latitude(lat1)?;
    check_latitude(lat2)?;
    if !lon1.is_finite() || !lon2.is_finite() {
        return Err(GeodesicError::NonFinite);
    }

    let a = ellipsoid.semi_major_m;
    let f = ellipsoid.flattening();
    let b = ellipsoid.semi_minor_m();

    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut iterations = 0;
    loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // Coincident points.
            return Ok(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let cos_two_sigma_m = if cos_sq_alpha.abs() < f64::EPSILON {
            // Equatorial line.
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let next = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_two_sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_two_sigma_m * cos_two_sigma_m)));

        if (next - lambda).abs() < CONVERGENCE {
            lambda = next;
            break;
        }
        lambda = next;
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            // Near-antipodal pairs do not converge.
            return Err(GeodesicError::NoConvergence);
        }
    }

    let (sin_lambda, cos_lambda) = lambda.sin_cos();
    let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
        + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
    .sqrt();
    if sin_sigma == 0.0 {
        return Ok(0.0);
    }
    let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
    let sigma = sin_sigma.atan2(cos_sigma);
    let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let cos_two_sigma_m = if cos_sq_alpha.abs() < f64::EPSILON {
        0.0
    } else {
        cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
    };

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_two_sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_two_sigma_m * cos_two_sigma_m)
                    - big_b / 6.0
                        * cos_two_sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_two_sigma_m * cos_two_sigma_m)));

    Ok(b * big_a * (sigma - delta_sigma))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One degree of longitude along the equator is a * pi / 180.
    #[test]
    fn equatorial_degree_of_longitude() {
        let expected = CLARKE_1866.semi_major_m * std::f64::consts::PI / 180.0;
        let dist = inverse(&CLARKE_1866, 0.0, 0.0, 1.0, 0.0).unwrap();
        assert!(
            (dist - expected).abs() < 1.0,
            "expected ~{expected} m, got {dist} m"
        );
    }

    #[test]
    fn meridional_degree_of_latitude() {
        // ~110.6 km on Clarke 1866 near the equator.
        let dist = inverse(&CLARKE_1866, 0.0, 0.0, 0.0, 1.0).unwrap();
        assert!(
            (dist - 110_600.0).abs() < 500.0,
            "expected ~110.6 km, got {dist} m"
        );
    }

    #[test]
    fn forward_then_inverse_round_trips() {
        for bearing in [0.0, 90.0, 180.0, 270.0, 37.5] {
            let (lon, lat) = forward(&CLARKE_1866, 30.0, 55.0, bearing, 25_000.0).unwrap();
            let dist = inverse(&CLARKE_1866, 30.0, 55.0, lon, lat).unwrap();
            assert!(
                (dist - 25_000.0).abs() < 1.0,
                "bearing {bearing}: round trip gave {dist} m"
            );
        }
    }

    #[test]
    fn forward_north_moves_only_latitude() {
        let (lon, lat) = forward(&CLARKE_1866, 30.0, 55.0, 0.0, 10_000.0).unwrap();
        assert!((lon - 30.0).abs() < 1e-9);
        assert!(lat > 55.0 && lat < 55.2);
    }

    #[test]
    fn zero_distance_is_identity() {
        let (lon, lat) = forward(&CLARKE_1866, 30.0, 55.0, 123.0, 0.0).unwrap();
        assert_eq!((lon, lat), (30.0, 55.0));
    }

    #[test]
    fn inverse_is_symmetric() {
        let there = inverse(&CLARKE_1866, 30.0, 55.0, 30.5, 55.3).unwrap();
        let back = inverse(&CLARKE_1866, 30.5, 55.3, 30.0, 55.0).unwrap();
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            parse_number("not-a-distance"),
            Err(GeodesicError::NotANumber(_))
        ));
        assert!(matches!(
            forward(&CLARKE_1866, 30.0, 95.0, 0.0, 1.0),
            Err(GeodesicError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            forward(&CLARKE_1866, 30.0, 55.0, 0.0, -5.0),
            Err(GeodesicError::NegativeDistance(_))
        ));
        assert!(matches!(
            forward(&CLARKE_1866, 30.0, 55.0, 0.0, f64::NAN),
            Err(GeodesicError::NonFinite)
        ));
    }

    #[test]
    fn coincident_points_are_zero_distance() {
        let dist = inverse(&CLARKE_1866, 30.0, 55.0, 30.0, 55.0).unwrap();
        assert_eq!(dist, 0.0);
    }
}
