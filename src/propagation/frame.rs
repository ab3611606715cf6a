use chrono::{DateTime, Utc};

use super::types::{EarthFixedVector, InertialState};

/// Kilometers to the rendering boundary's meters.
pub const KM_TO_M: f64 = 1000.0;

/// Greenwich sidereal angle in radians at `at`.
pub fn sidereal_angle(at: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()))
}

/// Rotates a TEME position into the Earth-fixed frame and scales it to meters.
pub fn to_earth_fixed(inertial: &InertialState, at: DateTime<Utc>) -> EarthFixedVector {
    let [x, y, z] = teme_to_ecef_position(inertial.position_km, sidereal_angle(at));
    EarthFixedVector::new(x * KM_TO_M, y * KM_TO_M, z * KM_TO_M)
}

fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::f64::consts::FRAC_PI_2;

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn rotation_about_z_axis() {
        assert!(close(teme_to_ecef_position([1.0, 2.0, 3.0], 0.0), [1.0, 2.0, 3.0]));
        assert!(close(teme_to_ecef_position([1.0, 0.0, 5.0], FRAC_PI_2), [0.0, -1.0, 5.0]));
        assert!(close(teme_to_ecef_position([0.0, 1.0, 0.0], FRAC_PI_2), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn preserves_radius_and_scales_to_meters() {
        let state = InertialState {
            position_km: [4000.0, -3000.0, 4500.0],
            velocity_km_s: [0.0; 3],
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let fixed = to_earth_fixed(&state, at);

        let radius_km = (4000.0f64.powi(2) + 3000.0f64.powi(2) + 4500.0f64.powi(2)).sqrt();
        assert!((fixed.norm() - radius_km * KM_TO_M).abs() < 1e-3);
        assert_eq!(fixed.z, 4500.0 * KM_TO_M);
    }

    #[test]
    fn earth_turns_once_per_sidereal_day() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sidereal_day = Duration::milliseconds(86_164_091);
        let delta = (sidereal_angle(at + sidereal_day) - sidereal_angle(at))
            .rem_euclid(std::f64::consts::TAU);
        let wrapped = delta.min(std::f64::consts::TAU - delta);
        assert!(wrapped < 1e-4, "residual {wrapped}");
    }
}
