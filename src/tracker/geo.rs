use crate::model::PositionSample;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two samples, in km.
pub fn haversine_km(a: &PositionSample, b: &PositionSample) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Climb between two samples in meters; 0 for descents or missing altitude.
pub fn elevation_gain_m(a: &PositionSample, b: &PositionSample) -> f64 {
    match (a.altitude, b.altitude) {
        (Some(prev), Some(next)) if next > prev => next - prev,
        _ => 0.0,
    }
}
