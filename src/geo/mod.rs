use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Axis-aligned bounding box of a polygon, used to reject points cheaply
/// before the ray-casting test.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

pub fn polygon_bounds(polygon: &[GeoPoint]) -> Option<Bounds> {
    let first = polygon.first()?;
    let mut bounds = Bounds {
        north: first.lat,
        south: first.lat,
        east: first.lng,
        west: first.lng,
    };

    for vertex in &polygon[1..] {
        bounds.north = bounds.north.max(vertex.lat);
        bounds.south = bounds.south.min(vertex.lat);
        bounds.east = bounds.east.max(vertex.lng);
        bounds.west = bounds.west.min(vertex.lng);
    }

    Some(bounds)
}

/// Ray-casting point-in-polygon test. The polygon is implicitly closed
/// (last vertex connects back to the first). Polygons with fewer than
/// three vertices contain nothing.
pub fn point_in_polygon(point: &GeoPoint, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    if let Some(bounds) = polygon_bounds(polygon) {
        if point.lat < bounds.south
            || point.lat > bounds.north
            || point.lng < bounds.west
            || point.lng > bounds.east
        {
            return false;
        }
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let vi = &polygon[i];
        let vj = &polygon[j];

        let crosses = (vi.lng > point.lng) != (vj.lng > point.lng)
            && point.lat < (vj.lat - vi.lat) * (point.lng - vi.lng) / (vj.lng - vi.lng) + vi.lat;

        if crosses {
            inside = !inside;
        }
        j = i;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, haversine_km, point_in_polygon};

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 1.0 },
            GeoPoint { lat: 1.0, lng: 1.0 },
            GeoPoint { lat: 1.0, lng: 0.0 },
        ]
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 25.7617,
            lng: -80.1918,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn miami_to_fort_lauderdale_is_around_43_km() {
        let miami = GeoPoint {
            lat: 25.7617,
            lng: -80.1918,
        };
        let fort_lauderdale = GeoPoint {
            lat: 26.1224,
            lng: -80.1373,
        };
        let distance = haversine_km(&miami, &fort_lauderdale);
        assert!((distance - 43.0).abs() < 5.0);
    }

    #[test]
    fn point_inside_square() {
        let p = GeoPoint { lat: 0.5, lng: 0.5 };
        assert!(point_in_polygon(&p, &square()));
    }

    #[test]
    fn point_outside_square() {
        let p = GeoPoint { lat: 1.5, lng: 0.5 };
        assert!(!point_in_polygon(&p, &square()));
    }

    #[test]
    fn point_far_outside_bounding_box_rejected() {
        let p = GeoPoint {
            lat: 40.0,
            lng: -70.0,
        };
        assert!(!point_in_polygon(&p, &square()));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let p = GeoPoint { lat: 0.5, lng: 0.5 };
        let line = vec![
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 1.0, lng: 1.0 },
        ];
        assert!(!point_in_polygon(&p, &line));
    }
}
