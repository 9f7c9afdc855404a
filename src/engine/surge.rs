use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::geo::{GeoPoint, point_in_polygon};
use crate::models::surge::SurgeZone;

/// Resolve the surge multiplier for a point at a moment in time.
///
/// When overlapping zones match, the highest multiplier wins. With no
/// matching zone the multiplier is 1.00.
pub fn resolve(zones: &[SurgeZone], point: &GeoPoint, at: DateTime<Utc>) -> Decimal {
    zones
        .iter()
        .filter(|zone| zone.is_active)
        .filter(|zone| zone.applies_at(at))
        .filter(|zone| point_in_polygon(point, &zone.boundary))
        .map(|zone| zone.multiplier)
        .max()
        .map(|multiplier| multiplier.max(Decimal::ONE))
        .unwrap_or(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, NaiveTime, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::resolve;
    use crate::geo::GeoPoint;
    use crate::models::TenantId;
    use crate::models::surge::{SurgeZone, TimeWindow};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn downtown_boundary() -> Vec<GeoPoint> {
        vec![
            GeoPoint {
                lat: 25.70,
                lng: -80.25,
            },
            GeoPoint {
                lat: 25.70,
                lng: -80.10,
            },
            GeoPoint {
                lat: 25.85,
                lng: -80.10,
            },
            GeoPoint {
                lat: 25.85,
                lng: -80.25,
            },
        ]
    }

    fn zone(multiplier: &str) -> SurgeZone {
        let now = Utc::now();
        SurgeZone {
            id: Uuid::new_v4(),
            tenant_id: TenantId(Uuid::new_v4()),
            name: "downtown".to_string(),
            boundary: downtown_boundary(),
            multiplier: dec(multiplier),
            is_active: true,
            window: None,
            days_of_week: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn downtown_point() -> GeoPoint {
        GeoPoint {
            lat: 25.77,
            lng: -80.19,
        }
    }

    fn saturday_noon() -> DateTime<Utc> {
        "2026-08-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn no_matching_zone_defaults_to_one() {
        let multiplier = resolve(&[], &downtown_point(), saturday_noon());
        assert_eq!(multiplier, Decimal::ONE);
    }

    #[test]
    fn point_outside_boundary_defaults_to_one() {
        let far_away = GeoPoint {
            lat: 26.90,
            lng: -80.05,
        };
        let multiplier = resolve(&[zone("1.40")], &far_away, saturday_noon());
        assert_eq!(multiplier, Decimal::ONE);
    }

    #[test]
    fn overlapping_zones_pick_the_maximum() {
        let zones = vec![zone("1.20"), zone("1.50"), zone("1.35")];
        let multiplier = resolve(&zones, &downtown_point(), saturday_noon());
        assert_eq!(multiplier, dec("1.50"));
    }

    #[test]
    fn inactive_zone_is_ignored() {
        let mut inactive = zone("2.00");
        inactive.is_active = false;
        let multiplier = resolve(&[inactive], &downtown_point(), saturday_noon());
        assert_eq!(multiplier, Decimal::ONE);
    }

    #[test]
    fn window_outside_hours_is_ignored() {
        let mut evening = zone("1.60");
        evening.window = Some(TimeWindow {
            start: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        });

        assert_eq!(
            resolve(&[evening.clone()], &downtown_point(), saturday_noon()),
            Decimal::ONE
        );

        let evening_time: DateTime<Utc> = "2026-08-01T18:30:00Z".parse().unwrap();
        assert_eq!(
            resolve(&[evening], &downtown_point(), evening_time),
            dec("1.60")
        );
    }

    #[test]
    fn weekday_filter_applies() {
        // 2026-08-01 is a Saturday (weekday 5 counted from Monday).
        let mut weekend_only = zone("1.25");
        weekend_only.days_of_week = vec![5, 6];

        assert_eq!(
            resolve(&[weekend_only.clone()], &downtown_point(), saturday_noon()),
            dec("1.25")
        );

        let monday: DateTime<Utc> = "2026-08-03T12:00:00Z".parse().unwrap();
        assert_eq!(
            resolve(&[weekend_only], &downtown_point(), monday),
            Decimal::ONE
        );
    }
}
