use chrono::{Duration, TimeZone, Utc};
use speedguard::engine::{
    classify, DriverMeritAccount, DrivingStatus, SeverityTier, SpeedLimitResolver,
    UnknownClassPolicy, VehicleClass, TIER_TABLE,
};

#[test]
fn motorcycle_rider_at_85() {
    let limit = VehicleClass::Motorcycle.speed_limit_kmh();
    assert_eq!(limit, 70);

    let record = classify(85.0, limit).unwrap().expect("violation");
    assert_eq!(record.speed_over_limit, 15.0);
    assert_eq!(record.severity_tier, SeverityTier::Moderate);
    assert_eq!(record.base_fine, 2_000);
    assert_eq!(record.merit_points_deducted, 10);

    let mut account = DriverMeritAccount::new();
    let outcome = account.apply_violation(&record, Utc::now()).unwrap();
    assert_eq!(outcome.new_total, 90);
    assert_eq!(account.driving_status(), DrivingStatus::Active);
}

#[test]
fn three_wheeler_repeat_offender() {
    let limit = VehicleClass::ThreeWheeler.speed_limit_kmh();
    let record = classify(f64::from(limit + 25), limit).unwrap().unwrap();
    assert_eq!(record.severity_tier, SeverityTier::Serious);

    let now = Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap();
    let mut account = DriverMeritAccount::from_parts(35, 0, 0, None).unwrap();

    account.apply_violation(&record, now).unwrap();
    assert_eq!(account.merit_points(), 15);
    assert_eq!(account.driving_status(), DrivingStatus::Review);

    for _ in 0..2 {
        account.apply_violation(&record, now).unwrap();
        assert_eq!(account.merit_points(), 0);
        assert_eq!(account.driving_status(), DrivingStatus::Suspended);
    }
    assert_eq!(account.total_violations(), 3);
}

#[test]
fn four_clean_weeks_recover_eight_points() {
    let now = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
    let mut account =
        DriverMeritAccount::from_parts(60, 1, 0, Some(now - Duration::weeks(4))).unwrap();

    let outcome = account.recover(now).unwrap();
    assert_eq!(outcome.recovered, 8);
    assert_eq!(outcome.new_total, 68);
    assert_eq!(account.violation_free_weeks(), 4);
    assert_eq!(account.driving_status(), DrivingStatus::Active);

    assert_eq!(account.recover(now).unwrap().recovered, 0);
}

#[test]
fn status_always_matches_points() {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
    let mut account = DriverMeritAccount::new();
    let mut now = start;

    // alternate deductions across every tier with recovery in between
    for (i, rule) in TIER_TABLE.iter().cycle().take(24).enumerate() {
        now += Duration::days(3 + i as i64);
        account.deduct_points(i64::from(rule.merit_points), now).unwrap();
        assert_eq!(
            account.driving_status(),
            DrivingStatus::from_points(account.merit_points())
        );
        account.recover(now + Duration::weeks(i as i64 % 5)).unwrap();
        assert!(account.merit_points() <= 100);
        assert_eq!(
            account.driving_status(),
            DrivingStatus::from_points(account.merit_points())
        );
        now += Duration::weeks(i as i64 % 5);
    }
}

#[test]
fn every_known_class_resolves_under_both_policies() {
    for policy in [UnknownClassPolicy::Reject, UnknownClassPolicy::Fallback] {
        let resolver = SpeedLimitResolver::new(policy);
        for class in VehicleClass::ALL {
            let resolved = resolver.resolve(class.as_str()).unwrap();
            assert_eq!(resolved.class, Some(class));
            assert!(!resolved.used_fallback);
        }
    }
    assert!(SpeedLimitResolver::new(UnknownClassPolicy::Reject)
        .resolve("bus")
        .is_err());
    assert_eq!(
        SpeedLimitResolver::new(UnknownClassPolicy::Fallback)
            .resolve("bus")
            .unwrap()
            .speed_limit_kmh,
        70
    );
}
