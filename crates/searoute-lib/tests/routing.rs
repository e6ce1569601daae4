mod common;

use common::*;
use searoute_lib::{
    haversine_distance, Coordinate, Error, ErrorKind, RouteOptions, RoutePath, RouterOptions,
    SeaRouter, KM_TO_NM,
};

#[test]
fn default_profile_matches_haversine_sum() {
    let router = router();
    let result = router
        .shortest_route(
            &ANCONA.to_position(),
            &IGOUMENITSA.to_position(),
            &RouteOptions::default(),
        )
        .expect("query succeeds")
        .expect("route exists");

    let expected = expected_km(&[
        ANCONA,
        Coordinate::new(15.5, 42.0),
        Coordinate::new(18.5, 40.0),
        IGOUMENITSA,
    ]);
    assert_eq!(result.profile, "default");
    assert_eq!(result.distance_km, expected);
    assert_eq!(
        result.distance_nm,
        ((expected * KM_TO_NM) * 100.0).round() / 100.0
    );
    assert_eq!(result.vertex_count, 4);
    assert!(result.path.is_none());
}

#[test]
fn raw_points_are_snapped_to_the_network() {
    let router = router();
    let snapped = router
        .shortest_route(&[13.6, 43.5], &[20.3, 39.4, 0.0], &RouteOptions::default())
        .expect("query succeeds")
        .expect("route exists");
    assert_eq!(snapped.from, ANCONA);
    assert_eq!(snapped.to, IGOUMENITSA);

    let exact = router
        .shortest_path(ANCONA, IGOUMENITSA, &RouteOptions::default())
        .expect("query succeeds")
        .expect("route exists");
    assert_eq!(snapped, exact);
}

#[test]
fn forbidden_canal_reroutes_around_africa() {
    let router = router();
    let default = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::default().with_path(true))
        .unwrap()
        .expect("default route");
    let vlcc = router
        .shortest_path(
            ANCONA,
            BAB_EL_MANDEB,
            &RouteOptions::for_profile("vlcc").with_path(true),
        )
        .unwrap()
        .expect("vlcc route");

    let through_suez = |path: &RoutePath| path.coordinates().contains(&SUEZ_SOUTH);
    assert!(through_suez(default.path.as_ref().unwrap()));
    assert!(!through_suez(vlcc.path.as_ref().unwrap()));
    assert!(vlcc.distance_km > 2.0 * default.distance_km);
    assert!((vlcc.distance_km - vlcc.length_km).abs() < 0.01);
}

#[test]
fn restricted_canal_is_penalized_but_used() {
    let router = router();
    let default = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::default())
        .unwrap()
        .expect("default route");
    let suezmax = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::for_profile("suezmax"))
        .unwrap()
        .expect("suezmax route");

    let canal_m = haversine_distance(Coordinate::new(32.3, 31.3), SUEZ_SOUTH).trunc();
    assert_eq!(suezmax.vertex_count, default.vertex_count);
    assert_eq!(suezmax.length_km, default.length_km);
    let penalty_km = suezmax.distance_km - default.distance_km;
    assert!(
        (penalty_km - canal_m * 0.5 / 1000.0).abs() < 0.002,
        "penalty {penalty_km}"
    );
}

#[test]
fn custom_restricted_multiplier_is_applied() {
    let options = RouterOptions {
        restricted_multiplier: 3.0,
        classes: Some(vec!["suezmax".to_string()]),
        ..RouterOptions::default()
    };
    let router = SeaRouter::new(network(), Some(&rules()), options).expect("router builds");
    assert_eq!(router.profiles(), vec!["default", "suezmax"]);

    let default = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::default())
        .unwrap()
        .unwrap();
    let suezmax = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::for_profile("suezmax"))
        .unwrap()
        .unwrap();
    let canal_m = haversine_distance(Coordinate::new(32.3, 31.3), SUEZ_SOUTH).trunc();
    let penalty_km = suezmax.distance_km - default.distance_km;
    assert!((penalty_km - canal_m * 2.0 / 1000.0).abs() < 0.002);
}

#[test]
fn disconnected_basins_have_no_route() {
    let result = router()
        .shortest_path(ANCONA, VANCOUVER, &RouteOptions::default())
        .expect("query succeeds");
    assert!(result.is_none());
}

#[test]
fn unknown_profile_is_a_configuration_error() {
    let error = router()
        .shortest_path(ANCONA, IGOUMENITSA, &RouteOptions::for_profile("capesize"))
        .expect_err("unknown profile");
    assert_eq!(error.kind(), ErrorKind::Configuration);
    let message = error.to_string();
    assert!(
        message.contains("default, panamax, suezmax, vlcc"),
        "{message}"
    );
}

#[test]
fn malformed_endpoint_is_an_input_error() {
    let error = router()
        .shortest_route(
            &[f64::NAN, 1.0],
            &IGOUMENITSA.to_position(),
            &RouteOptions::default(),
        )
        .expect_err("malformed");
    assert!(matches!(error, Error::MalformedCoordinate { .. }));
    assert_eq!(error.kind(), ErrorKind::Input);
}

#[test]
fn repeated_queries_are_identical() {
    let router = router();
    let options = RouteOptions::for_profile("vlcc").with_path(true);
    let first = router.shortest_path(ANCONA, BAB_EL_MANDEB, &options).unwrap();
    for _ in 0..3 {
        assert_eq!(
            router.shortest_path(ANCONA, BAB_EL_MANDEB, &options).unwrap(),
            first
        );
    }
}

#[test]
fn router_can_be_queried_from_many_threads() {
    let router = std::sync::Arc::new(router());
    let expected = router
        .shortest_path(ANCONA, IGOUMENITSA, &RouteOptions::default())
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let router = std::sync::Arc::clone(&router);
            std::thread::spawn(move || {
                router
                    .shortest_path(ANCONA, IGOUMENITSA, &RouteOptions::default())
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread completes"), expected);
    }
}

#[test]
fn overrides_are_never_applied() {
    // The fixture's only override forbids bab_el_mandeb for panamax.
    let router = router();
    let panamax = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::for_profile("panamax"))
        .unwrap()
        .expect("panamax route");
    let default = router
        .shortest_path(ANCONA, BAB_EL_MANDEB, &RouteOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(panamax.distance_km, default.distance_km);
}
