use greetrpc_loadgen::scenario::Scenario;

#[test]
fn test_from_name_roundtrip() {
    for (name, expected) in [
        ("hello", Scenario::Hello),
        ("retry", Scenario::Retry),
        ("hedging", Scenario::Hedging),
        ("no-hedging", Scenario::NoHedging),
    ] {
        let parsed = Scenario::from_name(name);
        assert_eq!(parsed, Some(expected), "from_name({name:?}) failed");
        assert_eq!(expected.as_name(), name, "as_name() mismatch for {name:?}");
    }
    assert!(Scenario::from_name("unknown").is_none());
}

#[test]
fn test_server_args_match_scenario_faults() {
    assert!(Scenario::Hello.server_args().is_empty());
    assert_eq!(Scenario::Retry.server_args(), vec!["--unavailable-ratio", "0.5"]);
    assert_eq!(Scenario::Hedging.server_args(), vec!["--inject-latency"]);
    assert_eq!(Scenario::NoHedging.server_args(), vec!["--inject-latency"]);
}

#[test]
fn test_labels() {
    assert_eq!(Scenario::Hedging.as_label(), "Hedging enabled");
    assert_eq!(Scenario::NoHedging.as_label(), "Hedging disabled");
    assert_eq!(Scenario::Retry.as_label(), "Retrying enabled");
    assert_eq!(Scenario::Hello.as_label(), "Plain client");
}

#[test]
fn test_default_call_counts() {
    assert_eq!(Scenario::Hello.default_call_count(), 200);
    assert_eq!(Scenario::Retry.default_call_count(), 50);
    assert_eq!(Scenario::Hedging.default_call_count(), 2_000);
    assert_eq!(Scenario::NoHedging.default_call_count(), 2_000);
}
