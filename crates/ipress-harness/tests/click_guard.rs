//! Suppression of the synthesized click that follows a committed press.

#![forbid(unsafe_code)]

use ipress_core::{
    CLICK_GUARD_RADIUS_PX, CLICK_GUARD_WINDOW_MS, ClickVerdict, PointerKind, PressConfig,
};
use ipress_harness::{PressRig, SimCapabilities, SimHost};
use pretty_assertions::assert_eq;

fn committed_at(x: f64, y: f64) -> PressRig {
    let rig = PressRig::new(PressConfig::default());
    rig.host.set_now(5_000.0);
    rig.tap(PointerKind::Touch, x, y);
    rig
}

#[test]
fn click_near_commit_is_suppressed() {
    let rig = committed_at(50.0, 50.0);
    let (verdict, click) = rig.click(55.0, 55.0);

    assert_eq!(verdict, ClickVerdict::Suppressed);
    assert!(click.default_prevented());
    assert!(click.propagation_stopped());
}

#[test]
fn click_before_intent_delivery_is_already_guarded() {
    let rig = PressRig::new(PressConfig::default());
    rig.down(PointerKind::Mouse, 80.0, 80.0);
    rig.up(80.0, 80.0);
    let (verdict, _) = rig.click(80.0, 80.0);
    assert_eq!(verdict, ClickVerdict::Suppressed);
    assert_eq!(rig.log.len(), 1);
}

#[test]
fn window_boundary_is_inclusive() {
    let rig = committed_at(50.0, 50.0);
    rig.host.advance(CLICK_GUARD_WINDOW_MS);
    assert_eq!(rig.click(50.0, 50.0).0, ClickVerdict::Suppressed);

    rig.host.advance(1.0);
    let (verdict, click) = rig.click(50.0, 50.0);
    assert_eq!(verdict, ClickVerdict::Expired);
    assert!(!click.default_prevented());
    assert!(!click.propagation_stopped());
}

#[test]
fn radius_boundary_is_inclusive() {
    let rig = committed_at(50.0, 50.0);
    assert_eq!(
        rig.click(50.0 + CLICK_GUARD_RADIUS_PX, 50.0).0,
        ClickVerdict::Suppressed
    );
    assert_eq!(rig.click(62.0, 66.0).0, ClickVerdict::Suppressed);

    let (verdict, click) = rig.click(50.0 + CLICK_GUARD_RADIUS_PX + 0.5, 50.0);
    assert_eq!(verdict, ClickVerdict::OutOfRadius);
    assert!(!click.default_prevented());
}

#[test]
fn no_token_before_any_commit() {
    let rig = PressRig::new(PressConfig::default());
    assert_eq!(rig.click(10.0, 10.0).0, ClickVerdict::NoToken);

    rig.down(PointerKind::Touch, 10.0, 10.0);
    rig.move_to(60.0, 10.0);
    assert_eq!(rig.click(10.0, 10.0).0, ClickVerdict::NoToken);
}

#[test]
fn each_commit_overwrites_the_token() {
    let rig = committed_at(10.0, 10.0);
    rig.host.advance(100.0);
    rig.tap(PointerKind::Touch, 150.0, 150.0);

    assert_eq!(rig.click(10.0, 10.0).0, ClickVerdict::OutOfRadius);
    assert_eq!(rig.click(150.0, 150.0).0, ClickVerdict::Suppressed);
    let token = rig.controller.guard_token().expect("token");
    assert_eq!(token.at_ms, 5_100.0);
}

#[test]
fn token_outlives_a_cancelled_interaction() {
    let rig = committed_at(40.0, 40.0);
    rig.down(PointerKind::Touch, 40.0, 40.0);
    rig.host.resize();
    assert_eq!(rig.click(40.0, 40.0).0, ClickVerdict::Suppressed);
}

#[test]
fn guard_disabled_by_config() {
    let rig = PressRig::new(PressConfig {
        click_guard: false,
        ..PressConfig::default()
    });
    rig.tap(PointerKind::Mouse, 10.0, 10.0);
    let (verdict, click) = rig.click(10.0, 10.0);
    assert_eq!(verdict, ClickVerdict::Disabled);
    assert!(!click.default_prevented());
}

#[test]
fn destroyed_controller_lets_clicks_through() {
    let rig = committed_at(10.0, 10.0);
    rig.controller.destroy();
    assert_eq!(rig.click(10.0, 10.0).0, ClickVerdict::Disabled);
}

#[test]
fn stop_propagation_failure_still_prevents_default() {
    let host = SimHost::with_capabilities(SimCapabilities {
        stop_propagation: false,
        ..SimCapabilities::default()
    });
    let rig = PressRig::on_host(host, PressConfig::default());
    rig.tap(PointerKind::Mouse, 10.0, 10.0);

    let (verdict, click) = rig.click(10.0, 10.0);
    assert_eq!(verdict, ClickVerdict::Suppressed);
    assert!(click.default_prevented());
    assert!(!click.propagation_stopped());
}

#[test]
fn prevent_default_failure_still_stops_propagation() {
    let host = SimHost::with_capabilities(SimCapabilities {
        prevent_default: false,
        ..SimCapabilities::default()
    });
    let rig = PressRig::on_host(host, PressConfig::default());
    rig.tap(PointerKind::Mouse, 10.0, 10.0);

    let (verdict, click) = rig.click(10.0, 10.0);
    assert_eq!(verdict, ClickVerdict::Suppressed);
    assert!(!click.default_prevented());
    assert!(click.propagation_stopped());
}
