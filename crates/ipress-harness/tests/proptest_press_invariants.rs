//! Property-based invariant tests for the press controller.
//!
//! Random sequences of downs, moves, ups, scrolls, cancels, clock advances,
//! clicks, and enable toggles are replayed against a [`PressRig`], with a
//! microtask checkpoint after every step (as a browser drains microtasks
//! after each dispatched event). After each step:
//!
//! 1. `start` and terminal events (`cancel` / `intent`) alternate strictly
//! 2. The controller reports a live interaction exactly when the log is open
//! 3. No listener outlives its interaction
//! 4. A move or up beyond slop never yields `intent`
//! 5. A suppressed click is within the guard window and radius of the token
//! 6. Determinism: the same sequence yields the same log

use ipress_core::config::default_slop;
use ipress_core::{
    CLICK_GUARD_RADIUS_PX, CLICK_GUARD_WINDOW_MS, CancelReason, ClickVerdict, GesturePhase,
    Point, PointerKind, PressConfig,
};
use ipress_harness::PressRig;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Down(PointerKind, f64, f64),
    Move(f64, f64),
    Up(f64, f64),
    Scroll,
    PointerCancel,
    Advance(f64),
    Click(f64, f64),
    SetEnabled(bool),
}

fn coord_strategy() -> impl Strategy<Value = f64> {
    (0u16..260).prop_map(f64::from)
}

fn kind_strategy() -> impl Strategy<Value = PointerKind> {
    prop_oneof![
        Just(PointerKind::Mouse),
        Just(PointerKind::Touch),
        Just(PointerKind::Pen),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind_strategy(), coord_strategy(), coord_strategy()).prop_map(|(k, x, y)| Op::Down(k, x, y)),
        4 => (coord_strategy(), coord_strategy()).prop_map(|(x, y)| Op::Move(x, y)),
        3 => (coord_strategy(), coord_strategy()).prop_map(|(x, y)| Op::Up(x, y)),
        1 => Just(Op::Scroll),
        1 => Just(Op::PointerCancel),
        2 => (0u16..800).prop_map(|ms| Op::Advance(f64::from(ms))),
        2 => (coord_strategy(), coord_strategy()).prop_map(|(x, y)| Op::Click(x, y)),
        1 => any::<bool>().prop_map(Op::SetEnabled),
    ]
}

fn config_strategy() -> impl Strategy<Value = PressConfig> {
    (prop_oneof![Just(0u32), 100u32..1_000]).prop_map(|max_press_ms| PressConfig {
        max_press_ms,
        ..PressConfig::default()
    })
}

// ── Model ───────────────────────────────────────────────────────────────

struct Live {
    origin: Point,
    slop: f64,
}

/// Replay `ops`, checking invariants after every step. Returns the final
/// `(phase, reason)` log.
fn run(config: PressConfig, ops: &[Op]) -> Result<Vec<(GesturePhase, Option<CancelReason>)>, TestCaseError> {
    let rig = PressRig::new(config);
    let mut live: Option<Live> = None;

    for op in ops {
        let before = rig.log.len();
        let mut beyond_slop = false;

        match *op {
            Op::Down(kind, x, y) => {
                rig.down(kind, x, y);
            }
            Op::Move(x, y) | Op::Up(x, y) => {
                if let Some(l) = &live {
                    beyond_slop = Point::new(x, y).distance_sq(l.origin) > l.slop * l.slop;
                }
                if matches!(op, Op::Move(..)) {
                    rig.move_to(x, y);
                } else {
                    rig.up(x, y);
                }
            }
            Op::Scroll => {
                rig.host.scroll(rig.element);
            }
            Op::PointerCancel => {
                rig.host.pointer_cancel(&rig.pointer(PointerKind::Mouse, 0.0, 0.0));
            }
            Op::Advance(ms) => rig.host.advance(ms),
            Op::Click(x, y) => {
                let token = rig.controller.guard_token();
                let (verdict, _) = rig.click(x, y);
                if verdict == ClickVerdict::Suppressed {
                    let token = token.ok_or_else(|| TestCaseError::fail("suppressed without token"))?;
                    prop_assert!(rig.host.now() - token.at_ms <= CLICK_GUARD_WINDOW_MS);
                    prop_assert!(
                        token.point.distance_sq(Point::new(x, y))
                            <= CLICK_GUARD_RADIUS_PX * CLICK_GUARD_RADIUS_PX
                    );
                }
            }
            Op::SetEnabled(enabled) => rig.controller.set_enabled(enabled),
        }
        rig.settle();

        let events = rig.log.events();
        for event in &events[before..] {
            match event.phase {
                GesturePhase::Start => {
                    prop_assert!(live.is_none(), "start while another interaction is open");
                    live = Some(Live {
                        origin: event.point(),
                        slop: default_slop(event.pointer, 1.0),
                    });
                }
                GesturePhase::Intent => {
                    prop_assert!(live.is_some(), "intent without start");
                    prop_assert!(!beyond_slop, "intent after leaving slop");
                    live = None;
                }
                GesturePhase::Cancel => {
                    let reason = event.reason;
                    prop_assert!(reason.is_some());
                    let standalone = matches!(
                        reason,
                        Some(CancelReason::NonPrimary | CancelReason::Modified)
                    );
                    prop_assert!(standalone || live.is_some(), "cancel without start");
                    if !standalone {
                        live = None;
                    }
                }
            }
        }

        if beyond_slop && before < events.len() {
            prop_assert_eq!(events[before].reason, Some(CancelReason::Moved));
        }
        prop_assert_eq!(rig.controller.has_active_interaction(), live.is_some());
        if live.is_none() {
            prop_assert_eq!(rig.host.live_listener_count(), 0);
        }
    }

    Ok(rig.log.summary())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn press_invariants_hold(config in config_strategy(), ops in prop::collection::vec(op_strategy(), 1..48)) {
        run(config, &ops)?;
    }

    #[test]
    fn replay_is_deterministic(config in config_strategy(), ops in prop::collection::vec(op_strategy(), 1..32)) {
        let first = run(config, &ops)?;
        let second = run(config, &ops)?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn destroy_always_leaves_nothing_behind(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let rig = PressRig::new(PressConfig::default());
        for op in &ops {
            if let Op::Down(kind, x, y) = *op {
                rig.down(kind, x, y);
            }
        }
        rig.controller.destroy();
        let after_destroy = rig.log.len();
        rig.controller.destroy();
        rig.tap(PointerKind::Mouse, 10.0, 10.0);

        prop_assert_eq!(rig.log.len(), after_destroy);
        prop_assert!(!rig.controller.has_active_interaction());
        prop_assert_eq!(rig.host.live_listener_count(), 0);
        prop_assert!(rig.controller.guard_token().is_none());
    }
}
