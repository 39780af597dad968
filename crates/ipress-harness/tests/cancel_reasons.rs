//! One scenario per cancellation reason, plus the guards that decide them.

#![forbid(unsafe_code)]

use std::collections::HashSet;

use ipress_core::GesturePhase::{Cancel, Intent, Start};
use ipress_core::{CancelReason, Modifiers, PointerKind, PressConfig};
use ipress_harness::{PressRig, Rect, SimCapabilities, SimEvent, SimHost};
use pretty_assertions::assert_eq;

fn rig() -> PressRig {
    PressRig::new(PressConfig::default())
}

fn loose() -> PressConfig {
    PressConfig {
        slop: Some(1_000.0),
        ..PressConfig::default()
    }
}

fn last_reason(rig: &PressRig) -> Option<CancelReason> {
    rig.log.last().and_then(|event| event.reason)
}

/// Drive one scenario that ends in `reason` and return what was observed.
fn provoke(reason: CancelReason) -> Option<CancelReason> {
    match reason {
        CancelReason::Disabled => {
            let rig = rig();
            rig.down(PointerKind::Mouse, 10.0, 10.0);
            rig.controller.set_enabled(false);
            last_reason(&rig)
        }
        CancelReason::NonPrimary => {
            let rig = rig();
            rig.down_with(&rig.pointer(PointerKind::Mouse, 10.0, 10.0).with_button(2));
            last_reason(&rig)
        }
        CancelReason::Modified => {
            let rig = rig();
            rig.down_with(
                &rig.pointer(PointerKind::Mouse, 10.0, 10.0)
                    .with_modifiers(Modifiers::CTRL),
            );
            last_reason(&rig)
        }
        CancelReason::Moved => {
            let rig = rig();
            rig.down(PointerKind::Touch, 10.0, 10.0);
            rig.move_to(40.0, 10.0);
            last_reason(&rig)
        }
        CancelReason::Scrolled => {
            let rig = rig();
            rig.down(PointerKind::Touch, 10.0, 10.0);
            rig.host.scroll(rig.host.html());
            last_reason(&rig)
        }
        CancelReason::Selection => {
            let rig = rig();
            rig.down(PointerKind::Mouse, 10.0, 10.0);
            rig.host.select_text(0, 5, 5);
            rig.up(10.0, 10.0);
            last_reason(&rig)
        }
        CancelReason::Canceled => {
            let rig = rig();
            rig.down(PointerKind::Touch, 10.0, 10.0);
            rig.host.pointer_cancel(&SimEvent::bare());
            last_reason(&rig)
        }
        CancelReason::LostCapture => {
            let rig = rig();
            rig.down(PointerKind::Pen, 10.0, 10.0);
            rig.host.lost_capture(&SimEvent::bare());
            last_reason(&rig)
        }
        CancelReason::HitTest => {
            let rig = PressRig::new(loose());
            rig.down(PointerKind::Mouse, 100.0, 100.0);
            rig.up(300.0, 300.0);
            last_reason(&rig)
        }
        CancelReason::Unmounted => {
            let rig = rig();
            rig.down(PointerKind::Mouse, 10.0, 10.0);
            rig.controller.destroy();
            last_reason(&rig)
        }
        CancelReason::Timeout => {
            let rig = PressRig::new(PressConfig {
                max_press_ms: 500,
                ..PressConfig::default()
            });
            rig.down(PointerKind::Touch, 10.0, 10.0);
            rig.host.advance(501.0);
            rig.up(10.0, 10.0);
            last_reason(&rig)
        }
        CancelReason::SupersededByNewInteraction => {
            let rig = rig();
            rig.down(PointerKind::Mouse, 10.0, 10.0);
            rig.down(PointerKind::Mouse, 10.0, 10.0);
            rig.log.events()[1].reason
        }
    }
}

#[test]
fn every_reason_is_reachable() {
    let mut seen = HashSet::new();
    for reason in CancelReason::ALL {
        assert_eq!(provoke(reason), Some(reason), "scenario for {reason}");
        seen.insert(reason);
    }
    assert_eq!(seen.len(), CancelReason::ALL.len());
}

#[test]
fn non_primary_down_creates_no_interaction() {
    let rig = rig();
    let down = rig.pointer(PointerKind::Mouse, 10.0, 10.0).with_button(2);
    rig.down_with(&down);

    assert_eq!(
        rig.log.summary(),
        vec![(Cancel, Some(CancelReason::NonPrimary))]
    );
    assert!(!rig.controller.has_active_interaction());
    assert_eq!(rig.host.live_listener_count(), 0);
    assert!(rig.host.captures().is_empty());
    assert_eq!(rig.log.last().expect("cancel").button, Some(2));
}

#[test]
fn non_primary_down_still_supersedes_live_interaction() {
    let rig = rig();
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.down_with(&rig.pointer(PointerKind::Mouse, 10.0, 10.0).with_button(1));

    assert_eq!(
        rig.log.summary(),
        vec![
            (Start, None),
            (Cancel, Some(CancelReason::SupersededByNewInteraction)),
            (Cancel, Some(CancelReason::NonPrimary)),
        ]
    );
}

#[test]
fn non_primary_allowed_by_config() {
    let rig = PressRig::new(PressConfig {
        allow_non_primary: true,
        ..PressConfig::default()
    });
    rig.down_with(&rig.pointer(PointerKind::Mouse, 10.0, 10.0).with_button(2));
    assert_eq!(rig.log.phases(), vec![Start]);
}

#[test]
fn touch_events_without_button_count_as_primary() {
    let rig = rig();
    rig.down_with(&SimEvent::touch(10.0, 10.0).on(rig.element));
    let start = rig.log.last().expect("start");
    assert_eq!(start.phase, Start);
    assert_eq!(start.pointer, PointerKind::Touch);
    assert_eq!((start.client_x, start.client_y), (10.0, 10.0));
}

#[test]
fn modified_down_rejected_unless_allowed() {
    for modifier in [Modifiers::ALT, Modifiers::CTRL, Modifiers::META, Modifiers::SHIFT] {
        let rig = rig();
        rig.down_with(&rig.pointer(PointerKind::Mouse, 1.0, 1.0).with_modifiers(modifier));
        assert_eq!(
            rig.log.summary(),
            vec![(Cancel, Some(CancelReason::Modified))]
        );
    }

    let rig = PressRig::new(PressConfig {
        allow_modified: true,
        ..PressConfig::default()
    });
    rig.down_with(
        &rig.pointer(PointerKind::Mouse, 1.0, 1.0)
            .with_modifiers(Modifiers::SHIFT),
    );
    rig.up(1.0, 1.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
    assert!(rig.log.events()[0].shift_key());
}

#[test]
fn scroll_of_any_element_cancels() {
    let rig = rig();
    let list = rig.host.append(rig.host.body(), "ul");
    rig.down(PointerKind::Touch, 10.0, 10.0);
    rig.host.scroll(list);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(
        rig.log.summary(),
        vec![(Start, None), (Cancel, Some(CancelReason::Scrolled))]
    );
}

#[test]
fn scrollable_ancestors_get_their_own_listeners() {
    let host = SimHost::new();
    host.make_scrollable(host.body());
    let rig = PressRig::on_host(host, PressConfig::default());
    rig.down(PointerKind::Touch, 10.0, 10.0);
    // five pointer listeners, window scroll, body scroll, root scroll
    assert_eq!(rig.host.live_listener_count(), 8);

    rig.host.scroll(rig.host.body());
    assert_eq!(last_reason(&rig), Some(CancelReason::Scrolled));
    assert_eq!(rig.host.live_listener_count(), 0);
}

#[test]
fn resize_reports_canceled() {
    let rig = rig();
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.host.resize();
    assert_eq!(
        rig.log.summary(),
        vec![(Start, None), (Cancel, Some(CancelReason::Canceled))]
    );
}

#[test]
fn collapsed_selection_at_up_is_not_a_change() {
    let rig = rig();
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.host.collapse_selection();
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn unchanged_selection_is_not_a_change() {
    let rig = rig();
    rig.host.select_text(2, 9, 7);
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn selection_change_allowed_by_config() {
    let rig = PressRig::new(PressConfig {
        allow_text_selection: true,
        ..PressConfig::default()
    });
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.host.select_text(0, 5, 5);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn missing_selection_api_never_cancels() {
    let host = SimHost::with_capabilities(SimCapabilities {
        selection_api: false,
        ..SimCapabilities::default()
    });
    let rig = PressRig::on_host(host, PressConfig::default());
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.host.select_text(0, 5, 5);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn timeout_boundary_is_exclusive() {
    let config = PressConfig {
        max_press_ms: 500,
        ..PressConfig::default()
    };
    let rig = PressRig::new(config);
    rig.down(PointerKind::Touch, 10.0, 10.0);
    rig.host.advance(500.0);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn zero_max_press_means_unlimited() {
    let rig = rig();
    rig.down(PointerKind::Touch, 10.0, 10.0);
    rig.host.advance(60_000.0);
    rig.up(10.0, 10.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn timeout_is_checked_before_selection() {
    let rig = PressRig::new(PressConfig {
        max_press_ms: 100,
        ..PressConfig::default()
    });
    rig.down(PointerKind::Mouse, 10.0, 10.0);
    rig.host.select_text(0, 3, 3);
    rig.host.advance(200.0);
    rig.up(10.0, 10.0);
    assert_eq!(last_reason(&rig), Some(CancelReason::Timeout));
}

#[test]
fn hit_test_accepts_descendants_of_bound_element() {
    let rig = PressRig::new(loose());
    let label = rig.host.append(rig.element, "span");
    rig.host.set_rect(label, Some(Rect::new(50.0, 50.0, 20.0, 20.0)));

    rig.down(PointerKind::Mouse, 100.0, 100.0);
    rig.up(55.0, 55.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}

#[test]
fn hit_test_fails_when_nothing_is_under_the_point() {
    let rig = PressRig::new(loose());
    rig.down(PointerKind::Mouse, 100.0, 100.0);
    rig.up(-50.0, -50.0);
    assert_eq!(last_reason(&rig), Some(CancelReason::HitTest));
}

#[test]
fn hit_test_uses_raw_target_without_bound_element() {
    let rig = PressRig::new(loose());
    let down = SimEvent::pointer(PointerKind::Mouse, 100.0, 100.0)
        .with_target(Some(rig.element))
        .with_current_target(None);
    rig.down_with(&down);
    rig.up(300.0, 300.0);
    assert_eq!(last_reason(&rig), Some(CancelReason::HitTest));
}

#[test]
fn hit_test_skipped_without_any_target() {
    let rig = PressRig::new(loose());
    rig.down_with(&SimEvent::pointer(PointerKind::Mouse, 100.0, 100.0));
    rig.up(500.0, 500.0);
    rig.settle();
    assert_eq!(rig.log.phases(), vec![Start, Intent]);
}
