#![no_main]

use arbitrary::Arbitrary;
use ipress_core::{GesturePhase, PointerKind, PressConfig};
use ipress_harness::PressRig;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Down { touch: bool, x: u8, y: u8 },
    Move { x: u8, y: u8 },
    Up { x: u8, y: u8 },
    Scroll,
    Resize,
    Advance(u16),
    Click { x: u8, y: u8 },
    SetEnabled(bool),
    Destroy,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_press_ms: u16,
    prevent_default: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let rig = PressRig::new(PressConfig {
        max_press_ms: u32::from(input.max_press_ms),
        prevent_default: input.prevent_default,
        ..PressConfig::default()
    });

    for op in input.ops.iter().take(256) {
        match *op {
            Op::Down { touch, x, y } => {
                let kind = if touch { PointerKind::Touch } else { PointerKind::Mouse };
                rig.down(kind, f64::from(x), f64::from(y));
            }
            Op::Move { x, y } => {
                rig.move_to(f64::from(x), f64::from(y));
            }
            Op::Up { x, y } => {
                rig.up(f64::from(x), f64::from(y));
            }
            Op::Scroll => {
                rig.host.scroll(rig.element);
            }
            Op::Resize => {
                rig.host.resize();
            }
            Op::Advance(ms) => rig.host.advance(f64::from(ms)),
            Op::Click { x, y } => {
                rig.click(f64::from(x), f64::from(y));
            }
            Op::SetEnabled(enabled) => rig.controller.set_enabled(enabled),
            Op::Destroy => rig.controller.destroy(),
        }
        rig.settle();

        if !rig.controller.has_active_interaction() {
            assert_eq!(rig.host.live_listener_count(), 0, "listener leaked");
        }
    }

    // Every start is followed by exactly one terminal event before the next start.
    let mut open = false;
    for event in rig.log.events() {
        match event.phase {
            GesturePhase::Start => {
                assert!(!open, "start while open");
                open = true;
            }
            GesturePhase::Intent => {
                assert!(open, "intent without start");
                open = false;
            }
            GesturePhase::Cancel => open = false,
        }
    }
    assert_eq!(open, rig.controller.has_active_interaction());
});
