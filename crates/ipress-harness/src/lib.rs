#![forbid(unsafe_code)]

//! Test harness for IntentPress.
//!
//! - [`sim`]: a deterministic in-memory host (document, clock, queues).
//! - [`rig`]: a controller wired to one bound element, with a gesture log.
//!
//! ```
//! use ipress_harness::rig::PressRig;
//! use ipress_core::{GesturePhase, PointerKind, PressConfig};
//!
//! let rig = PressRig::new(PressConfig::default());
//! rig.down(PointerKind::Touch, 100.0, 100.0);
//! rig.up(100.0, 100.0);
//! rig.settle();
//! assert_eq!(rig.log.phases(), vec![GesturePhase::Start, GesturePhase::Intent]);
//! ```

pub mod rig;
pub mod sim;

pub use rig::{GestureLog, PressRig, SimGesture};
pub use sim::{Rect, SimCapabilities, SimElement, SimEvent, SimHost};
