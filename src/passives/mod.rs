//! Passive abilities.
//!
//! Passives are trigger-bound behaviours a unit may carry in its single
//! passive slot. They are a closed set of variants (`PassiveKind`) looked up
//! by name in a `PassiveRegistry`, and the attack pipeline invokes them at
//! two fixed points:
//!
//! - [`PassiveTrigger::OnBeingHit`]: before damage; may dodge or rescale
//! - [`PassiveTrigger::OnAfterHit`]: after damage; may retaliate
//!
//! ```
//! use charge_battle::passives::{PassiveRegistry, PassiveTrigger};
//!
//! let registry = PassiveRegistry::with_defaults();
//! let riposte = registry.require("riposte").unwrap();
//! assert_eq!(riposte.trigger(), PassiveTrigger::OnAfterHit);
//! ```

mod passive;
mod registry;

pub use passive::{
    HitContext, PassiveAbility, PassiveKind, PassiveResult, PassiveTrigger, Retaliation,
};
pub use registry::PassiveRegistry;
