//! # AEGIS
//!
//! Decision gating and self-model for an autonomous LLM agent.
//!
//! Before a candidate action runs, the [`contemplation`] gate decides whether
//! it is ripe enough to act on now or should be parked in a deferred-thought
//! queue. After the action runs, the [`experience`] pipeline turns its outcome
//! into bounded, persistent changes to the [`identity`] store: values, wounds,
//! relationships and mood.
//!
//! ```text
//! agent loop ──contemplate()──▶ ContemplativeSystem ──reads──▶ Identity
//!     │                              │ not ready
//!     │ ready                        ▼
//!     ▼                         deferred queue ◀──revisit_queue()
//! execute action
//!     │
//!     └──process()──▶ ExperienceEngine ──mutates + saves──▶ Identity
//!                            └──appends──▶ experiences.jsonl
//! ```
//!
//! [`Aegis`] wires the three together from one [`AegisConfig`].

/// Implements `ALL`, `as_str`, `Display` and `FromStr` for a closed,
/// string-tagged enum. `FromStr` rejects unknown strings with
/// [`UnknownCategory`](crate::utilities::errors::UnknownCategory).
macro_rules! closed_category {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::utilities::errors::UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::utilities::errors::UnknownCategory::new($kind, other)),
                }
            }
        }
    };
}

pub mod aegis;
pub mod cli;
pub mod config;
pub mod contemplation;
pub mod experience;
pub mod identity;
pub mod utilities;

pub use aegis::Aegis;
pub use config::AegisConfig;
pub use contemplation::{ContemplativeSystem, Readiness, Thought, Verdict};
pub use experience::{ActionOutcome, Experience, ExperienceEngine};
pub use identity::{Identity, IdentityCore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
