//! Error types for ID generation.
//!
//! Generation has exactly one runtime failure mode: the wall clock reporting
//! a timestamp earlier than the last recorded production
//! ([`Error::ClockRegression`]). The generator never retries or self-corrects
//! for it; remediation is the caller's policy. The only other variant,
//! [`Error::InvalidIdentity`], is raised at construction time and never from
//! [`next_id`].
//!
//! [`next_id`]: crate::FloeGenerator::next_id

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for `floe`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The clock reported a timestamp earlier than the last production.
    ///
    /// The offending call produced no ID and left the generator state
    /// untouched. A later call succeeds as soon as the clock catches back up
    /// to `last_millis`.
    #[error(
        "clock moved backwards: last ID generated at {last_millis}ms, clock reads {observed_millis}ms"
    )]
    ClockRegression {
        /// Timestamp of the most recent successful production, in
        /// milliseconds since the generator's epoch.
        last_millis: u64,
        /// The regressed reading observed by the failing call.
        observed_millis: u64,
    },

    /// An identity field passed at construction exceeds its 5-bit range.
    #[error("invalid {field}: {value} exceeds maximum {max}")]
    InvalidIdentity {
        field: &'static str,
        value: u64,
        max: u64,
    },
}
