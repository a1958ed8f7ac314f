//! Every failure surfaced by this crate belongs to exactly one [`ErrorKind`]. Module-level error
//! enums expose their kind through a `kind` method so callers can react without matching on
//! each variant.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Retrying the same request won't help.
    Validation,
    /// No such resource for this user. Also returned for resources owned by someone else.
    NotFound,
    /// The request is well-formed but breaks a rule, e.g. applying a monthly expense twice in
    /// the same month.
    PolicyViolation,
    /// Credentials or token were rejected.
    Unauthorized,
    /// The store failed. Nothing was persisted, so the request is safe to retry.
    Storage,
}
