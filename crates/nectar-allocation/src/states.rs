//! Allocation request status codes.
//!
//! Statuses travel as single-letter codes on the wire; the display names
//! are a caller-level formatting aid.

/// Newly created, not yet submitted.
pub const NEW: &str = "N";

/// Submitted for approval.
pub const SUBMITTED: &str = "E";

/// Approved.
pub const APPROVED: &str = "A";

/// Declined by an approver.
pub const DECLINED: &str = "R";

/// Amendment submitted, pending approval.
pub const UPDATE_PENDING: &str = "X";

/// Amendment declined.
pub const UPDATE_DECLINED: &str = "J";

/// Legacy record.
pub const LEGACY: &str = "L";

/// Legacy record, approved.
pub const LEGACY_APPROVED: &str = "M";

/// Legacy record, rejected.
pub const LEGACY_REJECTED: &str = "O";

/// Deleted.
pub const DELETED: &str = "D";

/// Human-readable name for a status code, if the code is known.
#[must_use]
pub fn display_name(state: &str) -> Option<&'static str> {
    match state {
        NEW => Some("New"),
        SUBMITTED => Some("Submitted"),
        APPROVED => Some("Approved"),
        DECLINED => Some("Declined"),
        UPDATE_PENDING => Some("Update Pending"),
        UPDATE_DECLINED => Some("Update Declined"),
        LEGACY => Some("Legacy"),
        LEGACY_APPROVED => Some("Legacy Approved"),
        LEGACY_REJECTED => Some("Legacy Rejected"),
        DELETED => Some("Deleted"),
        _ => None,
    }
}
