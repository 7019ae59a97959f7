use crate::module::lc_check::error::AppError;
use crate::module::lc_check::model::{CaseStatus, Verdict};

/// Status reached after a check completes. The first check (recheck 0) moves
/// a fresh case out of `checking`; later checks either resolve the case or
/// loop it back to `discrepancy`.
pub fn status_after_check(
    current: CaseStatus,
    verdict: Verdict,
    recheck_number: u32,
) -> Result<CaseStatus, AppError> {
    if recheck_number == 0 {
        if current != CaseStatus::Checking {
            return Err(AppError::conflict(
                "CASE_ALREADY_CHECKED",
                format!("case already progressed to {}", current.as_str()),
            ));
        }
        return Ok(match verdict {
            Verdict::DiscrepanciesFound => CaseStatus::Discrepancy,
            Verdict::Compliant | Verdict::CompliantWithNotes => CaseStatus::AllClear,
        });
    }

    match current {
        CaseStatus::Discrepancy | CaseStatus::PendingCorrection | CaseStatus::Rechecking => {
            Ok(match verdict {
                Verdict::DiscrepanciesFound => CaseStatus::Discrepancy,
                Verdict::Compliant | Verdict::CompliantWithNotes => CaseStatus::Resolved,
            })
        }
        CaseStatus::Checking | CaseStatus::AllClear | CaseStatus::Resolved | CaseStatus::Closed => {
            Err(AppError::conflict(
                "CASE_NOT_RECHECKABLE",
                format!("case in status {} does not accept re-checks", current.as_str()),
            ))
        }
    }
}

pub fn status_after_correction(current: CaseStatus) -> Result<CaseStatus, AppError> {
    match current {
        CaseStatus::Discrepancy => Ok(CaseStatus::PendingCorrection),
        _ => Err(AppError::conflict(
            "NO_OPEN_DISCREPANCY",
            format!(
                "correction requests require an open discrepancy, case is {}",
                current.as_str()
            ),
        )),
    }
}

/// Explicit user/admin close. Terminal, never automatic.
pub fn status_after_close(current: CaseStatus) -> Result<CaseStatus, AppError> {
    match current {
        CaseStatus::AllClear | CaseStatus::Resolved => Ok(CaseStatus::Closed),
        CaseStatus::Closed => Err(AppError::conflict("CASE_CLOSED", "case is already closed")),
        _ => Err(AppError::conflict(
            "CASE_NOT_CLOSABLE",
            format!("case in status {} cannot be closed", current.as_str()),
        )),
    }
}

/// Precondition only: the quota gate never moves the state machine. Beyond
/// the free allowance the billing collaborator must have authorized payment.
pub fn ensure_recheck_allowed(
    recheck_count: u32,
    max_free_rechecks: u32,
    payment_authorized: bool,
) -> Result<(), AppError> {
    if recheck_count < max_free_rechecks || payment_authorized {
        return Ok(());
    }
    Err(AppError::payment_required(
        "PAYMENT_REQUIRED",
        format!(
            "free re-check allowance of {max_free_rechecks} exhausted, payment authorization required"
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_compliant_check_lands_all_clear() {
        let status =
            status_after_check(CaseStatus::Checking, Verdict::Compliant, 0).expect("transition");
        assert_eq!(status, CaseStatus::AllClear);
        let status = status_after_check(CaseStatus::Checking, Verdict::CompliantWithNotes, 0)
            .expect("transition");
        assert_eq!(status, CaseStatus::AllClear);
    }

    #[test]
    fn first_discrepant_check_lands_discrepancy() {
        let status = status_after_check(CaseStatus::Checking, Verdict::DiscrepanciesFound, 0)
            .expect("transition");
        assert_eq!(status, CaseStatus::Discrepancy);
    }

    #[test]
    fn recheck_resolves_or_loops_back() {
        let resolved = status_after_check(CaseStatus::PendingCorrection, Verdict::Compliant, 1)
            .expect("transition");
        assert_eq!(resolved, CaseStatus::Resolved);
        let looped =
            status_after_check(CaseStatus::PendingCorrection, Verdict::DiscrepanciesFound, 1)
                .expect("transition");
        assert_eq!(looped, CaseStatus::Discrepancy);
    }

    #[test]
    fn closed_case_rejects_rechecks() {
        let err = status_after_check(CaseStatus::Closed, Verdict::Compliant, 2)
            .expect_err("must reject");
        assert_eq!(err.code, "CASE_NOT_RECHECKABLE");
    }

    #[test]
    fn correction_requires_open_discrepancy() {
        assert_eq!(
            status_after_correction(CaseStatus::Discrepancy).expect("transition"),
            CaseStatus::PendingCorrection
        );
        let err = status_after_correction(CaseStatus::AllClear).expect_err("must reject");
        assert_eq!(err.code, "NO_OPEN_DISCREPANCY");
    }

    #[test]
    fn close_only_from_clear_or_resolved() {
        assert_eq!(
            status_after_close(CaseStatus::AllClear).expect("transition"),
            CaseStatus::Closed
        );
        assert_eq!(
            status_after_close(CaseStatus::Resolved).expect("transition"),
            CaseStatus::Closed
        );
        let err = status_after_close(CaseStatus::Discrepancy).expect_err("must reject");
        assert_eq!(err.code, "CASE_NOT_CLOSABLE");
    }

    #[test]
    fn quota_gate_signals_payment_required() {
        ensure_recheck_allowed(1, 2, false).expect("within allowance");
        ensure_recheck_allowed(2, 2, true).expect("paid re-check");
        let err = ensure_recheck_allowed(2, 2, false).expect_err("must reject");
        assert_eq!(err.code, "PAYMENT_REQUIRED");
        assert_eq!(err.status, axum::http::StatusCode::PAYMENT_REQUIRED);
    }
}
