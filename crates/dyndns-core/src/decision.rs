//! Reconciliation decision
//!
//! Compares the observed record against the current public address and
//! picks the corrective action. Pure: no I/O, deterministic, total.

use std::net::IpAddr;

use crate::resolver::RecordResolution;

/// What the run has to do to converge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The record already points at the current address
    NoOp,
    /// The record exists with another value
    Update(String),
    /// No record exists yet
    Create,
}

/// Decide the action for `current_ip` given the resolved record
///
/// The stored value is compared as an address, so equivalent spellings of
/// the same address match. A value that is not an address never matches.
pub fn decide(current_ip: IpAddr, resolution: &RecordResolution) -> Action {
    match resolution {
        RecordResolution::Absent => Action::Create,
        RecordResolution::Found { record, .. } => {
            if value_matches(&record.value, current_ip) {
                Action::NoOp
            } else {
                Action::Update(record.id.clone())
            }
        }
    }
}

fn value_matches(value: &str, ip: IpAddr) -> bool {
    value.parse::<IpAddr>().is_ok_and(|stored| stored == ip)
}
