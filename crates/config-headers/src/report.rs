//! Outcome of one injection pass

use rvoip_sip_message::HeaderName;

use crate::lookup::LookupOutcome;

/// How a header was put on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Existing values of that name were replaced
    Replaced,
    /// Appended next to existing values
    Appended,
}

/// A header the pass put on the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedHeader {
    pub index: String,
    pub name: HeaderName,
    pub value: String,
    pub mode: ApplyMode,
}

/// Why a spec did not produce a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Name or value missing from configuration
    Incomplete,
    /// Method filter does not match the request
    MethodMismatch { method: String },
    /// Dialog-initial header on a request whose CSeq is not 1
    NotDialogInitial { seq: Option<u32> },
    /// Header construction or application failed
    Rejected(String),
}

/// A spec that did not produce a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSpec {
    pub index: String,
    pub reason: SkipReason,
}

/// What a pass derived and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Host part of the To URI, empty when it could not be derived
    pub domain_name: String,
    pub lookup_server: LookupOutcome,
    pub applied: Vec<AppliedHeader>,
    pub skipped: Vec<SkippedSpec>,
}

impl InjectionReport {
    /// Applied entry for a spec index
    pub fn applied_for(&self, index: &str) -> Option<&AppliedHeader> {
        self.applied.iter().find(|a| a.index == index)
    }

    /// Skip reason for a spec index
    pub fn skip_reason(&self, index: &str) -> Option<&SkipReason> {
        self.skipped.iter().find(|s| s.index == index).map(|s| &s.reason)
    }

    pub(crate) fn skip(&mut self, index: &str, reason: SkipReason) {
        self.skipped.push(SkippedSpec {
            index: index.to_string(),
            reason,
        });
    }
}
