use thiserror::Error;

use super::policy::CategoryPolicy;
use super::selection::FormSelection;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("company name is required")]
    MissingCompanyName,

    #[error("branch name is required for this category")]
    MissingBranchName,
}

/// Local checks run before any request is sent.
pub fn validate(selection: &FormSelection, policy: &CategoryPolicy) -> Result<(), ValidationError> {
    if selection.company_name.trim().is_empty() {
        return Err(ValidationError::MissingCompanyName);
    }
    let active = selection.active_fields(policy);
    if active.branch_name && selection.branch_name.trim().is_empty() {
        return Err(ValidationError::MissingBranchName);
    }
    Ok(())
}
