use tracing::debug;

use super::policy::{ActiveFields, BranchHandling, CategoryPolicy};
use crate::service::CustomerRequest;

/// The user's current form input. Optional text fields use the empty string
/// for "not set".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormSelection {
    pub region: String,
    pub category: String,
    pub company_name: String,
    pub extra_region_code: String,
    pub branch_handling: Option<BranchHandling>,
    pub branch_name: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl FormSelection {
    pub fn new(region: &str, category: &str, company_name: &str) -> Self {
        Self {
            region: region.to_string(),
            category: category.to_string(),
            company_name: company_name.to_string(),
            ..Self::default()
        }
    }

    pub fn active_fields(&self, policy: &CategoryPolicy) -> ActiveFields {
        policy.active_fields(&self.category, self.branch_handling)
    }

    /// Clears every field the policy marks inactive and fills in the default
    /// branch-handling mode where that choice is shown. Idempotent.
    pub fn apply_visibility(&mut self, policy: &CategoryPolicy) -> ActiveFields {
        let active = self.active_fields(policy);

        if !active.extra_region_code && !self.extra_region_code.is_empty() {
            debug!(value = %self.extra_region_code, "clearing inactive extra_region_code");
            self.extra_region_code.clear();
        }
        if active.branch_handling {
            if self.branch_handling.is_none() {
                self.branch_handling = Some(BranchHandling::default());
            }
        } else if self.branch_handling.take().is_some() {
            debug!("clearing inactive branch_handling");
        }
        if !active.branch_name && !self.branch_name.is_empty() {
            debug!(value = %self.branch_name, "clearing inactive branch_name");
            self.branch_name.clear();
        }
        active
    }

    pub fn set_category(&mut self, category: &str, policy: &CategoryPolicy) -> ActiveFields {
        self.category = category.to_string();
        self.apply_visibility(policy)
    }

    pub fn set_branch_handling(
        &mut self,
        branch_handling: BranchHandling,
        policy: &CategoryPolicy,
    ) -> ActiveFields {
        self.branch_handling = Some(branch_handling);
        self.apply_visibility(policy)
    }

    /// Builds the request body from active, non-empty fields only.
    pub fn to_request(&self, policy: &CategoryPolicy) -> CustomerRequest {
        let active = self.active_fields(policy);
        CustomerRequest {
            region: self.region.trim().to_string(),
            category: self.category.trim().to_string(),
            company_name: self.company_name.trim().to_string(),
            extra_region_code: if active.extra_region_code {
                non_empty(&self.extra_region_code)
            } else {
                None
            },
            branch_handling: if active.branch_handling {
                Some(self.branch_handling.unwrap_or_default())
            } else {
                None
            },
            branch_name: if active.branch_name {
                non_empty(&self.branch_name)
            } else {
                None
            },
        }
    }
}
