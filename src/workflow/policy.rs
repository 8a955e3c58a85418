use serde::{Deserialize, Serialize};

/// How branches of a consolidated-invoice chain are numbered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchHandling {
    #[default]
    IssueOwnInvoiceNumber,
    AssignSequentialBranchNumber,
}

impl BranchHandling {
    pub const ALL: [BranchHandling; 2] = [
        BranchHandling::IssueOwnInvoiceNumber,
        BranchHandling::AssignSequentialBranchNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BranchHandling::IssueOwnInvoiceNumber => "issue-own-invoice-number",
            BranchHandling::AssignSequentialBranchNumber => "assign-sequential-branch-number",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "issue-own-invoice-number" | "own" | "invoice" => {
                Some(BranchHandling::IssueOwnInvoiceNumber)
            }
            "assign-sequential-branch-number" | "sequential" | "branch" => {
                Some(BranchHandling::AssignSequentialBranchNumber)
            }
            _ => None,
        }
    }
}

/// Optional form fields whose visibility depends on the category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ExtraRegionCode,
    BranchHandling,
    BranchName,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ExtraRegionCode => "extra_region_code",
            Field::BranchHandling => "branch_handling",
            Field::BranchName => "branch_name",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveFields {
    pub extra_region_code: bool,
    pub branch_handling: bool,
    pub branch_name: bool,
}

impl ActiveFields {
    pub const NONE: ActiveFields = ActiveFields {
        extra_region_code: false,
        branch_handling: false,
        branch_name: false,
    };

    pub fn contains(&self, field: Field) -> bool {
        match field {
            Field::ExtraRegionCode => self.extra_region_code,
            Field::BranchHandling => self.branch_handling,
            Field::BranchName => self.branch_name,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ActiveFields::NONE
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        [Field::ExtraRegionCode, Field::BranchHandling, Field::BranchName]
            .into_iter()
            .filter(|f| self.contains(*f))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryClass {
    ConsolidatedInvoice,
    SeparateInvoice,
    RelatedEnterprise,
    Other,
}

/// Category labels the visibility rules key on.
///
/// Categories are server data, so the three labels that switch on the
/// optional fields are configurable; the defaults are the labels the
/// service ships with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPolicy {
    pub consolidated_invoice: String,
    pub separate_invoice: String,
    pub related_enterprise: String,
}

pub const DEFAULT_CONSOLIDATED_INVOICE: &str = "連鎖或相關企業的合開發票";
pub const DEFAULT_SEPARATE_INVOICE: &str = "連鎖或相關企業的不合開發票";
pub const DEFAULT_RELATED_ENTERPRISE: &str = "達清關係企業";

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self {
            consolidated_invoice: DEFAULT_CONSOLIDATED_INVOICE.to_string(),
            separate_invoice: DEFAULT_SEPARATE_INVOICE.to_string(),
            related_enterprise: DEFAULT_RELATED_ENTERPRISE.to_string(),
        }
    }
}

impl CategoryPolicy {
    pub fn classify(&self, category: &str) -> CategoryClass {
        let category = category.trim();
        if category.is_empty() {
            return CategoryClass::Other;
        }
        if category == self.consolidated_invoice.trim() {
            CategoryClass::ConsolidatedInvoice
        } else if category == self.separate_invoice.trim() {
            CategoryClass::SeparateInvoice
        } else if category == self.related_enterprise.trim() {
            CategoryClass::RelatedEnterprise
        } else {
            CategoryClass::Other
        }
    }

    /// Optional fields that are shown, collected and validated for a category.
    ///
    /// The consolidated-invoice category also exposes the branch-handling
    /// choice; an unset mode counts as [`BranchHandling::IssueOwnInvoiceNumber`].
    pub fn active_fields(
        &self,
        category: &str,
        branch_handling: Option<BranchHandling>,
    ) -> ActiveFields {
        match self.classify(category) {
            CategoryClass::ConsolidatedInvoice => ActiveFields {
                extra_region_code: true,
                branch_handling: true,
                branch_name: branch_handling.unwrap_or_default()
                    == BranchHandling::AssignSequentialBranchNumber,
            },
            CategoryClass::SeparateInvoice | CategoryClass::RelatedEnterprise => ActiveFields {
                extra_region_code: true,
                branch_handling: false,
                branch_name: true,
            },
            CategoryClass::Other => ActiveFields::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_categories_have_no_optional_fields() {
        let policy = CategoryPolicy::default();
        for category in ["單一客戶", "機動", "未定", "其他", ""] {
            assert!(policy.active_fields(category, None).is_empty());
            assert!(policy
                .active_fields(category, Some(BranchHandling::AssignSequentialBranchNumber))
                .is_empty());
        }
    }

    #[test]
    fn consolidated_invoice_defaults_to_own_invoice_number() {
        let policy = CategoryPolicy::default();
        let active = policy.active_fields(DEFAULT_CONSOLIDATED_INVOICE, None);
        assert!(active.extra_region_code);
        assert!(active.branch_handling);
        assert!(!active.branch_name);
    }

    #[test]
    fn consolidated_invoice_sequential_numbering_needs_branch_name() {
        let policy = CategoryPolicy::default();
        let active = policy.active_fields(
            DEFAULT_CONSOLIDATED_INVOICE,
            Some(BranchHandling::AssignSequentialBranchNumber),
        );
        assert_eq!(
            active.iter().collect::<Vec<_>>(),
            vec![
                Field::ExtraRegionCode,
                Field::BranchHandling,
                Field::BranchName
            ]
        );
    }

    #[test]
    fn separate_invoice_and_related_enterprise_ignore_branch_handling() {
        let policy = CategoryPolicy::default();
        for category in [DEFAULT_SEPARATE_INVOICE, DEFAULT_RELATED_ENTERPRISE] {
            let active =
                policy.active_fields(category, Some(BranchHandling::IssueOwnInvoiceNumber));
            assert!(active.extra_region_code);
            assert!(!active.branch_handling);
            assert!(active.branch_name);
        }
    }

    #[test]
    fn custom_labels_are_honoured() {
        let policy = CategoryPolicy {
            consolidated_invoice: "chain-consolidated".to_string(),
            separate_invoice: "chain-separate".to_string(),
            related_enterprise: "related-enterprise".to_string(),
        };
        assert_eq!(
            policy.classify(" related-enterprise "),
            CategoryClass::RelatedEnterprise
        );
        assert_eq!(policy.classify(DEFAULT_RELATED_ENTERPRISE), CategoryClass::Other);
    }

    #[test]
    fn branch_handling_parses_short_names() {
        assert_eq!(
            BranchHandling::parse("Sequential"),
            Some(BranchHandling::AssignSequentialBranchNumber)
        );
        assert_eq!(
            BranchHandling::parse("issue-own-invoice-number"),
            Some(BranchHandling::IssueOwnInvoiceNumber)
        );
        assert_eq!(BranchHandling::parse("split"), None);
    }
}
