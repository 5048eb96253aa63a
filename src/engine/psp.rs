use std::collections::HashSet;

use crate::domain::PspName;

/// PSPs that are internal cash registers unless configured otherwise.
pub const DEFAULT_INTERNAL_PSPS: &[&str] = &["TETHER"];

/// How the fold treats a PSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PspCategory {
    /// Commissioned external provider: rates, allocations and carry-forward apply.
    External,
    /// Internal cash register: no commission, no allocations, no carry-forward.
    InternalLedger,
}

/// A PSP resolved once per computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PspProfile {
    pub name: PspName,
    pub category: PspCategory,
}

impl PspProfile {
    pub fn is_internal_ledger(&self) -> bool {
        self.category == PspCategory::InternalLedger
    }
}

/// Category lookup for PSP names, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct PspRegistry {
    internal: HashSet<String>,
}

impl PspRegistry {
    pub fn new<I, S>(internal_psps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            internal: internal_psps
                .into_iter()
                .map(|name| name.as_ref().trim().to_uppercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn is_internal_ledger(&self, psp: &PspName) -> bool {
        self.internal.contains(psp.as_str())
    }

    pub fn profile(&self, psp: PspName) -> PspProfile {
        let category = if self.is_internal_ledger(&psp) {
            PspCategory::InternalLedger
        } else {
            PspCategory::External
        };
        PspProfile { name: psp, category }
    }
}

impl Default for PspRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_INTERNAL_PSPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn psp(name: &str) -> PspName {
        PspName::parse(name).unwrap()
    }

    #[test]
    fn test_default_registry_knows_tether() {
        let registry = PspRegistry::default();
        assert!(registry.is_internal_ledger(&psp("TETHER")));
        assert!(registry.is_internal_ledger(&psp("tether")));
        assert!(!registry.is_internal_ledger(&psp("PAPARA")));
    }

    #[test]
    fn test_profile_carries_category() {
        let registry = PspRegistry::default();
        assert_eq!(registry.profile(psp("Tether")).category, PspCategory::InternalLedger);
        assert!(!registry.profile(psp("PAPARA")).is_internal_ledger());
    }

    #[test]
    fn test_custom_internal_list() {
        let registry = PspRegistry::new(["kasa", " ", "Tether "]);
        assert!(registry.is_internal_ledger(&psp("KASA")));
        assert!(registry.is_internal_ledger(&psp("TETHER")));
        assert!(!registry.is_internal_ledger(&psp("PAPARA")));
    }

    #[test]
    fn test_empty_registry_treats_everyone_as_external() {
        let registry = PspRegistry::new(Vec::<String>::new());
        assert!(!registry.is_internal_ledger(&psp("TETHER")));
    }
}
