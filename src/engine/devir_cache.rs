//! Write policy shared by every DEVİR cache backend.

use crate::domain::Decimal;
use rust_decimal::Decimal as RustDecimal;

/// Stored values within this distance of a new value are left untouched.
pub const DEFAULT_CACHE_EPSILON: Decimal = Decimal::new(RustDecimal::from_parts(1, 0, 0, false, 2));

/// What to do with one `(psp, date, devir)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    Insert,
    Update,
    Skip,
}

pub fn plan_write(existing: Option<Decimal>, new: Decimal, epsilon: Decimal) -> CacheAction {
    match existing {
        None => CacheAction::Insert,
        Some(stored) if stored.differs_from(new, epsilon) => CacheAction::Update,
        Some(_) => CacheAction::Skip,
    }
}
