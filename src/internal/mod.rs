//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod destroy_bag;

pub(crate) use circular::ConstructionGuard;
pub(crate) use destroy_bag::DestroyBag;
