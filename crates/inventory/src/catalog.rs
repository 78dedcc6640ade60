//! Catalog lookups over an inventory snapshot.

use everglow_core::ProductCode;

use crate::item::InventoryItem;

/// Case-insensitive exact lookup. The first matching row wins.
pub fn find_by_code<'a>(items: &'a [InventoryItem], code: &ProductCode) -> Option<&'a InventoryItem> {
    position_of(items, code).map(|idx| &items[idx])
}

/// Row position of `code` in the snapshot, in store order.
pub fn position_of(items: &[InventoryItem], code: &ProductCode) -> Option<usize> {
    items.iter().position(|item| item.code() == code)
}
