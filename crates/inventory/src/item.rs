use serde::{Deserialize, Serialize};

use everglow_core::{DomainError, DomainResult, ProductCode};

/// A catalog entry with its on-hand quantity.
///
/// Prices are held in the smallest currency unit (poisha for BDT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    code: ProductCode,
    name: String,
    stock: u32,
    wholesale_price: u64,
    retail_price: u64,
    image_ref: Option<String>,
}

/// Input for the administrative add-item action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub code: ProductCode,
    pub name: String,
    pub stock: u32,
    pub wholesale_price: u64,
    pub retail_price: u64,
    pub image_ref: Option<String>,
}

/// Partial administrative edit. `None` leaves the field untouched.
///
/// `image_ref: Some(None)` clears the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub stock: Option<u32>,
    pub wholesale_price: Option<u64>,
    pub retail_price: Option<u64>,
    pub image_ref: Option<Option<String>>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.stock.is_none()
            && self.wholesale_price.is_none()
            && self.retail_price.is_none()
            && self.image_ref.is_none()
    }
}

impl InventoryItem {
    /// Build a validated item from the add-item form.
    pub fn new(item: NewItem) -> DomainResult<Self> {
        let name = validate_name(&item.name)?;
        Ok(Self {
            code: item.code,
            name,
            stock: item.stock,
            wholesale_price: item.wholesale_price,
            retail_price: item.retail_price,
            image_ref: normalize_image_ref(item.image_ref),
        })
    }

    pub fn code(&self) -> &ProductCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn wholesale_price(&self) -> u64 {
        self.wholesale_price
    }

    pub fn retail_price(&self) -> u64 {
        self.retail_price
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    /// Decide a reservation of `quantity` units against this snapshot.
    ///
    /// Returns the item as it should be written back. Does not mutate `self`;
    /// the caller owns committing the new state.
    pub fn reserve(&self, quantity: u32) -> DomainResult<InventoryItem> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if quantity > self.stock {
            return Err(DomainError::insufficient_stock(quantity, self.stock));
        }

        let mut next = self.clone();
        next.stock = self.stock - quantity;
        Ok(next)
    }

    /// Apply an administrative edit, returning the edited item.
    pub fn apply_update(&self, update: &ItemUpdate) -> DomainResult<InventoryItem> {
        if update.is_empty() {
            return Err(DomainError::validation("update contains no changes"));
        }

        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = validate_name(name)?;
        }
        if let Some(stock) = update.stock {
            next.stock = stock;
        }
        if let Some(price) = update.wholesale_price {
            next.wholesale_price = price;
        }
        if let Some(price) = update.retail_price {
            next.retail_price = price;
        }
        if let Some(image_ref) = &update.image_ref {
            next.image_ref = normalize_image_ref(image_ref.clone());
        }
        Ok(next)
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

fn normalize_image_ref(image_ref: Option<String>) -> Option<String> {
    image_ref
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
