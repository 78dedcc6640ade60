//! `Inventory` sheet codec.

use serde_json::Value as JsonValue;

use everglow_core::ProductCode;
use everglow_inventory::{InventoryItem, NewItem};

use super::{DecodedTable, MalformedRow, count, money, money_cell, optional_text_cell, required_text, text};
use crate::store::{Row, TableSnapshot};

pub const CODE: &str = "Product Code";
pub const NAME: &str = "Product Name";
pub const STOCK: &str = "Stock";
pub const WHOLESALE_PRICE: &str = "Paikari Price";
pub const RETAIL_PRICE: &str = "Sell Price";
pub const IMAGE: &str = "Pic_URL";

pub type InventoryTable = DecodedTable<InventoryItem>;

pub fn decode(snapshot: TableSnapshot) -> Result<InventoryTable, MalformedRow> {
    DecodedTable::decode(snapshot, decode_row)
}

pub fn decode_row(row: &Row) -> Result<InventoryItem, String> {
    let code = ProductCode::parse(&required_text(row, CODE)?).map_err(|e| e.to_string())?;
    let item = NewItem {
        code,
        name: required_text(row, NAME)?,
        stock: count(row, STOCK)?,
        wholesale_price: money(row, WHOLESALE_PRICE)?,
        retail_price: money(row, RETAIL_PRICE)?,
        image_ref: text(row, IMAGE),
    };
    InventoryItem::new(item).map_err(|e| e.to_string())
}

/// Write the item's fields into an existing row, leaving other columns alone.
pub fn encode_into(row: &mut Row, item: &InventoryItem) {
    row.insert(CODE.to_string(), JsonValue::from(item.code().as_str()));
    row.insert(NAME.to_string(), JsonValue::from(item.name()));
    row.insert(STOCK.to_string(), JsonValue::from(item.stock()));
    row.insert(WHOLESALE_PRICE.to_string(), money_cell(item.wholesale_price()));
    row.insert(RETAIL_PRICE.to_string(), money_cell(item.retail_price()));
    row.insert(IMAGE.to_string(), optional_text_cell(item.image_ref()));
}

pub fn encode(item: &InventoryItem) -> Row {
    let mut row = Row::new();
    encode_into(&mut row, item);
    row
}
