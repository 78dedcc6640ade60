//! `Orders` sheet codec.

use chrono::SecondsFormat;
use serde_json::Value as JsonValue;

use everglow_core::{OrderId, ProductCode};
use everglow_orders::{OrderRecord, OrderStatus, RequesterInfo};

use super::{DecodedTable, MalformedRow, count, optional_text_cell, required_text, text, timestamp};
use crate::store::{Row, TableSnapshot};

pub const ORDER_ID: &str = "Order ID";
pub const CODE: &str = "Product Code";
pub const QUANTITY: &str = "Quantity";
pub const STATUS: &str = "Status";
pub const REQUESTER: &str = "Requester";
pub const CONTACT: &str = "Contact";
pub const CUSTOMER_NAME: &str = "Customer Name";
pub const CUSTOMER_PHONE: &str = "Customer Phone";
pub const DELIVERY_ADDRESS: &str = "Delivery Address";
pub const NOTE: &str = "Note";
pub const CREATED_AT: &str = "Created At";
pub const DISPATCHED_AT: &str = "Dispatched At";

pub type OrdersTable = DecodedTable<OrderRecord>;

pub fn decode(snapshot: TableSnapshot) -> Result<OrdersTable, MalformedRow> {
    DecodedTable::decode(snapshot, decode_row)
}

pub fn decode_row(row: &Row) -> Result<OrderRecord, String> {
    let order_id: OrderId = required_text(row, ORDER_ID)?
        .parse()
        .map_err(|e: everglow_core::DomainError| e.to_string())?;
    let product_code = ProductCode::parse(&required_text(row, CODE)?).map_err(|e| e.to_string())?;
    let status = OrderStatus::parse(&required_text(row, STATUS)?).map_err(|e| e.to_string())?;
    let created_at = timestamp(row, CREATED_AT)?.ok_or_else(|| format!("'{CREATED_AT}' is empty"))?;

    let requester = RequesterInfo {
        name: text(row, REQUESTER).unwrap_or_default(),
        contact: text(row, CONTACT).unwrap_or_default(),
        customer_name: text(row, CUSTOMER_NAME),
        customer_phone: text(row, CUSTOMER_PHONE),
        delivery_address: text(row, DELIVERY_ADDRESS),
        note: text(row, NOTE),
    };

    OrderRecord::restore(
        order_id,
        product_code,
        count(row, QUANTITY)?,
        status,
        requester,
        created_at,
        timestamp(row, DISPATCHED_AT)?,
    )
    .map_err(|e| e.to_string())
}

pub fn encode_into(row: &mut Row, order: &OrderRecord) {
    let requester = order.requester();
    let cells = [
        (ORDER_ID, JsonValue::from(order.order_id().to_string())),
        (CODE, JsonValue::from(order.product_code().as_str())),
        (QUANTITY, JsonValue::from(order.quantity())),
        (STATUS, JsonValue::from(order.status().as_str())),
        (REQUESTER, JsonValue::from(requester.name.as_str())),
        (CONTACT, JsonValue::from(requester.contact.as_str())),
        (CUSTOMER_NAME, optional_text_cell(requester.customer_name.as_deref())),
        (CUSTOMER_PHONE, optional_text_cell(requester.customer_phone.as_deref())),
        (DELIVERY_ADDRESS, optional_text_cell(requester.delivery_address.as_deref())),
        (NOTE, optional_text_cell(requester.note.as_deref())),
        (
            CREATED_AT,
            JsonValue::from(order.created_at().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ),
        (
            DISPATCHED_AT,
            optional_text_cell(
                order
                    .dispatched_at()
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                    .as_deref(),
            ),
        ),
    ];
    for (column, value) in cells {
        row.insert(column.to_string(), value);
    }
}

pub fn encode(order: &OrderRecord) -> Row {
    let mut row = Row::new();
    encode_into(&mut row, order);
    row
}
