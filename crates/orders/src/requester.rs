//! Who placed an order, and which of those details are mandatory.

use serde::{Deserialize, Serialize};

use everglow_core::{DomainError, DomainResult};

/// Free-form details identifying the requester of an order.
///
/// `name` identifies the partner (shop) and is always required. The customer
/// fields are filled in when a partner enters an order on a customer's behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterInfo {
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A requester detail that a policy can make mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterField {
    Name,
    Contact,
    CustomerName,
    CustomerPhone,
    DeliveryAddress,
}

impl RequesterField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequesterField::Name => "name",
            RequesterField::Contact => "contact",
            RequesterField::CustomerName => "customer_name",
            RequesterField::CustomerPhone => "customer_phone",
            RequesterField::DeliveryAddress => "delivery_address",
        }
    }

    fn is_filled(self, info: &RequesterInfo) -> bool {
        let value = match self {
            RequesterField::Name => Some(info.name.as_str()),
            RequesterField::Contact => Some(info.contact.as_str()),
            RequesterField::CustomerName => info.customer_name.as_deref(),
            RequesterField::CustomerPhone => info.customer_phone.as_deref(),
            RequesterField::DeliveryAddress => info.delivery_address.as_deref(),
        };
        value.is_some_and(|v| !v.trim().is_empty())
    }
}

/// The context an order is entered from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    /// A partner ordering stock for their own shop.
    #[default]
    PartnerDirect,
    /// A partner entering an order for one of their customers.
    CustomerOnBehalf,
}

/// Mandatory requester fields for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterPolicy {
    pub required: Vec<RequesterField>,
}

impl RequesterPolicy {
    /// Only the partner's name; deployments that want a contact add
    /// `contact` through configuration.
    pub fn partner_direct() -> Self {
        Self {
            required: vec![RequesterField::Name],
        }
    }

    pub fn customer_on_behalf() -> Self {
        Self {
            required: vec![
                RequesterField::Name,
                RequesterField::CustomerName,
                RequesterField::CustomerPhone,
                RequesterField::DeliveryAddress,
            ],
        }
    }

    /// Check that every mandatory field is non-blank. `name` is always mandatory.
    pub fn validate(&self, info: &RequesterInfo) -> DomainResult<()> {
        let mut missing: Vec<&'static str> = Vec::new();
        if !RequesterField::Name.is_filled(info) {
            missing.push(RequesterField::Name.as_str());
        }
        for field in &self.required {
            if *field != RequesterField::Name && !field.is_filled(info) {
                missing.push(field.as_str());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "missing required requester fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Policy per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterPolicies {
    #[serde(default = "RequesterPolicy::partner_direct")]
    pub partner_direct: RequesterPolicy,
    #[serde(default = "RequesterPolicy::customer_on_behalf")]
    pub customer_on_behalf: RequesterPolicy,
}

impl RequesterPolicies {
    pub fn for_channel(&self, channel: OrderChannel) -> &RequesterPolicy {
        match channel {
            OrderChannel::PartnerDirect => &self.partner_direct,
            OrderChannel::CustomerOnBehalf => &self.customer_on_behalf,
        }
    }
}

impl Default for RequesterPolicies {
    fn default() -> Self {
        Self {
            partner_direct: RequesterPolicy::partner_direct(),
            customer_on_behalf: RequesterPolicy::customer_on_behalf(),
        }
    }
}
