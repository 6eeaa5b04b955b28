//! Replenishment policies

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};

/// Highest accepted service level
pub const MAX_SERVICE_LEVEL: f64 = 0.999;

/// Ordering constraints and target service level for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentPolicy {
    /// Probability of not stocking out during the lead time, in (0, 0.999]
    pub service_level: f64,
    /// Minimum order quantity
    pub moq: u32,
    /// Orders are placed in whole multiples of this quantity
    pub multiple: u32,
    /// Shelf life of the product in days.
    // TODO: cap order coverage at the shelf life for perishable SKUs; the
    // value is validated and carried but does not affect the recommendation.
    pub shelf_life_days: Option<u32>,
    /// Days of demand covered when no forecast distribution is available
    pub reorder_point_days: u32,
}

impl Default for IndentPolicy {
    fn default() -> Self {
        Self {
            service_level: 0.9,
            moq: 1,
            multiple: 1,
            shelf_life_days: None,
            reorder_point_days: 7,
        }
    }
}

impl IndentPolicy {
    /// Policy with the given service level and default constraints
    pub fn with_service_level(service_level: f64) -> Self {
        Self {
            service_level,
            ..Default::default()
        }
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.service_level > 0.0 && self.service_level <= MAX_SERVICE_LEVEL) {
            return Err(PolicyError::InvalidPolicy(format!(
                "service_level {} must be in (0, {MAX_SERVICE_LEVEL}]",
                self.service_level
            )));
        }
        if self.moq == 0 {
            return Err(PolicyError::InvalidPolicy(
                "moq must be a positive integer".to_string(),
            ));
        }
        if self.multiple == 0 {
            return Err(PolicyError::InvalidPolicy(
                "multiple must be a positive integer".to_string(),
            ));
        }
        if self.shelf_life_days == Some(0) {
            return Err(PolicyError::InvalidPolicy(
                "shelf_life_days must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Supplier terms for one SKU as stored in the lead-time master table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadTimeRecord {
    /// SKU identifier
    #[serde(rename = "SKU_ID")]
    pub sku_id: String,
    /// Days between ordering and receipt
    #[serde(rename = "Lead_Time_Days")]
    pub lead_time_days: u32,
    /// Order multiple
    #[serde(rename = "Order_Multiple", default = "one")]
    pub order_multiple: u32,
    /// Minimum order quantity
    #[serde(rename = "MOQ", default = "one")]
    pub moq: u32,
    /// Shelf life in days, if perishable
    #[serde(rename = "Shelf_Life_Days", default)]
    pub shelf_life_days: Option<u32>,
}

const fn one() -> u32 {
    1
}

impl LeadTimeRecord {
    /// Validate the record
    pub fn validate(&self) -> Result<()> {
        if self.lead_time_days == 0 {
            return Err(PolicyError::InvalidInput {
                name: "Lead_Time_Days".to_string(),
                reason: format!("must be positive for SKU {}", self.sku_id),
            });
        }
        Ok(())
    }

    /// Policy for this SKU at `service_level`
    pub fn policy(&self, service_level: f64) -> Result<IndentPolicy> {
        self.validate()?;
        let policy = IndentPolicy {
            service_level,
            moq: self.moq,
            multiple: self.order_multiple,
            shelf_life_days: self.shelf_life_days,
            ..Default::default()
        };
        policy.validate()?;
        Ok(policy)
    }
}
