//! Reorder-point order recommendations
//!
//! For lead time `L` days and daily demand mean `μ` and standard deviation `σ`:
//!
//! - lead-time demand mean: `μ·L`
//! - lead-time demand std: `σ·√L` (independent daily demand)
//! - safety stock: `z·σ·√L`
//! - reorder point: `μ·L + z·σ·√L`
//!
//! The suggested order closes the gap between the reorder point and the stock
//! on hand, then applies the policy's order multiple and minimum order
//! quantity, in that order.

use crate::error::{PolicyError, Result};
use crate::policy::IndentPolicy;
use crate::zscore::z_for_service_level;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which rule determined the suggested quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundReason {
    /// The raw gap to the reorder point was ordered as is
    #[serde(rename = "reorder_gap")]
    ReorderGap,
    /// Rounding to the order multiple or raising to the MOQ changed the quantity
    #[serde(rename = "multiple/moq_applied")]
    MultipleOrMoqApplied,
}

impl BoundReason {
    /// Wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReorderGap => "reorder_gap",
            Self::MultipleOrMoqApplied => "multiple/moq_applied",
        }
    }
}

impl fmt::Display for BoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRecommendation {
    /// Stock level that should trigger an order
    pub reorder_point: f64,
    /// Buffer above expected lead-time demand
    pub safety_stock: f64,
    /// Quantity to order now (never negative)
    pub suggested_order: f64,
    /// Rule that produced `suggested_order`
    pub bound_reason: BoundReason,
}

/// Daily demand mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandStatistics {
    /// Mean daily demand
    pub daily_mean: f64,
    /// Standard deviation of daily demand
    pub daily_std: f64,
}

impl DemandStatistics {
    /// Create validated statistics
    pub fn new(daily_mean: f64, daily_std: f64) -> Result<Self> {
        let inputs = [
            ("daily_mean_demand", daily_mean),
            ("daily_std_demand", daily_std),
        ];
        for (name, value) in inputs {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(PolicyError::InvalidInput {
                    name: name.to_string(),
                    reason: format!("{value} must be a finite non-negative number"),
                });
            }
        }
        Ok(Self {
            daily_mean,
            daily_std,
        })
    }

    /// Mean and sample standard deviation of a daily forecast horizon.
    ///
    /// A negative mean is floored at zero; a single-day horizon has zero
    /// standard deviation.
    pub fn from_forecast(forecast: &[f64]) -> Result<Self> {
        if forecast.is_empty() {
            return Err(PolicyError::InvalidInput {
                name: "forecast".to_string(),
                reason: "horizon is empty".to_string(),
            });
        }
        let n = forecast.len() as f64;
        let mean = forecast.iter().sum::<f64>() / n;
        let std = if forecast.len() > 1 {
            let ss: f64 = forecast.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Self::new(mean.max(0.0), std)
    }
}

/// Stateless evaluator of [`IndentPolicy`] rules
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryPolicyEngine;

impl InventoryPolicyEngine {
    /// Recommend an order for one SKU
    pub fn recommend(
        &self,
        demand: DemandStatistics,
        lead_time_days: u32,
        on_hand: f64,
        policy: &IndentPolicy,
    ) -> Result<OrderRecommendation> {
        recommend_order(
            demand.daily_mean,
            demand.daily_std,
            lead_time_days,
            on_hand,
            policy,
        )
    }
}

/// Recommend an order quantity from demand statistics and stock on hand
pub fn recommend_order(
    daily_mean_demand: f64,
    daily_std_demand: f64,
    lead_time_days: u32,
    on_hand: f64,
    policy: &IndentPolicy,
) -> Result<OrderRecommendation> {
    policy.validate()?;
    DemandStatistics::new(daily_mean_demand, daily_std_demand)?;
    if lead_time_days == 0 {
        return Err(PolicyError::InvalidInput {
            name: "lead_time_days".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if !(on_hand >= 0.0 && on_hand.is_finite()) {
        return Err(PolicyError::InvalidInput {
            name: "on_hand".to_string(),
            reason: format!("{on_hand} must be a finite non-negative number"),
        });
    }

    let z = z_for_service_level(policy.service_level);
    let lead_time = f64::from(lead_time_days);
    let lead_mean = daily_mean_demand * lead_time;
    let lead_std = daily_std_demand * lead_time.sqrt();
    let safety_stock = z * lead_std;
    let reorder_point = lead_mean + safety_stock;

    let raw_gap = (reorder_point - on_hand).max(0.0);
    let mut quantity = raw_gap;
    if policy.multiple > 1 {
        let multiple = f64::from(policy.multiple);
        quantity = multiple * (quantity / multiple).ceil();
    }
    let moq = f64::from(policy.moq);
    if quantity > 0.0 && quantity < moq {
        quantity = moq;
    }

    let bound_reason = if quantity == raw_gap {
        BoundReason::ReorderGap
    } else {
        BoundReason::MultipleOrMoqApplied
    };
    debug!(
        z,
        lead_mean,
        lead_std,
        reorder_point,
        raw_gap,
        suggested_order = quantity,
        bound_reason = %bound_reason,
        "Computed order recommendation"
    );

    Ok(OrderRecommendation {
        reorder_point,
        safety_stock,
        suggested_order: quantity,
        bound_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bound_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&BoundReason::MultipleOrMoqApplied).unwrap(),
            "\"multiple/moq_applied\""
        );
        assert_eq!(BoundReason::ReorderGap.to_string(), "reorder_gap");
    }

    #[test]
    fn test_moq_raises_small_orders() {
        let policy = IndentPolicy {
            moq: 25,
            ..Default::default()
        };
        let rec = recommend_order(10.0, 2.0, 5, 40.0, &policy).unwrap();
        assert_relative_eq!(rec.suggested_order, 25.0);
        assert_eq!(rec.bound_reason, BoundReason::MultipleOrMoqApplied);
    }

    #[test]
    fn test_exact_multiple_is_unchanged() {
        let policy = IndentPolicy {
            multiple: 5,
            ..Default::default()
        };
        // Zero variability: reorder point 50, gap exactly 10
        let rec = recommend_order(10.0, 0.0, 5, 40.0, &policy).unwrap();
        assert_relative_eq!(rec.suggested_order, 10.0);
        assert_eq!(rec.bound_reason, BoundReason::ReorderGap);
    }

    #[test]
    fn test_invalid_inputs() {
        let policy = IndentPolicy::default();
        assert!(recommend_order(-1.0, 0.0, 5, 0.0, &policy).is_err());
        assert!(recommend_order(1.0, f64::NAN, 5, 0.0, &policy).is_err());
        assert!(recommend_order(1.0, 0.0, 0, 0.0, &policy).is_err());
        assert!(recommend_order(1.0, 0.0, 5, -3.0, &policy).is_err());
    }

    #[test]
    fn test_demand_from_forecast() {
        let stats = DemandStatistics::from_forecast(&[8.0, 10.0, 12.0]).unwrap();
        assert_relative_eq!(stats.daily_mean, 10.0);
        assert_relative_eq!(stats.daily_std, 2.0);

        let single = DemandStatistics::from_forecast(&[-4.0]).unwrap();
        assert_relative_eq!(single.daily_mean, 0.0);
        assert_relative_eq!(single.daily_std, 0.0);

        assert!(DemandStatistics::from_forecast(&[]).is_err());
    }
}
