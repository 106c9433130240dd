//! Spot-rate calculator: `base × zone factor × weight factor`, then a
//! percentage or flat discount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_ZONE: u8 = 1;
pub const MAX_ZONE: u8 = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(Decimal),
    Flat(Decimal),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateInput {
    pub weight_lbs: Decimal,
    pub zone: u8,
    pub base_rate: Decimal,
    pub discount: Discount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub zone_factor: Decimal,
    pub weight_factor: Decimal,
    pub gross_rate: Decimal,
    pub final_rate: Decimal,
    pub total_discount: Decimal,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("zone {0} is outside {MIN_ZONE}..={MAX_ZONE}")]
    ZoneOutOfRange(u8),
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },
    #[error("percentage discount must be within 0..=100 (got {0})")]
    PercentageOutOfRange(Decimal),
    #[error("rate for these inputs exceeds the representable range")]
    Overflow,
}

pub trait RateCalculator: Send + Sync {
    fn quote(&self, input: &RateInput) -> Result<RateQuote, RateError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StaticRateCalculator;

impl RateCalculator for StaticRateCalculator {
    fn quote(&self, input: &RateInput) -> Result<RateQuote, RateError> {
        calculate(input)
    }
}

pub fn zone_factor(zone: u8) -> Decimal {
    Decimal::ONE + Decimal::from(zone) * Decimal::new(1, 1)
}

pub fn weight_factor(weight_lbs: Decimal) -> Option<Decimal> {
    weight_lbs.checked_mul(Decimal::new(5, 2))?.checked_add(Decimal::ONE)
}

pub fn calculate(input: &RateInput) -> Result<RateQuote, RateError> {
    if !(MIN_ZONE..=MAX_ZONE).contains(&input.zone) {
        return Err(RateError::ZoneOutOfRange(input.zone));
    }
    non_negative("weightLbs", input.weight_lbs)?;
    non_negative("baseRate", input.base_rate)?;

    let zone_factor = zone_factor(input.zone);
    let weight_factor = weight_factor(input.weight_lbs).ok_or(RateError::Overflow)?;
    let gross = input
        .base_rate
        .checked_mul(zone_factor)
        .and_then(|rate| rate.checked_mul(weight_factor))
        .ok_or(RateError::Overflow)?;

    let discounted = match &input.discount {
        Discount::Percentage(percent) => {
            if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(RateError::PercentageOutOfRange(*percent));
            }
            gross
                .checked_mul(Decimal::ONE - *percent / Decimal::ONE_HUNDRED)
                .ok_or(RateError::Overflow)?
        }
        Discount::Flat(amount) => {
            non_negative("discount", *amount)?;
            (gross - *amount).max(Decimal::ZERO)
        }
    };

    let gross_rate = cents(gross);
    let final_rate = cents(discounted);
    Ok(RateQuote {
        zone_factor: zone_factor.normalize(),
        weight_factor: weight_factor.normalize(),
        gross_rate,
        final_rate,
        total_discount: gross_rate - final_rate,
    })
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), RateError> {
    if value < Decimal::ZERO {
        return Err(RateError::Negative { field, value });
    }
    Ok(())
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
