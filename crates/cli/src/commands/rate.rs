use pricedesk_core::{RateCalculator, RateInput, StaticRateCalculator};
use serde_json::json;

use crate::commands::CommandResult;

pub fn run(input: &RateInput) -> CommandResult {
    match StaticRateCalculator.quote(input) {
        Ok(quote) => {
            let message = format!(
                "zone {} at {} lbs: gross ${}, final ${} (discount ${})",
                input.zone, input.weight_lbs, quote.gross_rate, quote.final_rate, quote.total_discount
            );
            CommandResult::success_with_data("rate", message, Some(json!(quote)))
        }
        Err(error) => CommandResult::failure("rate", "invalid_input", error.to_string(), 4),
    }
}

#[cfg(test)]
mod tests {
    use pricedesk_core::{Discount, RateInput};
    use rust_decimal::Decimal;
    use serde_json::Value;

    use super::run;

    fn input(zone: u8, discount: Discount) -> RateInput {
        RateInput {
            weight_lbs: Decimal::new(10, 0),
            zone,
            base_rate: Decimal::new(1550, 2),
            discount,
        }
    }

    #[test]
    fn quote_is_reported_with_structured_data() {
        let result = run(&input(5, Discount::Percentage(Decimal::new(15, 0))));
        assert_eq!(result.exit_code, 0);

        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["data"]["grossRate"], "34.88");
        assert_eq!(payload["data"]["finalRate"], "29.64");
        assert!(payload["message"].as_str().expect("message").contains("final $29.64"));
    }

    #[test]
    fn out_of_range_zone_is_an_input_failure() {
        let result = run(&input(0, Discount::Flat(Decimal::ONE)));
        assert_eq!(result.exit_code, 4);

        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["error_class"], "invalid_input");
    }
}
