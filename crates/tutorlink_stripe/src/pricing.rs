//! Tiered per-session pricing.

use tutorlink_config::StripeConfig;

/// Per-session price for a cart holding `sessions` slots. The first tier
/// whose size matches wins; larger carts fall back to `default_unit_amount`.
pub fn unit_amount(config: &StripeConfig, sessions: usize) -> i64 {
    config
        .price_tiers
        .iter()
        .find(|tier| tier.sessions == sessions)
        .map(|tier| tier.unit_amount)
        .unwrap_or(config.default_unit_amount)
}

/// Total due for a cart of `sessions` slots, in the smallest currency unit.
pub fn amount_due(config: &StripeConfig, sessions: usize) -> i64 {
    if sessions == 0 {
        return 0;
    }
    unit_amount(config, sessions) * sessions as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorlink_config::{default_price_tiers, default_unit_amount, PriceTier};

    fn config(price_tiers: Vec<PriceTier>, default_unit_amount: i64) -> StripeConfig {
        StripeConfig {
            secret_key: "sk_test".to_string(),
            publishable_key: "pk_test".to_string(),
            currency: "usd".to_string(),
            api_base: None,
            webhook_secret: None,
            price_tiers,
            default_unit_amount,
        }
    }

    #[test]
    fn default_tiers_discount_larger_carts() {
        let config = config(default_price_tiers(), default_unit_amount());
        assert_eq!(amount_due(&config, 0), 0);
        assert_eq!(amount_due(&config, 1), 2500);
        assert_eq!(amount_due(&config, 2), 4600);
        assert_eq!(amount_due(&config, 3), 6300);
        assert_eq!(amount_due(&config, 10), 21000);
    }

    #[test]
    fn configured_tiers_replace_defaults() {
        let config = config(
            vec![PriceTier {
                sessions: 3,
                unit_amount: 1000,
            }],
            1500,
        );
        assert_eq!(unit_amount(&config, 1), 1500);
        assert_eq!(amount_due(&config, 3), 3000);
    }
}
