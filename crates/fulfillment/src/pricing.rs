//! Tax and shipping policy applied at checkout.

use domain::{Money, OrderTotals};

/// Pricing rules injected into the checkout coordinator.
///
/// The actual rates are business configuration, not domain logic; the
/// coordinator only cares that totals are computed once, at placement, and
/// frozen on the order.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,

    /// Flat shipping fee.
    pub shipping_flat: Money,

    /// Orders at or above this subtotal ship free.
    pub free_shipping_over: Option<Money>,
}

impl PricingPolicy {
    /// Computes the frozen totals for a subtotal.
    pub fn totals(&self, subtotal: Money) -> OrderTotals {
        let tax = subtotal.apply_rate_bps(self.tax_rate_bps);
        let shipping_fee = match self.free_shipping_over {
            Some(threshold) if subtotal >= threshold => Money::zero(),
            _ => self.shipping_flat,
        };

        OrderTotals {
            subtotal,
            tax,
            shipping_fee,
            total: subtotal + tax + shipping_fee,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: 800,
            shipping_flat: Money::from_cents(499),
            free_shipping_over: Some(Money::from_cents(5000)),
        }
    }
}
