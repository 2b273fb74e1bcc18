//! # Tariff Engine
//!
//! Progressive (block) electricity tariff calculation.
//!
//! ## How Block Pricing Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Consumption: 150 kWh against the residential schedule              │
//! │                                                                     │
//! │  Band 1:   0- 50 kWh @ 1985 ₫ ──► 50 kWh × 1985 =  99 250 ₫        │
//! │  Band 2:  51-100 kWh @ 2051 ₫ ──► 50 kWh × 2051 = 102 550 ₫        │
//! │  Band 3: 101-200 kWh @ 2381 ₫ ──► 50 kWh × 2381 = 119 050 ₫        │
//! │  Band 4+ ─ not reached                                              │
//! │                                                                     │
//! │  Subtotal 320 850 ₫ + 10% VAT ──► 352 935 ₫                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each slice of consumption is charged at its own band's rate; anything
//! above the last finite ceiling is charged at the top band's rate. The top
//! band has an explicit [`Ceiling::Unbounded`] marker - no sentinel values,
//! no IEEE infinity.
//!
//! ## Usage
//! ```rust
//! use voltbill_core::money::Money;
//! use voltbill_core::tariff::{PriceBand, TariffSchedule};
//! use voltbill_core::types::VatRate;
//!
//! let schedule = TariffSchedule::new(
//!     vec![
//!         PriceBand::bounded(50, Money::from_dong(1985)),
//!         PriceBand::bounded(100, Money::from_dong(2051)),
//!         PriceBand::unbounded(Money::from_dong(2381)),
//!     ],
//!     VatRate::from_bps(1000),
//! )?;
//!
//! assert_eq!(schedule.compute(30)?.dong(), 65_505);
//! # Ok::<(), voltbill_core::error::CoreError>(())
//! ```
//!
//! A schedule is validated once at construction and immutable afterwards, so
//! it can be shared freely across threads and reused for every invoice until
//! pricing changes.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::VatRate;

// =============================================================================
// Ceiling
// =============================================================================

/// The cumulative consumption ceiling of a price band, in kWh.
///
/// The top band of every schedule is `Unbounded`; all others are `Bounded`.
/// Serializes as a plain optional number (`null` = unbounded), the shape the
/// stored pricing data uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Ceiling {
    /// Finite cumulative ceiling in kWh.
    Bounded(i64),
    /// No ceiling: the band absorbs all remaining consumption.
    Unbounded,
}

impl From<Option<i64>> for Ceiling {
    fn from(value: Option<i64>) -> Self {
        match value {
            Some(kwh) => Ceiling::Bounded(kwh),
            None => Ceiling::Unbounded,
        }
    }
}

impl From<Ceiling> for Option<i64> {
    fn from(ceiling: Ceiling) -> Self {
        match ceiling {
            Ceiling::Bounded(kwh) => Some(kwh),
            Ceiling::Unbounded => None,
        }
    }
}

// =============================================================================
// Price Band
// =============================================================================

/// One band of a tariff schedule: a cumulative kWh ceiling and the price per
/// kWh charged inside the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    /// Cumulative consumption ceiling for this band.
    pub ceiling: Ceiling,

    /// Price per kWh within this band, in đồng.
    pub unit_price: Money,
}

impl PriceBand {
    /// A band with a finite cumulative ceiling.
    pub const fn bounded(ceiling_kwh: i64, unit_price: Money) -> Self {
        PriceBand {
            ceiling: Ceiling::Bounded(ceiling_kwh),
            unit_price,
        }
    }

    /// The open-ended top band.
    pub const fn unbounded(unit_price: Money) -> Self {
        PriceBand {
            ceiling: Ceiling::Unbounded,
            unit_price,
        }
    }
}

// =============================================================================
// Tariff Schedule
// =============================================================================

/// An ordered set of price bands plus a VAT rate.
///
/// Structural invariants are checked once in [`TariffSchedule::new`]:
/// - at least one band;
/// - exactly one unbounded band, in last position;
/// - finite ceilings strictly increasing (the first band starts at 0 kWh);
/// - no negative unit price;
/// - VAT in `[0, 10000)` bps.
///
/// The fields are private and there are no mutating methods, so a validated
/// schedule stays valid for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffSchedule {
    bands: Vec<PriceBand>,
    vat: VatRate,
}

impl TariffSchedule {
    /// Builds a schedule, validating all structural invariants.
    ///
    /// Fails fast at construction so a malformed pricing table is reported
    /// once where it was loaded, not on every invoice.
    pub fn new(bands: Vec<PriceBand>, vat: VatRate) -> CoreResult<Self> {
        if bands.is_empty() {
            return Err(CoreError::EmptySchedule);
        }
        if vat.bps() >= 10_000 {
            return Err(CoreError::InvalidVatRate { bps: vat.bps() });
        }

        let last = bands.len() - 1;
        let mut previous = 0i64;
        for (idx, band) in bands.iter().enumerate() {
            if band.unit_price.is_negative() {
                return Err(CoreError::NegativeUnitPrice {
                    band: idx,
                    price: band.unit_price.dong(),
                });
            }
            match band.ceiling {
                Ceiling::Bounded(ceiling) => {
                    if idx == last {
                        return Err(CoreError::MissingUnboundedBand);
                    }
                    if ceiling <= previous {
                        return Err(CoreError::CeilingNotIncreasing {
                            band: idx,
                            ceiling,
                            previous,
                        });
                    }
                    previous = ceiling;
                }
                Ceiling::Unbounded => {
                    if idx != last {
                        return Err(CoreError::UnboundedBandNotLast { band: idx });
                    }
                }
            }
        }

        Ok(TariffSchedule { bands, vat })
    }

    /// The ordered price bands.
    #[inline]
    pub fn bands(&self) -> &[PriceBand] {
        &self.bands
    }

    /// The VAT rate applied on top of the pre-tax subtotal.
    #[inline]
    pub fn vat(&self) -> VatRate {
        self.vat
    }

    /// Computes the payable amount (VAT included) for a consumption.
    ///
    /// Defined as the total of [`compute_breakdown`](Self::compute_breakdown),
    /// so there is exactly one pricing loop in the system.
    ///
    /// ## Errors
    /// [`CoreError::NegativeConsumption`] if `consumption_kwh < 0`. Callers
    /// derive consumption as `max(0, end_reading - start_reading)`.
    pub fn compute(&self, consumption_kwh: i64) -> CoreResult<Money> {
        Ok(self.compute_breakdown(consumption_kwh)?.total)
    }

    /// Computes the payable amount with the per-band itemization that
    /// invoices and reports print.
    ///
    /// ## Example
    /// ```rust
    /// use voltbill_core::money::Money;
    /// use voltbill_core::tariff::{PriceBand, TariffSchedule};
    /// use voltbill_core::types::VatRate;
    ///
    /// let schedule = TariffSchedule::new(
    ///     vec![
    ///         PriceBand::bounded(50, Money::from_dong(1985)),
    ///         PriceBand::unbounded(Money::from_dong(2051)),
    ///     ],
    ///     VatRate::from_bps(1000),
    /// )?;
    ///
    /// let bill = schedule.compute_breakdown(80)?;
    /// assert_eq!(bill.lines.len(), 2);
    /// assert_eq!(bill.lines[1].quantity_kwh, 30);
    /// assert_eq!(bill.subtotal.dong(), 50 * 1985 + 30 * 2051);
    /// # Ok::<(), voltbill_core::error::CoreError>(())
    /// ```
    pub fn compute_breakdown(&self, consumption_kwh: i64) -> CoreResult<BillBreakdown> {
        if consumption_kwh < 0 {
            return Err(CoreError::NegativeConsumption {
                kwh: consumption_kwh,
            });
        }

        let mut remaining = consumption_kwh;
        let mut band_floor = 0i64;
        let mut subtotal = Money::zero();
        let mut lines = Vec::new();

        for (idx, band) in self.bands.iter().enumerate() {
            if remaining <= 0 {
                break;
            }

            // Width of this band above the previous ceiling. The unbounded
            // top band absorbs whatever is left.
            let band_width = match band.ceiling {
                Ceiling::Bounded(ceiling) => ceiling - band_floor,
                Ceiling::Unbounded => remaining,
            };

            let quantity = band_width.min(remaining);
            if quantity <= 0 {
                // Zero-width band: nothing to allocate here.
                break;
            }

            let line_total = band.unit_price.multiply_quantity(quantity);
            subtotal += line_total;
            lines.push(BandUsage {
                band: idx,
                quantity_kwh: quantity,
                unit_price: band.unit_price,
                subtotal: line_total,
            });

            remaining -= quantity;
            if let Ceiling::Bounded(ceiling) = band.ceiling {
                band_floor = ceiling;
            }
        }

        let vat_amount = subtotal.vat_amount(self.vat);
        Ok(BillBreakdown {
            lines,
            subtotal,
            vat_amount,
            total: subtotal + vat_amount,
        })
    }
}

// =============================================================================
// Breakdown Types
// =============================================================================

/// Consumption and cost allocated to a single band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandUsage {
    /// Zero-based index of the band in the schedule.
    pub band: usize,

    /// kWh billed in this band.
    pub quantity_kwh: i64,

    /// Price per kWh in this band.
    pub unit_price: Money,

    /// `quantity_kwh × unit_price`.
    pub subtotal: Money,
}

/// The itemized result of a tariff calculation.
///
/// Bands the consumption never reached do not appear in `lines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillBreakdown {
    /// Per-band allocation, in band order.
    pub lines: Vec<BandUsage>,

    /// Pre-tax total.
    pub subtotal: Money,

    /// VAT on the subtotal, rounded half up to the whole đồng.
    pub vat_amount: Money,

    /// `subtotal + vat_amount` - the payable amount.
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// The 2023 residential schedule used across the original data set.
    fn residential() -> TariffSchedule {
        TariffSchedule::new(
            vec![
                PriceBand::bounded(50, Money::from_dong(1985)),
                PriceBand::bounded(100, Money::from_dong(2051)),
                PriceBand::bounded(200, Money::from_dong(2381)),
                PriceBand::bounded(300, Money::from_dong(2999)),
                PriceBand::bounded(400, Money::from_dong(3351)),
                PriceBand::unbounded(Money::from_dong(3461)),
            ],
            VatRate::from_bps(1000),
        )
        .unwrap()
    }

    #[test]
    fn test_consumption_within_first_band() {
        // 30 × 1985 = 59 550, + 10% VAT = 65 505
        assert_eq!(residential().compute(30).unwrap().dong(), 65_505);
    }

    #[test]
    fn test_consumption_exactly_at_band_boundary() {
        // 50 × 1985 = 99 250, + 10% VAT = 109 175
        assert_eq!(residential().compute(50).unwrap().dong(), 109_175);
    }

    #[test]
    fn test_consumption_spanning_three_bands() {
        // 50×1985 + 50×2051 + 50×2381 = 320 850, + 10% VAT = 352 935
        assert_eq!(residential().compute(150).unwrap().dong(), 352_935);
    }

    #[test]
    fn test_overflow_billed_at_top_band() {
        // 50×1985 + 50×2051 + 100×2381 + 100×2999 + 100×3351 + 100×3461
        //   = 1 421 000, + 10% VAT = 1 563 100
        assert_eq!(residential().compute(500).unwrap().dong(), 1_563_100);
    }

    #[test]
    fn test_zero_consumption_is_free() {
        let bill = residential().compute_breakdown(0).unwrap();
        assert!(bill.lines.is_empty());
        assert_eq!(bill.total, Money::zero());
    }

    #[test]
    fn test_negative_consumption_is_rejected() {
        let err = residential().compute(-1).unwrap_err();
        assert!(matches!(err, CoreError::NegativeConsumption { kwh: -1 }));
    }

    #[test]
    fn test_monotonic_in_consumption() {
        let schedule = residential();
        let mut previous = Money::zero();
        for kwh in (0..=600).step_by(37) {
            let amount = schedule.compute(kwh).unwrap();
            assert!(amount >= previous, "not monotonic at {} kWh", kwh);
            previous = amount;
        }
    }

    #[test]
    fn test_additivity_at_band_boundary() {
        // At 200 kWh exactly: bands 1-3 filled, nothing beyond
        // (99 250 + 102 550 + 238 100) × 1.10 = 483 890
        let bill = residential().compute_breakdown(200).unwrap();
        assert_eq!(bill.lines.len(), 3);
        assert_eq!(bill.subtotal.dong(), 99_250 + 102_550 + 238_100);
        assert_eq!(bill.total.dong(), 483_890);
    }

    #[test]
    fn test_single_unbounded_band_is_flat_rate() {
        let flat = TariffSchedule::new(
            vec![PriceBand::unbounded(Money::from_dong(2000))],
            VatRate::zero(),
        )
        .unwrap();

        for kwh in [0, 1, 17, 400, 12_345] {
            assert_eq!(flat.compute(kwh).unwrap().dong(), kwh * 2000);
        }
    }

    #[test]
    fn test_breakdown_itemization() {
        let bill = residential().compute_breakdown(150).unwrap();

        assert_eq!(bill.lines.len(), 3);
        assert_eq!(
            bill.lines[0],
            BandUsage {
                band: 0,
                quantity_kwh: 50,
                unit_price: Money::from_dong(1985),
                subtotal: Money::from_dong(99_250),
            }
        );
        assert_eq!(bill.lines[2].quantity_kwh, 50);
        assert_eq!(bill.subtotal.dong(), 320_850);
        assert_eq!(bill.vat_amount.dong(), 32_085);
        assert_eq!(bill.total.dong(), 352_935);
    }

    #[test]
    fn test_breakdown_just_past_a_ceiling() {
        let bill = residential().compute_breakdown(401).unwrap();
        assert_eq!(bill.lines.len(), 6);
        assert_eq!(bill.lines[5].band, 5);
        assert_eq!(bill.lines[5].quantity_kwh, 1);
        assert_eq!(bill.lines[5].unit_price, Money::from_dong(3461));
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let err = TariffSchedule::new(vec![], VatRate::zero()).unwrap_err();
        assert!(matches!(err, CoreError::EmptySchedule));
    }

    #[test]
    fn test_bounded_last_band_rejected() {
        let err = TariffSchedule::new(
            vec![PriceBand::bounded(50, Money::from_dong(1985))],
            VatRate::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingUnboundedBand));
    }

    #[test]
    fn test_two_unbounded_bands_rejected() {
        let err = TariffSchedule::new(
            vec![
                PriceBand::unbounded(Money::from_dong(1985)),
                PriceBand::unbounded(Money::from_dong(2051)),
            ],
            VatRate::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnboundedBandNotLast { band: 0 }));
    }

    #[test]
    fn test_non_increasing_ceiling_rejected() {
        let err = TariffSchedule::new(
            vec![
                PriceBand::bounded(100, Money::from_dong(1985)),
                PriceBand::bounded(100, Money::from_dong(2051)),
                PriceBand::unbounded(Money::from_dong(2381)),
            ],
            VatRate::zero(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::CeilingNotIncreasing {
                band: 1,
                ceiling: 100,
                previous: 100,
            }
        ));
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let err = TariffSchedule::new(
            vec![PriceBand::unbounded(Money::from_dong(-1))],
            VatRate::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NegativeUnitPrice { band: 0, price: -1 }));
    }

    #[test]
    fn test_vat_rate_of_one_or_more_rejected() {
        let err = TariffSchedule::new(
            vec![PriceBand::unbounded(Money::from_dong(2000))],
            VatRate::from_bps(10_000),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidVatRate { bps: 10_000 }));
    }

    #[test]
    fn test_ceiling_serializes_as_optional_number() {
        let band = PriceBand::bounded(50, Money::from_dong(1985));
        assert_eq!(
            serde_json::to_string(&band).unwrap(),
            r#"{"ceiling":50,"unit_price":1985}"#
        );

        let top = PriceBand::unbounded(Money::from_dong(3461));
        assert_eq!(
            serde_json::to_string(&top).unwrap(),
            r#"{"ceiling":null,"unit_price":3461}"#
        );

        let parsed: PriceBand = serde_json::from_str(r#"{"ceiling":null,"unit_price":3461}"#).unwrap();
        assert_eq!(parsed, top);
    }
}
