//! Effective monthly rent for a single unit.

use rust_decimal::Decimal;

use crate::models::RentTable;

/// Resolves the monthly rent for a unit from an override or the market table.
///
/// Missing reference data is not an error: an unknown ZIP or bedroom count
/// resolves to zero so every downstream figure still renders.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use deal_core::calculations::RentResolver;
/// use deal_core::{MarketRentRow, RentTable};
///
/// let table = RentTable::from_rows([MarketRentRow::new("02124").with_rent(2, dec!(2827))]);
/// let resolver = RentResolver::new(&table);
///
/// assert_eq!(resolver.resolve(2, "02124", None), dec!(2827));
/// assert_eq!(resolver.resolve(2, "02124", Some(dec!(2500))), dec!(2500));
/// assert_eq!(resolver.resolve(2, "99999", None), dec!(0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RentResolver<'a> {
    table: &'a RentTable,
}

impl<'a> RentResolver<'a> {
    pub fn new(table: &'a RentTable) -> Self {
        Self { table }
    }

    /// Effective monthly rent for a unit with `bedrooms` bedrooms in `zip`.
    ///
    /// An override is returned verbatim, without sign or magnitude checks.
    pub fn resolve(
        &self,
        bedrooms: u8,
        zip: &str,
        rent_override: Option<Decimal>,
    ) -> Decimal {
        rent_override
            .or_else(|| self.table.lookup(zip, bedrooms))
            .unwrap_or(Decimal::ZERO)
    }
}
