mod assumptions;
mod expense;
mod market_rent;
mod overrides;
mod property;
mod snapshot;

pub use assumptions::{AssumptionProfile, FinancingAssumptions, RateSchedule, TermRate};
pub use expense::ExpenseLine;
pub use market_rent::{MAX_BEDROOM_KEY, MarketRentRow, RentTable};
pub use overrides::PropertyOverride;
pub use property::{ListingId, Property, UnitMixEntry, class_rent_override, unit_mix_total};
pub use snapshot::AnalysisSnapshot;
