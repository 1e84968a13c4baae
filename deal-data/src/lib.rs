//! CSV ingestion for market rents and listings.

mod fields;
pub mod listings;
pub mod rent_table;

pub use fields::normalize_zip;
pub use listings::{PropertyLoader, PropertyLoaderError, PropertyRecord, parse_unit_mix};
pub use rent_table::{RentTableLoader, RentTableLoaderError, RentTableRecord};
