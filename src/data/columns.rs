//! Column names of the consumer-spending dataset
//!
//! Names are kept byte-for-byte as published, double spaces and trailing
//! blanks included.

/// Observation date
pub const DATE_COLUMN: &str = "Date";

/// Region identifier
pub const REGION_COLUMN: &str = "State FIPS code";

/// Derived target, the row-wise sum of [`CATEGORY_COLUMNS`]
pub const TARGET_COLUMN: &str = "total spending";

/// Number of spending categories summed into the target
pub const N_CATEGORIES: usize = 8;

/// Spending categories, in summation order
pub const CATEGORY_COLUMNS: [&str; N_CATEGORIES] = [
    "Accommodation and food service (ACF) spending",
    "Arts, entertainment, and recreation (AER)  spending",
    "General merchandise stores (GEN) and apparel and accessories (AAP) spending",
    "Grocery and food store (GRF)  spending",
    "Health care and social assistance (HCS) spending ",
    "Transportation and warehousing (TWS)  spending",
    "Retail spending, including grocery  (AAP, CEC, GEN, GRF, HIC, ETC, SGH) ",
    "Retail spending, excluding grocery ((AAP, CEC, GEN, HIC, ETC, SGH) ",
];
