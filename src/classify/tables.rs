//! Built-in classification tables for CIS account numbers and postcodes.

use super::range::RangeTable;
use crate::error::Result;

/// Deposit application code by 11-digit account number
pub fn account_type_ranges() -> Result<RangeTable> {
    RangeTable::new(
        "ACCOUNT_TYPE",
        &[
            (3_000_000_000, 3_999_999_999, "CA"),
            (6_200_000_000, 6_299_999_999, "CA"),
            (6_710_000_000, 6_719_999_999, "CA"),
            (1_000_000_000, 1_999_999_999, "FD"),
            (7_000_000_000, 7_999_999_999, "FD"),
            (4_000_000_000, 4_999_999_999, "SA"),
            (5_000_000_000, 5_999_999_999, "SA"),
            (6_000_000_000, 6_199_999_999, "SA"),
            (6_300_000_000, 6_709_999_999, "SA"),
            (6_720_000_000, 6_999_999_999, "SA"),
        ],
    )
}

/// Loan application code by 11-digit account number
pub fn loan_type_ranges() -> Result<RangeTable> {
    RangeTable::new(
        "LOAN_TYPE",
        &[
            (2_000_000_000, 2_999_999_999, "LN"),
            (8_000_000_000, 8_999_999_999, "HP"),
        ],
    )
}

/// Malaysian state code by postcode
pub fn zip_state_ranges() -> Result<RangeTable> {
    RangeTable::new(
        "ZIP_STATE",
        &[
            (79_000, 86_999, "JOH"),
            (5_000, 9_999, "KED"),
            (15_000, 18_999, "KEL"),
            (75_000, 78_999, "MEL"),
            (70_000, 73_999, "NEG"),
            (25_000, 28_999, "PAH"),
            (69_000, 69_000, "PAH"),
            (10_000, 14_999, "PEN"),
            (30_000, 36_999, "PRK"),
            (39_000, 39_999, "PRK"),
            (1_000, 2_999, "PER"),
            (88_000, 91_999, "SAB"),
            (93_000, 98_999, "SAR"),
            (40_000, 49_999, "SEL"),
            (63_000, 64_999, "SEL"),
            (68_000, 68_199, "SEL"),
            (20_000, 24_999, "TER"),
            (50_000, 60_999, "W P"),
            (87_000, 87_999, "LAB"),
            (62_000, 62_999, "PUT"),
        ],
    )
}

/// Foreign-currency fixed deposit product types
pub const FCY_FD_PRODUCTS: &[&str] = &[
    "371", "350", "351", "352", "353", "354", "355", "356", "357", "358", "359", "360", "361", "362",
];

/// Foreign-currency current account product types
pub const FCY_CA_PRODUCTS: &[&str] = &[
    "400", "401", "402", "403", "404", "405", "406", "407", "408", "409", "410", "411", "413", "414",
    "420", "421", "422", "423", "424", "425", "426", "427", "428", "429", "430", "431", "432", "433",
    "434", "440", "441", "442", "443", "444", "450", "451", "452", "453", "454", "460", "461", "473",
    "474", "475", "476",
];
