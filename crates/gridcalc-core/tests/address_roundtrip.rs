//! Property tests for textual cell addresses

use gridcalc_core::{expand_range, format_address, parse_address, CellAddress, CellRange};
use proptest::prelude::*;

proptest! {
    #[test]
    fn format_then_parse_round_trips(row in any::<u32>(), col in any::<u32>()) {
        let text = format_address(row, col);
        prop_assert_eq!(parse_address(&text), Some(CellAddress::new(row, col)));
    }

    #[test]
    fn lowercase_references_parse_like_uppercase(row in 0u32..100_000, col in 0u32..20_000) {
        let text = format_address(row, col);
        prop_assert_eq!(parse_address(&text.to_lowercase()), parse_address(&text));
    }

    #[test]
    fn expansion_is_row_major_and_complete(
        r1 in 0u32..20, c1 in 0u32..20, r2 in 0u32..20, c2 in 0u32..20,
    ) {
        let cells = expand_range(&format_address(r1, c1), &format_address(r2, c2));
        let range = CellRange::new(CellAddress::new(r1, c1), CellAddress::new(r2, c2));

        prop_assert_eq!(cells.len() as u64, range.cell_count());
        prop_assert!(cells.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(cells.iter().all(|addr| range.contains(addr)));
    }
}
