use crate::record::InventoryRecord;

/// Names of records at or below their minimum quantity, in input order.
pub fn restock_needed<'a>(records: impl IntoIterator<Item = &'a InventoryRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter(|r| r.needs_restock())
        .map(|r| r.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(name: &str, quantity: u32, min_quantity: u32) -> InventoryRecord {
        InventoryRecord::new(name)
            .unwrap()
            .with_quantity(quantity)
            .with_min_quantity(min_quantity)
    }

    #[test]
    fn flags_equal_and_below_in_order() {
        let records = vec![
            record("Saw", 1, 2),
            record("Tape", 9, 2),
            record("Gloves", 3, 3),
        ];
        assert_eq!(restock_needed(&records), vec!["Saw".to_string(), "Gloves".to_string()]);
    }

    #[test]
    fn nothing_to_evaluate_means_nothing_flagged() {
        assert!(restock_needed(&Vec::new()).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a record is flagged iff quantity <= min_quantity.
        #[test]
        fn flag_iff_quantity_at_or_below_minimum(
            pairs in prop::collection::vec((0u32..20u32, 0u32..20u32), 0..30)
        ) {
            let records: Vec<InventoryRecord> = pairs
                .iter()
                .enumerate()
                .map(|(i, (q, m))| record(&format!("item-{i}"), *q, *m))
                .collect();

            let flagged = restock_needed(&records);

            for (i, (q, m)) in pairs.iter().enumerate() {
                let name = format!("item-{i}");
                prop_assert_eq!(flagged.contains(&name), q <= m);
            }
        }
    }
}
