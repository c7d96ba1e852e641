//! Monthly sales accumulation.
//!
//! The aggregator fetches completed order lines joined to their products,
//! then folds them into per-product totals here. The fold is pure so the
//! ranking semantics can be tested against fixtures.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One completed order line resolved to its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SoldLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: i64,
}

/// Per-product totals for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i64,
    pub total_revenue: i64,
    pub month: u32,
    pub year: i32,
}

/// Folds sold lines into per-product quantity and revenue totals.
///
/// Revenue uses the line's stored unit price, not the live product price.
/// Sorted by quantity descending; ties break on product id ascending.
pub fn accumulate(lines: Vec<SoldLine>, year: i32, month: u32) -> Vec<ProductSales> {
    let mut stats: HashMap<Uuid, ProductSales> = HashMap::new();
    for line in lines {
        let entry = stats.entry(line.product_id).or_insert_with(|| ProductSales {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_image: line.product_image.clone(),
            quantity: 0,
            total_revenue: 0,
            month,
            year,
        });
        entry.quantity += i64::from(line.quantity);
        entry.total_revenue += i64::from(line.quantity) * line.price;
    }
    let mut ranked: Vec<ProductSales> = stats.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked
}

/// Half-open UTC window covering one calendar month.
pub fn month_window(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, name: &str, quantity: i32, price: i64) -> SoldLine {
        SoldLine {
            product_id,
            product_name: name.into(),
            product_image: None,
            quantity,
            price,
        }
    }

    #[test]
    fn sums_quantity_and_revenue_per_product() {
        let shirt = Uuid::new_v4();
        let coat = Uuid::new_v4();
        let lines = vec![
            line(shirt, "Shirt", 2, 1_500_000),
            line(coat, "Coat", 1, 4_000_000),
            line(shirt, "Shirt", 3, 1_200_000),
        ];
        let ranked = accumulate(lines, 2024, 11);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].product_id, shirt);
        assert_eq!(ranked[0].quantity, 5);
        assert_eq!(ranked[0].total_revenue, 2 * 1_500_000 + 3 * 1_200_000);
        assert_eq!(ranked[1].quantity, 1);
        assert_eq!(ranked[1].total_revenue, 4_000_000);
        assert!(ranked.iter().all(|r| r.month == 11 && r.year == 2024));
    }

    #[test]
    fn ties_break_on_product_id_ascending() {
        let mut a = Uuid::new_v4();
        let mut b = Uuid::new_v4();
        if b < a {
            std::mem::swap(&mut a, &mut b);
        }
        let ranked = accumulate(vec![line(b, "B", 2, 10), line(a, "A", 2, 10)], 2024, 5);
        assert_eq!(ranked[0].product_id, a);
        assert_eq!(ranked[1].product_id, b);
    }

    #[test]
    fn empty_input_ranks_nothing() {
        assert!(accumulate(vec![], 2024, 1).is_empty());
    }

    #[test]
    fn november_window_excludes_october_and_december() {
        let (start, end) = month_window(2024, 11).unwrap();
        let october = Utc.with_ymd_and_hms(2024, 10, 31, 23, 59, 59).unwrap();
        let mid_november = Utc.with_ymd_and_hms(2024, 11, 15, 12, 0, 0).unwrap();
        let december = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        assert!(october < start);
        assert!(start <= mid_november && mid_november < end);
        assert!(december >= end);
    }

    #[test]
    fn december_window_rolls_into_next_year() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(month_window(2024, 0).is_none());
        assert!(month_window(2024, 13).is_none());
    }
}
