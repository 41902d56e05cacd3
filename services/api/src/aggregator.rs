//! Derived figures over ride records: totals, month buckets and the
//! yearly earnings view.
//!
//! Everything here is a pure function of the records passed in and is
//! recomputed per request.

use chrono::Datelike;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Add;

use crate::models::Ride;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Hundredths of a currency unit per unit
const MINOR_UNITS: f64 = 100.0;

/// Whole minor units of a stored amount. Non-finite and negative values
/// count as zero.
fn to_minor(v: f64) -> i64 {
    if v.is_finite() && v > 0.0 {
        (v * MINOR_UNITS).round() as i64
    } else {
        0
    }
}

fn from_minor(v: i64) -> f64 {
    v as f64 / MINOR_UNITS
}

/// Sums over a set of records.
///
/// Money is accumulated in integer minor units so that sums do not depend
/// on how the records were partitioned or ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub count: u64,
    income: i64,
    cost: i64,
    save: i64,
}

impl Totals {
    pub fn income(&self) -> f64 {
        from_minor(self.income)
    }

    pub fn cost(&self) -> f64 {
        from_minor(self.cost)
    }

    pub fn save(&self) -> f64 {
        from_minor(self.save)
    }

    pub fn net_profit(&self) -> f64 {
        from_minor(self.income.saturating_sub(self.cost))
    }

    /// Mean income per record, 0 for an empty set
    pub fn average_per_record(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.income() / self.count as f64
        }
    }

    fn record(&mut self, ride: &Ride) {
        self.count += 1;
        self.income = self.income.saturating_add(to_minor(ride.amount));
        self.cost = self.cost.saturating_add(to_minor(ride.cost));
        self.save = self.save.saturating_add(to_minor(ride.save));
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Totals) -> Totals {
        Totals {
            count: self.count + rhs.count,
            income: self.income.saturating_add(rhs.income),
            cost: self.cost.saturating_add(rhs.cost),
            save: self.save.saturating_add(rhs.save),
        }
    }
}

impl Serialize for Totals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Totals", 4)?;
        state.serialize_field("totalCustomers", &self.count)?;
        state.serialize_field("totalIncome", &self.income())?;
        state.serialize_field("totalCost", &self.cost())?;
        state.serialize_field("totalSave", &self.save())?;
        state.end()
    }
}

/// Net profit is never stored; negative values are allowed
pub fn derive_net_profit(amount: f64, cost: f64) -> f64 {
    amount - cost
}

/// Single pass over the records
pub fn compute_totals<'a, I>(rides: I) -> Totals
where
    I: IntoIterator<Item = &'a Ride>,
{
    let mut totals = Totals::default();
    for ride in rides {
        totals.record(ride);
    }
    totals
}

/// Earnings for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    pub year: i32,
    /// 1 = January
    pub month: u32,
    pub month_name: &'static str,
    pub earnings: f64,
    pub cost: f64,
    pub save: f64,
    pub count: u64,
    pub net_profit: f64,
}

impl MonthlyBucket {
    fn from_totals(year: i32, month: u32, totals: Totals) -> Self {
        Self {
            year,
            month,
            month_name: MONTH_NAMES[(month - 1) as usize],
            earnings: totals.income(),
            cost: totals.cost(),
            save: totals.save(),
            count: totals.count,
            net_profit: totals.net_profit(),
        }
    }
}

fn month_totals<'a, I>(rides: I, year: i32) -> BTreeMap<u32, Totals>
where
    I: IntoIterator<Item = &'a Ride>,
{
    let mut months: BTreeMap<u32, Totals> = BTreeMap::new();

    for ride in rides {
        let at = ride.occurred_at();
        if at.year() == year {
            months.entry(at.month()).or_default().record(ride);
        }
    }

    months
}

/// Buckets for `year`, latest month first. Months without records are
/// not emitted.
pub fn group_by_month<'a, I>(rides: I, year: i32) -> Vec<MonthlyBucket>
where
    I: IntoIterator<Item = &'a Ride>,
{
    month_totals(rides, year)
        .into_iter()
        .rev()
        .map(|(month, totals)| MonthlyBucket::from_totals(year, month, totals))
        .collect()
}

/// Distinct years with at least one record, latest first
pub fn available_years<'a, I>(rides: I) -> Vec<i32>
where
    I: IntoIterator<Item = &'a Ride>,
{
    let years: BTreeSet<i32> = rides.into_iter().map(|r| r.occurred_at().year()).collect();
    years.into_iter().rev().collect()
}

/// Yearly sums over the month buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearTotals {
    pub earnings: f64,
    pub cost: f64,
    pub save: f64,
    pub count: u64,
    pub net_profit: f64,
}

/// The monthly earnings view for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: i32,
    pub available_years: Vec<i32>,
    pub months: Vec<MonthlyBucket>,
    pub totals: YearTotals,
}

impl From<Totals> for YearTotals {
    fn from(totals: Totals) -> Self {
        Self {
            earnings: totals.income(),
            cost: totals.cost(),
            save: totals.save(),
            count: totals.count,
            net_profit: totals.net_profit(),
        }
    }
}

pub fn year_summary(rides: &[Ride], year: i32) -> YearSummary {
    let by_month = month_totals(rides, year);
    let totals = by_month.values().fold(Totals::default(), |acc, m| acc + *m);

    YearSummary {
        year,
        available_years: available_years(rides),
        months: by_month
            .into_iter()
            .rev()
            .map(|(month, totals)| MonthlyBucket::from_totals(year, month, totals))
            .collect(),
        totals: totals.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn ride(amount: f64, cost: f64, save: f64, date: Option<DateTime<Utc>>) -> Ride {
        let created = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        Ride {
            id: Uuid::new_v4(),
            customer_name: "Rahim".into(),
            contact_number: String::new(),
            location: "Dhaka → Sylhet".into(),
            amount,
            cost,
            save,
            date,
            created_at: created,
            updated_at: created,
        }
    }

    fn on(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn empty_set_has_zero_totals() {
        let totals = compute_totals(&[]);
        assert_eq!(totals, Totals::default());
        assert_eq!(totals.average_per_record(), 0.0);
    }

    #[test]
    fn two_rides_sum_as_expected() {
        let rides = [ride(500.0, 100.0, 0.0, None), ride(300.0, 50.0, 0.0, None)];
        let totals = compute_totals(&rides);

        assert_eq!(totals.count, 2);
        assert_eq!(totals.income(), 800.0);
        assert_eq!(totals.cost(), 150.0);
        assert_eq!(totals.save(), 0.0);
        assert_eq!(totals.net_profit(), 650.0);
        assert_eq!(totals.average_per_record(), 400.0);
    }

    #[test]
    fn totals_are_additive_over_partitions() {
        let rides = [
            ride(500.0, 100.0, 5.0, None),
            ride(300.0, 50.0, 0.0, None),
            ride(120.0, 0.0, 10.0, None),
            ride(75.5, 80.0, 1.5, None),
        ];

        for split in 0..=rides.len() {
            let (a, b) = rides.split_at(split);
            assert_eq!(compute_totals(a) + compute_totals(b), compute_totals(&rides));
        }
    }

    #[test]
    fn decimal_amounts_add_up_across_partitions() {
        let rides = [
            ride(0.1, 0.3, 0.2, None),
            ride(0.2, 0.1, 0.1, None),
            ride(0.3, 0.2, 0.7, None),
            ride(19.99, 4.01, 0.33, None),
        ];

        for split in 0..=rides.len() {
            let (a, b) = rides.split_at(split);
            assert_eq!(compute_totals(a) + compute_totals(b), compute_totals(&rides));
        }

        let first_three = compute_totals(&rides[..3]);
        assert_eq!(first_three.income(), 0.6);
        assert_eq!(first_three.cost(), 0.6);
        assert_eq!(first_three.save(), 1.0);
        assert_eq!(first_three.net_profit(), 0.0);
    }

    #[test]
    fn totals_ignore_order() {
        let mut rides = vec![
            ride(10.0, 1.0, 0.0, None),
            ride(20.0, 2.0, 0.0, None),
            ride(40.0, 4.0, 0.0, None),
        ];
        let forward = compute_totals(&rides);
        rides.reverse();
        assert_eq!(compute_totals(&rides), forward);
    }

    #[test]
    fn non_finite_and_negative_values_count_as_zero() {
        let rides = [
            ride(f64::NAN, -5.0, f64::INFINITY, None),
            ride(100.0, 10.0, 1.0, None),
        ];
        let totals = compute_totals(&rides);

        assert_eq!(totals.count, 2);
        assert_eq!(totals.income(), 100.0);
        assert_eq!(totals.cost(), 10.0);
        assert_eq!(totals.save(), 1.0);
    }

    #[test]
    fn net_profit_may_be_negative() {
        assert_eq!(derive_net_profit(500.0, 100.0), 400.0);
        assert_eq!(derive_net_profit(100.0, 250.0), -150.0);
    }

    #[test]
    fn totals_serialize_with_api_names() {
        let json = serde_json::to_value(compute_totals(&[ride(5.0, 1.0, 2.0, None)])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalCustomers": 1,
                "totalIncome": 5.0,
                "totalCost": 1.0,
                "totalSave": 2.0,
            })
        );
    }

    #[test]
    fn group_by_month_filters_year_and_sorts_descending() {
        let rides = [
            ride(100.0, 10.0, 0.0, on(2023, 12, 31)),
            ride(200.0, 20.0, 0.0, on(2024, 1, 5)),
            ride(300.0, 30.0, 5.0, on(2024, 3, 9)),
            ride(50.0, 0.0, 0.0, on(2024, 3, 20)),
            ride(400.0, 40.0, 0.0, on(2025, 3, 1)),
        ];

        let buckets = group_by_month(&rides, 2024);
        let months: Vec<_> = buckets.iter().map(|b| b.month).collect();
        assert_eq!(months, [3, 1]);
        assert!(buckets.iter().all(|b| b.year == 2024 && b.count > 0));

        let march = &buckets[0];
        assert_eq!(march.month_name, "March");
        assert_eq!(march.earnings, 350.0);
        assert_eq!(march.cost, 30.0);
        assert_eq!(march.save, 5.0);
        assert_eq!(march.count, 2);
        assert_eq!(march.net_profit, 320.0);
    }

    #[test]
    fn group_by_month_falls_back_to_creation_time() {
        let rides = [ride(100.0, 0.0, 0.0, None)];
        let buckets = group_by_month(&rides, 2024);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].month_name, "January");
        assert!(group_by_month(&rides, 2023).is_empty());
    }

    #[test]
    fn year_summary_totals_match_buckets() {
        let rides = [
            ride(100.0, 10.0, 1.0, on(2023, 6, 1)),
            ride(200.0, 20.0, 2.0, on(2024, 2, 1)),
            ride(300.0, 30.0, 3.0, on(2024, 8, 1)),
        ];

        let summary = year_summary(&rides, 2024);
        assert_eq!(summary.available_years, [2024, 2023]);
        assert_eq!(summary.months.len(), 2);
        assert_eq!(summary.totals.earnings, 500.0);
        assert_eq!(summary.totals.cost, 50.0);
        assert_eq!(summary.totals.save, 5.0);
        assert_eq!(summary.totals.count, 2);
        assert_eq!(summary.totals.net_profit, 450.0);

        let decimals = [
            ride(0.1, 0.0, 0.0, on(2024, 2, 1)),
            ride(0.2, 0.0, 0.0, on(2024, 3, 1)),
        ];
        assert_eq!(year_summary(&decimals, 2024).totals.earnings, 0.3);

        let empty = year_summary(&rides, 2019);
        assert!(empty.months.is_empty());
        assert_eq!(empty.totals, YearTotals::default());
    }
}
