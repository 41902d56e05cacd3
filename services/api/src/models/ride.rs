//! Ride record model and request payload handling

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::aggregator::derive_net_profit;

/// A stored ride record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: Uuid,
    pub customer_name: String,
    pub contact_number: String,
    /// Conventionally `"<from> → <to>"`
    pub location: String,
    pub amount: f64,
    pub cost: f64,
    pub save: f64,
    pub date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// When the ride happened, falling back to when it was recorded
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.date.unwrap_or(self.created_at)
    }

    pub fn net_profit(&self) -> f64 {
        derive_net_profit(self.amount, self.cost)
    }
}

/// Record as returned over HTTP, with the derived net profit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideResponse {
    #[serde(flatten)]
    pub ride: Ride,
    pub net_profit: f64,
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        let net_profit = ride.net_profit();
        Self { ride, net_profit }
    }
}

/// Validated input for a new record
#[derive(Debug, Clone, PartialEq)]
pub struct NewRide {
    pub customer_name: String,
    pub contact_number: String,
    pub location: String,
    pub amount: f64,
    pub cost: f64,
    pub save: f64,
    pub date: DateTime<Utc>,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideChanges {
    pub customer_name: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
    pub amount: Option<f64>,
    pub cost: Option<f64>,
    pub save: Option<f64>,
    pub date: Option<DateTime<Utc>>,
}

impl RideChanges {
    /// Apply to a stored record in place
    pub fn apply(self, ride: &mut Ride) {
        if let Some(v) = self.customer_name {
            ride.customer_name = v;
        }
        if let Some(v) = self.contact_number {
            ride.contact_number = v;
        }
        if let Some(v) = self.location {
            ride.location = v;
        }
        if let Some(v) = self.amount {
            ride.amount = v;
        }
        if let Some(v) = self.cost {
            ride.cost = v;
        }
        if let Some(v) = self.save {
            ride.save = v;
        }
        if let Some(v) = self.date {
            ride.date = Some(v);
        }
    }
}

/// Raw create/update body.
///
/// Every field distinguishes "omitted" (`None`) from "sent as null"
/// (`Some(Value::Null)`), which matters for partial updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RidePayload {
    #[serde(default, deserialize_with = "present")]
    pub customer_name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub contact_number: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub from_location: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub to_location: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub cost: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub save: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub date: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RidePayload {
    /// Validate a create request
    pub fn into_new_ride(self, now: DateTime<Utc>) -> Result<NewRide, String> {
        let customer_name = self.customer_name.as_ref().and_then(text);
        let location = self.resolved_location();
        let amount = self.amount.as_ref().map(coerce_amount).unwrap_or(0.0);

        let (Some(customer_name), Some(location), true) = (customer_name, location, amount > 0.0)
        else {
            return Err(
                "Missing required fields: customerName, location, and amount are required"
                    .to_string(),
            );
        };

        let date = match self.date.as_ref() {
            Some(value) => parse_date(value)?.unwrap_or(now),
            None => now,
        };

        Ok(NewRide {
            customer_name,
            contact_number: self.contact_number.as_ref().and_then(text).unwrap_or_default(),
            location,
            amount,
            cost: self.cost.as_ref().map(coerce_amount).unwrap_or(0.0),
            save: self.save.as_ref().map(coerce_amount).unwrap_or(0.0),
            date,
        })
    }

    /// Validate a partial update
    pub fn into_changes(self) -> Result<RideChanges, String> {
        let mut changes = RideChanges::default();

        if let Some(value) = &self.customer_name {
            changes.customer_name =
                Some(text(value).ok_or_else(|| "customerName cannot be empty".to_string())?);
        }

        if self.location.is_some() || self.from_location.is_some() || self.to_location.is_some() {
            changes.location = Some(
                self.resolved_location()
                    .ok_or_else(|| "location cannot be empty".to_string())?,
            );
        }

        if let Some(value) = &self.amount {
            let amount = coerce_amount(value);
            if amount <= 0.0 {
                return Err("amount must be greater than 0".to_string());
            }
            changes.amount = Some(amount);
        }

        changes.contact_number = self.contact_number.as_ref().map(|v| text(v).unwrap_or_default());
        changes.cost = self.cost.as_ref().map(coerce_amount);
        changes.save = self.save.as_ref().map(coerce_amount);

        if let Some(value) = &self.date {
            changes.date = parse_date(value)?;
        }

        Ok(changes)
    }

    /// `location`, or `"<from> → <to>"` built from the split fields
    fn resolved_location(&self) -> Option<String> {
        if let Some(location) = self.location.as_ref().and_then(text) {
            return Some(location);
        }

        let from = self.from_location.as_ref().and_then(text)?;
        let to = self.to_location.as_ref().and_then(text)?;
        Some(format!("{from} → {to}"))
    }
}

/// Trimmed, non-empty text. Numbers are accepted as their decimal form.
fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Coerce a JSON number or numeric string to a non-negative finite
/// value; anything else becomes 0.
pub fn coerce_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// RFC 3339 or `YYYY-MM-DD` (midnight UTC). Null and blank mean "not
/// given".
fn parse_date(value: &Value) -> Result<Option<DateTime<Utc>>, String> {
    let raw = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim(),
        _ => return Err("date must be a string".to_string()),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| format!("Invalid date: {raw}"))
}

/// List parameters: `?sort=-createdAt&search=dhaka`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideQuery {
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Date,
    Amount,
    CustomerName,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Date => "COALESCE(date, created_at)",
            SortKey::Amount => "amount",
            SortKey::CustomerName => "LOWER(customer_name)",
        }
    }
}

/// Resolved ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            descending: true,
        }
    }
}

impl RideQuery {
    /// Parse `sort`; unknown keys fall back to newest first
    pub fn order(&self) -> SortOrder {
        let Some(raw) = self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return SortOrder::default();
        };

        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let key = match name {
            "createdAt" => SortKey::CreatedAt,
            "date" => SortKey::Date,
            "amount" => SortKey::Amount,
            "customerName" => SortKey::CustomerName,
            _ => return SortOrder::default(),
        };

        SortOrder { key, descending }
    }

    /// Trimmed search term, if any
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Case-insensitive match over name, contact number and location
pub fn matches_search(ride: &Ride, term: &str) -> bool {
    let term = term.to_lowercase();
    [&ride.customer_name, &ride.contact_number, &ride.location]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn payload(value: Value) -> RidePayload {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let ride = payload(json!({
            "customerName": "  Rahim ",
            "location": "Dhaka → Chittagong",
            "amount": 500
        }))
        .into_new_ride(now())
        .unwrap();

        assert_eq!(ride.customer_name, "Rahim");
        assert_eq!(ride.contact_number, "");
        assert_eq!(ride.amount, 500.0);
        assert_eq!(ride.cost, 0.0);
        assert_eq!(ride.save, 0.0);
        assert_eq!(ride.date, now());
    }

    #[test]
    fn create_accepts_numeric_strings_and_split_locations() {
        let ride = payload(json!({
            "customerName": "Karim",
            "fromLocation": "Dhaka",
            "toLocation": "Sylhet",
            "amount": "300.5",
            "cost": "abc",
            "save": -4,
            "date": "2024-03-02"
        }))
        .into_new_ride(now())
        .unwrap();

        assert_eq!(ride.location, "Dhaka → Sylhet");
        assert_eq!(ride.amount, 300.5);
        assert_eq!(ride.cost, 0.0);
        assert_eq!(ride.save, 0.0);
        assert_eq!(ride.date, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn create_requires_name_location_and_positive_amount() {
        for body in [
            json!({"location": "A → B", "amount": 10}),
            json!({"customerName": "  ", "location": "A → B", "amount": 10}),
            json!({"customerName": "X", "amount": 10}),
            json!({"customerName": "X", "location": "A → B"}),
            json!({"customerName": "X", "location": "A → B", "amount": 0}),
            json!({"customerName": "X", "location": "A → B", "amount": "ten"}),
        ] {
            let err = payload(body).into_new_ride(now()).unwrap_err();
            assert!(err.starts_with("Missing required fields"));
        }
    }

    #[test]
    fn create_rejects_unparseable_date() {
        let err = payload(json!({
            "customerName": "X",
            "location": "A → B",
            "amount": 1,
            "date": "yesterday"
        }))
        .into_new_ride(now())
        .unwrap_err();
        assert!(err.contains("Invalid date"));
    }

    #[test]
    fn update_distinguishes_omitted_from_null() {
        let changes = payload(json!({"cost": null, "contactNumber": ""}))
            .into_changes()
            .unwrap();

        assert_eq!(changes.cost, Some(0.0));
        assert_eq!(changes.contact_number, Some(String::new()));
        assert_eq!(changes.save, None);
        assert_eq!(changes.amount, None);
        assert_eq!(changes.customer_name, None);
    }

    #[test]
    fn update_rejects_blank_required_fields() {
        assert!(payload(json!({"customerName": " "})).into_changes().is_err());
        assert!(payload(json!({"location": null})).into_changes().is_err());
        assert!(payload(json!({"amount": 0})).into_changes().is_err());
        assert!(payload(json!({"amount": "-5"})).into_changes().is_err());
    }

    #[test]
    fn changes_apply_only_supplied_fields() {
        let mut ride = Ride {
            id: Uuid::new_v4(),
            customer_name: "Rahim".into(),
            contact_number: "017".into(),
            location: "A → B".into(),
            amount: 500.0,
            cost: 100.0,
            save: 20.0,
            date: None,
            created_at: now(),
            updated_at: now(),
        };

        payload(json!({"amount": 650, "save": null}))
            .into_changes()
            .unwrap()
            .apply(&mut ride);

        assert_eq!(ride.amount, 650.0);
        assert_eq!(ride.save, 0.0);
        assert_eq!(ride.cost, 100.0);
        assert_eq!(ride.contact_number, "017");
    }

    #[test]
    fn response_carries_net_profit() {
        let ride = Ride {
            id: Uuid::new_v4(),
            customer_name: "Rahim".into(),
            contact_number: String::new(),
            location: "A → B".into(),
            amount: 100.0,
            cost: 250.0,
            save: 0.0,
            date: None,
            created_at: now(),
            updated_at: now(),
        };

        let json = serde_json::to_value(RideResponse::from(ride)).unwrap();
        assert_eq!(json["netProfit"], json!(-150.0));
        assert_eq!(json["customerName"], "Rahim");
        assert!(json["date"].is_null());
    }

    #[test]
    fn sort_parsing() {
        let query = |s: &str| RideQuery {
            sort: Some(s.into()),
            search: None,
        };

        assert_eq!(RideQuery::default().order(), SortOrder::default());
        assert_eq!(
            query("amount").order(),
            SortOrder {
                key: SortKey::Amount,
                descending: false
            }
        );
        assert_eq!(
            query("-customerName").order(),
            SortOrder {
                key: SortKey::CustomerName,
                descending: true
            }
        );
        assert_eq!(query("password").order(), SortOrder::default());
    }

    #[test]
    fn search_is_case_insensitive() {
        let ride = Ride {
            id: Uuid::new_v4(),
            customer_name: "Rahim Uddin".into(),
            contact_number: "01711".into(),
            location: "Dhaka → Sylhet".into(),
            amount: 1.0,
            cost: 0.0,
            save: 0.0,
            date: None,
            created_at: now(),
            updated_at: now(),
        };

        assert!(matches_search(&ride, "rahim"));
        assert!(matches_search(&ride, "SYLHET"));
        assert!(matches_search(&ride, "0171"));
        assert!(!matches_search(&ride, "khulna"));
    }
}
