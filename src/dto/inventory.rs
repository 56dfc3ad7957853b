use crate::errors::ServiceError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const ITEMS_REQUIRED: &str = "Items array is required.";
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required for each item.";
pub const HOSPITAL_NOT_FOUND: &str = "Hospital not found";
pub const UPDATE_FIELDS_REQUIRED: &str =
    "Item ID and at least one field to update (quantity or expiry_date) are required.";
pub const RECORD_NOT_FOUND: &str = "Item not found or access denied.";
pub const DELETE_ID_REQUIRED: &str = "Inventory item ID is required.";
pub const INVALID_RECORD_ID: &str = "Invalid inventory item ID.";
pub const ITEM_DELETED: &str = "Item deleted successfully.";

/// Fractional digits kept by the `items.unit_price` column.
pub const PRICE_SCALE: u32 = 2;

/// One line of a bulk create payload, as received.
///
/// Every field is optional here so that missing values can be reported
/// together instead of failing on the first absent key.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct InventoryLineRequest {
    #[schema(example = "Pharmacy")]
    pub department: Option<String>,
    #[schema(example = "Saline 0.9% 500ml")]
    pub item_name: Option<String>,
    #[schema(example = "B-2024-117")]
    pub batch_number: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    #[schema(example = "2025-03-31")]
    pub expiry_date: Option<String>,
    #[schema(example = 120)]
    pub quantity: Option<i64>,
    #[schema(value_type = Option<String>, example = "2.45")]
    pub unit_price: Option<Decimal>,
    #[schema(example = "Baxter")]
    pub supplier: Option<String>,
    #[schema(example = "Fluids")]
    pub category: Option<String>,
    pub description: Option<String>,
}

/// A bulk create line that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryLine {
    pub department: String,
    pub item_name: String,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier: String,
    pub category: String,
    pub description: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl InventoryLineRequest {
    /// Names of required fields that are absent, blank or zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if present(&self.department).is_none() {
            missing.push("department");
        }
        if present(&self.item_name).is_none() {
            missing.push("item_name");
        }
        if present(&self.batch_number).is_none() {
            missing.push("batch_number");
        }
        if present(&self.expiry_date).is_none() {
            missing.push("expiry_date");
        }
        if matches!(self.quantity, None | Some(0)) {
            missing.push("quantity");
        }
        if self.unit_price.map_or(true, |p| p.is_zero()) {
            missing.push("unit_price");
        }
        if present(&self.supplier).is_none() {
            missing.push("supplier");
        }
        if present(&self.category).is_none() {
            missing.push("category");
        }
        missing
    }

    pub fn into_line(self, index: usize) -> Result<InventoryLine, ServiceError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "{} items[{}] is missing: {}",
                ALL_FIELDS_REQUIRED,
                index,
                missing.join(", ")
            )));
        }

        let raw_expiry = present(&self.expiry_date).unwrap_or_default();
        let expiry_date = parse_expiry_date(raw_expiry).ok_or_else(|| {
            ServiceError::BadRequest(format!(
                "items[{}].expiry_date must be an RFC 3339 timestamp or a YYYY-MM-DD date.",
                index
            ))
        })?;

        let quantity = parse_quantity(self.quantity.unwrap_or_default())
            .map_err(|reason| ServiceError::BadRequest(format!("items[{}].quantity {}", index, reason)))?;

        let unit_price = self.unit_price.unwrap_or_default();
        if unit_price.is_sign_negative() {
            return Err(ServiceError::BadRequest(format!(
                "items[{}].unit_price cannot be negative.",
                index
            )));
        }
        if unit_price.normalize().scale() > PRICE_SCALE {
            return Err(ServiceError::BadRequest(format!(
                "items[{}].unit_price must have at most {} decimal places.",
                index, PRICE_SCALE
            )));
        }

        let owned = |value: &Option<String>| present(value).unwrap_or_default().to_string();
        Ok(InventoryLine {
            department: owned(&self.department),
            item_name: owned(&self.item_name),
            batch_number: owned(&self.batch_number),
            expiry_date,
            quantity,
            unit_price,
            supplier: owned(&self.supplier),
            category: owned(&self.category),
            description: present(&self.description).map(str::to_string),
        })
    }
}

/// Validates a whole bulk create body. Nothing is persisted unless every
/// line passes.
pub fn parse_bulk_payload(payload: serde_json::Value) -> Result<Vec<InventoryLine>, ServiceError> {
    let entries = match payload {
        serde_json::Value::Array(entries) if !entries.is_empty() => entries,
        _ => return Err(ServiceError::BadRequest(ITEMS_REQUIRED.to_string())),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let request: InventoryLineRequest = serde_json::from_value(entry).map_err(|e| {
                ServiceError::BadRequest(format!("items[{}] is malformed: {}", index, e))
            })?;
            request.into_line(index)
        })
        .collect()
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_expiry_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_quantity(raw: i64) -> Result<i32, &'static str> {
    if raw < 0 {
        return Err("cannot be negative.");
    }
    i32::try_from(raw).map_err(|_| "is too large.")
}

/// Body of `PUT /api/v1/hospital/inventory`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateInventoryRequest {
    #[schema(example = "0b7c6f0e-4f9d-4a57-9d43-0a1b2c3d4e5f")]
    pub id: Option<String>,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    #[schema(example = 35)]
    pub quantity: Option<i64>,
    #[schema(example = "2025-06-30")]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryUpdate {
    pub id: Uuid,
    pub quantity: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl UpdateInventoryRequest {
    pub fn into_update(self) -> Result<InventoryUpdate, ServiceError> {
        let id = present(&self.id);
        let expiry = present(&self.expiry_date);
        let (Some(id), true) = (id, self.quantity.is_some() || expiry.is_some()) else {
            return Err(ServiceError::BadRequest(UPDATE_FIELDS_REQUIRED.to_string()));
        };

        self.validate()?;

        let id = parse_record_id(id)?;
        let quantity = self
            .quantity
            .map(parse_quantity)
            .transpose()
            .map_err(|reason| ServiceError::BadRequest(format!("quantity {}", reason)))?;
        let expiry_date = expiry
            .map(|raw| {
                parse_expiry_date(raw).ok_or_else(|| {
                    ServiceError::BadRequest(
                        "expiry_date must be an RFC 3339 timestamp or a YYYY-MM-DD date."
                            .to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(InventoryUpdate {
            id,
            quantity,
            expiry_date,
        })
    }
}

/// Query string of `DELETE /api/v1/hospital/inventory`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteInventoryQuery {
    /// Inventory record id
    pub id: Option<String>,
}

impl DeleteInventoryQuery {
    pub fn record_id(&self) -> Result<Uuid, ServiceError> {
        let id = present(&self.id)
            .ok_or_else(|| ServiceError::BadRequest(DELETE_ID_REQUIRED.to_string()))?;
        parse_record_id(id)
    }
}

fn parse_record_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::BadRequest(INVALID_RECORD_ID.to_string()))
}

/// Flattened inventory record joined with its department and catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct InventoryRow {
    pub id: Uuid,
    pub department_id: Uuid,
    pub hospital_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub description: Option<String>,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity: i32,
    #[schema(value_type = String, example = "2.45")]
    pub unit_price: Decimal,
    pub supplier: String,
    pub category: String,
    pub department: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedCount {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteConfirmation {
    #[schema(example = "Item deleted successfully.")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn full_line() -> serde_json::Value {
        json!({
            "department": "Pharmacy",
            "item_name": "Saline 0.9% 500ml",
            "batch_number": "B-1",
            "expiry_date": "2025-03-31",
            "quantity": 12,
            "unit_price": "2.45",
            "supplier": "Baxter",
            "category": "Fluids"
        })
    }

    #[test]
    fn non_array_and_empty_payloads_are_rejected() {
        for payload in [json!({"items": []}), json!([]), json!("x")] {
            let err = parse_bulk_payload(payload).unwrap_err();
            assert_matches!(err, ServiceError::BadRequest(ref msg) if msg == ITEMS_REQUIRED);
        }
    }

    #[test]
    fn valid_line_is_normalised() {
        let lines = parse_bulk_payload(json!([full_line()])).unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.quantity, 12);
        assert_eq!(line.unit_price, dec!(2.45));
        assert_eq!(line.expiry_date.to_rfc3339(), "2025-03-31T00:00:00+00:00");
        assert_eq!(line.description, None);
    }

    #[test]
    fn missing_fields_name_the_line_and_fields() {
        let mut second = full_line();
        second["department"] = json!("  ");
        second["quantity"] = json!(0);

        let err = parse_bulk_payload(json!([full_line(), second])).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg)
            if msg.starts_with(ALL_FIELDS_REQUIRED)
                && msg.contains("items[1]")
                && msg.contains("department, quantity"));
    }

    #[test]
    fn null_and_zero_price_count_as_missing() {
        let request = InventoryLineRequest {
            unit_price: Some(Decimal::ZERO),
            ..Default::default()
        };
        let missing = request.missing_fields();
        assert_eq!(missing.len(), 8);
        assert!(missing.contains(&"unit_price"));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut line = full_line();
        line["quantity"] = json!(-4);
        let err = parse_bulk_payload(json!([line])).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg) if msg.contains("quantity cannot be negative"));
    }

    #[test]
    fn prices_finer_than_cents_are_rejected() {
        let mut line = full_line();
        line["unit_price"] = json!("12.345");
        let err = parse_bulk_payload(json!([line])).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg)
            if msg == "items[0].unit_price must have at most 2 decimal places.");

        let mut padded = full_line();
        padded["unit_price"] = json!("3.2000");
        let lines = parse_bulk_payload(json!([padded])).unwrap();
        assert_eq!(lines[0].unit_price, dec!(3.2));
    }

    #[test]
    fn unparseable_expiry_is_rejected() {
        let mut line = full_line();
        line["expiry_date"] = json!("31/03/2025");
        let err = parse_bulk_payload(json!([line])).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg) if msg.contains("expiry_date"));
    }

    #[test]
    fn expiry_accepts_rfc3339_with_offset() {
        let parsed = parse_expiry_date("2025-01-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn update_requires_id_and_a_field() {
        let cases = [
            UpdateInventoryRequest::default(),
            UpdateInventoryRequest {
                id: Some(Uuid::new_v4().to_string()),
                ..Default::default()
            },
            UpdateInventoryRequest {
                id: Some(Uuid::new_v4().to_string()),
                expiry_date: Some(String::new()),
                ..Default::default()
            },
            UpdateInventoryRequest {
                quantity: Some(3),
                ..Default::default()
            },
        ];

        for request in cases {
            let err = request.into_update().unwrap_err();
            assert_matches!(err, ServiceError::BadRequest(ref msg) if msg == UPDATE_FIELDS_REQUIRED);
        }
    }

    #[test]
    fn update_allows_zero_quantity() {
        let id = Uuid::new_v4();
        let update = UpdateInventoryRequest {
            id: Some(id.to_string()),
            quantity: Some(0),
            expiry_date: None,
        }
        .into_update()
        .unwrap();
        assert_eq!(update, InventoryUpdate { id, quantity: Some(0), expiry_date: None });
    }

    #[test]
    fn update_rejects_negative_quantity() {
        let err = UpdateInventoryRequest {
            id: Some(Uuid::new_v4().to_string()),
            quantity: Some(-1),
            expiry_date: None,
        }
        .into_update()
        .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[test]
    fn delete_query_requires_a_valid_id() {
        let err = DeleteInventoryQuery { id: None }.record_id().unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg) if msg == DELETE_ID_REQUIRED);

        let err = DeleteInventoryQuery { id: Some("42".into()) }.record_id().unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(ref msg) if msg == INVALID_RECORD_ID);
    }
}
