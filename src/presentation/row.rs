use super::{
    animation::RevealAnimation,
    menu::EditMenu,
    tiers::{days_until, BadgeTone, ExpiryTier, QuantityTier},
};
use crate::dto::inventory::InventoryRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    pub label: String,
    pub tone: BadgeTone,
    pub class_name: String,
}

impl Badge {
    fn new(label: String, tone: BadgeTone) -> Self {
        Self {
            class_name: format!("{} {}", tone.background_class(), tone.text_class()),
            label,
            tone,
        }
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryRowView {
    pub id: Uuid,
    pub item: String,
    pub department: String,
    pub quantity: Badge,
    pub quantity_tier: QuantityTier,
    pub batch_number: String,
    pub unit_price: String,
    pub expiration: Badge,
    pub expiry_tier: ExpiryTier,
    pub menu: EditMenu,
}

impl InventoryRowView {
    pub fn render(row: &InventoryRow, now: DateTime<Utc>) -> Self {
        let quantity_tier = QuantityTier::classify(row.quantity);
        let expiry_tier = ExpiryTier::classify(days_until(row.expiry_date, now));

        Self {
            id: row.id,
            item: row.item_name.clone(),
            department: row.department.clone(),
            quantity: Badge::new(row.quantity.to_string(), quantity_tier.tone()),
            quantity_tier,
            batch_number: row.batch_number.clone(),
            unit_price: format!("{:.2}", row.unit_price),
            expiration: Badge::new(format_expiry_date(row.expiry_date), expiry_tier.tone()),
            expiry_tier,
            menu: EditMenu::for_record(row.id),
        }
    }
}

/// Table payload: rows in listing order plus the entrance animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryTable {
    pub reveal: RevealAnimation,
    pub rows: Vec<InventoryRowView>,
}

impl InventoryTable {
    pub fn render(rows: &[InventoryRow], now: DateTime<Utc>) -> Self {
        Self {
            reveal: RevealAnimation::default(),
            rows: rows
                .iter()
                .map(|row| InventoryRowView::render(row, now))
                .collect(),
        }
    }
}

/// `MM/DD/YYYY`
pub fn format_expiry_date(date: DateTime<Utc>) -> String {
    date.format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn row(quantity: i32, expiry_date: DateTime<Utc>) -> InventoryRow {
        InventoryRow {
            id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            hospital_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            item_name: "Saline 0.9% 500ml".into(),
            description: None,
            batch_number: "B-7".into(),
            expiry_date,
            quantity,
            unit_price: dec!(2.5),
            supplier: "Baxter".into(),
            category: "Fluids".into(),
            department: "Pharmacy".into(),
        }
    }

    #[test]
    fn low_stock_close_to_expiry_is_red_twice() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let view = InventoryRowView::render(&row(15, now + Duration::days(10)), now);

        assert_eq!(view.quantity_tier, QuantityTier::Low);
        assert_eq!(view.expiry_tier, ExpiryTier::Urgent);
        assert_eq!(view.quantity.class_name, "bg-red-500 text-red-50");
        assert_eq!(view.expiration.class_name, "bg-red-500 text-red-50");
        assert_eq!(view.expiration.label, "05/11/2024");
    }

    #[test]
    fn healthy_row_is_green() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let view = InventoryRowView::render(&row(80, now + Duration::days(120)), now);

        assert_eq!(view.quantity.tone, BadgeTone::Green);
        assert_eq!(view.expiration.tone, BadgeTone::Green);
        assert_eq!(view.quantity.label, "80");
        assert_eq!(view.unit_price, "2.50");
        assert_eq!(view.menu.record_id, view.id);
    }

    #[test]
    fn table_keeps_row_order() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            row(30, now + Duration::days(45)),
            row(5, now + Duration::days(400)),
        ];
        let table = InventoryTable::render(&rows, now);

        assert_eq!(table.reveal, RevealAnimation::default());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].id, rows[0].id);
        assert_eq!(table.rows[0].expiry_tier, ExpiryTier::Warning);
        assert_eq!(table.rows[0].quantity_tier, QuantityTier::Medium);
        assert_eq!(table.rows[1].expiration.tone, BadgeTone::Green);
    }
}
