use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const INVENTORY_ENDPOINT: &str = "/api/v1/hospital/inventory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuAction {
    pub label: String,
    pub method: String,
    pub href: String,
}

/// Row-level dropdown with the actions a user can take on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EditMenu {
    pub record_id: Uuid,
    pub actions: Vec<MenuAction>,
}

impl EditMenu {
    pub fn for_record(record_id: Uuid) -> Self {
        Self {
            record_id,
            actions: vec![
                MenuAction {
                    label: "Edit".to_string(),
                    method: "PUT".to_string(),
                    href: INVENTORY_ENDPOINT.to_string(),
                },
                MenuAction {
                    label: "Delete".to_string(),
                    method: "DELETE".to_string(),
                    href: format!("{}?id={}", INVENTORY_ENDPOINT, record_id),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_action_addresses_the_record() {
        let id = Uuid::new_v4();
        let menu = EditMenu::for_record(id);
        let labels: Vec<_> = menu.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["Edit", "Delete"]);
        assert_eq!(
            menu.actions[1].href,
            format!("/api/v1/hospital/inventory?id={}", id)
        );
    }
}
