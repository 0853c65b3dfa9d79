use crate::domains::activity::types::opaque_id;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Shown while the lookup for the route's condominium is in flight
pub const PLACEHOLDER_NAME: &str = "Carregando...";
/// Header fallback when nothing is selected or the record has no name
pub const DEFAULT_NAME: &str = "Condomínio";

/// Identity of the condominium currently scoping the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condominium {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

impl Condominium {
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: PLACEHOLDER_NAME.to_string(),
            logo_url: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_NAME && self.logo_url.is_none()
    }
}

/// Record as returned by `GET /condominiums/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CondominiumRecord {
    #[serde(deserialize_with = "opaque_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "logoUrl")]
    pub image_url: Option<String>,
}

impl From<CondominiumRecord> for Condominium {
    fn from(record: CondominiumRecord) -> Self {
        Self {
            id: record.id,
            name: record
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            logo_url: record.image_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// The selected condominium, shared by the resolver, the save path and the header.
#[derive(Debug, Default)]
pub struct CondominiumContext {
    selected: RwLock<Option<Condominium>>,
}

impl CondominiumContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Condominium> {
        self.selected
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.selected().map(|c| c.id)
    }

    pub fn select(&self, condominium: Condominium) {
        *self.selected.write().unwrap_or_else(|e| e.into_inner()) = Some(condominium);
    }

    /// Install the loading placeholder unless `id` is already selected.
    /// Returns true when the placeholder was installed.
    pub fn show_placeholder(&self, id: &str) -> bool {
        let mut selected = self.selected.write().unwrap_or_else(|e| e.into_inner());
        match selected.as_ref() {
            Some(current) if current.id == id => false,
            _ => {
                *selected = Some(Condominium::placeholder(id));
                true
            }
        }
    }

    pub fn clear(&self) {
        *self.selected.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn display_name(&self) -> String {
        self.selected()
            .map(|c| c.name)
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    pub fn logo_url(&self) -> Option<String> {
        self.selected().and_then(|c| c.logo_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_maps_image_url_to_logo() {
        let record: CondominiumRecord = serde_json::from_value(json!({
            "id": 7,
            "name": "Residencial Jardins",
            "imageUrl": "https://cdn.example.com/logo.png"
        }))
        .unwrap();
        let condominium = Condominium::from(record);
        assert_eq!(condominium.id, "7");
        assert_eq!(condominium.name, "Residencial Jardins");
        assert_eq!(condominium.logo_url.as_deref(), Some("https://cdn.example.com/logo.png"));
    }

    #[test]
    fn test_record_without_name_uses_default() {
        let record: CondominiumRecord =
            serde_json::from_value(json!({"id": "c1", "name": "", "imageUrl": null})).unwrap();
        let condominium = Condominium::from(record);
        assert_eq!(condominium.name, DEFAULT_NAME);
        assert_eq!(condominium.logo_url, None);
    }

    #[test]
    fn test_context_placeholder_and_display_name() {
        let context = CondominiumContext::new();
        assert_eq!(context.display_name(), "Condomínio");

        assert!(context.show_placeholder("c1"));
        assert_eq!(context.display_name(), "Carregando...");
        assert!(context.selected().unwrap().is_placeholder());

        context.select(Condominium {
            id: "c1".into(),
            name: "Edifício Aurora".into(),
            logo_url: None,
        });
        assert!(!context.show_placeholder("c1"));
        assert_eq!(context.display_name(), "Edifício Aurora");

        assert!(context.show_placeholder("c2"));
        assert_eq!(context.selected_id().as_deref(), Some("c2"));

        context.clear();
        assert_eq!(context.selected(), None);
    }
}
