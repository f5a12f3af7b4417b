use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs};
use crate::filter::SortField;
use crate::validation::Violations;

/// Promotional badge attached to fruit products, e.g. "50% OFF".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    /// ARGB hex string such as `0xffc62828`
    pub badge_color: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    pub badge_color: Option<String>,
    pub description: Option<String>,
}

impl Entity for Offer {
    type Payload = OfferPayload;

    const NAME: &'static str = "Offer";
    const TABLE: &'static str = "offers";
    const COLUMNS: &'static [&'static str] = &["badge_color", "description"];
    const SORT_FIELDS: &'static [SortField] = &[SortField::ID, SortField::new("description", "description")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: OfferPayload) -> Result<Self, Violations> {
        let mut v = Violations::new();
        let badge_color = v.not_empty("badgeColor", payload.badge_color, "Badge color cannot be empty");
        let description = v.not_empty("description", payload.description, "Description cannot be empty");

        v.finish(badge_color.zip(description))
            .map(|(badge_color, description)| Offer { id, badge_color, description })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query.bind(&self.badge_color).bind(&self.description)
    }
}
