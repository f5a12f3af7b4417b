use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs};
use crate::filter::SortField;
use crate::validation::Violations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Heater {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaterPayload {
    pub text: Option<String>,
}

impl Entity for Heater {
    type Payload = HeaterPayload;

    const NAME: &'static str = "Heater";
    const TABLE: &'static str = "heaters";
    const COLUMNS: &'static [&'static str] = &["text"];
    const SORT_FIELDS: &'static [SortField] = &[SortField::ID, SortField::new("text", "text")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: HeaterPayload) -> Result<Self, Violations> {
        let mut violations = Violations::new();
        let text = violations.not_empty("text", payload.text, "Text cannot be empty");
        violations.finish(text).map(|text| Heater { id, text })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query.bind(&self.text)
    }
}
