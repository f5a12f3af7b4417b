use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs};
use crate::filter::SortField;
use crate::validation::Violations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Fruit {
    pub id: Uuid,
    pub fruit_image_url: String,
    pub fruit_name: String,
    pub fruit_vendor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FruitPayload {
    pub fruit_image_url: Option<String>,
    pub fruit_name: Option<String>,
    pub fruit_vendor: Option<String>,
}

impl Entity for Fruit {
    type Payload = FruitPayload;

    const NAME: &'static str = "Fruit";
    const TABLE: &'static str = "fruits";
    const COLUMNS: &'static [&'static str] = &["fruit_image_url", "fruit_name", "fruit_vendor"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::ID,
        SortField::new("fruitName", "fruit_name"),
        SortField::new("fruitVendor", "fruit_vendor"),
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: FruitPayload) -> Result<Self, Violations> {
        let mut v = Violations::new();
        let image = v.not_empty("fruitImageUrl", payload.fruit_image_url, "Fruit image URL cannot be empty");
        let name = v.not_empty("fruitName", payload.fruit_name, "Fruit name cannot be empty");
        let vendor = v.not_empty("fruitVendor", payload.fruit_vendor, "Fruit vendor cannot be empty");

        v.finish(image.zip(name).zip(vendor))
            .map(|((fruit_image_url, fruit_name), fruit_vendor)| Fruit {
                id,
                fruit_image_url,
                fruit_name,
                fruit_vendor,
            })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(&self.fruit_image_url)
            .bind(&self.fruit_name)
            .bind(&self.fruit_vendor)
    }
}
