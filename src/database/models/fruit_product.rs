use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs, Reference};
use crate::filter::SortField;
use crate::validation::Violations;

use super::{Fruit, Offer};

/// Prices are stored as `NUMERIC(12, 2)`
const PRICE_PRECISION: u32 = 12;
const PRICE_SCALE: u32 = 2;
const COST_PRICE_DIGITS: &str = "Cost price must have at most 10 integer digits and 2 decimals";
const SELLING_PRICE_DIGITS: &str = "Selling price must have at most 10 integer digits and 2 decimals";

/// A sellable pack of a fruit, optionally carrying an offer.
///
/// `fruit_id` and `offer_id` are plain references; loading the related
/// [`Fruit`](super::Fruit) or [`Offer`](super::Offer) is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FruitProduct {
    pub id: Uuid,
    pub cost_price: Decimal,
    pub fruit_id: Uuid,
    pub offer_id: Option<Uuid>,
    pub pack_size: String,
    pub selling_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FruitProductPayload {
    #[serde(default)]
    pub cost_price: Decimal,
    pub fruit_id: Option<Uuid>,
    pub offer_id: Option<Uuid>,
    pub pack_size: Option<String>,
    #[serde(default)]
    pub selling_price: Decimal,
}

impl Entity for FruitProduct {
    type Payload = FruitProductPayload;

    const NAME: &'static str = "FruitProduct";
    const TABLE: &'static str = "fruit_products";
    const COLUMNS: &'static [&'static str] = &["cost_price", "fruit_id", "offer_id", "pack_size", "selling_price"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::ID,
        SortField::new("costPrice", "cost_price"),
        SortField::new("packSize", "pack_size"),
        SortField::new("sellingPrice", "selling_price"),
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: FruitProductPayload) -> Result<Self, Violations> {
        let mut v = Violations::new();
        let cost_price = v
            .not_negative("costPrice", payload.cost_price, "Cost price cannot be negative")
            .and_then(|p| v.fits_numeric("costPrice", p, PRICE_PRECISION, PRICE_SCALE, COST_PRICE_DIGITS));
        let fruit_id = v.not_null("fruitId", payload.fruit_id, "Fruit cannot be empty");
        let pack_size = v.not_empty("packSize", payload.pack_size, "Pack size cannot be empty");
        let selling_price = v
            .not_negative("sellingPrice", payload.selling_price, "Selling price cannot be negative")
            .and_then(|p| v.fits_numeric("sellingPrice", p, PRICE_PRECISION, PRICE_SCALE, SELLING_PRICE_DIGITS));

        v.finish(cost_price.zip(fruit_id).zip(pack_size).zip(selling_price))
            .map(|(((cost_price, fruit_id), pack_size), selling_price)| FruitProduct {
                id,
                cost_price,
                fruit_id,
                offer_id: payload.offer_id,
                pack_size,
                selling_price,
            })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(self.cost_price)
            .bind(self.fruit_id)
            .bind(self.offer_id)
            .bind(&self.pack_size)
            .bind(self.selling_price)
    }

    fn references(&self) -> Vec<Reference> {
        std::iter::once(Reference::new(Fruit::TABLE, self.fruit_id))
            .chain(self.offer_id.map(|id| Reference::new(Offer::TABLE, id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_prices_are_fine_but_missing_fruit_and_pack_are_not() {
        let payload: FruitProductPayload =
            serde_json::from_value(json!({ "costPrice": 0.0, "sellingPrice": 0.0 })).unwrap();
        let violations = FruitProduct::from_payload(Uuid::new_v4(), payload).unwrap_err().into_vec();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "fruitId");
        assert_eq!(violations[0].message, "Fruit cannot be empty");
        assert_eq!(violations[1].field, "packSize");
    }

    #[test]
    fn negative_price_is_rejected() {
        let payload = FruitProductPayload {
            cost_price: Decimal::new(-5, 0),
            fruit_id: Some(Uuid::new_v4()),
            pack_size: Some("1kg".into()),
            ..Default::default()
        };
        let violations = FruitProduct::from_payload(Uuid::new_v4(), payload).unwrap_err().into_vec();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "costPrice");
    }

    #[test]
    fn prices_must_fit_the_price_columns() {
        let payload: FruitProductPayload = serde_json::from_value(json!({
            "costPrice": 1.255,
            "fruitId": Uuid::nil(),
            "packSize": "1kg",
            "sellingPrice": 1e10
        }))
        .unwrap();
        let violations = FruitProduct::from_payload(Uuid::new_v4(), payload).unwrap_err().into_vec();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "costPrice");
        assert_eq!(violations[0].message, COST_PRICE_DIGITS);
        assert_eq!(violations[1].field, "sellingPrice");
        assert_eq!(violations[1].message, SELLING_PRICE_DIGITS);
    }

    #[test]
    fn prices_serialize_as_numbers() {
        let payload: FruitProductPayload = serde_json::from_value(json!({
            "costPrice": 100.0,
            "fruitId": Uuid::nil(),
            "packSize": "1kg",
            "sellingPrice": 95.5
        }))
        .unwrap();
        let product = FruitProduct::from_payload(Uuid::new_v4(), payload).unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["costPrice"].as_f64(), Some(100.0));
        assert_eq!(value["sellingPrice"].as_f64(), Some(95.5));
        assert!(value["offerId"].is_null());
    }
}
