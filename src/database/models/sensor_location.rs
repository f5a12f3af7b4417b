use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs};
use crate::filter::SortField;
use crate::validation::Violations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "sensor_location_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorLocationType {
    Indoor,
    Outdoor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SensorLocation {
    pub id: Uuid,
    pub sensor_location_text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub sensor_location_type: SensorLocationType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorLocationPayload {
    pub sensor_location_text: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sensor_location_type: Option<SensorLocationType>,
}

impl Entity for SensorLocation {
    type Payload = SensorLocationPayload;

    const NAME: &'static str = "SensorLocation";
    const TABLE: &'static str = "sensor_locations";
    const COLUMNS: &'static [&'static str] = &["sensor_location_text", "latitude", "longitude", "sensor_location_type"];
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::ID,
        SortField::new("sensorLocationText", "sensor_location_text"),
        SortField::new("latitude", "latitude"),
        SortField::new("longitude", "longitude"),
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: SensorLocationPayload) -> Result<Self, Violations> {
        let mut v = Violations::new();
        let text = v.not_empty(
            "sensorLocationText",
            payload.sensor_location_text,
            "Sensor location text cannot be empty",
        );
        let latitude = v.in_range("latitude", payload.latitude, -90.0, 90.0, "Latitude must be between -90 and 90");
        let longitude = v.in_range(
            "longitude",
            payload.longitude,
            -180.0,
            180.0,
            "Longitude must be between -180 and 180",
        );
        let kind = v.not_null(
            "sensorLocationType",
            payload.sensor_location_type,
            "Sensor location type cannot be empty",
        );

        v.finish(text.zip(latitude).zip(longitude).zip(kind))
            .map(|(((sensor_location_text, latitude), longitude), sensor_location_type)| SensorLocation {
                id,
                sensor_location_text,
                latitude,
                longitude,
                sensor_location_type,
            })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query
            .bind(&self.sensor_location_text)
            .bind(self.latitude)
            .bind(self.longitude)
            .bind(self.sensor_location_type)
    }
}
