use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::store::{Entity, PgQueryAs, Reference};
use crate::filter::SortField;
use crate::validation::Violations;

use super::SensorLocation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SensorSystem {
    pub id: Uuid,
    pub sensor_name: String,
    pub sensor_location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSystemPayload {
    pub sensor_name: Option<String>,
    pub sensor_location_id: Option<Uuid>,
}

impl Entity for SensorSystem {
    type Payload = SensorSystemPayload;

    const NAME: &'static str = "SensorSystem";
    const TABLE: &'static str = "sensor_systems";
    const COLUMNS: &'static [&'static str] = &["sensor_name", "sensor_location_id"];
    const SORT_FIELDS: &'static [SortField] = &[SortField::ID, SortField::new("sensorName", "sensor_name")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_payload(id: Uuid, payload: SensorSystemPayload) -> Result<Self, Violations> {
        let mut v = Violations::new();
        let sensor_name = v.not_empty("sensorName", payload.sensor_name, "Sensor name cannot be empty");

        v.finish(sensor_name).map(|sensor_name| SensorSystem {
            id,
            sensor_name,
            sensor_location_id: payload.sensor_location_id,
        })
    }

    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        query.bind(&self.sensor_name).bind(self.sensor_location_id)
    }

    fn references(&self) -> Vec<Reference> {
        self.sensor_location_id
            .map(|id| Reference::new(SensorLocation::TABLE, id))
            .into_iter()
            .collect()
    }
}
