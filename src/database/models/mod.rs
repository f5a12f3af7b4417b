pub mod fruit;
pub mod fruit_product;
pub mod heater;
pub mod offer;
pub mod sensor_location;
pub mod sensor_system;
pub mod user;

pub use fruit::{Fruit, FruitPayload};
pub use fruit_product::{FruitProduct, FruitProductPayload};
pub use heater::{Heater, HeaterPayload};
pub use offer::{Offer, OfferPayload};
pub use sensor_location::{SensorLocation, SensorLocationPayload, SensorLocationType};
pub use sensor_system::{SensorSystem, SensorSystemPayload};
pub use user::{User, ROLE_USER};
