pub mod shipstation;

pub use shipstation::ShipStationClient;
