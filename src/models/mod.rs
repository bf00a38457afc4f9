pub mod analysis;
pub mod irradiance;
