pub mod analysis_service;
pub mod arrangements;
pub mod nsrdb_csv;
pub mod record_preparer;
pub mod solar_calculations;
