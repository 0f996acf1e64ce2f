pub mod calibration;
pub mod capture;
pub mod config;
pub mod error;
pub mod measure;
pub mod pose;
