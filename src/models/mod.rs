//! Entity and view types shared by the repository and workflow layers.

pub mod enums;

mod allotment;
mod department;
mod diagnosis;
mod doctor;
mod filters;
mod patient;
mod prescription;
mod test_prescribed;
mod ward;

pub use allotment::*;
pub use department::*;
pub use diagnosis::*;
pub use doctor::*;
pub use filters::*;
pub use medical_test::*;
pub use patient::*;
pub use prescription::*;
pub use test_prescribed::*;
pub use ward::*;
