pub mod config;
pub mod domain;
pub mod text;

pub use domain::facility::{CapacityLedger, Facility, FacilityId};
pub use domain::pre_registration::PreRegistration;
pub use domain::routing::{RoutingAction, RoutingDecision};
pub use text::{clean_citations, clean_contact_field};
