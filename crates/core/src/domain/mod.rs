pub mod facility;
pub mod pre_registration;
pub mod routing;
