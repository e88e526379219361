pub mod builders;
pub mod constants;
pub mod error;
pub mod registry;
pub mod translate;
