pub mod run;
pub mod stages;
pub mod validate;
