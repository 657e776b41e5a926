pub mod audit;
pub mod dashboard;
pub mod plan;
pub mod policy;
pub mod run;
