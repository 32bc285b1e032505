pub mod audit;
pub mod flywheel;
pub mod product;
pub mod report;
