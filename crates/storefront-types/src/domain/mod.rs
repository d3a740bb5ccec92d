pub mod order;
pub mod review;
pub mod status;
