pub mod f64x4;
pub mod u64x4;
