pub mod assembler;
pub mod critical;
pub mod dedup;
pub mod normalize;
pub mod schema_model;
