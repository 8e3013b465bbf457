pub mod categories;
pub mod core;
pub mod courses;
pub mod cuts;
pub mod exchange;
pub mod items;
pub mod whatif;
