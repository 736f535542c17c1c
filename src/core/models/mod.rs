pub mod audit;
pub mod balance;
pub mod friendship;
pub mod group;
pub mod transaction;
pub mod user;
