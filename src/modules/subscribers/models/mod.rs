pub mod company;
pub mod contract;

pub use company::{Company, CompanyKey};
pub use contract::Contract;
