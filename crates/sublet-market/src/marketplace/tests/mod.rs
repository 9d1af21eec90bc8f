mod agreements;
mod availability;
mod common;
mod contract;
