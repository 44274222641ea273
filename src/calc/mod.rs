// Pure billing/cost calculations. No database access here; handlers fetch the
// rows and feed them through these functions inside their own transactions.
pub mod balance;
pub mod calendar;
pub mod pallets;
pub mod resolver;
pub mod storage;
pub mod variance;
