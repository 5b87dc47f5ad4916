//! Types that represent the rows the portal backend hands us, such as `Transaction` and
//! `VacationRequest`, along with the `Record` trait that lets one pipeline serve all of them.
mod account;
pub(crate) mod amount;
pub(crate) mod de;
mod financing;
mod overview;
mod record;
mod sales;
mod transaction;
mod vacation;

pub use account::Account;
pub use amount::{Amount, AmountError};
pub use financing::{
    BrandCount, FinancedVehicle, FinancingContext, FinancingTotals, Institute, InterestWarning,
};
pub use overview::{DashboardOverview, Overview, Period, Transfers};
pub use record::{Kpi, Record, Section};
pub use sales::{BrandGroup, BrandSales, ModelCount, SalesEntry, SalesSummary};
pub use transaction::Transaction;
pub use vacation::{Action, Decision, DecisionOutcome, VacationRequest, NO_DEPARTMENT};
