//! Types that represent the core data model, such as `Transaction` and `Goal`.
mod amount;
mod category;
mod goal;
mod items;
mod lenient;
mod mapping;
mod transaction;

pub use amount::{Amount, AmountError, AmountFormat};
pub use category::Matching;
pub use goal::{Goal, GoalColumn, Goals};
pub use items::{Item, Items};
pub use lenient::{parse_date, Lenient};
pub use mapping::{Column, Header, Mapping, MappingError};
pub use transaction::{Transaction, TransactionColumn, Transactions};
