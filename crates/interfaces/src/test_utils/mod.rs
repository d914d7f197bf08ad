//! In-memory mocks of the chain database, state executor and transaction
//! pool, plus random block generators.

mod generators;
mod mock_executor;
mod mock_pool;
mod mock_provider;

pub use generators::{random_block, random_header};
pub use mock_executor::MockExecutor;
pub use mock_pool::MockPool;
pub use mock_provider::MockProvider;
