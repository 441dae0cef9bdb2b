pub mod conversion;
pub mod maturity;
pub mod oracle;
pub mod pool;

pub use conversion::*;
pub use maturity::*;
pub use oracle::*;
pub use pool::*;
