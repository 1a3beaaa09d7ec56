mod category;
mod money;
mod period;
mod transaction;

pub use category::*;
pub use money::*;
pub use period::*;
pub use transaction::*;
