mod buffer_pool;
mod page_guard;

pub use buffer_pool::*;
pub use page_guard::*;
