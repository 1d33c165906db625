pub mod heap;
pub mod page;
