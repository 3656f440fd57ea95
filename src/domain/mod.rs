pub mod item;

pub use item::NewsItem;
