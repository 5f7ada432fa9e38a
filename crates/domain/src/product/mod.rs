//! Product aggregate types, events, commands, and the event producer.

mod commands;
mod events;
mod model;
mod money;
mod producer;

pub use commands::{CreateProduct, DeleteProduct, UpdateProduct};
pub use events::{
    PriceChangedData, ProductCreatedData, ProductDeletedData, ProductEvent, ProductUpdatedData,
    StockDecreasedData, StockIncreasedData,
};
pub use model::Product;
pub use money::Money;
pub use producer::{ProductProducer, UpdateStrategy, diff_events, PRODUCT_STREAM};
