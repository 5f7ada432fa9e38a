//! Domain layer for the product sync pipeline.
//!
//! This crate provides:
//! - The [`Product`] projection entity and [`Money`] value object
//! - [`ProductEvent`], the sum type of every fact the pipeline records
//! - [`EventCatalog`], the static tag-to-decoder table
//! - Commands with producer-side validation
//! - [`ProductProducer`], which turns accepted commands into the minimal
//!   set of events and appends them atomically

pub mod catalog;
pub mod error;
pub mod product;

pub use catalog::{CatalogError, Decoder, EventCatalog};
pub use error::DomainError;
pub use product::{
    CreateProduct, DeleteProduct, Money, PriceChangedData, Product, ProductCreatedData,
    ProductDeletedData, ProductEvent, ProductProducer, ProductUpdatedData, StockDecreasedData,
    StockIncreasedData, UpdateProduct, UpdateStrategy, PRODUCT_STREAM,
};
pub use common::ProductId;
