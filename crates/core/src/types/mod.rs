//! Core types for Larder.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod pagination;
pub mod price;
pub mod product;

pub use cart::{Cart, CartItem, CartLine, ResolvedCart};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{NewOrder, Order, OrderCustomer, OrderError, OrderItem, ProductSnapshot};
pub use pagination::{Page, PageRequest, Pagination};
pub use price::{CurrencyCode, CurrencyCodeError, Price, PriceError};
pub use product::{NewProduct, Product};
