//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, login and password reset
//! - `catalog` - Product listing and lookup
//! - `cart` - Per-user cart mutations
//! - `orders` - Placing orders from the cart and order history
//! - `checkout` - Hosted payment sessions via a [`checkout::PaymentGateway`]
//! - `invoice` - Invoice PDF rendering and archiving
//! - `email` - Transactional email over SMTP

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod invoice;
pub mod orders;
