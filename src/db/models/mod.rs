//! Database models
//!
//! Plain structs mapped with `sqlx::FromRow`, plus the Create/Update
//! payloads the API accepts. JSON-array columns (images, tags) use
//! `sqlx::types::Json` so they round-trip as real arrays on the wire.

pub mod cart;
pub mod order;
pub mod otp;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartTotals, CartView, ResolvedCartItem};
pub use order::{
    Order, OrderItem, OrderItemDetail, OrderStatus, OrderWithItems, PaymentMethod,
    ShippingAddress,
};
pub use otp::OtpCode;
pub use product::{
    Category, Condition, Location, Product, ProductCreate, ProductSort, ProductUpdate,
    ProductWithSeller,
};
pub use user::{User, UserCreate, UserPublic};
