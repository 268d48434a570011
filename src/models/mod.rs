pub mod cart;
pub mod document;

pub use cart::{CartItem, CartTable, CartVariant, RawCartItem, AMOUNT_COLUMN};
pub use document::ExpenseDocument;
