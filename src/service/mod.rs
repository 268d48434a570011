pub mod cart_service;
pub mod document;
pub mod extractor;
pub mod numeral;
pub mod retry;

pub use cart_service::{CartReport, CartService};
pub use document::{build_expense_document, calculation_line, render_text_file, DocumentSkip};
pub use extractor::{parse_completion, BatchOutcome, CartExtractor, ExtractError, ImageUpload};
pub use numeral::{format_thousands, number_to_korean};
pub use retry::RetryPolicy;
