//! Content validation: gibberish screening, the post vector index, and the
//! validation pipeline that feeds the scoring engine.

pub mod gibberish;
pub mod index;
pub mod validator;

pub use index::{ContentIndex, InsertOutcome, NearestMatch, NewPost, PostRefund};
pub use validator::{ContentValidator, Validation};
