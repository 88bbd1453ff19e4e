pub mod loaders;
pub mod question_image;
pub mod response;
pub mod table;

pub use loaders::load_catalog;
pub use question_image::{Catalog, QuestionImage};
pub use response::{Answer, Choice, ResponseDraft, ResponseRow, USER_COLUMN};
pub use table::Table;
