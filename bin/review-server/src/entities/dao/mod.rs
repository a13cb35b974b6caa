pub mod message;
pub mod model;
pub mod prompt;
pub mod review;
pub mod session;
pub mod user;

pub use message::{MessageRole, NewMessage, ReviewMessage};
pub use model::LlmModel;
pub use prompt::PromptTemplate;
pub use review::{NewReview, Review};
pub use session::Session;
pub use user::{NewUser, User, UserRole};
