mod article;
mod user;

pub use article::{Article, NewArticle, UpdateArticle};
pub use user::{NewUser, User};
