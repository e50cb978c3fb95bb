mod articles;
mod health_check;
mod token;
mod user;

pub use articles::{add_article, delete_article, find_all_articles, find_article, update_article};
pub use health_check::health_check;
pub use token::create_new_access_token;
pub use user::{current_user, login, logout, signup};
