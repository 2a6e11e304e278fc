pub mod user;

pub use user::{AuthResponse, LoginInput, RegisterInput, USERS_TABLE, User, UserProfile};
