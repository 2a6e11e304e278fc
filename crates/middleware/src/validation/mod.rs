pub mod user_account;

pub use user_account::{
    ValidLogin, ValidRegistration, normalize_email, validate_login, validate_registration,
};
