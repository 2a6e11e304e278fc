/// Simplifies creating validation errors
///
/// # Example
/// ```ignore
/// validation_error!("username", "Username must be at least 3 characters long")
/// ```
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        Err($crate::AppError::validation($field, $message))
    };
}
