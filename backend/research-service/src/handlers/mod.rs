pub mod auth;
pub mod datasets;
pub mod health;
pub mod patients;
pub mod researchers;

pub use auth::*;
pub use datasets::*;
pub use health::*;
pub use patients::*;
pub use researchers::*;
