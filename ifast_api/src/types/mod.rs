mod fasting;
pub use self::fasting::{FastRecord, FastType, FastingStatistics};

mod user;
pub use self::user::{LoginRequest, UserRegistrationRequest, UserResponse};
