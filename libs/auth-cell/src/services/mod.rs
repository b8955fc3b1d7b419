pub mod account;
pub mod face;
pub mod password;
pub mod twofa;

pub use account::AccountService;
pub use face::FaceLoginService;
pub use twofa::TwoFactorService;
