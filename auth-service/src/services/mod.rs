//! Services layer for auth-service.
//!
//! Business logic for authentication flows plus the adapters they sit on:
//! the MongoDB store wrapper, the token issuer/verifier, the OTP challenge
//! lifecycle and the outbound email channel.

mod auth;
mod database;
mod email;
mod jwt;
mod otp;

pub use auth::AuthService;
pub use database::MongoDb;
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use jwt::{JwtService, SessionClaims, TokenError};
pub use otp::{OtpService, OtpVerification, OTP_CODE_LENGTH};
