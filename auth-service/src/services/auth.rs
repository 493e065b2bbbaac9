use std::sync::Arc;

use service_core::error::AppError;

use crate::{
    dtos::auth::{
        LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SendOtpRequest,
        VerifyOtpRequest,
    },
    models::Role,
    services::{EmailProvider, JwtService, MongoDb, OtpService, OtpVerification},
    utils::{verify_password, Password, PasswordHashString},
};

/// Orchestrates the four authentication flows over the credential store,
/// the OTP store, the token issuer and the notification channel. Holds no
/// state of its own.
#[derive(Clone)]
pub struct AuthService {
    db: MongoDb,
    email: Arc<dyn EmailProvider>,
    jwt: JwtService,
    otp: OtpService,
}

impl AuthService {
    pub fn new(
        db: MongoDb,
        email: Arc<dyn EmailProvider>,
        jwt: JwtService,
        otp: OtpService,
    ) -> Self {
        Self {
            db,
            email,
            jwt,
            otp,
        }
    }

    /// Direct registration. Does not log the user in; a fresh login is
    /// required to obtain a token.
    pub async fn register(&self, req: RegisterRequest) -> Result<MessageResponse, AppError> {
        if self
            .db
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(anyhow::anyhow!(
                "Account already exists"
            )));
        }

        let user = self
            .db
            .create_user(
                &req.email,
                &Password::new(req.password),
                req.role.unwrap_or_default(),
            )
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(MessageResponse::new("User registered successfully"))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        // An unknown email is reported as such; only a wrong password maps
        // to the credentials failure
        let user = self
            .db
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

        let matches = verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Password verification error: {}", e))
        })?;

        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.jwt.issue(&user.id, user.role)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            user: user.sanitized(),
        })
    }

    /// Issue a challenge and deliver it. No existence check against the
    /// credential store: this path serves not-yet-registered identities.
    pub async fn send_otp(&self, req: SendOtpRequest) -> Result<MessageResponse, AppError> {
        let code = self.otp.issue(&req.email).await?;

        // The challenge row is already persisted; a delivery failure leaves
        // it in place until it expires or the next issue replaces it
        self.email
            .send_otp_email(&req.email, &code, self.otp.ttl_minutes())
            .await?;

        Ok(MessageResponse::new("OTP sent successfully"))
    }

    /// Verify a challenge and register the identity it gates.
    pub async fn verify_otp(&self, req: VerifyOtpRequest) -> Result<MessageResponse, AppError> {
        match self.otp.verify(&req.email, &req.otp).await? {
            OtpVerification::Valid => {}
            outcome => {
                // Single rejection class toward the caller; the sub-reason
                // stays in the logs
                tracing::debug!(email = %req.email, ?outcome, "OTP challenge rejected");
                return Err(AppError::OtpRejected);
            }
        }

        // Registrations through the challenge path always get the default
        // role. Create first, consume after: if the email was registered in
        // the meantime the AlreadyExists failure propagates and the
        // challenge stays usable.
        let user = self
            .db
            .create_user(&req.email, &Password::new(req.password), Role::default())
            .await?;

        if let Err(e) = self.otp.consume(&req.email).await {
            // The identity exists; a leftover challenge row is inert and
            // will be replaced by any later issue
            tracing::warn!(user_id = %user.id, error = %e, "Failed to consume OTP challenge");
        }

        tracing::info!(user_id = %user.id, "User registered via OTP challenge");

        Ok(MessageResponse::new("User registered successfully"))
    }
}
