use crate::config::AppConfig;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

const ESKIZ_BASE_URL: &str = "https://notify.eskiz.uz/api";
/// Eskiz tokens live about an hour; refresh a little early.
const TOKEN_REFRESH_SECS: u64 = 3500;
const SENDER_ID: &str = "4546";

static UZBEK_PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+998\d{9}$").unwrap());

/// Delivery seam for verification codes.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(&self, login: &str, code: &str) -> Result<()>;
}

/// Default sender: always logs the code, and forwards it over SMS when the
/// login is an Uzbek phone number and Eskiz credentials are configured.
pub struct CodeDispatcher {
    eskiz: Option<EskizClient>,
}

impl CodeDispatcher {
    pub fn from_config(config: &AppConfig) -> Self {
        let eskiz = match (&config.eskiz_email, &config.eskiz_password) {
            (Some(email), Some(password)) => {
                Some(EskizClient::new(email.clone(), password.clone()))
            }
            _ => None,
        };
        Self { eskiz }
    }
}

#[async_trait]
impl CodeSender for CodeDispatcher {
    async fn send_code(&self, login: &str, code: &str) -> Result<()> {
        info!("Verification code for {}: {}", login, code);

        if let Some(eskiz) = &self.eskiz {
            if UZBEK_PHONE_RE.is_match(login) {
                let phone = login.trim_start_matches('+');
                eskiz
                    .send_sms(phone, &format!("Tasdiqlash kodi: {code}"))
                    .await?;
            } else {
                warn!("Login {} is not an Uzbek phone number, code only logged", login);
            }
        }
        Ok(())
    }
}

/// Client for the Eskiz SMS gateway. Holds one bearer token and re-logs-in
/// when it nears expiry.
pub struct EskizClient {
    http: reqwest::Client,
    email: String,
    password: String,
    token: Mutex<Option<(String, Instant)>>,
}

impl EskizClient {
    pub fn new(email: String, password: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            email,
            password,
            token: Mutex::new(None),
        }
    }

    async fn ensure_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some((token, refreshed_at)) = guard.as_ref() {
            if refreshed_at.elapsed().as_secs() < TOKEN_REFRESH_SECS {
                return Ok(token.clone());
            }
        }

        let response = self
            .http
            .post(format!("{ESKIZ_BASE_URL}/auth/login"))
            .form(&[("email", self.email.as_str()), ("password", self.password.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let token = body["data"]["token"]
            .as_str()
            .ok_or_else(|| ApiError::SmsGateway {
                message: "login response carried no token".to_string(),
            })?
            .to_string();

        *guard = Some((token.clone(), Instant::now()));
        info!("Obtained new Eskiz token");
        Ok(token)
    }

    /// Send one SMS. `phone` is digits only, without the leading plus.
    pub async fn send_sms(&self, phone: &str, message: &str) -> Result<()> {
        let token = self.ensure_token().await?;

        self.http
            .post(format!("{ESKIZ_BASE_URL}/message/sms/send"))
            .bearer_auth(token)
            .form(&[
                ("mobile_phone", phone),
                ("message", message),
                ("from", SENDER_ID),
                ("callback_url", ""),
            ])
            .send()
            .await?
            .error_for_status()?;

        info!("Sent verification SMS to {}", phone);
        Ok(())
    }
}
