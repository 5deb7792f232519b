// Thin client for Twilio Programmable Messaging.
//
// Codes are generated and checked by the caller; this crate only delivers
// the text.

use std::collections::HashMap;

pub mod models;
use reqwest::Client;

use crate::models::{ErrorResponse, MessageResponse};

const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form, or a messaging service SID (`MG...`).
    pub from_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("request to Twilio failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Twilio returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("message {sid} was not accepted (status: {status})")]
    NotAccepted { sid: String, status: String },
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    api_base: String,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different API host (local stubs, regional edges).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{base}/Accounts/{sid}/Messages.json",
            base = self.api_base,
            sid = self.options.account_sid
        )
    }

    /// Send a plain-text SMS to `recipient`.
    pub async fn send_sms(&self, recipient: &str, body: &str) -> Result<MessageResponse, TwilioError> {
        let sender_key = if self.options.from_number.starts_with("MG") {
            "MessagingServiceSid"
        } else {
            "From"
        };

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert(sender_key, &self.options.from_number);
        form_body.insert("Body", body);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &raw));
        }

        let message = response.json::<MessageResponse>().await?;
        if matches!(message.status.as_str(), "failed" | "undelivered" | "canceled") {
            return Err(TwilioError::NotAccepted {
                sid: message.sid,
                status: message.status,
            });
        }

        Ok(message)
    }
}

fn api_error(status: u16, raw: &str) -> TwilioError {
    let message = serde_json::from_str::<ErrorResponse>(raw)
        .map(|body| body.message)
        .unwrap_or_else(|_| raw.to_string());
    TwilioError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TwilioOptions {
        TwilioOptions {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550001111".to_string(),
        }
    }

    #[test]
    fn test_messages_url() {
        let service = TwilioService::new(options());
        assert_eq!(
            service.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_api_base_override_trims_slash() {
        let service = TwilioService::new(options()).with_api_base("http://localhost:4010/");
        assert_eq!(
            service.messages_url(),
            "http://localhost:4010/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_api_error_uses_twilio_message() {
        let raw = r#"{"code":21211,"message":"The 'To' number is not a valid phone number.","more_info":"https://www.twilio.com/docs/errors/21211","status":400}"#;
        match api_error(400, raw) {
            TwilioError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The 'To' number is not a valid phone number.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        match api_error(503, "upstream unavailable") {
            TwilioError::Api { message, .. } => assert_eq!(message, "upstream unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
