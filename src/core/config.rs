//! Configurazione - caricamento da variabili d'ambiente (.env supportato)

use dotenv::dotenv;
use lettre::message::Mailbox;
use std::env;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";
const DEFAULT_MAIL_FROM: &str = "Ratify <no-reply@ratify.app>";

/// Dove vengono persistiti utenti e inviti
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    MySql { database_url: String },
    /// Solo per sviluppo locale: i dati si perdono al riavvio
    Memory,
}

/// Provider A: API HTTP con dominio autenticato
#[derive(Debug, Clone, PartialEq)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub base_url: String,
}

/// Provider B: API HTTP con la sola chiave
#[derive(Debug, Clone, PartialEq)]
pub struct SendGridConfig {
    pub api_key: String,
}

/// Relay SMTP autenticato
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// true = TLS implicito (tipicamente porta 465), false = STARTTLS
    pub secure: bool,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailConfig {
    pub from: String,
    pub mailgun: Option<MailgunConfig>,
    pub sendgrid: Option<SendGridConfig>,
    pub smtp: Option<SmtpConfig>,
}

impl MailConfig {
    /// Nessun provider reale configurato: la catena sarà solo la sandbox
    pub fn uses_sandbox(&self) -> bool {
        self.mailgun.is_none() && self.sendgrid.is_none() && self.smtp.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub app_env: String,
    /// Base dei deep link negli inviti: `<frontend_url>/accept-invite/<token>`
    pub frontend_url: String,
    pub mail: MailConfig,
    /// None = l'invio SMS fallisce sempre con errore di configurazione
    pub sms: Option<TwilioConfig>,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Costruisce la configurazione a partire da una funzione di lookup qualsiasi.
    /// I valori vuoti (o di soli spazi) contano come assenti.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage = match get("STORAGE").as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("mysql") | None => StorageBackend::MySql {
                database_url: get("DATABASE_URL")
                    .ok_or_else(|| "DATABASE_URL must be set in .env file".to_string())?,
            },
            Some(other) => {
                return Err(format!(
                    "Invalid STORAGE '{}': must be 'mysql' or 'memory'",
                    other
                ));
            }
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = get("SERVER_PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = get("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let connection_lifetime_secs = get("DB_CONNECTION_LIFETIME_SECS")
            .unwrap_or_else(|| "1800".to_string())
            .parse::<u64>()
            .map_err(|_| {
                "Invalid DB_CONNECTION_LIFETIME_SECS: must be a positive number".to_string()
            })?;

        let app_env = get("APP_ENV").unwrap_or_else(|| "development".to_string());

        let frontend_url = get("FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        // un provider è attivo solo se il suo set di credenziali è completo
        let mailgun = match (get("MAILGUN_API_KEY"), get("MAILGUN_DOMAIN")) {
            (Some(api_key), Some(domain)) => Some(MailgunConfig {
                api_key,
                domain,
                base_url: get("MAILGUN_BASE_URL")
                    .unwrap_or_else(|| "https://api.mailgun.net".to_string()),
            }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Mailgun partially configured (need MAILGUN_API_KEY and MAILGUN_DOMAIN), skipping");
                None
            }
            (None, None) => None,
        };

        let sendgrid = get("SENDGRID_API_KEY").map(|api_key| SendGridConfig { api_key });

        let smtp = match (get("EMAIL_SMTP_HOST"), get("EMAIL_USER"), get("EMAIL_PASSWORD")) {
            (Some(host), Some(username), Some(password)) => {
                let port = get("EMAIL_SMTP_PORT")
                    .unwrap_or_else(|| "587".to_string())
                    .parse::<u16>()
                    .map_err(|_| "Invalid EMAIL_SMTP_PORT: must be a number between 0-65535".to_string())?;
                let secure = get("EMAIL_SMTP_SECURE").as_deref() == Some("true");
                Some(SmtpConfig {
                    host,
                    port,
                    secure,
                    username,
                    password,
                })
            }
            (None, None, None) => None,
            _ => {
                warn!("SMTP relay partially configured (need EMAIL_SMTP_HOST, EMAIL_USER, EMAIL_PASSWORD), skipping");
                None
            }
        };

        // un mittente non valido farebbe scartare i provider che lo usano
        let from = match get("MAIL_FROM") {
            Some(from) if from.parse::<Mailbox>().is_ok() => from,
            Some(from) => {
                warn!("Invalid MAIL_FROM '{}', using {}", from, DEFAULT_MAIL_FROM);
                DEFAULT_MAIL_FROM.to_string()
            }
            None => DEFAULT_MAIL_FROM.to_string(),
        };

        let mail = MailConfig {
            from,
            mailgun,
            sendgrid,
            smtp,
        };

        let sms = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_FROM"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Ok(Config {
            storage,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            app_env,
            frontend_url,
            mail,
            sms,
        })
    }

    /// Stampa la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server Configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        match &self.storage {
            StorageBackend::MySql { database_url } => {
                info!("   Database: {}", Self::mask_url(database_url));
                info!("   Max DB Connections: {}", self.max_connections);
                info!("   Connection Lifetime: {}s", self.connection_lifetime_secs);
            }
            StorageBackend::Memory => warn!("   Database: in-memory (data is lost on restart)"),
        }
        info!("   Frontend URL: {}", self.frontend_url);
        info!("   Email providers: {}", self.mail_chain_summary().join(" -> "));
        info!(
            "   SMS: {}",
            if self.sms.is_some() { "twilio" } else { "not configured" }
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("   JWT Secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("   JWT Secret: custom secret configured");
        }
    }

    fn mail_chain_summary(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        if self.mail.mailgun.is_some() {
            chain.push("mailgun");
        }
        if self.mail.sendgrid.is_some() {
            chain.push("sendgrid");
        }
        if self.mail.smtp.is_some() {
            chain.push("smtp");
        }
        if self.mail.uses_sandbox() {
            chain.push("ethereal (sandbox)");
        }
        chain
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}
