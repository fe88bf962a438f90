//! Wires the SEALGATE components together from a `SealgateConfig`, the way
//! a host service would at startup.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use sealgate_audit::{AuditAppender, InMemoryAuditStore, Redactor};
use sealgate_contracts::{
    audit::{AuditLogEntry, AuditRecord},
    error::SealgateResult,
    request::{InboundRequest, Rejection},
};
use sealgate_core::traits::{Clock, NonceStore};
use sealgate_policy::{RouteTable, SealgateConfig};
use sealgate_signing::{InMemoryNonceStore, RequestSigner, SignatureValidator, SigningSecret};

/// Development key, only used when `--dev-secret` is passed.  Never deploy with it.
pub const DEV_SECRET: &str = "sealgate-demo-development-key";

const DEFAULT_CONFIG: &str = include_str!("../sealgate.toml");

/// Load `path`, or the bundled demo configuration.
pub fn load_config(path: Option<&Path>) -> SealgateResult<SealgateConfig> {
    match path {
        Some(path) => SealgateConfig::from_file(path),
        None => SealgateConfig::from_toml_str(DEFAULT_CONFIG),
    }
}

/// Resolve the signing secret from the variable named in the config.
///
/// A missing or blank variable is a `Configuration` error unless
/// `allow_dev_secret` opts in to the built-in development key.
pub fn load_secret(config: &SealgateConfig, allow_dev_secret: bool) -> SealgateResult<SigningSecret> {
    match SigningSecret::from_env(&config.signing.secret_env) {
        Ok(secret) => Ok(secret),
        Err(e) if allow_dev_secret => {
            warn!(error = %e, "--dev-secret given, signing with the development key");
            SigningSecret::new(DEV_SECRET)
        }
        Err(e) => Err(e),
    }
}

/// What happened to one inbound request.
pub enum Outcome {
    /// Passed validation (or the route is unprotected) and was audited.
    Accepted { entry: AuditLogEntry, signed: bool },
    Rejected(Rejection),
}

/// A miniature request pipeline: route lookup, signature validation, then
/// the audit record of the outcome.
pub struct Gateway {
    pub routes: RouteTable,
    /// The client side, sharing the server's secret.
    pub signer: RequestSigner,
    pub validator: SignatureValidator,
    pub nonces: Arc<InMemoryNonceStore>,
    pub store: Arc<InMemoryAuditStore>,
    pub appender: AuditAppender,
}

impl Gateway {
    pub fn build(
        config: &SealgateConfig,
        secret: &SigningSecret,
        clock: Arc<dyn Clock>,
    ) -> SealgateResult<Self> {
        let nonces = Arc::new(InMemoryNonceStore::with_clock(
            Arc::clone(&clock),
            config.nonce.capacity,
        ));
        let store = Arc::new(InMemoryAuditStore::new());
        let appender = AuditAppender::with_clock(store.clone(), Arc::clone(&clock))
            .with_redactor(Redactor::new().with_extra_keys(&config.audit.redact_keys));

        Ok(Self {
            routes: RouteTable::from_config(config),
            signer: RequestSigner::with_clock(secret.clone(), Arc::clone(&clock)),
            validator: SignatureValidator::with_clock(secret.clone(), nonces.clone(), clock),
            nonces,
            store,
            appender,
        })
    }

    /// Validate `request` if its route is protected, then audit `record`.
    ///
    /// The request body and a fresh request id are merged into the record's
    /// details.  `Err` means the audit write failed.
    pub fn handle(&self, request: &InboundRequest, record: AuditRecord) -> SealgateResult<Outcome> {
        let signed = match self.routes.lookup(&request.method, &request.path) {
            Some(route) => {
                if let Err(rejection) = self.validator.validate(request, &route) {
                    return Ok(Outcome::Rejected(rejection));
                }
                true
            }
            None => false,
        };

        let request_id = Uuid::new_v4();
        let mut details = match record.details.clone() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        details.insert("request_id".to_string(), json!(request_id.to_string()));
        if let Some(body) = &request.body {
            details.insert("request".to_string(), body.clone());
        }

        let entry = self.appender.append(record.with_details(Value::Object(details)))?;
        info!(request_id = %request_id, sequence = entry.sequence, signed, "request handled");
        Ok(Outcome::Accepted { entry, signed })
    }

    pub fn shutdown(&self) {
        self.nonces.shutdown();
    }
}
