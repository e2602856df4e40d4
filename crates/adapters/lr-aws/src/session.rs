//! STS role sessions.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_config::sts::AssumeRoleProvider;
use lr_error::{LrError, Result};
use lr_traits::{RoleSession, SessionProvider};
use std::sync::Arc;
use tracing::debug;

use crate::config::AwsConfig;
use crate::s3::S3Store;

/// Session name reported to STS for every assumed role.
const SESSION_NAME: &str = "logroll";

/// Assumes roles on top of the run's own credentials.
///
/// The returned stores use an [`AssumeRoleProvider`], which caches the
/// temporary credentials and refreshes them from the base credentials before
/// they expire, so long tasks outlive the first set of credentials.
pub struct AwsSessions {
    config: AwsConfig,
    sdk_config: SdkConfig,
}

impl AwsSessions {
    /// Create a provider on top of a loaded SDK configuration.
    pub fn new(config: AwsConfig, sdk_config: SdkConfig) -> Self {
        Self { config, sdk_config }
    }

    /// Load the SDK configuration described by `config`.
    pub async fn load(config: AwsConfig) -> Self {
        let sdk_config = config.load().await;
        Self::new(config, sdk_config)
    }

    /// The base SDK configuration.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }
}

#[async_trait]
impl SessionProvider for AwsSessions {
    async fn assume(&self, role: &str) -> Result<RoleSession> {
        let region = self
            .sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| LrError::Config("No AWS region configured".to_string()))?;

        let provider = AssumeRoleProvider::builder(role)
            .session_name(SESSION_NAME)
            .configure(&self.sdk_config)
            .build()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .credentials_provider(provider)
            .force_path_style(self.config.force_path_style())
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);

        debug!(role, region = %region, "Assumed role");
        Ok(RoleSession {
            role: role.to_string(),
            region,
            store: Arc::new(S3Store::new(client)),
        })
    }
}
